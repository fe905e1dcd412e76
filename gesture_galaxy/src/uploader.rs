//! Getting photos into the pool: the static listing at start-up and
//! user uploads at runtime.
//!
//! Uploads are size-checked and read on the caller's thread (the stdin
//! console), then pushed through the pool's [`UploadSender`].  Nothing here
//! touches the render thread's state directly.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, info, warn};

use photo_formation::{ImageSource, PoolError, UploadSender};

use crate::error::{GalaxyError, UploadError};

/// `dir/1.jpg ..= dir/count.jpg`, in order.  Existence is not checked; a
/// missing file becomes a failed texture, not a missing photo.
pub fn static_photos(dir: &Path, count: usize) -> Vec<ImageSource> {
    (1..=count).map(|i| ImageSource::File(dir.join(format!("{}.jpg", i)))).collect()
}

// ════════════════════════════════════════════════════════════════════════════
// UploadReport
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of one upload batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<UploadError>,
}

impl UploadReport {
    pub fn has_warnings(&self) -> bool { !self.rejected.is_empty() }

    /// One line for the HUD.
    pub fn summary(&self) -> String {
        match (self.accepted.len(), self.rejected.first()) {
            (n, None)        => format!("{} photo(s) added", n),
            (n, Some(first)) => format!(
                "{} photo(s) added, {} skipped: {}", n, self.rejected.len(), first
            ),
        }
    }
}

/// Size-check and read `paths`.  Unreadable or oversized files are reported,
/// never fatal.
pub fn prepare_uploads(paths: &[PathBuf], max_bytes: u64) -> (Vec<ImageSource>, UploadReport) {
    let mut batch  = Vec::new();
    let mut report = UploadReport::default();

    for path in paths {
        match read_upload(path, max_bytes) {
            Ok(source) => {
                report.accepted.push(source.name());
                batch.push(source);
            }
            Err(e) => {
                warn!(error = %e, "upload skipped");
                report.rejected.push(e);
            }
        }
    }
    (batch, report)
}

fn read_upload(path: &Path, max_bytes: u64) -> Result<ImageSource, UploadError> {
    let unreadable = |e: io::Error| UploadError::Unreadable { path: path.to_path_buf(), reason: e.to_string() };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let meta = std::fs::metadata(path).map_err(unreadable)?;
    if !meta.is_file() {
        return Err(UploadError::Unreadable { path: path.to_path_buf(), reason: "not a file".into() });
    }
    if meta.len() > max_bytes {
        return Err(UploadError::Oversized { name, size: meta.len(), limit: max_bytes });
    }
    let data = std::fs::read(path).map_err(unreadable)?;
    Ok(ImageSource::bytes(name, data))
}

// ════════════════════════════════════════════════════════════════════════════
// Uploader
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Uploader {
    pool:      UploadSender,
    max_bytes: u64,
}

impl Uploader {
    pub fn new(pool: UploadSender, max_bytes: u64) -> Self {
        Uploader { pool, max_bytes }
    }

    /// Validate `paths` and push the accepted ones into the pool as one batch.
    pub fn upload(&self, paths: &[PathBuf]) -> Result<UploadReport, PoolError> {
        let (batch, report) = prepare_uploads(paths, self.max_bytes);
        if !batch.is_empty() {
            info!(count = batch.len(), "uploading photos");
            self.pool.send(batch)?;
        }
        Ok(report)
    }
}

/// Paths on one console line, whitespace separated.
pub fn parse_console_line(line: &str) -> Vec<PathBuf> {
    line.split_whitespace().map(PathBuf::from).collect()
}

/// Where the console delivers: the current session's uploader and report
/// channel.  A restart reconnects it to the new session.
#[derive(Clone, Default)]
pub struct ConsoleLink {
    target: Arc<Mutex<Option<(Uploader, Sender<UploadReport>)>>>,
}

impl ConsoleLink {
    pub fn connect(&self, uploader: Uploader, reports: Sender<UploadReport>) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Some((uploader, reports));
    }

    /// Upload one batch through the connected session.  `None` when no
    /// session is listening.
    pub fn submit(&self, paths: &[PathBuf]) -> Option<UploadReport> {
        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        let (uploader, reports) = target.as_ref()?;
        let report = match uploader.upload(paths) {
            Ok(r)  => r,
            Err(e) => {
                debug!(error = %e, "session gone; upload dropped");
                *target = None;
                return None;
            }
        };
        if reports.send(report.clone()).is_err() {
            *target = None;
        }
        Some(report)
    }
}

/// Read upload paths from stdin on a background thread.  Each non-empty line
/// is one batch.  Stops at EOF.
pub fn spawn_console(link: ConsoleLink) -> Result<(), GalaxyError> {
    thread::Builder::new()
        .name("upload-console".into())
        .spawn(move || {
            println!("  Upload: type image paths and press Enter.");
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let paths = parse_console_line(&line);
                if paths.is_empty() {
                    continue;
                }
                match link.submit(&paths) {
                    Some(report) => println!("  {}", report.summary()),
                    None         => println!("  Not ready for uploads yet."),
                }
            }
            debug!("upload console closed");
        })
        .map_err(|source| GalaxyError::Spawn { what: "upload console", source })?;
    Ok(())
}
