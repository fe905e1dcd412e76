use std::path::PathBuf;

use thiserror::Error;

pub const MIB: u64 = 1024 * 1024;

fn in_mib(bytes: &u64) -> f64 {
    *bytes as f64 / MIB as f64
}

/// The only error `run()` returns.
#[derive(Debug, Error)]
pub enum GalaxyError {
    #[error("cannot open window: {0}")]
    Window(String),

    #[error("cannot start {what}: {source}")]
    Spawn { what: &'static str, source: std::io::Error },
}

/// Why an upload was skipped.  Reported to the user, never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("{name} is {:.1} MB, over the {} MB limit", in_mib(.size), .limit / MIB)]
    Oversized { name: String, size: u64, limit: u64 },

    #[error("cannot read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
}

/// Why a photo's texture could not be produced.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("cannot read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("cannot decode {name}: {source}")]
    Decode { name: String, source: image::ImageError },

    #[error("{name} has no pixels")]
    Empty { name: String },
}
