//! MediaPipe hand landmarker driven through a Python subprocess.
//!
//! Protocol (one request / one reply, strictly alternating):
//!
//! ```text
//! start-up   child → "READY\n"
//! request    parent → width:u32le height:u32le channels:u32le  <raw BGR bytes>
//! reply      child → {"hands":[{"handedness":"Right","score":0.97,
//!                                "landmarks":[{"x":..,"y":..,"z":..} ×21]}],
//!                     "error":null}\n
//! ```
//!
//! The helper script lives in `scripts/hand_detect.py`.

use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info};

use hand_gesture::{
    CameraError, Handedness, HandLandmarks, Landmark, LandmarkModel, TrackerError, VideoFrame,
};

// ════════════════════════════════════════════════════════════════════════════
// Wire format
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score:      f32,
    landmarks:  Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionReply {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Write one frame request.
pub fn write_request<W: Write>(w: &mut W, frame: &VideoFrame) -> io::Result<()> {
    w.write_all(&frame.width.to_le_bytes())?;
    w.write_all(&frame.height.to_le_bytes())?;
    w.write_all(&frame.channels.to_le_bytes())?;
    w.write_all(&frame.data)?;
    w.flush()
}

/// Parse one reply line.  Hands without exactly 21 landmarks are skipped.
pub fn parse_reply(line: &str) -> Result<Vec<HandLandmarks>, TrackerError> {
    let reply: DetectionReply = serde_json::from_str(line.trim())
        .map_err(|e| TrackerError::Malformed(format!("{}: {:?}", e, line.trim())))?;

    if let Some(err) = reply.error {
        return Err(TrackerError::Backend(err));
    }

    let mut hands = Vec::with_capacity(reply.hands.len());
    for h in reply.hands {
        let points: Vec<Landmark> = h.landmarks.iter().map(|l| Landmark::new(l.x, l.y, l.z)).collect();
        match HandLandmarks::from_slice(&points, h.score) {
            Some(hand) => hands.push(hand.with_handedness(Handedness::parse(&h.handedness))),
            None => debug!(got = points.len(), "skipping hand with wrong landmark count"),
        }
    }
    Ok(hands)
}

// ════════════════════════════════════════════════════════════════════════════
// MediaPipeModel
// ════════════════════════════════════════════════════════════════════════════

pub struct MediaPipeModel {
    child:  Child,
    stdin:  ChildStdin,
    stdout: BufReader<ChildStdout>,
    line:   String,
}

/// Default interpreter and helper script, relative to the working directory.
pub fn default_paths() -> (PathBuf, PathBuf) {
    (PathBuf::from(".venv/bin/python"), PathBuf::from("scripts/hand_detect.py"))
}

impl MediaPipeModel {
    /// Start the helper and wait for its `READY` line.
    ///
    /// Any failure here is a start-up failure of the tracking capability and
    /// is reported as [`CameraError::NotSupported`].
    pub fn spawn(python: &Path, script: &Path) -> Result<Self, CameraError> {
        if !script.exists() {
            return Err(CameraError::not_supported(format!(
                "hand landmarker script not found at {}", script.display()
            )));
        }
        info!(python = %python.display(), script = %script.display(), "starting hand landmarker");

        let mut child = Command::new(python)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CameraError::not_supported(format!("cannot start {}: {}", python.display(), e)))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(CameraError::not_supported("hand landmarker pipes unavailable"));
        };
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        let read = stdout.read_line(&mut ready);
        if !matches!(read, Ok(n) if n > 0) || ready.trim() != "READY" {
            let _ = child.kill();
            return Err(CameraError::not_supported(format!(
                "hand landmarker did not start (got {:?})", ready.trim()
            )));
        }

        info!("hand landmarker ready");
        Ok(MediaPipeModel { child, stdin, stdout, line: String::new() })
    }
}

impl LandmarkModel for MediaPipeModel {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, TrackerError> {
        write_request(&mut self.stdin, frame)
            .map_err(|e| TrackerError::Terminated(format!("write to landmarker: {}", e)))?;

        self.line.clear();
        match self.stdout.read_line(&mut self.line) {
            Ok(0)  => Err(TrackerError::Terminated("landmarker exited".into())),
            Ok(_)  => parse_reply(&self.line),
            Err(e) => Err(TrackerError::Terminated(format!("read from landmarker: {}", e))),
        }
    }
}

impl Drop for MediaPipeModel {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!(error = %e, "hand landmarker already stopped");
        }
        let _ = self.child.wait();
    }
}
