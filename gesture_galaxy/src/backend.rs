//! Camera and tracker backends, chosen at build time.
//!
//! * (default) — [`SimCamera`] + [`SimPoseModel`]: the keyboard holds a pose.
//! * `webcam` — [`OpenCvCamera`] + [`MediaPipeModel`](crate::mediapipe::MediaPipeModel).

use hand_gesture::{CameraError, CameraSource, PoseHandle, ThreadedTracker, VideoStream};
#[cfg(not(feature = "webcam"))]
use hand_gesture::{SimCamera, SimPoseModel};

use crate::config::AppConfig;

/// Build the camera for this run.
#[cfg(not(feature = "webcam"))]
pub fn camera_source(cfg: &AppConfig) -> Box<dyn CameraSource> {
    let cam = SimCamera::new(cfg.sim_fps);
    match &cfg.sim_camera_fail {
        Some(err) => Box::new(cam.failing(err.clone())),
        None      => Box::new(cam),
    }
}

#[cfg(feature = "webcam")]
pub fn camera_source(cfg: &AppConfig) -> Box<dyn CameraSource> {
    Box::new(OpenCvCamera::new(cfg.camera_index))
}

/// Start tracking on `stream`.  `pose` is only read by the simulation model.
#[cfg(not(feature = "webcam"))]
pub fn spawn_tracker(stream: VideoStream, cfg: &AppConfig, pose: &PoseHandle) -> Result<ThreadedTracker, CameraError> {
    let model = SimPoseModel::new(pose.clone());
    Ok(ThreadedTracker::spawn(stream, model, cfg.classifier.min_confidence))
}

#[cfg(feature = "webcam")]
pub fn spawn_tracker(stream: VideoStream, cfg: &AppConfig, _pose: &PoseHandle) -> Result<ThreadedTracker, CameraError> {
    let (python, script) = crate::mediapipe::default_paths();
    let model = crate::mediapipe::MediaPipeModel::spawn(&python, &script)?;
    Ok(ThreadedTracker::spawn(stream, model, cfg.classifier.min_confidence))
}

/// Whether the keyboard pose keys drive the hand.
pub const SIMULATED: bool = cfg!(not(feature = "webcam"));

// ════════════════════════════════════════════════════════════════════════════
// OpenCvCamera — real webcam (feature = "webcam")
// ════════════════════════════════════════════════════════════════════════════

/// Webcam through OpenCV `VideoCapture`.
///
/// The capture buffer is shrunk to one frame so a slow tracker always sees
/// the newest image instead of a queue of stale ones.
#[cfg(feature = "webcam")]
pub struct OpenCvCamera {
    index: i32,
}

#[cfg(feature = "webcam")]
impl OpenCvCamera {
    pub fn new(index: i32) -> Self {
        OpenCvCamera { index }
    }
}

#[cfg(feature = "webcam")]
impl CameraSource for OpenCvCamera {
    fn start(&mut self) -> Result<VideoStream, CameraError> {
        use opencv::prelude::*;
        use opencv::videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE};

        tracing::info!(index = self.index, "opening webcam");
        let mut cap = VideoCapture::new(self.index, videoio::CAP_ANY)
            .map_err(|e| CameraError::not_supported(e.to_string()))?;

        let opened = cap.is_opened().map_err(|e| CameraError::unavailable(e.to_string()))?;
        if !opened {
            return Err(CameraError::unavailable(format!(
                "camera {} could not be opened (missing, busy or access refused)", self.index
            )));
        }
        if let Err(e) = cap.set(CAP_PROP_BUFFERSIZE, 1.0) {
            tracing::debug!(error = %e, "capture buffer size not adjustable");
        }

        let grabber = OpenCvGrabber { cap, seq: 0 };
        Ok(VideoStream::new(format!("webcam {}", self.index), Box::new(grabber)))
    }
}

#[cfg(feature = "webcam")]
struct OpenCvGrabber {
    cap: opencv::videoio::VideoCapture,
    seq: u64,
}

#[cfg(feature = "webcam")]
impl hand_gesture::FrameGrabber for OpenCvGrabber {
    fn grab(&mut self) -> Result<hand_gesture::VideoFrame, CameraError> {
        use opencv::core::Mat;
        use opencv::prelude::*;

        let mut mat = Mat::default();
        let ok = self.cap.read(&mut mat).map_err(|e| CameraError::unavailable(e.to_string()))?;
        if !ok || mat.empty() {
            return Err(CameraError::unavailable("camera stopped delivering frames"));
        }

        let data = mat.data_bytes().map_err(|e| CameraError::unavailable(e.to_string()))?.to_vec();
        let frame = hand_gesture::VideoFrame {
            seq:      self.seq,
            width:    mat.cols().max(0) as u32,
            height:   mat.rows().max(0) as u32,
            channels: mat.channels().max(0) as u32,
            data,
        };
        self.seq += 1;
        Ok(frame)
    }
}
