//! Simulation backends: a fake camera and a model that "sees" whatever pose
//! the keyboard is holding.
//!
//! The visualizer writes into a [`PoseHandle`]; [`SimPoseModel`] reads it on
//! the tracker thread.  Everything downstream (tracker mailbox, classifier,
//! debouncer) runs exactly as with a real webcam.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::camera::{CameraSource, FrameGrabber, VideoFrame, VideoStream};
use crate::error::{CameraError, TrackerError};
use crate::landmarks::HandLandmarks;
use crate::poses::{synthetic_hand, Placement, Pose};
use crate::tracker::LandmarkModel;

// ════════════════════════════════════════════════════════════════════════════
// PoseHandle
// ════════════════════════════════════════════════════════════════════════════

/// Shared "what is the hand doing right now" cell.  `None` = no hand.
#[derive(Clone, Default)]
pub struct PoseHandle {
    inner: Arc<Mutex<Option<Pose>>>,
}

impl PoseHandle {
    pub fn new() -> Self { Self::default() }

    pub fn set(&self, pose: Option<Pose>) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = pose;
    }

    pub fn get(&self) -> Option<Pose> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimCamera
// ════════════════════════════════════════════════════════════════════════════

/// A camera that always opens (or always fails, when told to) and delivers
/// tiny grey frames at a fixed rate.
pub struct SimCamera {
    frame_interval: Duration,
    fail_with:      Option<CameraError>,
}

impl SimCamera {
    pub fn new(fps: u32) -> Self {
        SimCamera {
            frame_interval: Duration::from_millis(1000 / fps.max(1) as u64),
            fail_with:      None,
        }
    }

    /// Make `start()` fail, to exercise the fatal error path.
    pub fn failing(mut self, err: CameraError) -> Self {
        self.fail_with = Some(err);
        self
    }
}

impl CameraSource for SimCamera {
    fn start(&mut self) -> Result<VideoStream, CameraError> {
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }
        let grabber = SimGrabber { interval: self.frame_interval, seq: 0 };
        Ok(VideoStream::new("simulated camera", Box::new(grabber)))
    }
}

struct SimGrabber {
    interval: Duration,
    seq:      u64,
}

impl FrameGrabber for SimGrabber {
    fn grab(&mut self) -> Result<VideoFrame, CameraError> {
        thread::sleep(self.interval);
        let frame = VideoFrame { seq: self.seq, width: 4, height: 4, channels: 3, data: vec![0x40; 48] };
        self.seq += 1;
        Ok(frame)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimPoseModel
// ════════════════════════════════════════════════════════════════════════════

/// Landmark model that ignores pixels and reports the held pose.
///
/// A slow sway is added so the hand is not pixel-identical every frame.
pub struct SimPoseModel {
    pose:      PoseHandle,
    placement: Placement,
}

impl SimPoseModel {
    pub fn new(pose: PoseHandle) -> Self {
        SimPoseModel { pose, placement: Placement::default() }
    }
}

impl LandmarkModel for SimPoseModel {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, TrackerError> {
        let Some(pose) = self.pose.get() else {
            return Ok(Vec::new());
        };
        let mut placement = self.placement;
        let phase = frame.seq as f32 * 0.05;
        placement.wrist.x += 0.02 * phase.sin();
        placement.wrist.y += 0.01 * phase.cos();
        Ok(vec![synthetic_hand(pose, placement)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify, ClassifierConfig, GestureSymbol};

    #[test]
    fn failing_camera_reports_configured_error() {
        let mut cam = SimCamera::new(30).failing(CameraError::permission_denied("test"));
        assert_eq!(cam.start().unwrap_err(), CameraError::permission_denied("test"));
    }

    #[test]
    fn model_reports_no_hand_when_nothing_held() {
        let mut m = SimPoseModel::new(PoseHandle::new());
        assert!(m.detect(&VideoFrame::default()).unwrap().is_empty());
    }

    #[test]
    fn swaying_hand_keeps_its_gesture() {
        let handle = PoseHandle::new();
        handle.set(Some(Pose::Fist));
        let mut m = SimPoseModel::new(handle);
        for seq in 0..200 {
            let frame = VideoFrame { seq, ..VideoFrame::default() };
            let hands = m.detect(&frame).unwrap();
            assert_eq!(classify(&hands[0], &ClassifierConfig::default()), GestureSymbol::Fist);
        }
    }
}
