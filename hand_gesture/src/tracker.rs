//! Hand tracking: one landmark result per camera frame, newest wins.
//!
//! [`ThreadedTracker`] runs `grab → detect` on its own thread and publishes
//! each result into a single-slot mailbox.  The render thread polls with
//! [`HandTracker::next_landmarks`] once per display frame and gets only the
//! newest result; anything the render thread did not pick up in time is
//! overwritten, never queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::camera::{VideoFrame, VideoStream};
use crate::error::{CameraError, TrackerError};
use crate::landmarks::{most_confident, HandLandmarks};

// ════════════════════════════════════════════════════════════════════════════
// Public contracts
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of one render-frame poll.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerPoll {
    /// No new tracking result since the previous poll.
    Pending,
    /// A new result with no usable hand (occluded, out of frame, low
    /// confidence or a per-frame model error).
    Lost,
    /// A new result; the most confident hand.
    Hand(HandLandmarks),
}

/// What the render loop consumes.
pub trait HandTracker {
    fn next_landmarks(&mut self) -> TrackerPoll;

    /// A fatal camera error raised after start-up (stream died).
    /// Returned once.
    fn fatal_error(&mut self) -> Option<CameraError> { None }
}

/// The injected tracking capability: frame in, zero or more hands out.
pub trait LandmarkModel: Send + 'static {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, TrackerError>;
}

// ════════════════════════════════════════════════════════════════════════════
// Mailbox
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Mailbox {
    latest:    Option<Vec<HandLandmarks>>,
    fatal:     Option<CameraError>,
    published: u64,
    /// Results overwritten before the render thread saw them.
    dropped:   u64,
}

fn lock(m: &Mutex<Mailbox>) -> MutexGuard<'_, Mailbox> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ════════════════════════════════════════════════════════════════════════════
// ThreadedTracker
// ════════════════════════════════════════════════════════════════════════════

pub struct ThreadedTracker {
    mailbox:        Arc<Mutex<Mailbox>>,
    stop:           Arc<AtomicBool>,
    worker:         Option<JoinHandle<()>>,
    min_confidence: f32,
}

impl ThreadedTracker {
    /// Move `stream` and `model` onto a worker thread and start tracking.
    pub fn spawn<M: LandmarkModel>(stream: VideoStream, model: M, min_confidence: f32) -> Self {
        let mailbox = Arc::new(Mutex::new(Mailbox::default()));
        let stop    = Arc::new(AtomicBool::new(false));

        let worker = {
            let mailbox = mailbox.clone();
            let stop    = stop.clone();
            thread::Builder::new()
                .name("hand-tracker".into())
                .spawn(move || tracker_thread(stream, model, mailbox, stop))
        };
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                lock(&mailbox).fatal =
                    Some(CameraError::not_supported(format!("cannot spawn tracker thread: {}", e)));
                None
            }
        };

        ThreadedTracker { mailbox, stop, worker, min_confidence }
    }

    /// Results published so far / results overwritten unseen.
    pub fn stats(&self) -> (u64, u64) {
        let mb = lock(&self.mailbox);
        (mb.published, mb.dropped)
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().map_or(false, |w| !w.is_finished())
    }
}

impl HandTracker for ThreadedTracker {
    fn next_landmarks(&mut self) -> TrackerPoll {
        let hands = match lock(&self.mailbox).latest.take() {
            Some(h) => h,
            None    => return TrackerPoll::Pending,
        };
        let min = self.min_confidence;
        match most_confident(hands.into_iter().filter(|h| h.confidence >= min).collect()) {
            Some(hand) => TrackerPoll::Hand(hand),
            None       => TrackerPoll::Lost,
        }
    }

    fn fatal_error(&mut self) -> Option<CameraError> {
        lock(&self.mailbox).fatal.take()
    }
}

impl Drop for ThreadedTracker {
    /// Stops the worker and waits for it, so the stream (and the device
    /// behind it) is released before the next session opens the camera.
    /// The worker checks `stop` between frames; the wait is at most one
    /// grab plus one detect.
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("tracker thread panicked");
            }
        }
    }
}

fn tracker_thread<M: LandmarkModel>(
    mut stream: VideoStream,
    mut model:  M,
    mailbox:    Arc<Mutex<Mailbox>>,
    stop:       Arc<AtomicBool>,
) {
    debug!(stream = stream.label(), "tracker thread started");

    while !stop.load(Ordering::Relaxed) {
        let frame = match stream.grab() {
            Ok(f)  => f,
            Err(e) => {
                warn!(error = %e, "camera stream lost");
                lock(&mailbox).fatal = Some(e);
                return;
            }
        };

        let hands = if frame.is_empty() {
            Vec::new()
        } else {
            match model.detect(&frame) {
                Ok(h)  => h,
                Err(e) if e.is_terminal() => {
                    warn!(error = %e, "hand tracker lost");
                    lock(&mailbox).fatal = Some(CameraError::unavailable(e.to_string()));
                    return;
                }
                Err(e) => {
                    debug!(seq = frame.seq, error = %e, "tracking failed for frame");
                    Vec::new()
                }
            }
        };

        let mut mb = lock(&mailbox);
        if mb.latest.replace(hands).is_some() {
            mb.dropped += 1;
        }
        mb.published += 1;
    }

    debug!("tracker thread stopped");
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FrameGrabber;
    use crate::poses::{synthetic_hand, Placement, Pose};
    use std::time::{Duration, Instant};

    /// Yields `frames` non-empty frames, then fails.
    struct FiniteGrabber { next: u64, frames: u64 }

    impl FrameGrabber for FiniteGrabber {
        fn grab(&mut self) -> Result<VideoFrame, CameraError> {
            if self.next >= self.frames {
                return Err(CameraError::unavailable("end of test stream"));
            }
            let seq = self.next;
            self.next += 1;
            Ok(VideoFrame { seq, width: 1, height: 1, channels: 3, data: vec![0; 3] })
        }
    }

    /// Encodes the frame number in the hand confidence.
    struct SeqModel { frames: u64 }

    impl LandmarkModel for SeqModel {
        fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, TrackerError> {
            let mut h = synthetic_hand(Pose::Open, Placement::default());
            h.confidence = (frame.seq + 1) as f32 / self.frames as f32;
            Ok(vec![h])
        }
    }

    struct FailingModel;
    impl LandmarkModel for FailingModel {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<HandLandmarks>, TrackerError> {
            Err(TrackerError::Backend("model crashed".into()))
        }
    }

    struct DeadModel;
    impl LandmarkModel for DeadModel {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<HandLandmarks>, TrackerError> {
            Err(TrackerError::Terminated("landmarker exited".into()))
        }
    }

    /// Endless slow frames; raises `released` when dropped.
    struct HeldDevice { released: Arc<AtomicBool> }

    impl FrameGrabber for HeldDevice {
        fn grab(&mut self) -> Result<VideoFrame, CameraError> {
            thread::sleep(Duration::from_millis(10));
            Ok(VideoFrame { seq: 0, width: 1, height: 1, channels: 3, data: vec![0; 3] })
        }
    }

    impl Drop for HeldDevice {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    fn stream(frames: u64) -> VideoStream {
        VideoStream::new("finite", Box::new(FiniteGrabber { next: 0, frames }))
    }

    fn wait_for_exit(t: &ThreadedTracker) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while t.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!t.is_running(), "tracker thread did not finish");
    }

    #[test]
    fn slow_consumer_sees_only_newest_result() {
        let mut t = ThreadedTracker::spawn(stream(20), SeqModel { frames: 20 }, 0.0);
        wait_for_exit(&t);

        match t.next_landmarks() {
            TrackerPoll::Hand(h) => assert!((h.confidence - 1.0).abs() < 1e-6),
            other => panic!("expected newest hand, got {:?}", other),
        }
        assert_eq!(t.next_landmarks(), TrackerPoll::Pending);

        let (published, dropped) = t.stats();
        assert_eq!(published, 20);
        assert_eq!(dropped, 19);
    }

    #[test]
    fn stream_end_is_reported_once() {
        let mut t = ThreadedTracker::spawn(stream(1), SeqModel { frames: 1 }, 0.0);
        wait_for_exit(&t);
        assert!(matches!(t.fatal_error(), Some(CameraError::DeviceUnavailable(_))));
        assert!(t.fatal_error().is_none());
    }

    #[test]
    fn model_error_reads_as_lost() {
        let mut t = ThreadedTracker::spawn(stream(3), FailingModel, 0.0);
        wait_for_exit(&t);
        assert_eq!(t.next_landmarks(), TrackerPoll::Lost);
    }

    #[test]
    fn low_confidence_hand_reads_as_lost() {
        // Single frame → confidence 1/1 = 1.0, so demand more than that.
        let mut t = ThreadedTracker::spawn(stream(1), SeqModel { frames: 1 }, 1.5);
        wait_for_exit(&t);
        assert_eq!(t.next_landmarks(), TrackerPoll::Lost);
    }

    #[test]
    fn terminated_model_is_fatal() {
        let mut t = ThreadedTracker::spawn(stream(100), DeadModel, 0.0);
        wait_for_exit(&t);
        match t.fatal_error() {
            Some(CameraError::DeviceUnavailable(msg)) => assert!(msg.contains("landmarker exited")),
            other => panic!("expected fatal error, got {:?}", other),
        }
        assert_eq!(t.next_landmarks(), TrackerPoll::Pending);
        assert_eq!(t.stats().0, 0);
    }

    #[test]
    fn drop_releases_the_stream() {
        let released = Arc::new(AtomicBool::new(false));
        let grabber = HeldDevice { released: released.clone() };
        let t = ThreadedTracker::spawn(VideoStream::new("held", Box::new(grabber)), SeqModel { frames: 1 }, 0.0);
        thread::sleep(Duration::from_millis(20));
        assert!(!released.load(Ordering::SeqCst));
        drop(t);
        assert!(released.load(Ordering::SeqCst));
    }
}
