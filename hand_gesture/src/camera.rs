//! Camera acquisition contract and the one-shot session around it.
//!
//! A [`CameraSource`] is started exactly once per session.  Success hands
//! back a [`VideoStream`] that can be moved to a tracking thread; failure
//! is terminal.  [`CameraSession`] owns the two outbound callbacks and
//! guarantees each fires at most once:
//!
//! * `on_ready()` — after the stream is live **and** the first frame has been
//!   through the tracker,
//! * `on_error(message)` — on any camera/tracking initialisation failure.
//!
//! There is no retry.  Recovering means throwing the session away and
//! building a new one (a full restart).

use tracing::{info, warn};

use crate::error::CameraError;

// ════════════════════════════════════════════════════════════════════════════
// VideoFrame / FrameGrabber / VideoStream
// ════════════════════════════════════════════════════════════════════════════

/// One captured frame, tightly packed rows of `channels` bytes per pixel.
#[derive(Clone, Debug, Default)]
pub struct VideoFrame {
    /// Monotonic capture counter, starting at 0.
    pub seq:      u64,
    pub width:    u32,
    pub height:   u32,
    pub channels: u32,
    pub data:     Vec<u8>,
}

impl VideoFrame {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// Pull side of a live camera.  `grab` blocks until the next frame.
///
/// Implementations must hand out the newest frame available, never a
/// backlog: if the consumer is slow, intermediate frames are lost.
pub trait FrameGrabber: Send {
    fn grab(&mut self) -> Result<VideoFrame, CameraError>;
}

/// Handle to a live stream, returned by [`CameraSource::start`].
pub struct VideoStream {
    label:   String,
    grabber: Box<dyn FrameGrabber>,
}

impl VideoStream {
    pub fn new(label: impl Into<String>, grabber: Box<dyn FrameGrabber>) -> Self {
        VideoStream { label: label.into(), grabber }
    }

    pub fn label(&self) -> &str { &self.label }

    pub fn grab(&mut self) -> Result<VideoFrame, CameraError> {
        self.grabber.grab()
    }
}

impl std::fmt::Debug for VideoStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoStream").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Anything that can open a camera.
pub trait CameraSource {
    fn start(&mut self) -> Result<VideoStream, CameraError>;
}

impl<S: CameraSource + ?Sized> CameraSource for Box<S> {
    fn start(&mut self) -> Result<VideoStream, CameraError> {
        (**self).start()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CameraSession
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// `start()` not called yet.
    Idle,
    /// Stream is open, waiting for the tracker to process a first frame.
    AwaitingFirstFrame,
    /// Ready callback has fired.
    Live,
    /// Error callback has fired; nothing more will happen until restart.
    Failed,
}

type ReadyCallback = Box<dyn FnOnce()>;
type ErrorCallback = Box<dyn FnOnce(String)>;

pub struct CameraSession<S: CameraSource> {
    source:   S,
    phase:    SessionPhase,
    on_ready: Option<ReadyCallback>,
    on_error: Option<ErrorCallback>,
}

impl<S: CameraSource> CameraSession<S> {
    pub fn new(
        source:   S,
        on_ready: impl FnOnce() + 'static,
        on_error: impl FnOnce(String) + 'static,
    ) -> Self {
        CameraSession {
            source,
            phase:    SessionPhase::Idle,
            on_ready: Some(Box::new(on_ready)),
            on_error: Some(Box::new(on_error)),
        }
    }

    pub fn phase(&self) -> SessionPhase { self.phase }

    pub fn is_failed(&self) -> bool { self.phase == SessionPhase::Failed }

    /// Open the camera.  Only the first call on a fresh session touches the
    /// source; later calls return `None` without any camera operation.
    pub fn start(&mut self) -> Option<VideoStream> {
        if self.phase != SessionPhase::Idle {
            warn!(phase = ?self.phase, "camera start ignored; session already used");
            return None;
        }
        match self.source.start() {
            Ok(stream) => {
                info!(stream = stream.label(), "camera stream open");
                self.phase = SessionPhase::AwaitingFirstFrame;
                Some(stream)
            }
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// The tracker has produced its first result.  Fires `on_ready` once.
    pub fn first_frame_processed(&mut self) {
        if self.phase != SessionPhase::AwaitingFirstFrame {
            return;
        }
        self.phase = SessionPhase::Live;
        info!("camera ready");
        if let Some(cb) = self.on_ready.take() {
            cb();
        }
    }

    /// Report an unrecoverable failure.  Fires `on_error` at most once and
    /// moves the session to the terminal `Failed` phase.
    pub fn fail(&mut self, err: CameraError) {
        if self.phase == SessionPhase::Failed {
            return;
        }
        warn!(error = %err, "camera session failed");
        self.phase = SessionPhase::Failed;
        self.on_ready = None;
        if let Some(cb) = self.on_error.take() {
            cb(err.to_string());
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
