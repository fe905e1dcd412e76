//! Error types for camera acquisition and hand tracking.

use thiserror::Error;

/// Camera / tracking initialisation failures.
///
/// All three are fatal to the session: they are reported once through the
/// session's error callback and never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The user (or the OS) refused access to the camera.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// No camera, camera busy, or the stream died.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// The platform or build cannot capture video or run the tracker.
    #[error("camera not supported: {0}")]
    NotSupported(String),
}

impl CameraError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable(msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }
}

/// Tracking failure.
///
/// `Backend` and `Malformed` are per frame: the tracker turns them into "no
/// hand this frame".  `Terminated` means the model is gone for good; the
/// tracker stops and reports it as a fatal camera error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("tracker backend error: {0}")]
    Backend(String),

    #[error("malformed detection: {0}")]
    Malformed(String),

    #[error("hand tracker stopped: {0}")]
    Terminated(String),
}

impl TrackerError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackerError::Terminated(_))
    }
}
