//! # hand_gesture
//!
//! Everything between the webcam and a discrete gesture symbol:
//!
//! ```text
//! CameraSource ──► FrameGrabber ──► LandmarkModel ──► HandTracker
//!                                   (worker thread)        │
//!                                                          ▼
//!                       GestureDebouncer ◄── classify() ◄── HandLandmarks
//! ```
//!
//! The crate knows nothing about windows, photos or formations.  Backends
//! (real webcam, MediaPipe, keyboard simulation) plug in through the
//! [`CameraSource`] and [`LandmarkModel`] traits.
//!
//! ## Gesture vocabulary
//!
//! | Pose | Symbol |
//! |---|---|
//! | All four fingers extended | [`GestureSymbol::Open`] |
//! | All four fingers curled | [`GestureSymbol::Fist`] |
//! | Thumb tip touching index tip, other fingers not curled | [`GestureSymbol::Pinch`] |
//! | Anything else, no hand, low confidence | [`GestureSymbol::None`] |

pub mod error;
pub mod landmarks;
pub mod poses;
pub mod classifier;
pub mod debounce;
pub mod camera;
pub mod tracker;
pub mod sim;

pub use error::{CameraError, TrackerError};
pub use landmarks::{Handedness, HandLandmarks, Landmark};
pub use classifier::{classify, ClassifierConfig, GestureSymbol};
pub use debounce::GestureDebouncer;
pub use camera::{CameraSession, CameraSource, FrameGrabber, SessionPhase, VideoFrame, VideoStream};
pub use tracker::{HandTracker, LandmarkModel, ThreadedTracker, TrackerPoll};
pub use poses::{Placement, Pose};
pub use sim::{PoseHandle, SimCamera, SimPoseModel};
