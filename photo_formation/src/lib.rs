//! # photo_formation
//!
//! The spatial half of the photo galaxy: which formation is active, where
//! every photo should be, and how it gets there.
//!
//! ## Gesture → Formation
//!
//! | Gesture | Formation | Layout |
//! |---|---|---|
//! | Open hand | [`Formation::Scattered`] | Fibonacci sphere, large radius |
//! | Fist | [`Formation::Gathered`] | Tight cluster at the origin |
//! | Pinch | [`Formation::Focused`] | One photo enlarged in front, the rest dimmed behind |
//! | No hand / unclear | — | Hold the current formation |
//!
//! ## Quick start
//!
//! ```rust
//! use photo_formation::{FormationController, LayoutParams, Formation};
//! use hand_gesture::GestureSymbol;
//!
//! let mut ctl = FormationController::new(LayoutParams::default(), 4.0);
//! ctl.sync_count(5);
//! ctl.apply_gesture(GestureSymbol::Fist);
//! assert_eq!(ctl.formation(), Formation::Gathered);
//! for _ in 0..120 { ctl.update(1.0 / 60.0); }
//! ```

pub mod error;
pub mod formation;
pub mod transform;
pub mod layout;
pub mod controller;
pub mod pool;

pub use error::PoolError;
pub use formation::Formation;
pub use transform::{smoothing_alpha, Transform};
pub use layout::{layout, LayoutParams};
pub use controller::{FormationController, Particle};
pub use pool::{ImageSource, Photo, PhotoPool, Texture, TextureSlot, UploadSender};
