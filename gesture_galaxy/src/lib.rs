//! # gesture_galaxy
//!
//! A 3D galaxy of photos steered by hand gestures seen through the webcam,
//! software-rendered in a minifb window.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Open hand (all fingers extended) | Scatter the photos over a wide sphere |
//! | Fist (all fingers curled) | Gather them into a tight cluster |
//! | Pinch (thumb tip on index tip) | Bring the photo nearest the viewer to the front |
//! | No hand / anything else | Keep the current formation |
//!
//! A gesture only counts once it has been seen on several consecutive
//! tracker frames (`--dwell-frames`).
//!
//! ## Photos
//!
//! `photos/1.jpg ..= photos/N.jpg` are listed at start-up.  More can be added
//! while running, with `--upload` or by typing paths into the console; files
//! over the size limit are skipped with a warning.  New photos take their
//! place in the current formation without disturbing the others.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: keys hold a synthetic hand pose.
//! * `webcam` — **Hardware mode**: OpenCV capture plus a MediaPipe hand
//!   landmarker subprocess (`scripts/hand_detect.py`).
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `O` / hold | Open hand (simulation only) |
//! | `F` / hold | Fist (simulation only) |
//! | `P` / hold | Pinch (simulation only) |
//! | `R` | Restart the whole session (retry after a camera error) |
//! | `Q` / `Escape` | Quit |

pub mod error;
pub mod config;
pub mod gesture;
pub mod backend;
pub mod mediapipe;
pub mod textures;
pub mod uploader;
pub mod visualizer;
pub mod app;
