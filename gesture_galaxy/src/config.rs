//! Command line and the resolved application configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use hand_gesture::{CameraError, ClassifierConfig};
use photo_formation::LayoutParams;

use crate::error::MIB;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Everything `run()` needs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Directory holding the static set `1.jpg ..= N.jpg`.
    pub photos_dir:       PathBuf,
    pub static_count:     usize,
    /// Files uploaded as soon as the window opens.
    pub initial_uploads:  Vec<PathBuf>,
    pub max_upload_bytes: u64,

    pub classifier:       ClassifierConfig,
    pub dwell_frames:     u32,

    pub smoothing_rate:   f32,
    pub layout:           LayoutParams,

    /// OpenCV device index (webcam builds).
    pub camera_index:     i32,
    /// Frame rate of the simulated camera.
    pub sim_fps:          u32,
    /// Make the simulated camera fail to open with this error.
    pub sim_camera_fail:  Option<CameraError>,
    /// Start reading upload paths from stdin.
    pub upload_console:   bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            photos_dir:       PathBuf::from("photos"),
            static_count:     41,
            initial_uploads:  Vec::new(),
            max_upload_bytes: 15 * MIB,
            classifier:       ClassifierConfig::default(),
            dwell_frames:     4,
            smoothing_rate:   4.0,
            layout:           LayoutParams::default(),
            camera_index:     0,
            sim_fps:          30,
            sim_camera_fail:  None,
            upload_console:   true,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CLI
// ════════════════════════════════════════════════════════════════════════════

/// Camera failure to simulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailKind {
    Permission,
    Unavailable,
    Unsupported,
}

impl FailKind {
    pub fn to_error(self) -> CameraError {
        match self {
            FailKind::Permission  => CameraError::permission_denied("simulated: user refused camera access"),
            FailKind::Unavailable => CameraError::unavailable("simulated: no camera attached"),
            FailKind::Unsupported => CameraError::not_supported("simulated: capture API missing"),
        }
    }
}

/// Gesture-controlled 3D photo galaxy
#[derive(Parser, Debug)]
#[command(name = "gesture_galaxy")]
#[command(about = "Open hand scatters, fist gathers, pinch focuses", long_about = None)]
pub struct Args {
    /// Directory holding the static photos 1.jpg ..= N.jpg
    #[arg(long, default_value = "photos")]
    pub photos_dir: PathBuf,

    /// Number of static photos to list
    #[arg(long, default_value = "41")]
    pub static_count: usize,

    /// Extra photos to upload at start-up
    #[arg(short, long, num_args = 1..)]
    pub upload: Vec<PathBuf>,

    /// Per-file upload ceiling in MiB
    #[arg(long, default_value = "15")]
    pub max_upload_mb: u64,

    /// Consecutive tracker frames a gesture must hold before it counts
    #[arg(long, default_value = "4")]
    pub dwell_frames: u32,

    /// Hands below this tracker confidence are ignored
    #[arg(long, default_value = "0.5")]
    pub min_confidence: f32,

    /// Tip/knuckle reach above which a finger counts as extended
    #[arg(long, default_value = "1.5")]
    pub extended_ratio: f32,

    /// Tip/knuckle reach below which a finger counts as curled
    #[arg(long, default_value = "1.1")]
    pub curled_ratio: f32,

    /// Thumb-index gap (in palm sizes) below which the hand pinches
    #[arg(long, default_value = "0.2")]
    pub pinch_ratio: f32,

    /// Approach rate of photos toward their targets, per second
    #[arg(long, default_value = "4.0")]
    pub smoothing: f32,

    /// Layout seed
    #[arg(short, long, default_value = "42")]
    pub seed: u64,

    /// Webcam device index
    #[arg(long, default_value = "0")]
    pub camera: i32,

    /// Make the simulated camera fail to open
    #[arg(long, value_enum)]
    pub sim_camera_fail: Option<FailKind>,

    /// Do not read upload paths from stdin
    #[arg(long)]
    pub no_console: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn into_config(self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            photos_dir:       self.photos_dir,
            static_count:     self.static_count,
            initial_uploads:  self.upload,
            max_upload_bytes: self.max_upload_mb.saturating_mul(MIB),
            classifier: ClassifierConfig {
                min_confidence: self.min_confidence,
                extended_ratio: self.extended_ratio,
                curled_ratio:   self.curled_ratio,
                pinch_ratio:    self.pinch_ratio,
            },
            dwell_frames:     self.dwell_frames.max(1),
            smoothing_rate:   self.smoothing,
            layout:           LayoutParams { seed: self.seed, ..defaults.layout },
            camera_index:     self.camera,
            sim_fps:          defaults.sim_fps,
            sim_camera_fail:  self.sim_camera_fail.map(FailKind::to_error),
            upload_console:   !self.no_console,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_config_defaults() {
        let cfg = Args::parse_from(["gesture_galaxy"]).into_config();
        let def = AppConfig::default();
        assert_eq!(cfg.photos_dir, def.photos_dir);
        assert_eq!(cfg.static_count, 41);
        assert_eq!(cfg.max_upload_bytes, 15 * MIB);
        assert_eq!(cfg.classifier, def.classifier);
        assert_eq!(cfg.dwell_frames, 4);
        assert_eq!(cfg.layout, def.layout);
        assert!(cfg.sim_camera_fail.is_none());
    }

    #[test]
    fn flags_override() {
        let cfg = Args::parse_from([
            "gesture_galaxy", "--dwell-frames", "0", "--seed", "7",
            "--upload", "a.jpg", "b.png", "--sim-camera-fail", "permission",
        ]).into_config();
        assert_eq!(cfg.dwell_frames, 1);
        assert_eq!(cfg.layout.seed, 7);
        assert_eq!(cfg.initial_uploads, [PathBuf::from("a.jpg"), PathBuf::from("b.png")]);
        assert!(matches!(cfg.sim_camera_fail, Some(CameraError::PermissionDenied(_))));
    }
}
