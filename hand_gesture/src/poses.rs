//! Synthetic hand poses.
//!
//! Used by the keyboard simulation backend (hold a key → the "camera" sees
//! that pose) and by tests.  Poses are authored in hand-local units where
//! the wrist is the origin and the wrist → middle-MCP distance is 1.0, then
//! placed into normalized camera space with [`synthetic_hand`].

use crate::landmarks::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pose {
    Open,
    Fist,
    Pinch,
}

/// Where and how large the synthetic hand appears in the image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Wrist position in normalized camera space.
    pub wrist: Landmark,
    /// Palm size (wrist → middle MCP) in normalized units.
    pub scale: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Placement { wrist: Landmark::new(0.5, 0.8, 0.0), scale: 0.2 }
    }
}

// ── finger shapes, as offsets from the finger's MCP ─────────────────────────

const EXTENDED: [[f32; 3]; 3] = [[0.0, -0.40, 0.0], [0.0, -0.70, 0.0], [0.0, -0.95, 0.0]];
const CURLED:   [[f32; 3]; 3] = [[0.0, -0.30, -0.15], [0.0, -0.15, -0.30], [0.0, 0.25, -0.20]];
const HOOKED:   [[f32; 3]; 3] = [[-0.10, -0.35, -0.05], [-0.30, -0.40, -0.10], [-0.40, -0.25, -0.15]];

const MCPS: [[f32; 3]; 4] = [
    [-0.30, -1.00, 0.0],
    [ 0.00, -1.00, 0.0],
    [ 0.28, -0.97, 0.0],
    [ 0.52, -0.88, 0.0],
];

// Pinky segments are shorter than the others.
const FINGER_LENGTH: [f32; 4] = [1.0, 1.0, 1.0, 0.75];

const THUMB_OPEN:  [[f32; 3]; 4] = [[-0.25, -0.2, 0.0], [-0.50, -0.40, 0.0], [-0.70, -0.60, 0.0], [-0.85, -0.80, 0.0]];
const THUMB_FIST:  [[f32; 3]; 4] = [[-0.25, -0.2, 0.0], [-0.40, -0.45, 0.0], [-0.25, -0.65, -0.20], [ 0.00, -0.65, -0.25]];
const THUMB_PINCH: [[f32; 3]; 4] = [[-0.25, -0.2, 0.0], [-0.50, -0.45, 0.0], [-0.65, -0.80, -0.10], [-0.72, -1.20, -0.15]];

/// Local (hand-unit) coordinates for all 21 landmarks of `pose`.
pub fn local_points(pose: Pose) -> [[f32; 3]; LANDMARK_COUNT] {
    let (thumb, shapes) = match pose {
        Pose::Open  => (THUMB_OPEN,  [EXTENDED, EXTENDED, EXTENDED, EXTENDED]),
        Pose::Fist  => (THUMB_FIST,  [CURLED,   CURLED,   CURLED,   CURLED]),
        Pose::Pinch => (THUMB_PINCH, [HOOKED,   EXTENDED, EXTENDED, EXTENDED]),
    };

    let mut pts = [[0.0; 3]; LANDMARK_COUNT];
    pts[THUMB_CMC..=THUMB_TIP].copy_from_slice(&thumb);

    for (f, joints) in FINGERS.iter().enumerate() {
        let mcp = MCPS[f];
        pts[joints[0]] = mcp;
        for (seg, off) in shapes[f].iter().enumerate() {
            let k = FINGER_LENGTH[f];
            pts[joints[seg + 1]] = [mcp[0] + off[0] * k, mcp[1] + off[1] * k, mcp[2] + off[2] * k];
        }
    }
    pts
}

/// A full-confidence synthetic hand in `pose`, placed into camera space.
pub fn synthetic_hand(pose: Pose, placement: Placement) -> HandLandmarks {
    let local = local_points(pose);
    let w = placement.wrist;
    let s = placement.scale;
    let mut points = [Landmark::default(); LANDMARK_COUNT];
    for (p, l) in points.iter_mut().zip(local.iter()) {
        *p = Landmark::new(w.x + l[0] * s, w.y + l[1] * s, w.z + l[2] * s);
    }
    HandLandmarks::new(points, 1.0).with_handedness(Handedness::Right)
}
