//! Hand landmark sets in the 21-point MediaPipe topology.

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// The four long fingers as (mcp, pip, dip, tip) index quadruples,
/// ordered index → pinky.
pub const FINGERS: [[usize; 4]; 4] = [
    [INDEX_MCP,  INDEX_PIP,  INDEX_DIP,  INDEX_TIP],
    [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
    [RING_MCP,   RING_PIP,   RING_DIP,   RING_TIP],
    [PINKY_MCP,  PINKY_PIP,  PINKY_DIP,  PINKY_TIP],
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One keypoint in normalized camera space.
///
/// `x` and `y` are 0.0–1.0 fractions of the image (y grows downward),
/// `z` is depth relative to the wrist in roughly the same units as `x`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "left"  => Handedness::Left,
            "right" => Handedness::Right,
            _       => Handedness::Unknown,
        }
    }
}

/// One tracked hand for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    pub points:     [Landmark; LANDMARK_COUNT],
    /// Detector confidence, 0.0–1.0.
    pub confidence: f32,
    pub handedness: Handedness,
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT], confidence: f32) -> Self {
        HandLandmarks { points, confidence, handedness: Handedness::Unknown }
    }

    /// Build from a slice, rejecting anything that is not exactly 21 points.
    pub fn from_slice(points: &[Landmark], confidence: f32) -> Option<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self::new(points, confidence))
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = handedness;
        self
    }

    pub fn point(&self, idx: usize) -> &Landmark {
        &self.points[idx]
    }

    /// Wrist → middle-finger MCP distance; the hand's own unit of length.
    pub fn palm_size(&self) -> f32 {
        self.points[WRIST].distance(&self.points[MIDDLE_MCP])
    }

    pub fn is_finite(&self) -> bool {
        self.confidence.is_finite() && self.points.iter().all(Landmark::is_finite)
    }
}

/// Collapse a multi-hand detection to the single most confident hand.
pub fn most_confident(hands: Vec<HandLandmarks>) -> Option<HandLandmarks> {
    hands.into_iter().fold(None, |best, h| match best {
        Some(b) if b.confidence >= h.confidence => Some(b),
        _ => Some(h),
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hand(confidence: f32) -> HandLandmarks {
        HandLandmarks::new([Landmark::default(); LANDMARK_COUNT], confidence)
    }

    #[test]
    fn distance_is_euclidean_3d() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.3, 0.4, 0.0);
        assert_relative_eq!(a.distance(&b), 0.5, epsilon = 1e-6);
        let c = Landmark::new(0.0, 0.0, 2.0);
        assert_relative_eq!(a.distance(&c), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn from_slice_requires_21_points() {
        assert!(HandLandmarks::from_slice(&[Landmark::default(); 20], 1.0).is_none());
        assert!(HandLandmarks::from_slice(&[Landmark::default(); 21], 1.0).is_some());
    }

    #[test]
    fn most_confident_picks_highest_score() {
        let best = most_confident(vec![hand(0.4), hand(0.9), hand(0.7)]).unwrap();
        assert_relative_eq!(best.confidence, 0.9);
    }

    #[test]
    fn most_confident_of_nothing_is_none() {
        assert!(most_confident(Vec::new()).is_none());
    }

    #[test]
    fn handedness_parse_is_case_insensitive() {
        assert_eq!(Handedness::parse("Left"), Handedness::Left);
        assert_eq!(Handedness::parse(" RIGHT "), Handedness::Right);
        assert_eq!(Handedness::parse("?"), Handedness::Unknown);
    }

    #[test]
    fn nan_point_is_not_finite() {
        let mut h = hand(1.0);
        assert!(h.is_finite());
        h.points[INDEX_TIP].x = f32::NAN;
        assert!(!h.is_finite());
    }
}
