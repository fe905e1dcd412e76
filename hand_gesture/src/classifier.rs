//! Landmark set → gesture symbol.
//!
//! [`classify`] is a pure function: the same landmarks and config always give
//! the same symbol.  Temporal smoothing lives in [`crate::debounce`].
//!
//! # Features
//!
//! All distances are divided by the hand's own palm size (wrist → middle
//! MCP), so the rule works at any distance from the camera.
//!
//! * **finger reach** — `|tip − wrist| / |mcp − wrist|` for index, middle,
//!   ring and pinky.  About 1.9 for a straight finger, below 1.0 for a finger
//!   folded into the palm.
//! * **pinch gap** — `|thumb_tip − index_tip| / palm_size`.
//!
//! A pose that matches zero or several rules is [`GestureSymbol::None`].

use std::fmt;

use crate::landmarks::{HandLandmarks, FINGERS, INDEX_TIP, THUMB_TIP, WRIST};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureSymbol {
    Open,
    Fist,
    Pinch,
    None,
}

impl GestureSymbol {
    pub fn name(self) -> &'static str {
        match self {
            GestureSymbol::Open  => "OPEN",
            GestureSymbol::Fist  => "FIST",
            GestureSymbol::Pinch => "PINCH",
            GestureSymbol::None  => "NONE",
        }
    }
}

impl fmt::Display for GestureSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tunable thresholds.  Calibrate per camera and lighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierConfig {
    /// Hands below this detector confidence classify as `None`.
    pub min_confidence: f32,
    /// Finger reach above this counts as extended.
    pub extended_ratio: f32,
    /// Finger reach below this counts as curled.
    pub curled_ratio:   f32,
    /// Pinch gap below this (in palm sizes) counts as touching.
    pub pinch_ratio:    f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            min_confidence: 0.5,
            extended_ratio: 1.5,
            curled_ratio:   1.1,
            pinch_ratio:    0.2,
        }
    }
}

/// Per-finger reach ratios, index → pinky.
pub fn finger_reach(hand: &HandLandmarks) -> [f32; 4] {
    let wrist = hand.point(WRIST);
    let mut out = [0.0; 4];
    for (r, joints) in out.iter_mut().zip(FINGERS.iter()) {
        let base = wrist.distance(hand.point(joints[0]));
        let tip  = wrist.distance(hand.point(joints[3]));
        *r = if base > f32::EPSILON { tip / base } else { 0.0 };
    }
    out
}

/// Thumb-tip to index-tip distance in palm sizes.
pub fn pinch_gap(hand: &HandLandmarks) -> f32 {
    hand.point(THUMB_TIP).distance(hand.point(INDEX_TIP)) / hand.palm_size()
}

/// Classify one landmark set.
pub fn classify(hand: &HandLandmarks, cfg: &ClassifierConfig) -> GestureSymbol {
    if !hand.is_finite() || hand.confidence < cfg.min_confidence {
        return GestureSymbol::None;
    }
    if hand.palm_size() <= f32::EPSILON {
        return GestureSymbol::None;
    }

    let reach    = finger_reach(hand);
    let extended = reach.map(|r| r > cfg.extended_ratio);
    let curled   = reach.map(|r| r < cfg.curled_ratio);

    let open  = extended.iter().all(|&e| e);
    let fist  = curled.iter().all(|&c| c);
    let pinch = pinch_gap(hand) < cfg.pinch_ratio && !curled[1..].iter().all(|&c| c);

    match (open, fist, pinch) {
        (true,  false, false) => GestureSymbol::Open,
        (false, true,  false) => GestureSymbol::Fist,
        (false, false, true)  => GestureSymbol::Pinch,
        _                     => GestureSymbol::None,
    }
}

/// Classify an optional hand; no hand is `None`.
pub fn classify_frame(hand: Option<&HandLandmarks>, cfg: &ClassifierConfig) -> GestureSymbol {
    hand.map_or(GestureSymbol::None, |h| classify(h, cfg))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
