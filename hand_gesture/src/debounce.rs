//! Dwell-time smoothing of the per-frame gesture stream.
//!
//! A new symbol must be observed for `dwell_frames` consecutive tracker
//! results before it replaces the stable symbol.  Single-frame jitter
//! (a fist that reads as `NONE` for one frame, a pinch flickering through
//! `OPEN`) never reaches the formation controller.

use crate::classifier::GestureSymbol;

#[derive(Clone, Debug)]
pub struct GestureDebouncer {
    dwell_frames: u32,
    stable:       GestureSymbol,
    candidate:    GestureSymbol,
    streak:       u32,
}

impl GestureDebouncer {
    /// `dwell_frames` of 0 or 1 means every symbol change is accepted at once.
    pub fn new(dwell_frames: u32) -> Self {
        GestureDebouncer {
            dwell_frames: dwell_frames.max(1),
            stable:       GestureSymbol::None,
            candidate:    GestureSymbol::None,
            streak:       0,
        }
    }

    pub fn dwell_frames(&self) -> u32 { self.dwell_frames }

    /// The currently accepted symbol.
    pub fn stable(&self) -> GestureSymbol { self.stable }

    /// Feed one frame's raw symbol.  Returns the new stable symbol when it
    /// changes, `None` otherwise.
    pub fn push(&mut self, symbol: GestureSymbol) -> Option<GestureSymbol> {
        if symbol == self.candidate {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.candidate = symbol;
            self.streak = 1;
        }

        if self.streak >= self.dwell_frames && self.candidate != self.stable {
            self.stable = self.candidate;
            return Some(self.stable);
        }
        None
    }

    pub fn reset(&mut self) {
        self.stable = GestureSymbol::None;
        self.candidate = GestureSymbol::None;
        self.streak = 0;
    }
}

impl Default for GestureDebouncer {
    fn default() -> Self { Self::new(4) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::GestureSymbol as G;

    #[test]
    fn emits_after_dwell_window() {
        let mut d = GestureDebouncer::new(3);
        assert_eq!(d.push(G::Fist), None);
        assert_eq!(d.push(G::Fist), None);
        assert_eq!(d.push(G::Fist), Some(G::Fist));
        assert_eq!(d.stable(), G::Fist);
    }

    #[test]
    fn single_frame_jitter_is_suppressed() {
        let mut d = GestureDebouncer::new(3);
        for _ in 0..3 { d.push(G::Open); }
        assert_eq!(d.stable(), G::Open);
        assert_eq!(d.push(G::Fist), None);
        assert_eq!(d.push(G::Open), None);
        assert_eq!(d.push(G::Open), None);
        assert_eq!(d.stable(), G::Open);
    }

    #[test]
    fn interrupted_streak_restarts() {
        let mut d = GestureDebouncer::new(3);
        d.push(G::Pinch);
        d.push(G::Pinch);
        d.push(G::None);
        assert_eq!(d.push(G::Pinch), None);
        assert_eq!(d.push(G::Pinch), None);
        assert_eq!(d.push(G::Pinch), Some(G::Pinch));
    }

    #[test]
    fn holding_a_symbol_emits_once() {
        let mut d = GestureDebouncer::new(2);
        let emitted: Vec<_> = (0..10).filter_map(|_| d.push(G::Fist)).collect();
        assert_eq!(emitted, vec![G::Fist]);
    }

    #[test]
    fn zero_dwell_behaves_like_one() {
        let mut d = GestureDebouncer::new(0);
        assert_eq!(d.dwell_frames(), 1);
        assert_eq!(d.push(G::Open), Some(G::Open));
    }

    #[test]
    fn losing_the_hand_settles_to_none() {
        let mut d = GestureDebouncer::new(2);
        d.push(G::Open);
        d.push(G::Open);
        d.push(G::None);
        assert_eq!(d.push(G::None), Some(G::None));
    }
}
