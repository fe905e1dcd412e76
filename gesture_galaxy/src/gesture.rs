//! Per-frame gesture pipeline: tracker poll → classify → debounce.
//!
//! The render loop calls [`GesturePipeline::poll`] once per display frame and
//! gets back a [`GestureStep`].  It does not care whether the landmarks came
//! from a webcam or from the keyboard simulator.

use tracing::{debug, info};

use hand_gesture::{
    classify, CameraError, ClassifierConfig, GestureDebouncer, GestureSymbol, HandTracker, Pose,
    TrackerPoll,
};

// ════════════════════════════════════════════════════════════════════════════
// GestureStep
// ════════════════════════════════════════════════════════════════════════════

/// What one poll produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureStep {
    /// This poll carried the tracker's very first result.
    pub first_result: bool,
    /// Raw classification of a fresh tracker result, before debouncing.
    pub observed:     Option<GestureSymbol>,
    /// The debounced symbol changed to this.
    pub changed:      Option<GestureSymbol>,
    /// The camera stream died.
    pub fatal:        Option<CameraError>,
}

// ════════════════════════════════════════════════════════════════════════════
// GesturePipeline
// ════════════════════════════════════════════════════════════════════════════

pub struct GesturePipeline<T: HandTracker> {
    tracker:    T,
    classifier: ClassifierConfig,
    debouncer:  GestureDebouncer,
    results:    u64,
}

impl<T: HandTracker> GesturePipeline<T> {
    pub fn new(tracker: T, classifier: ClassifierConfig, dwell_frames: u32) -> Self {
        GesturePipeline {
            tracker,
            classifier,
            debouncer: GestureDebouncer::new(dwell_frames),
            results:   0,
        }
    }

    /// The debounced symbol currently in force.
    pub fn stable(&self) -> GestureSymbol { self.debouncer.stable() }

    /// Tracker results consumed so far.
    pub fn results(&self) -> u64 { self.results }

    pub fn poll(&mut self) -> GestureStep {
        let mut step = GestureStep { fatal: self.tracker.fatal_error(), ..GestureStep::default() };

        let symbol = match self.tracker.next_landmarks() {
            TrackerPoll::Pending    => return step,
            TrackerPoll::Lost       => GestureSymbol::None,
            TrackerPoll::Hand(hand) => classify(&hand, &self.classifier),
        };

        self.results += 1;
        step.first_result = self.results == 1;
        step.observed = Some(symbol);
        step.changed = self.debouncer.push(symbol);

        if let Some(s) = step.changed {
            info!(gesture = %s, "gesture");
        } else {
            debug!(observed = %symbol, stable = %self.debouncer.stable(), "tracker frame");
        }
        step
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Simulation keys
// ════════════════════════════════════════════════════════════════════════════

/// Keys that hold a simulated hand pose while pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    OpenHand,   // O
    Fist,       // F
    Pinch,      // P
}

impl SimKey {
    pub fn pose(self) -> Pose {
        match self {
            SimKey::OpenHand => Pose::Open,
            SimKey::Fist     => Pose::Fist,
            SimKey::Pinch    => Pose::Pinch,
        }
    }
}

/// Window commands outside the gesture vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Tear everything down and start a fresh session (the "retry" action).
    Restart,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use hand_gesture::poses::synthetic_hand;
    use hand_gesture::Placement;

    /// Replays a fixed list of polls.
    struct Script {
        polls: VecDeque<TrackerPoll>,
        fatal: Option<CameraError>,
    }

    impl HandTracker for Script {
        fn next_landmarks(&mut self) -> TrackerPoll {
            self.polls.pop_front().unwrap_or(TrackerPoll::Pending)
        }
        fn fatal_error(&mut self) -> Option<CameraError> {
            self.fatal.take()
        }
    }

    fn hand(pose: Pose) -> TrackerPoll {
        TrackerPoll::Hand(synthetic_hand(pose, Placement::default()))
    }

    fn pipeline(polls: Vec<TrackerPoll>, dwell: u32) -> GesturePipeline<Script> {
        GesturePipeline::new(Script { polls: polls.into(), fatal: None }, ClassifierConfig::default(), dwell)
    }

    #[test]
    fn pending_is_not_a_tracker_frame() {
        let mut p = pipeline(vec![TrackerPoll::Pending, hand(Pose::Fist)], 1);
        assert_eq!(p.poll(), GestureStep::default());
        let step = p.poll();
        assert!(step.first_result);
        assert_eq!(step.changed, Some(GestureSymbol::Fist));
    }

    #[test]
    fn fist_needs_full_dwell() {
        let mut p = pipeline(vec![hand(Pose::Fist); 4], 4);
        let changes: Vec<_> = (0..4).map(|_| p.poll().changed).collect();
        assert_eq!(changes, [None, None, None, Some(GestureSymbol::Fist)]);
        assert_eq!(p.stable(), GestureSymbol::Fist);
    }

    #[test]
    fn lost_hand_counts_as_none() {
        let mut p = pipeline(vec![hand(Pose::Open), TrackerPoll::Lost], 1);
        assert_eq!(p.poll().changed, Some(GestureSymbol::Open));
        let step = p.poll();
        assert_eq!(step.observed, Some(GestureSymbol::None));
        assert_eq!(step.changed, Some(GestureSymbol::None));
        assert!(!step.first_result);
    }

    #[test]
    fn fatal_error_surfaces_once() {
        let mut p = pipeline(Vec::new(), 1);
        p.tracker.fatal = Some(CameraError::unavailable("unplugged"));
        assert!(p.poll().fatal.is_some());
        assert!(p.poll().fatal.is_none());
    }

    #[test]
    fn keys_map_to_poses() {
        assert_eq!(SimKey::OpenHand.pose(), Pose::Open);
        assert_eq!(SimKey::Fist.pose(), Pose::Fist);
        assert_eq!(SimKey::Pinch.pose(), Pose::Pinch);
    }
}
