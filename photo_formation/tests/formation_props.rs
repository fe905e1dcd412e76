//! Property tests for the formation controller.

use hand_gesture::GestureSymbol;
use photo_formation::{Formation, FormationController, LayoutParams};
use proptest::prelude::*;

const DT: f32 = 1.0 / 60.0;

fn symbol() -> impl Strategy<Value = GestureSymbol> {
    prop_oneof![
        Just(GestureSymbol::Open),
        Just(GestureSymbol::Fist),
        Just(GestureSymbol::Pinch),
        Just(GestureSymbol::None),
    ]
}

fn controller(n: usize) -> FormationController {
    let mut c = FormationController::new(LayoutParams::default(), 4.0);
    c.sync_count(n);
    c
}

proptest! {
    #[test]
    fn formation_follows_last_decisive_gesture(
        n in 0usize..20,
        stream in proptest::collection::vec(symbol(), 0..40),
    ) {
        let mut c = controller(n);
        let mut expected = Formation::Scattered;
        for s in stream {
            c.apply_gesture(s);
            c.update(DT);
            if let Some(f) = Formation::for_gesture(s) {
                expected = f;
            }
            prop_assert_eq!(c.formation(), expected);
        }
    }

    #[test]
    fn one_target_per_photo(
        start in 0usize..15,
        grows in proptest::collection::vec(0usize..6, 0..6),
        stream in proptest::collection::vec(symbol(), 0..12),
    ) {
        let mut c = controller(start);
        let mut total = start;
        for (i, g) in grows.iter().enumerate() {
            if let Some(s) = stream.get(i) { c.apply_gesture(*s); }
            total += g;
            c.sync_count(total);
            c.update(DT);
            prop_assert_eq!(c.len(), total);
            for (id, p) in c.particles().iter().enumerate() {
                prop_assert_eq!(p.id, id);
                prop_assert!(p.target.position.iter().all(|v| v.is_finite()));
            }
        }
    }

    #[test]
    fn growth_never_moves_existing_photos(
        n in 1usize..20,
        extra in 1usize..10,
        frames in 0usize..30,
        s in symbol(),
    ) {
        let mut c = controller(n);
        c.apply_gesture(s);
        for _ in 0..frames { c.update(DT); }
        let before: Vec<_> = c.particles().iter().map(|p| p.current).collect();
        c.sync_count(n + extra);
        for (i, cur) in before.iter().enumerate() {
            prop_assert_eq!(&c.particles()[i].current, cur);
        }
    }

    #[test]
    fn convergence_is_idempotent(n in 0usize..12, s in symbol()) {
        let mut c = controller(n);
        c.apply_gesture(s);
        for _ in 0..3000 { c.update(DT); }
        prop_assert!(c.is_settled(0.0));
        let snapshot = c.particles().to_vec();
        prop_assert!(!c.update(DT));
        prop_assert_eq!(c.particles(), &snapshot[..]);
    }
}
