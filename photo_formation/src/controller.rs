//! The formation state machine and the per-frame particle integrator.
//!
//! `FormationController` owns one [`Particle`] per photo.  Gestures pick the
//! formation; the formation plus the photo count pick every particle's
//! target; [`FormationController::update`] eases every current transform
//! toward its target.  Current transforms are never set directly except for
//! a brand-new particle, which starts on its own target.

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use hand_gesture::GestureSymbol;

use crate::formation::Formation;
use crate::layout::{layout, LayoutParams};
use crate::transform::{smoothing_alpha, Transform};

/// One photo's spatial state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Stable index; equals the photo's index in the pool.
    pub id:      usize,
    pub current: Transform,
    pub target:  Transform,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Focus {
    index:    usize,
    /// Origin → viewer, unit length, frozen when focus was chosen.
    view_dir: Vector3<f32>,
}

pub struct FormationController {
    formation:      Formation,
    particles:      Vec<Particle>,
    params:         LayoutParams,
    /// Exponential approach rate, 1/s.
    smoothing_rate: f32,
    /// Viewer position in world space.
    viewer:         Vector3<f32>,
    focus:          Option<Focus>,
}

impl FormationController {
    pub fn new(params: LayoutParams, smoothing_rate: f32) -> Self {
        FormationController {
            formation:      Formation::Scattered,
            particles:      Vec::new(),
            params,
            smoothing_rate,
            viewer:         Vector3::new(0.0, 0.0, 25.0),
            focus:          None,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn formation(&self) -> Formation { self.formation }
    pub fn particles(&self) -> &[Particle] { &self.particles }
    pub fn len(&self) -> usize { self.particles.len() }
    pub fn is_empty(&self) -> bool { self.particles.is_empty() }
    pub fn params(&self) -> &LayoutParams { &self.params }
    pub fn focus_index(&self) -> Option<usize> { self.focus.map(|f| f.index) }

    /// True once every particle sits on its target (within `tol`).
    pub fn is_settled(&self, tol: f32) -> bool {
        self.particles.iter().all(|p| p.current.is_near(&p.target, tol))
    }

    /// Where the renderer's camera currently is.  Used to pick and place the
    /// focused photo; has no effect on other formations.
    pub fn set_viewer(&mut self, viewer: Vector3<f32>) {
        self.viewer = viewer;
    }

    // ── gesture input ─────────────────────────────────────────────────────

    /// Feed one (debounced) gesture symbol.  Returns the new formation if
    /// the state changed.
    pub fn apply_gesture(&mut self, symbol: GestureSymbol) -> Option<Formation> {
        let next = Formation::for_gesture(symbol)?;
        if next == self.formation {
            return None;
        }
        self.transition_to(next);
        Some(next)
    }

    /// Switch formation and recompute every target.
    pub fn transition_to(&mut self, next: Formation) {
        info!(from = %self.formation, to = %next, photos = self.particles.len(), "formation change");
        self.formation = next;
        self.focus = if next == Formation::Focused { self.pick_focus() } else { None };
        self.retarget();
    }

    // ── pool growth ───────────────────────────────────────────────────────

    /// Grow to `count` particles.  Existing particles keep their current
    /// transform and only get a new target; new ones appear on their target.
    pub fn sync_count(&mut self, count: usize) {
        let old = self.particles.len();
        if count < old {
            warn!(have = old, asked = count, "photo pool never shrinks; ignoring smaller count");
            return;
        }
        if count == old {
            return;
        }

        let targets = self.targets_for(count);
        for (id, target) in targets.iter().enumerate().skip(old) {
            self.particles.push(Particle { id, current: *target, target: *target });
        }
        if self.formation == Formation::Focused && self.focus.is_none() {
            self.focus = self.pick_focus();
            self.retarget();
        } else {
            for (p, t) in self.particles.iter_mut().zip(targets) {
                p.target = t;
            }
        }
        debug!(from = old, to = count, formation = %self.formation, "layout grown");
    }

    // ── per frame ─────────────────────────────────────────────────────────

    /// Advance every particle by `dt` seconds.  Returns whether anything
    /// moved.
    pub fn update(&mut self, dt: f32) -> bool {
        let alpha = smoothing_alpha(self.smoothing_rate, dt);
        let mut moved = false;
        for p in &mut self.particles {
            moved |= p.current.approach(&p.target, alpha);
        }
        moved
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn targets_for(&self, count: usize) -> Vec<Transform> {
        let focus = self.focus.map(|f| (f.index, f.view_dir));
        layout(self.formation, count, focus, &self.params)
    }

    fn retarget(&mut self) {
        let targets = self.targets_for(self.particles.len());
        for (p, t) in self.particles.iter_mut().zip(targets) {
            p.target = t;
        }
    }

    /// The particle whose current position is closest to the viewer.
    fn pick_focus(&self) -> Option<Focus> {
        let view_dir = self.viewer.try_normalize(1e-6).unwrap_or_else(Vector3::z);
        let nearest = self.particles.iter().min_by(|a, b| {
            let da = (a.current.position - self.viewer).norm_squared();
            let db = (b.current.position - self.viewer).norm_squared();
            da.total_cmp(&db)
        })?;
        Some(Focus { index: nearest.id, view_dir })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
