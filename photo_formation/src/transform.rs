//! Per-photo transform and the exponential approach toward a target.

use nalgebra::Vector3;

/// Below this per-component difference a transform counts as arrived and
/// snaps onto its target.
pub const CONVERGE_EPS: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub scale:    f32,
    pub opacity:  f32,
}

impl Default for Transform {
    fn default() -> Self {
        Transform { position: Vector3::zeros(), scale: 1.0, opacity: 1.0 }
    }
}

impl Transform {
    pub fn new(position: Vector3<f32>, scale: f32, opacity: f32) -> Self {
        Transform { position, scale, opacity }
    }

    /// Largest single-component gap to `other`.
    pub fn gap(&self, other: &Transform) -> f32 {
        let dp = (self.position - other.position).amax();
        dp.max((self.scale - other.scale).abs())
          .max((self.opacity - other.opacity).abs())
    }

    pub fn is_near(&self, other: &Transform, tol: f32) -> bool {
        self.gap(other) <= tol
    }

    /// Move a fraction `alpha` (0–1) of the way to `target`.  A zero or
    /// non-finite `alpha` leaves the transform where it is.
    ///
    /// Snaps exactly onto the target once within [`CONVERGE_EPS`], so a
    /// converged transform stays bit-identical on later frames.  Returns
    /// whether anything changed.
    pub fn approach(&mut self, target: &Transform, alpha: f32) -> bool {
        let a = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 0.0 };
        if a == 0.0 || self == target {
            return false;
        }
        if self.is_near(target, CONVERGE_EPS) {
            *self = *target;
            return true;
        }
        self.position += (target.position - self.position) * a;
        self.scale    += (target.scale    - self.scale)    * a;
        self.opacity  += (target.opacity  - self.opacity)  * a;
        true
    }
}

/// Fraction of the remaining distance covered in `dt` seconds at `rate`
/// (1/s).  Two half-length frames cover exactly what one full frame does.
pub fn smoothing_alpha(rate: f32, dt: f32) -> f32 {
    if !(dt.is_finite() && dt > 0.0 && rate.is_finite() && rate > 0.0) {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn at(x: f32) -> Transform {
        Transform::new(Vector3::new(x, 0.0, 0.0), 1.0, 1.0)
    }

    #[test]
    fn alpha_is_frame_rate_independent() {
        let one  = smoothing_alpha(4.0, 1.0 / 30.0);
        let half = smoothing_alpha(4.0, 1.0 / 60.0);
        // two 60 Hz steps leave the same remainder as one 30 Hz step
        assert_relative_eq!((1.0 - half) * (1.0 - half), 1.0 - one, epsilon = 1e-6);
    }

    #[test]
    fn bad_dt_gives_zero_alpha() {
        assert_eq!(smoothing_alpha(4.0, 0.0), 0.0);
        assert_eq!(smoothing_alpha(4.0, -1.0), 0.0);
        assert_eq!(smoothing_alpha(4.0, f32::NAN), 0.0);
        assert_eq!(smoothing_alpha(4.0, f32::INFINITY), 0.0);
    }

    #[test]
    fn approach_moves_fraction_of_gap() {
        let mut t = at(0.0);
        t.approach(&at(10.0), 0.25);
        assert_relative_eq!(t.position.x, 2.5, epsilon = 1e-6);
    }

    #[test]
    fn approach_snaps_when_close_then_stops() {
        let target = at(1.0);
        let mut t = at(1.0 - CONVERGE_EPS / 2.0);
        assert!(t.approach(&target, 0.1));
        assert_eq!(t, target);
        assert!(!t.approach(&target, 0.1));
        assert_eq!(t, target);
    }

    #[test]
    fn gap_covers_scale_and_opacity() {
        let a = Transform::new(Vector3::zeros(), 1.0, 1.0);
        let b = Transform::new(Vector3::zeros(), 1.0, 0.2);
        assert_relative_eq!(a.gap(&b), 0.8, epsilon = 1e-6);
    }

    #[test]
    fn zero_alpha_never_snaps() {
        let target = at(1.0);
        let start = at(1.0 - CONVERGE_EPS / 2.0);
        for alpha in [0.0, -0.5, f32::NAN] {
            let mut t = start;
            assert!(!t.approach(&target, alpha));
            assert_eq!(t, start);
        }
    }
}
