//! Deterministic layout functions, one per formation.
//!
//! All randomness comes from a ChaCha stream seeded by `(seed, photo index)`,
//! so a photo's jitter never depends on how many photos exist and the same
//! inputs always give the same layout.
//!
//! World space: origin at the galaxy centre, +Y up, the default viewer on +Z.

use std::f32::consts::PI;

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitBall};

use crate::formation::Formation;
use crate::transform::Transform;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    pub seed: u64,

    /// Outer radius of the scattered sphere.
    pub scatter_radius:   f32,
    /// Fraction of the radius a photo may sink toward the centre (0–1).
    pub scatter_depth:    f32,
    /// Vertical squash of the sphere; < 1 gives a disc-like galaxy.
    pub scatter_flatten:  f32,

    pub cluster_radius:   f32,
    pub gathered_scale:   f32,

    /// Distance from the origin toward the viewer of the focused photo.
    pub focus_offset:     f32,
    pub focus_scale:      f32,
    /// Radius multiplier for the dimmed backdrop shell.
    pub backdrop_push:    f32,
    pub backdrop_scale:   f32,
    pub backdrop_opacity: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutParams {
            seed:             42,
            scatter_radius:   12.0,
            scatter_depth:    0.35,
            scatter_flatten:  0.7,
            cluster_radius:   2.5,
            gathered_scale:   0.8,
            focus_offset:     10.0,
            focus_scale:      4.0,
            backdrop_push:    1.6,
            backdrop_scale:   0.6,
            backdrop_opacity: 0.2,
        }
    }
}

const GOLDEN_ANGLE: f32 = PI * 0.763_932; // π(3 − √5)

const SALT_SCATTER: u64 = 0x5ca7_7e4e;
const SALT_GATHER:  u64 = 0x6a7e_4e4d;

fn photo_rng(seed: u64, index: usize, salt: u64) -> ChaCha8Rng {
    let mix = (index as u64).wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    ChaCha8Rng::seed_from_u64(seed ^ mix ^ salt)
}

// ════════════════════════════════════════════════════════════════════════════
// Per-formation slots
// ════════════════════════════════════════════════════════════════════════════

/// Photo `index` of `count` on the spherical Fibonacci lattice.
pub fn scattered_slot(index: usize, count: usize, p: &LayoutParams) -> Transform {
    let n = count.max(1) as f32;
    let i = index as f32;

    let y   = 1.0 - 2.0 * (i + 0.5) / n;
    let r   = (1.0 - y * y).max(0.0).sqrt();
    let phi = i * GOLDEN_ANGLE;

    let mut rng = photo_rng(p.seed, index, SALT_SCATTER);
    let depth: f32 = rng.gen_range(0.0..=p.scatter_depth.clamp(0.0, 1.0));
    let radius = p.scatter_radius * (1.0 - depth);

    let dir = Vector3::new(r * phi.cos(), y * p.scatter_flatten, r * phi.sin());
    let scale = rng.gen_range(0.85..=1.15);
    Transform::new(dir * radius, scale, 1.0)
}

/// Photo `index` inside the gathered cluster.  Independent of the count.
pub fn gathered_slot(index: usize, p: &LayoutParams) -> Transform {
    let mut rng = photo_rng(p.seed, index, SALT_GATHER);
    let [x, y, z]: [f32; 3] = UnitBall.sample(&mut rng);
    let scale = p.gathered_scale * rng.gen_range(0.9..=1.1);
    Transform::new(Vector3::new(x, y, z) * p.cluster_radius, scale, 1.0)
}

/// Full focused layout: `focus` in front of the viewer, the rest reflected
/// onto the far hemisphere of a wider, dimmer shell.
///
/// `view_dir` points from the origin toward the viewer and must be unit
/// length.
pub fn focused_layout(count: usize, focus: usize, view_dir: Vector3<f32>, p: &LayoutParams) -> Vec<Transform> {
    (0..count)
        .map(|i| {
            if i == focus {
                return Transform::new(view_dir * p.focus_offset, p.focus_scale, 1.0);
            }
            let base = scattered_slot(i, count, p);
            let mut pos = base.position * p.backdrop_push;
            let toward_viewer = pos.dot(&view_dir);
            if toward_viewer > 0.0 {
                pos -= view_dir * (2.0 * toward_viewer);
            }
            Transform::new(pos, base.scale * p.backdrop_scale, p.backdrop_opacity)
        })
        .collect()
}

/// Targets for every photo in `formation`.
///
/// `focus` is only read for [`Formation::Focused`]; with no focus (or an
/// out-of-range one) the focused layout degrades to the dimmed backdrop.
pub fn layout(
    formation: Formation,
    count:     usize,
    focus:     Option<(usize, Vector3<f32>)>,
    p:         &LayoutParams,
) -> Vec<Transform> {
    match formation {
        Formation::Scattered => (0..count).map(|i| scattered_slot(i, count, p)).collect(),
        Formation::Gathered  => (0..count).map(|i| gathered_slot(i, p)).collect(),
        Formation::Focused   => {
            let (idx, dir) = focus.unwrap_or((usize::MAX, Vector3::z()));
            focused_layout(count, idx, dir, p)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> LayoutParams { LayoutParams::default() }

    #[test]
    fn layouts_have_one_slot_per_photo() {
        for f in [Formation::Scattered, Formation::Gathered, Formation::Focused] {
            for n in [0, 1, 2, 7, 41] {
                assert_eq!(layout(f, n, Some((0, Vector3::z())), &p()).len(), n);
            }
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let a = layout(Formation::Scattered, 30, None, &p());
        let b = layout(Formation::Scattered, 30, None, &p());
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_gives_different_layout() {
        let other = LayoutParams { seed: 7, ..p() };
        assert_ne!(layout(Formation::Gathered, 10, None, &p()), layout(Formation::Gathered, 10, None, &other));
    }

    #[test]
    fn scattered_stays_inside_radius_and_outside_core() {
        let params = p();
        for t in layout(Formation::Scattered, 100, None, &params) {
            let r = t.position.norm();
            assert!(r <= params.scatter_radius + 1e-3);
            // flattening squashes y, so only bound the horizontal reach loosely
            assert!(r >= params.scatter_radius * (1.0 - params.scatter_depth) * params.scatter_flatten - 1e-3);
        }
    }

    #[test]
    fn gathered_is_tight_and_count_independent() {
        let params = p();
        let five  = layout(Formation::Gathered, 5, None, &params);
        let eight = layout(Formation::Gathered, 8, None, &params);
        assert_eq!(&eight[..5], &five[..]);
        for t in &eight {
            assert!(t.position.norm() <= params.cluster_radius + 1e-4);
        }
    }

    #[test]
    fn gathered_is_smaller_than_scattered() {
        let params = p();
        let spread = |ts: &[Transform]| ts.iter().map(|t| t.position.norm()).fold(0.0, f32::max);
        assert!(spread(&layout(Formation::Gathered, 20, None, &params))
              < spread(&layout(Formation::Scattered, 20, None, &params)));
    }

    #[test]
    fn focused_photo_is_large_and_in_front() {
        let params = p();
        let view = Vector3::z();
        let ts = focused_layout(10, 3, view, &params);
        assert_eq!(ts[3].scale, params.focus_scale);
        assert_eq!(ts[3].opacity, 1.0);
        for (i, t) in ts.iter().enumerate() {
            if i == 3 { continue; }
            assert!(t.position.dot(&view) <= 1e-4, "backdrop photo {} in front", i);
            assert!(t.opacity < 1.0);
            assert!(t.scale < ts[3].scale);
        }
    }

    #[test]
    fn focused_without_focus_dims_everything() {
        let ts = layout(Formation::Focused, 4, None, &p());
        assert!(ts.iter().all(|t| t.opacity < 1.0));
    }

    #[test]
    fn single_photo_scattered_is_finite() {
        let t = scattered_slot(0, 1, &p());
        assert!(t.position.iter().all(|c| c.is_finite()));
    }
}
