//! Reset and randomize operations over the parameter set.
//!
//! Every action is a plain parameter rewrite; none of them touch the GPU.
//! Randomizers are seeded so a given seed always produces the same session.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::{ParameterSet, DISPLACEMENT_EPSILON};
use crate::physics::Integrator;

/// Named groups of parameters a reset can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetChannel {
    /// Main rotation: spin target plus the accumulated angle.
    Spin,
    /// Fractal rotation target plus its accumulated angle.
    Rotation,
    /// Fractal drift and halving targets plus their integrated offsets.
    Motion,
    /// Surface displacement, crunch and SDF effect magnitudes.
    Displacements,
    /// The whole UV warp pass back to a pass-through.
    Warps,
    /// Orbit camera back to the front view.
    Camera,
    /// Everything above at once.
    All,
}

/// Effect families that can be re-rolled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectGroup {
    SdfEffect,
    Displacement,
    Crunch,
}

/// Curated palettes offered at startup alongside fully random ones.
const CURATED_PALETTES: &[[[f32; 3]; 4]] = &[
    // Rainbow
    [
        [0.5, 0.5, 0.5],
        [0.5, 0.5, 0.5],
        [1.0, 1.0, 1.0],
        [0.0, 0.33, 0.67],
    ],
    // Sunset
    [
        [0.5, 0.3, 0.2],
        [0.5, 0.3, 0.2],
        [1.0, 0.8, 0.6],
        [0.0, 0.1, 0.2],
    ],
    // Ocean
    [
        [0.2, 0.4, 0.5],
        [0.2, 0.3, 0.4],
        [1.0, 1.2, 1.4],
        [0.3, 0.5, 0.7],
    ],
    // Ember
    [
        [0.6, 0.2, 0.1],
        [0.4, 0.2, 0.1],
        [1.0, 1.0, 0.5],
        [0.0, 0.25, 0.25],
    ],
    // Mint
    [
        [0.3, 0.5, 0.4],
        [0.3, 0.4, 0.3],
        [1.0, 1.0, 1.0],
        [0.25, 0.4, 0.55],
    ],
    // Violet
    [
        [0.4, 0.3, 0.6],
        [0.4, 0.2, 0.4],
        [1.0, 1.0, 1.0],
        [0.6, 0.4, 0.8],
    ],
    // Monochrome
    [
        [0.5, 0.5, 0.5],
        [0.5, 0.5, 0.5],
        [1.0, 1.0, 1.0],
        [0.0, 0.0, 0.0],
    ],
];

/// Seeded source of the randomize operations.
#[derive(Debug)]
pub struct Actions {
    rng: StdRng,
}

impl Actions {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Re-rolls one effect family. When the family's magnitude is zero the
    /// roll would be invisible, so the magnitude is nudged to a small value
    /// at the same time.
    pub fn randomize(&mut self, group: EffectGroup, params: &mut ParameterSet) {
        match group {
            EffectGroup::SdfEffect => {
                params.publish_int("sdf_effect_type", self.rng.gen_range(0..11));
                if params.scalar("sdf_effect_mix") == 0.0 {
                    params.publish_scalar("sdf_effect_mix", 1.0);
                }
            }
            EffectGroup::Displacement => {
                params.publish_int("displacement_type", self.rng.gen_range(0..8));
                if params.scalar("displacement_amp") <= DISPLACEMENT_EPSILON {
                    params.publish_scalar("displacement_amp", 0.05);
                }
            }
            EffectGroup::Crunch => {
                params.publish_int("crunch_type", self.rng.gen_range(0..15));
                if params.scalar("crunch") == 0.0 {
                    params.publish_scalar("crunch", 0.5);
                }
            }
        }
        tracing::debug!(?group, "randomized effect group");
    }

    /// Replaces the four palette coefficient vectors, picking a curated set a
    /// quarter of the time and free random coefficients otherwise.
    pub fn randomize_palette(&mut self, params: &mut ParameterSet) {
        if self.rng.gen_bool(0.25) {
            let palette = CURATED_PALETTES[self.rng.gen_range(0..CURATED_PALETTES.len())];
            params.publish_vec3("palette_a", palette[0]);
            params.publish_vec3("palette_b", palette[1]);
            params.publish_vec3("palette_c", palette[2]);
            params.publish_vec3("palette_d", palette[3]);
        } else {
            let mut roll3 = |lo: f32, hi: f32| {
                [
                    self.rng.gen_range(lo..hi),
                    self.rng.gen_range(lo..hi),
                    self.rng.gen_range(lo..hi),
                ]
            };
            let a = roll3(0.2, 0.6);
            let b = roll3(0.2, 0.5);
            let c = roll3(0.8, 1.5);
            let d = roll3(0.0, 1.0);
            params.publish_vec3("palette_a", a);
            params.publish_vec3("palette_b", b);
            params.publish_vec3("palette_c", c);
            params.publish_vec3("palette_d", d);
        }
    }
}

/// Applies one reset channel. Resets are deterministic and free of RNG state,
/// so they live outside [`Actions`].
pub fn reset(channel: ResetChannel, params: &mut ParameterSet, integrator: &mut Integrator) {
    match channel {
        ResetChannel::Spin => {
            params.publish_scalar("spin", 0.0);
            integrator.reset_rotation(params);
        }
        ResetChannel::Rotation => {
            params.publish_scalar("fractal_rotation_speed", 0.0);
            integrator.reset_fractal_rotation(params);
        }
        ResetChannel::Motion => {
            params.publish_vec3("fractal_drift", [0.0, 0.0, 0.1]);
            params.publish_vec3("fractal_halving_base", [2.0, 2.0, 0.5]);
            params.publish_vec3("fractal_halving_freq", [0.0, 0.0, 0.0]);
            params.publish_vec3("fractal_halving_time", [0.0, 0.0, 0.0]);
            integrator.reset_motion(params);
        }
        ResetChannel::Displacements => {
            params.publish_scalar("crunch", 0.0);
            params.publish_scalar("twist", 0.0);
            params.publish_scalar("displacement_amp", 0.0);
            params.publish_scalar("displacement_freq", 20.0);
            params.publish_scalar("sdf_effect_mix", 0.0);
        }
        ResetChannel::Warps => {
            params.publish_scalar("uv_scale", 1.0);
            params.publish_scalar("uv_rotate", 0.0);
            params.publish_vec2("uv_distort", [0.0, 0.0]);
            params.publish_vec3("uv_grid_size", [10.0, 20.0, 0.0]);
            params.publish_scalar("warp_amplitude", 0.0);
            params.publish_scalar("lens_distort", 0.0);
            params.publish_scalar("polarize", 0.0);
            params.publish_scalar("bloat_strength", 0.0);
            params.publish_scalar("uv_pixel_size", 0.0);
            params.publish_int("pattern_type", 0);
            params.publish_scalar("uv_feedback_opacity", 0.0);
        }
        ResetChannel::Camera => {
            params.publish_scalar("camera_theta", 0.0);
            params.publish_scalar("camera_phi", 1.57);
            params.publish_scalar("camera_distance", 3.0);
        }
        ResetChannel::All => {
            for sub in [
                ResetChannel::Spin,
                ResetChannel::Rotation,
                ResetChannel::Motion,
                ResetChannel::Displacements,
                ResetChannel::Warps,
                ResetChannel::Camera,
            ] {
                reset(sub, params, integrator);
            }
        }
    }
    tracing::debug!(?channel, "reset applied");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    fn scene() -> (ParameterSet, Integrator) {
        (ParameterSet::new(), Integrator::new())
    }

    #[test]
    fn reset_spin_clears_target_and_angle() {
        let (mut params, mut integrator) = scene();
        params.set("spin", ParamValue::Scalar(2.0)).unwrap();
        for _ in 0..20 {
            integrator.advance(&mut params, 1.0 / 60.0, 0.5);
        }
        assert!(params.scalar("rot_time_sin") != 0.0);

        reset(ResetChannel::Spin, &mut params, &mut integrator);
        assert_eq!(params.scalar("spin"), 0.0);
        assert_eq!(params.scalar("rot_time_sin"), 0.0);
        assert_eq!(params.scalar("rot_time_cos"), 1.0);
    }

    #[test]
    fn reset_motion_restores_rest_pose() {
        let (mut params, mut integrator) = scene();
        params
            .set("fractal_drift", ParamValue::Vec3([1.0, 1.0, 1.0]))
            .unwrap();
        for _ in 0..20 {
            integrator.advance(&mut params, 1.0 / 60.0, 0.5);
        }

        reset(ResetChannel::Motion, &mut params, &mut integrator);
        assert_eq!(params.vec3("fractal_drift"), [0.0, 0.0, 0.1]);
        assert_eq!(params.vec3("fractal_drift_offset"), [0.0, 0.0, 0.1]);
        assert_eq!(params.vec3("fractal_halving_phase"), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn reset_all_covers_camera_and_warps() {
        let (mut params, mut integrator) = scene();
        params.set("camera_distance", ParamValue::Scalar(9.0)).unwrap();
        params.set("warp_amplitude", ParamValue::Scalar(0.8)).unwrap();
        params.set("uv_scale", ParamValue::Scalar(3.0)).unwrap();

        reset(ResetChannel::All, &mut params, &mut integrator);
        assert_eq!(params.scalar("camera_distance"), 3.0);
        assert_eq!(params.scalar("warp_amplitude"), 0.0);
        assert_eq!(params.scalar("uv_scale"), 1.0);
    }

    #[test]
    fn randomize_nudges_zero_magnitudes() {
        let (mut params, _) = scene();
        let mut actions = Actions::new(7);

        actions.randomize(EffectGroup::SdfEffect, &mut params);
        assert_eq!(params.scalar("sdf_effect_mix"), 1.0);
        assert!((0..11).contains(&params.int("sdf_effect_type")));

        actions.randomize(EffectGroup::Displacement, &mut params);
        assert_eq!(params.scalar("displacement_amp"), 0.05);
        assert!((0..8).contains(&params.int("displacement_type")));

        actions.randomize(EffectGroup::Crunch, &mut params);
        assert_eq!(params.scalar("crunch"), 0.5);
        assert!((0..15).contains(&params.int("crunch_type")));
    }

    #[test]
    fn randomize_preserves_nonzero_magnitudes() {
        let (mut params, _) = scene();
        let mut actions = Actions::new(7);
        params.set("sdf_effect_mix", ParamValue::Scalar(0.4)).unwrap();
        params
            .set("displacement_amp", ParamValue::Scalar(0.2))
            .unwrap();

        actions.randomize(EffectGroup::SdfEffect, &mut params);
        actions.randomize(EffectGroup::Displacement, &mut params);
        assert_eq!(params.scalar("sdf_effect_mix"), 0.4);
        assert_eq!(params.scalar("displacement_amp"), 0.2);
    }

    #[test]
    fn randomize_is_deterministic_per_seed() {
        let roll = |seed| {
            let (mut params, _) = scene();
            let mut actions = Actions::new(seed);
            actions.randomize(EffectGroup::SdfEffect, &mut params);
            actions.randomize(EffectGroup::Crunch, &mut params);
            actions.randomize_palette(&mut params);
            (
                params.int("sdf_effect_type"),
                params.int("crunch_type"),
                params.vec3("palette_a"),
            )
        };
        assert_eq!(roll(42), roll(42));
        assert_ne!(roll(1), roll(2));
    }

    #[test]
    fn palette_randomization_writes_all_four_vectors() {
        let (mut params, _) = scene();
        let mut actions = Actions::new(3);
        let before: Vec<[f32; 3]> = ["palette_a", "palette_b", "palette_c", "palette_d"]
            .iter()
            .map(|name| params.vec3(name))
            .collect();
        actions.randomize_palette(&mut params);
        let after: Vec<[f32; 3]> = ["palette_a", "palette_b", "palette_c", "palette_d"]
            .iter()
            .map(|name| params.vec3(name))
            .collect();
        assert_ne!(before, after);
    }
}
