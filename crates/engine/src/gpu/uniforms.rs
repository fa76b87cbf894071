use bytemuck::{Pod, Zeroable};

use crate::params::ParameterSet;

/// Uniform block shared by every pass.
///
/// The layout must match the `SceneParams` block declared in the shader
/// header: all fields are vec4-sized, so std140 padding can never disagree
/// with the Rust layout.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneUniforms {
    /// Render width, render height, shader time, frame dt.
    pub resolution: [f32; 4],
    /// Orbit theta, phi, distance, distance scale.
    pub camera: [f32; 4],
    /// Shape type, shape mode, box size, raymarch quality.
    pub shape: [f32; 4],
    /// Twist, crunch amount, crunch type, spin target.
    pub domain: [f32; 4],
    /// Main rotation sin/cos, fractal rotation sin/cos.
    pub rotation: [f32; 4],
    /// Displacement freq, amp, type, SDF effect type.
    pub displacement: [f32; 4],
    /// SDF effect mix, color intensity, background brightness, color type.
    pub effect: [f32; 4],
    pub palette_a: [f32; 4],
    pub palette_b: [f32; 4],
    pub palette_c: [f32; 4],
    pub palette_d: [f32; 4],
    /// Fog enable, fog scale, octave count, base amplitude.
    pub fog: [f32; 4],
    /// Turbulence speed, frequency, exponent, integrated time.
    pub turbulence: [f32; 4],
    pub drift_offset: [f32; 4],
    pub halving_base: [f32; 4],
    pub halving_phase: [f32; 4],
    /// UV scale, rotate, distort x/y.
    pub uv_transform: [f32; 4],
    /// Grid size xyz, pattern type.
    pub uv_grid: [f32; 4],
    /// Warp gain, harmonics, lacunarity, amplitude.
    pub warp: [f32; 4],
    /// Warp layers, lens distort, polarize, bloat.
    pub warp_extra: [f32; 4],
    /// UV feedback opacity, blur, distort, noise scale.
    pub uv_feedback: [f32; 4],
    /// UV feedback gain, amplitude, noise mix, pixel size.
    pub uv_feedback_extra: [f32; 4],
    /// Main feedback opacity, blur, distort, noise mix.
    pub feedback: [f32; 4],
    /// Bloom strength, radius, threshold.
    pub bloom: [f32; 4],
}

unsafe impl Zeroable for SceneUniforms {}
unsafe impl Pod for SceneUniforms {}

impl SceneUniforms {
    /// Packs the current parameter values for upload. Integer selectors ride
    /// as floats and are truncated back on the GPU.
    pub fn from_params(
        params: &ParameterSet,
        render_size: (u32, u32),
        time: f32,
        dt: f32,
    ) -> Self {
        let drift = params.vec3("fractal_drift_offset");
        let halving_base = params.vec3("fractal_halving_base");
        let halving_phase = params.vec3("fractal_halving_phase");
        let grid = params.vec3("uv_grid_size");
        let distort = params.vec2("uv_distort");
        Self {
            resolution: [render_size.0 as f32, render_size.1 as f32, time, dt],
            camera: [
                params.scalar("camera_theta"),
                params.scalar("camera_phi"),
                params.scalar("camera_distance"),
                params.scalar("distance_scale"),
            ],
            shape: [
                params.int("shape_type") as f32,
                params.int("shape_mode") as f32,
                params.scalar("box_size"),
                params.int("lod_quality") as f32,
            ],
            domain: [
                params.scalar("twist"),
                params.scalar("crunch"),
                params.int("crunch_type") as f32,
                params.scalar("spin"),
            ],
            rotation: [
                params.scalar("rot_time_sin"),
                params.scalar("rot_time_cos"),
                params.scalar("fractal_rot_time_sin"),
                params.scalar("fractal_rot_time_cos"),
            ],
            displacement: [
                params.scalar("displacement_freq"),
                params.scalar("displacement_amp"),
                params.int("displacement_type") as f32,
                params.int("sdf_effect_type") as f32,
            ],
            effect: [
                params.scalar("sdf_effect_mix"),
                params.scalar("color_intensity"),
                params.scalar("background_brightness"),
                params.int("color_type") as f32,
            ],
            palette_a: vec4(params.vec3("palette_a")),
            palette_b: vec4(params.vec3("palette_b")),
            palette_c: vec4(params.vec3("palette_c")),
            palette_d: vec4(params.vec3("palette_d")),
            fog: [
                params.scalar("fog_enabled"),
                params.scalar("fog_scale"),
                params.scalar("turb_num"),
                params.scalar("turb_amp"),
            ],
            turbulence: [
                params.scalar("turb_speed"),
                params.scalar("turb_freq"),
                params.scalar("turb_exp"),
                params.scalar("turb_time"),
            ],
            drift_offset: vec4(drift),
            halving_base: vec4(halving_base),
            halving_phase: vec4(halving_phase),
            uv_transform: [
                params.scalar("uv_scale"),
                params.scalar("uv_rotate"),
                distort[0],
                distort[1],
            ],
            uv_grid: [grid[0], grid[1], grid[2], params.int("pattern_type") as f32],
            warp: [
                params.scalar("warp_gain"),
                params.int("warp_harmonics") as f32,
                params.scalar("warp_lacunarity"),
                params.scalar("warp_amplitude"),
            ],
            warp_extra: [
                params.int("warp_layers") as f32,
                params.scalar("lens_distort"),
                params.scalar("polarize"),
                params.scalar("bloat_strength"),
            ],
            uv_feedback: [
                params.scalar("uv_feedback_opacity"),
                params.scalar("uv_feedback_blur"),
                params.scalar("uv_feedback_distort"),
                params.scalar("uv_feedback_noise_scale"),
            ],
            uv_feedback_extra: [
                params.scalar("uv_feedback_gain"),
                params.scalar("uv_feedback_amplitude"),
                params.scalar("uv_feedback_noise_mix"),
                params.scalar("uv_pixel_size"),
            ],
            feedback: [
                params.scalar("feedback_opacity"),
                params.scalar("feedback_blur"),
                params.scalar("feedback_distort"),
                params.scalar("feedback_noise_mix"),
            ],
            bloom: [
                params.scalar("bloom_strength"),
                params.scalar("bloom_radius"),
                params.scalar("bloom_threshold"),
                0.0,
            ],
        }
    }
}

fn vec4(v: [f32; 3]) -> [f32; 4] {
    [v[0], v[1], v[2], 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn struct_size_matches_the_shader_block() {
        // 24 vec4 fields, no hidden padding.
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 24 * 16);
    }

    #[test]
    fn packing_reflects_parameter_writes() {
        let mut params = ParameterSet::new();
        params.set("camera_distance", ParamValue::Scalar(5.5)).unwrap();
        params.set("shape_type", ParamValue::Int(3)).unwrap();
        params
            .set("palette_b", ParamValue::Vec3([0.1, 0.2, 0.3]))
            .unwrap();

        let uniforms = SceneUniforms::from_params(&params, (640, 360), 2.0, 0.016);
        assert_eq!(uniforms.resolution, [640.0, 360.0, 2.0, 0.016]);
        assert_eq!(uniforms.camera[2], 5.5);
        assert_eq!(uniforms.shape[0], 3.0);
        assert_eq!(uniforms.palette_b, [0.1, 0.2, 0.3, 0.0]);
    }

    #[test]
    fn integrator_outputs_ride_the_rotation_field() {
        let mut params = ParameterSet::new();
        params.publish_scalar("rot_time_sin", 0.25);
        params.publish_scalar("rot_time_cos", 0.75);
        let uniforms = SceneUniforms::from_params(&params, (1, 1), 0.0, 0.0);
        assert_eq!(uniforms.rotation[0], 0.25);
        assert_eq!(uniforms.rotation[1], 0.75);
    }
}
