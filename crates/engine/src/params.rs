use std::collections::HashMap;
use std::fmt;

use crate::error::EngineError;
use crate::variant::VariantKey;

/// Value kinds a parameter may carry. Out-of-range values inside a kind are
/// accepted; they merely produce visually degenerate output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Scalar,
    Vec2,
    Vec3,
    Int,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Scalar => f.write_str("scalar"),
            ParamKind::Vec2 => f.write_str("vec2"),
            ParamKind::Vec3 => f.write_str("vec3"),
            ParamKind::Int => f.write_str("int"),
        }
    }
}

/// A single parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Int(i32),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Scalar(_) => ParamKind::Scalar,
            ParamValue::Vec2(_) => ParamKind::Vec2,
            ParamValue::Vec3(_) => ParamKind::Vec3,
            ParamValue::Int(_) => ParamKind::Int,
        }
    }
}

/// Startup defaults for every parameter the engine knows about.
///
/// The table is the registry: a name absent here does not exist, and its kind
/// here is the kind writes are validated against for the whole session.
pub const PARAMETER_DEFAULTS: &[(&str, ParamValue)] = &[
    ("speed", ParamValue::Scalar(0.5)),
    // Camera
    ("camera_theta", ParamValue::Scalar(0.0)),
    ("camera_phi", ParamValue::Scalar(1.57)),
    ("camera_distance", ParamValue::Scalar(3.0)),
    // Shape / structure
    ("shape_type", ParamValue::Int(0)),
    ("shape_mode", ParamValue::Int(0)),
    ("box_size", ParamValue::Scalar(0.1)),
    ("distance_scale", ParamValue::Scalar(1.0)),
    ("lod_quality", ParamValue::Int(60)),
    // Domain warps
    ("twist", ParamValue::Scalar(0.0)),
    ("crunch", ParamValue::Scalar(0.0)),
    ("crunch_type", ParamValue::Int(0)),
    ("spin", ParamValue::Scalar(0.0)),
    ("rot_time_sin", ParamValue::Scalar(0.0)),
    ("rot_time_cos", ParamValue::Scalar(1.0)),
    // Displacement
    ("displacement_freq", ParamValue::Scalar(20.0)),
    ("displacement_amp", ParamValue::Scalar(0.0)),
    ("displacement_type", ParamValue::Int(0)),
    ("sdf_effect_type", ParamValue::Int(2)),
    ("sdf_effect_mix", ParamValue::Scalar(0.0)),
    // Color
    ("color_intensity", ParamValue::Scalar(0.005)),
    ("background_brightness", ParamValue::Scalar(1.0)),
    ("color_type", ParamValue::Int(0)),
    ("palette_a", ParamValue::Vec3([0.5, 0.5, 0.5])),
    ("palette_b", ParamValue::Vec3([0.5, 0.5, 0.5])),
    ("palette_c", ParamValue::Vec3([1.0, 1.0, 1.0])),
    ("palette_d", ParamValue::Vec3([0.0, 0.33, 0.67])),
    // Fog / turbulence
    ("fog_enabled", ParamValue::Scalar(0.0)),
    ("fog_scale", ParamValue::Scalar(0.5)),
    ("turb_num", ParamValue::Scalar(12.0)),
    ("turb_amp", ParamValue::Scalar(1.1)),
    ("turb_speed", ParamValue::Scalar(0.3)),
    ("turb_freq", ParamValue::Scalar(2.1)),
    ("turb_exp", ParamValue::Scalar(1.4)),
    ("turb_time", ParamValue::Scalar(0.0)),
    // Fractal physics (targets written by producers, offsets by the integrator)
    ("fractal_rotation_speed", ParamValue::Scalar(0.0)),
    ("fractal_rot_time_sin", ParamValue::Scalar(0.0)),
    ("fractal_rot_time_cos", ParamValue::Scalar(1.0)),
    ("fractal_drift", ParamValue::Vec3([0.0, 0.0, 0.1])),
    ("fractal_drift_offset", ParamValue::Vec3([0.0, 0.0, 0.1])),
    ("fractal_halving_base", ParamValue::Vec3([2.0, 2.0, 0.5])),
    ("fractal_halving_freq", ParamValue::Vec3([0.0, 0.0, 0.0])),
    ("fractal_halving_time", ParamValue::Vec3([0.0, 0.0, 0.0])),
    ("fractal_halving_phase", ParamValue::Vec3([0.0, 0.0, 0.0])),
    // UV warp pass
    ("uv_scale", ParamValue::Scalar(1.0)),
    ("uv_rotate", ParamValue::Scalar(0.0)),
    ("uv_distort", ParamValue::Vec2([0.0, 0.0])),
    ("uv_grid_size", ParamValue::Vec3([10.0, 20.0, 0.0])),
    ("warp_gain", ParamValue::Scalar(0.5)),
    ("warp_harmonics", ParamValue::Int(3)),
    ("warp_lacunarity", ParamValue::Scalar(2.0)),
    ("warp_amplitude", ParamValue::Scalar(0.0)),
    ("warp_layers", ParamValue::Int(1)),
    ("lens_distort", ParamValue::Scalar(0.0)),
    ("polarize", ParamValue::Scalar(0.0)),
    ("bloat_strength", ParamValue::Scalar(0.0)),
    ("pattern_type", ParamValue::Int(0)),
    ("uv_pixel_size", ParamValue::Scalar(0.0)),
    // UV feedback blend
    ("uv_feedback_opacity", ParamValue::Scalar(0.0)),
    ("uv_feedback_blur", ParamValue::Scalar(0.0)),
    ("uv_feedback_distort", ParamValue::Scalar(0.025)),
    ("uv_feedback_noise_scale", ParamValue::Scalar(1.0)),
    ("uv_feedback_gain", ParamValue::Scalar(0.5)),
    ("uv_feedback_amplitude", ParamValue::Scalar(0.5)),
    ("uv_feedback_noise_mix", ParamValue::Scalar(0.98)),
    // Main-image feedback blend
    ("feedback_opacity", ParamValue::Scalar(0.0)),
    ("feedback_blur", ParamValue::Scalar(0.0)),
    ("feedback_distort", ParamValue::Scalar(0.025)),
    ("feedback_noise_mix", ParamValue::Scalar(0.98)),
    // Composite
    ("bloom_strength", ParamValue::Scalar(0.0)),
    ("bloom_radius", ParamValue::Scalar(0.4)),
    ("bloom_threshold", ParamValue::Scalar(0.85)),
];

/// Displacement amplitudes below this never change the compiled shader.
pub(crate) const DISPLACEMENT_EPSILON: f32 = 0.001;

/// The single source of truth for every shader-visible value.
///
/// UI/input producers and the integrator both write here; the renderer only
/// reads. Writes are single-writer-per-tick by convention: producers mutate
/// between frames, never from inside a render callback.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    values: HashMap<&'static str, ParamValue>,
}

impl ParameterSet {
    /// Builds the set with every parameter at its documented default.
    pub fn new() -> Self {
        let values = PARAMETER_DEFAULTS.iter().copied().collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    /// Declared kind of a registered parameter.
    pub fn kind_of(&self, name: &str) -> Option<ParamKind> {
        self.values.get(name).map(|value| value.kind())
    }

    /// Writes a parameter, validating only that the kind matches. Unknown
    /// names and kind mismatches are rejected without corrupting the set.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), EngineError> {
        let slot = match self.values.get_mut(name) {
            Some(slot) => slot,
            None => return Err(EngineError::UnknownParameter(name.to_string())),
        };
        if slot.kind() != value.kind() {
            return Err(EngineError::InvalidParameter {
                name: name.to_string(),
                expected: slot.kind(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Scalar read for internal consumers. Registered scalars always resolve;
    /// a missing or mismatched name reads as zero rather than panicking.
    pub fn scalar(&self, name: &str) -> f32 {
        match self.values.get(name) {
            Some(ParamValue::Scalar(v)) => *v,
            _ => 0.0,
        }
    }

    pub fn vec2(&self, name: &str) -> [f32; 2] {
        match self.values.get(name) {
            Some(ParamValue::Vec2(v)) => *v,
            _ => [0.0; 2],
        }
    }

    pub fn vec3(&self, name: &str) -> [f32; 3] {
        match self.values.get(name) {
            Some(ParamValue::Vec3(v)) => *v,
            _ => [0.0; 3],
        }
    }

    pub fn int(&self, name: &str) -> i32 {
        match self.values.get(name) {
            Some(ParamValue::Int(v)) => *v,
            _ => 0,
        }
    }

    /// Internal writes from the integrator; names are compile-time constants
    /// from the defaults table, so kind mismatches cannot occur.
    pub(crate) fn publish_scalar(&mut self, name: &'static str, value: f32) {
        self.values.insert(name, ParamValue::Scalar(value));
    }

    pub(crate) fn publish_vec2(&mut self, name: &'static str, value: [f32; 2]) {
        self.values.insert(name, ParamValue::Vec2(value));
    }

    pub(crate) fn publish_vec3(&mut self, name: &'static str, value: [f32; 3]) {
        self.values.insert(name, ParamValue::Vec3(value));
    }

    pub(crate) fn publish_int(&mut self, name: &'static str, value: i32) {
        self.values.insert(name, ParamValue::Int(value));
    }

    /// Snapshot of the structural parameters that select the compiled shader.
    pub fn variant_key(&self) -> VariantKey {
        VariantKey {
            shape_type: self.int("shape_type"),
            shape_mode: self.int("shape_mode"),
            displacement_active: self.scalar("displacement_amp") > DISPLACEMENT_EPSILON,
            fog_enabled: self.scalar("fog_enabled") > 0.5,
        }
    }

    /// Iterates every parameter for UI-sync snapshots.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParamValue)> + '_ {
        self.values.iter().map(|(name, value)| (*name, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let params = ParameterSet::new();
        assert_eq!(params.len(), PARAMETER_DEFAULTS.len());
        assert_eq!(params.scalar("camera_phi"), 1.57);
        assert_eq!(params.vec3("fractal_halving_base"), [2.0, 2.0, 0.5]);
        assert_eq!(params.int("lod_quality"), 60);
    }

    #[test]
    fn kind_mismatch_is_rejected_without_corruption() {
        let mut params = ParameterSet::new();
        let before = params.scalar("spin");
        let err = params.set("spin", ParamValue::Int(3)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidParameter { ref name, expected }
                if name == "spin" && expected == ParamKind::Scalar
        ));
        assert_eq!(params.scalar("spin"), before);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut params = ParameterSet::new();
        let err = params.set("no_such", ParamValue::Scalar(1.0)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownParameter(_)));
    }

    #[test]
    fn out_of_range_values_are_accepted() {
        let mut params = ParameterSet::new();
        params.set("spin", ParamValue::Scalar(1.0e9)).unwrap();
        assert_eq!(params.scalar("spin"), 1.0e9);
    }

    #[test]
    fn variant_key_tracks_structural_parameters() {
        let mut params = ParameterSet::new();
        let key = params.variant_key();
        assert!(!key.displacement_active);
        assert!(!key.fog_enabled);

        params
            .set("displacement_amp", ParamValue::Scalar(0.05))
            .unwrap();
        params.set("fog_enabled", ParamValue::Scalar(1.0)).unwrap();
        params.set("shape_type", ParamValue::Int(4)).unwrap();
        let key = params.variant_key();
        assert!(key.displacement_active);
        assert!(key.fog_enabled);
        assert_eq!(key.shape_type, 4);
    }

    #[test]
    fn sub_epsilon_displacement_stays_inactive() {
        let mut params = ParameterSet::new();
        params
            .set("displacement_amp", ParamValue::Scalar(0.0005))
            .unwrap();
        assert!(!params.variant_key().displacement_active);
    }
}
