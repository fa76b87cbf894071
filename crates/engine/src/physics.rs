use crate::params::ParameterSet;

/// Single-pole low-pass factor applied to every channel velocity.
///
/// Deliberately not normalized by `dt`: the same damping is applied whatever
/// the frame rate, so convergence is frame-rate dependent. Normalizing it
/// changes the feel of every motion control.
pub const VELOCITY_SMOOTHING: f32 = 0.5;

/// Rotation targets are scaled down from the raw UI parameter.
const ROTATION_TARGET_SCALE: f32 = 0.2;

/// One physically-smoothed quantity: a velocity tracking a target, and the
/// position/phase that velocity integrates into.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Channel {
    pub velocity: f32,
    pub position: f32,
}

impl Channel {
    /// Velocity update (frame-rate dependent) followed by a time-normalized
    /// position update.
    fn step(&mut self, target: f32, dt: f32, rate: f32) {
        self.velocity += (target - self.velocity) * VELOCITY_SMOOTHING;
        self.position += self.velocity * dt * rate;
    }

    fn reset(&mut self) {
        self.velocity = 0.0;
        self.position = 0.0;
    }
}

/// Per-frame physical smoothing of every animated quantity.
///
/// Raw targets live in the [`ParameterSet`]; the integrator owns the hidden
/// velocity/phase pairs and publishes the derived values back each frame.
/// Rotation channels publish sin/cos pairs so the shader never recomputes
/// trigonometry per fragment.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    rotation: Channel,
    fractal_rotation: Channel,
    drift: [Channel; 3],
    halving: [Channel; 3],
    turbulence: Channel,
}

impl Integrator {
    pub fn new() -> Self {
        let mut integrator = Self::default();
        // Drift rests at the z-offset default so a freshly started scene
        // matches the published fractal_drift_offset default.
        integrator.drift[2].position = 0.1;
        integrator
    }

    /// Advances every channel by `dt` seconds and publishes the results.
    pub fn advance(&mut self, params: &mut ParameterSet, dt: f32, speed: f32) {
        let rate = speed * 2.0;

        let spin_target = ROTATION_TARGET_SCALE * params.scalar("spin");
        self.rotation.step(spin_target, dt, rate);
        params.publish_scalar("rot_time_sin", self.rotation.position.sin());
        params.publish_scalar("rot_time_cos", self.rotation.position.cos());

        let fractal_target = ROTATION_TARGET_SCALE * params.scalar("fractal_rotation_speed");
        self.fractal_rotation.step(fractal_target, dt, rate);
        params.publish_scalar("fractal_rot_time_sin", self.fractal_rotation.position.sin());
        params.publish_scalar("fractal_rot_time_cos", self.fractal_rotation.position.cos());

        let drift_target = params.vec3("fractal_drift");
        for (channel, target) in self.drift.iter_mut().zip(drift_target) {
            channel.step(target, dt, rate);
        }
        params.publish_vec3(
            "fractal_drift_offset",
            [
                self.drift[0].position,
                self.drift[1].position,
                self.drift[2].position,
            ],
        );

        let halving_target = params.vec3("fractal_halving_time");
        for (channel, target) in self.halving.iter_mut().zip(halving_target) {
            channel.step(target, dt, rate);
        }
        params.publish_vec3(
            "fractal_halving_phase",
            [
                self.halving[0].position,
                self.halving[1].position,
                self.halving[2].position,
            ],
        );

        let turb_target = params.scalar("turb_speed");
        self.turbulence.step(turb_target, dt, rate);
        params.publish_scalar("turb_time", self.turbulence.position);
    }

    /// Zeroes the main rotation channel and its published angles. The raw
    /// spin target is left for the caller to clear.
    pub fn reset_rotation(&mut self, params: &mut ParameterSet) {
        self.rotation.reset();
        params.publish_scalar("rot_time_sin", 0.0);
        params.publish_scalar("rot_time_cos", 1.0);
    }

    pub fn reset_fractal_rotation(&mut self, params: &mut ParameterSet) {
        self.fractal_rotation.reset();
        params.publish_scalar("fractal_rot_time_sin", 0.0);
        params.publish_scalar("fractal_rot_time_cos", 1.0);
    }

    /// Returns drift and halving phase to their rest pose.
    pub fn reset_motion(&mut self, params: &mut ParameterSet) {
        for channel in self.drift.iter_mut().chain(self.halving.iter_mut()) {
            channel.reset();
        }
        self.drift[2].position = 0.1;
        params.publish_vec3("fractal_drift_offset", [0.0, 0.0, 0.1]);
        params.publish_vec3("fractal_halving_phase", [0.0, 0.0, 0.0]);
    }

    #[cfg(test)]
    pub(crate) fn rotation(&self) -> Channel {
        self.rotation
    }

    #[cfg(test)]
    pub(crate) fn drift(&self) -> [Channel; 3] {
        self.drift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    const DT: f32 = 1.0 / 60.0;

    fn scene() -> (Integrator, ParameterSet) {
        (Integrator::new(), ParameterSet::new())
    }

    #[test]
    fn velocity_converges_geometrically() {
        let (mut integrator, mut params) = scene();
        params.set("spin", ParamValue::Scalar(1.0)).unwrap();
        let target = 0.2;

        let mut previous_gap = target;
        for step in 1..=20 {
            integrator.advance(&mut params, DT, 0.5);
            let gap = (target - integrator.rotation().velocity).abs();
            let expected = target * VELOCITY_SMOOTHING.powi(step);
            assert!((gap - expected).abs() < 1.0e-6, "step {step}: gap {gap}");
            assert!(gap <= previous_gap, "convergence must be monotone");
            previous_gap = gap;
        }
    }

    #[test]
    fn spin_scenario_reaches_target_velocity() {
        // speed=0.5, spin=1.0, dt=1/60 for two seconds.
        let (mut integrator, mut params) = scene();
        params.set("spin", ParamValue::Scalar(1.0)).unwrap();

        let mut last_angle = 0.0;
        for step in 1..=120 {
            integrator.advance(&mut params, DT, 0.5);
            let angle = integrator.rotation().position;
            assert!(angle > last_angle, "angle must strictly increase");
            last_angle = angle;
            if step == 12 {
                let velocity = integrator.rotation().velocity;
                assert!(
                    (velocity - 0.2).abs() < 0.002,
                    "velocity {velocity} not within 1% of 0.2 after 12 steps"
                );
            }
        }
        assert!(last_angle > 0.0);
    }

    #[test]
    fn integration_is_deterministic() {
        let run = || {
            let (mut integrator, mut params) = scene();
            params.set("spin", ParamValue::Scalar(0.7)).unwrap();
            params
                .set("fractal_drift", ParamValue::Vec3([0.3, -0.2, 0.05]))
                .unwrap();
            let dts = [1.0 / 60.0, 1.0 / 30.0, 1.0 / 144.0, 1.0 / 60.0];
            let mut angles = Vec::new();
            for dt in dts.iter().cycle().take(64) {
                integrator.advance(&mut params, *dt, 0.5);
                angles.push(integrator.rotation().position.to_bits());
                for channel in integrator.drift() {
                    angles.push(channel.position.to_bits());
                }
            }
            angles
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn rotation_publishes_sin_cos() {
        let (mut integrator, mut params) = scene();
        params.set("spin", ParamValue::Scalar(1.0)).unwrap();
        for _ in 0..30 {
            integrator.advance(&mut params, DT, 0.5);
        }
        let angle = integrator.rotation().position;
        assert_eq!(params.scalar("rot_time_sin"), angle.sin());
        assert_eq!(params.scalar("rot_time_cos"), angle.cos());
    }

    #[test]
    fn drift_publishes_integrated_offsets() {
        let (mut integrator, mut params) = scene();
        params
            .set("fractal_drift", ParamValue::Vec3([0.5, 0.0, 0.1]))
            .unwrap();
        for _ in 0..10 {
            integrator.advance(&mut params, DT, 0.5);
        }
        let offset = params.vec3("fractal_drift_offset");
        assert!(offset[0] > 0.0);
        assert_eq!(offset[1], 0.0);
        assert!(offset[2] > 0.1);
    }

    #[test]
    fn reset_zeroes_state_but_not_target() {
        let (mut integrator, mut params) = scene();
        params.set("spin", ParamValue::Scalar(1.0)).unwrap();
        for _ in 0..10 {
            integrator.advance(&mut params, DT, 0.5);
        }
        assert!(integrator.rotation().position != 0.0);

        integrator.reset_rotation(&mut params);
        assert_eq!(integrator.rotation(), Channel::default());
        assert_eq!(params.scalar("rot_time_sin"), 0.0);
        assert_eq!(params.scalar("rot_time_cos"), 1.0);
        // The raw target parameter is untouched.
        assert_eq!(params.scalar("spin"), 1.0);
    }

    #[test]
    fn paused_scene_state_is_reproducible_after_gap() {
        // No advance call means no state change at all, which is what the
        // scheduler relies on while paused.
        let (mut integrator, mut params) = scene();
        params.set("spin", ParamValue::Scalar(1.0)).unwrap();
        integrator.advance(&mut params, DT, 0.5);
        let frozen = integrator.clone();
        let angle = params.scalar("rot_time_sin");
        // ... arbitrary wall time passes ...
        assert_eq!(integrator.rotation(), frozen.rotation());
        assert_eq!(params.scalar("rot_time_sin"), angle);
    }
}
