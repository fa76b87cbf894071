use std::time::Instant;

use crate::actions::{self, Actions, EffectGroup, ResetChannel};
use crate::assemble::ChunkAssembler;
use crate::error::{EngineError, ErrorKind, ErrorSink, TracingErrorSink};
use crate::gpu::{FrameSink, GpuState, RenderOutcome, SceneUniforms};
use crate::params::{ParamValue, ParameterSet};
use crate::physics::Integrator;
use crate::schedule::FrameScheduler;
use crate::variant::VariantCache;
use crate::viewport::Viewport;
use crate::CompileError;

/// Seam between the engine orchestration and the GPU. The production
/// implementation is [`GpuState`]; tests substitute a recording stub.
pub trait Renderer {
    fn install_variant(&mut self, source: &str) -> Result<(), CompileError>;
    fn resize(&mut self, viewport: &Viewport);
    fn render(
        &mut self,
        uniforms: &SceneUniforms,
        sink: Option<&mut dyn FrameSink>,
    ) -> Result<RenderOutcome, EngineError>;
}

impl Renderer for GpuState {
    fn install_variant(&mut self, source: &str) -> Result<(), CompileError> {
        GpuState::install_variant(self, source)
    }

    fn resize(&mut self, viewport: &Viewport) {
        GpuState::resize(self, viewport);
    }

    fn render(
        &mut self,
        uniforms: &SceneUniforms,
        sink: Option<&mut dyn FrameSink>,
    ) -> Result<RenderOutcome, EngineError> {
        GpuState::render(self, uniforms, sink)
    }
}

/// Read-only view of the engine for UI sync and diagnostics.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub params: Vec<(&'static str, ParamValue)>,
    pub paused: bool,
    pub fps: f32,
    pub time: f32,
    pub variant_builds: u64,
}

/// Owns every subsystem and drives one frame per `tick`.
///
/// Inbound control (parameter writes, resets, randomizes, pause, resize)
/// mutates state between frames; `tick` advances the clock, integrates
/// motion, keeps the shader variant current and renders.
pub struct Engine<R: Renderer> {
    params: ParameterSet,
    integrator: Integrator,
    actions: Actions,
    scheduler: FrameScheduler,
    viewport: Viewport,
    cache: VariantCache,
    renderer: R,
    errors: Box<dyn ErrorSink>,
    frame_sink: Option<Box<dyn FrameSink>>,
    device_lost: bool,
}

impl<R: Renderer> Engine<R> {
    pub fn new(renderer: R, width: u32, height: u32, seed: u64) -> Self {
        Self {
            params: ParameterSet::new(),
            integrator: Integrator::new(),
            actions: Actions::new(seed),
            scheduler: FrameScheduler::new(),
            viewport: Viewport::new(width, height),
            cache: VariantCache::new(Box::new(ChunkAssembler)),
            renderer,
            errors: Box::new(TracingErrorSink),
            frame_sink: None,
            device_lost: false,
        }
    }

    pub fn set_error_sink(&mut self, sink: Box<dyn ErrorSink>) {
        self.errors = sink;
    }

    pub fn set_frame_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.frame_sink = Some(sink);
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Writes one parameter. Kind mismatches and unknown names are rejected
    /// without touching engine state.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), EngineError> {
        self.params.set(name, value)
    }

    pub fn trigger_reset(&mut self, channel: ResetChannel) {
        actions::reset(channel, &mut self.params, &mut self.integrator);
    }

    pub fn trigger_randomize(&mut self, group: EffectGroup) {
        self.actions.randomize(group, &mut self.params);
    }

    pub fn randomize_palette(&mut self) {
        self.actions.randomize_palette(&mut self.params);
    }

    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        self.scheduler.set_paused(paused, now);
    }

    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.set_logical(width, height);
        self.renderer.resize(&self.viewport);
    }

    /// Adjusts render quality. Returns the clamped scale actually applied.
    pub fn set_quality_scale(&mut self, scale: f32) -> f32 {
        let applied = self.viewport.set_scale(scale);
        self.renderer.resize(&self.viewport);
        applied
    }

    pub fn quality_scale(&self) -> f32 {
        self.viewport.scale()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            params: self.params.iter().collect(),
            paused: self.scheduler.is_paused(),
            fps: self.scheduler.fps(),
            time: self.scheduler.time(),
            variant_builds: self.cache.builds(),
        }
    }

    /// Runs one frame. While paused this is a no-op: the clock, integrator
    /// and display all hold still until resume.
    pub fn tick(&mut self, now: Instant) {
        if self.device_lost {
            return;
        }

        let speed = self.params.scalar("speed");
        let Some(tick) = self.scheduler.begin_frame(now, speed) else {
            return;
        };
        self.integrator.advance(&mut self.params, tick.dt, speed);

        let key = self.params.variant_key();
        let renderer = &mut self.renderer;
        if let Err(err) = self
            .cache
            .ensure(key, false, |source| renderer.install_variant(source))
        {
            // Keep rendering with the previous program.
            self.errors
                .report(ErrorKind::ShaderCompile, &err.to_string());
        }

        let uniforms = SceneUniforms::from_params(
            &self.params,
            self.viewport.render_size(),
            tick.time,
            tick.dt,
        );
        let sink = self
            .frame_sink
            .as_deref_mut()
            .map(|s| s as &mut dyn FrameSink);
        match self.renderer.render(&uniforms, sink) {
            Ok(_) => {}
            Err(err) => {
                self.errors.report(ErrorKind::DeviceLost, &err.to_string());
                self.cache.invalidate();
                self.device_lost = true;
            }
        }
    }

    /// True once the GPU device is gone and ticks have become no-ops.
    pub fn is_device_lost(&self) -> bool {
        self.device_lost
    }
}
