//! Real-time generative raymarching engine.
//!
//! The engine renders a procedurally shaded scene through three GPU passes
//! per frame: a UV warp pass feeding its own previous output back into
//! itself, the raymarch pass blending against its previous frame, and a
//! composite pass to the surface. All animation is driven by a flat
//! [`params::ParameterSet`] that producers write and the renderer reads, with
//! hidden velocity state smoothed by the [`physics::Integrator`].

pub mod actions;
pub mod assemble;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod params;
pub mod physics;
pub mod schedule;
pub mod variant;
pub mod viewport;

pub use actions::{Actions, EffectGroup, ResetChannel};
pub use engine::{Engine, EngineSnapshot, Renderer};
pub use error::{CompileError, EngineError, ErrorKind, ErrorSink, TracingErrorSink};
pub use gpu::{FrameSink, GpuState, RenderOutcome, SceneUniforms};
pub use params::{ParamKind, ParamValue, ParameterSet, PARAMETER_DEFAULTS};
pub use physics::Integrator;
pub use schedule::{FrameScheduler, FrameTick, SchedulerState};
pub use variant::{ShaderAssembler, VariantCache, VariantKey};
pub use viewport::Viewport;
