mod context;
mod feedback;
mod pipeline;
mod state;
mod uniforms;

pub use state::{FrameSink, GpuState, RenderOutcome};
pub use uniforms::SceneUniforms;
