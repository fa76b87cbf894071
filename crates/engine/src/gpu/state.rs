use anyhow::{Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::naga::ShaderStage;
use winit::dpi::PhysicalSize;

use crate::error::{CompileError, EngineError};
use crate::viewport::Viewport;

use super::context::GpuContext;
use super::feedback::{FeedbackTargets, FEEDBACK_FORMAT};
use super::pipeline::{self, PipelineLayouts};
use super::uniforms::SceneUniforms;

/// What a render call actually did with the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Presented,
    /// The surface was unavailable this frame; nothing was drawn.
    Skipped,
}

/// Observer of finished frames. Receives the raymarch output texture after
/// the frame's passes have been submitted.
pub trait FrameSink {
    fn on_frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture);
}

/// All GPU-side state: device, fixed pipelines, the two feedback loops and
/// the currently installed shader variant.
pub struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uv_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    scene_pipeline: Option<wgpu::RenderPipeline>,
    uv_targets: FeedbackTargets,
    main_targets: FeedbackTargets,
    render_size: (u32, u32),
}

impl GpuState {
    pub fn new<T>(target: &T, viewport: &Viewport) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let (width, height) = viewport.logical_size();
        let context = GpuContext::new(target, PhysicalSize::new(width, height))?;
        let layouts = PipelineLayouts::new(&context.device)?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene uniform bind group"),
            layout: &layouts.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let uv_module = pipeline::compile_glsl(
            &context.device,
            "uv warp fragment",
            &pipeline::uv_warp_source(),
            ShaderStage::Fragment,
        )
        .context("failed to compile uv warp pass")?;
        let uv_pipeline = pipeline::build_pipeline(
            &context.device,
            &layouts,
            &uv_module,
            FEEDBACK_FORMAT,
            "uv warp pipeline",
        );

        let composite_module = pipeline::compile_glsl(
            &context.device,
            "composite fragment",
            &pipeline::composite_source(),
            ShaderStage::Fragment,
        )
        .context("failed to compile composite pass")?;
        let composite_pipeline = pipeline::build_pipeline(
            &context.device,
            &layouts,
            &composite_module,
            context.surface_format,
            "composite pipeline",
        );

        let render_size = viewport.render_size();
        let uv_targets = FeedbackTargets::new(&context.device, &layouts, render_size, "uv loop");
        let main_targets =
            FeedbackTargets::new(&context.device, &layouts, render_size, "main loop");

        Ok(Self {
            context,
            layouts,
            uniform_buffer,
            uniform_bind_group,
            uv_pipeline,
            composite_pipeline,
            scene_pipeline: None,
            uv_targets,
            main_targets,
            render_size,
        })
    }

    /// Compiles and installs a freshly assembled variant. On failure the
    /// previously installed pipeline stays active.
    pub fn install_variant(&mut self, source: &str) -> Result<(), CompileError> {
        let module = pipeline::compile_glsl(
            &self.context.device,
            "scene fragment",
            source,
            ShaderStage::Fragment,
        )?;
        self.scene_pipeline = Some(pipeline::build_pipeline(
            &self.context.device,
            &self.layouts,
            &module,
            FEEDBACK_FORMAT,
            "scene pipeline",
        ));
        Ok(())
    }

    /// Applies the viewport's surface and render sizes. The feedback arenas
    /// are only rebuilt when the internal render size actually changed.
    pub fn resize(&mut self, viewport: &Viewport) {
        let (width, height) = viewport.logical_size();
        self.context.resize(PhysicalSize::new(width, height));

        let render_size = viewport.render_size();
        if render_size != self.render_size {
            self.render_size = render_size;
            self.uv_targets
                .resize(&self.context.device, &self.layouts, render_size);
            self.main_targets
                .resize(&self.context.device, &self.layouts, render_size);
            tracing::debug!(?render_size, "rebuilt feedback targets");
        }
    }

    /// Renders one frame: uv warp pass, raymarch pass, composite to surface.
    pub fn render(
        &mut self,
        uniforms: &SceneUniforms,
        sink: Option<&mut dyn FrameSink>,
    ) -> Result<RenderOutcome, EngineError> {
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Timeout) => return Ok(RenderOutcome::Skipped),
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Ok(RenderOutcome::Skipped);
            }
            Err(wgpu::SurfaceError::OutOfMemory) | Err(wgpu::SurfaceError::Other) => {
                return Err(EngineError::DeviceLost);
            }
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        {
            let mut pass = begin_pass(&mut encoder, self.uv_targets.back_view(), "uv warp pass");
            pass.set_pipeline(&self.uv_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, self.uv_targets.front_bind_group(), &[]);
            pass.set_bind_group(2, self.main_targets.front_bind_group(), &[]);
            pass.draw(0..3, 0..1);
        }
        self.uv_targets.swap();

        if let Some(scene_pipeline) = &self.scene_pipeline {
            let mut pass = begin_pass(&mut encoder, self.main_targets.back_view(), "scene pass");
            pass.set_pipeline(scene_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, self.uv_targets.front_bind_group(), &[]);
            pass.set_bind_group(2, self.main_targets.front_bind_group(), &[]);
            pass.draw(0..3, 0..1);
        }
        self.main_targets.swap();

        {
            let mut pass = begin_pass(&mut encoder, &surface_view, "composite pass");
            pass.set_pipeline(&self.composite_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, self.uv_targets.front_bind_group(), &[]);
            pass.set_bind_group(2, self.main_targets.front_bind_group(), &[]);
            pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(Some(encoder.finish()));
        if let Some(sink) = sink {
            sink.on_frame(
                &self.context.device,
                &self.context.queue,
                self.main_targets.front_texture(),
            );
        }
        frame.present();
        Ok(RenderOutcome::Presented)
    }
}

fn begin_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    view: &'a wgpu::TextureView,
    label: &'static str,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}
