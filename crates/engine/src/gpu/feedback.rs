use super::pipeline::PipelineLayouts;

/// Pixel format for both feedback loops. Float storage keeps the uv pass
/// coordinates signed and the raymarch accumulation unclamped.
pub(crate) const FEEDBACK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Read/write index pair over a fixed two-slot arena. Swapping flips the
/// index; the textures themselves are never reallocated per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PingPong {
    read: usize,
}

impl PingPong {
    /// Slot sampled this frame: last frame's output.
    pub fn front(&self) -> usize {
        self.read
    }

    /// Slot rendered into this frame.
    pub fn back(&self) -> usize {
        1 - self.read
    }

    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }
}

/// One feedback loop: two textures plus their views and bind groups, and the
/// index that alternates between them.
pub(crate) struct FeedbackTargets {
    label: &'static str,
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    bind_groups: [wgpu::BindGroup; 2],
    ping: PingPong,
}

impl FeedbackTargets {
    pub fn new(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        size: (u32, u32),
        label: &'static str,
    ) -> Self {
        let make = |slot: usize| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: size.0.max(1),
                    height: size.1.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FEEDBACK_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let textures = [make(0), make(1)];
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];
        let bind_groups = [
            Self::bind_group(device, layouts, &views[0], label),
            Self::bind_group(device, layouts, &views[1], label),
        ];
        Self {
            label,
            textures,
            views,
            bind_groups,
            ping: PingPong::default(),
        }
    }

    fn bind_group(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        view: &wgpu::TextureView,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&layouts.sampler),
                },
            ],
        })
    }

    /// Recreates both slots at a new render size. History is discarded; the
    /// next frame reads cleared textures and the loop refills over a few
    /// frames.
    pub fn resize(&mut self, device: &wgpu::Device, layouts: &PipelineLayouts, size: (u32, u32)) {
        *self = Self::new(device, layouts, size, self.label);
    }

    pub fn front_bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_groups[self.ping.front()]
    }

    pub fn front_texture(&self) -> &wgpu::Texture {
        &self.textures[self.ping.front()]
    }

    pub fn back_view(&self) -> &wgpu::TextureView {
        &self.views[self.ping.back()]
    }

    pub fn swap(&mut self) {
        self.ping.swap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_and_back_never_alias() {
        let mut ping = PingPong::default();
        for _ in 0..5 {
            assert_ne!(ping.front(), ping.back());
            ping.swap();
        }
    }

    #[test]
    fn swap_alternates_between_two_slots() {
        let mut ping = PingPong::default();
        let first_back = ping.back();
        ping.swap();
        assert_eq!(ping.front(), first_back);
        ping.swap();
        assert_eq!(ping.front(), 1 - first_back);
    }
}
