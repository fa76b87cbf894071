use std::borrow::Cow;

use anyhow::Result;
use wgpu::naga;
use wgpu::naga::ShaderStage;

use crate::assemble::HEADER;
use crate::error::CompileError;

/// Shared bind group layouts and the fixed vertex stage.
///
/// Every pass uses the same pipeline layout: set 0 is the uniform block,
/// sets 1 and 2 are texture/sampler pairs for the two feedback loops. A pass
/// that only reads one of them simply ignores the other binding.
pub(crate) struct PipelineLayouts {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub vertex_module: wgpu::ShaderModule,
    pub sampler: wgpu::Sampler,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Result<Self> {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("feedback texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let vertex_module = compile_glsl(
            device,
            "fullscreen triangle vertex",
            VERTEX_SHADER_GLSL,
            ShaderStage::Vertex,
        )?;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("feedback sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            uniform_layout,
            texture_layout,
            vertex_module,
            sampler,
        })
    }
}

/// Compiles GLSL, running the parser and validator up front so failures come
/// back as typed errors instead of device-side shader errors mid-frame.
pub(crate) fn compile_glsl(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, CompileError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&naga::front::glsl::Options::from(stage), source)
        .map_err(|err| CompileError::Parse(err.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|err| CompileError::Validate(err.emit_to_string(source)))?;

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_string()),
            stage,
            defines: &[],
        },
    }))
}

/// Builds a fullscreen pass pipeline over the shared layouts.
pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    fragment_module: &wgpu::ShaderModule,
    target_format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[
            &layouts.uniform_layout,
            &layouts.texture_layout,
            &layouts.texture_layout,
        ],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &layouts.vertex_module,
            entry_point: Some("main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}

pub(crate) fn uv_warp_source() -> String {
    format!("{HEADER}{MATH_GLSL}{NOISE_GLSL}{UV_WARP_BODY}")
}

pub(crate) fn composite_source() -> String {
    format!("{HEADER}{COMPOSITE_BODY}")
}

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

const MATH_GLSL: &str = r"
mat2 rot2(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat2(c, -s, s, c);
}
";

const NOISE_GLSL: &str = r"
float hash13(vec3 p) {
    p = fract(p * 0.1031);
    p += dot(p, p.zyx + 31.32);
    return fract((p.x + p.y) * p.z);
}

float vnoise(vec3 p) {
    vec3 i = floor(p);
    vec3 f = fract(p);
    f = f * f * (3.0 - 2.0 * f);
    float n000 = hash13(i);
    float n100 = hash13(i + vec3(1.0, 0.0, 0.0));
    float n010 = hash13(i + vec3(0.0, 1.0, 0.0));
    float n110 = hash13(i + vec3(1.0, 1.0, 0.0));
    float n001 = hash13(i + vec3(0.0, 0.0, 1.0));
    float n101 = hash13(i + vec3(1.0, 0.0, 1.0));
    float n011 = hash13(i + vec3(0.0, 1.0, 1.0));
    float n111 = hash13(i + vec3(1.0, 1.0, 1.0));
    return mix(
        mix(mix(n000, n100, f.x), mix(n010, n110, f.x), f.y),
        mix(mix(n001, n101, f.x), mix(n011, n111, f.x), f.y),
        f.z);
}
";

/// First pass of the frame: computes warped ray coordinates for the raymarch
/// pass, blended against its own previous output.
const UV_WARP_BODY: &str = r"
vec2 warpLayers(vec2 uv) {
    float amp = u.warp.w;
    if (amp <= 0.0) { return uv; }
    int layers = int(max(u.warp_extra.x, 1.0));
    int harmonics = int(max(u.warp.y, 1.0));
    float t = u.resolution.z * 0.1;
    for (int l = 0; l < 4; ++l) {
        if (l >= layers) { break; }
        float gain = u.warp.x;
        float freq = 2.0;
        vec2 acc = vec2(0.0);
        for (int h = 0; h < 8; ++h) {
            if (h >= harmonics) { break; }
            acc += gain
                * vec2(
                    vnoise(vec3(uv * freq, t + float(l) * 13.7)) - 0.5,
                    vnoise(vec3(uv.yx * freq, t + float(l) * 7.3)) - 0.5);
            freq *= u.warp.z;
            gain *= u.warp.x;
        }
        uv += acc * amp;
    }
    return uv;
}

void main() {
    vec2 res = u.resolution.xy;
    vec2 uv = v_uv * 2.0 - 1.0;
    uv.x *= res.x / res.y;

    float pixel = u.uv_feedback_extra.w;
    if (pixel > 0.0) {
        uv = floor(uv / pixel) * pixel + pixel * 0.5;
    }

    uv /= max(u.uv_transform.x, 0.001);
    uv = rot2(u.uv_transform.y) * uv;
    uv += u.uv_transform.zw;

    float r2 = dot(uv, uv);
    uv *= 1.0 + u.warp_extra.y * r2;

    if (u.warp_extra.z > 0.0) {
        vec2 polar = vec2(atan(uv.y, uv.x), length(uv));
        uv = mix(uv, polar, clamp(u.warp_extra.z, 0.0, 1.0));
    }
    if (u.warp_extra.w > 0.0) {
        uv *= 1.0 - u.warp_extra.w * exp(-r2 * 2.0);
    }

    if (u.uv_grid.z > 0.0) {
        vec2 cell = sin(uv * u.uv_grid.xy);
        if (int(u.uv_grid.w) == 1) {
            cell = abs(cell);
        }
        uv += cell * u.uv_grid.z * 0.05;
    }

    uv = warpLayers(uv);

    float opacity = u.uv_feedback.x;
    if (opacity > 0.0) {
        vec2 prev = texture(sampler2D(uv_warp_tex, uv_warp_smp), v_uv).rg;
        float n = vnoise(vec3(v_uv * 8.0 * u.uv_feedback.w, u.resolution.z * 0.3));
        vec2 drifted = prev
            + (vec2(n, vnoise(vec3(v_uv.yx * 8.0, u.resolution.z * 0.3))) - 0.5)
                * u.uv_feedback.z
                * u.uv_feedback_extra.y;
        vec2 held = mix(drifted, prev, u.uv_feedback_extra.z);
        uv = mix(uv, held * u.uv_feedback_extra.x * 2.0, opacity);
    }

    out_color = vec4(uv, 0.0, 1.0);
}
";

/// Final pass: samples the raymarch output and applies bloom before
/// presenting to the surface.
const COMPOSITE_BODY: &str = r"
void main() {
    vec2 uv = v_uv;
    vec4 color = texture(sampler2D(feedback_tex, feedback_smp), uv);

    if (u.bloom.x > 0.0) {
        vec3 glow = vec3(0.0);
        vec2 px = u.bloom.y * 8.0 / u.resolution.xy;
        for (int i = 0; i < 8; ++i) {
            float a = 6.2831853 * float(i) / 8.0;
            vec3 s = texture(
                sampler2D(feedback_tex, feedback_smp),
                uv + vec2(cos(a), sin(a)) * px).rgb;
            glow += max(s - vec3(u.bloom.z), vec3(0.0));
        }
        color.rgb += glow * (u.bloom.x / 8.0);
    }

    out_color = vec4(color.rgb, 1.0);
}
";
