//! Chunk-based assembly of the main raymarch fragment shader.
//!
//! The variant key decides structure only: which SDF chunk is linked in,
//! whether the displacement call is emitted at all, and whether the fog path
//! exists. Every other effect selector stays a runtime uniform so flipping it
//! never forces a recompile.

use crate::error::CompileError;
use crate::variant::{ShaderAssembler, VariantKey};

/// Shape chunks addressable by `shape_type`. Unknown indices fall back to the
/// box, mirroring the permissive behaviour of the rest of the parameter
/// surface.
const SHAPE_KEYS: &[&str] = &[
    "box",
    "sphere",
    "octahedron",
    "cross",
    "carved_box",
    "cone",
    "double_cone",
    "mandelbulb",
];

/// Default assembler used by the engine.
#[derive(Debug, Default)]
pub struct ChunkAssembler;

impl ChunkAssembler {
    fn shape_chunk(&self, shape_type: i32) -> &'static str {
        let key = usize::try_from(shape_type)
            .ok()
            .and_then(|index| SHAPE_KEYS.get(index))
            .copied()
            .unwrap_or("box");
        match key {
            "sphere" => SDF_SPHERE,
            "octahedron" => SDF_OCTAHEDRON,
            "cross" => SDF_CROSS,
            "carved_box" => SDF_CARVED_BOX,
            "cone" => SDF_CONE,
            "double_cone" => SDF_DOUBLE_CONE,
            "mandelbulb" => SDF_MANDELBULB,
            _ => SDF_BOX,
        }
    }

    fn map_chunk(&self, key: &VariantKey) -> String {
        let displacement_call = if key.displacement_active {
            "    d = opDisplace(d, p);\n"
        } else {
            ""
        };
        let fog_branch = if key.fog_enabled {
            "    if (mode == 4) { return fogField(og_p, t); }\n"
        } else {
            ""
        };
        format!(
            "float map(vec3 p, int i, float t) {{\n\
             \x20   int mode = int(u.shape.y);\n\
             \x20   p = worldEffects(p, t);\n\
             \x20   if (u.effect.x > 0.01) {{ p = sceneWarp(p); }}\n\
             \x20   vec3 og_p = p;\n\
             {fog_branch}\
             \x20   if (mode == 2) {{ p = fractalWorld(p); }}\n\
             \x20   p.xy = rotMain() * p.xy;\n\
             \x20   float d;\n\
             \x20   if (mode == 0) {{\n\
             \x20       d = sdShape(p * 0.65, u.shape.z) / 0.65;\n\
             \x20   }} else if (mode == 1) {{\n\
             \x20       d = opLimitedRepetition(p * 0.65, 0.25, u.shape.z) / 0.65;\n\
             \x20   }} else {{\n\
             \x20       d = sdShape(p, u.shape.z);\n\
             \x20   }}\n\
             {displacement_call}\
             \x20   return d;\n\
             }}\n"
        )
    }
}

impl ShaderAssembler for ChunkAssembler {
    fn build(&self, key: &VariantKey) -> Result<String, CompileError> {
        if key.shape_mode < 0 || key.shape_mode > 5 {
            return Err(CompileError::Assemble(format!(
                "shape mode {} outside supported range",
                key.shape_mode
            )));
        }

        let mut source = String::with_capacity(8 * 1024);
        source.push_str(HEADER);
        source.push_str(MATH_LIB);
        source.push_str(NOISE_LIB);
        source.push_str(DOMAIN_FX);
        if key.displacement_active {
            source.push_str(DISPLACE_LIB);
        }
        if key.fog_enabled {
            source.push_str(FOG_FX);
        }
        source.push_str(self.shape_chunk(key.shape_type));
        source.push_str(REPEAT_FX);
        source.push_str(&self.map_chunk(key));
        source.push_str(COLOR_LIB);
        source.push_str(FEEDBACK_FX);
        source.push_str(MAIN_LOOP);
        Ok(source)
    }
}

/// Uniform block and feedback texture bindings. The block layout must match
/// `SceneUniforms` in `gpu/uniforms.rs` field for field.
pub(crate) const HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 out_color;

layout(std140, set = 0, binding = 0) uniform SceneParams {
    vec4 resolution;
    vec4 camera;
    vec4 shape;
    vec4 domain;
    vec4 rotation;
    vec4 displacement;
    vec4 effect;
    vec4 palette_a;
    vec4 palette_b;
    vec4 palette_c;
    vec4 palette_d;
    vec4 fog;
    vec4 turbulence;
    vec4 drift_offset;
    vec4 halving_base;
    vec4 halving_phase;
    vec4 uv_transform;
    vec4 uv_grid;
    vec4 warp;
    vec4 warp_extra;
    vec4 uv_feedback;
    vec4 uv_feedback_extra;
    vec4 feedback;
    vec4 bloom;
} u;

layout(set = 1, binding = 0) uniform texture2D uv_warp_tex;
layout(set = 1, binding = 1) uniform sampler uv_warp_smp;
layout(set = 2, binding = 0) uniform texture2D feedback_tex;
layout(set = 2, binding = 1) uniform sampler feedback_smp;
";

const MATH_LIB: &str = r"
mat2 rot2(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat2(c, -s, s, c);
}

mat2 rotMain() {
    return mat2(u.rotation.y, -u.rotation.x, u.rotation.x, u.rotation.y);
}

mat2 rotFractal() {
    return mat2(u.rotation.w, -u.rotation.z, u.rotation.z, u.rotation.w);
}
";

const NOISE_LIB: &str = r"
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

const DOMAIN_FX: &str = r"
vec3 applyTwist(vec3 p, float k) {
    float a = k * p.y;
    p.xz = rot2(a) * p.xz;
    return p;
}

vec3 applyCrunch(vec3 p, float t) {
    float amount = u.domain.y;
    int kind = int(u.domain.z);
    if (amount <= 0.0) { return p; }
    if (kind == 1) {
        p += sin(p.yzx * 4.0 + t) * amount * 0.25;
    } else if (kind == 2) {
        p = mix(p, smoothstep(-1.0, 1.0, p) * 2.0 - 1.0, amount);
    } else if (kind == 3) {
        p = mix(p, floor(p * 4.0) / 4.0, amount);
    } else {
        p += sin(p * 6.0) * amount * 0.2;
    }
    return p;
}

vec3 worldEffects(vec3 p, float t) {
    p = applyTwist(p, u.domain.x);
    p = applyCrunch(p, t);
    return p;
}

vec3 sceneWarp(vec3 p) {
    int kind = int(u.displacement.w);
    float m = u.effect.x;
    vec3 q = p;
    if (kind == 0) {
        q += sin(p.zxy * 3.0) * 0.2;
    } else if (kind == 1) {
        q.z *= 1.0 + 0.3 * sin(length(p.xy) * 4.0);
    } else if (kind == 2) {
        q.xy += vec2(sin(p.y * 5.0), cos(p.x * 5.0)) * 0.15;
    } else {
        q += abs(sin(length(p) * 4.0)) * 0.1;
    }
    return mix(p, q, clamp(m, 0.0, 1.0));
}

vec3 fractalWorld(vec3 p) {
    p += u.drift_offset.xyz;
    vec3 spread = max(u.halving_base.xyz + sin(u.halving_phase.xyz) * 0.5, vec3(0.05));
    p = mod(p + 0.5 * spread, spread) - 0.5 * spread;
    p.xz = rotFractal() * p.xz;
    return p;
}
";

const DISPLACE_LIB: &str = r"
float opDisplace(float d, vec3 p) {
    int kind = int(u.displacement.z);
    float freq = u.displacement.x;
    float amp = u.displacement.y;
    float t = u.resolution.z;
    float wave;
    if (kind == 1) {
        wave = vnoise(p * freq * 0.25 + t * 0.2) * 2.0 - 1.0;
    } else if (kind == 2) {
        wave = sin(length(p) * freq - t * 2.0);
    } else if (kind == 3) {
        wave = sin(p.x * freq) * sin(p.y * freq);
    } else {
        wave = sin(p.x * freq + t) * sin(p.y * freq + t) * sin(p.z * freq + t);
    }
    return d + wave * amp;
}
";

const FOG_FX: &str = r"
float fogField(vec3 p, float t) {
    float acc = 0.0;
    float amp = u.fog.w;
    float freq = u.turbulence.y;
    vec3 q = p * u.fog.y;
    int octaves = int(min(u.fog.z, 8.0));
    for (int i = 0; i < 8; ++i) {
        if (i >= octaves) { break; }
        acc += amp * vnoise(q + u.turbulence.w);
        q *= freq;
        amp = pow(amp, u.turbulence.z) * 0.5;
    }
    return 0.4 - acc * 0.2;
}
";

const SDF_BOX: &str = r"
float sdShape(vec3 p, float s) {
    vec3 q = abs(p) - vec3(s);
    return length(max(q, 0.0)) + min(max(q.x, max(q.y, q.z)), 0.0);
}
";

const SDF_SPHERE: &str = r"
float sdShape(vec3 p, float s) {
    return length(p) - s;
}
";

const SDF_OCTAHEDRON: &str = r"
float sdShape(vec3 p, float s) {
    p = abs(p);
    return (p.x + p.y + p.z - s) * 0.57735027;
}
";

const SDF_CROSS: &str = r"
float sdShape(vec3 p, float s) {
    vec3 a = abs(p);
    float dx = max(a.y, a.z) - s * 0.35;
    float dy = max(a.x, a.z) - s * 0.35;
    float dz = max(a.x, a.y) - s * 0.35;
    return min(dx, min(dy, dz)) - s * 0.1;
}
";

const SDF_CARVED_BOX: &str = r"
float sdShape(vec3 p, float s) {
    vec3 q = abs(p) - vec3(s);
    float box = length(max(q, 0.0)) + min(max(q.x, max(q.y, q.z)), 0.0);
    float carve = length(p) - s * 1.2;
    return max(box, -carve);
}
";

const SDF_CONE: &str = r"
float sdShape(vec3 p, float s) {
    float q = length(p.xz);
    return max(dot(vec2(0.8, 0.6), vec2(q, p.y)), -p.y - s);
}
";

const SDF_DOUBLE_CONE: &str = r"
float sdShape(vec3 p, float s) {
    float q = length(p.xz);
    return dot(vec2(0.8, 0.6), vec2(q, abs(p.y) - s));
}
";

const SDF_MANDELBULB: &str = r"
float sdShape(vec3 p, float s) {
    vec3 z = p;
    float dr = 1.0;
    float r = 0.0;
    for (int i = 0; i < 6; ++i) {
        r = length(z);
        if (r > 2.0) { break; }
        float theta = acos(clamp(z.z / max(r, 0.0001), -1.0, 1.0)) * 8.0;
        float phi = atan(z.y, z.x) * 8.0;
        float zr = pow(r, 8.0);
        dr = pow(r, 7.0) * 8.0 * dr + 1.0;
        z = zr * vec3(sin(theta) * cos(phi), sin(phi) * sin(theta), cos(theta)) + p;
    }
    return 0.25 * log(max(r, 0.0001)) * r / dr * (0.5 + s);
}
";

const REPEAT_FX: &str = r"
float opLimitedRepetition(vec3 p, float spacing, float s) {
    vec3 id = clamp(round(p / spacing), -vec3(1.0), vec3(1.0));
    vec3 q = p - spacing * id;
    return sdShape(q, s);
}
";

const COLOR_LIB: &str = r"
vec3 palette(float t) {
    return u.palette_a.xyz
        + u.palette_b.xyz * cos(6.28318 * (u.palette_c.xyz * t + u.palette_d.xyz));
}

vec3 accumulateColor(float t, float d, int i, vec3 p, vec3 col) {
    int kind = int(u.effect.w);
    float glow = u.effect.y / max(abs(d), 0.0005);
    if (kind == 1) {
        col += glow * vec3(0.6, 0.7, 1.0) * exp(-t * 0.25);
    } else if (kind == 2) {
        col += glow * palette(float(i) * 0.02);
    } else if (kind == 3) {
        col += glow * palette(t * 0.1 + u.resolution.z * 0.02);
    } else {
        col += glow * palette(length(p) * 0.25);
    }
    return col;
}

vec3 tonemap(vec3 c) {
    return tanh(c * u.effect.z);
}
";

const FEEDBACK_FX: &str = r"
vec4 mixFeedback(vec4 color, vec2 frag_coord) {
    vec2 uv = frag_coord / u.resolution.xy;
    vec2 offset = (vnoise(vec3(uv * 8.0, u.resolution.z)) - 0.5) * u.feedback.z * vec2(1.0);
    vec4 history = texture(sampler2D(feedback_tex, feedback_smp), uv + offset);
    if (u.feedback.y > 0.0) {
        vec2 px = u.feedback.y * 4.0 / u.resolution.xy;
        history += texture(sampler2D(feedback_tex, feedback_smp), uv + vec2(px.x, 0.0));
        history += texture(sampler2D(feedback_tex, feedback_smp), uv - vec2(px.x, 0.0));
        history += texture(sampler2D(feedback_tex, feedback_smp), uv + vec2(0.0, px.y));
        history += texture(sampler2D(feedback_tex, feedback_smp), uv - vec2(0.0, px.y));
        history *= 0.2;
    }
    return mix(color, max(color, history * u.feedback.w), u.feedback.x);
}
";

const MAIN_LOOP: &str = r"
void main() {
    vec2 frag_coord = v_uv * u.resolution.xy;
    vec2 warped = texture(sampler2D(uv_warp_tex, uv_warp_smp), v_uv).rg;

    float theta = u.camera.x;
    float phi = clamp(u.camera.y, 0.01, 3.04159);
    float dist = u.camera.z;
    vec3 ro = vec3(
        dist * sin(phi) * sin(-theta),
        dist * cos(phi),
        dist * sin(phi) * cos(-theta));
    vec3 forward = normalize(-ro);
    vec3 right = normalize(cross(forward, vec3(0.0, 1.0, 0.0)));
    vec3 up = cross(right, forward);
    vec3 rd = normalize(warped.x * right + warped.y * up + 1.5 * forward);

    float eps = max(0.001, 0.001 / u.camera.w);
    float t = 0.0;
    vec3 p = ro;
    vec3 col = vec3(0.0);
    int quality = int(u.shape.w);

    for (int i = 0; i < 256; ++i) {
        if (i >= quality) { break; }
        p = ro + rd * t;
        float d = map(p, i, t);
        t += d;
        col = accumulateColor(t, d, i, p, col);
        if (d < eps || t > 100.0 / u.camera.w) { break; }
    }

    vec4 color = vec4(tonemap(col), 1.0);
    if (u.feedback.x > 0.0) {
        color = mixFeedback(color, frag_coord);
    }
    out_color = color;
}
";

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> VariantKey {
        VariantKey {
            shape_type: 0,
            shape_mode: 0,
            displacement_active: false,
            fog_enabled: false,
        }
    }

    #[test]
    fn displacement_chunk_is_gated_by_key() {
        let assembler = ChunkAssembler;
        let inactive = assembler.build(&key()).unwrap();
        assert!(!inactive.contains("opDisplace"));

        let mut active_key = key();
        active_key.displacement_active = true;
        let active = assembler.build(&active_key).unwrap();
        assert!(active.contains("float opDisplace"));
        assert!(active.contains("d = opDisplace(d, p);"));
    }

    #[test]
    fn fog_chunk_is_gated_by_key() {
        let assembler = ChunkAssembler;
        assert!(!assembler.build(&key()).unwrap().contains("fogField"));

        let mut fog_key = key();
        fog_key.fog_enabled = true;
        let source = assembler.build(&fog_key).unwrap();
        assert!(source.contains("float fogField"));
        assert!(source.contains("return fogField(og_p, t);"));
    }

    #[test]
    fn shape_selection_changes_sdf_chunk() {
        let assembler = ChunkAssembler;
        let box_src = assembler.build(&key()).unwrap();
        let mut sphere_key = key();
        sphere_key.shape_type = 1;
        let sphere_src = assembler.build(&sphere_key).unwrap();
        assert_ne!(box_src, sphere_src);
        assert!(sphere_src.contains("return length(p) - s;"));
    }

    #[test]
    fn unknown_shape_falls_back_to_box() {
        let assembler = ChunkAssembler;
        let mut odd = key();
        odd.shape_type = 99;
        assert_eq!(
            assembler.build(&odd).unwrap(),
            assembler.build(&key()).unwrap()
        );
    }

    #[test]
    fn out_of_range_mode_is_a_compile_error() {
        let assembler = ChunkAssembler;
        let mut bad = key();
        bad.shape_mode = 17;
        assert!(matches!(
            assembler.build(&bad),
            Err(CompileError::Assemble(_))
        ));
    }

    #[test]
    fn output_is_deterministic_per_key() {
        let assembler = ChunkAssembler;
        assert_eq!(
            assembler.build(&key()).unwrap(),
            assembler.build(&key()).unwrap()
        );
    }
}
