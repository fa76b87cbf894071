use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use engine::{Engine, ParamKind, ParamValue, Renderer};
use serde::Deserialize;

/// Startup parameter preset.
///
/// Values are typed against the engine's parameter registry when applied, so
/// a preset cannot introduce unknown names or mistyped values.
#[derive(Debug, Default, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
}

impl Preset {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read preset at {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse preset at {}", path.display()))
    }

    pub fn apply<R: Renderer>(&self, engine: &mut Engine<R>) -> Result<()> {
        for (name, raw) in &self.params {
            let kind = engine
                .params()
                .kind_of(name)
                .ok_or_else(|| anyhow!("unknown parameter `{name}` in preset"))?;
            let value = convert(kind, raw)
                .with_context(|| format!("invalid value for parameter `{name}`"))?;
            engine
                .set_parameter(name, value)
                .with_context(|| format!("failed to apply parameter `{name}`"))?;
        }
        tracing::info!(count = self.params.len(), "applied preset parameters");
        Ok(())
    }
}

fn convert(kind: ParamKind, value: &toml::Value) -> Result<ParamValue> {
    match kind {
        ParamKind::Scalar => number(value).map(ParamValue::Scalar),
        ParamKind::Int => value
            .as_integer()
            .map(|v| ParamValue::Int(v as i32))
            .ok_or_else(|| anyhow!("expected an integer, got {value}")),
        ParamKind::Vec2 => {
            let parts = numbers(value, 2)?;
            Ok(ParamValue::Vec2([parts[0], parts[1]]))
        }
        ParamKind::Vec3 => {
            let parts = numbers(value, 3)?;
            Ok(ParamValue::Vec3([parts[0], parts[1], parts[2]]))
        }
    }
}

fn number(value: &toml::Value) -> Result<f32> {
    match value {
        toml::Value::Float(v) => Ok(*v as f32),
        toml::Value::Integer(v) => Ok(*v as f32),
        other => Err(anyhow!("expected a number, got {other}")),
    }
}

fn numbers(value: &toml::Value, expected: usize) -> Result<Vec<f32>> {
    let array = value
        .as_array()
        .ok_or_else(|| anyhow!("expected an array of {expected} numbers, got {value}"))?;
    if array.len() != expected {
        return Err(anyhow!(
            "expected {expected} components, got {}",
            array.len()
        ));
    }
    array.iter().map(number).collect()
}
