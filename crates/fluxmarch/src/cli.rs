use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fluxmarch",
    author,
    version,
    about = "Real-time generative raymarching visual"
)]
pub struct Cli {
    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value = "1280x720", value_parser = parse_size)]
    pub size: (u32, u32),

    /// Internal render quality scale in (0, 1].
    #[arg(long, value_name = "SCALE", default_value_t = 1.0)]
    pub scale: f32,

    /// Playback speed override.
    #[arg(long, value_name = "SPEED")]
    pub speed: Option<f32>,

    /// Parameter preset TOML to load at startup.
    #[arg(long, value_name = "PATH")]
    pub preset: Option<PathBuf>,

    /// Seed for the randomize actions; defaults to a time-derived seed.
    #[arg(long, value_name = "SEED", env = "FLUXMARCH_SEED")]
    pub seed: Option<u64>,

    /// Keep the default palette instead of shuffling one at startup.
    #[arg(long)]
    pub keep_default_palette: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|err| anyhow!("invalid width `{width}`: {err}"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|err| anyhow!("invalid height `{height}`: {err}"))?;
    if width == 0 || height == 0 {
        return Err(anyhow!("window size must be non-zero, got {width}x{height}"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_pairs() {
        assert_eq!(parse_size("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_size("640X480").unwrap(), (640, 480));
        assert!(parse_size("1920").is_err());
        assert!(parse_size("0x720").is_err());
        assert!(parse_size("axb").is_err());
    }
}
