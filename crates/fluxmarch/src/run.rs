use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use engine::{Engine, GpuState, Viewport};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use crate::cli::Cli;
use crate::hotkeys::{self, HotkeyAction};
use crate::preset::Preset;

pub fn run(args: Cli) -> Result<()> {
    initialise_tracing();

    let (width, height) = args.size;
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title("fluxmarch")
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let actual = window.inner_size();
    let gpu = GpuState::new(window.as_ref(), &Viewport::new(actual.width, actual.height))
        .context("failed to initialise GPU")?;

    let seed = args.seed.unwrap_or_else(time_seed);
    tracing::info!(seed, width = actual.width, height = actual.height, "starting fluxmarch");

    let mut engine = Engine::new(gpu, actual.width, actual.height, seed);
    let applied = engine.set_quality_scale(args.scale);
    if (applied - args.scale).abs() > f32::EPSILON {
        tracing::warn!(requested = args.scale, applied, "quality scale clamped");
    }

    if let Some(path) = args.preset.as_deref() {
        Preset::load(path)?.apply(&mut engine)?;
    }
    if let Some(speed) = args.speed {
        engine.set_parameter("speed", engine::ParamValue::Scalar(speed))?;
    }
    if !args.keep_default_palette {
        engine.randomize_palette();
    }

    let loop_window = window.clone();
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == loop_window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        elwt.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        engine.resize(new_size.width, new_size.height);
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state == ElementState::Pressed && !event.repeat {
                            if let Some(action) = hotkeys::action_for(&event.logical_key) {
                                apply_action(&mut engine, action, elwt);
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        engine.tick(Instant::now());
                        if engine.is_device_lost() {
                            tracing::error!("GPU device lost; exiting");
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                loop_window.request_redraw();
            }
            _ => {}
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}

fn apply_action(
    engine: &mut Engine<GpuState>,
    action: HotkeyAction,
    elwt: &winit::event_loop::EventLoopWindowTarget<()>,
) {
    match action {
        HotkeyAction::TogglePause => {
            let paused = !engine.is_paused();
            engine.set_paused(paused, Instant::now());
            tracing::info!(paused, "pause toggled");
        }
        HotkeyAction::Reset(channel) => engine.trigger_reset(channel),
        HotkeyAction::Randomize(group) => engine.trigger_randomize(group),
        HotkeyAction::RandomizePalette => engine.randomize_palette(),
        HotkeyAction::QualityNudge(delta) => {
            let applied = engine.set_quality_scale(engine.quality_scale() + delta);
            tracing::info!(scale = applied, "quality scale adjusted");
        }
        HotkeyAction::Quit => elwt.exit(),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
