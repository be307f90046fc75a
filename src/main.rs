/// Entry point and fixed-rate game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level::{load_floor, save_floor, write_export};
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::{Controls, InputState, KeyBindings, MetaAction};
use ui::renderer::{help_line, Renderer};
use ui::sound::{play_events, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(2);
/// Further behind than this many ticks, the clock resyncs instead of catching up.
const MAX_CATCH_UP: u32 = 5;
const MESSAGE_TICKS: u32 = 150;

fn main() {
    let config = GameConfig::load();
    init_tracing(&config.log_file);
    for w in &config.warnings {
        warn!("{w}");
    }

    let map = match load_floor(&config.floor_image) {
        Ok(map) => map,
        Err(e) => {
            error!(error = %e, "cannot start without a floor");
            eprintln!("bootkick: {e}");
            std::process::exit(1);
        }
    };
    let mut world = WorldState::new(map, config.speed.clone(), config.start);

    let mut renderer = Renderer::new(help_line(&config.controls));
    let enhanced = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            let _ = renderer.cleanup();
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config, enhanced);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }
    info!(ticks = world.tick, has_boot = world.actor.has_boot, "session ended");
}

/// Log to the configured file; the terminal belongs to the renderer.
fn init_tracing(path: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match File::create(path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(e) => {
            eprintln!("bootkick: cannot open {}: {e}; logging disabled", path.display());
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    enhanced: bool,
) -> Result<(), Box<dyn Error>> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut pad = GamepadState::new(&config.gamepad);
    let mut controls = Controls::new(KeyBindings::from_config(&config.controls));

    let tick_rate = Duration::from_secs_f64(1.0 / config.speed.tick_rate_hz as f64);
    let mut last_tick = Instant::now();
    // kick presses between ticks are kept for the next one
    let mut pending_kick = false;

    info!(
        tick_rate_hz = config.speed.tick_rate_hz,
        gamepad = pad.connected,
        sound = sound.is_some(),
        key_release = enhanced,
        "game loop started"
    );

    loop {
        kb.drain_events();
        pad.update();
        let (input, meta) = controls.poll(&kb, &pad);

        match meta {
            Some(MetaAction::Quit) => break,
            Some(MetaAction::Pause) => {
                let paused = !world.paused;
                world.set_paused(paused);
                controls.clear();
                pending_kick = false;
                info!(paused, "pause toggled");
            }
            Some(MetaAction::Restart) => {
                restart(world, config);
                controls.clear();
                pending_kick = false;
                last_tick = Instant::now();
            }
            Some(MetaAction::Export) => export(world, config),
            None => {}
        }

        if input.kick && !world.paused {
            pending_kick = true;
        }

        let behind = last_tick.elapsed();
        if behind >= tick_rate {
            if behind > tick_rate * MAX_CATCH_UP {
                last_tick = Instant::now();
            } else {
                last_tick += tick_rate;
            }
            let frame_input = FrameInput { kick: std::mem::take(&mut pending_kick), ..input };
            let events = step::step(world, frame_input);
            announce(world, &events);
            play_events(sound, &events);
        }

        if world.frame_pending || renderer.size_changed() {
            renderer.render(world)?;
        }
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn announce(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        let msg = match *event {
            GameEvent::GrabStarted { row, col } => {
                debug!(row, col, "reaching for the boot");
                continue;
            }
            GameEvent::BootGrabbed { row, col } => {
                debug!(row, col, "boot cell cleared");
                "Boot on! Kick at a ledge to climb, kick at a drop to jump down".to_string()
            }
            GameEvent::ClimbStarted { from, to } => format!("Climb: level {from} to {to}"),
            GameEvent::FallStarted { from, to } => format!("Drop: level {from} to {to}"),
            _ => continue,
        };
        world.set_message(&msg, MESSAGE_TICKS);
    }
}

/// Reload the floor from disk; a failed reload replays the floor loaded at startup.
fn restart(world: &mut WorldState, config: &GameConfig) {
    match load_floor(&config.floor_image) {
        Ok(map) => world.restart(map),
        Err(e) => {
            warn!(error = %e, "reload failed; restarting from the loaded floor");
            world.restart_from_base();
        }
    }
    world.set_message("Restarted", MESSAGE_TICKS);
}

fn export(world: &mut WorldState, config: &GameConfig) {
    let floor_out = floor_copy_path(&config.export_image);
    let result = write_export(&world.map, &config.tileset_image, &config.export_image)
        .and_then(|()| save_floor(&world.map, &floor_out));
    match result {
        Ok(()) => {
            info!(path = %floor_out.display(), "floor saved");
            let msg = format!("Exported {}", config.export_image.display());
            world.set_message(&msg, MESSAGE_TICKS);
        }
        Err(e) => {
            error!(error = %e, "export failed");
            world.set_message(&format!("Export failed: {e}"), MESSAGE_TICKS);
        }
    }
}

/// `<stem>-floor.png` beside the export image.
fn floor_copy_path(export: &Path) -> PathBuf {
    let stem = export.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".into());
    export.with_file_name(format!("{stem}-floor.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_copy_sits_beside_export() {
        assert_eq!(floor_copy_path(Path::new("out/map.png")), PathBuf::from("out/map-floor.png"));
        assert_eq!(floor_copy_path(Path::new("map")), PathBuf::from("map-floor.png"));
    }
}
