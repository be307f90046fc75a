/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Every key has a default, so a missing file or missing keys still yield a
/// full config. Problems are collected in `warnings` and logged once the
/// subscriber is up (the log file path itself comes from this config).

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::entity::{START_X, START_Y, START_Z};
use crate::domain::physics::SPEED;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub start: StartConfig,
    pub controls: ControlsConfig,
    pub gamepad: GamepadConfig,
    pub floor_image: PathBuf,
    pub tileset_image: PathBuf,
    pub export_image: PathBuf,
    pub log_file: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeedConfig {
    pub tick_rate_hz: u32,
    /// Sub-tile units per tick.
    pub walk_speed: f64,
    /// Applied to `walk_speed` while boost is held.
    pub boost_multiplier: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            tick_rate_hz: default_tick_rate(),
            walk_speed: default_walk_speed(),
            boost_multiplier: default_boost(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartConfig {
    pub x: f64,
    pub y: f64,
    pub z: u8,
}

impl Default for StartConfig {
    fn default() -> Self {
        StartConfig { x: START_X, y: START_Y, z: START_Z }
    }
}

/// Keyboard key names per action (see `ui::input::parse_key`).
#[derive(Clone, Debug)]
pub struct ControlsConfig {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub kick: Vec<String>,
    pub boost: Vec<String>,
    pub pause: Vec<String>,
    pub restart: Vec<String>,
    pub export: Vec<String>,
    pub quit: Vec<String>,
}

/// Gamepad button names per action (see `ui::gamepad::parse_button`).
#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub kick: Vec<String>,
    pub boost: Vec<String>,
    pub pause: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    start: TomlStart,
    #[serde(default)]
    controls: TomlControls,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_hz: u32,
    #[serde(default = "default_walk_speed")]
    walk_speed: f64,
    #[serde(default = "default_boost")]
    boost_multiplier: f64,
}

#[derive(Deserialize, Debug)]
struct TomlStart {
    #[serde(default = "default_start_x")]
    x: f64,
    #[serde(default = "default_start_y")]
    y: f64,
    #[serde(default = "default_start_z")]
    z: u8,
}

#[derive(Deserialize, Debug)]
struct TomlControls {
    #[serde(default = "default_up")]
    up: Vec<String>,
    #[serde(default = "default_down")]
    down: Vec<String>,
    #[serde(default = "default_left")]
    left: Vec<String>,
    #[serde(default = "default_right")]
    right: Vec<String>,
    #[serde(default = "default_kick")]
    kick: Vec<String>,
    #[serde(default = "default_boost_keys")]
    boost: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_export")]
    export: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_kick")]
    kick: Vec<String>,
    #[serde(default = "default_pad_boost")]
    boost: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_floor_image")]
    floor_image: String,
    #[serde(default = "default_tileset_image")]
    tileset_image: String,
    #[serde(default = "default_export_image")]
    export_image: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u32 { 60 }
fn default_walk_speed() -> f64 { SPEED }
fn default_boost() -> f64 { 8.0 }

fn default_start_x() -> f64 { START_X }
fn default_start_y() -> f64 { START_Y }
fn default_start_z() -> u8 { START_Z }

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_up() -> Vec<String> { names(&["Up", "w"]) }
fn default_down() -> Vec<String> { names(&["Down", "s"]) }
fn default_left() -> Vec<String> { names(&["Left", "a"]) }
fn default_right() -> Vec<String> { names(&["Right", "d"]) }
fn default_kick() -> Vec<String> { names(&["Space", "z", "k"]) }
fn default_boost_keys() -> Vec<String> { names(&["b", "Tab"]) }
fn default_pause() -> Vec<String> { names(&["Esc", "p"]) }
fn default_restart() -> Vec<String> { names(&["r"]) }
fn default_export() -> Vec<String> { names(&["x"]) }
fn default_quit() -> Vec<String> { names(&["q"]) }

fn default_pad_kick() -> Vec<String> { names(&["A", "B"]) }
fn default_pad_boost() -> Vec<String> { names(&["R1", "R2"]) }
fn default_pad_pause() -> Vec<String> { names(&["Start"]) }
fn default_pad_restart() -> Vec<String> { names(&["Select"]) }
fn default_pad_quit() -> Vec<String> { vec![] }

fn default_floor_image() -> String { "images/floor.png".into() }
fn default_tileset_image() -> String { "images/tiles.png".into() }
fn default_export_image() -> String { "images/export.png".into() }
fn default_log_file() -> String { "bootkick.log".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_hz: default_tick_rate(),
            walk_speed: default_walk_speed(),
            boost_multiplier: default_boost(),
        }
    }
}

impl Default for TomlStart {
    fn default() -> Self {
        TomlStart { x: default_start_x(), y: default_start_y(), z: default_start_z() }
    }
}

impl Default for TomlControls {
    fn default() -> Self {
        TomlControls {
            up: default_up(),
            down: default_down(),
            left: default_left(),
            right: default_right(),
            kick: default_kick(),
            boost: default_boost_keys(),
            pause: default_pause(),
            restart: default_restart(),
            export: default_export(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            kick: default_pad_kick(),
            boost: default_pad_boost(),
            pause: default_pad_pause(),
            restart: default_pad_restart(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            floor_image: default_floor_image(),
            tileset_image: default_tileset_image(),
            export_image: default_export_image(),
            log_file: default_log_file(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        Self::from_toml(toml_cfg, &search_dirs, warnings)
    }

    /// Build from TOML text with paths resolved against `base`.
    #[cfg(test)]
    pub fn from_toml_str(text: &str, base: &Path) -> Self {
        let mut warnings = Vec::new();
        let toml_cfg = parse_toml(text, "config.toml", &mut warnings);
        Self::from_toml(toml_cfg, &[base.to_path_buf()], warnings)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let mut speed = SpeedConfig {
            tick_rate_hz: cfg.speed.tick_rate_hz,
            walk_speed: cfg.speed.walk_speed,
            boost_multiplier: cfg.speed.boost_multiplier,
        };
        if speed.tick_rate_hz == 0 {
            warnings.push("speed.tick_rate_hz must be positive; using default".into());
            speed.tick_rate_hz = default_tick_rate();
        }
        // clipping scans only the leading edge, so a step must point the way
        // the keys do and stay under a tile
        let max_step = speed.walk_speed * speed.boost_multiplier;
        let in_range = speed.walk_speed.is_finite()
            && speed.walk_speed > 0.0
            && speed.boost_multiplier >= 1.0
            && max_step < crate::domain::tile::TILE_SIZE;
        if !in_range {
            warnings.push(format!("speed {max_step} per tick is out of range; using defaults"));
            speed.walk_speed = default_walk_speed();
            speed.boost_multiplier = default_boost();
        }

        let mut start = StartConfig { x: cfg.start.x, y: cfg.start.y, z: cfg.start.z };
        if start.z >= crate::domain::tile::VOID_HEIGHT {
            warnings.push(format!("start.z {} is the void level; using {START_Z}", start.z));
            start.z = START_Z;
        }

        GameConfig {
            speed,
            start,
            controls: ControlsConfig {
                up: cfg.controls.up,
                down: cfg.controls.down,
                left: cfg.controls.left,
                right: cfg.controls.right,
                kick: cfg.controls.kick,
                boost: cfg.controls.boost,
                pause: cfg.controls.pause,
                restart: cfg.controls.restart,
                export: cfg.controls.export,
                quit: cfg.controls.quit,
            },
            gamepad: GamepadConfig {
                kick: cfg.gamepad.kick,
                boost: cfg.gamepad.boost,
                pause: cfg.gamepad.pause,
                restart: cfg.gamepad.restart,
                quit: cfg.gamepad.quit,
            },
            floor_image: resolve_input(&cfg.general.floor_image, search_dirs),
            tileset_image: resolve_input(&cfg.general.tileset_image, search_dirs),
            export_image: resolve_output(&cfg.general.export_image, search_dirs),
            log_file: resolve_output(&cfg.general.log_file, search_dirs),
            warnings,
        }
    }
}

/// An existing file under one of the search dirs, else the path as given.
fn resolve_input(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() { return path; }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Outputs go next to the first search dir that holds the parent folder.
fn resolve_output(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() { return path; }
    let parent = path.parent().unwrap_or(Path::new(""));
    search_dirs.iter()
        .find(|d| d.join(parent).is_dir())
        .map(|d| d.join(name))
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => return parse_toml(&text, &path.display().to_string(), warnings),
            Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, origin: &str, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{origin} parse error, using default settings: {e}"));
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let c = GameConfig::from_toml_str("", Path::new("."));
        assert_eq!(c.speed, SpeedConfig::default());
        assert_eq!(c.start, StartConfig::default());
        assert_eq!(c.controls.kick, default_kick());
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let c = GameConfig::from_toml_str("[speed]\nboost_multiplier = 4.0\n[start]\nz = 2\n", Path::new("."));
        assert_eq!(c.speed.boost_multiplier, 4.0);
        assert_eq!(c.speed.walk_speed, SPEED);
        assert_eq!(c.start.z, 2);
        assert_eq!(c.start.x, START_X);
    }

    #[test]
    fn parse_error_falls_back_with_warning() {
        let c = GameConfig::from_toml_str("[speed\n", Path::new("."));
        assert_eq!(c.speed, SpeedConfig::default());
        assert_eq!(c.warnings.len(), 1);
    }

    #[test]
    fn oversized_step_is_rejected() {
        let c = GameConfig::from_toml_str("[speed]\nwalk_speed = 1.0\nboost_multiplier = 10.0\n", Path::new("."));
        assert_eq!(c.speed.walk_speed, SPEED);
        assert_eq!(c.speed.boost_multiplier, 8.0);
        assert_eq!(c.warnings.len(), 1);
    }

    #[test]
    fn boost_below_one_is_rejected() {
        for text in [
            "[speed]\nboost_multiplier = -1.0\n",
            "[speed]\nboost_multiplier = 0.0\n",
            "[speed]\nboost_multiplier = 0.5\n",
            "[speed]\nboost_multiplier = nan\n",
            "[speed]\nwalk_speed = inf\n",
        ] {
            let c = GameConfig::from_toml_str(text, Path::new("."));
            assert_eq!(c.speed, SpeedConfig::default(), "{text}");
            assert_eq!(c.warnings.len(), 1, "{text}");
        }
        let c = GameConfig::from_toml_str("[speed]\nboost_multiplier = 1.0\n", Path::new("."));
        assert_eq!(c.speed.boost_multiplier, 1.0);
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn void_start_level_is_rejected() {
        let c = GameConfig::from_toml_str("[start]\nz = 15\n", Path::new("."));
        assert_eq!(c.start.z, START_Z);
        assert_eq!(c.warnings.len(), 1);
    }
}
