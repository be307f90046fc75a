/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` config section.
/// Default mapping:
///   D-pad / Left Stick    →  Walk
///   A / B                 →  Kick
///   R1 / R2               →  Boost (held)
///   Start                 →  Pause
///   Select                →  Restart
///
/// Directions report held state and fresh presses separately so the caller
/// can feed a `DirectionLatch` the same way as the keyboard.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
use tracing::warn;

use crate::config::GamepadConfig;
use crate::domain::entity::MoveDir;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BUTTON_COUNT: usize = 10;

/// Config name to button. Accepts face letters, compass names and
/// shoulder aliases, case-insensitive.
pub fn parse_button(name: &str) -> Option<Btn> {
    match name.to_uppercase().as_str() {
        "A" | "SOUTH" => Some(Btn::A),
        "B" | "EAST" => Some(Btn::B),
        "X" | "WEST" => Some(Btn::X),
        "Y" | "NORTH" => Some(Btn::Y),
        "L1" | "LB" => Some(Btn::L1),
        "R1" | "RB" => Some(Btn::R1),
        "L2" | "LT" => Some(Btn::L2),
        "R2" | "RT" => Some(Btn::R2),
        "START" => Some(Btn::Start),
        "SELECT" | "BACK" => Some(Btn::Select),
        _ => None,
    }
}

#[cfg(feature = "gamepad")]
fn from_gilrs(btn: Button) -> Option<Btn> {
    match btn {
        Button::South => Some(Btn::A),
        Button::East => Some(Btn::B),
        Button::West => Some(Btn::X),
        Button::North => Some(Btn::Y),
        Button::LeftTrigger => Some(Btn::L1),
        Button::RightTrigger => Some(Btn::R1),
        Button::LeftTrigger2 => Some(Btn::L2),
        Button::RightTrigger2 => Some(Btn::R2),
        Button::Start => Some(Btn::Start),
        Button::Select => Some(Btn::Select),
        _ => None,
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set(&mut self, held: bool) {
        if held && !self.held { self.just_pressed = true; }
        self.held = held;
    }
}

/// Action-to-button mapping.
struct ActionMap {
    kick: Vec<Btn>,
    boost: Vec<Btn>,
    pause: Vec<Btn>,
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl ActionMap {
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(action: &str, names: &[String]) -> Vec<Btn> {
            names.iter()
                .filter_map(|s| {
                    let b = parse_button(s);
                    if b.is_none() { warn!(action, button = %s, "unknown gamepad button"); }
                    b
                })
                .collect()
        }
        ActionMap {
            kick: parse_list("kick", &cfg.kick),
            boost: parse_list("boost", &cfg.boost),
            pause: parse_list("pause", &cfg.pause),
            restart: parse_list("restart", &cfg.restart),
            quit: parse_list("quit", &cfg.quit),
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BUTTON_COUNT],
    /// Indexed by `MoveDir::index`.
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!(error = %e, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [BtnState::default(); BUTTON_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::from_config(cfg),
            connected,
        }
    }

    pub fn update(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // stick y is positive up
        self.stick[MoveDir::Left.index()].set(self.stick_x < -STICK_DEADZONE);
        self.stick[MoveDir::Right.index()].set(self.stick_x > STICK_DEADZONE);
        self.stick[MoveDir::Up.index()].set(self.stick_y > STICK_DEADZONE);
        self.stick[MoveDir::Down.index()].set(self.stick_y < -STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, btn: Button, held: bool) {
        let dir = match btn {
            Button::DPadUp => Some(MoveDir::Up),
            Button::DPadDown => Some(MoveDir::Down),
            Button::DPadLeft => Some(MoveDir::Left),
            Button::DPadRight => Some(MoveDir::Right),
            _ => None,
        };
        if let Some(dir) = dir {
            self.dpad[dir.index()].set(held);
        } else if let Some(b) = from_gilrs(btn) {
            self.buttons[b as usize].set(held);
        }
    }

    #[cfg(feature = "gamepad")]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn kick_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.kick)
    }
    pub fn boost_held(&self) -> bool {
        self.action_map.boost.iter().any(|&b| self.buttons[b as usize].held)
    }
    pub fn pause_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.pause)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }
    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    // Directions (d-pad or stick)
    pub fn dir_held(&self, dir: MoveDir) -> bool {
        self.dpad[dir.index()].held || self.stick[dir.index()].held
    }
    pub fn dir_pressed(&self, dir: MoveDir) -> bool {
        self.dpad[dir.index()].just_pressed || self.stick[dir.index()].just_pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(parse_button("start"), Some(Btn::Start));
        assert_eq!(parse_button("rb"), Some(Btn::R1));
        assert_eq!(parse_button("South"), Some(Btn::A));
        assert_eq!(parse_button("Turbo"), None);
    }

    #[test]
    fn unknown_names_are_dropped_from_actions() {
        let cfg = GamepadConfig {
            kick: vec!["A".into(), "Bogus".into()],
            boost: vec![],
            pause: vec!["Start".into()],
            restart: vec![],
            quit: vec![],
        };
        let map = ActionMap::from_config(&cfg);
        assert_eq!(map.kick, vec![Btn::A]);
        assert_eq!(map.pause, vec![Btn::Start]);
    }
}
