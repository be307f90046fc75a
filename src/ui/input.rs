/// Input state tracker and action bindings.
///
/// `InputState` tracks which terminal keys are held:
///   - Continuous walking while a key is held
///   - Edge-triggered kick (only fires on initial press)
///   - Press order within a frame, so the last pressed axis wins diagonals
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// `Controls` merges keyboard and gamepad into one `FrameInput` per tick and
/// owns the `DirectionLatch`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::warn;

use crate::config::ControlsConfig;
use crate::domain::entity::{DirectionLatch, FrameInput, MoveDir};
use super::gamepad::GamepadState;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// `drain_events()`, in arrival order.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // unconfirmed releases: rely on the timeout instead
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.held_at(key.code, at);
                self.last_active.insert(key.code, at);
                if !was_held { self.fresh_presses.push(key.code); }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Keys newly pressed this frame, oldest first.
    pub fn fresh_presses(&self) -> &[KeyCode] {
        &self.fresh_presses
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    fn held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

// ══════════════════════════════════════════════════════════════
// Key names
// ══════════════════════════════════════════════════════════════

/// Config key name to crossterm key code.
/// Named keys are case-insensitive; a single character maps to itself.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    let code = match name.to_lowercase().as_str() {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "space" => KeyCode::Char(' '),
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "insert" => KeyCode::Insert,
        "delete" => KeyCode::Delete,
        other => {
            let n = other.strip_prefix('f')?.parse::<u8>().ok()?;
            if !(1..=12).contains(&n) { return None; }
            KeyCode::F(n)
        }
    };
    Some(code)
}

fn parse_keys(action: &str, names: &[String]) -> Vec<KeyCode> {
    names.iter()
        .filter_map(|n| {
            let code = parse_key(n);
            if code.is_none() { warn!(action, key = %n, "unknown key name"); }
            code
        })
        .collect()
}

pub struct KeyBindings {
    /// Indexed by `MoveDir::index`.
    pub dirs: [Vec<KeyCode>; 4],
    pub kick: Vec<KeyCode>,
    pub boost: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub restart: Vec<KeyCode>,
    pub export: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    pub fn from_config(cfg: &ControlsConfig) -> Self {
        let mut dirs: [Vec<KeyCode>; 4] = Default::default();
        dirs[MoveDir::Left.index()] = parse_keys("left", &cfg.left);
        dirs[MoveDir::Right.index()] = parse_keys("right", &cfg.right);
        dirs[MoveDir::Up.index()] = parse_keys("up", &cfg.up);
        dirs[MoveDir::Down.index()] = parse_keys("down", &cfg.down);
        KeyBindings {
            dirs,
            kick: parse_keys("kick", &cfg.kick),
            boost: parse_keys("boost", &cfg.boost),
            pause: parse_keys("pause", &cfg.pause),
            restart: parse_keys("restart", &cfg.restart),
            export: parse_keys("export", &cfg.export),
            quit: parse_keys("quit", &cfg.quit),
        }
    }

    fn dir_of(&self, code: KeyCode) -> Option<MoveDir> {
        MoveDir::ALL.into_iter().find(|d| self.dirs[d.index()].contains(&code))
    }
}

// ══════════════════════════════════════════════════════════════
// Controls: keyboard + gamepad → FrameInput
// ══════════════════════════════════════════════════════════════

/// Actions handled by the shell rather than the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MetaAction {
    Pause,
    Restart,
    Export,
    Quit,
}

/// One frame's worth of raw direction state from any device.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirSample {
    /// Presses this frame, in the order they happened.
    pub pressed: [Option<MoveDir>; 8],
    /// Held now, by `MoveDir::index`.
    pub held: [bool; 4],
}

pub struct Controls {
    pub bindings: KeyBindings,
    latch: DirectionLatch,
    /// Held state seen on the previous frame, for release edges.
    held: [bool; 4],
}

impl Controls {
    pub fn new(bindings: KeyBindings) -> Self {
        Controls { bindings, latch: DirectionLatch::new(), held: [false; 4] }
    }

    #[cfg(test)]
    pub fn latch(&self) -> DirectionLatch {
        self.latch
    }

    /// Forget held directions (pause). Keys still down must be pressed again.
    pub fn clear(&mut self) {
        self.latch.clear();
    }

    /// Feed presses and releases into the latch.
    pub fn apply(&mut self, sample: &DirSample) {
        for dir in sample.pressed.iter().flatten() {
            self.latch.press(*dir);
        }
        for dir in MoveDir::ALL {
            if self.held[dir.index()] && !sample.held[dir.index()] {
                self.latch.release(dir);
            }
        }
        self.held = sample.held;
    }

    /// Collect this frame's direction state from both devices.
    pub fn sample(&self, kb: &InputState, pad: &GamepadState) -> DirSample {
        let mut sample = DirSample::default();
        let mut n = 0;
        let mut push = |dir: MoveDir| {
            if n < sample.pressed.len() {
                sample.pressed[n] = Some(dir);
                n += 1;
            }
        };
        for &code in kb.fresh_presses() {
            if let Some(dir) = self.bindings.dir_of(code) { push(dir); }
        }
        for dir in MoveDir::ALL {
            if pad.dir_pressed(dir) { push(dir); }
        }
        for dir in MoveDir::ALL {
            sample.held[dir.index()] = kb.any_held(&self.bindings.dirs[dir.index()]) || pad.dir_held(dir);
        }
        sample
    }

    /// Build this tick's input and report any meta action.
    pub fn poll(&mut self, kb: &InputState, pad: &GamepadState) -> (FrameInput, Option<MetaAction>) {
        let sample = self.sample(kb, pad);
        self.apply(&sample);

        let b = &self.bindings;
        let meta = if kb.ctrl_c_pressed() || kb.any_pressed(&b.quit) || pad.quit_pressed() {
            Some(MetaAction::Quit)
        } else if kb.any_pressed(&b.pause) || pad.pause_pressed() {
            Some(MetaAction::Pause)
        } else if kb.any_pressed(&b.restart) || pad.restart_pressed() {
            Some(MetaAction::Restart)
        } else if kb.any_pressed(&b.export) {
            Some(MetaAction::Export)
        } else {
            None
        };

        let input = FrameInput {
            keys: self.latch,
            kick: kb.any_pressed(&b.kick) || pad.kick_pressed(),
            boost: kb.any_held(&b.boost) || pad.boost_held(),
        };
        (input, meta)
    }
}
