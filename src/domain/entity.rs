/// The actor, its kick state machine states, and per-tick input.
/// State machines are minimal: the kick is Idle → Windup → Active/Recoil → Idle.

use super::curve::MotionCurve;
use super::tile::TILE_SIZE;

// ── Bounding box (relative to actor center, sub-tile units) ──

pub const BOX_LEFT: f64 = -5.5;
pub const BOX_RIGHT: f64 = 5.5;
pub const BOX_TOP: f64 = 4.5;
pub const BOX_BOTTOM: f64 = 9.5;

pub const START_X: f64 = 179.5;
pub const START_Y: f64 = 166.5;
pub const START_Z: u8 = 0;

/// Cardinal facing. Discriminants match the sprite-sheet rows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl Facing {
    /// Unit step in tile columns (East = +1, West = -1).
    pub fn dx(self) -> i32 {
        match self {
            Facing::East => 1,
            Facing::West => -1,
            _ => 0,
        }
    }
}

/// Which contextual action a classified kick performs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KickAction {
    /// Walk onto the boot at `(row, col)`; that cell is cleared on completion.
    GrabBoot { row: usize, col: usize },
    Climb,
    Fall,
}

/// Kick state machine.
///
///   Idle ──press──▶ Windup ──classify──▶ Active ──anim done──▶ Idle
///                          └─no match─▶ Recoil ──anim done──▶ Idle
///
/// Only `Idle` accepts movement input; the other states exempt the actor
/// from collision and latch (but do not apply) direction keys.
#[derive(Clone, Debug, PartialEq)]
pub enum KickState {
    Idle,
    /// Pre-kick animation playing; classification not yet run.
    Windup,
    /// Curve in progress.
    Active { action: KickAction, curve: MotionCurve },
    /// Classification matched nothing; the animation plays out with no effect.
    Recoil,
}

/// Read-only tag of the kick state for renderers and logs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KickTag {
    Idle,
    Windup,
    Active(KickAction),
    Recoil,
}

impl KickState {
    pub fn tag(&self) -> KickTag {
        match self {
            KickState::Idle => KickTag::Idle,
            KickState::Windup => KickTag::Windup,
            KickState::Active { action, .. } => KickTag::Active(*action),
            KickState::Recoil => KickTag::Recoil,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, KickState::Idle)
    }
}

/// Inclusive tile span covered by a bounding box.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileSpan {
    pub low_col: i32,
    pub high_col: i32,
    pub low_row: i32,
    pub high_row: i32,
}

#[inline]
pub fn tile_of(v: f64) -> i32 {
    (v / TILE_SIZE).floor() as i32
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub x: f64,
    pub y: f64,
    pub z: u8,
    pub facing: Facing,
    pub kick: KickState,
    /// Switches permanently once the boot has been grabbed.
    pub has_boot: bool,
}

impl Actor {
    pub fn new(x: f64, y: f64, z: u8) -> Self {
        Actor {
            x, y, z,
            facing: Facing::South,
            kick: KickState::Idle,
            has_boot: false,
        }
    }

    /// Tiles under the bounding box.
    pub fn span(&self) -> TileSpan {
        TileSpan {
            low_col: tile_of(self.x + BOX_LEFT),
            high_col: tile_of(self.x + BOX_RIGHT),
            low_row: tile_of(self.y + BOX_TOP),
            high_row: tile_of(self.y + BOX_BOTTOM),
        }
    }
}

impl Default for Actor {
    fn default() -> Self {
        Actor::new(START_X, START_Y, START_Z)
    }
}

/// Movement direction (continuous while key held)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub const ALL: [MoveDir; 4] = [MoveDir::Left, MoveDir::Right, MoveDir::Up, MoveDir::Down];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Latched direction keys.
///
/// Each axis holds -1, 0 or +1. A press sets its axis (a later press on the
/// same axis overrides the earlier one); a release only clears the axis if it
/// still holds that direction. `vert_last` records whether the most recent
/// press was vertical, which decides facing on diagonals.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DirectionLatch {
    pub horiz: i8,
    pub vert: i8,
    pub vert_last: bool,
}

impl DirectionLatch {
    pub fn new() -> Self {
        DirectionLatch { horiz: 0, vert: 0, vert_last: true }
    }

    pub fn press(&mut self, dir: MoveDir) {
        match dir {
            MoveDir::Up => { self.vert = -1; self.vert_last = true; }
            MoveDir::Down => { self.vert = 1; self.vert_last = true; }
            MoveDir::Left => { self.horiz = -1; self.vert_last = false; }
            MoveDir::Right => { self.horiz = 1; self.vert_last = false; }
        }
    }

    pub fn release(&mut self, dir: MoveDir) {
        match dir {
            MoveDir::Up => if self.vert == -1 { self.vert = 0; },
            MoveDir::Down => if self.vert == 1 { self.vert = 0; },
            MoveDir::Left => if self.horiz == -1 { self.horiz = 0; },
            MoveDir::Right => if self.horiz == 1 { self.horiz = 0; },
        }
    }

    /// Drop every held direction (used on pause).
    pub fn clear(&mut self) {
        self.horiz = 0;
        self.vert = 0;
    }

    pub fn any(&self) -> bool {
        self.horiz != 0 || self.vert != 0
    }
}

impl Default for DirectionLatch {
    fn default() -> Self {
        DirectionLatch::new()
    }
}

/// Frame input: latched directions are continuous, kick is edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub keys: DirectionLatch,
    pub kick: bool,
    pub boost: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_release_only_clears_matching_direction() {
        let mut k = DirectionLatch::new();
        k.press(MoveDir::Left);
        k.press(MoveDir::Right); // overrides left
        assert_eq!(k.horiz, 1);
        k.release(MoveDir::Left); // stale release
        assert_eq!(k.horiz, 1);
        k.release(MoveDir::Right);
        assert_eq!(k.horiz, 0);
    }

    #[test]
    fn latch_tracks_last_pressed_axis() {
        let mut k = DirectionLatch::new();
        assert!(k.vert_last);
        k.press(MoveDir::Up);
        k.press(MoveDir::Right);
        assert!(!k.vert_last);
        k.press(MoveDir::Down);
        assert!(k.vert_last);
        assert_eq!((k.horiz, k.vert), (1, 1));
        k.clear();
        assert!(!k.any());
    }

    #[test]
    fn span_covers_bounding_box() {
        // box x: 3.5..14.5, y: 12.0..17.0
        let a = Actor::new(9.0, 7.5, 0);
        let s = a.span();
        assert_eq!((s.low_col, s.high_col), (0, 2));
        assert_eq!((s.low_row, s.high_row), (2, 2));
    }

    #[test]
    fn span_floors_negative_coordinates() {
        let a = Actor::new(2.0, -6.0, 0);
        let s = a.span();
        assert_eq!(s.low_col, -1);
        assert_eq!(s.low_row, -1);
    }

    #[test]
    fn kick_tag_reflects_state() {
        let mut a = Actor::default();
        assert_eq!(a.kick.tag(), KickTag::Idle);
        a.kick = KickState::Windup;
        assert_eq!(a.kick.tag(), KickTag::Windup);
        assert!(!a.kick.is_idle());
    }
}
