/// Movement resolver: displacement, facing, and wall clipping.
///
/// ## Model
///
/// The actor is an axis-aligned box around `(x, y)` standing on level `z`.
/// A position is legal when every cell under the box has height `z`.
/// Each tick the resolver moves the box by the latched displacement, then
/// inspects only the cells on the leading edges and pushes the box back
/// out of any wall it entered.
///
/// ## Leading edges
///
///   horiz = -1 → leading column is the low column, else the high column
///   vert  = -1 → leading row is the low row, else the high row
///
/// The leading column is scanned over every row except the leading row,
/// and the leading row over every column except the leading column.
/// The shared corner is looked at last and only when both scans passed.
///
/// ## Corner truth table
/// ┌──────────────────────────────┬──────────────┐
/// │ Condition                     │ Wall on      │
/// ├──────────────────────────────┼──────────────┤
/// │ corner height == z            │ none         │
/// │ horiz == 0                    │ y            │
/// │ vert == 0                     │ x            │
/// │ x penetration < y penetration │ x            │
/// │ otherwise (ties included)     │ y            │
/// └──────────────────────────────┴──────────────┘
///
/// Clipping assumes the previous position was legal and the step is smaller
/// than one tile, so the box enters at most one new row and one new column.

use super::entity::{
    tile_of, Actor, DirectionLatch, Facing, FrameInput, BOX_BOTTOM, BOX_LEFT, BOX_RIGHT, BOX_TOP,
};
use super::map::HeightTileMap;
use super::tile::TILE_SIZE;

/// Sub-tile units per tick at normal speed.
pub const SPEED: f64 = 0.625;
/// Per-axis factor on diagonals so the step length stays `SPEED`.
pub const HALF_SQRT2: f64 = std::f64::consts::SQRT_2 / 2.0;
/// Gap left between a clamped box edge and the wall it hit.
pub const SMALL_DISTANCE: f64 = 1.0 / 65536.0;

/// Which axes were clamped this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct WallHit {
    pub x: bool,
    pub y: bool,
}

impl WallHit {
    pub fn any(self) -> bool {
        self.x || self.y
    }
}

/// Per-tick displacement for the latched keys at step length `speed`.
pub fn displacement(keys: &DirectionLatch, speed: f64) -> (f64, f64) {
    let per_axis = if keys.horiz != 0 && keys.vert != 0 { speed * HALF_SQRT2 } else { speed };
    (keys.horiz as f64 * per_axis, keys.vert as f64 * per_axis)
}

/// Facing implied by the latched keys, or None when nothing is held.
///
/// On a diagonal the axis pressed most recently wins.
pub fn facing_for(keys: &DirectionLatch) -> Option<Facing> {
    let both = keys.horiz != 0 && keys.vert != 0;
    if keys.vert != 0 && (!both || keys.vert_last) {
        return Some(if keys.vert < 0 { Facing::North } else { Facing::South });
    }
    if keys.horiz != 0 {
        return Some(if keys.horiz < 0 { Facing::West } else { Facing::East });
    }
    None
}

/// Walk the actor one tick. Only meaningful while the kick state is idle.
pub fn resolve_movement(map: &HeightTileMap, actor: &mut Actor, input: &FrameInput, speed: f64) -> WallHit {
    let keys = input.keys;
    if !keys.any() { return WallHit::default(); }

    if let Some(facing) = facing_for(&keys) {
        actor.facing = facing;
    }
    let (dx, dy) = displacement(&keys, speed);
    actor.x += dx;
    actor.y += dy;
    clip(map, actor, keys.horiz, keys.vert)
}

/// Push the actor out of any wall entered while moving along `(horiz, vert)`.
pub fn clip(map: &HeightTileMap, actor: &mut Actor, horiz: i8, vert: i8) -> WallHit {
    if horiz == 0 && vert == 0 { return WallHit::default(); }

    let s = actor.span();
    let z = actor.z as i32;

    let (lead_col, first_col, last_col) =
        if horiz == -1 { (s.low_col, s.low_col + 1, s.high_col) } else { (s.high_col, s.low_col, s.high_col - 1) };
    let (lead_row, first_row, last_row) =
        if vert == -1 { (s.low_row, s.low_row + 1, s.high_row) } else { (s.high_row, s.low_row, s.high_row - 1) };

    let mut hit = WallHit {
        x: horiz != 0 && (first_row..=last_row).any(|r| map.level_at(r, lead_col) != z),
        y: vert != 0 && (first_col..=last_col).any(|c| map.level_at(lead_row, c) != z),
    };

    if !hit.any() && map.level_at(lead_row, lead_col) != z {
        if horiz == 0 {
            hit.y = true;
        } else if vert == 0 {
            hit.x = true;
        } else if x_penetration(actor, horiz, s.low_col, s.high_col) < y_penetration(actor, vert, s.low_row, s.high_row) {
            hit.x = true;
        } else {
            hit.y = true;
        }
    }

    if hit.x {
        actor.x = if horiz == -1 {
            (s.low_col + 1) as f64 * TILE_SIZE + SMALL_DISTANCE - BOX_LEFT
        } else {
            s.high_col as f64 * TILE_SIZE - SMALL_DISTANCE - BOX_RIGHT
        };
    }
    if hit.y {
        actor.y = if vert == -1 {
            (s.low_row + 1) as f64 * TILE_SIZE + SMALL_DISTANCE - BOX_TOP
        } else {
            s.high_row as f64 * TILE_SIZE - SMALL_DISTANCE - BOX_BOTTOM
        };
    }
    hit
}

/// How far the box's leading x edge reaches into the leading column.
fn x_penetration(actor: &Actor, horiz: i8, low_col: i32, high_col: i32) -> f64 {
    if horiz == -1 {
        (low_col + 1) as f64 * TILE_SIZE - actor.x - BOX_LEFT
    } else {
        actor.x + BOX_RIGHT - high_col as f64 * TILE_SIZE
    }
}

fn y_penetration(actor: &Actor, vert: i8, low_row: i32, high_row: i32) -> f64 {
    if vert == -1 {
        (low_row + 1) as f64 * TILE_SIZE - actor.y - BOX_TOP
    } else {
        actor.y + BOX_BOTTOM - high_row as f64 * TILE_SIZE
    }
}

/// Does every cell under the box sit at the actor's level?
pub fn footprint_is_level(map: &HeightTileMap, actor: &Actor) -> bool {
    let s = actor.span();
    let z = actor.z as i32;
    (s.low_row..=s.high_row).all(|r| (s.low_col..=s.high_col).all(|c| map.level_at(r, c) == z))
}

/// Tile column under the actor's center, for HUD and camera use.
pub fn center_tile(actor: &Actor) -> (i32, i32) {
    (tile_of(actor.y + (BOX_TOP + BOX_BOTTOM) / 2.0), tile_of(actor.x))
}
