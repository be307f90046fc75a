/// WorldState: the complete snapshot of a running session.
///
/// ## Map layers
///
///   - `base_map` is the floor as loaded. Never mutated after load.
///   - `map` is the live floor; only a completed boot grab changes it.
///
/// `restart` copies a fresh map into both layers and puts the actor back on
/// its start pose, so a session can be replayed from scratch.
///
/// ## Camera / Viewport
///
/// World coordinates and screen coordinates are separate:
///   - `camera` is a viewport into the map in whole cells
///   - Renderer maps: `screen(sx, sy) = map(camera.x + sx, camera.y + sy)`
///   - Camera follows the actor's center cell with a dead zone
///   - Maps smaller than the viewport are centered

use tracing::info;

use crate::config::{SpeedConfig, StartConfig};
use crate::domain::anim::AnimationClock;
use crate::domain::entity::Actor;
use crate::domain::map::HeightTileMap;
use crate::domain::physics;

/// Camera: a viewport into the map.
///
/// `(x, y)` is the map column/row of the top-left visible cell.
/// `(view_w, view_h)` is how many cells fit in the viewport.
/// These are set from the terminal size during `render()`.
#[derive(Clone, Debug, Default)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    /// Scroll only when the target leaves the inner part of the viewport.
    pub fn follow(&mut self, target_col: i32, target_row: i32, map_w: usize, map_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = follow_axis(self.x, self.view_w, map_w, target_col);
        self.y = follow_axis(self.y, self.view_h, map_h, target_row);
    }

    /// Snap so the target sits mid-viewport. Used on load and restart.
    pub fn center_on(&mut self, target_col: i32, target_row: i32, map_w: usize, map_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = center_axis(self.view_w, map_w, target_col);
        self.y = center_axis(self.view_h, map_h, target_row);
    }

    /// Map cell to viewport cell, or None if off screen.
    pub fn world_to_view(&self, col: i32, row: i32) -> Option<(usize, usize)> {
        let vx = col - self.x;
        let vy = row - self.y;
        if vx >= 0 && vx < self.view_w as i32 && vy >= 0 && vy < self.view_h as i32 {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }
}

fn clamp_origin(origin: i32, view: usize, extent: usize) -> i32 {
    origin.max(0).min((extent as i32 - view as i32).max(0))
}

fn follow_axis(origin: i32, view: usize, extent: usize, target: i32) -> i32 {
    if extent <= view { return -((view as i32 - extent as i32) / 2); }
    // 20% margin each side
    let margin = view as i32 / 5;
    let low = origin + margin;
    let high = origin + view as i32 - margin - 1;
    let origin = if target < low {
        target - margin
    } else if target > high {
        target - view as i32 + margin + 1
    } else {
        origin
    };
    clamp_origin(origin, view, extent)
}

fn center_axis(view: usize, extent: usize, target: i32) -> i32 {
    if extent <= view { return -((view as i32 - extent as i32) / 2); }
    clamp_origin(target - view as i32 / 2, view, extent)
}

pub struct WorldState {
    // ── Map layers ──
    pub base_map: HeightTileMap,
    pub map: HeightTileMap,

    // ── Actor ──
    pub actor: Actor,
    pub clock: AnimationClock,
    pub start: StartConfig,

    // ── Speed config ──
    pub speed: SpeedConfig,

    // ── Meta ──
    pub tick: u64,
    pub paused: bool,
    /// Movement was clamped on the previous tick.
    pub against_wall: bool,
    /// A tick has run since the last render.
    pub frame_pending: bool,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub camera: Camera,
    /// Snap the camera on the next render instead of following.
    pub recenter: bool,
}

impl WorldState {
    pub fn new(map: HeightTileMap, speed: SpeedConfig, start: StartConfig) -> Self {
        let actor = Actor::new(start.x, start.y, start.z);
        if !physics::footprint_is_level(&map, &actor) {
            tracing::warn!(x = start.x, y = start.y, z = start.z, "start pose does not stand on level ground");
        }
        WorldState {
            base_map: map.clone(),
            map,
            actor,
            clock: AnimationClock::new(false),
            start,
            speed,
            tick: 0,
            paused: false,
            against_wall: false,
            frame_pending: true,
            message: String::new(),
            message_timer: 0,
            camera: Camera::new(),
            recenter: true,
        }
    }

    /// Fresh floor, actor back on the start pose, barefoot.
    pub fn restart(&mut self, map: HeightTileMap) {
        self.base_map = map.clone();
        self.map = map;
        self.actor = Actor::new(self.start.x, self.start.y, self.start.z);
        self.clock = AnimationClock::new(false);
        self.against_wall = false;
        self.frame_pending = true;
        self.recenter = true;
        info!(width = self.map.width(), height = self.map.height(), "world restarted");
    }

    /// Restart from the floor as it was first loaded.
    pub fn restart_from_base(&mut self) {
        let map = self.base_map.clone();
        self.restart(map);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.frame_pending = true;
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
        self.frame_pending = true;
    }

    /// Map cell under the actor's center as (col, row), for the camera.
    pub fn focus(&self) -> (i32, i32) {
        let (row, col) = physics::center_tile(&self.actor);
        (col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::map_from;
    use crate::domain::tile::Cell;

    #[test]
    fn small_map_is_centered() {
        let mut c = Camera { view_w: 10, view_h: 10, ..Camera::new() };
        c.follow(2, 2, 4, 6);
        assert_eq!((c.x, c.y), (-3, -2));
    }

    #[test]
    fn camera_scrolls_only_past_the_margin() {
        let mut c = Camera { view_w: 10, view_h: 10, ..Camera::new() };
        c.center_on(5, 5, 100, 100);
        assert_eq!(c.x, 0);
        c.follow(7, 5, 100, 100);
        assert_eq!(c.x, 0);
        c.follow(8, 5, 100, 100);
        assert_eq!(c.x, 1);
        c.follow(99, 5, 100, 100);
        assert_eq!(c.x, 90);
        assert_eq!(c.world_to_view(99, 5), Some((9, 5)));
        assert_eq!(c.world_to_view(0, 5), None);
    }

    #[test]
    fn restart_restores_floor_and_pose() {
        let m = map_from(&["000", "00B"]);
        let start = StartConfig { x: 9.0, y: -4.0, z: 0 };
        let mut w = WorldState::new(m, SpeedConfig::default(), start);
        w.map.set_cell(1, 2, Cell::CLEARED);
        w.actor.x = 3.0;
        w.actor.has_boot = true;
        w.restart_from_base();
        assert_eq!(w.map.find_boot(), Some((1, 2)));
        assert_eq!((w.actor.x, w.actor.y, w.actor.z), (9.0, -4.0, 0));
        assert!(!w.actor.has_boot);
        assert_eq!(w.clock, AnimationClock::new(false));
    }
}
