/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Kick transition (press from idle; classification at the strike frame)
///   2. Motion: the active curve's delta, or walking + wall clipping when idle
///   3. Animation clock (reports when a kick returns to idle)
///
/// Classification and curves are pure (domain::rules / domain::curve); this
/// module only sequences them and commits their results.

use tracing::{debug, info};

use crate::domain::entity::{FrameInput, KickAction, KickState};
use crate::domain::physics;
use crate::domain::rules;
use crate::domain::tile::Cell;
use super::event::GameEvent;
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.paused { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.frame_pending = true;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    resolve_kick_press(world, input.kick, &mut events);
    resolve_strike(world, &mut events);
    resolve_motion(world, &input, &mut events);
    resolve_animation(world, &input, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Kick transitions
// ══════════════════════════════════════════════════════════════

/// A kick press only registers from idle.
fn resolve_kick_press(world: &mut WorldState, kick: bool, events: &mut Vec<GameEvent>) {
    if !kick || !world.actor.kick.is_idle() { return; }
    world.actor.kick = KickState::Windup;
    world.clock.start_kick(world.actor.has_boot);
    debug!(tick = world.tick, facing = ?world.actor.facing, "kick started");
    events.push(GameEvent::KickStarted);
}

/// Classify once, on the strike frame of the windup.
fn resolve_strike(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.actor.kick != KickState::Windup { return; }
    if !world.clock.at_strike(world.actor.has_boot) { return; }

    let Some(intent) = rules::classify(&world.map, &world.actor) else {
        world.actor.kick = KickState::Recoil;
        debug!(tick = world.tick, "kick matched nothing");
        events.push(GameEvent::KickWhiffed);
        return;
    };

    let plan = rules::plan(&intent, &world.actor);
    let from = world.actor.z;
    info!(tick = world.tick, ?intent, from, to = plan.z, frames = plan.curve.frames(), "kick classified");
    match plan.action {
        KickAction::GrabBoot { row, col } => events.push(GameEvent::GrabStarted { row, col }),
        KickAction::Climb => events.push(GameEvent::ClimbStarted { from, to: plan.z }),
        KickAction::Fall => events.push(GameEvent::FallStarted { from, to: plan.z }),
    }
    world.actor.z = plan.z;
    world.actor.kick = KickState::Active { action: plan.action, curve: plan.curve };
}

// ══════════════════════════════════════════════════════════════
// Motion
// ══════════════════════════════════════════════════════════════

fn resolve_motion(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    if let KickState::Active { curve, .. } = &mut world.actor.kick {
        if let Some((dx, dy)) = curve.next_delta() {
            world.actor.x += dx;
            world.actor.y += dy;
        }
        return;
    }
    // direction keys stay latched but are not applied mid-kick
    if !world.actor.kick.is_idle() { return; }

    let speed = if input.boost {
        world.speed.walk_speed * world.speed.boost_multiplier
    } else {
        world.speed.walk_speed
    };
    let hit = physics::resolve_movement(&world.map, &mut world.actor, input, speed);
    if hit.any() && !world.against_wall {
        events.push(GameEvent::WallBumped);
    }
    world.against_wall = hit.any();
}

// ══════════════════════════════════════════════════════════════
// Animation
// ══════════════════════════════════════════════════════════════

fn resolve_animation(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    let kicking = !world.actor.kick.is_idle();
    let moving = input.keys.any();
    if !world.clock.advance(moving, kicking, world.actor.has_boot) { return; }
    finish_kick(world, events);
}

fn finish_kick(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let state = std::mem::replace(&mut world.actor.kick, KickState::Idle);
    if let KickState::Active { action: KickAction::GrabBoot { row, col }, .. } = state {
        world.map.set_cell(row, col, Cell::CLEARED);
        world.actor.has_boot = true;
        world.clock.rest(true);
        info!(tick = world.tick, row, col, "boot grabbed");
        events.push(GameEvent::BootGrabbed { row, col });
    }
    world.against_wall = false;
    debug!(tick = world.tick, x = world.actor.x, y = world.actor.y, z = world.actor.z, "kick finished");
    events.push(GameEvent::KickFinished);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SpeedConfig, StartConfig};
    use crate::domain::anim::BOOTED_IDLE;
    use crate::domain::entity::{DirectionLatch, Facing, KickTag, MoveDir};
    use crate::domain::map::HeightTileMap;
    use crate::domain::physics::SMALL_DISTANCE;
    use crate::domain::test_support::map_from;
    use crate::domain::tile::TileId;

    const EPS: f64 = 1e-9;

    fn world_on(map: HeightTileMap, x: f64, y: f64, z: u8, facing: Facing, has_boot: bool) -> WorldState {
        let mut w = WorldState::new(map, SpeedConfig::default(), StartConfig { x, y, z });
        w.actor.facing = facing;
        w.actor.has_boot = has_boot;
        w.clock.rest(has_boot);
        w
    }

    fn kick() -> FrameInput {
        FrameInput { kick: true, ..Default::default() }
    }

    /// Press kick once, then tick with `hold` until the kick is over.
    fn run_kick(w: &mut WorldState, hold: FrameInput) -> (Vec<GameEvent>, u32) {
        let mut events = step(w, FrameInput { kick: true, ..hold });
        for n in 1..=200 {
            if w.actor.kick.is_idle() { return (events, n); }
            events.extend(step(w, hold));
        }
        panic!("kick never finished");
    }

    #[test]
    fn climb_lifts_two_levels_and_two_rows() {
        let m = map_from(&[
            "2222",
            "1111",
            "0000",
        ]);
        let y0 = 7.5 + SMALL_DISTANCE;
        let mut w = world_on(m, 9.0, y0, 0, Facing::North, true);
        let (events, ticks) = run_kick(&mut w, FrameInput::default());
        assert_eq!(ticks, 61);
        assert_eq!(w.actor.z, 2);
        assert_eq!(w.actor.x, 9.0);
        assert!((w.actor.y - (y0 - 12.0)).abs() < EPS, "y = {}", w.actor.y);
        assert_eq!(w.actor.facing, Facing::North);
        assert!(events.contains(&GameEvent::ClimbStarted { from: 0, to: 2 }));
        assert_eq!(events.last(), Some(&GameEvent::KickFinished));
        assert!(physics::footprint_is_level(&w.map, &w.actor));
    }

    #[test]
    fn climb_curve_runs_for_forty_ticks() {
        let m = map_from(&["2222", "1111", "0000"]);
        let mut w = world_on(m, 9.0, 7.5 + SMALL_DISTANCE, 0, Facing::North, true);
        step(&mut w, kick());
        let mut moving_ticks = 0;
        let mut last_y = w.actor.y;
        while !w.actor.kick.is_idle() {
            step(&mut w, FrameInput::default());
            if w.actor.y != last_y { moving_ticks += 1; }
            last_y = w.actor.y;
        }
        assert_eq!(moving_ticks, 40);
    }

    #[test]
    fn whiffed_kick_changes_nothing() {
        let m = map_from(&["0000", "0000", "0000", "0000"]);
        for has_boot in [false, true] {
            for facing in [Facing::North, Facing::South, Facing::East, Facing::West] {
                let mut w = world_on(m.clone(), 9.0, 7.5 + SMALL_DISTANCE, 0, facing, has_boot);
                let before = (w.actor.x, w.actor.y, w.actor.z, w.actor.facing);
                let (events, _) = run_kick(&mut w, FrameInput::default());
                assert_eq!((w.actor.x, w.actor.y, w.actor.z, w.actor.facing), before);
                assert_eq!(w.map, m);
                assert!(events.contains(&GameEvent::KickWhiffed));
                assert_eq!(w.clock.index(), if has_boot { BOOTED_IDLE } else { 0 });
            }
        }
    }

    #[test]
    fn grab_moves_onto_boot_then_clears_it() {
        let m = map_from(&[
            "0000",
            "0000",
            "000B",
            "0000",
        ]);
        let mut w = world_on(m, 9.0, 7.5 + SMALL_DISTANCE, 0, Facing::East, false);
        let (events, ticks) = run_kick(&mut w, FrameInput::default());
        assert_eq!(ticks, 21);
        assert!(events.contains(&GameEvent::GrabStarted { row: 2, col: 3 }));
        assert!(events.contains(&GameEvent::BootGrabbed { row: 2, col: 3 }));
        assert!(w.actor.has_boot);
        assert_eq!(w.map.tile_at(2, 3), Some(TileId::BLANK));
        assert_eq!(w.map.height_at(2, 3), 0);
        assert_eq!(w.map.find_boot(), None);
        assert!((w.actor.x - 21.5).abs() < EPS);
        assert!((w.actor.y + 8.0 - 15.5).abs() < EPS);
        assert_eq!(w.clock.index(), BOOTED_IDLE);

        // next tick at rest keeps the booted pose
        step(&mut w, FrameInput::default());
        assert_eq!(w.clock.index(), BOOTED_IDLE);
        assert_eq!(w.actor.kick.tag(), KickTag::Idle);
    }

    #[test]
    fn south_fall_drops_to_landing_level() {
        let m = map_from(&[
            "4444",
            "4444",
            "3333",
            "2222",
            "2222",
        ]);
        let mut w = world_on(m, 9.0, 2.0, 4, Facing::South, true);
        let (events, _) = run_kick(&mut w, FrameInput::default());
        assert!(events.contains(&GameEvent::FallStarted { from: 4, to: 2 }));
        assert_eq!(w.actor.z, 2);
        assert!((w.actor.y - 14.0).abs() < EPS);
    }

    #[test]
    fn direction_keys_are_latched_not_applied_mid_kick() {
        let m = map_from(&["0000", "0000", "0000", "0000"]);
        let mut w = world_on(m, 9.0, 7.5 + SMALL_DISTANCE, 0, Facing::South, false);
        let mut keys = DirectionLatch::new();
        keys.press(MoveDir::Left);
        let hold = FrameInput { keys, ..Default::default() };
        let x0 = w.actor.x;
        run_kick(&mut w, hold);
        assert_eq!(w.actor.x, x0);
        assert_eq!(w.actor.facing, Facing::South);

        // the held key applies as soon as the kick is over
        step(&mut w, hold);
        assert!(w.actor.x < x0);
        assert_eq!(w.actor.facing, Facing::West);
    }

    #[test]
    fn kick_press_mid_kick_is_ignored() {
        let m = map_from(&["0000", "0000", "0000"]);
        let mut w = world_on(m, 9.0, 7.5 + SMALL_DISTANCE, 0, Facing::North, false);
        let first = step(&mut w, kick());
        assert_eq!(first, vec![GameEvent::KickStarted]);
        for _ in 0..5 {
            assert!(!step(&mut w, kick()).contains(&GameEvent::KickStarted));
        }
    }

    #[test]
    fn wall_bump_fires_once_per_contact() {
        let m = map_from(&["0010", "0010"]);
        let mut w = world_on(m, 6.0, -4.0, 0, Facing::East, false);
        let mut keys = DirectionLatch::new();
        keys.press(MoveDir::Right);
        let push = FrameInput { keys, ..Default::default() };
        let bumps = (0..20)
            .flat_map(|_| step(&mut w, push))
            .filter(|e| *e == GameEvent::WallBumped)
            .count();
        assert_eq!(bumps, 1);
    }

    #[test]
    fn boost_multiplies_walk_speed() {
        let m = HeightTileMap::filled(40, 40, Cell::CLEARED);
        let mut w = world_on(m, 100.0, 100.0, 0, Facing::South, false);
        let mut keys = DirectionLatch::new();
        keys.press(MoveDir::Down);
        step(&mut w, FrameInput { keys, boost: true, ..Default::default() });
        assert_eq!(w.actor.y, 100.0 + 0.625 * 8.0);
    }

    #[test]
    fn paused_world_does_not_tick() {
        let m = map_from(&["000", "000"]);
        let mut w = world_on(m, 9.0, -4.0, 0, Facing::East, false);
        w.set_paused(true);
        let tick = w.tick;
        assert!(step(&mut w, kick()).is_empty());
        assert_eq!(w.tick, tick);
        assert!(w.actor.kick.is_idle());
    }
}
