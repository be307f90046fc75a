/// Kick classification and planning.
///
/// Pure functions: `classify` reads the map and the actor and reports what a
/// kick would do; `plan` turns that answer into an action, a motion curve and
/// the level the actor ends on. Neither mutates anything.
///
/// ## Barefoot
/// Scan the cells just beyond the bounding box on the facing side.
/// The first boot found (row-major) is grabbed.
///
/// ## Booted: North
/// `r` = bottom row of the box.
/// ┌──────────────────────────────────────────────┬───────────────┐
/// │ Condition (priority order)                    │ Result        │
/// ├──────────────────────────────────────────────┼───────────────┤
/// │ row r-1 all z+1 AND row r-2 all z+2           │ Climb, z+2    │
/// │ row r-1 uniform at some h < z                 │ FallNorth, h  │
/// │ Otherwise                                     │ none          │
/// └──────────────────────────────────────────────┴───────────────┘
///
/// ## Booted: South
/// `r` = top row of the box. Rows r+1, r+2, … under the box columns:
/// ┌──────────────────────────────────────────────┬───────────────┐
/// │ Row condition                                 │ Result        │
/// ├──────────────────────────────────────────────┼───────────────┤
/// │ any cell ≥ z                                  │ stop, none    │
/// │ not uniform                                   │ stop, none    │
/// │ uniform at an even h                          │ FallSouth, h  │
/// │ uniform at an odd h (slope)                   │ next row      │
/// └──────────────────────────────────────────────┴───────────────┘
///
/// ## Booted: East / West
/// Columns shifted one box-width toward the facing side; `r` = bottom row.
/// Row r+k may land at h ≤ z-2k:
/// ┌──────────────────────────────────────────────┬───────────────┐
/// │ Row condition                                 │ Result        │
/// ├──────────────────────────────────────────────┼───────────────┤
/// │ a cell above z-2k, or equal to z              │ stop scanning │
/// │ a cell at an odd height                       │ skip row      │
/// │ uniform at an even h                          │ candidate     │
/// │ mixed even heights                            │ skip row      │
/// └──────────────────────────────────────────────┴───────────────┘
/// The deepest candidate before the scan stops wins.

use super::curve::{MotionCurve, GRAB_FRAMES};
use super::entity::{Actor, Facing, KickAction, TileSpan, BOX_TOP, tile_of};
use super::map::HeightTileMap;
use super::physics::SMALL_DISTANCE;
use super::tile::{is_ground_level, TILE_SIZE, VOID_HEIGHT};

/// Offset from the actor's y to the point that should land on a grabbed boot.
pub const BOOT_CENTER_Y_OFFSET: f64 = 8.0;
/// Offset from a cell's top-left corner to its center.
const CELL_CENTER: f64 = TILE_SIZE / 2.0 + 0.5;

/// What a kick would do from the actor's current pose.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum KickIntent {
    GrabBoot { row: usize, col: usize },
    Climb,
    FallNorth { height: u8 },
    FallSouth { height: u8, rows: u32 },
    /// `rows` is the landing row offset; `scale` the vertical drop in tiles.
    FallSide { height: u8, rows: u32, scale: f64 },
}

/// Everything needed to run a classified kick.
#[derive(Clone, Debug, PartialEq)]
pub struct KickPlan {
    pub action: KickAction,
    pub curve: MotionCurve,
    /// Level the actor stands on once the curve is committed.
    pub z: u8,
}

pub fn classify(map: &HeightTileMap, actor: &Actor) -> Option<KickIntent> {
    if actor.has_boot { classify_booted(map, actor) } else { find_boot(map, actor) }
}

/// Boot adjacent to the box on the facing side.
fn find_boot(map: &HeightTileMap, actor: &Actor) -> Option<KickIntent> {
    let s = actor.span();
    let (rows, cols) = match actor.facing {
        Facing::East => (s.low_row..=s.high_row, s.high_col + 1..=s.high_col + 1),
        Facing::West => (s.low_row..=s.high_row, s.low_col - 1..=s.low_col - 1),
        Facing::North => (s.low_row - 1..=s.low_row - 1, s.low_col..=s.high_col),
        Facing::South => (s.high_row + 1..=s.high_row + 1, s.low_col..=s.high_col),
    };
    for row in rows {
        for col in cols.clone() {
            // a boot is never void, so (row, col) is in bounds
            if map.cell_at(row, col).is_boot() {
                return Some(KickIntent::GrabBoot { row: row as usize, col: col as usize });
            }
        }
    }
    None
}

fn classify_booted(map: &HeightTileMap, actor: &Actor) -> Option<KickIntent> {
    let s = actor.span();
    let z = actor.z as i32;
    match actor.facing {
        Facing::North => classify_north(map, &s, z),
        Facing::South => classify_south(map, &s, z),
        Facing::East | Facing::West => classify_side(map, actor, &s, z),
    }
}

/// The common height of `row` across `cols`, if every cell agrees.
fn uniform_level(map: &HeightTileMap, row: i32, cols: std::ops::RangeInclusive<i32>) -> Option<i32> {
    let mut level = None;
    for col in cols {
        let h = map.level_at(row, col);
        match level {
            None => level = Some(h),
            Some(l) if l != h => return None,
            _ => {}
        }
    }
    level
}

fn classify_north(map: &HeightTileMap, s: &TileSpan, z: i32) -> Option<KickIntent> {
    let r = s.high_row;
    let cols = s.low_col..=s.high_col;
    let near = uniform_level(map, r - 1, cols.clone());
    // void (and the area past the edge) is never a ledge to climb onto
    let climbable = z + 2 < VOID_HEIGHT as i32;
    if climbable && near == Some(z + 1) && uniform_level(map, r - 2, cols) == Some(z + 2) {
        return Some(KickIntent::Climb);
    }
    match near {
        Some(h) if h < z => Some(KickIntent::FallNorth { height: h as u8 }),
        _ => None,
    }
}

fn classify_south(map: &HeightTileMap, s: &TileSpan, z: i32) -> Option<KickIntent> {
    let r = s.low_row;
    // void is the highest level, so the scan always stops at the map edge
    for rows in 1.. {
        let row = r + rows;
        let cols = s.low_col..=s.high_col;
        if cols.clone().any(|c| map.level_at(row, c) >= z) { return None; }
        let h = uniform_level(map, row, cols)?;
        if is_ground_level(h) {
            return Some(KickIntent::FallSouth { height: h as u8, rows: rows as u32 });
        }
    }
    None
}

fn classify_side(map: &HeightTileMap, actor: &Actor, s: &TileSpan, z: i32) -> Option<KickIntent> {
    let shift = (s.high_col - s.low_col + 1) * actor.facing.dx();
    let cols = s.low_col + shift..=s.high_col + shift;
    let r = s.high_row;

    let mut landing: Option<(i32, i32)> = None;
    for offset in 0.. {
        let reach = z - 2 * offset;
        let mut level: Option<i32> = None;
        let mut uniform = true;
        let mut slope = false;
        for col in cols.clone() {
            let h = map.level_at(r + offset, col);
            if h > reach || h == z {
                return landing.map(|(h, rows)| side_intent(actor, r, h, rows));
            }
            if !is_ground_level(h) {
                slope = true;
                break;
            }
            match level {
                None => level = Some(h),
                Some(l) if l != h => uniform = false,
                _ => {}
            }
        }
        if !slope && uniform {
            if let Some(h) = level { landing = Some((h, offset)); }
        }
    }
    None
}

fn side_intent(actor: &Actor, r: i32, height: i32, rows: i32) -> KickIntent {
    let top = actor.y + BOX_TOP;
    let scale = if tile_of(top) < r {
        rows as f64 + r as f64 - (top - SMALL_DISTANCE) / TILE_SIZE
    } else {
        rows as f64
    };
    KickIntent::FallSide { height: height as u8, rows: rows as u32, scale }
}

/// Turn a classified intent into the action to run.
pub fn plan(intent: &KickIntent, actor: &Actor) -> KickPlan {
    match *intent {
        KickIntent::GrabBoot { row, col } => {
            let tx = col as f64 * TILE_SIZE + CELL_CENTER;
            let ty = row as f64 * TILE_SIZE + CELL_CENTER;
            let frames = GRAB_FRAMES as f64;
            KickPlan {
                action: KickAction::GrabBoot { row, col },
                curve: MotionCurve::linear(
                    (tx - actor.x) / frames,
                    (ty - (actor.y + BOOT_CENTER_Y_OFFSET)) / frames,
                    GRAB_FRAMES,
                ),
                z: actor.z,
            }
        }
        KickIntent::Climb => KickPlan {
            action: KickAction::Climb,
            curve: MotionCurve::climb(),
            z: actor.z + 2,
        },
        KickIntent::FallNorth { height } => KickPlan {
            action: KickAction::Fall,
            curve: MotionCurve::fall_north(),
            z: height,
        },
        KickIntent::FallSouth { height, rows } => KickPlan {
            action: KickAction::Fall,
            curve: MotionCurve::fall_south(rows),
            z: height,
        },
        KickIntent::FallSide { height, rows, scale } => {
            debug_assert!(scale >= rows as f64, "side drop shorter than its landing row");
            KickPlan {
                action: KickAction::Fall,
                curve: MotionCurve::fall_side(actor.facing, scale),
                z: height,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::map_from;

    fn booted(x: f64, y: f64, z: u8, facing: Facing) -> Actor {
        let mut a = Actor::new(x, y, z);
        a.facing = facing;
        a.has_boot = true;
        a
    }

    fn barefoot(x: f64, y: f64, facing: Facing) -> Actor {
        let mut a = Actor::new(x, y, 0);
        a.facing = facing;
        a
    }

    // box x 3.5..14.5 (cols 0..2), y 12.0..17.0 (row 2)
    const X: f64 = 9.0;
    const Y: f64 = 7.5 + SMALL_DISTANCE;

    // ── Grab ──

    #[test]
    fn grabs_boot_on_facing_side() {
        let m = map_from(&[
            "0000",
            "0000",
            "000B",
            "0000",
        ]);
        assert_eq!(classify(&m, &barefoot(X, Y, Facing::East)), Some(KickIntent::GrabBoot { row: 2, col: 3 }));
        assert_eq!(classify(&m, &barefoot(X, Y, Facing::West)), None);
        assert_eq!(classify(&m, &barefoot(X, Y, Facing::North)), None);
    }

    #[test]
    fn grabs_boot_north_within_columns() {
        let m = map_from(&[
            "0000",
            "00B0",
            "0000",
        ]);
        assert_eq!(classify(&m, &barefoot(X, Y, Facing::North)), Some(KickIntent::GrabBoot { row: 1, col: 2 }));
        assert_eq!(classify(&m, &barefoot(X, Y, Facing::South)), None);
    }

    #[test]
    fn booted_actor_ignores_boots() {
        let m = map_from(&[
            "0000",
            "0000",
            "000B",
        ]);
        assert_eq!(classify(&m, &booted(X, Y, 0, Facing::East)), None);
    }

    #[test]
    fn grab_plan_lands_on_cell_center() {
        let m = map_from(&["0000", "0000", "000B"]);
        let a = barefoot(X, Y, Facing::East);
        let p = plan(&classify(&m, &a).unwrap(), &a);
        assert_eq!(p.action, KickAction::GrabBoot { row: 2, col: 3 });
        assert_eq!(p.z, 0);
        assert_eq!(p.curve.frames(), GRAB_FRAMES);
        let (dx, dy) = p.curve.total();
        assert!((a.x + dx - 21.5).abs() < 1e-9);
        assert!((a.y + dy + BOOT_CENTER_Y_OFFSET - 15.5).abs() < 1e-9);
    }

    // ── North ──

    #[test]
    fn climbs_two_stepped_rows() {
        let m = map_from(&[
            "2222",
            "1111",
            "0000",
        ]);
        let a = booted(X, Y, 0, Facing::North);
        assert_eq!(classify(&m, &a), Some(KickIntent::Climb));
        let p = plan(&KickIntent::Climb, &a);
        assert_eq!((p.action, p.z), (KickAction::Climb, 2));
    }

    #[test]
    fn climb_needs_every_column() {
        let m = map_from(&[
            "2222",
            "1121",
            "0000",
        ]);
        assert_eq!(classify(&m, &booted(X, Y, 0, Facing::North)), None);
        let m = map_from(&[
            "2232",
            "1111",
            "0000",
        ]);
        assert_eq!(classify(&m, &booted(X, Y, 0, Facing::North)), None);
    }

    #[test]
    fn falls_north_onto_uniform_lower_row() {
        let m = map_from(&[
            "4444",
            "0000",
            "2222",
        ]);
        let a = booted(X, Y, 2, Facing::North);
        assert_eq!(classify(&m, &a), Some(KickIntent::FallNorth { height: 0 }));
        assert_eq!(plan(&KickIntent::FallNorth { height: 0 }, &a).z, 0);
    }

    #[test]
    fn north_fall_rejects_uneven_row() {
        let m = map_from(&[
            "4444",
            "0100",
            "2222",
        ]);
        assert_eq!(classify(&m, &booted(X, Y, 2, Facing::North)), None);
        let m = map_from(&[
            "4444",
            "0020",
            "2222",
        ]);
        assert_eq!(classify(&m, &booted(X, Y, 2, Facing::North)), None);
    }

    #[test]
    fn never_climbs_onto_void() {
        // box y 6.0..11.0 → row 1; the row above the ledge is off the map
        let m = map_from(&["eeee", "dddd"]);
        assert_eq!(classify(&m, &booted(X, Y - 6.0, 13, Facing::North)), None);
        let m = map_from(&[
            "####",
            "eeee",
            "dddd",
        ]);
        assert_eq!(classify(&m, &booted(X, Y, 13, Facing::North)), None);
        let m = map_from(&["dddd", "cccc", "bbbb"]);
        assert_eq!(classify(&m, &booted(X, Y, 11, Facing::North)), Some(KickIntent::Climb));
    }

    #[test]
    fn north_at_map_edge_is_a_no_op() {
        let m = map_from(&["0000"]);
        // box y 0.5..5.5 → row 0; rows above are void
        assert_eq!(classify(&m, &booted(X, -4.0, 0, Facing::North)), None);
    }

    // ── South ──

    #[test]
    fn falls_south_past_a_slope() {
        // box y 6.5..11.5 → row 1
        let m = map_from(&[
            "4444",
            "4444",
            "3333",
            "2222",
        ]);
        let a = booted(X, 2.0, 4, Facing::South);
        assert_eq!(classify(&m, &a), Some(KickIntent::FallSouth { height: 2, rows: 2 }));
        let p = plan(&KickIntent::FallSouth { height: 2, rows: 2 }, &a);
        assert!((p.curve.total().1 - 12.0).abs() < 1e-9);
    }

    #[test]
    fn south_stops_at_high_or_uneven_rows() {
        let m = map_from(&[
            "4444",
            "4444",
            "3343",
            "2222",
        ]);
        assert_eq!(classify(&m, &booted(X, 2.0, 4, Facing::South)), None);
        let m = map_from(&[
            "4444",
            "4444",
            "2202",
        ]);
        assert_eq!(classify(&m, &booted(X, 2.0, 4, Facing::South)), None);
    }

    #[test]
    fn south_off_the_map_is_a_no_op() {
        let m = map_from(&["4444", "4444", "3333"]);
        assert_eq!(classify(&m, &booted(X, 2.0, 4, Facing::South)), None);
    }

    // ── East / West ──

    #[test]
    fn side_fall_takes_deepest_landing() {
        let m = map_from(&[
            "444444",
            "444444",
            "444222",
            "444222",
            "444222",
        ]);
        let a = booted(X, Y, 4, Facing::East);
        assert_eq!(classify(&m, &a), Some(KickIntent::FallSide { height: 2, rows: 1, scale: 1.0 }));
        let p = plan(&classify(&m, &a).unwrap(), &a);
        let (dx, dy) = p.curve.total();
        assert_eq!(p.z, 2);
        assert!((dx - 12.0).abs() < 1e-9);
        assert!((dy - 6.0).abs() < 1e-9);
    }

    #[test]
    fn side_fall_skips_slope_rows_to_deeper_ground() {
        let m = map_from(&[
            "666666",
            "666666",
            "666444",
            "666333",
            "666222",
            "666666",
        ]);
        assert_eq!(
            classify(&m, &booted(X, Y, 6, Facing::East)),
            Some(KickIntent::FallSide { height: 2, rows: 2, scale: 2.0 }),
        );
    }

    #[test]
    fn side_fall_west_mirrors_east() {
        let m = map_from(&[
            "444444",
            "444444",
            "222444",
            "444444",
        ]);
        // box x 21.5..32.5 → cols 3..5
        let a = booted(27.0, Y, 4, Facing::West);
        assert_eq!(classify(&m, &a), Some(KickIntent::FallSide { height: 2, rows: 0, scale: 0.0 }));
        let (dx, _) = plan(&classify(&m, &a).unwrap(), &a).curve.total();
        assert!((dx + 12.0).abs() < 1e-9);
    }

    #[test]
    fn side_fall_blocked_by_same_level() {
        let m = map_from(&[
            "444444",
            "444444",
            "444224",
            "444222",
        ]);
        assert_eq!(classify(&m, &booted(X, Y, 4, Facing::East)), None);
    }

    #[test]
    fn side_fall_scale_includes_upper_row_overlap() {
        let m = map_from(&[
            "444444",
            "444444",
            "444222",
            "444444",
        ]);
        // box y 8.5..13.5 → rows 1..2
        let a = booted(X, 4.0, 4, Facing::East);
        match classify(&m, &a) {
            Some(KickIntent::FallSide { height: 2, rows: 0, scale }) => {
                assert!((scale - (2.0 - (8.5 - SMALL_DISTANCE) / 6.0)).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn flat_ground_is_a_no_op_everywhere() {
        let m = map_from(&["0000", "0000", "0000", "0000"]);
        for f in [Facing::North, Facing::South, Facing::East, Facing::West] {
            assert_eq!(classify(&m, &booted(X, Y, 0, f)), None, "{f:?}");
            assert_eq!(classify(&m, &barefoot(X, Y, f)), None, "{f:?}");
        }
    }
}
