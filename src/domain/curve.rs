/// Motion curves for kick actions.
///
/// A curve is a closed-form polynomial stored as finite-difference seeds.
/// Each frame, every seed absorbs the one after it (walking from the last
/// entry to the first), then the first entry is the frame's delta.
/// For a seed vector of length n this yields a degree n-1 polynomial in the
/// frame number without evaluating it.
///
/// Invariant: the sequence of deltas is a pure function of the seeds, so two
/// curves built from the same coefficients produce bit-identical frames.
///
/// Seeds are in units of `mindist`, chosen so the whole curve sums to the
/// intended displacement:
/// ┌──────────────┬──────────────────────────┬───────────────┬──────────────┐
/// │ Curve        │ Seeds (× mindist)        │ mindist       │ Σ dy         │
/// ├──────────────┼──────────────────────────┼───────────────┼──────────────┤
/// │ climb        │ 19.5, -113, 102, 12      │ -2T / F⁴      │ -2T          │
/// │ fall north   │ 6335.5, 147, -27         │ -T / F³       │ -T           │
/// │ fall south   │ 42, -4                   │ -T·rows / F²  │ T·rows       │
/// │ fall side    │ 42, -4 (+ dx = ±T/20)    │ -T·scale / F² │ T·scale      │
/// └──────────────┴──────────────────────────┴───────────────┴──────────────┘
/// T = tile size, F = `CURVE_FRAMES`.

use super::anim::KICKING_FRAMES;
use super::entity::Facing;
use super::tile::TILE_SIZE;

/// Frames in a climb/fall curve: the two kick animation indices after the windup.
pub const CURVE_FRAMES: u32 = KICKING_FRAMES * 2;
/// Frames in a grab curve: the single barefoot kick index.
pub const GRAB_FRAMES: u32 = KICKING_FRAMES;

#[derive(Clone, Debug, PartialEq)]
pub struct MotionCurve {
    dx: Vec<f64>,
    dy: Vec<f64>,
    frames: u32,
    remaining: u32,
}

impl MotionCurve {
    pub fn new(dx: Vec<f64>, dy: Vec<f64>, frames: u32) -> Self {
        debug_assert!(!dx.is_empty() && !dy.is_empty());
        MotionCurve { dx, dy, frames, remaining: frames }
    }

    /// Constant per-frame step.
    pub fn linear(dx: f64, dy: f64, frames: u32) -> Self {
        MotionCurve::new(vec![dx], vec![dy], frames)
    }

    /// Two levels up: accelerates off the ground and lands two tiles north.
    pub fn climb() -> Self {
        let f = CURVE_FRAMES as f64;
        let mindist = TILE_SIZE * -2.0 / (f * f * f * f);
        MotionCurve::new(
            vec![0.0],
            vec![19.5 * mindist, -113.0 * mindist, 102.0 * mindist, 12.0 * mindist],
            CURVE_FRAMES,
        )
    }

    /// Hop off a north ledge: up one tile with an inflection mid-air.
    pub fn fall_north() -> Self {
        let f = CURVE_FRAMES as f64;
        let mindist = -TILE_SIZE / (f * f * f);
        MotionCurve::new(
            vec![0.0],
            vec![6335.5 * mindist, 147.0 * mindist, -27.0 * mindist],
            CURVE_FRAMES,
        )
    }

    /// Jump south: small rise then drop `rows` tiles.
    pub fn fall_south(rows: u32) -> Self {
        MotionCurve::new(vec![0.0], Self::arc(rows as f64), CURVE_FRAMES)
    }

    /// Flick sideways two tiles while dropping `scale` tiles.
    pub fn fall_side(facing: Facing, scale: f64) -> Self {
        let step = facing.dx() as f64 * TILE_SIZE / KICKING_FRAMES as f64;
        MotionCurve::new(vec![step], Self::arc(scale), CURVE_FRAMES)
    }

    fn arc(tiles: f64) -> Vec<f64> {
        let f = CURVE_FRAMES as f64;
        let mindist = (-TILE_SIZE * tiles) / (f * f);
        vec![42.0 * mindist, -4.0 * mindist]
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Advance one frame and return its `(dx, dy)`, or None when exhausted.
    pub fn next_delta(&mut self) -> Option<(f64, f64)> {
        if self.is_exhausted() { return None; }
        self.remaining -= 1;
        Some((accumulate(&mut self.dx), accumulate(&mut self.dy)))
    }

    /// All remaining deltas, without consuming this curve.
    #[cfg(test)]
    pub fn deltas(&self) -> Vec<(f64, f64)> {
        let mut c = self.clone();
        std::iter::from_fn(|| c.next_delta()).collect()
    }

    /// Net `(dx, dy)` over the remaining frames.
    #[cfg(test)]
    pub fn total(&self) -> (f64, f64) {
        self.deltas().iter().fold((0.0, 0.0), |(sx, sy), (dx, dy)| (sx + dx, sy + dy))
    }
}

#[inline]
fn accumulate(seeds: &mut [f64]) -> f64 {
    for i in (1..seeds.len()).rev() {
        seeds[i - 1] += seeds[i];
    }
    seeds[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn climb_sums_to_two_tiles_up() {
        let c = MotionCurve::climb();
        assert_eq!(c.frames(), 40);
        let (dx, dy) = c.total();
        assert_eq!(dx, 0.0);
        assert!((dy - -2.0 * TILE_SIZE).abs() < EPS, "dy = {dy}");
    }

    #[test]
    fn climb_accelerates_into_the_ledge() {
        let d = MotionCurve::climb().deltas();
        assert!(d.windows(2).all(|w| w[1].1 < w[0].1));
        assert!(d[0].1 < 0.0);
    }

    #[test]
    fn fall_north_sums_to_one_tile_up() {
        let (_, dy) = MotionCurve::fall_north().total();
        assert!((dy - -TILE_SIZE).abs() < EPS, "dy = {dy}");
    }

    #[test]
    fn fall_north_reverses_direction() {
        let d = MotionCurve::fall_north().deltas();
        assert!(d.first().unwrap().1 < 0.0);
        assert!(d.last().unwrap().1 > 0.0);
    }

    #[test]
    fn fall_south_scales_with_rows() {
        for rows in 1..=4 {
            let (_, dy) = MotionCurve::fall_south(rows).total();
            assert!((dy - TILE_SIZE * rows as f64).abs() < EPS, "rows {rows}: dy = {dy}");
        }
        // hops up before dropping
        assert!(MotionCurve::fall_south(1).deltas()[0].1 < 0.0);
    }

    #[test]
    fn fall_side_moves_two_tiles_laterally() {
        let (dx, dy) = MotionCurve::fall_side(Facing::East, 1.5).total();
        assert!((dx - 2.0 * TILE_SIZE).abs() < EPS);
        assert!((dy - 1.5 * TILE_SIZE).abs() < EPS);
        let (dx, _) = MotionCurve::fall_side(Facing::West, 0.0).total();
        assert!((dx + 2.0 * TILE_SIZE).abs() < EPS);
    }

    #[test]
    fn linear_curve_is_constant() {
        let c = MotionCurve::linear(0.25, -0.5, GRAB_FRAMES);
        let d = c.deltas();
        assert_eq!(d.len(), 20);
        assert!(d.iter().all(|&p| p == (0.25, -0.5)));
    }

    #[test]
    fn exhausted_curve_yields_nothing() {
        let mut c = MotionCurve::linear(1.0, 0.0, 2);
        assert!(c.next_delta().is_some());
        assert!(c.next_delta().is_some());
        assert!(c.is_exhausted());
        assert_eq!(c.next_delta(), None);
    }

    #[test]
    fn frames_are_bit_reproducible() {
        let a = MotionCurve::climb().deltas();
        let b = MotionCurve::climb().deltas();
        for (p, q) in a.iter().zip(&b) {
            assert_eq!(p.1.to_bits(), q.1.to_bits());
        }
    }

    #[test]
    fn accumulation_matches_closed_form() {
        // seeds [a, b] give delta_k = a + k·b (k from 1)
        let d = MotionCurve::new(vec![0.0], vec![3.0, 2.0], 4).deltas();
        let ys: Vec<f64> = d.iter().map(|p| p.1).collect();
        assert_eq!(ys, vec![5.0, 7.0, 9.0, 11.0]);
    }
}
