/// HeightTileMap: the collision surface.
///
/// A dense row-major grid of `Cell`s (tile identity + height level).
/// Two access layers:
///   - `height_at` / `tile_at` / `set_cell` take in-bounds `(row, col)`.
///     Passing an out-of-range cell is a programming error (debug assert).
///   - `level_at` / `cell_at` take signed tile coordinates and read anything
///     outside the grid as `Cell::VOID`. The resolver and the kick scanner
///     only use this layer, so the map behaves as if ringed by void.

use super::tile::{Cell, TileId, VOID_HEIGHT};

#[derive(Clone, Debug, PartialEq)]
pub struct HeightTileMap {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl HeightTileMap {
    /// A `width × height` map of void cells.
    pub fn new(width: usize, height: usize) -> Self {
        HeightTileMap::filled(width, height, Cell::VOID)
    }

    /// A map where every cell is `fill`.
    pub fn filled(width: usize, height: usize, fill: Cell) -> Self {
        HeightTileMap { width, height, cells: vec![fill; width * height] }
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height && col < self.width, "cell ({row}, {col}) out of bounds");
        row * self.width + col
    }

    pub fn height_at(&self, row: usize, col: usize) -> u8 {
        self.cells[self.index(row, col)].height
    }

    #[cfg(test)]
    pub fn tile_at(&self, row: usize, col: usize) -> Option<TileId> {
        self.cells[self.index(row, col)].tile
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[self.index(row, col)]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        let i = self.index(row, col);
        self.cells[i] = cell;
    }

    /// Cell at signed tile coordinates; outside the grid is void.
    #[inline]
    pub fn cell_at(&self, row: i32, col: i32) -> Cell {
        if row < 0 || col < 0 || row as usize >= self.height || col as usize >= self.width {
            return Cell::VOID;
        }
        self.cell(row as usize, col as usize)
    }

    /// Height level at signed tile coordinates; outside the grid is `VOID_HEIGHT`.
    #[inline]
    pub fn level_at(&self, row: i32, col: i32) -> i32 {
        if row < 0 || col < 0 || row as usize >= self.height || col as usize >= self.width {
            return VOID_HEIGHT as i32;
        }
        self.height_at(row as usize, col as usize) as i32
    }

    /// First boot cell scanning rows bottom-up, columns left-to-right.
    pub fn find_boot(&self) -> Option<(usize, usize)> {
        (0..self.height).rev().find_map(|row| {
            (0..self.width)
                .find(|&col| self.cell(row, col).is_boot())
                .map(|col| (row, col))
        })
    }

    /// Iterate `(row, col, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &c)| (i / self.width, i % self.width, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::map_from;

    #[test]
    fn queries_in_bounds() {
        let m = map_from(&[
            "012",
            "3B#",
        ]);
        assert_eq!(m.width(), 3);
        assert_eq!(m.height(), 2);
        assert_eq!(m.height_at(0, 2), 2);
        assert_eq!(m.height_at(1, 0), 3);
        assert_eq!(m.tile_at(1, 1), Some(TileId::BOOT));
        assert_eq!(m.tile_at(1, 2), None);
        assert_eq!(m.height_at(1, 2), VOID_HEIGHT);
    }

    #[test]
    fn out_of_bounds_reads_as_void() {
        let m = map_from(&["00", "00"]);
        assert_eq!(m.level_at(-1, 0), VOID_HEIGHT as i32);
        assert_eq!(m.level_at(0, -1), VOID_HEIGHT as i32);
        assert_eq!(m.level_at(2, 0), VOID_HEIGHT as i32);
        assert_eq!(m.level_at(0, 2), VOID_HEIGHT as i32);
        assert_eq!(m.cell_at(5, 5), Cell::VOID);
        assert_eq!(m.level_at(1, 1), 0);
    }

    #[test]
    fn set_cell_mutates_in_place() {
        let mut m = map_from(&["B0"]);
        m.set_cell(0, 0, Cell::CLEARED);
        assert_eq!(m.tile_at(0, 0), Some(TileId::BLANK));
        assert_eq!(m.height_at(0, 0), 0);
        assert_eq!(m.find_boot(), None);
    }

    #[test]
    fn find_boot_prefers_lowest_row() {
        let m = map_from(&[
            "B00",
            "00B",
            "0B0",
        ]);
        assert_eq!(m.find_boot(), Some((2, 1)));
    }

    #[test]
    fn iter_visits_row_major() {
        let m = map_from(&["01", "23"]);
        let heights: Vec<u8> = m.iter().map(|(_, _, c)| c.height).collect();
        assert_eq!(heights, vec![0, 1, 2, 3]);
        let (r, c, _) = m.iter().nth(3).unwrap();
        assert_eq!((r, c), (1, 1));
    }
}
