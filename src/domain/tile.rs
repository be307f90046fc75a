/// Tile identities, height levels, and the cell that pairs them.
/// Tile semantics are queried via methods, not stored as flags,
/// so the reserved values (boot, blank, void) are centralized here.

/// Edge length of one map cell, in sub-tile (pixel) units.
pub const TILE_SIZE: f64 = 6.0;

/// Number of discrete height levels a cell can hold.
pub const MAP_HEIGHTS: u8 = 16;
/// Highest level is reserved: "no tile" filler that never matches an actor's z.
pub const VOID_HEIGHT: u8 = MAP_HEIGHTS - 1;

/// Number of distinct tile bitmaps addressable from the map image.
pub const MAP_TILES: u8 = 64;

/// Visual tile identifier (index into the tileset strip).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TileId(pub u8);

impl TileId {
    /// Plain floor left behind when the boot is picked up.
    pub const BLANK: TileId = TileId(0);
    /// The pickup item.
    pub const BOOT: TileId = TileId(37);

    pub fn is_boot(self) -> bool {
        self == TileId::BOOT
    }
}

/// One map cell: an optional tile (None = void filler) and a height level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub tile: Option<TileId>,
    pub height: u8,
}

impl Cell {
    pub const VOID: Cell = Cell { tile: None, height: VOID_HEIGHT };
    /// What a grabbed boot cell becomes.
    pub const CLEARED: Cell = Cell { tile: Some(TileId::BLANK), height: 0 };

    pub fn new(tile: TileId, height: u8) -> Self {
        Cell { tile: Some(tile), height }
    }

    pub fn is_void(self) -> bool {
        self.height == VOID_HEIGHT
    }

    pub fn is_boot(self) -> bool {
        self.tile.map_or(false, TileId::is_boot)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::VOID
    }
}

/// Ground parity: even levels are flat ground, odd levels are slopes.
#[inline]
pub fn is_ground_level(height: i32) -> bool {
    height & 1 == 0
}
