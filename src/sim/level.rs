/// Floor images: loading, saving and tileset export.
///
/// A floor is an RGBA image with one pixel per map cell:
///   height = blue  / (256 / MAP_HEIGHTS)
///   tile   = green / (256 / MAP_TILES)
/// A decoded height of `VOID_HEIGHT` marks a void cell (no tile).
///
/// Encoding writes the top of each channel band, so decoding an encoded floor
/// reproduces every height and tile id. Void cells encode as opaque white.
///
/// Export renders the floor with a tileset: a horizontal strip of square
/// `TILE_SIZE` bitmaps, tile `i` at `x = i * TILE_SIZE`.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use thiserror::Error;
use tracing::info;

use crate::domain::map::HeightTileMap;
use crate::domain::tile::{Cell, TileId, MAP_HEIGHTS, MAP_TILES, TILE_SIZE, VOID_HEIGHT};

pub const HEIGHT_FACTOR: u32 = 256 / MAP_HEIGHTS as u32;
pub const TILE_FACTOR: u32 = 256 / MAP_TILES as u32;

/// Pixels per tile edge in the tileset and export images.
const TILE_PX: u32 = TILE_SIZE as u32;

const VOID_PIXEL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MISSING_TILE_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Error)]
pub enum MapError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{} has no pixels", path.display())]
    Empty { path: PathBuf },
}

// ══════════════════════════════════════════════════════════════
// Floor <-> image
// ══════════════════════════════════════════════════════════════

pub fn decode_floor(img: &RgbaImage) -> HeightTileMap {
    let mut map = HeightTileMap::new(img.width() as usize, img.height() as usize);
    for (x, y, px) in img.enumerate_pixels() {
        let [_, g, b, _] = px.0;
        let height = (b as u32 / HEIGHT_FACTOR) as u8;
        let cell = if height == VOID_HEIGHT {
            Cell::VOID
        } else {
            Cell::new(TileId((g as u32 / TILE_FACTOR) as u8), height)
        };
        map.set_cell(y as usize, x as usize, cell);
    }
    map
}

pub fn encode_floor(map: &HeightTileMap) -> RgbaImage {
    let mut img = RgbaImage::new(map.width() as u32, map.height() as u32);
    for (row, col, cell) in map.iter() {
        let px = match cell.tile {
            Some(tile) if !cell.is_void() => {
                let g = (tile.0 as u32 + 1) * TILE_FACTOR - 1;
                let b = (cell.height as u32 + 1) * HEIGHT_FACTOR - 1;
                Rgba([0, g as u8, b as u8, 255])
            }
            _ => VOID_PIXEL,
        };
        img.put_pixel(col as u32, row as u32, px);
    }
    img
}

pub fn load_floor(path: &Path) -> Result<HeightTileMap, MapError> {
    let img = image::open(path)
        .map_err(|source| MapError::Read { path: path.to_path_buf(), source })?
        .to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(MapError::Empty { path: path.to_path_buf() });
    }
    let map = decode_floor(&img);
    info!(
        path = %path.display(),
        width = map.width(),
        height = map.height(),
        boot = ?map.find_boot(),
        "floor loaded"
    );
    Ok(map)
}

pub fn save_floor(map: &HeightTileMap, path: &Path) -> Result<(), MapError> {
    encode_floor(map)
        .save(path)
        .map_err(|source| MapError::Write { path: path.to_path_buf(), source })
}

// ══════════════════════════════════════════════════════════════
// Tileset export
// ══════════════════════════════════════════════════════════════

/// Tile bitmaps cut from a horizontal strip.
pub struct Tileset {
    strip: RgbaImage,
    count: u32,
}

impl Tileset {
    pub fn from_strip(strip: RgbaImage) -> Self {
        let count = if strip.height() >= TILE_PX { strip.width() / TILE_PX } else { 0 };
        Tileset { strip, count }
    }

    pub fn load(path: &Path) -> Result<Self, MapError> {
        let img = image::open(path)
            .map_err(|source| MapError::Read { path: path.to_path_buf(), source })?
            .to_rgba8();
        Ok(Tileset::from_strip(img))
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    /// Pixel `(dx, dy)` of `tile`; tiles past the strip are solid black.
    pub fn pixel(&self, tile: TileId, dx: u32, dy: u32) -> Rgba<u8> {
        if tile.0 as u32 >= self.count { return MISSING_TILE_PIXEL; }
        *self.strip.get_pixel(tile.0 as u32 * TILE_PX + dx, dy)
    }
}

/// Render the map at one tileset pixel per sub-tile unit.
pub fn export_map(map: &HeightTileMap, tileset: &Tileset) -> RgbaImage {
    let mut out = RgbaImage::new(map.width() as u32 * TILE_PX, map.height() as u32 * TILE_PX);
    for (row, col, cell) in map.iter() {
        // void stays transparent
        let Some(tile) = cell.tile else { continue };
        let (ox, oy) = (col as u32 * TILE_PX, row as u32 * TILE_PX);
        for dy in 0..TILE_PX {
            for dx in 0..TILE_PX {
                out.put_pixel(ox + dx, oy + dy, tileset.pixel(tile, dx, dy));
            }
        }
    }
    out
}

/// Export `map` through the tileset at `tileset_path` and write it to `out`.
pub fn write_export(map: &HeightTileMap, tileset_path: &Path, out: &Path) -> Result<(), MapError> {
    let tileset = Tileset::load(tileset_path)?;
    export_map(map, &tileset)
        .save(out)
        .map_err(|source| MapError::Write { path: out.to_path_buf(), source })?;
    info!(path = %out.display(), tiles = tileset.len(), "map exported");
    Ok(())
}
