/// Tile map: the grid of tile identifiers a level is drawn from.
///
/// Identifiers (gids) are 1-based indices into the tileset sheet;
/// 0 means "no tile". Rows are stored as parsed, so they may be ragged:
/// every consumer bounds-checks per row instead of trusting `width`.

use std::collections::HashSet;

/// Edge length of one tile in pixel units.
pub const TILE_SIZE: i32 = 16;

/// `TILE_SIZE` as a float, for continuous entity positions.
pub const TILE_PX: f64 = TILE_SIZE as f64;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileMap {
    pub width: i32,
    pub height: i32,
    /// Row-major gids, in file order.
    pub tiles: Vec<Vec<i32>>,
    /// Gids that block movement. The map loader leaves this empty, so only
    /// the forced border is solid (see `physics::is_blocked`).
    pub wall_ids: HashSet<i32>,
}

impl TileMap {
    /// Zero rows or a non-positive dimension.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0 || self.tiles.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.tiles.len()
    }

    /// Gid at tile (tx, ty), or None when the row is missing or too short.
    pub fn gid_at(&self, tx: i32, ty: i32) -> Option<i32> {
        if tx < 0 || ty < 0 {
            return None;
        }
        self.tiles
            .get(ty as usize)
            .and_then(|row| row.get(tx as usize))
            .copied()
    }

    pub fn is_wall_gid(&self, gid: i32) -> bool {
        self.wall_ids.contains(&gid)
    }

    /// Pixel position of the top-left corner of tile (tx, ty).
    /// Scaled in f64: map dimensions come straight from the file.
    pub fn tile_origin(tx: i32, ty: i32) -> (f64, f64) {
        (f64::from(tx) * TILE_PX, f64::from(ty) * TILE_PX)
    }

    /// Logical surface size in pixels.
    pub fn pixel_size(&self) -> (i64, i64) {
        let scale = |n: i32| i64::from(n.max(0)) * i64::from(TILE_SIZE);
        (scale(self.width), scale(self.height))
    }
}
