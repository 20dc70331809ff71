/// Collision and contact — single source of truth.
///
/// ## Blocking policy (two tiers)
///
///   1. Hard border: the outermost ring of tiles is always solid, and
///      anything outside the map is solid.
///   2. Wall gids: interior tiles are solid only if their gid is listed
///      in `TileMap::wall_ids`.
///
/// Levels ship without wall gids, so the border is the only obstacle.
/// Interior tiles that look like walls are walkable. This is a known
/// limitation of the level data, not something this layer guesses around.
///
/// ## Contact
///
/// Pickups, hazards and the door all use the same test: squared distance
/// between entity centers below `CONTACT_RADIUS2` (half a tile area), so
/// touching requires visual overlap, not mere adjacency.

use super::tile::{TileMap, TILE_PX, TILE_SIZE};

/// Squared-distance threshold for contact between two entity centers.
pub const CONTACT_RADIUS2: f64 = TILE_PX * TILE_PX * 0.5;

/// Is the pixel (px, py) blocked on this map?
///
/// An empty map never blocks. Pixel → tile conversion truncates toward
/// zero, matching integer division on the truncated coordinate.
pub fn is_blocked(map: &TileMap, px: f64, py: f64) -> bool {
    if map.is_empty() {
        return false;
    }

    let tx = (px as i32) / TILE_SIZE;
    let ty = (py as i32) / TILE_SIZE;

    if tx < 0 || ty < 0 || tx >= map.width || ty >= map.height {
        return true;
    }

    // Forced border ring
    if tx == 0 || ty == 0 || tx == map.width - 1 || ty == map.height - 1 {
        return true;
    }

    match map.gid_at(tx, ty) {
        Some(gid) => map.is_wall_gid(gid),
        // Row missing or shorter than tx
        None => false,
    }
}

/// Squared distance between two points.
#[inline]
pub fn dist2(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}

/// Are two entity centers close enough to count as touching?
#[inline]
pub fn in_contact(a: (f64, f64), b: (f64, f64)) -> bool {
    dist2(a, b) < CONTACT_RADIUS2
}

/// Resolve an attempted move of a tile-sized body at (x, y) by (dx, dy).
///
/// Axes are resolved independently: X first, then Y from the possibly
/// updated X. The probe point is the body's center shifted by the attempted
/// delta. Checking each axis on its own is what lets the body slide along a
/// wall instead of sticking to it.
pub fn resolve_move(map: &TileMap, x: f64, y: f64, dx: f64, dy: f64) -> (f64, f64) {
    let half = TILE_PX / 2.0;
    let mut nx = x;
    let mut ny = y;

    if dx != 0.0 {
        let tx = x + dx;
        if !is_blocked(map, tx + half, ny + half) {
            nx = tx;
        }
    }

    if dy != 0.0 {
        let ty = y + dy;
        if !is_blocked(map, nx + half, ty + half) {
            ny = ty;
        }
    }

    (nx, ny)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
