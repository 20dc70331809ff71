/// Entity spawner: scatters items over a map.
///
/// Placement is rejection sampling over the whole grid with a bounded
/// retry budget (`target * tries_per_item`). A spawner that cannot reach its
/// target returns what it has and logs; it never loops forever.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::entity::{Item, ItemKind, SpriteId};
use crate::domain::tile::TileMap;

pub fn spawn_items<R: Rng>(
    map: &TileMap,
    kind: ItemKind,
    pool: &[SpriteId],
    target: usize,
    tries_per_item: usize,
    rng: &mut R,
) -> Vec<Item> {
    if map.is_empty() {
        log::warn!("spawn {:?}: map is empty, no items placed", kind);
        return vec![];
    }
    if pool.is_empty() {
        log::warn!("spawn {:?}: no sprites available, no items placed", kind);
        return vec![];
    }

    let rows = map.row_count() as i32;
    let budget = target.saturating_mul(tries_per_item);
    let mut items = Vec::with_capacity(target);

    for _ in 0..budget {
        if items.len() >= target {
            break;
        }
        let tx = rng.gen_range(0..map.width);
        let ty = rng.gen_range(0..rows);

        let gid = match map.gid_at(tx, ty) {
            Some(gid) => gid,
            None => continue, // short row
        };
        if map.is_wall_gid(gid) {
            continue;
        }

        let (x, y) = TileMap::tile_origin(tx, ty);
        let sprite = match pool.choose(rng) {
            Some(&s) => s,
            None => continue,
        };
        items.push(Item { x, y, kind, active: true, sprite });
    }

    if items.len() < target {
        log::warn!(
            "spawn {:?}: retry budget of {} exhausted, placed {} of {}",
            kind, budget, items.len(), target,
        );
    }
    items
}
