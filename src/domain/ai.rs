/// NPC behavior: fixed bounce patrols.
///
/// Each NPC moves by its velocity every tick and reflects off the edges of
/// its travel box. Axes are independent, so a diagonal walker bounces
/// around its box like a billiard ball. There is no pathing and no reaction
/// to the player.

use super::entity::{Npc, SpriteId};
use super::tile::TileMap;

/// A patrol described in tile units, turned into an `Npc` at level setup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatrolRoute {
    pub sprite_idx: usize,
    pub start: (i32, i32),
    pub velocity: (f64, f64),
    /// (min_tx, max_tx, min_ty, max_ty)
    pub bounds: (i32, i32, i32, i32),
}

impl PatrolRoute {
    const fn new(
        sprite_idx: usize,
        tx: i32, ty: i32,
        vx: f64, vy: f64,
        min_tx: i32, max_tx: i32, min_ty: i32, max_ty: i32,
    ) -> Self {
        PatrolRoute {
            sprite_idx,
            start: (tx, ty),
            velocity: (vx, vy),
            bounds: (min_tx, max_tx, min_ty, max_ty),
        }
    }

    /// Instantiate in pixel space. The sprite is picked by index, wrapping
    /// around the pool.
    pub fn spawn(&self, pool: &[SpriteId]) -> Option<Npc> {
        if pool.is_empty() {
            return None;
        }
        let (x, y) = TileMap::tile_origin(self.start.0, self.start.1);
        let (min_x, min_y) = TileMap::tile_origin(self.bounds.0, self.bounds.2);
        let (max_x, max_y) = TileMap::tile_origin(self.bounds.1, self.bounds.3);
        Some(Npc {
            x, y,
            vx: self.velocity.0,
            vy: self.velocity.1,
            min_x, max_x, min_y, max_y,
            sprite: pool[self.sprite_idx % pool.len()],
        })
    }
}

/// The crypt patrol: horizontal, vertical and diagonal walkers.
pub const CRYPT_PATROLS: [PatrolRoute; 7] = [
    PatrolRoute::new(0, 5, 5, 1.0, 0.0, 4, 10, 5, 5),
    PatrolRoute::new(1, 10, 8, -1.2, 0.0, 5, 12, 8, 8),
    PatrolRoute::new(2, 7, 12, 0.0, 1.0, 7, 7, 10, 16),
    PatrolRoute::new(3, 12, 6, 0.0, -1.1, 12, 12, 4, 14),
    PatrolRoute::new(4, 3, 14, 0.8, 0.8, 2, 8, 13, 18),
    PatrolRoute::new(5, 15, 10, -0.8, 0.8, 12, 18, 8, 16),
    PatrolRoute::new(6, 9, 3, 0.0, 1.3, 9, 9, 2, 15),
];

impl Npc {
    /// One tick of patrol: move, then reflect on whichever axes left the box.
    pub fn advance(&mut self) {
        self.x += self.vx;
        self.y += self.vy;

        if self.x < self.min_x {
            self.x = self.min_x;
            self.vx = -self.vx;
        } else if self.x > self.max_x {
            self.x = self.max_x;
            self.vx = -self.vx;
        }

        if self.y < self.min_y {
            self.y = self.min_y;
            self.vy = -self.vy;
        } else if self.y > self.max_y {
            self.y = self.max_y;
            self.vy = -self.vy;
        }
    }
}
