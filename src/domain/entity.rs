/// Entities: Player, Item, Npc, Door.
/// Positions are continuous pixel coordinates of the sprite's top-left corner.

use super::tile::TILE_PX;

/// Handle to a sprite owned by the presentation layer.
/// The simulation only stores and hands these back; it never draws.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SpriteId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

/// Frame input snapshot.
/// Directions are continuous (held); reset and confirm are edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub reset: bool,
    pub confirm: bool,
}

/// Animation frames per facing.
#[derive(Clone, Debug, Default)]
pub struct PlayerFrames {
    pub up: Vec<SpriteId>,
    pub down: Vec<SpriteId>,
    pub left: Vec<SpriteId>,
    pub right: Vec<SpriteId>,
}

impl PlayerFrames {
    pub fn for_facing(&self, facing: Facing) -> &[SpriteId] {
        match facing {
            Facing::Up => &self.up,
            Facing::Down => &self.down,
            Facing::Left => &self.left,
            Facing::Right => &self.right,
        }
    }
}

/// Every sprite handle the simulation needs to build a level.
#[derive(Clone, Debug, Default)]
pub struct SpritePools {
    pub player: PlayerFrames,
    pub door: Option<SpriteId>,
    pub good_items: Vec<SpriteId>,
    pub bad_items: Vec<SpriteId>,
    pub npcs: Vec<SpriteId>,
}

/// Ticks of continuous movement per animation frame.
pub const FRAME_TICKS: u32 = 8;

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub facing: Facing,
    pub frame: usize,
    pub frame_tick: u32,
}

impl Player {
    pub fn new(speed: f64) -> Self {
        Player {
            x: 0.0,
            y: 0.0,
            speed,
            facing: Facing::Down,
            frame: 0,
            frame_tick: 0,
        }
    }

    /// Move to a spawn point and reset animation. The player is never
    /// recreated, only repositioned.
    pub fn respawn_at(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.facing = Facing::Down;
        self.frame = 0;
        self.frame_tick = 0;
    }

    /// Center of the player's bounding box.
    pub fn center(&self) -> (f64, f64) {
        center_of(self.x, self.y)
    }

    /// Advance the walk cycle by one tick of movement.
    /// `frame_count` is the number of frames for the current facing.
    pub fn animate(&mut self, frame_count: usize) {
        self.frame_tick += 1;
        if self.frame_tick >= FRAME_TICKS {
            self.frame_tick = 0;
            if frame_count > 0 {
                self.frame = (self.frame + 1) % frame_count;
            }
        }
    }

    pub fn stand_still(&mut self) {
        self.frame = 0;
        self.frame_tick = 0;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ItemKind {
    Good,
    Bad,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub x: f64,
    pub y: f64,
    pub kind: ItemKind,
    pub active: bool,
    pub sprite: SpriteId,
}

impl Item {
    pub fn center(&self) -> (f64, f64) {
        center_of(self.x, self.y)
    }
}

/// Non-player character on a fixed bounce patrol inside an axis-aligned box.
#[derive(Clone, Debug, PartialEq)]
pub struct Npc {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub sprite: SpriteId,
}

/// The exit. Hidden until the level goal is met.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Door {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
}

impl Door {
    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn reveal_at(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.visible = true;
    }

    pub fn center(&self) -> (f64, f64) {
        center_of(self.x, self.y)
    }
}

#[inline]
fn center_of(x: f64, y: f64) -> (f64, f64) {
    (x + TILE_PX / 2.0, y + TILE_PX / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_cycle_advances_every_eight_ticks() {
        let mut p = Player::new(2.0);
        for _ in 0..7 { p.animate(2); }
        assert_eq!(p.frame, 0);
        assert_eq!(p.frame_tick, 7);

        p.animate(2);
        assert_eq!(p.frame, 1);
        assert_eq!(p.frame_tick, 0);

        for _ in 0..8 { p.animate(2); }
        assert_eq!(p.frame, 0); // wrapped
    }

    #[test]
    fn single_frame_never_leaves_zero() {
        let mut p = Player::new(2.0);
        for _ in 0..40 { p.animate(1); }
        assert_eq!(p.frame, 0);
    }

    #[test]
    fn stand_still_resets_cycle() {
        let mut p = Player::new(2.0);
        for _ in 0..11 { p.animate(3); }
        p.stand_still();
        assert_eq!((p.frame, p.frame_tick), (0, 0));
    }

    #[test]
    fn respawn_faces_down() {
        let mut p = Player::new(2.0);
        p.facing = Facing::Left;
        p.frame = 2;
        p.respawn_at(32.0, 32.0);
        assert_eq!(p.facing, Facing::Down);
        assert_eq!((p.x, p.y, p.frame), (32.0, 32.0, 0));
    }

    #[test]
    fn centers_are_offset_by_half_a_tile() {
        let door = Door { x: 16.0, y: 32.0, visible: true };
        assert_eq!(door.center(), (24.0, 40.0));
    }
}
