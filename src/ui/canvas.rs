/// Canvas: the drawing seam between the simulation and a display.
///
/// `draw_scene` is the only code that knows what a frame contains and in
/// which order it is layered. A `Canvas` only knows how to put a glyph at a
/// pixel position and a line of text in the header. The terminal renderer
/// is the production canvas; tests use a recording one.

use crate::domain::tile::TileMap;
use crate::sim::world::{Phase, WorldState};
use super::art::{Art, Glyph};

/// Header text lines, top to bottom.
pub const HUD_LINE: usize = 0;
pub const STATUS_LINE: usize = 1;
pub const HELP_LINE: usize = 2;
pub const TEXT_LINES: usize = 3;

pub const HELP_TEXT: &str = "Arrows/WASD move  R reset  Space continue  Q quit";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextStyle {
    Normal,
    Alert,
    Dim,
}

pub trait Canvas {
    /// Draw a tile-sized glyph whose top-left corner is at pixel (px, py).
    fn draw_tile(&mut self, px: f64, py: f64, glyph: &Glyph);

    /// Draw one header line.
    fn draw_text(&mut self, line: usize, text: &str, style: TextStyle);
}

/// Compose one frame: map, items, door, NPCs, player, then text.
pub fn draw_scene<C: Canvas>(world: &WorldState, art: &Art, canvas: &mut C) {
    draw_map(world.current_map(), art, canvas);

    for item in world.good_items.iter().chain(world.bad_items.iter()) {
        if !item.active {
            continue;
        }
        if let Some(g) = art.sprites.get(item.sprite) {
            canvas.draw_tile(item.x, item.y, g);
        }
    }

    if world.door.visible {
        if let Some(g) = world.pools.door.and_then(|id| art.sprites.get(id)) {
            canvas.draw_tile(world.door.x, world.door.y, g);
        }
    }

    for npc in &world.npcs {
        if let Some(g) = art.sprites.get(npc.sprite) {
            canvas.draw_tile(npc.x, npc.y, g);
        }
    }

    let frames = world.pools.player.for_facing(world.player.facing);
    if !frames.is_empty() {
        let id = frames[world.player.frame % frames.len()];
        if let Some(g) = art.sprites.get(id) {
            canvas.draw_tile(world.player.x, world.player.y, g);
        }
    }

    let hud = format!(
        "Level: {}   Items: {} / {}",
        world.level, world.collected, world.level_goal,
    );
    canvas.draw_text(HUD_LINE, &hud, TextStyle::Normal);
    if !world.message.is_empty() {
        let style = match world.phase {
            Phase::GameOver(_) => TextStyle::Alert,
            Phase::Playing => TextStyle::Normal,
        };
        canvas.draw_text(STATUS_LINE, &world.message, style);
    }
    canvas.draw_text(HELP_LINE, HELP_TEXT, TextStyle::Dim);
}

fn draw_map<C: Canvas>(map: &TileMap, art: &Art, canvas: &mut C) {
    for (ty, row) in map.tiles.iter().enumerate() {
        for (tx, &gid) in row.iter().enumerate() {
            if let Some(g) = art.tiles.glyph_for(gid) {
                let (px, py) = TileMap::tile_origin(tx as i32, ty as i32);
                canvas.draw_tile(px, py, g);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
