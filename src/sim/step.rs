/// The step function: advances the world by one tick.
///
/// Processing order while playing:
///   1. Manual reset (re-runs setup, then the tick carries on)
///   2. Player movement + walk animation
///   3. Good item pickup (may reveal the door)
///   4. Bad item contact (ends the game and the tick)
///   5. Door contact (next level, or escape on the last one)
///   6. NPC patrols
///
/// While the game is over only `confirm` is read.

use crate::domain::entity::{FrameInput, ItemKind, Facing};
use crate::domain::physics;
use crate::domain::tile::TileMap;
use super::event::GameEvent;
use super::spawn::spawn_items;
use super::world::{Outcome, Phase, WorldState, SPAWN_TILE};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if let Phase::GameOver(outcome) = world.phase {
        if input.confirm {
            let level = match outcome {
                Outcome::Escaped => 1,
                Outcome::HitBadItem => world.level,
            };
            setup_level(world, level);
            events.push(GameEvent::LevelReset);
        }
        return events;
    }

    if input.reset {
        let level = world.level;
        setup_level(world, level);
        events.push(GameEvent::LevelReset);
    }

    resolve_player_movement(world, input);
    resolve_good_items(world, &mut events);
    if resolve_bad_items(world, &mut events) { return events; }
    resolve_door(world, &mut events);
    resolve_npcs(world);

    events
}

// ══════════════════════════════════════════════════════════════
// Level setup
// ══════════════════════════════════════════════════════════════

/// (Re)build everything level-scoped. Safe to call repeatedly; only the
/// random item layout differs between calls.
pub fn setup_level(world: &mut WorldState, level: usize) {
    let level = level.clamp(1, world.level_count());
    let idx = level - 1;

    world.level = level;
    world.collected = 0;
    world.door.hide();
    world.phase = Phase::Playing;
    world.message.clear();

    let (sx, sy) = TileMap::tile_origin(SPAWN_TILE.0, SPAWN_TILE.1);
    world.player.respawn_at(sx, sy);

    let def = &world.levels[idx];
    let tries = world.rules.spawn_tries_per_item;
    world.good_items = spawn_items(
        &def.map, ItemKind::Good, &world.pools.good_items,
        world.rules.good_items, tries, &mut world.rng,
    );
    world.bad_items = spawn_items(
        &def.map, ItemKind::Bad, &world.pools.bad_items,
        world.rules.bad_items, tries, &mut world.rng,
    );
    world.npcs = def.patrols
        .iter()
        .filter_map(|route| route.spawn(&world.pools.npcs))
        .collect();

    log::info!(
        "level {} '{}' set up: {} good, {} bad, {} npcs",
        level, def.name, world.good_items.len(), world.bad_items.len(), world.npcs.len(),
    );
}

// ══════════════════════════════════════════════════════════════
// Player movement
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, input: FrameInput) {
    let speed = world.player.speed;
    let mut dx = 0.0;
    let mut dy = 0.0;

    // Later directions win the facing.
    if input.left {
        dx -= speed;
        world.player.facing = Facing::Left;
    }
    if input.right {
        dx += speed;
        world.player.facing = Facing::Right;
    }
    if input.up {
        dy -= speed;
        world.player.facing = Facing::Up;
    }
    if input.down {
        dy += speed;
        world.player.facing = Facing::Down;
    }

    if dx == 0.0 && dy == 0.0 {
        world.player.stand_still();
        return;
    }

    let (nx, ny) = physics::resolve_move(
        world.current_map(), world.player.x, world.player.y, dx, dy,
    );
    world.player.x = nx;
    world.player.y = ny;

    let frames = world.pools.player.for_facing(world.player.facing).len();
    world.player.animate(frames);
}

// ══════════════════════════════════════════════════════════════
// Items
// ══════════════════════════════════════════════════════════════

fn resolve_good_items(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let pc = world.player.center();

    for item in world.good_items.iter_mut().filter(|it| it.active) {
        if !physics::in_contact(pc, item.center()) {
            continue;
        }
        item.active = false;
        world.collected += 1;
        events.push(GameEvent::ItemCollected { x: item.x, y: item.y });

        if world.collected >= world.level_goal && !world.door.visible {
            let map = &world.levels[world.level - 1].map;
            let (x, y) = TileMap::tile_origin(
                map.width.saturating_sub(2),
                map.height.saturating_sub(2),
            );
            world.door.reveal_at(x, y);
            log::debug!("door revealed at ({x}, {y})");
            events.push(GameEvent::DoorAppeared { x, y });
        }
    }
}

/// Returns true when the game ended this tick.
fn resolve_bad_items(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let pc = world.player.center();
    let hit = world.bad_items
        .iter()
        .any(|it| it.active && physics::in_contact(pc, it.center()));

    if hit {
        log::info!("bad item hit on level {}", world.level);
        world.end_game(Outcome::HitBadItem);
        events.push(GameEvent::HitBadItem);
    }
    hit
}

// ══════════════════════════════════════════════════════════════
// Door
// ══════════════════════════════════════════════════════════════

fn resolve_door(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.door.visible {
        return;
    }
    if !physics::in_contact(world.player.center(), world.door.center()) {
        return;
    }

    if world.is_last_level() {
        log::info!("escaped from level {}", world.level);
        world.end_game(Outcome::Escaped);
        events.push(GameEvent::Escaped);
    } else {
        let next = world.level + 1;
        log::debug!("door taken: level {} -> {}", world.level, next);
        setup_level(world, next);
        events.push(GameEvent::LevelEntered { level: next });
    }
}

// ══════════════════════════════════════════════════════════════
// NPCs
// ══════════════════════════════════════════════════════════════

fn resolve_npcs(world: &mut WorldState) {
    for npc in world.npcs.iter_mut() {
        npc.advance();
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::ai::CRYPT_PATROLS;
    use crate::domain::entity::{Item, PlayerFrames, SpriteId, SpritePools};
    use crate::domain::tile::{TILE_PX, TILE_SIZE};
    use crate::sim::level::LevelDef;
    use std::collections::HashSet;

    fn open_map() -> TileMap {
        TileMap {
            width: 20,
            height: 20,
            tiles: vec![vec![1; 20]; 20],
            wall_ids: HashSet::new(),
        }
    }

    fn pools() -> SpritePools {
        let walk = vec![SpriteId(0), SpriteId(1)];
        SpritePools {
            player: PlayerFrames {
                up: walk.clone(),
                down: walk.clone(),
                left: walk.clone(),
                right: walk,
            },
            door: Some(SpriteId(2)),
            good_items: vec![SpriteId(3), SpriteId(4)],
            bad_items: vec![SpriteId(5)],
            npcs: vec![SpriteId(6), SpriteId(7)],
        }
    }

    /// Fresh world on level 1. Spawner targets are zeroed so no random
    /// item lands in a test's way; tests that want items restore them.
    fn world() -> WorldState {
        let levels = vec![
            LevelDef { name: "one".into(), map: open_map(), patrols: vec![] },
            LevelDef { name: "two".into(), map: open_map(), patrols: CRYPT_PATROLS.to_vec() },
        ];
        let mut cfg = GameConfig::default();
        cfg.seed = 1234;
        cfg.rules.good_items = 0;
        cfg.rules.bad_items = 0;
        let mut w = WorldState::new(levels, pools(), &cfg);
        setup_level(&mut w, 1);
        w
    }

    fn item_at(tx: i32, ty: i32, kind: ItemKind) -> Item {
        let (x, y) = TileMap::tile_origin(tx, ty);
        Item { x, y, kind, active: true, sprite: SpriteId(3) }
    }

    fn put_player(w: &mut WorldState, x: f64, y: f64) {
        w.player.x = x;
        w.player.y = y;
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn door_tile() -> (f64, f64) {
        TileMap::tile_origin(18, 18)
    }

    // ── Setup ──

    #[test]
    fn setup_is_idempotent_for_spawn_and_door() {
        let mut w = world();
        setup_level(&mut w, 1);
        setup_level(&mut w, 1);
        assert_eq!((w.player.x, w.player.y), (32.0, 32.0));
        assert!(!w.door.visible);
        assert_eq!(w.collected, 0);
        assert_eq!(w.player.facing, Facing::Down);
    }

    #[test]
    fn setup_spawns_configured_counts() {
        let mut w = world();
        w.rules = GameConfig::default().rules;
        setup_level(&mut w, 1);
        assert_eq!(w.good_items.len(), 15);
        assert_eq!(w.bad_items.len(), 5);
        assert!(w.npcs.is_empty());
        setup_level(&mut w, 2);
        assert_eq!(w.npcs.len(), 7);
    }

    #[test]
    fn out_of_range_level_is_clamped() {
        let mut w = world();
        setup_level(&mut w, 9);
        assert_eq!(w.level, 2);
        setup_level(&mut w, 0);
        assert_eq!(w.level, 1);
    }

    // ── Movement ──

    #[test]
    fn moves_by_speed_and_faces_last_direction() {
        let mut w = world();
        step(&mut w, FrameInput { right: true, ..idle() });
        assert_eq!((w.player.x, w.player.y), (34.0, 32.0));
        assert_eq!(w.player.facing, Facing::Right);

        step(&mut w, FrameInput { left: true, up: true, ..idle() });
        assert_eq!((w.player.x, w.player.y), (32.0, 30.0));
        assert_eq!(w.player.facing, Facing::Up);
    }

    #[test]
    fn opposing_keys_cancel_but_still_turn() {
        let mut w = world();
        for _ in 0..5 { step(&mut w, FrameInput { down: true, ..idle() }); }
        assert!(w.player.frame_tick > 0);

        step(&mut w, FrameInput { left: true, right: true, ..idle() });
        assert_eq!(w.player.x, 32.0);
        assert_eq!(w.player.facing, Facing::Right);
        assert_eq!((w.player.frame, w.player.frame_tick), (0, 0));
    }

    #[test]
    fn border_stops_the_player() {
        let mut w = world();
        for _ in 0..100 { step(&mut w, FrameInput { left: true, up: true, ..idle() }); }
        // Center must stay in tile 1: x + 8 >= 16
        assert_eq!((w.player.x, w.player.y), (8.0, 8.0));
    }

    #[test]
    fn walk_cycle_advances_after_eight_moving_ticks() {
        let mut w = world();
        for _ in 0..8 { step(&mut w, FrameInput { down: true, ..idle() }); }
        assert_eq!(w.player.frame, 1);
        step(&mut w, idle());
        assert_eq!(w.player.frame, 0);
    }

    // ── Items and door ──

    #[test]
    fn nine_pickups_reveal_the_door() {
        let mut w = world();
        w.good_items = (0..9).map(|i| item_at(4 + i, 10, ItemKind::Good)).collect();

        for i in 0..9 {
            let (x, y) = (w.good_items[i].x, w.good_items[i].y);
            put_player(&mut w, x, y);
            let events = step(&mut w, idle());
            assert!(events.contains(&GameEvent::ItemCollected { x, y }));
            assert_eq!(w.collected, i + 1);
            assert_eq!(w.door.visible, i == 8, "after pickup {}", i + 1);
        }

        let (dx, dy) = door_tile();
        assert_eq!((w.door.x, w.door.y), (dx, dy));
        assert_eq!(dx, f64::from(18 * TILE_SIZE));
        assert!(w.good_items.iter().all(|it| !it.active));
    }

    #[test]
    fn consumed_item_is_not_counted_twice() {
        let mut w = world();
        w.good_items = vec![item_at(5, 5, ItemKind::Good)];
        put_player(&mut w, 80.0, 80.0);
        step(&mut w, idle());
        step(&mut w, idle());
        assert_eq!(w.collected, 1);
    }

    #[test]
    fn adjacent_tile_is_not_contact() {
        let mut w = world();
        w.good_items = vec![item_at(5, 5, ItemKind::Good)];
        put_player(&mut w, 80.0 + TILE_PX, 80.0);
        step(&mut w, idle());
        assert_eq!(w.collected, 0);
        assert!(w.good_items[0].active);
    }

    #[test]
    fn bad_item_ends_game_before_door_and_npcs() {
        let mut w = world();
        setup_level(&mut w, 2);
        w.bad_items = vec![item_at(18, 18, ItemKind::Bad)];
        let (dx, dy) = door_tile();
        w.door.reveal_at(dx, dy);
        put_player(&mut w, dx, dy);
        let npcs_before = w.npcs.clone();

        let events = step(&mut w, idle());
        assert_eq!(events, vec![GameEvent::HitBadItem]);
        assert_eq!(w.phase, Phase::GameOver(Outcome::HitBadItem));
        assert_eq!(w.message, "You hit a bad item! Press SPACE to restart.");
        assert_eq!(w.level, 2);
        assert_eq!(w.npcs, npcs_before);
    }

    #[test]
    fn inactive_bad_item_is_harmless() {
        let mut w = world();
        let mut bomb = item_at(2, 2, ItemKind::Bad);
        bomb.active = false;
        w.bad_items = vec![bomb];
        step(&mut w, idle());
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn hidden_door_does_nothing() {
        let mut w = world();
        let (dx, dy) = door_tile();
        put_player(&mut w, dx, dy);
        step(&mut w, idle());
        assert_eq!(w.level, 1);
        assert_eq!(w.phase, Phase::Playing);
    }

    // ── Transitions ──

    #[test]
    fn door_on_level_one_enters_level_two() {
        let mut w = world();
        w.rules = GameConfig::default().rules;
        w.collected = 9;
        let (dx, dy) = door_tile();
        w.door.reveal_at(dx, dy);
        put_player(&mut w, dx, dy);

        let events = step(&mut w, idle());
        assert!(events.contains(&GameEvent::LevelEntered { level: 2 }));
        assert_eq!(w.level, 2);
        assert_eq!(w.collected, 0);
        assert!(!w.door.visible);
        assert_eq!((w.player.x, w.player.y), (32.0, 32.0));
        assert_eq!(w.npcs.len(), 7);
        assert_eq!(w.good_items.len(), 15);
        assert!(w.good_items.iter().all(|it| it.active));
    }

    #[test]
    fn door_on_last_level_escapes_and_confirm_restarts_at_one() {
        let mut w = world();
        setup_level(&mut w, 2);
        let (dx, dy) = door_tile();
        w.door.reveal_at(dx, dy);
        put_player(&mut w, dx, dy);

        let events = step(&mut w, idle());
        assert!(events.contains(&GameEvent::Escaped));
        assert_eq!(w.phase, Phase::GameOver(Outcome::Escaped));
        assert!(w.message.contains("escaped"));

        let events = step(&mut w, FrameInput { confirm: true, ..idle() });
        assert_eq!(events, vec![GameEvent::LevelReset]);
        assert_eq!(w.level, 1);
        assert_eq!(w.phase, Phase::Playing);
        assert!(w.message.is_empty());
    }

    #[test]
    fn confirm_after_bad_item_retries_same_level() {
        let mut w = world();
        setup_level(&mut w, 2);
        w.end_game(Outcome::HitBadItem);
        step(&mut w, FrameInput { confirm: true, ..idle() });
        assert_eq!(w.level, 2);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.npcs.len(), 7);
    }

    #[test]
    fn game_over_ignores_everything_but_confirm() {
        let mut w = world();
        w.end_game(Outcome::HitBadItem);
        let before = (w.player.x, w.player.y);
        let events = step(&mut w, FrameInput { right: true, reset: true, ..idle() });
        assert!(events.is_empty());
        assert_eq!((w.player.x, w.player.y), before);
        assert_ne!(w.phase, Phase::Playing);
    }

    #[test]
    fn manual_reset_then_tick_continues() {
        let mut w = world();
        for _ in 0..10 { step(&mut w, FrameInput { down: true, ..idle() }); }
        w.collected = 4;

        let events = step(&mut w, FrameInput { reset: true, right: true, ..idle() });
        assert_eq!(events.first(), Some(&GameEvent::LevelReset));
        assert_eq!(w.collected, 0);
        assert_eq!((w.player.x, w.player.y), (34.0, 32.0));
    }

    // ── NPCs ──

    #[test]
    fn npcs_patrol_on_level_two_only() {
        let mut w = world();
        assert!(w.npcs.is_empty());

        setup_level(&mut w, 2);
        let start = w.npcs[0].x;
        step(&mut w, idle());
        assert_eq!(w.npcs[0].x, start + 1.0);
        for _ in 0..500 {
            step(&mut w, idle());
            for n in &w.npcs {
                assert!(n.x >= n.min_x && n.x <= n.max_x);
                assert!(n.y >= n.min_y && n.y <= n.max_y);
            }
        }
    }

    #[test]
    fn npc_contact_is_harmless() {
        let mut w = world();
        setup_level(&mut w, 2);
        let (x, y) = (w.npcs[0].x, w.npcs[0].y);
        put_player(&mut w, x, y);
        step(&mut w, idle());
        assert_eq!(w.phase, Phase::Playing);
    }
}
