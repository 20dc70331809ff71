/// WorldState: the complete snapshot of a running game.
///
/// One owner, one mutator (`step`). The player lives as long as the world
/// and is only repositioned; items, NPCs and the door are rebuilt by
/// `step::setup_level` whenever a level is entered or retried.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{GameConfig, RulesConfig};
use crate::domain::entity::{Door, Item, Npc, Player, SpritePools};
use crate::domain::tile::TileMap;
use super::level::LevelDef;

/// Why the game stopped.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    HitBadItem,
    Escaped,
}

impl Outcome {
    pub fn message(self) -> &'static str {
        match self {
            Outcome::HitBadItem => "You hit a bad item! Press SPACE to restart.",
            Outcome::Escaped => "You escaped the dungeon! Press SPACE to restart.",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver(Outcome),
}

/// Tile the player appears on at every level setup.
pub const SPAWN_TILE: (i32, i32) = (2, 2);

pub struct WorldState {
    // ── Levels ──
    /// 1-based index into `levels`.
    pub level: usize,
    pub levels: Vec<LevelDef>,

    // ── Entities ──
    pub player: Player,
    pub good_items: Vec<Item>,
    pub bad_items: Vec<Item>,
    pub door: Door,
    pub npcs: Vec<Npc>,

    // ── Game tracking ──
    pub collected: usize,
    pub level_goal: usize,
    pub phase: Phase,
    pub message: String,
    pub tick: u64,

    // ── Setup inputs ──
    pub pools: SpritePools,
    pub rules: RulesConfig,
    pub rng: StdRng,
}

impl WorldState {
    /// Build a world with no level set up yet; call `step::setup_level`
    /// before the first tick.
    pub fn new(mut levels: Vec<LevelDef>, pools: SpritePools, config: &GameConfig) -> Self {
        if levels.is_empty() {
            log::warn!("no levels loaded; starting on an empty map");
            levels.push(LevelDef {
                name: String::from("Empty"),
                map: TileMap::default(),
                patrols: vec![],
            });
        }

        let rng = if config.seed == 0 {
            StdRng::from_entropy()
        } else {
            log::info!("deterministic run, seed {}", config.seed);
            StdRng::seed_from_u64(config.seed)
        };

        WorldState {
            level: 1,
            levels,
            player: Player::new(config.speed.player_speed),
            good_items: vec![],
            bad_items: vec![],
            door: Door::default(),
            npcs: vec![],
            collected: 0,
            level_goal: config.rules.items_needed,
            phase: Phase::Playing,
            message: String::new(),
            tick: 0,
            pools,
            rules: config.rules.clone(),
            rng,
        }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_last_level(&self) -> bool {
        self.level >= self.levels.len()
    }

    pub fn current_level(&self) -> &LevelDef {
        let idx = self.level.clamp(1, self.levels.len()) - 1;
        &self.levels[idx]
    }

    pub fn current_map(&self) -> &TileMap {
        &self.current_level().map
    }

    pub fn end_game(&mut self, outcome: Outcome) {
        self.phase = Phase::GameOver(outcome);
        self.message = outcome.message().to_string();
    }
}
