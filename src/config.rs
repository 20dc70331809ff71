/// Game settings from `config.toml`.
///
/// Every key is optional. A missing file, a missing section or a file that
/// fails to parse all end up at the built-in values below.

use serde::Deserialize;
use std::path::PathBuf;

// ── Settings ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    /// 0 = seed from entropy.
    pub seed: u64,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_speed: f64,  // pixels per tick
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub items_needed: usize,          // level goal: good items before the door shows
    pub good_items: usize,            // spawner target, deliberately above the goal
    pub bad_items: usize,
    pub spawn_tries_per_item: usize,  // retry budget = target * this
}

impl RulesConfig {
    /// False when the spawner never aims for enough good items to show the door.
    pub fn goal_reachable(&self) -> bool {
        self.items_needed <= self.good_items
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub reset: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── File layout ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_speed")]
    player_speed: f64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_items_needed")]
    items_needed: usize,
    #[serde(default = "default_good_items")]
    good_items: usize,
    #[serde(default = "default_bad_items")]
    bad_items: usize,
    #[serde(default = "default_spawn_tries")]
    spawn_tries_per_item: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    seed: u64,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }    // ~60 ticks per second
fn default_player_speed() -> f64 { 2.0 }
fn default_items_needed() -> usize { 9 }
fn default_good_items() -> usize { 15 }
fn default_bad_items() -> usize { 5 }
fn default_spawn_tries() -> usize { 500 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_reset() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_speed: default_player_speed(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            items_needed: default_items_needed(),
            good_items: default_good_items(),
            bad_items: default_bad_items(),
            spawn_tries_per_item: default_spawn_tries(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            reset: default_reset(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            seed: 0,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// First `config.toml` found next to the executable, then in the CWD.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        let cfg = Self::from_toml(toml_cfg, &search_dirs);
        if !cfg.rules.goal_reachable() {
            log::warn!(
                "rules.items_needed ({}) exceeds rules.good_items ({}); the door can never appear",
                cfg.rules.items_needed, cfg.rules.good_items,
            );
        }
        cfg
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // relative levels_dir: first candidate dir that has it
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
                player_speed: toml_cfg.speed.player_speed,
            },
            rules: RulesConfig {
                items_needed: toml_cfg.rules.items_needed,
                good_items: toml_cfg.rules.good_items,
                bad_items: toml_cfg.rules.bad_items,
                spawn_tries_per_item: toml_cfg.rules.spawn_tries_per_item,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                reset: toml_cfg.gamepad.reset,
            },
            levels_dir,
            seed: toml_cfg.general.seed,
        }
    }
}

/// Executable directory, then CWD if different.
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("config loaded from {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    log::info!("no config.toml found; using default settings");
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> GameConfig {
        let cfg: TomlConfig = toml::from_str(text).unwrap();
        GameConfig::from_toml(cfg, &[])
    }

    #[test]
    fn empty_file_gives_defaults() {
        let c = parse("");
        assert_eq!(c.speed.tick_rate_ms, 16);
        assert_eq!(c.speed.player_speed, 2.0);
        assert_eq!(c.rules.items_needed, 9);
        assert_eq!(c.rules.good_items, 15);
        assert_eq!(c.rules.bad_items, 5);
        assert_eq!(c.rules.spawn_tries_per_item, 500);
        assert_eq!(c.seed, 0);
        assert_eq!(c.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let c = parse("[rules]\nitems_needed = 3\n");
        assert_eq!(c.rules.items_needed, 3);
        assert_eq!(c.rules.good_items, 15);
        assert_eq!(c.speed.tick_rate_ms, 16);
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let c = parse("[speed]\ntick_rate_ms = 0\n");
        assert_eq!(c.speed.tick_rate_ms, 1);
    }

    #[test]
    fn seed_and_gamepad_are_read() {
        let c = parse("[general]\nseed = 42\n[gamepad]\nreset = [\"Y\"]\n");
        assert_eq!(c.seed, 42);
        assert_eq!(c.gamepad.reset, vec!["Y".to_string()]);
        assert_eq!(c.gamepad.confirm, default_confirm());
    }

    #[test]
    fn goal_above_good_item_target_is_unreachable() {
        assert!(parse("").rules.goal_reachable());
        assert!(parse("[rules]\nitems_needed = 15\n").rules.goal_reachable());
        assert!(!parse("[rules]\nitems_needed = 16\n").rules.goal_reachable());
        assert!(!parse("[rules]\ngood_items = 4\n").rules.goal_reachable());
    }

    #[test]
    fn bad_types_fail_to_parse() {
        assert!(toml::from_str::<TomlConfig>("[rules]\nitems_needed = \"many\"").is_err());
    }
}
