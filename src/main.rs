/// Entry point and game loop.

mod assets;
mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, terminal,
};

use assets::AssetBundle;
use config::GameConfig;
use error::AssetError;
use sim::event::GameEvent;
use sim::level::load_levels;
use sim::step;
use sim::world::WorldState;
use ui::art::Art;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{SoundEngine, Sfx};

const FRAME_SLEEP: Duration = Duration::from_millis(2);
const LOG_FILE: &str = "dungeon-escape.log";

fn main() {
    init_logging();
    log::info!("dungeon-escape {} starting", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load();

    let (mut world, art) = match load_game(&config) {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("asset load failed: {e}");
            eprintln!("Could not load game assets: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        log::error!("terminal init failed: {e}");
        eprintln!("Terminal init failed: {e}");
        let _ = renderer.cleanup();
        std::process::exit(1);
    }

    let honor_release = enable_key_release();
    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &art, &mut renderer, sound.as_ref(), &config, honor_release);

    if honor_release {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
        std::process::exit(1);
    }

    log::info!("exit after {} ticks", world.tick);
    println!("Thanks for playing Dungeon Escape!");
}

/// Logs go to a file: the terminal belongs to the game.
fn init_logging() {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    );
    match std::fs::File::create(LOG_FILE) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("cannot create {LOG_FILE} ({e}); logging to stderr");
            builder.target(env_logger::Target::Stderr);
        }
    }
    builder.init();
}

/// Resolve assets once, parse levels and sprites, and set up level 1.
fn load_game(config: &GameConfig) -> Result<(WorldState, Art), AssetError> {
    let bundle = AssetBundle::embedded().with_level_overrides(&config.levels_dir);
    let levels = load_levels(&bundle)?;
    let (art, pools) = Art::load(&bundle)?;

    let mut world = WorldState::new(levels, pools, config);
    step::setup_level(&mut world, 1);
    Ok((world, art))
}

/// Ask the terminal for key release events. Without them, held keys
/// expire on a timeout instead.
fn enable_key_release() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        log::info!("keyboard enhancement unsupported; using hold timeout");
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    art: &Art,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> io::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let mut last_tick = Instant::now();

    renderer.render(world, art)?;

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_requested() {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            let mut input = kb.take_frame_input();
            gp.merge_into(&mut input);

            let events = step::step(world, input);
            process_events(sound, &events);

            last_tick = Instant::now();
            renderer.render(world, art)?;
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        log::debug!("event: {event:?}");
        if let (Some(sfx), Some(effect)) = (sound, Sfx::for_event(event)) {
            sfx.play(effect);
        }
    }
}
