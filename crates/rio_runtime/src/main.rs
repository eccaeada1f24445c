//! Rio console runner
//!
//! Plays a river run without a window: the game ticks against a monotonic
//! clock, HUD changes and notices go to the log, and steering comes from
//! line commands on stdin.
//!
//! Run with: cargo run -p rio_runtime
//!       or: RIO_SEED=7 cargo run --bin rio -- --headless

mod config;
mod console;
mod error;
mod input;

use crate::config::RunConfig;
use crate::console::{Console, LogAudio};
use crate::error::Result;
use crate::input::{InputCommand, HELP};
use crossbeam_channel::Receiver;
use rio_game::{Game, GameContent, ScreenState, Services, Viewport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sleep between polls that produced no tick
const IDLE_SLEEP: Duration = Duration::from_millis(1);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = RunConfig::load()?;
    config.log_summary();

    let content = match &config.content {
        Some(path) => GameContent::from_path(path)?,
        None => GameContent::amazon()?,
    };

    let viewport = Viewport::new(config.game.viewport.width, config.game.viewport.height);
    let console = Console::new(viewport);
    let services = Services::new(Box::new(console.clone()), Box::new(console.clone()))
        .with_audio(Box::new(LogAudio));
    let mut game = Game::new(config.game.clone(), content, services)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;

    let commands = if config.interactive {
        log::info!("{}", HELP);
        Some(input::spawn_stdin_reader()?)
    } else {
        None
    };

    game.start()?;
    let ticks = run_loop(&mut game, &console, commands.as_ref(), &running, config.max_ticks);

    log_summary(&game, &console, ticks);
    game.destroy();
    Ok(())
}

fn run_loop(
    game: &mut Game,
    console: &Console,
    commands: Option<&Receiver<InputCommand>>,
    running: &AtomicBool,
    max_ticks: Option<u64>,
) -> u64 {
    let clock = Instant::now();
    let mut ticks = 0u64;
    let mut shown_node: Option<String> = None;

    while running.load(Ordering::SeqCst) && !game.is_over() {
        if let Some(commands) = commands {
            for command in commands.try_iter() {
                if !handle_command(game, console, command) {
                    running.store(false, Ordering::SeqCst);
                }
            }
        }

        show_dialogue(game, &mut shown_node);

        let now_ms = clock.elapsed().as_secs_f64() * 1000.0;
        match game.poll(now_ms) {
            Some(report) => {
                ticks += 1;
                if report.tick % u64::from(game.engine().config().target_fps.max(1)) == 0 {
                    log::debug!("{}", console.hud_line());
                }
                if max_ticks.is_some_and(|max| ticks >= max) {
                    log::info!("Tick limit reached");
                    break;
                }
            }
            None => std::thread::sleep(IDLE_SLEEP),
        }
    }
    ticks
}

/// Returns false to quit.
fn handle_command(game: &mut Game, console: &Console, command: InputCommand) -> bool {
    let in_dialogue = game.dialogue_node().is_some();
    match command {
        InputCommand::Steer { thrust, turn } => game.steer(thrust, turn),
        InputCommand::Choose(index) if in_dialogue => {
            if !game.advance_dialogue(Some(index)) {
                log::warn!("No answer {}", index + 1);
            }
        }
        InputCommand::Choose(index) => {
            game.choose_fork(index);
        }
        InputCommand::Continue if in_dialogue => {
            if !game.advance_dialogue(None) {
                log::info!("Pick an answer (1-{})", game.dialogue_choices().len());
            }
        }
        InputCommand::Continue => {
            game.close_overlay();
        }
        InputCommand::Pause => game.pause(),
        InputCommand::Resume => game.resume(),
        InputCommand::Status => {
            log::info!("{}", console.hud_line());
            log::info!("Screen: {:?}, entities on screen: {}", game.state().current(), console.visible_count());
        }
        InputCommand::Quit => return false,
    }
    true
}

/// Print the open dialogue node once each time it changes.
fn show_dialogue(game: &Game, shown: &mut Option<String>) {
    let Some(node) = game.dialogue_node() else {
        *shown = None;
        return;
    };
    if shown.as_deref() == Some(node.id.as_str()) {
        return;
    }
    *shown = Some(node.id.clone());

    log::info!("{}: \"{}\"", node.speaker, node.text);
    let choices = game.dialogue_choices();
    if choices.is_empty() {
        log::info!("  (c to continue)");
    }
    for (i, choice) in choices.iter().enumerate() {
        log::info!("  {}. {}", i + 1, choice.text);
    }
}

fn log_summary(game: &Game, console: &Console, ticks: u64) {
    let outcome = if game.is_journey_complete() {
        "journey complete"
    } else if game.is_game_over() {
        "canoe lost"
    } else if game.state().is_in(ScreenState::Paused) {
        "stopped while paused"
    } else {
        "stopped"
    };

    log::info!("=== Run Summary ===");
    log::info!("  Outcome: {}", outcome);
    log::info!("  Ticks: {} ({:.1}s game time)", ticks, game.game_time_ms() / 1000.0);
    log::info!("  Score: {}", game.score());
    if let Some(stats) = game.player_stats() {
        log::info!(
            "  Distance: {:.0}m, obstacles avoided: {}, best combo: {}",
            stats.distance,
            stats.obstacles_avoided,
            stats.max_combo
        );
    }
    let quests = game.quests().stats();
    log::info!("  Quests: {:?}", quests);
    let specimens = game.specimens().stats();
    log::info!(
        "  Specimens: {}/{}",
        specimens.discovered_specimens,
        specimens.total_specimens
    );
    log::info!("  Last location: {}", console.label(rio_game::TextLabel::Location).unwrap_or_default());
}
