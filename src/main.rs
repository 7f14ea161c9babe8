//! Goop Tank headless runner
//!
//! Plays one scripted run against the simulation and the soft-body layer and
//! logs what happens.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use glam::IVec2;

use goop_tank::render;
use goop_tank::sim::scoring::is_fill_complete;
use goop_tank::sim::{ComplicationKind, GameEvent, GameState};
use goop_tank::{GameEngine, Settings, SettingsError, SoftBodyWorld, TickInput};

const DT: f32 = 1.0 / 60.0;
const DROP_EVERY: u32 = 45;
const POP_EVERY: u32 = 20;

/// Headless goop-tank run driven by a simple bot.
#[derive(Debug, Parser)]
#[command(name = "goop-tank", version, about)]
struct Args {
    /// Settings file (JSON). Defaults are used when it does not exist.
    #[arg(short, long, value_name = "FILE", default_value = "goop-tank.json")]
    settings: PathBuf,

    /// Run seed; overrides the settings file. Random when neither sets one.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Safety cap on run length
    #[arg(long, value_name = "N", default_value = "10800")]
    max_ticks: u32,

    /// Outline samples per perimeter segment in the final snapshot
    #[arg(long, value_name = "N", default_value = "4")]
    samples: usize,
}

fn main() -> Result<(), SettingsError> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Goop Tank (headless) starting...");

    let settings = Settings::load(&args.settings)?;
    let seed = args.seed.or(settings.seed).unwrap_or_else(clock_seed);

    let mut engine = GameEngine::with_total_score(seed, settings.starting_score);
    engine.state.upgrades = settings.upgrades.clone();
    let mut world = SoftBodyWorld::new(settings.physics, settings.physics_bounds());
    world.enabled = settings.soft_bodies;

    let mut ticks = 0;
    while !engine.is_game_over() && ticks < args.max_ticks {
        let input = scripted_input(&engine.state, ticks);
        for event in engine.step(&input, DT) {
            log_event(&event);
            world.handle_event(&event, &engine.state);
        }
        world.follow_piece(&engine.state);
        world.step(DT);
        ticks += 1;
    }

    let blobs = render::snapshot(&world, args.samples);
    let vertices: usize = blobs.iter().map(|b| b.outline.len()).sum();
    log::info!("{} blobs on screen ({vertices} outline vertices)", blobs.len());

    let rank = engine.rank_details();
    log::info!(
        "Run finished after {ticks} ticks: score={}, rank={} ({}/{})",
        engine.state.score,
        rank.rank,
        rank.progress,
        rank.to_next_rank
    );
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Spin a little, hard drop on a timer, pop the biggest ready goop and fix
/// whatever breaks straight away
fn scripted_input(state: &GameState, ticks: u32) -> TickInput {
    let mut input = TickInput::default();
    if ticks % DROP_EVERY == DROP_EVERY - 1 {
        input.shift = (ticks / DROP_EVERY % 5) as i32 - 2;
        input.hard_drop = true;
    }
    if ticks % POP_EVERY == 0 {
        input.pop_at = ready_goop(state);
    }
    input.resolve = ComplicationKind::ALL
        .into_iter()
        .find(|k| state.complications.is_active(*k));
    input
}

fn ready_goop(state: &GameState) -> Option<IVec2> {
    let line = state.pressure_line();
    state
        .grid
        .iter()
        .filter(|(pos, cell)| pos.y as f32 >= line && is_fill_complete(cell, state.time_ms))
        .max_by_key(|(pos, cell)| (cell.group_size, pos.y))
        .map(|(pos, _)| pos)
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::GoopPopped { .. }
        | GameEvent::GoalCaptured { .. }
        | GameEvent::ComplicationSpawned { .. }
        | GameEvent::ComplicationResolved { .. }
        | GameEvent::GameOver { .. } => log::info!("{event:?}"),
        GameEvent::ActionRejected { .. } => log::trace!("{event:?}"),
        _ => log::debug!("{event:?}"),
    }
}
