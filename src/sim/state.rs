//! Game state and core simulation types
//!
//! Everything needed to replay a run deterministically lives here.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{check_collision, get_ghost_y};
use super::complications::{ComplicationKind, Complications};
use super::events::{GameEvent, GameOverReason};
use super::grid::Grid;
use super::palette::{GoopColor, get_palette_for_rank, multi_color_unlocked};
use super::piece::{ActivePiece, PieceDefinition, PieceShape};
use super::scoring::pressure_line;
use crate::consts::*;
use crate::progression::{RankDetails, calculate_rank_details};
use crate::upgrades::{UpgradeId, UpgradeLevels, upgrade_effect};

/// Screen column pieces spawn at (centre of the viewport)
pub const SPAWN_SCREEN_X: f32 = (VISIBLE_WIDTH / 2) as f32;
/// Spawn row, inside the buffer above the viewport
pub const SPAWN_Y: f32 = 1.0;
/// Chance that a piece carries two colors once they are unlocked
pub const MULTI_COLOR_CHANCE: f32 = 0.25;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Run ended
    GameOver,
}

/// A crack in the tank wall that wants goop of one color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalMark {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub color: GoopColor,
    pub spawned_at_ms: u64,
}

impl GoalMark {
    pub fn position(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    /// Number of draws taken so far
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Generator for the next draw; advances the stream
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::seed_from_u64(self.seed ^ self.stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.stream += 1;
        rng
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub grid: Grid,
    pub active_piece: Option<ActivePiece>,
    /// Leftmost visible tank column
    pub board_offset: i32,
    /// Score earned this run
    pub score: u64,
    /// Cumulative score from earlier runs; drives rank
    pub total_score: u64,
    /// Rank at the start of the run (palette gate)
    pub rank: u32,
    pub combo: u32,
    /// Pops since the last lock
    pub pops_since_lock: u32,
    /// Game time elapsed (ms)
    pub time_ms: u64,
    /// Pressure timer (ms)
    pub time_left_ms: u64,
    pub initial_time_ms: u64,
    pub phase: GamePhase,
    pub goal_marks: Vec<GoalMark>,
    pub goals_captured: u32,
    pub last_goal_spawn_ms: u64,
    pub complications: Complications,
    /// Purchased upgrade levels carried into the run
    pub upgrades: UpgradeLevels,
    /// Events produced since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64) -> Self {
        Self::with_total_score(seed, 0)
    }

    /// New run for a player who has already banked `total_score`
    pub fn with_total_score(seed: u64, total_score: u64) -> Self {
        let rank = calculate_rank_details(total_score).rank;
        log::info!("New run: seed={seed}, rank={rank}");
        Self {
            seed,
            rng_state: RngState::new(seed),
            grid: Grid::new(),
            active_piece: None,
            board_offset: 0,
            score: 0,
            total_score,
            rank,
            combo: 0,
            pops_since_lock: 0,
            time_ms: 0,
            time_left_ms: INITIAL_TIME_MS,
            initial_time_ms: INITIAL_TIME_MS,
            phase: GamePhase::Playing,
            goal_marks: Vec::new(),
            goals_captured: 0,
            last_goal_spawn_ms: 0,
            complications: Complications::default(),
            upgrades: UpgradeLevels::new(),
            events: vec![GameEvent::GameStarted { seed }],
            next_id: 1,
        }
    }

    /// Allocate a new entity ID (cells, groups, pieces and marks share the counter)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Uniform index in `0..len`; `len` must be non-zero
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng_state.next_rng().random_range(0..len)
    }

    pub fn random_chance(&mut self, p: f32) -> bool {
        self.rng_state.next_rng().random::<f32>() < p
    }

    pub fn random_color(&mut self) -> GoopColor {
        let palette = get_palette_for_rank(self.rank);
        palette[self.random_index(palette.len())]
    }

    /// Draw the next piece definition from the rank's palette
    pub fn roll_piece(&mut self) -> PieceDefinition {
        let shape = PieceShape::ALL[self.random_index(PieceShape::ALL.len())];
        let mut definition = PieceDefinition::new(shape, self.random_color());

        if multi_color_unlocked(self.rank) && self.random_chance(MULTI_COLOR_CHANCE) {
            let others: Vec<GoopColor> = get_palette_for_rank(self.rank)
                .into_iter()
                .filter(|c| *c != definition.color)
                .collect();
            if !others.is_empty() {
                definition.secondary = Some(others[self.random_index(others.len())]);
            }
        }
        definition
    }

    /// Put a fresh piece at the spawn point. Ends the run if it is blocked.
    pub fn spawn_piece(&mut self) -> bool {
        let id = self.next_entity_id();
        let definition = self.roll_piece();
        let piece = ActivePiece::new(id, definition, SPAWN_SCREEN_X, SPAWN_Y);

        if check_collision(&self.grid, &piece, self.board_offset) {
            self.end_game(GameOverReason::Blocked);
            return false;
        }

        log::debug!("Spawned piece {id}: {:?} {:?}", definition.shape, definition.color);
        self.emit(GameEvent::PieceSpawned {
            piece_id: id,
            shape: definition.shape,
            color: definition.color,
        });
        self.active_piece = Some(piece);
        true
    }

    pub fn end_game(&mut self, reason: GameOverReason) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        log::info!("Game over ({reason:?}): score={}", self.score);
        self.phase = GamePhase::GameOver;
        self.active_piece = None;
        self.emit(GameEvent::GameOver {
            reason,
            score: self.score,
        });
    }

    pub fn upgrade_effect(&self, id: UpgradeId) -> f32 {
        upgrade_effect(&self.upgrades, id)
    }

    /// Start `kind` if it is unlocked, idle and off cooldown
    pub fn try_start_complication(&mut self, kind: ComplicationKind) -> bool {
        if !self.complications.can_trigger(kind, self.rank, self.time_ms) {
            return false;
        }
        log::info!("Complication started: {kind:?}");
        self.complications.start(kind);
        self.emit(GameEvent::ComplicationSpawned { kind });
        true
    }

    /// Landing row of the active piece
    pub fn ghost_y(&self) -> Option<i32> {
        self.active_piece
            .as_ref()
            .map(|p| get_ghost_y(&self.grid, p, self.board_offset))
    }

    /// Current pressure surface row
    pub fn pressure_line(&self) -> f32 {
        pressure_line(self.time_left_ms, self.initial_time_ms)
    }

    /// Rank standing including this run's score
    pub fn rank_details(&self) -> RankDetails {
        calculate_rank_details(self.total_score + self.score)
    }
}
