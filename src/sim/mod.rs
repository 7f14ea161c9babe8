//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (row-major grid scans)
//! - No rendering or platform dependencies

pub mod collision;
pub mod complications;
pub mod engine;
pub mod events;
pub mod grid;
pub mod groups;
pub mod palette;
pub mod piece;
pub mod scoring;
pub mod state;
pub mod tick;

pub use collision::{check_collision, collides_at, get_ghost_y};
pub use complications::{ComplicationKind, Complications};
pub use engine::GameEngine;
pub use events::{EventBus, GameEvent, GameOverReason, ListenerId, RejectedAction};
pub use grid::{Cell, Grid, GroupId};
pub use groups::{
    FloatingBlocks, LooseGoop, find_contiguous_group, find_same_color_region,
    get_floating_blocks, settle_loose_goop,
};
pub use palette::{GoopColor, get_palette_for_rank};
pub use piece::{ActivePiece, PieceDefinition, PieceShape, get_rotated_cells};
pub use scoring::{
    calculate_adjacency_bonus, calculate_height_bonus, calculate_multiplier,
    calculate_off_screen_bonus, calculate_pop_score, calculate_pressure_recovery,
};
pub use state::{GamePhase, GameState, GoalMark};
pub use tick::{TickInput, tick};
