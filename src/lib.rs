//! Goop Tank - falling goop puzzle inside a spinning cylindrical tank
//!
//! Core modules:
//! - `coords`: Cylindrical column arithmetic and viewport transforms
//! - `sim`: Deterministic grid simulation (collision, groups, gravity, scoring, tick)
//! - `softbody`: Verlet soft-body blobs that visualise goop groups
//! - `progression`: Rank / XP curve
//! - `upgrades`: Passive upgrades against tank complications
//! - `render`: Render-facing blob snapshots
//! - `settings`: JSON configuration

pub mod coords;
pub mod progression;
pub mod render;
pub mod settings;
pub mod sim;
pub mod softbody;
pub mod upgrades;

pub use coords::{Column, get_grid_x, get_screen_x, normalize_x};
pub use progression::{RankDetails, calculate_rank_details};
pub use settings::{Settings, SettingsError};
pub use sim::{GameEngine, GameEvent, GameState, TickInput};
pub use softbody::{PhysicsParams, SoftBodyWorld};

/// Game configuration constants
pub mod consts {
    /// Columns visible in the viewport at once
    pub const VISIBLE_WIDTH: i32 = 12;
    /// Cylindrical circumference in columns
    pub const TOTAL_WIDTH: i32 = 30;
    /// Rows visible in the viewport
    pub const VISIBLE_HEIGHT: i32 = 16;
    /// Total rows, including the spawn buffer at the top
    pub const TOTAL_HEIGHT: i32 = 19;
    /// Off-viewport spawn rows
    pub const BUFFER_HEIGHT: i32 = TOTAL_HEIGHT - VISIBLE_HEIGHT;

    /// Fill time per cell of a locked group (ms)
    pub const PER_BLOCK_DURATION_MS: u64 = 375;

    /// Starting pressure timer (ms)
    pub const INITIAL_TIME_MS: u64 = 60 * 1000;
    /// Time recovered per popped unit (ms)
    pub const PRESSURE_RECOVERY_PER_UNIT_MS: u64 = 100;
    /// Group size at which the first recovery tier starts
    pub const PRESSURE_TIER_THRESHOLD: u32 = 15;
    /// Extra units needed per additional tier
    pub const PRESSURE_TIER_STEP: u32 = 10;
    /// Bonus per tier (ms)
    pub const PRESSURE_TIER_BONUS_MS: u64 = 250;

    /// Base fall speed (rows per second)
    pub const FALL_SPEED: f32 = 1.5;
    /// Soft-drop fall speed (rows per second)
    pub const SOFT_DROP_SPEED: f32 = 18.0;

    /// Goal mark spawn interval (ms)
    pub const GOAL_SPAWN_INTERVAL_MS: u64 = 12 * 1000;
    /// Maximum simultaneous goal marks
    pub const MAX_GOAL_MARKS: usize = 3;

    /// Size of one grid cell in pixels (viewport and soft-body space)
    pub const CELL_SIZE: f32 = 30.0;
    /// Upper bound on a physics frame (seconds)
    pub const MAX_PHYSICS_DT: f32 = 0.033;
}
