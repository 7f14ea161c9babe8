//! Pop scoring and pressure recovery

use glam::IVec2;

use super::grid::{Cell, Grid};
use crate::consts::*;
use crate::coords::{get_screen_x, is_in_visible_range, neighbors};

/// Points per popped cell before bonuses
pub const BASE_CELL_SCORE: u64 = 10;
/// Points per row above the floor
pub const HEIGHT_BONUS_PER_ROW: u64 = 10;
/// Flat bonus for popping goop outside the viewport
pub const OFF_SCREEN_BONUS: u64 = 50;
/// Bonus per neighbouring cell of another group
pub const ADJACENCY_BONUS: u64 = 5;
/// Multiplier gained per combo step
pub const COMBO_STEP: f32 = 0.1;

/// Bonus for popping at row `y`; higher rows score more
pub fn calculate_height_bonus(y: i32) -> u64 {
    (TOTAL_HEIGHT - 1 - y).max(0) as u64 * HEIGHT_BONUS_PER_ROW
}

/// `OFF_SCREEN_BONUS` if column `x` is outside the viewport at `board_offset`
pub fn calculate_off_screen_bonus(x: i32, board_offset: i32) -> u64 {
    if is_in_visible_range(get_screen_x(x, board_offset)) {
        0
    } else {
        OFF_SCREEN_BONUS
    }
}

pub fn calculate_multiplier(combo: u32) -> f32 {
    1.0 + COMBO_STEP * combo as f32
}

/// Bonus for every 4-neighbour of the group that belongs to a different group
pub fn calculate_adjacency_bonus(grid: &Grid, group_cells: &[IVec2]) -> u64 {
    let Some(own) = group_cells
        .first()
        .and_then(|p| grid.get(p.x, p.y))
        .map(|c| c.group_id)
    else {
        return 0;
    };

    let foreign = group_cells
        .iter()
        .flat_map(|p| neighbors(p.x, p.y))
        .filter(|n| grid.get(n.x, n.y).is_some_and(|c| c.group_id != own))
        .count() as u64;
    foreign * ADJACENCY_BONUS
}

/// Score for popping `group_cells` (still present in `grid`) at the given combo
pub fn calculate_pop_score(grid: &Grid, group_cells: &[IVec2], board_offset: i32, combo: u32) -> u64 {
    let cell_points: u64 = group_cells
        .iter()
        .map(|p| BASE_CELL_SCORE + calculate_height_bonus(p.y) + calculate_off_screen_bonus(p.x, board_offset))
        .sum();
    let raw = cell_points + calculate_adjacency_bonus(grid, group_cells);
    (raw as f32 * calculate_multiplier(combo)).round() as u64
}

/// Time returned to the pressure timer for popping `units` cells at once.
///
/// Large pops earn tier bonuses on top of the per-unit recovery: the first tier at
/// `PRESSURE_TIER_THRESHOLD` units, then one more every `PRESSURE_TIER_STEP`.
pub fn calculate_pressure_recovery(units: u32) -> u64 {
    let tiers = if units >= PRESSURE_TIER_THRESHOLD {
        1 + (units - PRESSURE_TIER_THRESHOLD) / PRESSURE_TIER_STEP
    } else {
        0
    };
    units as u64 * PRESSURE_RECOVERY_PER_UNIT_MS + tiers as u64 * PRESSURE_TIER_BONUS_MS
}

/// Row of the pressure surface. Cells at or below it are submerged.
///
/// Rises from the floor to the top of the viewport as the timer drains.
pub fn pressure_line(time_left_ms: u64, initial_time_ms: u64) -> f32 {
    let ratio = if initial_time_ms == 0 {
        1.0
    } else {
        1.0 - (time_left_ms.min(initial_time_ms) as f32 / initial_time_ms as f32)
    };
    TOTAL_HEIGHT as f32 - ratio * VISIBLE_HEIGHT as f32
}

/// Has the group's fill animation finished at game time `now_ms`?
pub fn is_fill_complete(cell: &Cell, now_ms: u64) -> bool {
    now_ms.saturating_sub(cell.timestamp_ms) >= PER_BLOCK_DURATION_MS * cell.group_size as u64
}
