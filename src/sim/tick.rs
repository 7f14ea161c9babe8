//! Per-frame simulation tick
//!
//! Input, fall, lock, pop, sticky gravity, pressure timer and goal marks, in
//! that order. Everything the tick changes is committed to `GameState` before
//! it returns, so listeners always see a settled grid.

use glam::IVec2;

use super::collision::{collides_at, get_ghost_y};
use super::complications::{
    ComplicationKind, PRESSURE_GAP_MAX, PRESSURE_GAP_MIN, lights_trigger_chance,
};
use super::events::{GameEvent, GameOverReason, RejectedAction};
use super::grid::{Cell, GroupId};
use super::groups::{
    assign_group, find_contiguous_group, find_same_color_region, get_floating_blocks,
    remove_group, settle_loose_goop,
};
use super::palette::get_palette_for_rank;
use super::scoring::{calculate_pop_score, calculate_pressure_recovery, is_fill_complete};
use super::state::{GamePhase, GameState, GoalMark};
use crate::consts::*;
use crate::coords::{Column, normalize_x};
use crate::upgrades::UpgradeId;

/// Upward nudges tried when a rotation collides
const ROTATION_KICKS: [f32; 2] = [0.0, -1.0];
/// Largest fall between collision checks (rows). A cell's row changes once
/// per row travelled, so half-row steps never skip one.
const FALL_SWEEP_STEP: f32 = 0.5;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Columns to spin the tank by (negative moves the piece left)
    pub shift: i32,
    /// Rotate the piece; `Some(true)` is clockwise
    pub rotate: Option<bool>,
    pub soft_drop: bool,
    pub hard_drop: bool,
    /// Pop the group at this grid cell
    pub pop_at: Option<IVec2>,
    /// Pause toggle
    pub pause: bool,
    /// Clear an active complication
    pub resolve: Option<ComplicationKind>,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                state.emit(GameEvent::Paused);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                state.emit(GameEvent::Resumed);
            }
            GamePhase::GameOver => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    let dt_ms = (dt.max(0.0) * 1000.0).round() as u64;
    state.time_ms += dt_ms;
    state.time_left_ms = state.time_left_ms.saturating_sub(dt_ms);
    if state.time_left_ms == 0 {
        state.end_game(GameOverReason::TimeUp);
        return;
    }

    if let Some(kind) = input.resolve {
        resolve_complication(state, kind);
    }

    if state.active_piece.is_none() && !state.spawn_piece() {
        return;
    }

    if input.shift != 0 {
        shift_board(state, input.shift);
    }
    if let Some(clockwise) = input.rotate {
        rotate_piece(state, clockwise);
    }

    if input.hard_drop {
        hard_drop(state);
    } else {
        fall(state, input.soft_drop, dt);
    }

    if let Some(target) = input.pop_at {
        try_pop(state, target);
    }

    update_goal_marks(state);
    update_complications(state, dt_ms, input.rotate.is_some());
}

/// Spin the tank one column at a time, stopping before the piece would collide
fn shift_board(state: &mut GameState, shift: i32) {
    let Some(piece) = state.active_piece.as_ref() else {
        return;
    };

    let step = shift.signum();
    let mut moved = 0;
    while moved != shift {
        let next = normalize_x(state.board_offset + moved + step);
        if collides_at(&state.grid, piece, next, piece.screen_x, piece.y) {
            break;
        }
        moved += step;
    }

    if moved != 0 {
        state.board_offset = normalize_x(state.board_offset + moved);
        state.emit(GameEvent::PieceMoved {
            board_offset: state.board_offset,
            delta: moved,
        });
    }
}

fn rotate_piece(state: &mut GameState, clockwise: bool) {
    if state.complications.is_active(ComplicationKind::Controls) {
        state.emit(GameEvent::ActionRejected {
            action: RejectedAction::Rotate,
        });
        return;
    }
    let Some(piece) = state.active_piece.as_ref() else {
        return;
    };
    state.complications.add_heat();

    let mut rotated = piece.rotated(clockwise);
    let base_y = rotated.y;
    let fits = ROTATION_KICKS.iter().any(|dy| {
        rotated.y = base_y + dy;
        !collides_at(&state.grid, &rotated, state.board_offset, rotated.screen_x, rotated.y)
    });

    if fits {
        let piece_id = rotated.id;
        state.active_piece = Some(rotated);
        state.emit(GameEvent::PieceRotated { piece_id, clockwise });
    } else {
        state.emit(GameEvent::ActionRejected {
            action: RejectedAction::Rotate,
        });
    }
}

fn hard_drop(state: &mut GameState) {
    let Some(piece) = state.active_piece.as_ref() else {
        return;
    };
    let landing = get_ghost_y(&state.grid, piece, state.board_offset);
    let rows = landing - piece.y.round() as i32;
    let piece_id = piece.id;

    state.emit(GameEvent::PieceDropped { piece_id, rows });
    lock_piece(state, landing);
}

fn fall(state: &mut GameState, soft_drop: bool, dt: f32) {
    let Some(piece) = state.active_piece.as_ref() else {
        return;
    };
    let speed = if soft_drop { SOFT_DROP_SPEED } else { FALL_SPEED };
    let next_y = piece.y + speed * dt.max(0.0);

    // Sweep so a long frame cannot carry the piece through goop
    let mut y = piece.y;
    let mut blocked = false;
    while y < next_y {
        let next = (y + FALL_SWEEP_STEP).min(next_y);
        if collides_at(&state.grid, piece, state.board_offset, piece.screen_x, next) {
            blocked = true;
            break;
        }
        y = next;
    }

    let Some(piece) = state.active_piece.as_mut() else {
        return;
    };
    piece.y = y;
    if blocked {
        let landing = get_ghost_y(&state.grid, piece, state.board_offset);
        lock_piece(state, landing);
    }
}

/// Turn the active piece into goop at row `landing`
fn lock_piece(state: &mut GameState, landing: i32) {
    let Some(piece) = state.active_piece.take() else {
        return;
    };
    let cells = piece.cells_at(state.board_offset, landing);

    if cells.iter().any(|(p, _)| p.y < 0) {
        state.end_game(GameOverReason::Blocked);
        return;
    }

    for &(p, color) in &cells {
        let id = state.next_entity_id();
        let group = GroupId(state.next_entity_id());
        state
            .grid
            .set(p.x, p.y, Some(Cell::new(id, group, color, p.y, state.time_ms)));
    }

    let positions: Vec<IVec2> = cells.iter().map(|(p, _)| *p).collect();
    let groups = regroup(state, &positions);

    if state.pops_since_lock == 0 {
        state.combo = 0;
    }
    state.pops_since_lock = 0;

    log::debug!("Locked piece {} into {} group(s)", piece.id, groups.len());
    state.emit(GameEvent::PieceLocked {
        piece_id: piece.id,
        cells: positions,
        groups,
    });
    roll_lights(state);
}

/// Lights may blow when the stack stands well above the pressure line
fn roll_lights(state: &mut GameState) {
    let kind = ComplicationKind::Lights;
    if !state.complications.can_trigger(kind, state.rank, state.time_ms) {
        return;
    }
    let Some(top) = state.grid.iter().map(|(p, _)| p.y).min() else {
        return;
    };
    let span = (PRESSURE_GAP_MAX - PRESSURE_GAP_MIN + 1) as usize;
    let gap = PRESSURE_GAP_MIN + state.random_index(span) as i32;
    if state.pressure_line() - (top as f32) < gap as f32 {
        return;
    }
    let chance = lights_trigger_chance(state.upgrade_effect(UpgradeId::CircuitStabilizer));
    if state.random_chance(chance) {
        state.try_start_complication(kind);
    }
}

fn resolve_complication(state: &mut GameState, kind: ComplicationKind) {
    if state.complications.resolve(kind, state.rank, state.time_ms) {
        log::info!("Complication resolved: {kind:?}");
        state.emit(GameEvent::ComplicationResolved { kind });
    } else {
        state.emit(GameEvent::ActionRejected {
            action: RejectedAction::Resolve,
        });
    }
}

/// Cool the controls while idle and start any complication whose meter tripped
fn update_complications(state: &mut GameState, dt_ms: u64, rotated: bool) {
    if !rotated {
        let bonus = state.upgrade_effect(UpgradeId::HeatSink);
        state.complications.cool(dt_ms, bonus);
    }
    for kind in state.complications.tripped() {
        state.try_start_complication(kind);
    }
}

/// Merge every same-colored region touching `seeds` into a single fresh group
fn regroup(state: &mut GameState, seeds: &[IVec2]) -> Vec<GroupId> {
    let mut done: Vec<IVec2> = Vec::new();
    let mut groups = Vec::new();

    for seed in seeds {
        let seed = IVec2::new(normalize_x(seed.x), seed.y);
        if done.contains(&seed) {
            continue;
        }
        let region = find_same_color_region(&state.grid, seed.x, seed.y);
        if region.is_empty() {
            continue;
        }
        let group = GroupId(state.next_entity_id());
        assign_group(&mut state.grid, &region, group, state.time_ms);
        done.extend(region);
        groups.push(group);
    }
    groups
}

/// Pop the group under `target` if it is filled and submerged by pressure
fn try_pop(state: &mut GameState, target: IVec2) {
    if state.complications.is_active(ComplicationKind::Laser) {
        state.emit(GameEvent::ActionRejected {
            action: RejectedAction::Pop,
        });
        return;
    }
    let Some(cell) = state.grid.get(target.x, target.y).cloned() else {
        state.emit(GameEvent::ActionRejected {
            action: RejectedAction::Pop,
        });
        return;
    };

    let group = find_contiguous_group(&state.grid, target.x, target.y);
    let line = state.pressure_line();
    let submerged = group.iter().any(|p| p.y as f32 >= line);
    if !is_fill_complete(&cell, state.time_ms) || !submerged {
        state.emit(GameEvent::ActionRejected {
            action: RejectedAction::Pop,
        });
        return;
    }

    let score = calculate_pop_score(&state.grid, &group, state.board_offset, state.combo);
    remove_group(&mut state.grid, target.x, target.y);

    let count = group.len() as u32;
    state.combo += 1;
    state.pops_since_lock += 1;
    state.score += score;
    state.time_left_ms =
        (state.time_left_ms + calculate_pressure_recovery(count)).min(state.initial_time_ms);
    let efficiency = state.upgrade_effect(UpgradeId::CapacitorEfficiency);
    state.complications.drain_capacitor(count, efficiency);

    log::info!("Popped {count} goop for {score} (combo {})", state.combo);
    state.emit(GameEvent::GoopPopped {
        group_id: cell.group_id,
        combo: state.combo,
        count,
        score,
    });

    capture_goals(state, &cell, &group);
    apply_sticky_gravity(state);
}

/// Seal every mark of the popped color that the group covered or touched
fn capture_goals(state: &mut GameState, popped: &Cell, group: &[IVec2]) {
    let touches = |mark: &GoalMark| {
        let m = mark.position();
        group.iter().any(|p| {
            let dx = Column::new(p.x).signed_distance(Column::new(m.x)).abs();
            dx + (p.y - m.y).abs() <= 1
        })
    };

    let before = state.goal_marks.len();
    state
        .goal_marks
        .retain(|m| !(m.color == popped.color && touches(m)));
    let captured = (before - state.goal_marks.len()) as u32;

    if captured > 0 {
        state.goals_captured += captured;
        log::info!("Sealed {captured} crack(s)");
        state.emit(GameEvent::GoalCaptured { count: captured });
    }
}

/// Drop unsupported groups as rigid units until everything rests
fn apply_sticky_gravity(state: &mut GameState) {
    let mut settled = 0;
    loop {
        let floating = get_floating_blocks(&state.grid);
        if floating.loose_goop.is_empty() {
            break;
        }
        state.grid = floating.grid;
        let landed = settle_loose_goop(&mut state.grid, floating.loose_goop);
        settled += landed.len() as u32;
        regroup(state, &landed);
    }

    if settled > 0 {
        state.emit(GameEvent::LooseGoopSettled { count: settled });
    }
}

/// Spawn a crack on an empty visible cell every interval
fn update_goal_marks(state: &mut GameState) {
    if state.goal_marks.len() >= MAX_GOAL_MARKS
        || state.time_ms < state.last_goal_spawn_ms + GOAL_SPAWN_INTERVAL_MS
    {
        return;
    }
    state.last_goal_spawn_ms = state.time_ms;

    let mut candidates = Vec::new();
    for y in BUFFER_HEIGHT..TOTAL_HEIGHT {
        for sx in 0..VISIBLE_WIDTH {
            let x = normalize_x(state.board_offset + sx);
            let taken = state.goal_marks.iter().any(|m| m.x == x && m.y == y);
            if !taken && !state.grid.is_occupied(x, y) {
                candidates.push(IVec2::new(x, y));
            }
        }
    }
    if candidates.is_empty() {
        return;
    }

    let position = candidates[state.random_index(candidates.len())];
    let palette = get_palette_for_rank(state.rank);
    let color = palette[state.random_index(palette.len())];
    let id = state.next_entity_id();

    state.goal_marks.push(GoalMark {
        id,
        x: position.x,
        y: position.y,
        color,
        spawned_at_ms: state.time_ms,
    });
    state.emit(GameEvent::GoalSpawned {
        goal_id: id,
        position,
        color,
    });
}
