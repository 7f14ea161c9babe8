//! Soft-body world: owns every blob and advances them with `step(dt)`
//!
//! Blobs follow the grid, never the other way round. The world reads the
//! committed `GameState` after each game tick and creates, locks or drops blobs
//! to match.

use std::collections::BTreeMap;

use glam::{IVec2, Vec2};

use super::factory::{create_blob_from_cells, create_piece_blob, piece_origin};
use super::physics::{apply_attraction_springs, apply_outward_impulse, step_physics, update_attraction_springs};
use super::types::{AttractionSpring, BlobId, Bounds, PhysicsParams, SoftBlob};
use crate::consts::{CELL_SIZE, MAX_PHYSICS_DT, TOTAL_WIDTH};
use crate::coords::Column;
use crate::sim::{GameEvent, GameState, GoopColor, Grid};

/// Fill progress per second for locked blobs
pub const FILL_RATE: f32 = 0.5;
/// Strength of the ready-to-pop pulse (pixels)
pub const PULSE_AMPLITUDE: f32 = 4.0;

/// Advance a locked blob's fill; true on the one tick the fill completes
pub fn advance_fill(blob: &mut SoftBlob, dt: f32) -> bool {
    if !blob.is_locked || blob.fill_amount >= 1.0 {
        return false;
    }
    blob.fill_amount = (blob.fill_amount + FILL_RATE * dt).min(1.0);
    let full = blob.fill_amount >= 1.0;
    let pulse = full && !blob.was_full;
    blob.was_full = full;
    pulse
}

#[derive(Debug, Clone)]
pub struct SoftBodyWorld {
    pub blobs: Vec<SoftBlob>,
    /// Merge tendrils from the last step
    pub attraction_springs: Vec<AttractionSpring>,
    pub params: PhysicsParams,
    pub bounds: Bounds,
    pub enabled: bool,
    /// Blob of the falling piece, if any
    falling: Option<BlobId>,
}

impl Default for SoftBodyWorld {
    fn default() -> Self {
        Self::new(PhysicsParams::default(), Bounds::default())
    }
}

impl SoftBodyWorld {
    pub fn new(params: PhysicsParams, bounds: Bounds) -> Self {
        Self {
            blobs: Vec::new(),
            attraction_springs: Vec::new(),
            params,
            bounds,
            enabled: true,
            falling: None,
        }
    }

    /// Add a blob over `cells`, replacing any blob with the same id
    pub fn create_blob(
        &mut self,
        cells: &[IVec2],
        color: GoopColor,
        id: BlobId,
        is_locked: bool,
        board_offset: i32,
    ) -> &SoftBlob {
        self.remove_blob(id);
        self.blobs
            .push(create_blob_from_cells(id, color, cells, board_offset, is_locked));
        &self.blobs[self.blobs.len() - 1]
    }

    pub fn remove_blob(&mut self, id: BlobId) -> bool {
        let before = self.blobs.len();
        self.blobs.retain(|b| b.id != id);
        if self.falling == Some(id) {
            self.falling = None;
        }
        self.blobs.len() != before
    }

    pub fn get_blob(&self, id: BlobId) -> Option<&SoftBlob> {
        self.blobs.iter().find(|b| b.id == id)
    }

    fn get_blob_mut(&mut self, id: BlobId) -> Option<&mut SoftBlob> {
        self.blobs.iter_mut().find(|b| b.id == id)
    }

    pub fn update_blob_target(&mut self, id: BlobId, target: Vec2) {
        if let Some(blob) = self.get_blob_mut(id) {
            blob.target = target;
        }
    }

    /// Falling -> locked; restarts the fill animation
    pub fn lock_blob(&mut self, id: BlobId) {
        if let Some(blob) = self.get_blob_mut(id) {
            blob.is_locked = true;
            blob.fill_amount = 0.0;
            blob.was_full = false;
        }
    }

    pub fn clear(&mut self) {
        self.blobs.clear();
        self.attraction_springs.clear();
        self.falling = None;
    }

    pub fn falling_blob(&self) -> Option<&SoftBlob> {
        self.falling.and_then(|id| self.get_blob(id))
    }

    /// One physics frame. `dt` is clamped to `MAX_PHYSICS_DT`.
    pub fn step(&mut self, dt: f32) {
        if !self.enabled || self.blobs.is_empty() {
            return;
        }
        let dt = dt.clamp(0.0, MAX_PHYSICS_DT);

        self.recenter_blobs();
        step_physics(&mut self.blobs, dt, &self.params, &self.bounds);

        for blob in &mut self.blobs {
            if advance_fill(blob, dt) {
                log::debug!("Blob {} ready to pop", blob.id);
                apply_outward_impulse(blob, PULSE_AMPLITUDE);
            }
        }

        self.attraction_springs = update_attraction_springs(&self.blobs, &self.params);
        apply_attraction_springs(&mut self.blobs, &self.attraction_springs, &self.params);
    }

    /// Move whole blobs by whole circumferences when any vertex leaves the
    /// bounds, bringing the blob's midpoint nearest the bounds centre.
    /// Individual vertices are never wrapped.
    fn recenter_blobs(&mut self) {
        let circumference = TOTAL_WIDTH as f32 * CELL_SIZE;
        let center_x = self.bounds.center().x;
        for blob in &mut self.blobs {
            let Some((lo, hi)) = blob.aabb() else {
                continue;
            };
            if lo.x >= self.bounds.min.x && hi.x <= self.bounds.max.x {
                continue;
            }
            let mid = (lo.x + hi.x) / 2.0;
            let turns = ((center_x - mid) / circumference).round();
            if turns != 0.0 {
                blob.translate(Vec2::new(turns * circumference, 0.0));
            }
        }
    }

    /// Shift blobs when the tank turns. Rotating right moves goop left.
    pub fn shift_for_rotation(&mut self, new_rotation: i32) {
        for blob in &mut self.blobs {
            let delta = Column::new(blob.created_at_rotation).signed_distance(Column::new(new_rotation));
            if delta != 0 {
                blob.translate(Vec2::new(-(delta as f32) * CELL_SIZE, 0.0));
            }
            blob.created_at_rotation = new_rotation;
        }
    }

    /// Make the locked blobs match the grid's groups.
    ///
    /// Blobs whose group vanished are dropped and new groups get a fresh locked
    /// blob. Group ids are never reused, so an existing id means unchanged cells.
    pub fn sync_groups(&mut self, grid: &Grid, board_offset: i32) {
        let mut groups: BTreeMap<u32, (GoopColor, Vec<IVec2>)> = BTreeMap::new();
        for (pos, cell) in grid.iter() {
            groups
                .entry(cell.group_id.0)
                .or_insert_with(|| (cell.color, Vec::new()))
                .1
                .push(pos);
        }

        let falling = self.falling;
        self.blobs
            .retain(|b| Some(b.id) == falling || groups.contains_key(&b.id));

        for (id, (color, cells)) in groups {
            if self.get_blob(id).is_none() {
                self.create_blob(&cells, color, id, true, board_offset);
            }
        }
    }

    /// Keep the falling blob on the active piece
    pub fn follow_piece(&mut self, state: &GameState) {
        let Some(piece) = state.active_piece.as_ref() else {
            if let Some(id) = self.falling.take() {
                self.remove_blob(id);
            }
            return;
        };

        if self.falling != Some(piece.id) {
            if let Some(id) = self.falling.take() {
                self.remove_blob(id);
            }
            self.blobs.push(create_piece_blob(piece, state.board_offset));
            self.falling = Some(piece.id);
            return;
        }

        let origin = piece_origin(piece);
        let center = piece
            .cells
            .iter()
            .map(|c| origin + (c.as_vec2() + Vec2::splat(0.5)) * CELL_SIZE)
            .sum::<Vec2>()
            / piece.cells.len().max(1) as f32;
        self.update_blob_target(piece.id, center);
    }

    /// Turn the falling blob's rest shape a quarter about its centre
    fn rotate_falling(&mut self, clockwise: bool) {
        let Some(id) = self.falling else {
            return;
        };
        let Some(blob) = self.get_blob_mut(id) else {
            return;
        };
        let turn = |o: Vec2| {
            if clockwise {
                Vec2::new(-o.y, o.x)
            } else {
                Vec2::new(o.y, -o.x)
            }
        };
        for v in blob.vertices.iter_mut().chain(blob.inner_vertices.iter_mut()) {
            v.home_offset = turn(v.home_offset);
        }
    }

    /// React to a game event. Call after the tick that produced it.
    pub fn handle_event(&mut self, event: &GameEvent, state: &GameState) {
        match event {
            GameEvent::PieceSpawned { .. } => self.follow_piece(state),
            GameEvent::PieceMoved { board_offset, .. } => self.shift_for_rotation(*board_offset),
            GameEvent::PieceRotated { clockwise, .. } => self.rotate_falling(*clockwise),
            GameEvent::PieceLocked { piece_id, .. } => {
                self.remove_blob(*piece_id);
                self.sync_groups(&state.grid, state.board_offset);
            }
            GameEvent::GoopPopped { .. } | GameEvent::LooseGoopSettled { .. } => {
                self.sync_groups(&state.grid, state.board_offset);
            }
            GameEvent::GameOver { .. } => {
                if let Some(id) = self.falling.take() {
                    self.remove_blob(id);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TOTAL_HEIGHT;
    use crate::sim::{Cell, GroupId};

    fn world() -> SoftBodyWorld {
        SoftBodyWorld::default()
    }

    #[test]
    fn test_pulse_fires_once() {
        let mut w = world();
        w.create_blob(&[IVec2::new(3, 10)], GoopColor::Red, 1, true, 0);
        let mut pulses = 0;
        for _ in 0..400 {
            if advance_fill(&mut w.blobs[0], 0.016) {
                pulses += 1;
            }
        }
        assert_eq!(w.blobs[0].fill_amount, 1.0);
        assert_eq!(pulses, 1);
    }

    #[test]
    fn test_relock_starts_new_fill_cycle() {
        let mut w = world();
        w.create_blob(&[IVec2::new(3, 10)], GoopColor::Red, 1, true, 0);
        for _ in 0..200 {
            advance_fill(&mut w.blobs[0], 0.033);
        }
        w.lock_blob(1);
        assert_eq!(w.blobs[0].fill_amount, 0.0);
        let pulses = (0..200).filter(|_| advance_fill(&mut w.blobs[0], 0.033)).count();
        assert_eq!(pulses, 1);
    }

    #[test]
    fn test_step_fills_locked_blob() {
        let mut w = world();
        w.create_blob(&[IVec2::new(3, 10)], GoopColor::Red, 1, true, 0);
        w.step(0.5);
        let fill = w.blobs[0].fill_amount;
        assert!(fill > 0.0 && fill <= FILL_RATE * MAX_PHYSICS_DT + 1e-6);
    }

    #[test]
    fn test_disabled_world_is_frozen() {
        let mut w = world();
        w.enabled = false;
        w.create_blob(&[IVec2::new(3, 10)], GoopColor::Red, 1, true, 0);
        let before = w.blobs[0].clone();
        w.step(0.016);
        assert_eq!(w.blobs[0], before);
    }

    #[test]
    fn test_shift_moves_whole_blob() {
        let mut w = world();
        w.create_blob(&[IVec2::new(3, 10), IVec2::new(4, 10)], GoopColor::Blue, 1, true, 0);
        let before = w.blobs[0].clone();
        w.shift_for_rotation(TOTAL_WIDTH - 1);
        let after = &w.blobs[0];
        // Offset 0 -> 29 is one column left, so goop moves right by a cell
        assert_eq!(after.target.x - before.target.x, CELL_SIZE);
        for (a, b) in after.vertices.iter().zip(&before.vertices) {
            assert_eq!(a.pos.x - b.pos.x, CELL_SIZE);
        }
        assert_eq!(after.created_at_rotation, TOTAL_WIDTH - 1);
    }

    #[test]
    fn test_recenter_keeps_blob_intact() {
        let mut w = world();
        w.create_blob(&[IVec2::new(3, 10)], GoopColor::Blue, 1, true, 0);
        let shape: Vec<Vec2> = w.blobs[0].vertices.iter().map(|v| v.pos - w.blobs[0].target).collect();
        w.blobs[0].translate(Vec2::new(-2000.0, 0.0));
        w.recenter_blobs();
        let blob = &w.blobs[0];
        assert!((w.bounds.min.x..=w.bounds.max.x).contains(&blob.target.x));
        for (v, s) in blob.vertices.iter().zip(&shape) {
            assert!((v.pos - blob.target - *s).length() < 1e-3);
        }
    }

    #[test]
    fn test_blob_behind_the_drum_is_not_squashed() {
        let mut w = world();
        // Screen columns -10 and -9 with the tank at offset 0
        let cells = [IVec2::new(TOTAL_WIDTH - 10, 10), IVec2::new(TOTAL_WIDTH - 9, 10)];
        w.create_blob(&cells, GoopColor::Red, 1, true, 0);
        let width = |b: &SoftBlob| {
            let (lo, hi) = b.aabb().unwrap();
            hi.x - lo.x
        };
        let before = width(&w.blobs[0]);
        for _ in 0..30 {
            w.step(1.0 / 60.0);
        }
        let blob = &w.blobs[0];
        let (lo, hi) = blob.aabb().unwrap();
        assert!(lo.x > w.bounds.min.x && hi.x < w.bounds.max.x);
        assert!((width(blob) - before).abs() < 3.0);
    }

    #[test]
    fn test_whole_ring_fits_in_bounds() {
        let mut w = world();
        let cells: Vec<IVec2> = (0..TOTAL_WIDTH).map(|x| IVec2::new(x, 12)).collect();
        w.create_blob(&cells, GoopColor::Blue, 1, true, 7);
        w.step(1.0 / 60.0);
        let (lo, hi) = w.blobs[0].aabb().unwrap();
        assert!(lo.x > w.bounds.min.x && hi.x < w.bounds.max.x);
    }

    #[test]
    fn test_sync_groups() {
        let mut grid = Grid::new();
        let y = TOTAL_HEIGHT - 1;
        grid.set(2, y, Some(Cell::new(1, GroupId(10), GoopColor::Red, y, 0)));
        grid.set(3, y, Some(Cell::new(2, GroupId(10), GoopColor::Red, y, 0)));
        grid.set(8, y, Some(Cell::new(3, GroupId(11), GoopColor::Blue, y, 0)));

        let mut w = world();
        w.sync_groups(&grid, 0);
        assert_eq!(w.blobs.len(), 2);
        assert_eq!(w.get_blob(10).unwrap().grid_cells.len(), 2);
        assert!(w.blobs.iter().all(|b| b.is_locked));

        grid.take(8, y);
        w.sync_groups(&grid, 0);
        assert_eq!(w.blobs.len(), 1);
        assert!(w.get_blob(11).is_none());
    }

    #[test]
    fn test_follows_game_events() {
        use crate::sim::{GameEngine, TickInput};

        fn apply(engine: &mut GameEngine, w: &mut SoftBodyWorld, input: &TickInput) {
            for event in engine.step(input, 1.0 / 60.0) {
                w.handle_event(&event, &engine.state);
            }
            w.follow_piece(&engine.state);
            w.step(1.0 / 60.0);
        }

        let mut engine = GameEngine::new(21);
        let mut w = world();
        apply(&mut engine, &mut w, &TickInput::default());
        let piece_id = engine.state.active_piece.as_ref().unwrap().id;
        assert_eq!(w.falling_blob().map(|b| b.id), Some(piece_id));

        let drop = TickInput {
            hard_drop: true,
            ..Default::default()
        };
        apply(&mut engine, &mut w, &drop);
        assert!(w.get_blob(piece_id).is_none());
        let locked: Vec<_> = w.blobs.iter().filter(|b| b.is_locked).collect();
        assert!(!locked.is_empty());
        let locked_cells: usize = locked.iter().map(|b| b.grid_cells.len()).sum();
        assert_eq!(locked_cells, engine.state.grid.occupied_count());
    }
}
