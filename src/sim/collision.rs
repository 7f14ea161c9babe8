//! Piece collision and landing prediction
//!
//! The piece falls continuously, so its row is fractional. A cell counts as being
//! in the row its center rounds to; a piece resting half a row above the floor
//! already touches it.

use super::grid::Grid;
use super::piece::ActivePiece;
use crate::consts::TOTAL_HEIGHT;
use crate::coords::{get_grid_x, round_half_up};

/// Would `piece` overlap the floor or locked goop at its current position?
pub fn check_collision(grid: &Grid, piece: &ActivePiece, board_offset: i32) -> bool {
    collides_at(grid, piece, board_offset, piece.screen_x, piece.y)
}

/// Collision test with the piece moved to (`screen_x`, `y`)
pub fn collides_at(grid: &Grid, piece: &ActivePiece, board_offset: i32, screen_x: f32, y: f32) -> bool {
    piece.cells.iter().any(|c| {
        let row = round_half_up(y + c.y as f32);
        if row >= TOTAL_HEIGHT {
            return true;
        }
        // Rows above the tank are open spawn space
        if row < 0 {
            return false;
        }
        let col = get_grid_x(screen_x + c.x as f32, board_offset);
        grid.is_occupied(col, row)
    })
}

/// Row the piece would land on if dropped straight down.
///
/// If the piece already overlaps something (it overshot while falling between
/// ticks), this retreats upward to the first free row instead of searching down.
pub fn get_ghost_y(grid: &Grid, piece: &ActivePiece, board_offset: i32) -> i32 {
    let hits = |y: i32| collides_at(grid, piece, board_offset, piece.screen_x, y as f32);
    let mut y = round_half_up(piece.y);

    if hits(y) {
        // Bounded by the height of the tank plus the piece's reach above it
        let ceiling = -TOTAL_HEIGHT * 2;
        while hits(y) && y > ceiling {
            y -= 1;
        }
        return y;
    }

    while y < TOTAL_HEIGHT && !hits(y + 1) {
        y += 1;
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::{Cell, GroupId};
    use crate::sim::palette::GoopColor;
    use crate::sim::piece::{PieceDefinition, PieceShape};
    use glam::IVec2;

    fn piece_at(x: f32, y: f32, cells: &[(i32, i32)]) -> ActivePiece {
        let mut piece = ActivePiece::new(1, PieceDefinition::new(PieceShape::T, GoopColor::Red), x, y);
        piece.cells = cells.iter().map(|&(x, y)| IVec2::new(x, y)).collect();
        piece
    }

    fn place(grid: &mut Grid, x: i32, y: i32, group: u32) {
        grid.set(x, y, Some(Cell::new(x as u32 * 100 + y as u32, GroupId(group), GoopColor::Red, y, 0)));
    }

    #[test]
    fn test_free_space() {
        let grid = Grid::new();
        assert!(!check_collision(&grid, &piece_at(15.0, 10.0, &[(0, 0)]), 0));
        assert!(!check_collision(&grid, &piece_at(15.0, 0.0, &[(0, 0)]), 0));
    }

    #[test]
    fn test_floor() {
        let grid = Grid::new();
        let piece = piece_at(15.0, TOTAL_HEIGHT as f32 - 0.5, &[(0, 0)]);
        assert!(check_collision(&grid, &piece, 0));
    }

    #[test]
    fn test_overlap_with_locked_cell() {
        let mut grid = Grid::new();
        place(&mut grid, 15, 10, 1);
        assert!(check_collision(&grid, &piece_at(15.0, 10.0, &[(0, 0)]), 0));
    }

    #[test]
    fn test_wraps_across_seam() {
        let mut grid = Grid::new();
        place(&mut grid, 0, 10, 1);
        assert!(check_collision(&grid, &piece_at(29.0, 10.0, &[(1, 0)]), 0));
    }

    #[test]
    fn test_board_offset_shifts_columns() {
        let mut grid = Grid::new();
        place(&mut grid, 16, 10, 1);
        assert!(check_collision(&grid, &piece_at(6.0, 10.0, &[(0, 0)]), 10));
        assert!(!check_collision(&grid, &piece_at(6.0, 10.0, &[(0, 0)]), 0));
    }

    #[test]
    fn test_cells_above_tank_are_free() {
        let grid = Grid::new();
        assert!(!check_collision(&grid, &piece_at(3.0, 0.0, &[(0, -2), (0, -1), (0, 0)]), 0));
    }

    #[test]
    fn test_ghost_lands_on_blocks() {
        let mut grid = Grid::new();
        place(&mut grid, 5, 17, 1);
        place(&mut grid, 6, 17, 1);
        let piece = piece_at(5.0, 10.0, &[(0, 0), (1, 0)]);
        assert_eq!(get_ghost_y(&grid, &piece, 0), 16);
    }

    #[test]
    fn test_ghost_retreats_when_overlapping() {
        let mut grid = Grid::new();
        place(&mut grid, 5, 17, 1);
        place(&mut grid, 6, 17, 1);
        let piece = piece_at(5.0, 17.0, &[(0, 0), (1, 0)]);
        assert_eq!(get_ghost_y(&grid, &piece, 0), 16);
    }

    #[test]
    fn test_ghost_on_empty_floor() {
        let grid = Grid::new();
        let piece = piece_at(5.0, 0.0, &[(0, 0)]);
        assert_eq!(get_ghost_y(&grid, &piece, 0), TOTAL_HEIGHT - 1);
    }
}
