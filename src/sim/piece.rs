//! Falling piece shapes and rotation

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::palette::GoopColor;
use crate::coords::{get_grid_x, round_half_up};

/// Tetromino shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceShape {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceShape {
    pub const ALL: [Self; 7] = [Self::I, Self::J, Self::L, Self::O, Self::S, Self::T, Self::Z];

    /// Cell offsets in spawn orientation (+y is down)
    pub fn offsets(self) -> [IVec2; 4] {
        let raw: [(i32, i32); 4] = match self {
            Self::I => [(-1, 0), (0, 0), (1, 0), (2, 0)],
            Self::J => [(-1, -1), (-1, 0), (0, 0), (1, 0)],
            Self::L => [(1, -1), (-1, 0), (0, 0), (1, 0)],
            Self::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
            Self::S => [(0, 0), (1, 0), (0, 1), (-1, 1)],
            Self::T => [(0, -1), (-1, 0), (0, 0), (1, 0)],
            Self::Z => [(-1, 0), (0, 0), (0, 1), (1, 1)],
        };
        raw.map(|(x, y)| IVec2::new(x, y))
    }
}

/// Shape plus coloring of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceDefinition {
    pub shape: PieceShape,
    pub color: GoopColor,
    /// Color of the second half of the cells for multi-color pieces
    pub secondary: Option<GoopColor>,
}

impl PieceDefinition {
    pub fn new(shape: PieceShape, color: GoopColor) -> Self {
        Self {
            shape,
            color,
            secondary: None,
        }
    }

    /// Color of cell `index` out of `len`
    pub fn color_of(&self, index: usize, len: usize) -> GoopColor {
        match self.secondary {
            Some(secondary) if index >= len / 2 => secondary,
            _ => self.color,
        }
    }
}

/// Centroid of a cell set rounded to the nearest integer cell
pub fn centroid_center(cells: &[IVec2]) -> IVec2 {
    if cells.is_empty() {
        return IVec2::ZERO;
    }
    let sum = cells.iter().fold(Vec2::ZERO, |acc, c| acc + c.as_vec2());
    let mean = sum / cells.len() as f32;
    IVec2::new(round_half_up(mean.x), round_half_up(mean.y))
}

/// Rotate cell offsets 90 degrees about `center`.
///
/// Clockwise maps `(x, y) -> (-y, x)` relative to the center, counter-clockwise is
/// the inverse. Without a center the rounded centroid is used; pass the piece's
/// stored center on repeated rotations so the cells never drift.
pub fn get_rotated_cells(cells: &[IVec2], clockwise: bool, center: Option<IVec2>) -> Vec<IVec2> {
    let center = center.unwrap_or_else(|| centroid_center(cells));
    cells
        .iter()
        .map(|&c| {
            let rel = c - center;
            let rotated = if clockwise {
                IVec2::new(-rel.y, rel.x)
            } else {
                IVec2::new(rel.y, -rel.x)
            };
            rotated + center
        })
        .collect()
}

/// The piece currently falling
///
/// The piece lives in screen columns: it stays put horizontally while the tank
/// spins underneath it, and `y` falls continuously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePiece {
    pub id: u32,
    pub definition: PieceDefinition,
    pub screen_x: f32,
    pub y: f32,
    /// Quarter turns clockwise from spawn orientation (0..4)
    pub rotation: u8,
    pub cells: Vec<IVec2>,
    /// Fixed for the piece's lifetime
    pub rotation_center: IVec2,
}

impl ActivePiece {
    pub fn new(id: u32, definition: PieceDefinition, screen_x: f32, y: f32) -> Self {
        let cells = definition.shape.offsets().to_vec();
        let rotation_center = centroid_center(&cells);
        Self {
            id,
            definition,
            screen_x,
            y,
            rotation: 0,
            cells,
            rotation_center,
        }
    }

    /// Absolute tank column of the piece origin
    pub fn grid_x(&self, board_offset: i32) -> i32 {
        get_grid_x(self.screen_x, board_offset)
    }

    /// Copy of this piece turned a quarter about its fixed center
    pub fn rotated(&self, clockwise: bool) -> Self {
        let mut next = self.clone();
        next.cells = get_rotated_cells(&self.cells, clockwise, Some(self.rotation_center));
        next.rotation = if clockwise {
            (self.rotation + 1) % 4
        } else {
            (self.rotation + 3) % 4
        };
        next
    }

    pub fn color_of(&self, index: usize) -> GoopColor {
        self.definition.color_of(index, self.cells.len())
    }

    /// Grid positions the piece would occupy if it locked at row `y`
    pub fn cells_at(&self, board_offset: i32, y: i32) -> Vec<(IVec2, GoopColor)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let col = get_grid_x(self.screen_x + c.x as f32, board_offset);
                (IVec2::new(col, y + c.y), self.color_of(i))
            })
            .collect()
    }
}
