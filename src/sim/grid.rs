//! Tank grid storage
//!
//! `TOTAL_HEIGHT` rows by `TOTAL_WIDTH` columns. Column access always goes through
//! `normalize_x`, so callers may pass unwrapped columns; rows are bounds-checked.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::palette::GoopColor;
use crate::consts::{TOTAL_HEIGHT, TOTAL_WIDTH};
use crate::coords::normalize_x;

/// Identifier shared by every cell of one connected goop blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// One locked unit of goop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: u32,
    pub group_id: GroupId,
    pub color: GoopColor,
    /// Lock time of the group (ms of game time); the fill timer starts here
    pub timestamp_ms: u64,
    pub group_min_y: i32,
    pub group_max_y: i32,
    pub group_size: u32,
}

impl Cell {
    /// A fresh single-cell group
    pub fn new(id: u32, group_id: GroupId, color: GoopColor, y: i32, timestamp_ms: u64) -> Self {
        Self {
            id,
            group_id,
            color,
            timestamp_ms,
            group_min_y: y,
            group_max_y: y,
            group_size: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    cells: Vec<Option<Cell>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: vec![None; (TOTAL_WIDTH * TOTAL_HEIGHT) as usize],
        }
    }

    #[inline]
    pub fn in_rows(y: i32) -> bool {
        (0..TOTAL_HEIGHT).contains(&y)
    }

    #[inline]
    fn index(x: i32, y: i32) -> Option<usize> {
        Self::in_rows(y).then(|| (y * TOTAL_WIDTH + normalize_x(x)) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        Self::index(x, y).and_then(|i| self.cells[i].as_ref())
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        Self::index(x, y).and_then(|i| self.cells[i].as_mut())
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some()
    }

    /// Store a cell; writes outside the row range are dropped
    pub fn set(&mut self, x: i32, y: i32, cell: Option<Cell>) {
        if let Some(i) = Self::index(x, y) {
            self.cells[i] = cell;
        }
    }

    pub fn take(&mut self, x: i32, y: i32) -> Option<Cell> {
        Self::index(x, y).and_then(|i| self.cells[i].take())
    }

    /// Iterate occupied cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, &Cell)> {
        self.cells.iter().enumerate().filter_map(|(i, c)| {
            c.as_ref().map(|cell| {
                let i = i as i32;
                (IVec2::new(i % TOTAL_WIDTH, i / TOTAL_WIDTH), cell)
            })
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Positions of every cell in `group`
    pub fn group_cells(&self, group: GroupId) -> Vec<IVec2> {
        self.iter()
            .filter(|(_, c)| c.group_id == group)
            .map(|(p, _)| p)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_access() {
        let mut grid = Grid::new();
        grid.set(-1, 3, Some(Cell::new(1, GroupId(1), GoopColor::Red, 3, 0)));
        assert!(grid.is_occupied(TOTAL_WIDTH - 1, 3));
        assert!(grid.is_occupied(2 * TOTAL_WIDTH - 1, 3));
    }

    #[test]
    fn test_out_of_rows_is_empty() {
        let mut grid = Grid::new();
        grid.set(0, -1, Some(Cell::new(1, GroupId(1), GoopColor::Red, -1, 0)));
        grid.set(0, TOTAL_HEIGHT, Some(Cell::new(2, GroupId(1), GoopColor::Red, 0, 0)));
        assert!(grid.is_empty());
        assert!(!grid.is_occupied(0, -1));
    }

    #[test]
    fn test_iter_positions() {
        let mut grid = Grid::new();
        grid.set(7, 11, Some(Cell::new(1, GroupId(4), GoopColor::Blue, 11, 0)));
        let cells: Vec<_> = grid.iter().collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].0, IVec2::new(7, 11));
        assert_eq!(grid.group_cells(GroupId(4)), vec![IVec2::new(7, 11)]);
    }
}
