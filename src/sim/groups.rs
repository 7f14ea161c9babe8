//! Goop group discovery and "sticky gravity"
//!
//! A group is an orthogonally connected blob of cells sharing a `GroupId`, with
//! X adjacency wrapping around the drum. Groups never crumble: when no cell of a
//! group rests on the floor or on a different group, the whole group falls.

use std::collections::{BTreeMap, HashSet, VecDeque};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid, GroupId};
use crate::consts::TOTAL_HEIGHT;
use crate::coords::{neighbors, normalize_x};

/// A cell lifted out of the grid because its group lost support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LooseGoop {
    pub x: i32,
    pub y: i32,
    pub cell: Cell,
}

/// Result of a sticky-gravity pass
#[derive(Debug, Clone)]
pub struct FloatingBlocks {
    /// Input grid with every floating group removed
    pub grid: Grid,
    pub loose_goop: Vec<LooseGoop>,
}

/// Flood fill from `start` over cells accepted by `same`
fn flood(grid: &Grid, start: IVec2, same: impl Fn(&Cell) -> bool) -> Vec<IVec2> {
    let start = IVec2::new(normalize_x(start.x), start.y);
    let Some(seed) = grid.get(start.x, start.y) else {
        return Vec::new();
    };
    if !same(seed) {
        return Vec::new();
    }

    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut out = Vec::new();

    while let Some(p) = queue.pop_front() {
        out.push(p);
        for n in neighbors(p.x, p.y) {
            if !Grid::in_rows(n.y) || visited.contains(&n) {
                continue;
            }
            if grid.get(n.x, n.y).is_some_and(&same) {
                visited.insert(n);
                queue.push_back(n);
            }
        }
    }
    out
}

/// All cells connected to (`x`, `y`) that share its group. Empty seed -> empty list.
pub fn find_contiguous_group(grid: &Grid, x: i32, y: i32) -> Vec<IVec2> {
    let Some(group) = grid.get(x, y).map(|c| c.group_id) else {
        return Vec::new();
    };
    flood(grid, IVec2::new(x, y), |c| c.group_id == group)
}

/// All cells connected to (`x`, `y`) that share its color, regardless of group
pub fn find_same_color_region(grid: &Grid, x: i32, y: i32) -> Vec<IVec2> {
    let Some(color) = grid.get(x, y).map(|c| c.color) else {
        return Vec::new();
    };
    flood(grid, IVec2::new(x, y), |c| c.color == color)
}

/// Stamp `cells` as one group, refreshing the shared group metadata
pub fn assign_group(grid: &mut Grid, cells: &[IVec2], group_id: GroupId, timestamp_ms: u64) {
    let Some(min_y) = cells.iter().map(|c| c.y).min() else {
        return;
    };
    let max_y = cells.iter().map(|c| c.y).max().unwrap_or(min_y);
    let size = cells.len() as u32;
    for p in cells {
        if let Some(cell) = grid.get_mut(p.x, p.y) {
            cell.group_id = group_id;
            cell.timestamp_ms = timestamp_ms;
            cell.group_min_y = min_y;
            cell.group_max_y = max_y;
            cell.group_size = size;
        }
    }
}

/// Lift a whole group out of the grid
pub fn remove_group(grid: &mut Grid, x: i32, y: i32) -> Vec<(IVec2, Cell)> {
    find_contiguous_group(grid, x, y)
        .into_iter()
        .filter_map(|p| grid.take(p.x, p.y).map(|c| (p, c)))
        .collect()
}

/// Does any cell of `group_cells` rest on the floor or on a different group?
fn is_supported(grid: &Grid, group_cells: &[IVec2]) -> bool {
    group_cells.iter().any(|p| {
        let below = p.y + 1;
        if below >= TOTAL_HEIGHT {
            return true;
        }
        let own = grid.get(p.x, p.y).map(|c| c.group_id);
        grid.get(p.x, below).is_some_and(|c| Some(c.group_id) != own)
    })
}

/// Find every unsupported group and lift it out.
///
/// Support is all-or-nothing per group: a long overhang with a single supported
/// cell stays put entirely.
pub fn get_floating_blocks(grid: &Grid) -> FloatingBlocks {
    let mut out = grid.clone();
    let mut loose_goop = Vec::new();
    let mut seen: HashSet<IVec2> = HashSet::new();

    for (pos, _) in grid.iter() {
        if seen.contains(&pos) {
            continue;
        }
        let group = find_contiguous_group(grid, pos.x, pos.y);
        seen.extend(group.iter().copied());

        if is_supported(grid, &group) {
            continue;
        }
        for p in group {
            if let Some(cell) = out.take(p.x, p.y) {
                loose_goop.push(LooseGoop { x: p.x, y: p.y, cell });
            }
        }
    }

    FloatingBlocks { grid: out, loose_goop }
}

/// Drop loose groups back into the grid as rigid units.
///
/// Lowest groups land first so higher ones can come to rest on them.
/// Returns the landing position of every cell.
pub fn settle_loose_goop(grid: &mut Grid, loose: Vec<LooseGoop>) -> Vec<IVec2> {
    let mut by_group: BTreeMap<GroupId, Vec<LooseGoop>> = BTreeMap::new();
    for goop in loose {
        by_group.entry(goop.cell.group_id).or_default().push(goop);
    }

    let mut groups: Vec<Vec<LooseGoop>> = by_group.into_values().collect();
    groups.sort_by_key(|g| std::cmp::Reverse(g.iter().map(|c| c.y).max().unwrap_or(0)));

    let mut landed = Vec::new();
    for group in groups {
        let fits = |d: i32| {
            group
                .iter()
                .all(|c| Grid::in_rows(c.y + d) && !grid.is_occupied(c.x, c.y + d))
        };
        let mut drop = 0;
        while fits(drop + 1) {
            drop += 1;
        }
        for goop in group {
            let y = goop.y + drop;
            grid.set(goop.x, y, Some(goop.cell));
            landed.push(IVec2::new(normalize_x(goop.x), y));
        }
    }
    landed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TOTAL_WIDTH;
    use crate::sim::palette::GoopColor;

    fn place(grid: &mut Grid, x: i32, y: i32, color: GoopColor, group: u32) {
        let id = (y * TOTAL_WIDTH + x) as u32;
        grid.set(x, y, Some(Cell::new(id, GroupId(group), color, y, 0)));
    }

    #[test]
    fn test_empty_seed() {
        assert!(find_contiguous_group(&Grid::new(), 5, 5).is_empty());
    }

    #[test]
    fn test_single_cell() {
        let mut grid = Grid::new();
        place(&mut grid, 5, 5, GoopColor::Red, 1);
        assert_eq!(find_contiguous_group(&grid, 5, 5), vec![IVec2::new(5, 5)]);
    }

    #[test]
    fn test_horizontal_run_ignores_other_group() {
        let mut grid = Grid::new();
        place(&mut grid, 5, 5, GoopColor::Red, 1);
        place(&mut grid, 6, 5, GoopColor::Red, 1);
        place(&mut grid, 7, 5, GoopColor::Red, 1);
        place(&mut grid, 8, 5, GoopColor::Red, 2);

        let mut group = find_contiguous_group(&grid, 5, 5);
        group.sort_by_key(|p| p.x);
        assert_eq!(group, vec![IVec2::new(5, 5), IVec2::new(6, 5), IVec2::new(7, 5)]);
    }

    #[test]
    fn test_vertical_run() {
        let mut grid = Grid::new();
        for y in 5..8 {
            place(&mut grid, 5, y, GoopColor::Red, 1);
        }
        assert_eq!(find_contiguous_group(&grid, 5, 6).len(), 3);
    }

    #[test]
    fn test_group_wraps_across_seam() {
        let mut grid = Grid::new();
        place(&mut grid, 0, 5, GoopColor::Red, 1);
        place(&mut grid, 29, 5, GoopColor::Red, 1);
        assert_eq!(find_contiguous_group(&grid, 0, 5).len(), 2);
    }

    #[test]
    fn test_same_color_region_spans_groups() {
        let mut grid = Grid::new();
        place(&mut grid, 5, 5, GoopColor::Red, 1);
        place(&mut grid, 6, 5, GoopColor::Red, 2);
        place(&mut grid, 7, 5, GoopColor::Blue, 3);
        assert_eq!(find_same_color_region(&grid, 5, 5).len(), 2);
    }

    #[test]
    fn test_assign_group_metadata() {
        let mut grid = Grid::new();
        place(&mut grid, 5, 5, GoopColor::Red, 1);
        place(&mut grid, 5, 6, GoopColor::Red, 2);
        let cells = find_same_color_region(&grid, 5, 5);
        assign_group(&mut grid, &cells, GroupId(9), 1234);
        for p in &cells {
            let c = grid.get(p.x, p.y).unwrap();
            assert_eq!(c.group_id, GroupId(9));
            assert_eq!(c.group_min_y, 5);
            assert_eq!(c.group_max_y, 6);
            assert_eq!(c.group_size, 2);
            assert_eq!(c.timestamp_ms, 1234);
        }
    }

    #[test]
    fn test_floor_supports() {
        let mut grid = Grid::new();
        place(&mut grid, 5, TOTAL_HEIGHT - 1, GoopColor::Red, 1);
        assert!(get_floating_blocks(&grid).loose_goop.is_empty());
    }

    #[test]
    fn test_single_floating_cell_is_lifted() {
        let mut grid = Grid::new();
        place(&mut grid, 5, 10, GoopColor::Red, 1);
        let result = get_floating_blocks(&grid);
        assert_eq!(result.loose_goop.len(), 1);
        assert_eq!((result.loose_goop[0].x, result.loose_goop[0].y), (5, 10));
        assert!(result.grid.get(5, 10).is_none());
        // The input grid is left untouched
        assert!(grid.get(5, 10).is_some());
    }

    #[test]
    fn test_other_group_supports() {
        let mut grid = Grid::new();
        place(&mut grid, 5, TOTAL_HEIGHT - 1, GoopColor::Red, 1);
        place(&mut grid, 5, TOTAL_HEIGHT - 2, GoopColor::Blue, 2);
        assert!(get_floating_blocks(&grid).loose_goop.is_empty());
    }

    #[test]
    fn test_group_falls_together() {
        let mut grid = Grid::new();
        place(&mut grid, 5, 10, GoopColor::Red, 1);
        place(&mut grid, 6, 10, GoopColor::Red, 1);
        place(&mut grid, 5, 11, GoopColor::Red, 1);
        assert_eq!(get_floating_blocks(&grid).loose_goop.len(), 3);
    }

    #[test]
    fn test_overhang_with_one_support_stays() {
        let mut grid = Grid::new();
        place(&mut grid, 0, TOTAL_HEIGHT - 1, GoopColor::Blue, 1);
        for x in 0..6 {
            place(&mut grid, x, TOTAL_HEIGHT - 2, GoopColor::Red, 2);
        }
        assert!(get_floating_blocks(&grid).loose_goop.is_empty());
    }

    #[test]
    fn test_settle_drops_rigidly() {
        let mut grid = Grid::new();
        place(&mut grid, 5, TOTAL_HEIGHT - 1, GoopColor::Blue, 1);
        // An L-shaped group: the column above the blue cell lands on it
        place(&mut grid, 5, 8, GoopColor::Red, 2);
        place(&mut grid, 6, 8, GoopColor::Red, 2);
        place(&mut grid, 6, 9, GoopColor::Red, 2);

        let FloatingBlocks { mut grid, loose_goop } = get_floating_blocks(&grid);
        assert_eq!(loose_goop.len(), 3);
        let landed = settle_loose_goop(&mut grid, loose_goop);
        assert_eq!(landed.len(), 3);

        // Column 6 reaches the floor first; column 5 stays one row higher
        assert!(grid.is_occupied(6, TOTAL_HEIGHT - 1));
        assert!(grid.is_occupied(6, TOTAL_HEIGHT - 2));
        assert!(grid.is_occupied(5, TOTAL_HEIGHT - 2));
        assert!(get_floating_blocks(&grid).loose_goop.is_empty());
    }

    #[test]
    fn test_remove_group() {
        let mut grid = Grid::new();
        place(&mut grid, 3, 3, GoopColor::Red, 1);
        place(&mut grid, 4, 3, GoopColor::Red, 1);
        place(&mut grid, 5, 3, GoopColor::Red, 2);
        assert_eq!(remove_group(&mut grid, 3, 3).len(), 2);
        assert_eq!(grid.occupied_count(), 1);
    }
}
