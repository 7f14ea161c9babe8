//! Cylindrical coordinate transforms
//!
//! Three spaces are involved:
//! - grid space: absolute tank column in `[0, TOTAL_WIDTH)`, row in `[0, TOTAL_HEIGHT)`
//! - screen columns: viewport-relative column, `boardOffset` is the leftmost visible column
//! - SVG space: pixels of the drum projection, centred horizontally on the viewport
//!
//! All wrap-around arithmetic lives here so the grid logic never does ad hoc modulo.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::consts::{BUFFER_HEIGHT, CELL_SIZE, TOTAL_WIDTH, VISIBLE_HEIGHT, VISIBLE_WIDTH};

/// Wrap any column index into `[0, TOTAL_WIDTH)`
#[inline]
pub fn normalize_x(x: i32) -> i32 {
    x.rem_euclid(TOTAL_WIDTH)
}

/// Round half up, matching how pointer positions snap to columns
#[inline]
pub fn round_half_up(x: f32) -> i32 {
    (x + 0.5).floor() as i32
}

/// Screen column (viewport relative) -> grid column (tank absolute)
#[inline]
pub fn get_grid_x(screen_x: f32, board_offset: i32) -> i32 {
    normalize_x(round_half_up(screen_x) + board_offset)
}

/// Grid column -> screen column along the shortest path around the drum.
///
/// Result lies in `(-TOTAL_WIDTH/2, TOTAL_WIDTH/2]`, so a column just behind the
/// seam reports a small offset instead of a near-circumference one.
pub fn get_screen_x(grid_x: i32, board_offset: i32) -> i32 {
    let half = TOTAL_WIDTH / 2;
    let diff = (grid_x - board_offset).rem_euclid(TOTAL_WIDTH);
    if diff > half { diff - TOTAL_WIDTH } else { diff }
}

/// A column index with wrap-around equality and adjacency built in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Column(i32);

impl Column {
    pub fn new(x: i32) -> Self {
        Self(normalize_x(x))
    }

    #[inline]
    pub fn index(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Step `dx` columns around the drum
    #[inline]
    pub fn offset(self, dx: i32) -> Self {
        Self::new(self.0 + dx)
    }

    pub fn left(self) -> Self {
        self.offset(-1)
    }

    pub fn right(self) -> Self {
        self.offset(1)
    }

    /// Shortest signed distance from `self` to `other`
    pub fn signed_distance(self, other: Column) -> i32 {
        get_screen_x(other.0, self.0)
    }

    /// True when the two columns touch (including across the seam)
    pub fn is_adjacent(self, other: Column) -> bool {
        self.signed_distance(other).abs() == 1
    }
}

impl From<i32> for Column {
    fn from(x: i32) -> Self {
        Self::new(x)
    }
}

/// The four orthogonal neighbours of a grid position, X wrapped.
///
/// Rows are not clamped; callers bound-check Y.
pub fn neighbors(x: i32, y: i32) -> [IVec2; 4] {
    let col = Column::new(x);
    [
        IVec2::new(col.left().index(), y),
        IVec2::new(col.right().index(), y),
        IVec2::new(col.index(), y - 1),
        IVec2::new(col.index(), y + 1),
    ]
}

// --- Viewport (drum projection) ---

/// Radius of the drum in pixels
pub const CYLINDER_RADIUS: f32 = TOTAL_WIDTH as f32 * CELL_SIZE / TAU;

/// SVG view box of the visible slice of the drum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// The view box is symmetric about x = 0 and starts at y = 0
pub fn viewbox() -> ViewBox {
    let half_w = vis_x_to_screen_x(VISIBLE_WIDTH as f32);
    ViewBox {
        x: -half_w,
        y: 0.0,
        w: half_w * 2.0,
        h: VISIBLE_HEIGHT as f32 * CELL_SIZE,
    }
}

#[inline]
fn vis_x_to_angle(vis_x: f32) -> f32 {
    (vis_x - VISIBLE_WIDTH as f32 / 2.0) * TAU / TOTAL_WIDTH as f32
}

/// Visual column (0 = left edge of viewport) -> projected SVG x
pub fn vis_x_to_screen_x(vis_x: f32) -> f32 {
    CYLINDER_RADIUS * vis_x_to_angle(vis_x).sin()
}

/// Projected SVG x -> visual column (inverse of `vis_x_to_screen_x` on the viewport)
pub fn screen_x_to_vis_x(screen_x: f32) -> f32 {
    let angle = (screen_x / CYLINDER_RADIUS).clamp(-1.0, 1.0).asin();
    angle * TOTAL_WIDTH as f32 / TAU + VISIBLE_WIDTH as f32 / 2.0
}

/// SVG point -> fractional visual (column, row) with the buffer rows added back
pub fn svg_to_visual(svg_x: f32, svg_y: f32) -> Vec2 {
    Vec2::new(
        screen_x_to_vis_x(svg_x),
        svg_y / CELL_SIZE + BUFFER_HEIGHT as f32,
    )
}

/// Visual (column, row) -> grid (column, row)
pub fn visual_to_grid(vis_x: f32, vis_y: f32, board_offset: i32) -> IVec2 {
    IVec2::new(get_grid_x(vis_x, board_offset), vis_y.floor() as i32)
}

/// Grid cell -> position as a percentage of the view box
pub fn grid_to_percentage(grid_x: i32, grid_y: i32, board_offset: i32) -> Vec2 {
    let vb = viewbox();
    let screen_col = get_screen_x(grid_x, board_offset) as f32;
    let svg_x = vis_x_to_screen_x(screen_col);
    Vec2::new(
        (svg_x - vb.x) / vb.w * 100.0,
        (grid_y - BUFFER_HEIGHT) as f32 / VISIBLE_HEIGHT as f32 * 100.0,
    )
}

/// Whether a screen column lies inside the viewport
#[inline]
pub fn is_in_visible_range(screen_x: i32) -> bool {
    (0..VISIBLE_WIDTH).contains(&screen_x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_within_bounds() {
        assert_eq!(normalize_x(0), 0);
        assert_eq!(normalize_x(15), 15);
        assert_eq!(normalize_x(29), 29);
    }

    #[test]
    fn test_normalize_wraps() {
        assert_eq!(normalize_x(30), 0);
        assert_eq!(normalize_x(45), 15);
        assert_eq!(normalize_x(-1), 29);
        assert_eq!(normalize_x(-31), 29);
        assert_eq!(normalize_x(-30), 0);
    }

    #[test]
    fn test_grid_x_with_offset() {
        assert_eq!(get_grid_x(5.0, 0), 5);
        assert_eq!(get_grid_x(5.0, 10), 15);
        assert_eq!(get_grid_x(5.0, 28), 3);
        assert_eq!(get_grid_x(4.5, 0), 5);
    }

    #[test]
    fn test_screen_x_takes_short_path() {
        assert_eq!(get_screen_x(5, 0), 5);
        assert_eq!(get_screen_x(15, 10), 5);
        assert_eq!(get_screen_x(2, 28), 4);
        assert_eq!(get_screen_x(28, 2), -4);
        assert_eq!(get_screen_x(15, 0), 15);
    }

    #[test]
    fn test_column_adjacency_across_seam() {
        assert!(Column::new(0).is_adjacent(Column::new(29)));
        assert!(Column::new(29).is_adjacent(Column::new(0)));
        assert!(!Column::new(0).is_adjacent(Column::new(2)));
        assert_eq!(Column::new(-1), Column::new(29));
    }

    #[test]
    fn test_neighbors_wrap() {
        let n = neighbors(0, 5);
        assert!(n.contains(&IVec2::new(29, 5)));
        assert!(n.contains(&IVec2::new(1, 5)));
        assert!(n.contains(&IVec2::new(0, 4)));
        assert!(n.contains(&IVec2::new(0, 6)));
    }

    #[test]
    fn test_viewbox_is_symmetric() {
        let vb = viewbox();
        assert!(vb.x < 0.0);
        assert!(vb.w > 0.0);
        assert!((vb.w + vb.x * 2.0).abs() < 0.001);
        assert_eq!(vb.y, 0.0);
    }

    #[test]
    fn test_center_column_maps_to_zero() {
        let center = VISIBLE_WIDTH as f32 / 2.0;
        assert!(vis_x_to_screen_x(center).abs() < 0.001);
        assert!(vis_x_to_screen_x(0.0) < 0.0);
        assert!(vis_x_to_screen_x((VISIBLE_WIDTH - 1) as f32) > 0.0);
    }

    #[test]
    fn test_vis_x_roundtrip() {
        for vis_x in [0.0, 3.0, 6.0, 9.0, 11.5] {
            let recovered = screen_x_to_vis_x(vis_x_to_screen_x(vis_x));
            assert!((recovered - vis_x).abs() < 0.001, "{vis_x} -> {recovered}");
        }
    }

    #[test]
    fn test_svg_to_visual_center() {
        let v = svg_to_visual(0.0, CELL_SIZE * 8.0);
        assert!((v.x - VISIBLE_WIDTH as f32 / 2.0).abs() < 0.001);
        assert!((v.y - (8 + BUFFER_HEIGHT) as f32).abs() < 0.001);
    }

    #[test]
    fn test_visual_to_grid() {
        assert_eq!(visual_to_grid(5.0, 10.0, 0), IVec2::new(5, 10));
        assert_eq!(visual_to_grid(5.0, 10.0, 10), IVec2::new(15, 10));
        assert_eq!(visual_to_grid(5.0, 10.0, 28).x, 3);
        assert_eq!(visual_to_grid(2.0, 10.0, -5).x, 27);
    }

    #[test]
    fn test_grid_to_percentage() {
        let p = grid_to_percentage(5, 10, 0);
        assert!((0.0..=100.0).contains(&p.x));
        assert!((0.0..=100.0).contains(&p.y));
        let c = grid_to_percentage(VISIBLE_WIDTH / 2, 10, 0);
        assert!((c.x - 50.0).abs() < 5.0);
    }

    #[test]
    fn test_visible_range() {
        assert!(is_in_visible_range(0));
        assert!(is_in_visible_range(VISIBLE_WIDTH - 1));
        assert!(!is_in_visible_range(-1));
        assert!(!is_in_visible_range(VISIBLE_WIDTH));
        assert!(!is_in_visible_range(100));
    }

    proptest! {
        #[test]
        fn prop_normalize_in_range_and_periodic(x in -10_000i32..10_000) {
            let n = normalize_x(x);
            prop_assert!((0..TOTAL_WIDTH).contains(&n));
            prop_assert_eq!(n, normalize_x(x + TOTAL_WIDTH));
        }

        #[test]
        fn prop_screen_grid_roundtrip(grid_x in 0i32..TOTAL_WIDTH, offset in -500i32..500) {
            let screen = get_screen_x(grid_x, offset);
            prop_assert!(screen > -TOTAL_WIDTH / 2 && screen <= TOTAL_WIDTH / 2);
            prop_assert_eq!(get_grid_x(screen as f32, offset), grid_x);
        }

        #[test]
        fn prop_vis_roundtrip(vis_x in 0i32..VISIBLE_WIDTH) {
            let v = vis_x as f32;
            prop_assert!((screen_x_to_vis_x(vis_x_to_screen_x(v)) - v).abs() < 1e-3);
        }
    }
}
