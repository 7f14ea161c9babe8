//! Blob construction from grid cells
//!
//! The outline of the cell union is traced as a polygon, every corner is
//! chamfered, and each cell edge contributes one perimeter vertex. Long
//! outlines are resampled down to `MAX_PERIMETER_VERTICES`.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::{IVec2, Vec2};

use super::types::{BlobId, SoftBlob, Spring, Vertex, polygon_area};
use crate::consts::{BUFFER_HEIGHT, CELL_SIZE, TOTAL_WIDTH};
use crate::coords::{get_screen_x, normalize_x};
use crate::sim::{ActivePiece, GoopColor};

/// How far corner vertices are pulled back along each edge (cells)
const CORNER_INSET: f32 = 0.25;
/// Range of per-vertex attraction multipliers
const ATTRACTION_MIN: f32 = 0.3;
const ATTRACTION_SPAN: f32 = 1.2;
/// Perimeter vertex budget per blob
pub const MAX_PERIMETER_VERTICES: usize = 16;

/// Pixel position of the top-left corner of visual cell (`col`, `row`)
pub fn cell_to_pixel(col: f32, row: f32) -> Vec2 {
    Vec2::new(col * CELL_SIZE, (row - BUFFER_HEIGHT as f32) * CELL_SIZE)
}

/// Grid cells -> visual columns, kept contiguous across the seam.
///
/// Each connected run is walked outward from its first cell, one column per
/// step, so groups wider than half the drum stay in one piece. A group that
/// covers every column is cut at the back of the tank, opposite the viewport.
pub fn unwrap_columns(cells: &[IVec2], board_offset: i32) -> Vec<IVec2> {
    let wrapped = |c: &IVec2| IVec2::new(normalize_x(c.x), c.y);
    let columns: HashSet<i32> = cells.iter().map(|c| normalize_x(c.x)).collect();
    if columns.len() >= TOTAL_WIDTH as usize {
        return cells
            .iter()
            .map(|c| IVec2::new(get_screen_x(c.x, board_offset), c.y))
            .collect();
    }

    let members: HashSet<IVec2> = cells.iter().map(wrapped).collect();
    let mut visual: HashMap<IVec2, i32> = HashMap::new();
    let mut queue = VecDeque::new();
    for seed in cells.iter().map(wrapped) {
        if visual.contains_key(&seed) {
            continue;
        }
        let vx = get_screen_x(seed.x, board_offset);
        visual.insert(seed, vx);
        queue.push_back((seed, vx));

        while let Some((cell, vx)) = queue.pop_front() {
            for step in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
                let next = IVec2::new(normalize_x(cell.x + step.x), cell.y + step.y);
                if members.contains(&next) && !visual.contains_key(&next) {
                    visual.insert(next, vx + step.x);
                    queue.push_back((next, vx + step.x));
                }
            }
        }
    }

    cells
        .iter()
        .map(|c| {
            let vx = visual.get(&wrapped(c)).copied();
            IVec2::new(vx.unwrap_or_else(|| get_screen_x(c.x, board_offset)), c.y)
        })
        .collect()
}

/// Corner points of the outer outline, clockwise on screen (y down).
///
/// Holes are ignored. Where the outline pinches at a vertex the left-most turn is
/// taken, so diagonal lobes stay on the loop.
pub fn trace_outline(cells: &[IVec2]) -> Vec<IVec2> {
    let set: HashSet<IVec2> = cells.iter().copied().collect();
    let mut edges: HashMap<IVec2, Vec<IVec2>> = HashMap::new();
    for &c in &set {
        let mut add = |from: IVec2, to: IVec2| edges.entry(from).or_default().push(to);
        if !set.contains(&(c - IVec2::Y)) {
            add(c, c + IVec2::X);
        }
        if !set.contains(&(c + IVec2::X)) {
            add(c + IVec2::X, c + IVec2::ONE);
        }
        if !set.contains(&(c + IVec2::Y)) {
            add(c + IVec2::ONE, c + IVec2::Y);
        }
        if !set.contains(&(c - IVec2::X)) {
            add(c + IVec2::Y, c);
        }
    }

    let Some(start) = edges.keys().copied().min_by_key(|p| (p.y, p.x)) else {
        return Vec::new();
    };
    let edge_count: usize = edges.values().map(Vec::len).sum();

    let mut corners = Vec::new();
    let mut current = start;
    // The first edge out of the top-left corner always runs along the top
    let mut heading = IVec2::X;
    for _ in 0..edge_count {
        let Some(outgoing) = edges.get_mut(&current) else {
            break;
        };
        let left = IVec2::new(heading.y, -heading.x);
        let right = IVec2::new(-heading.y, heading.x);
        let Some(i) = [left, heading, right]
            .iter()
            .find_map(|d| outgoing.iter().position(|&to| to - current == *d))
        else {
            break;
        };
        let next = outgoing.swap_remove(i);
        let dir = next - current;
        if dir != heading || corners.is_empty() {
            corners.push(current);
        }
        heading = dir;
        current = next;
        if current == start {
            break;
        }
    }
    corners
}

/// Perimeter points (cell units) with chamfered corners and one point per cell edge
fn outline_points(corners: &[IVec2]) -> Vec<Vec2> {
    let n = corners.len();
    let mut points = Vec::new();
    for i in 0..n {
        let a = corners[i].as_vec2();
        let b = corners[(i + 1) % n].as_vec2();
        let len = a.distance(b);
        if len < f32::EPSILON {
            continue;
        }
        let dir = (b - a) / len;
        points.push(a + dir * CORNER_INSET);
        for k in 1..len.round() as i32 {
            points.push(a + dir * k as f32);
        }
        points.push(b - dir * CORNER_INSET);
    }
    points
}

/// `count` points evenly spaced by arc length along a closed polyline
fn resample_closed(points: &[Vec2], count: usize) -> Vec<Vec2> {
    let n = points.len();
    if n <= count || count == 0 {
        return points.to_vec();
    }
    let seg_len = |i: usize| points[i].distance(points[(i + 1) % n]);
    let total: f32 = (0..n).map(seg_len).sum();
    let step = total / count as f32;

    let mut out = Vec::with_capacity(count);
    let mut seg = 0;
    let mut seg_start = 0.0;
    for k in 0..count {
        let d = k as f32 * step;
        while seg < n - 1 && seg_start + seg_len(seg) < d {
            seg_start += seg_len(seg);
            seg += 1;
        }
        let len = seg_len(seg);
        let t = if len > f32::EPSILON {
            ((d - seg_start) / len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(points[seg].lerp(points[(seg + 1) % n], t));
    }
    out
}

/// Deterministic per-vertex attraction multiplier
fn attraction_multiplier(id: BlobId, index: usize) -> f32 {
    let hash = id.wrapping_mul(2654435761).wrapping_add(index as u32 * 7919);
    ATTRACTION_MIN + (hash % 1000) as f32 / 1000.0 * ATTRACTION_SPAN
}

/// Build a blob over `local_cells`, where cell `c` spans `origin + c * CELL_SIZE`
pub fn build_blob(
    id: BlobId,
    color: GoopColor,
    local_cells: &[IVec2],
    origin: Vec2,
    is_locked: bool,
    board_offset: i32,
) -> SoftBlob {
    let to_pixel = |p: Vec2| origin + p * CELL_SIZE;
    let center = if local_cells.is_empty() {
        origin
    } else {
        let sum: Vec2 = local_cells
            .iter()
            .map(|c| to_pixel(c.as_vec2() + Vec2::splat(0.5)))
            .sum();
        sum / local_cells.len() as f32
    };

    let outline = outline_points(&trace_outline(local_cells));
    let vertices: Vec<Vertex> = resample_closed(&outline, MAX_PERIMETER_VERTICES)
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let pos = to_pixel(p);
            Vertex::at_rest(pos, pos - center, attraction_multiplier(id, i))
        })
        .collect();

    let inner_vertices = local_cells
        .iter()
        .map(|c| {
            let pos = to_pixel(c.as_vec2() + Vec2::splat(0.5));
            Vertex::at_rest(pos, pos - center, 1.0)
        })
        .collect();

    let n = vertices.len();
    let spring = |a: usize, b: usize| Spring {
        a,
        b,
        rest_length: vertices[a].pos.distance(vertices[b].pos),
    };
    let ring_springs = (0..n).map(|i| spring(i, (i + 1) % n)).collect();
    let cross_springs = (0..n / 2).map(|i| spring(i, i + n / 2)).collect();

    SoftBlob {
        id,
        color,
        rest_area: polygon_area(&vertices),
        vertices,
        inner_vertices,
        ring_springs,
        cross_springs,
        grid_cells: local_cells.to_vec(),
        is_locked,
        fill_amount: if is_locked { 0.0 } else { 1.0 },
        was_full: false,
        target: center,
        created_at_rotation: board_offset,
    }
}

/// Blob for a locked goop group
pub fn create_blob_from_cells(
    id: BlobId,
    color: GoopColor,
    cells: &[IVec2],
    board_offset: i32,
    is_locked: bool,
) -> SoftBlob {
    let visual = unwrap_columns(cells, board_offset);
    let mut blob = build_blob(id, color, &visual, cell_to_pixel(0.0, 0.0), is_locked, board_offset);
    blob.grid_cells = cells.to_vec();
    blob
}

/// Pixel origin of a falling piece's offset frame
pub fn piece_origin(piece: &ActivePiece) -> Vec2 {
    cell_to_pixel(piece.screen_x, piece.y)
}

/// Blob for the falling piece, built on its cell offsets
pub fn create_piece_blob(piece: &ActivePiece, board_offset: i32) -> SoftBlob {
    build_blob(
        piece.id,
        piece.definition.color,
        &piece.cells,
        piece_origin(piece),
        false,
        board_offset,
    )
}
