//! Render-facing blob data
//!
//! No drawing happens here: blobs are flattened into smooth closed outlines of
//! Pod vertices that any 2D backend can upload as-is.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::consts::{CELL_SIZE, TOTAL_WIDTH, VISIBLE_WIDTH};
use crate::sim::GoopColor;
use crate::softbody::{BlobId, SoftBlob, SoftBodyWorld};

/// 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BlobVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl BlobVertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Linear RGBA in 0..1
pub fn color_to_f32(color: GoopColor) -> [f32; 4] {
    let rgba = color.rgba();
    [24, 16, 8, 0].map(|shift| ((rgba >> shift) & 0xff) as f32 / 255.0)
}

/// Bezier control points of the Catmull-Rom segment p1 -> p2
pub fn catmull_rom_to_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> (Vec2, Vec2) {
    (p1 + (p2 - p0) / 6.0, p2 - (p3 - p1) / 6.0)
}

fn cubic_bezier(a: Vec2, b: Vec2, c: Vec2, d: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    a * (u * u * u) + b * (3.0 * u * u * t) + c * (3.0 * u * t * t) + d * (t * t * t)
}

/// Smooth closed curve through `points`, `samples` points per segment
pub fn sample_outline(points: &[Vec2], samples: usize) -> Vec<Vec2> {
    let n = points.len();
    if n < 3 || samples == 0 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(n * samples);
    for i in 0..n {
        let p0 = points[(i + n - 1) % n];
        let p1 = points[i];
        let p2 = points[(i + 1) % n];
        let p3 = points[(i + 2) % n];
        let (c1, c2) = catmull_rom_to_bezier(p0, p1, p2, p3);
        for s in 0..samples {
            out.push(cubic_bezier(p1, c1, c2, p2, s as f32 / samples as f32));
        }
    }
    out
}

/// Horizontal translation that shows a blob at its nearest copy around the drum
pub fn wrap_translation(center_x: f32) -> f32 {
    let circumference = TOTAL_WIDTH as f32 * CELL_SIZE;
    let view_center = VISIBLE_WIDTH as f32 * CELL_SIZE / 2.0;
    ((view_center - center_x) / circumference).round() * circumference
}

/// One blob ready for drawing
#[derive(Debug, Clone, PartialEq)]
pub struct BlobSnapshot {
    pub id: BlobId,
    pub fill_amount: f32,
    pub is_locked: bool,
    pub outline: Vec<BlobVertex>,
}

impl BlobSnapshot {
    pub fn from_blob(blob: &SoftBlob, samples: usize) -> Self {
        let color = color_to_f32(blob.color);
        let points: Vec<Vec2> = blob.vertices.iter().map(|v| v.pos).collect();
        let dx = wrap_translation(blob.centroid().x);
        let outline = sample_outline(&points, samples)
            .into_iter()
            .map(|p| BlobVertex::new(p.x + dx, p.y, color))
            .collect();
        Self {
            id: blob.id,
            fill_amount: blob.fill_amount,
            is_locked: blob.is_locked,
            outline,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.outline)
    }
}

pub fn snapshot(world: &SoftBodyWorld, samples: usize) -> Vec<BlobSnapshot> {
    world
        .blobs
        .iter()
        .map(|b| BlobSnapshot::from_blob(b, samples))
        .collect()
}
