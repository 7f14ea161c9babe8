//! Soft-body data types
//!
//! Positions are in viewport pixels: x = 0 is the left edge of the viewport at
//! the blob's reference rotation, y = 0 is the top visible row.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::consts::{BUFFER_HEIGHT, CELL_SIZE, TOTAL_WIDTH, VISIBLE_HEIGHT, VISIBLE_WIDTH};
use crate::sim::GoopColor;

/// Blob identifier: the backing group id, or the piece id while falling
pub type BlobId = u32;

/// Point mass with Verlet state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: Vec2,
    /// Previous position; velocity is implicit
    pub old_pos: Vec2,
    /// Rest offset from the blob's target centre
    pub home_offset: Vec2,
    /// Share of a spring correction taken is inversely proportional to mass
    pub mass: f32,
    /// Per-vertex multiplier on the attraction radius (0.3..1.5)
    pub attraction_radius: f32,
}

impl Vertex {
    pub fn at_rest(pos: Vec2, home_offset: Vec2, attraction_radius: f32) -> Self {
        Self {
            pos,
            old_pos: pos,
            home_offset,
            mass: 1.0,
            attraction_radius,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.pos - self.old_pos
    }
}

/// Distance constraint between two vertices of one blob
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub a: usize,
    pub b: usize,
    pub rest_length: f32,
}

/// Transient spring between vertices of two same-colored blobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttractionSpring {
    /// Index into the blob list
    pub blob_a: usize,
    pub blob_b: usize,
    pub vertex_a: usize,
    pub vertex_b: usize,
    pub rest_length: f32,
}

/// One deformable blob standing in for a goop group or the falling piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftBlob {
    pub id: BlobId,
    pub color: GoopColor,
    /// Perimeter, in order around the outline
    pub vertices: Vec<Vertex>,
    /// Stable core, one per cell; driven by the home force only
    pub inner_vertices: Vec<Vertex>,
    pub ring_springs: Vec<Spring>,
    pub cross_springs: Vec<Spring>,
    pub rest_area: f32,
    /// Grid cells this blob stands for
    pub grid_cells: Vec<IVec2>,
    pub is_locked: bool,
    /// Fill animation, 0..=1
    pub fill_amount: f32,
    /// Set once the ready pulse has fired for the current fill
    pub was_full: bool,
    pub target: Vec2,
    /// Board offset the pixel positions are relative to
    pub created_at_rotation: i32,
}

impl SoftBlob {
    /// Polygon area of the perimeter (shoelace)
    pub fn area(&self) -> f32 {
        polygon_area(&self.vertices)
    }

    pub fn centroid(&self) -> Vec2 {
        centroid(&self.vertices)
    }

    /// Mean distance of perimeter vertices from their home positions
    pub fn deviation(&self) -> f32 {
        if self.vertices.is_empty() {
            return 0.0;
        }
        let total: f32 = self
            .vertices
            .iter()
            .map(|v| v.pos.distance(self.target + v.home_offset))
            .sum();
        total / self.vertices.len() as f32
    }

    /// Move the whole blob rigidly; velocities are preserved
    pub fn translate(&mut self, delta: Vec2) {
        for v in self.vertices.iter_mut().chain(self.inner_vertices.iter_mut()) {
            v.pos += delta;
            v.old_pos += delta;
        }
        self.target += delta;
    }

    pub fn springs(&self) -> impl Iterator<Item = &Spring> {
        self.ring_springs.iter().chain(self.cross_springs.iter())
    }

    /// Axis-aligned box around the perimeter, or None for an empty blob
    pub fn aabb(&self) -> Option<(Vec2, Vec2)> {
        let first = self.vertices.first()?.pos;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), v| (lo.min(v.pos), hi.max(v.pos))),
        )
    }
}

pub fn polygon_area(vertices: &[Vertex]) -> f32 {
    let n = vertices.len();
    let twice: f32 = (0..n)
        .map(|i| {
            let a = vertices[i].pos;
            let b = vertices[(i + 1) % n].pos;
            a.perp_dot(b)
        })
        .sum();
    twice.abs() / 2.0
}

pub fn centroid(vertices: &[Vertex]) -> Vec2 {
    if vertices.is_empty() {
        return Vec2::ZERO;
    }
    vertices.iter().map(|v| v.pos).sum::<Vec2>() / vertices.len() as f32
}

/// Tunable physics parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Velocity kept per frame
    pub damping: f32,
    /// Spring correction strength (percent)
    pub stiffness: f32,
    /// Area preservation strength
    pub pressure: f32,
    /// Constraint relaxation passes
    pub iterations: u32,
    pub home_stiffness: f32,
    pub inner_home_stiffness: f32,
    /// Home pull of locked blobs, relative to `home_stiffness`
    pub return_speed: f32,
    /// Extra damping of locked blobs
    pub viscosity: f32,
    pub gravity: f32,
    /// Base reach of merge tendrils (pixels)
    pub attraction_radius: f32,
    pub attraction_rest_length: f32,
    pub attraction_stiffness: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            damping: 0.97,
            stiffness: 1.0,
            pressure: 5.0,
            iterations: 3,
            home_stiffness: 0.3,
            inner_home_stiffness: 0.5,
            return_speed: 0.5,
            viscosity: 2.5,
            gravity: 10.0,
            attraction_radius: 20.0,
            attraction_rest_length: 4.0,
            attraction_stiffness: 0.05,
        }
    }
}

/// Axis-aligned clamp rectangle for vertices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Bounds {
    /// One circumference either side of the viewport centre, buffer rows to the floor.
    ///
    /// Recentering keeps a blob's midpoint within half a circumference of the
    /// centre, so even a blob wrapping the whole drum fits without touching the sides.
    fn default() -> Self {
        let center_x = VISIBLE_WIDTH as f32 * CELL_SIZE / 2.0;
        let circumference = TOTAL_WIDTH as f32 * CELL_SIZE;
        Self {
            min: Vec2::new(center_x - circumference, -(BUFFER_HEIGHT as f32) * CELL_SIZE),
            max: Vec2::new(center_x + circumference, VISIBLE_HEIGHT as f32 * CELL_SIZE),
        }
    }
}

impl Bounds {
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }
}
