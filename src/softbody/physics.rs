//! Per-tick soft-body passes
//!
//! Order matters: each pass corrects error introduced by the ones before it.
//! Integration, home force, spring relaxation, pressure, then bounds.

use glam::Vec2;

use super::types::{AttractionSpring, Bounds, PhysicsParams, SoftBlob, Vertex};
use crate::consts::MAX_PHYSICS_DT;

/// Distance below which a constraint is skipped for the tick
const MIN_DISTANCE: f32 = 1e-4;
/// Per-tick clamp on the pressure push (pixels)
const MAX_PRESSURE_PUSH: f32 = 0.5;
/// Velocity kept after hitting a bound
const BOUNDARY_BOUNCE: f32 = 0.3;

/// Verlet step: implicit velocity times `damping`, plus gravity
pub fn verlet_integrate(blob: &mut SoftBlob, dt: f32, damping: f32, gravity: f32) {
    let fall = Vec2::new(0.0, gravity * dt * dt);
    for v in blob.vertices.iter_mut().chain(blob.inner_vertices.iter_mut()) {
        let velocity = v.velocity() * damping;
        v.old_pos = v.pos;
        v.pos += velocity + fall;
    }
}

/// Pull vertices toward `target + home_offset`
pub fn apply_home_force(blob: &mut SoftBlob, stiffness: f32, inner_stiffness: f32) {
    let target = blob.target;
    for v in &mut blob.vertices {
        v.pos += (target + v.home_offset - v.pos) * stiffness;
    }
    for v in &mut blob.inner_vertices {
        v.pos += (target + v.home_offset - v.pos) * inner_stiffness;
    }
}

/// Move both ends of a spring toward its rest length, the lighter end further
#[inline]
fn relax(a: &mut Vertex, b: &mut Vertex, rest_length: f32, strength: f32) {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    if dist < MIN_DISTANCE {
        return;
    }
    let inv_a = 1.0 / a.mass.max(MIN_DISTANCE);
    let inv_b = 1.0 / b.mass.max(MIN_DISTANCE);
    let correction = delta * ((dist - rest_length) / dist * strength);
    a.pos += correction * (inv_a / (inv_a + inv_b));
    b.pos -= correction * (inv_b / (inv_a + inv_b));
}

/// Largest reach any vertex pair of `a` and `b` can have
fn max_reach(a: &SoftBlob, b: &SoftBlob, params: &PhysicsParams) -> f32 {
    let widest = |blob: &SoftBlob| {
        blob.vertices
            .iter()
            .map(|v| v.attraction_radius)
            .fold(0.0, f32::max)
    };
    params.attraction_radius * (widest(a) + widest(b)) / 2.0
}

/// Could any vertex of `a` be within `reach` of one of `b`?
fn boxes_within(a: &SoftBlob, b: &SoftBlob, reach: f32) -> bool {
    let (Some((lo_a, hi_a)), Some((lo_b, hi_b))) = (a.aabb(), b.aabb()) else {
        return false;
    };
    let gap = (lo_b - hi_a).max(lo_a - hi_b).max(Vec2::ZERO);
    gap.length() <= reach
}

/// One relaxation pass over ring and cross springs
pub fn apply_spring_constraints(blob: &mut SoftBlob, params: &PhysicsParams) {
    let strength = params.stiffness / 100.0;
    let SoftBlob {
        vertices,
        ring_springs,
        cross_springs,
        ..
    } = blob;

    for spring in ring_springs.iter().chain(cross_springs.iter()) {
        if spring.a == spring.b || spring.a >= vertices.len() || spring.b >= vertices.len() {
            continue;
        }
        let (a, b) = pair_mut(vertices, spring.a, spring.b);
        relax(a, b, spring.rest_length, strength);
    }
}

/// Push perimeter vertices radially to restore the rest area
pub fn apply_pressure(blob: &mut SoftBlob, params: &PhysicsParams) {
    let area = blob.area();
    if area < 1.0 {
        return;
    }
    let ratio = blob.rest_area / area;
    if (ratio - 1.0).abs() < 0.001 {
        return;
    }

    let push = ((ratio - 1.0) * params.pressure * 0.1).clamp(-MAX_PRESSURE_PUSH, MAX_PRESSURE_PUSH);
    let center = blob.centroid();
    for v in &mut blob.vertices {
        let offset = v.pos - center;
        let dist = offset.length();
        if dist < MIN_DISTANCE {
            continue;
        }
        v.pos += offset / dist * push;
    }
}

/// Clamp vertices into `bounds`, reflecting a fraction of the velocity
pub fn apply_boundary(blob: &mut SoftBlob, bounds: &Bounds) {
    for v in blob.vertices.iter_mut().chain(blob.inner_vertices.iter_mut()) {
        let velocity = v.velocity();
        if v.pos.x < bounds.min.x || v.pos.x > bounds.max.x {
            v.pos.x = v.pos.x.clamp(bounds.min.x, bounds.max.x);
            v.old_pos.x = v.pos.x + velocity.x * BOUNDARY_BOUNCE;
        }
        if v.pos.y < bounds.min.y || v.pos.y > bounds.max.y {
            v.pos.y = v.pos.y.clamp(bounds.min.y, bounds.max.y);
            v.old_pos.y = v.pos.y + velocity.y * BOUNDARY_BOUNCE;
        }
    }
}

/// Kick every perimeter vertex away from the centroid
pub fn apply_outward_impulse(blob: &mut SoftBlob, amplitude: f32) {
    let center = blob.centroid();
    for v in &mut blob.vertices {
        v.pos += (v.pos - center).normalize_or_zero() * amplitude;
    }
}

/// Rebuild merge tendrils from scratch.
///
/// For every pair of distinct same-colored blobs, each vertex of the first is tied
/// to its nearest vertex of the second when they are within reach. Reach scales
/// with the mean attraction multiplier of the two vertices.
pub fn update_attraction_springs(blobs: &[SoftBlob], params: &PhysicsParams) -> Vec<AttractionSpring> {
    let mut springs = Vec::new();
    for (i, a) in blobs.iter().enumerate() {
        for (j, b) in blobs.iter().enumerate().skip(i + 1) {
            if a.id == b.id || a.color != b.color || !boxes_within(a, b, max_reach(a, b, params)) {
                continue;
            }
            for (va, vert_a) in a.vertices.iter().enumerate() {
                let nearest = b
                    .vertices
                    .iter()
                    .enumerate()
                    .map(|(vb, vert_b)| (vb, vert_b, vert_a.pos.distance(vert_b.pos)))
                    .min_by(|x, y| x.2.total_cmp(&y.2));
                let Some((vb, vert_b, dist)) = nearest else {
                    continue;
                };
                let reach =
                    params.attraction_radius * (vert_a.attraction_radius + vert_b.attraction_radius) / 2.0;
                if dist <= reach {
                    springs.push(AttractionSpring {
                        blob_a: i,
                        blob_b: j,
                        vertex_a: va,
                        vertex_b: vb,
                        rest_length: params.attraction_rest_length.min(dist),
                    });
                }
            }
        }
    }
    springs
}

pub fn apply_attraction_springs(blobs: &mut [SoftBlob], springs: &[AttractionSpring], params: &PhysicsParams) {
    for s in springs {
        if s.blob_a == s.blob_b || s.blob_a >= blobs.len() || s.blob_b >= blobs.len() {
            continue;
        }
        let (a, b) = pair_mut(blobs, s.blob_a, s.blob_b);
        let (Some(va), Some(vb)) = (a.vertices.get_mut(s.vertex_a), b.vertices.get_mut(s.vertex_b)) else {
            continue;
        };
        relax(va, vb, s.rest_length, params.attraction_stiffness);
    }
}

/// One full physics step over every blob. `dt` is clamped for stability.
pub fn step_physics(blobs: &mut [SoftBlob], dt: f32, params: &PhysicsParams, bounds: &Bounds) {
    let dt = dt.clamp(0.0, MAX_PHYSICS_DT);
    for blob in blobs.iter_mut() {
        let (damping, home) = if blob.is_locked {
            let viscous = (1.0 - params.viscosity * 0.1).clamp(0.0, 1.0);
            (params.damping * viscous, params.home_stiffness * params.return_speed)
        } else {
            (params.damping, params.home_stiffness)
        };

        verlet_integrate(blob, dt, damping, params.gravity);
        apply_home_force(blob, home, params.inner_home_stiffness);
        for _ in 0..params.iterations {
            apply_spring_constraints(blob, params);
        }
        apply_pressure(blob, params);
        apply_boundary(blob, bounds);
    }
}

/// Two distinct mutable elements of a slice; `i != j`
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}
