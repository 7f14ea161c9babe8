//! Verlet soft-body simulation for goop blobs
//!
//! Purely visual: blobs track grid groups but never feed back into the grid.

pub mod factory;
pub mod physics;
pub mod types;
pub mod world;

pub use factory::{create_blob_from_cells, create_piece_blob, trace_outline};
pub use physics::step_physics;
pub use types::{AttractionSpring, BlobId, Bounds, PhysicsParams, SoftBlob, Spring, Vertex};
pub use world::{FILL_RATE, PULSE_AMPLITUDE, SoftBodyWorld};
