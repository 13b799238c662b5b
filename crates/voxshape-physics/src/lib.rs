//! Voxel collision and physics for the voxshape engine.

pub mod raycast;
pub mod sweep;

pub use raycast::{raycast, PlacedShape, RaycastHit};
pub use sweep::collide_movement;
