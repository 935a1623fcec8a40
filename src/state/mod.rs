//! State management for the membrane simulation.
//!
//! Contains the per-vertex fields, the force buffers of one force pass and
//! the global scalar state.

mod forces;
mod scalars;
mod vertex;

pub use forces::ForceFields;
pub use scalars::{sphere_volume_for_area, ScalarState};
pub use vertex::VertexFields;
