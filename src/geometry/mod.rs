//! Geometry module for triangulated membrane surfaces.
//!
//! Contains the halfedge mesh topology, parametric initial shapes, the
//! discrete differential geometry of an embedding and surface distances.

mod discrete;
mod geodesic;
mod mesh;
pub mod operators;
mod shapes;

pub use discrete::{enclosed_volume, signed_volume, Geometry};
pub use geodesic::geodesic_distance;
pub use mesh::{EdgeId, FaceId, HalfedgeId, Mesh, MeshError, VertexId};
pub use operators::LinearOperator;
pub use shapes::{ellipsoid, icosphere, spherical_cap};
