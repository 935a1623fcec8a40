//! Per-vertex fields evolved by the integrator.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::config::Parameters;

/// Kinematic and material state carried by each vertex
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexFields {
    pub positions: Vec<DVec3>,
    pub velocities: Vec<DVec3>,
    /// Protein density φ, unconstrained in sign
    pub protein_density: Vec<f64>,
    /// Local bending modulus Kb
    pub bending_modulus: Vec<f64>,
    /// Local spontaneous curvature H0, refreshed with the geometry
    pub spontaneous_curvature: Vec<f64>,
    /// Surface distance to the reference vertex, fixed at construction
    pub geodesic_distance: Vec<f64>,
}

impl VertexFields {
    /// Fields at rest with uniform material properties
    pub fn new(positions: Vec<DVec3>, params: &Parameters) -> Self {
        let n = positions.len();
        Self {
            positions,
            velocities: vec![DVec3::ZERO; n],
            protein_density: vec![params.initial_protein_density; n],
            bending_modulus: vec![params.bending_modulus; n],
            spontaneous_curvature: vec![params.spontaneous_curvature; n],
            geodesic_distance: vec![0.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Mean vertex position
    pub fn center_of_mass(&self) -> DVec3 {
        if self.positions.is_empty() {
            return DVec3::ZERO;
        }
        self.positions.iter().sum::<DVec3>() / self.positions.len() as f64
    }
}
