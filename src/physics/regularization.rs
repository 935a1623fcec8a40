//! Mesh regularization: tangential corrections that keep triangles well shaped
//! without changing the surface the vertices sample.

use glam::DVec3;

use super::diagnostics::{remove_rotation, remove_translation};
use super::System;

/// Source of mesh-quality corrections folded into the position update
pub trait Regularizer {
    /// Displacement rate added to the position update, one entry per vertex
    fn regularization_force(&mut self, system: &System) -> Vec<DVec3>;

    /// Move vertices in place; the caller refreshes the geometry afterwards
    fn vertex_shift(&mut self, system: &mut System);
}

/// Leaves the mesh untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegularization;

impl Regularizer for NoRegularization {
    fn regularization_force(&mut self, system: &System) -> Vec<DVec3> {
        vec![DVec3::ZERO; system.n_vertices()]
    }

    fn vertex_shift(&mut self, _system: &mut System) {}
}

/// Pulls each interior vertex toward its one-ring centroid within the tangent plane
#[derive(Debug, Clone, Copy)]
pub struct TangentialRelaxation {
    /// Rate of the continuous pull applied through the regularization force
    pub stiffness: f64,
}

impl Default for TangentialRelaxation {
    fn default() -> Self {
        Self { stiffness: 0.0 }
    }
}

impl TangentialRelaxation {
    pub fn new(stiffness: f64) -> Self {
        Self { stiffness }
    }

    /// Centroid offsets with the normal component projected out; zero on the boundary
    fn tangential_offsets(system: &System) -> Vec<DVec3> {
        let mesh = &system.mesh;
        let pos = &system.fields.positions;
        mesh.vertices()
            .map(|v| {
                if mesh.is_boundary_vertex(v) {
                    return DVec3::ZERO;
                }
                let (sum, count) = mesh
                    .neighbors(v)
                    .fold((DVec3::ZERO, 0usize), |(sum, count), u| {
                        (sum + pos[u.index()], count + 1)
                    });
                let offset = sum / count as f64 - pos[v.index()];
                let n = system.geometry.vertex_normals[v.index()];
                offset - offset.dot(n) * n
            })
            .collect()
    }
}

impl Regularizer for TangentialRelaxation {
    fn regularization_force(&mut self, system: &System) -> Vec<DVec3> {
        if self.stiffness == 0.0 {
            return vec![DVec3::ZERO; system.n_vertices()];
        }
        let mut force: Vec<DVec3> = Self::tangential_offsets(system)
            .into_iter()
            .map(|d| self.stiffness * d)
            .collect();
        if !system.mesh.has_boundary() {
            remove_translation(&mut force);
            remove_rotation(&system.fields.positions, &mut force);
        }
        force
    }

    fn vertex_shift(&mut self, system: &mut System) {
        let offsets = Self::tangential_offsets(system);
        for (p, d) in system.fields.positions.iter_mut().zip(offsets) {
            *p += d;
        }
    }
}
