//! Force buffers produced by one force pass.
//!
//! Every buffer is overwritten by each pass; nothing accumulates across steps.

use glam::DVec3;

/// Per-vertex forces and the chemical potential
#[derive(Debug, Clone)]
pub struct ForceFields {
    pub bending: Vec<DVec3>,
    pub capillary: Vec<DVec3>,
    pub osmotic: Vec<DVec3>,
    /// bending + capillary + osmotic
    pub fundamental: Vec<DVec3>,

    /// Line-capillary force magnitude along the vertex normal
    pub line_capillary: Vec<f64>,
    /// External force magnitude along the vertex normal
    pub external: Vec<f64>,
    /// External force as vectors, kept for the external energy
    pub external_vectors: Vec<DVec3>,

    pub damping: Vec<DVec3>,
    pub stochastic: Vec<DVec3>,

    /// fundamental + line-capillary + external
    pub physical: Vec<DVec3>,

    pub chemical_potential: Vec<f64>,

    /// Normal bending force from the Laplacian formulation
    pub bending_pressure: Vec<f64>,
    /// Closed-form capillary force magnitude
    pub capillary_pressure: Vec<f64>,
    /// Closed-form osmotic force magnitude
    pub osmotic_pressure: Vec<f64>,
    /// False when the last Laplacian bending pass produced outliers
    pub is_smooth: bool,
}

impl ForceFields {
    pub fn new(n_vertices: usize) -> Self {
        Self {
            bending: vec![DVec3::ZERO; n_vertices],
            capillary: vec![DVec3::ZERO; n_vertices],
            osmotic: vec![DVec3::ZERO; n_vertices],
            fundamental: vec![DVec3::ZERO; n_vertices],
            line_capillary: vec![0.0; n_vertices],
            external: vec![0.0; n_vertices],
            external_vectors: vec![DVec3::ZERO; n_vertices],
            damping: vec![DVec3::ZERO; n_vertices],
            stochastic: vec![DVec3::ZERO; n_vertices],
            physical: vec![DVec3::ZERO; n_vertices],
            chemical_potential: vec![0.0; n_vertices],
            bending_pressure: vec![0.0; n_vertices],
            capillary_pressure: vec![0.0; n_vertices],
            osmotic_pressure: vec![0.0; n_vertices],
            is_smooth: true,
        }
    }

    /// Zero every buffer written by a physical force pass
    pub fn reset_physical(&mut self) {
        for buffer in [
            &mut self.bending,
            &mut self.capillary,
            &mut self.osmotic,
            &mut self.fundamental,
            &mut self.external_vectors,
            &mut self.physical,
        ] {
            buffer.fill(DVec3::ZERO);
        }
        for buffer in [
            &mut self.line_capillary,
            &mut self.external,
            &mut self.chemical_potential,
        ] {
            buffer.fill(0.0);
        }
    }

    /// Zero the DPD buffers
    pub fn reset_dpd(&mut self) {
        self.damping.fill(DVec3::ZERO);
        self.stochastic.fill(DVec3::ZERO);
    }

    /// damping + stochastic
    pub fn dpd(&self) -> Vec<DVec3> {
        self.damping
            .iter()
            .zip(&self.stochastic)
            .map(|(d, s)| *d + *s)
            .collect()
    }
}
