//! Free energy of the membrane, used for status output and the divergence check.

use serde::{Deserialize, Serialize};

use super::System;
use crate::config::PressureMode;

/// Decomposition of the free energy
///
/// `total` excludes the external work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    pub total: f64,
    pub bending: f64,
    pub surface: f64,
    pub pressure: f64,
    pub kinetic: f64,
    pub chemical: f64,
    pub line: f64,
    pub external: f64,
}

/// Evaluates the energy of a system
pub trait EnergyEvaluator {
    fn evaluate(&self, system: &System) -> Energy;
}

/// Helfrich energy with area, volume, line, protein and external terms
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeEnergy;

impl FreeEnergy {
    pub fn bending(system: &System) -> f64 {
        let geometry = &system.geometry;
        let fields = &system.fields;
        (0..system.n_vertices())
            .map(|i| {
                let mismatch =
                    geometry.pointwise_mean_curvature(i) - fields.spontaneous_curvature[i];
                fields.bending_modulus[i] * mismatch * mismatch * geometry.vertex_dual_areas[i]
            })
            .sum()
    }

    pub fn surface(system: &System) -> f64 {
        let p = &system.parameters;
        let area = system.scalars.surface_area;
        if system.options.is_open_mesh() {
            p.surface_modulus * area
        } else {
            let ref_area = system.scalars.ref_surface_area();
            let excess = area - ref_area;
            0.5 * p.surface_modulus * excess * excess / ref_area + p.surface_lagrange * excess
        }
    }

    pub fn pressure(system: &System) -> f64 {
        let p = &system.parameters;
        let volume = system.scalars.volume;
        match system.options.pressure_mode {
            PressureMode::Open => -p.volume_modulus * volume,
            PressureMode::FixedReducedVolume => {
                let target = system.scalars.ref_volume() * p.reduced_volume;
                let excess = volume - target;
                0.5 * p.volume_modulus * excess * excess / target + p.volume_lagrange * excess
            }
            PressureMode::AmbientConcentration => {
                let c = p.ambient_concentration;
                if c > 0.0 {
                    p.volume_modulus * (c * volume - (c * volume).ln() - 1.0)
                } else {
                    -p.volume_modulus * volume.ln()
                }
            }
        }
    }

    pub fn kinetic(system: &System) -> f64 {
        0.5 * system
            .fields
            .velocities
            .iter()
            .map(|v| v.length_squared())
            .sum::<f64>()
    }

    pub fn chemical(system: &System) -> f64 {
        system.parameters.protein_binding * system.fields.protein_density.iter().sum::<f64>()
    }

    pub fn line(system: &System) -> f64 {
        system
            .line_tension
            .iter()
            .zip(&system.geometry.edge_lengths)
            .map(|(eta, l)| eta * l)
            .sum()
    }

    /// Work of the external force, -Σ F · x
    pub fn external(system: &System) -> f64 {
        -system
            .forces
            .external_vectors
            .iter()
            .zip(&system.fields.positions)
            .map(|(f, x)| f.dot(*x))
            .sum::<f64>()
    }
}

impl EnergyEvaluator for FreeEnergy {
    fn evaluate(&self, system: &System) -> Energy {
        let bending = Self::bending(system);
        let surface = Self::surface(system);
        let pressure = Self::pressure(system);
        let kinetic = Self::kinetic(system);
        let chemical = Self::chemical(system);
        let line = Self::line(system);
        let external = Self::external(system);

        Energy {
            total: bending + surface + pressure + kinetic + chemical + line,
            bending,
            surface,
            pressure,
            kinetic,
            chemical,
            line,
            external,
        }
    }
}
