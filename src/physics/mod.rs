//! Physics simulation module for Helfrich membrane mechanics.
//!
//! This module implements:
//! - Bending, capillary and osmotic forces from the discrete Helfrich energy
//! - Line tension across spontaneous-curvature domains, external loads and
//!   protein chemical potential
//! - DPD (Dissipative Particle Dynamics) thermostat on mesh edges
//! - Velocity-Verlet time integration with convergence and divergence checks
//!
//! References:
//! - Helfrich, Z Naturforsch C 1973
//! - DPD: Groot & Warren, J Chem Phys 1997
//! - Discrete curvature: Crane, Discrete Differential Geometry notes 2019

mod diagnostics;
pub mod dpd;
mod energy;
mod forces;
mod integrator;
mod regularization;
mod system;

pub use diagnostics::{has_outlier, l2_error_norm, remove_rotation, remove_translation};
pub use dpd::{noise_amplitude, K_BOLTZMANN};
pub use energy::{Energy, EnergyEvaluator, FreeEnergy};
pub use integrator::{IntegrationReport, Termination, VelocityVerlet};
pub use regularization::{NoRegularization, Regularizer, TangentialRelaxation};
pub use system::System;
