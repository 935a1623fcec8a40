//! Time integration for the membrane.
//!
//! Implements Velocity-Verlet integration over a fixed step:
//! 1. x(t + dt) = x(t) + dt * v(t) + (dt²/2) * F(t) + dt * R(t)
//! 2. v(t + dt) = v(t) + (dt/2) * (F(t - dt) + F(t))
//!
//! where F is the physical plus DPD force of the previous and current pass and
//! R the regularization displacement rate. Unit vertex mass is assumed.
//!
//! The loop ends in exactly one of three states: converged (L2 norm of the
//! physical force under the tolerance), schedule exhausted, or diverged (the
//! error norm jumped between checkpoints).
//!
//! Reference: Swope et al., J Chem Phys 1982

use anyhow::Result;
use glam::DVec3;
use serde::Serialize;

use super::diagnostics::l2_error_norm;
use super::energy::{Energy, EnergyEvaluator, FreeEnergy};
use super::regularization::{NoRegularization, Regularizer};
use super::System;
use crate::config::IntegratorConfig;
use crate::export::{CheckpointSink, Frame};

/// Error norm the first checkpoint is compared against
const INITIAL_ERROR_NORM: f64 = 1e6;

/// Terminal state of an integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// Physical-force norm fell below the tolerance
    Converged,
    /// Reached the last scheduled step
    ScheduleExhausted,
    /// Error norm jumped past the limit, or stopped being finite
    Diverged,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationReport {
    pub outcome: Termination,
    /// Index of the step the run stopped on
    pub steps: usize,
    pub time: f64,
    /// Frames handed to the checkpoint sink
    pub frames: usize,
    pub final_l2_norm: f64,
    pub energy: Energy,
}

/// Reference values for the relative changes in the status block
struct StatusBaseline {
    bending_energy: f64,
}

/// Velocity-Verlet integrator
pub struct VelocityVerlet {
    pub config: IntegratorConfig,
    energy: Box<dyn EnergyEvaluator>,
    regularizer: Box<dyn Regularizer>,
}

impl VelocityVerlet {
    /// Create an integrator with the free energy and no regularization
    pub fn new(config: IntegratorConfig) -> Self {
        Self {
            config,
            energy: Box::new(FreeEnergy),
            regularizer: Box::new(NoRegularization),
        }
    }

    pub fn with_energy(mut self, energy: Box<dyn EnergyEvaluator>) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_regularizer(mut self, regularizer: Box<dyn Regularizer>) -> Self {
        self.regularizer = regularizer;
        self
    }

    /// Run the schedule on `system`, handing checkpoints to `sink`
    pub fn integrate(
        &mut self,
        system: &mut System,
        sink: &mut dyn CheckpointSink,
    ) -> Result<IntegrationReport> {
        self.config.validate()?;

        let dt = self.config.dt;
        let save_every = self.config.save_every();
        let last_step = self.config.last_step();
        let verbosity = self.config.verbosity;

        if verbosity >= 3 {
            log::info!(
                "Integrator settings:\n{}",
                serde_json::to_string_pretty(&self.config)?
            );
            log::info!(
                "Membrane parameters:\n{}",
                serde_json::to_string_pretty(&system.parameters)?
            );
            log::info!("Options:\n{}", serde_json::to_string_pretty(&system.options)?);
        }

        system.time = self.config.init_time;
        let n = system.n_vertices();
        let mut previous_force = vec![DVec3::ZERO; n];
        let mut old_l2 = INITIAL_ERROR_NORM;
        let mut baseline = StatusBaseline {
            bending_energy: FreeEnergy::bending(system),
        };
        let mut frames = 0;
        let mut step = 0;

        let (outcome, l2, energy) = loop {
            system.compute_physical_forces();
            system.compute_dpd_forces(dt);
            let regularization = self.regularizer.regularization_force(system);
            let dpd = system.forces.dpd();
            let new_force: Vec<DVec3> = system
                .forces
                .physical
                .iter()
                .zip(&dpd)
                .map(|(f, d)| *f + *d)
                .collect();

            let l2 = l2_error_norm(&system.forces.physical);

            if step == last_step || l2 < self.config.tolerance {
                let energy = self.energy.evaluate(system);
                save_frame(sink, system, frames, l2, energy)?;
                frames += 1;
                let outcome = if l2 < self.config.tolerance {
                    Termination::Converged
                } else {
                    Termination::ScheduleExhausted
                };
                break (outcome, l2, energy);
            }

            if step % save_every == 0 {
                let energy = self.energy.evaluate(system);
                let jump = (l2 - old_l2) / old_l2;

                if !l2.is_finite() || jump.abs() > self.config.error_jump_limit {
                    log::warn!(
                        "L2 error norm jumped by {:.3e} (limit {}) at t = {:.4}, aborting",
                        jump,
                        self.config.error_jump_limit,
                        system.time
                    );
                    save_frame(sink, system, frames, l2, energy)?;
                    frames += 1;
                    break (Termination::Diverged, l2, energy);
                }

                if verbosity >= 2 {
                    self.log_status(system, frames, l2, jump, &energy, &mut baseline);
                }
                save_frame(sink, system, frames, l2, energy)?;
                frames += 1;
                old_l2 = l2;
            }

            let half_dt_sq = 0.5 * dt * dt;
            let fields = &mut system.fields;
            for i in 0..n {
                fields.positions[i] += fields.velocities[i] * dt
                    + previous_force[i] * half_dt_sq
                    + regularization[i] * dt;
                fields.velocities[i] += (previous_force[i] + new_force[i]) * (0.5 * dt);
            }
            previous_force = new_force;

            if system.options.is_protein {
                let mobility = system.parameters.protein_mobility;
                for (phi, mu) in fields
                    .protein_density
                    .iter_mut()
                    .zip(&system.forces.chemical_potential)
                {
                    *phi -= mobility * mu * dt;
                }
            }

            system.time += dt;
            system.update_vertex_positions();

            if system.options.is_vertex_shift {
                self.regularizer.vertex_shift(system);
                system.update_vertex_positions();
            }

            step += 1;
        };

        sink.finish()?;

        if verbosity >= 1 {
            log::info!(
                "Integration finished: {:?} after {} steps, t = {:.4}, |F| = {:.3e}, {} frames",
                outcome,
                step,
                system.time,
                l2,
                frames
            );
        }

        Ok(IntegrationReport {
            outcome,
            steps: step,
            time: system.time,
            frames,
            final_l2_norm: l2,
            energy,
        })
    }

    fn log_status(
        &self,
        system: &mut System,
        frame: usize,
        l2: f64,
        jump: f64,
        energy: &Energy,
        baseline: &mut StatusBaseline,
    ) {
        let scalars = &system.scalars;
        let d_area = (scalars.surface_area - scalars.ref_surface_area()) / scalars.ref_surface_area();
        let d_volume = if system.options.is_open_mesh() {
            scalars.volume
        } else {
            scalars.reduced_volume() - system.parameters.reduced_volume
        };
        let d_bending = if baseline.bending_energy != 0.0 {
            (energy.bending - baseline.bending_energy) / baseline.bending_energy
        } else {
            0.0
        };
        baseline.bending_energy = energy.bending;

        system.compute_bending_force();

        log::info!("t: {:.4}, frame: {}", system.time, frame);
        log::info!(
            "dArea: {:.4e}, dVolume: {:.4e}, dBE: {:.4e}, dL2ErrorNorm: {:.4e}",
            d_area,
            d_volume,
            d_bending,
            jump
        );
        log::info!(
            "E_total: {:.6e}, E_bend: {:.6e}, E_surf: {:.6e}, E_pres: {:.6e}, E_kin: {:.6e}, \
             E_chem: {:.6e}, E_line: {:.6e}, W_ext: {:.6e}",
            energy.total,
            energy.bending,
            energy.surface,
            energy.pressure,
            energy.kinetic,
            energy.chemical,
            energy.line,
            energy.external
        );
        log::info!(
            "|F|: {:.4e}, COM: {:?}, height: {:.4}, smooth: {}",
            l2,
            system.fields.center_of_mass(),
            system.reference_height(),
            system.forces.is_smooth
        );
    }
}

fn save_frame(
    sink: &mut dyn CheckpointSink,
    system: &System,
    index: usize,
    l2: f64,
    energy: Energy,
) -> Result<()> {
    let frame = Frame {
        index,
        time: system.time,
        l2_error_norm: l2,
        energy,
        surface_area: system.scalars.surface_area,
        volume: system.scalars.volume,
        positions: &system.fields.positions,
        velocities: &system.fields.velocities,
        protein_density: &system.fields.protein_density,
    };
    sink.save(&frame)?;
    log::debug!("Saved frame {} at t = {:.4}", index, system.time);
    Ok(())
}
