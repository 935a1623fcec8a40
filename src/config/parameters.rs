//! Parameter structures for the membrane model and the time integrator.
//!
//! Physical constants are fixed for a run. Mode switches live in [`Options`]
//! and are resolved once, before the first force pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid configuration detected before a run starts
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),
    #[error("total time {total} is earlier than the starting time {init}")]
    EmptySchedule { init: f64, total: f64 },
    #[error("save period {save} is shorter than the time step {dt}")]
    SavePeriodTooShort { save: f64, dt: f64 },
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("reference vertex {index} is out of range for a mesh with {n_vertices} vertices")]
    ReferenceVertexOutOfRange { index: usize, n_vertices: usize },
    #[error("verbosity must be between 0 and 3, got {0}")]
    Verbosity(usize),
    #[error("{positions} positions given for a mesh with {n_vertices} vertices")]
    PositionCount { positions: usize, n_vertices: usize },
}

/// Physical parameters of the membrane
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Bending modulus Kb
    pub bending_modulus: f64,
    /// Spontaneous curvature H0 (the saturation value when the protein model is on)
    pub spontaneous_curvature: f64,
    /// Surface tension modulus Ksg
    pub surface_modulus: f64,
    /// Lagrange multiplier added to the surface tension
    pub surface_lagrange: f64,
    /// Volume (osmotic) modulus Kv
    pub volume_modulus: f64,
    /// Lagrange multiplier added to the reduced-volume pressure
    pub volume_lagrange: f64,
    /// Target reduced volume Vt
    pub reduced_volume: f64,
    /// Ambient concentration c_am
    pub ambient_concentration: f64,
    /// Line tension modulus η
    pub line_tension: f64,
    /// External force magnitude Kf
    pub external_force: f64,
    /// Spread of the external force: σ = max geodesic distance / concentration
    pub external_concentration: f64,
    /// Vertex the external force and the curvature domain are centred on
    pub reference_vertex: usize,
    /// Radius of the local spontaneous-curvature domain
    pub domain_radius: f64,
    /// Sharpness of the tanh domain profile
    pub domain_sharpness: f64,
    /// DPD friction coefficient γ
    pub friction: f64,
    /// Temperature T
    pub temperature: f64,
    /// Protein mobility Bc
    pub protein_mobility: f64,
    /// Protein binding energy ε
    pub protein_binding: f64,
    /// Protein density every vertex starts from
    pub initial_protein_density: f64,
    /// Seed of the generator behind the stochastic forces
    pub seed: u64,
}

impl Parameters {
    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from a JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded membrane parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse membrane parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Membrane parameters file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Check the parameters against a mesh with `n_vertices` vertices
    pub fn validate(&self, n_vertices: usize) -> Result<(), ConfigError> {
        if self.reference_vertex >= n_vertices {
            return Err(ConfigError::ReferenceVertexOutOfRange {
                index: self.reference_vertex,
                n_vertices,
            });
        }
        for (name, value) in [
            ("friction", self.friction),
            ("temperature", self.temperature),
            ("protein_mobility", self.protein_mobility),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            bending_modulus: 0.01,
            spontaneous_curvature: 0.0,
            surface_modulus: 2.0,
            surface_lagrange: 0.0,
            volume_modulus: 2.0,
            volume_lagrange: 0.0,
            reduced_volume: 0.7,
            ambient_concentration: 0.0,
            line_tension: 0.0,
            external_force: 0.0,
            external_concentration: 10.0,
            reference_vertex: 0,
            domain_radius: 0.5,
            domain_sharpness: 20.0,
            friction: 1.0,
            temperature: 0.0,
            protein_mobility: 0.0,
            protein_binding: 0.0,
            initial_protein_density: 1.0,
            seed: 0,
        }
    }
}

/// Closure relation for the osmotic pressure
///
/// Exactly one branch is active for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureMode {
    /// Patch with a boundary: constant inside excess pressure Kv
    Open,
    /// Closed vesicle pulled toward a target reduced volume
    FixedReducedVolume,
    /// Closed vesicle in a bath of fixed ambient concentration
    AmbientConcentration,
}

/// Discretisation of the Laplacian used by the linear-algebra bending force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaplacianKind {
    /// Standard cotangent weights
    Cotan,
    /// Cotangent weights with negative edge weights clamped to zero
    NonNegativeCotan,
}

/// Mode switches selecting closure relations and optional force terms
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub pressure_mode: PressureMode,
    /// Couple spontaneous curvature to the protein density and evolve it
    pub is_protein: bool,
    /// Tangentially relax vertices after every step
    pub is_vertex_shift: bool,
    /// Restrict spontaneous curvature to a domain around the reference vertex
    pub is_local_curvature: bool,
    pub laplacian: LaplacianKind,
}

impl Options {
    pub fn is_open_mesh(&self) -> bool {
        self.pressure_mode == PressureMode::Open
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            pressure_mode: PressureMode::FixedReducedVolume,
            is_protein: false,
            is_vertex_shift: false,
            is_local_curvature: false,
            laplacian: LaplacianKind::Cotan,
        }
    }
}

/// Settings of the velocity-Verlet driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Time step
    pub dt: f64,
    /// Simulated time at which the schedule ends
    pub total_time: f64,
    /// Absolute L2 tolerance on the physical force
    pub tolerance: f64,
    /// Simulated time between checkpoints
    pub save_period: f64,
    /// Simulated time between trajectory file rollovers
    pub rollover_period: f64,
    /// 0 = silent, 1 = checkpoints, 2 = status, 3 = full parameter dump
    pub verbosity: usize,
    /// Relative jump of the error norm between checkpoints that aborts the run
    pub error_jump_limit: f64,
    pub output_dir: PathBuf,
    /// Starting time offset
    pub init_time: f64,
}

impl IntegratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt > 0.0) {
            return Err(ConfigError::NonPositiveTimeStep(self.dt));
        }
        if self.total_time < self.init_time {
            return Err(ConfigError::EmptySchedule {
                init: self.init_time,
                total: self.total_time,
            });
        }
        if self.save_period < self.dt {
            return Err(ConfigError::SavePeriodTooShort {
                save: self.save_period,
                dt: self.dt,
            });
        }
        if self.verbosity > 3 {
            return Err(ConfigError::Verbosity(self.verbosity));
        }
        Ok(())
    }

    /// Steps between checkpoints, never zero
    pub fn save_every(&self) -> usize {
        ((self.save_period / self.dt).round() as usize).max(1)
    }

    /// Checkpoint frames per trajectory file, never zero
    pub fn frames_per_file(&self) -> usize {
        ((self.rollover_period / self.save_period).round() as usize).max(1)
    }

    /// Index of the last scheduled step
    ///
    /// Quotients within 1e-9 of an integer count as that integer.
    pub fn last_step(&self) -> usize {
        let steps = (self.total_time - self.init_time) / self.dt;
        let nearest = steps.round();
        if (steps - nearest).abs() < 1e-9 {
            nearest as usize
        } else {
            steps.floor() as usize
        }
    }
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            total_time: 100.0,
            tolerance: 1e-3,
            save_period: 1.0,
            rollover_period: 100.0,
            verbosity: 1,
            error_jump_limit: 600.0,
            output_dir: PathBuf::from("output"),
            init_time: 0.0,
        }
    }
}
