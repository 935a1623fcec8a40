//! Membrane Simulator X - Helfrich membrane mechanics on triangle meshes
//!
//! This library evolves a closed vesicle or open membrane patch under bending,
//! surface tension, osmotic pressure, line tension, external load and a DPD
//! thermostat, with optional protein-driven spontaneous curvature.

pub mod config;
pub mod export;
pub mod geometry;
pub mod physics;
pub mod state;

pub use config::{IntegratorConfig, Options, Parameters, PressureMode};
pub use export::{CheckpointSink, CsvStatusLog, JsonTrajectory};
pub use geometry::{Geometry, Mesh};
pub use physics::{Energy, IntegrationReport, System, Termination, VelocityVerlet};
