//! Export functionality for simulation data.
//!
//! Provides checkpoint sinks: JSON-lines trajectories with file rollover and
//! a CSV status time series.

mod checkpoint;
mod csv_export;
mod json_export;

pub use checkpoint::{CheckpointSink, Frame, MemorySink, MultiSink};
pub use csv_export::{CsvStatusLog, StatusRecord};
pub use json_export::JsonTrajectory;
