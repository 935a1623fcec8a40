//! Checkpoint frames and the sinks that persist them.

use anyhow::Result;
use glam::DVec3;
use serde::Serialize;

use crate::physics::Energy;

/// Snapshot of the membrane at a save step
#[derive(Debug, Clone, Serialize)]
pub struct Frame<'a> {
    /// Sequential frame number
    pub index: usize,
    pub time: f64,
    pub l2_error_norm: f64,
    pub energy: Energy,
    pub surface_area: f64,
    pub volume: f64,
    pub positions: &'a [DVec3],
    pub velocities: &'a [DVec3],
    pub protein_density: &'a [f64],
}

/// Destination for checkpoint frames
pub trait CheckpointSink {
    fn save(&mut self, frame: &Frame<'_>) -> Result<()>;

    /// Flush buffered output at the end of a run
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps frames in memory as owned records
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub times: Vec<f64>,
    pub energies: Vec<Energy>,
    pub l2_error_norms: Vec<f64>,
    pub positions: Vec<Vec<DVec3>>,
}

impl CheckpointSink for MemorySink {
    fn save(&mut self, frame: &Frame<'_>) -> Result<()> {
        self.times.push(frame.time);
        self.energies.push(frame.energy);
        self.l2_error_norms.push(frame.l2_error_norm);
        self.positions.push(frame.positions.to_vec());
        Ok(())
    }
}

/// Forwards every frame to each inner sink in order
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn CheckpointSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn CheckpointSink>) {
        self.sinks.push(sink);
    }
}

impl CheckpointSink for MultiSink {
    fn save(&mut self, frame: &Frame<'_>) -> Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.save(frame)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.finish()?;
        }
        Ok(())
    }
}
