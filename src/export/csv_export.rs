//! CSV time-series export for run status.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use super::checkpoint::{CheckpointSink, Frame};

/// Record for CSV time-series export
#[derive(Debug, Clone, Serialize)]
pub struct StatusRecord {
    pub frame: usize,
    pub time: f64,
    pub l2_error_norm: f64,
    pub surface_area: f64,
    pub volume: f64,
    pub total_energy: f64,
    pub bending_energy: f64,
    pub surface_energy: f64,
    pub pressure_energy: f64,
    pub kinetic_energy: f64,
    pub chemical_energy: f64,
    pub line_energy: f64,
    pub external_energy: f64,
}

impl From<&Frame<'_>> for StatusRecord {
    fn from(f: &Frame<'_>) -> Self {
        Self {
            frame: f.index,
            time: f.time,
            l2_error_norm: f.l2_error_norm,
            surface_area: f.surface_area,
            volume: f.volume,
            total_energy: f.energy.total,
            bending_energy: f.energy.bending,
            surface_energy: f.energy.surface,
            pressure_energy: f.energy.pressure,
            kinetic_energy: f.energy.kinetic,
            chemical_energy: f.energy.chemical,
            line_energy: f.energy.line,
            external_energy: f.energy.external,
        }
    }
}

/// CSV exporter for per-frame status
pub struct CsvStatusLog {
    writer: csv::Writer<File>,
    /// Path to output file
    path: PathBuf,
}

impl CsvStatusLog {
    /// Create `status_YYYYMMDD_HHMMSS.csv` inside `dir`
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("status_{}.csv", timestamp));

        let file = File::create(&path)?;
        let writer = csv::Writer::from_writer(file);

        log::info!("CSV status log started: {}", path.display());

        Ok(Self { writer, path })
    }

    /// Get the output path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointSink for CsvStatusLog {
    fn save(&mut self, frame: &Frame<'_>) -> Result<()> {
        self.writer.serialize(StatusRecord::from(frame))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        log::info!("CSV status log completed: {}", self.path.display());
        Ok(())
    }
}
