//! JSON-lines trajectory export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;

use super::checkpoint::{CheckpointSink, Frame};

/// Writes one JSON object per frame, starting a new file every `frames_per_file` frames
///
/// Files are named `trajectory_YYYYMMDD_HHMMSS_NNN.jsonl`.
pub struct JsonTrajectory {
    dir: PathBuf,
    stamp: String,
    frames_per_file: usize,
    frames_in_file: usize,
    writer: Option<BufWriter<File>>,
    paths: Vec<PathBuf>,
}

impl JsonTrajectory {
    /// Create the output directory; files are opened on the first frame
    pub fn new<P: AsRef<Path>>(dir: P, frames_per_file: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            stamp: Local::now().format("%Y%m%d_%H%M%S").to_string(),
            frames_per_file: frames_per_file.max(1),
            frames_in_file: 0,
            writer: None,
            paths: Vec::new(),
        })
    }

    /// Files written so far
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn roll_over(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        let filename = format!("trajectory_{}_{:03}.jsonl", self.stamp, self.paths.len());
        let path = self.dir.join(filename);
        self.writer = Some(BufWriter::new(File::create(&path)?));
        log::info!("Trajectory file started: {}", path.display());
        self.paths.push(path);
        self.frames_in_file = 0;
        Ok(())
    }
}

impl CheckpointSink for JsonTrajectory {
    fn save(&mut self, frame: &Frame<'_>) -> Result<()> {
        if self.writer.is_none() || self.frames_in_file == self.frames_per_file {
            self.roll_over()?;
        }
        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, frame)?;
            writer.write_all(b"\n")?;
        }
        self.frames_in_file += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
