//! Plain-text step logger.

use crate::error::Result;
use crate::observer::ModelObserver;
use crate::tree::ModelTree;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// What each log line records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogRecord {
    /// `time, x, y, z` of the mass-weighted centre of all bodies.
    CenterOfMass,
    /// `time` followed by `rest, length, tension` for every cable.
    Actuators,
}

/// Appends one comma-separated line per step to a file.
///
/// The file is opened in append mode on setup and flushed on teardown, so
/// several episodes accumulate in the same file.
#[derive(Debug)]
pub struct SimpleLogger {
    path: PathBuf,
    record: LogRecord,
    time: f32,
    out: Option<BufWriter<File>>,
}

impl SimpleLogger {
    /// Creates a logger writing to `path`. The file is opened on setup.
    pub fn new(path: impl AsRef<Path>, record: LogRecord) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            record,
            time: 0.0,
            out: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn line(&self, model: &ModelTree) -> String {
        let mut fields = vec![self.time];
        match self.record {
            LogRecord::CenterOfMass => {
                let com = model.center_of_mass().unwrap_or_default();
                fields.extend([com.x, com.y, com.z]);
            }
            LogRecord::Actuators => {
                for a in model.actuators() {
                    fields.extend([a.rest_length(), a.current_length(), a.tension()]);
                }
            }
        }
        fields.iter().map(f32::to_string).collect::<Vec<_>>().join(", ")
    }
}

impl ModelObserver for SimpleLogger {
    fn on_setup(&mut self, _model: &mut ModelTree) -> Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.out = Some(BufWriter::new(file));
        self.time = 0.0;
        debug!("logging {:?} to {}", self.record, self.path.display());
        Ok(())
    }

    fn on_step(&mut self, model: &mut ModelTree, dt: f32) -> Result<()> {
        self.time += dt;
        let line = self.line(model);
        if let Some(out) = self.out.as_mut() {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn on_teardown(&mut self, _model: &mut ModelTree) -> Result<()> {
        if let Some(mut out) = self.out.take() {
            out.flush()?;
        }
        Ok(())
    }
}
