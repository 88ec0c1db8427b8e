//! Scalar telemetry sinks.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Destination for named scalars tagged with a step index.
pub trait ScalarSink {
    /// Record one value.
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()>;

    /// Persist buffered values.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackHole;

impl ScalarSink for BlackHole {
    fn add_scalar(&mut self, _tag: &str, _value: f64, _step: usize) -> Result<()> {
        Ok(())
    }
}

/// Appends [`ScalarRecord`] rows to a CSV file.
pub struct CsvScalarWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvScalarWriter {
    /// File name used inside a run directory.
    pub const FILE_NAME: &'static str = "scalars.csv";

    /// Open `scalars.csv` in `dir`, writing the header if the file is new.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(Self::FILE_NAME);
        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(["tag", "step", "value"])?;
        }
        Ok(Self { path, writer })
    }

    /// Path of the CSV file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScalarSink for CsvScalarWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.writer.serialize(ScalarRecord {
            tag: tag.to_string(),
            step,
            value,
        })?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One recorded scalar; also the row layout of `scalars.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    /// Tag, e.g. `train/loss`.
    pub tag: String,
    /// Step index.
    pub step: usize,
    /// Value.
    pub value: f64,
}

/// Keeps scalars in memory; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<ScalarRecord>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order.
    pub fn records(&self) -> Vec<ScalarRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// `(step, value)` pairs for one tag.
    pub fn values(&self, tag: &str) -> Vec<(usize, f64)> {
        self.records()
            .into_iter()
            .filter(|r| r.tag == tag)
            .map(|r| (r.step, r.value))
            .collect()
    }
}

impl ScalarSink for MemorySink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        let record = ScalarRecord {
            tag: tag.to_string(),
            step,
            value,
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        Ok(())
    }
}
