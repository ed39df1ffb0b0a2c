// Per-spacecraft partition files.
//
// A run holds one open Arrow writer per spacecraft id: creating the writer
// replaces whatever a previous run left at that path, later chunks append
// through it, and closing it finalizes the Parquet footer. The writer map
// doubles as the "seen this run" set and lives no longer than one run.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ::parquet::arrow::ArrowWriter;
use arrow::array::RecordBatch;
use tracing::info;

use crate::error::SplitError;
use crate::parquet::writer_properties;

/// Sink routing sub-batches into one Parquet file per spacecraft id.
pub struct PartitionSink {
    out_dir: PathBuf,
    writers: HashMap<String, ArrowWriter<File>>,
}

impl PartitionSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            writers: HashMap::new(),
        }
    }

    /// Path of the partition file for one spacecraft id.
    pub fn partition_path(&self, spacecraft: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}.parquet", sanitize_key(spacecraft)))
    }

    /// Whether a partition for this id has already been written this run.
    pub fn contains(&self, spacecraft: &str) -> bool {
        self.writers.contains_key(spacecraft)
    }

    /// Append one sub-batch to its partition, opening the writer on first sight.
    pub fn append(&mut self, spacecraft: &str, batch: &RecordBatch) -> Result<(), SplitError> {
        if let Some(writer) = self.writers.get_mut(spacecraft) {
            writer.write(batch)?;
            return Ok(());
        }

        let path = self.partition_path(spacecraft);
        remove_if_exists(&path)?;
        let file = File::create(&path)?;
        let mut writer =
            ArrowWriter::try_new(file, batch.schema(), Some(writer_properties().clone()))?;
        writer.write(batch)?;
        info!(spacecraft, path = %path.display(), "created partition");
        self.writers.insert(spacecraft.to_string(), writer);
        Ok(())
    }

    /// Close every writer, finalizing the Parquet footers.
    ///
    /// Returns the partition paths in sorted order.
    pub fn finish(self) -> Result<Vec<PathBuf>, SplitError> {
        let out_dir = self.out_dir;
        let mut paths = Vec::with_capacity(self.writers.len());
        for (spacecraft, writer) in self.writers {
            writer.close()?;
            paths.push(out_dir.join(format!("{}.parquet", sanitize_key(&spacecraft))));
        }
        paths.sort();
        Ok(paths)
    }
}

/// Absence is not an error for cleanup deletes.
fn remove_if_exists(path: &Path) -> Result<(), SplitError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Sanitize a spacecraft id for use as a file name.
fn sanitize_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
