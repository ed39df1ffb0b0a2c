// Chunked partition-and-append over the scene-metadata index.
//
// The index is far larger than memory, so it is consumed as a forward-only
// sequence of fixed-size record batches: filter out preliminary rows, then
// route each sub-batch to its spacecraft partition in a single pass. The
// sequence is not restartable; a failure mid-stream leaves partitions
// partially written and the caller decides what to do about it.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use arrow::array::cast::AsArray;
use arrow::array::{Array, RecordBatch, StringArray};
use arrow::compute::kernels::boolean::{is_null, or_kleene};
use arrow::compute::kernels::cmp::{eq, neq};
use arrow::compute::kernels::filter::{filter_record_batch, prep_null_mask_filter};
use arrow::csv::ReaderBuilder;
use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::SplitError;
use crate::partition::PartitionSink;
use crate::schema::{
    require_column, utf8_schema_from_header, COLLECTION_NUMBER, PRE_COLLECTION, SPACECRAFT_ID,
};

/// Rows per chunk when the caller does not configure a bound.
pub const DEFAULT_CHUNK_ROWS: usize = 250_000;

/// Outcome of one extraction run.
#[derive(Debug, Clone, Default)]
pub struct SplitSummary {
    /// Rows read from the source, preliminary rows included.
    pub rows_read: usize,
    /// Rows excluded for carrying the preliminary collection number.
    pub rows_dropped: usize,
    /// Partition files written, sorted by path.
    pub partitions: Vec<PathBuf>,
}

/// Split a scene-metadata CSV into one Parquet partition per spacecraft id.
///
/// `source` may be gzip-compressed (`.gz` suffix) or plain CSV. At most
/// `chunk_rows` rows are materialized at a time. Partition files land
/// directly in `out_dir`; files from prior runs are replaced, never merged.
pub fn split_scenes(
    source: &Path,
    out_dir: &Path,
    chunk_rows: usize,
) -> Result<SplitSummary, SplitError> {
    if chunk_rows == 0 {
        return Err(SplitError::InvalidChunkSize);
    }

    let schema = utf8_schema_from_header(open_source(source)?)?;
    require_column(&schema, SPACECRAFT_ID)?;
    require_column(&schema, COLLECTION_NUMBER)?;

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_batch_size(chunk_rows)
        .build(open_source(source)?)?;

    info!(source = %source.display(), out_dir = %out_dir.display(), "splitting scene metadata");

    let mut sink = PartitionSink::new(out_dir);
    let mut summary = SplitSummary::default();

    for batch in reader {
        let batch = batch?;
        summary.rows_read += batch.num_rows();

        let kept = drop_preliminary(&batch)?;
        summary.rows_dropped += batch.num_rows() - kept.num_rows();
        if kept.num_rows() == 0 {
            continue;
        }

        for spacecraft in distinct_spacecraft(&kept) {
            let sub = select_spacecraft(&kept, &spacecraft)?;
            sink.append(&spacecraft, &sub)?;
        }
    }

    summary.partitions = sink.finish()?;
    info!(
        rows = summary.rows_read,
        dropped = summary.rows_dropped,
        partitions = summary.partitions.len(),
        "scene metadata split complete"
    );
    Ok(summary)
}

/// Open the source for one forward pass, gunzipping on the fly if needed.
fn open_source(path: &Path) -> Result<Box<dyn Read>, SplitError> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        debug!(path = %path.display(), "reading through gzip");
        Ok(Box::new(GzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Drop rows whose collection number is the preliminary sentinel.
///
/// Rows with a null collection number are kept; only the sentinel itself is
/// excluded. The filter kernel preserves row order.
fn drop_preliminary(batch: &RecordBatch) -> Result<RecordBatch, SplitError> {
    let col = batch
        .column_by_name(COLLECTION_NUMBER)
        .ok_or(SplitError::MissingColumn {
            name: COLLECTION_NUMBER,
        })?;
    let not_pre = neq(
        col.as_string::<i32>(),
        &StringArray::new_scalar(PRE_COLLECTION),
    )?;
    let keep = or_kleene(&not_pre, &is_null(col)?)?;
    Ok(filter_record_batch(batch, &keep)?)
}

/// Distinct non-null spacecraft ids present in the chunk, in sorted order.
fn distinct_spacecraft(batch: &RecordBatch) -> BTreeSet<String> {
    let ids = batch
        .column_by_name(SPACECRAFT_ID)
        .expect("column checked before reading")
        .as_string::<i32>();
    ids.iter().flatten().map(str::to_string).collect()
}

/// Sub-batch of rows matching one spacecraft id, in source order.
fn select_spacecraft(batch: &RecordBatch, spacecraft: &str) -> Result<RecordBatch, SplitError> {
    let ids = batch
        .column_by_name(SPACECRAFT_ID)
        .expect("column checked before reading")
        .as_string::<i32>();
    let mut mask = eq(ids, &StringArray::new_scalar(spacecraft))?;
    if mask.null_count() > 0 {
        mask = prep_null_mask_filter(&mask);
    }
    Ok(filter_record_batch(batch, &mask)?)
}
