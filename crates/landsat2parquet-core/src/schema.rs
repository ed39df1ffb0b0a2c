// CSV schema handling for the scene-metadata index.
//
// Every column is read as nullable Utf8. The index is strings and dates
// throughout, and a uniform schema keeps every chunk identical while
// stopping numeric inference from mangling identifier columns the way the
// upstream feed formats them.

use std::io::Read;
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

use crate::error::SplitError;

/// Column holding the partition key.
pub const SPACECRAFT_ID: &str = "SPACECRAFT_ID";

/// Column distinguishing preliminary rows from finalized collections.
pub const COLLECTION_NUMBER: &str = "COLLECTION_NUMBER";

/// Sentinel collection number of preliminary rows; these never reach a partition.
pub const PRE_COLLECTION: &str = "PRE";

/// Build an all-Utf8 schema from the index header.
///
/// Only the column names of the inferred schema are kept; the types are
/// replaced wholesale.
pub fn utf8_schema_from_header<R: Read>(reader: R) -> Result<SchemaRef, SplitError> {
    let format = Format::default().with_header(true);
    let (inferred, _) = format.infer_schema(reader, Some(1))?;
    if inferred.fields().is_empty() {
        return Err(SplitError::EmptyIndex);
    }

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();

    Ok(Arc::new(Schema::new(fields)))
}

/// Error if a column the splitter keys on is absent from the schema.
pub(crate) fn require_column(schema: &Schema, name: &'static str) -> Result<(), SplitError> {
    if schema.fields().iter().any(|f| f.name() == name) {
        Ok(())
    } else {
        Err(SplitError::MissingColumn { name })
    }
}
