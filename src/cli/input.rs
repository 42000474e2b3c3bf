//! Reading dataframes and schemas from disk

use std::fs::File;
use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::{FileReader, StreamReader};
use arrow::record_batch::RecordBatch;
use tracing::debug;

use super::InputFormat;
use crate::error::{ArizeError, Result};
use crate::models::Schema;

/// Rows sampled when inferring CSV column types
const CSV_INFER_ROWS: usize = 1_000;

/// Magic bytes opening an Arrow IPC file
const ARROW_FILE_MAGIC: &[u8] = b"ARROW1";

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Input format implied by a file extension
pub fn detect_format(path: &Path) -> Result<InputFormat> {
    match extension(path).as_str() {
        "csv" => Ok(InputFormat::Csv),
        "arrow" | "arrows" | "ipc" | "feather" => Ok(InputFormat::Arrow),
        other => Err(ArizeError::UnsupportedFormat(format!(
            "cannot infer the format of '{}' from extension '{}', pass --format",
            path.display(),
            other
        ))),
    }
}

fn concat(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<RecordBatch> {
    Ok(concat_batches(&schema, &batches)?)
}

fn read_csv(path: &Path) -> Result<RecordBatch> {
    let mut file = File::open(path)?;
    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(&mut file, Some(CSV_INFER_ROWS))?;
    file.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    concat(schema, batches)
}

fn read_arrow(path: &Path) -> Result<RecordBatch> {
    let bytes = std::fs::read(path)?;
    if bytes.starts_with(ARROW_FILE_MAGIC) {
        let reader = FileReader::try_new(Cursor::new(bytes), None)?;
        let schema = reader.schema();
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        concat(schema, batches)
    } else {
        let reader = StreamReader::try_new(Cursor::new(bytes), None)?;
        let schema = reader.schema();
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        concat(schema, batches)
    }
}

/// Read a whole file into a single batch
pub fn read_batch(path: &Path, format: Option<InputFormat>) -> Result<RecordBatch> {
    if !path.exists() {
        return Err(ArizeError::file_not_found(path));
    }
    let format = match format {
        Some(format) => format,
        None => detect_format(path)?,
    };

    let batch = match format {
        InputFormat::Csv => read_csv(path)?,
        InputFormat::Arrow => read_arrow(path)?,
    };
    debug!(
        path = %path.display(),
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "dataframe loaded"
    );
    Ok(batch)
}

/// Read a column schema from a TOML or JSON file
pub fn read_schema(path: &Path) -> Result<Schema> {
    if !path.exists() {
        return Err(ArizeError::file_not_found(path));
    }
    let content = std::fs::read_to_string(path)?;
    match extension(path).as_str() {
        "toml" => Ok(toml::from_str(&content)?),
        "json" => Ok(serde_json::from_str(&content)?),
        other => Err(ArizeError::UnsupportedFormat(format!(
            "schema files must be TOML or JSON, got '{}'",
            other
        ))),
    }
}
