use std::collections::{BTreeSet, HashSet};

use arrow::record_batch::RecordBatch;

use super::{ValidationContext, ValidationError};
use crate::models::{Environment, Schema};

/// Arguments of the call and presence of every schema column
pub fn validate_required_checks(
    batch: &RecordBatch,
    schema: &Schema,
    ctx: &ValidationContext<'_>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if ctx.model_id.trim().is_empty() {
        errors.push(ValidationError::InvalidModelId);
    }
    if ctx.model_version.is_some_and(|v| v.trim().is_empty()) {
        errors.push(ValidationError::InvalidModelVersion);
    }
    if ctx.environment == Environment::Validation
        && ctx.batch_id.map_or(true, |b| b.trim().is_empty())
    {
        errors.push(ValidationError::InvalidBatchId);
    }

    let arrow_schema = batch.schema();
    let mut seen = HashSet::new();
    let duplicates: BTreeSet<String> = arrow_schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .filter(|name| !seen.insert(*name))
        .map(str::to_string)
        .collect();
    if !duplicates.is_empty() {
        errors.push(ValidationError::DuplicateColumnsInDataframe(
            duplicates.into_iter().collect(),
        ));
    }

    let missing: Vec<String> = schema
        .used_columns()
        .into_iter()
        .filter(|c| arrow_schema.column_with_name(c).is_none())
        .collect();
    if !missing.is_empty() {
        errors.push(ValidationError::MissingColumns(missing));
    }

    errors
}
