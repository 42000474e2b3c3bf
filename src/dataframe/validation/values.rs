use arrow::array::Array;
use arrow::record_batch::RecordBatch;

use super::ValidationError;
use crate::constants::{
    MAX_EMBEDDING_DIMENSIONALITY, MAX_FUTURE_YEARS_FROM_CURRENT_TIME,
    MAX_PAST_YEARS_FROM_CURRENT_TIME, MAX_RAW_DATA_CHARACTERS, MAX_TAG_LENGTH,
    MIN_EMBEDDING_DIMENSIONALITY, SECONDS_PER_YEAR,
};
use crate::dataframe::arrays::{
    float_values, has_missing, is_list_of, is_string, is_string_dictionary, list_lengths,
    list_value, string_values, timestamp_seconds,
};
use crate::error::Result;
use crate::models::{EmbeddingColumnNames, ObjectDetectionColumnNames, Schema};
use crate::records::is_timestamp_in_range;

/// Column values, assuming types already passed
pub fn validate_values(
    batch: &RecordBatch,
    schema: &Schema,
    now: i64,
) -> Result<Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(ref column) = schema.timestamp_column_name {
        if let Some(array) = batch.column_by_name(column) {
            let out_of_range = timestamp_seconds(array.as_ref())?
                .into_iter()
                .flatten()
                .any(|ts| !is_timestamp_in_range(now, ts));
            if out_of_range {
                errors.push(ValidationError::InvalidValueTimestamp {
                    column: column.clone(),
                    min: now - MAX_PAST_YEARS_FROM_CURRENT_TIME * SECONDS_PER_YEAR,
                    max: now + MAX_FUTURE_YEARS_FROM_CURRENT_TIME * SECONDS_PER_YEAR,
                });
            }
        }
    }

    for (field, column) in [
        ("Prediction id", &schema.prediction_id_column_name),
        ("Prediction label", &schema.prediction_label_column_name),
        ("Actual label", &schema.actual_label_column_name),
    ] {
        let Some(column) = column else { continue };
        if let Some(array) = batch.column_by_name(column) {
            if has_missing(array.as_ref())? {
                errors.push(ValidationError::InvalidValueMissingValue {
                    field,
                    column: column.clone(),
                });
            }
        }
    }

    let embeddings: Vec<&EmbeddingColumnNames> = schema
        .embedding_feature_column_names
        .iter()
        .flat_map(|m| m.values())
        .chain(schema.prompt_column_names.iter())
        .chain(schema.response_column_names.iter())
        .collect();
    errors.extend(check_embeddings(batch, &embeddings)?);

    let mut long_tags = Vec::new();
    for column in schema.tag_column_names.iter().flatten() {
        let Some(array) = batch.column_by_name(column) else { continue };
        let dt = array.data_type();
        if !(is_string(dt) || is_string_dictionary(dt)) {
            continue;
        }
        let too_long = string_values(array.as_ref())?
            .iter()
            .flatten()
            .any(|s| s.chars().count() > MAX_TAG_LENGTH);
        if too_long {
            long_tags.push(column.clone());
        }
    }
    if !long_tags.is_empty() {
        errors.push(ValidationError::InvalidTagLength(long_tags));
    }

    for od in schema
        .object_detection_prediction_column_names
        .iter()
        .chain(schema.object_detection_actual_column_names.iter())
    {
        errors.extend(check_bounding_boxes(batch, od)?);
    }

    Ok(errors)
}

fn check_embeddings(
    batch: &RecordBatch,
    embeddings: &[&EmbeddingColumnNames],
) -> Result<Vec<ValidationError>> {
    let mut low = Vec::new();
    let mut high = Vec::new();
    let mut too_long = Vec::new();

    for emb in embeddings {
        if let Some(array) = batch.column_by_name(&emb.vector_column_name) {
            let lengths = list_lengths(array.as_ref());
            let column = &emb.vector_column_name;
            if lengths.iter().flatten().any(|&n| n < MIN_EMBEDDING_DIMENSIONALITY)
                && !low.contains(column)
            {
                low.push(column.clone());
            }
            if lengths.iter().flatten().any(|&n| n > MAX_EMBEDDING_DIMENSIONALITY)
                && !high.contains(column)
            {
                high.push(column.clone());
            }
        }

        let Some(ref data_column) = emb.data_column_name else { continue };
        let Some(array) = batch.column_by_name(data_column) else { continue };
        if raw_data_too_long(array.as_ref())? && !too_long.contains(data_column) {
            too_long.push(data_column.clone());
        }
    }

    let mut errors = Vec::new();
    if !low.is_empty() {
        errors.push(ValidationError::InvalidValueLowEmbeddingVectorDimensionality(low));
    }
    if !high.is_empty() {
        errors.push(ValidationError::InvalidValueHighEmbeddingVectorDimensionality(high));
    }
    if !too_long.is_empty() {
        errors.push(ValidationError::InvalidValueEmbeddingRawDataTooLong(too_long));
    }
    Ok(errors)
}

/// Raw data rows are text or token lists; token lists count the characters
/// of all tokens
fn raw_data_too_long(array: &dyn Array) -> Result<bool> {
    if is_list_of(array.data_type(), is_string) {
        for i in 0..array.len() {
            let Some(tokens) = list_value(array, i) else { continue };
            let chars: usize = string_values(tokens.as_ref())?
                .iter()
                .flatten()
                .map(|t| t.chars().count())
                .sum();
            if chars > MAX_RAW_DATA_CHARACTERS {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    Ok(string_values(array)?
        .iter()
        .flatten()
        .any(|s| s.chars().count() > MAX_RAW_DATA_CHARACTERS))
}

fn check_bounding_boxes(
    batch: &RecordBatch,
    od: &ObjectDetectionColumnNames,
) -> Result<Vec<ValidationError>> {
    let mut errors = Vec::new();
    let in_unit_range = |v: &f64| (0.0..=1.0).contains(v);

    let column = &od.bounding_boxes_coordinates_column_name;
    if let Some(array) = batch.column_by_name(column) {
        'rows: for i in 0..array.len() {
            let Some(boxes) = list_value(array.as_ref(), i) else { continue };
            for j in 0..boxes.len() {
                let Some(coords) = list_value(boxes.as_ref(), j) else {
                    errors.push(ValidationError::InvalidBoundingBoxesCoordinates {
                        column: column.clone(),
                        reason: "found a missing bounding box".into(),
                    });
                    break 'rows;
                };
                let values = float_values(coords.as_ref())?;
                if values.len() != 4 {
                    errors.push(ValidationError::InvalidBoundingBoxesCoordinates {
                        column: column.clone(),
                        reason: format!(
                            "each box needs exactly 4 coordinates, found {}",
                            values.len()
                        ),
                    });
                    break 'rows;
                }
                if !values.iter().all(|v| v.as_ref().is_some_and(in_unit_range)) {
                    errors.push(ValidationError::InvalidBoundingBoxesCoordinates {
                        column: column.clone(),
                        reason: "coordinates must lie between 0 and 1".into(),
                    });
                    break 'rows;
                }
            }
        }
    }

    if let Some(ref column) = od.scores_column_name {
        if let Some(array) = batch.column_by_name(column) {
            for i in 0..array.len() {
                let Some(scores) = list_value(array.as_ref(), i) else { continue };
                let valid = float_values(scores.as_ref())?
                    .iter()
                    .flatten()
                    .all(in_unit_range);
                if !valid {
                    errors.push(ValidationError::InvalidBoundingBoxesScores {
                        column: column.clone(),
                    });
                    break;
                }
            }
        }
    }

    // One category per box
    let lengths_match = match (
        batch.column_by_name(column),
        batch.column_by_name(&od.categories_column_name),
    ) {
        (Some(boxes), Some(categories)) => {
            list_lengths(boxes.as_ref()) == list_lengths(categories.as_ref())
        }
        _ => true,
    };
    if !lengths_match {
        errors.push(ValidationError::InvalidBoundingBoxesCoordinates {
            column: column.clone(),
            reason: format!(
                "the number of boxes does not match the number of categories in '{}'",
                od.categories_column_name
            ),
        });
    }

    Ok(errors)
}
