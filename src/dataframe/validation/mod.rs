//! Dataframe validation
//!
//! Checks run in four stages: required arguments and columns, schema
//! parameters, column types and finally column values. A stage only runs
//! when every stage before it passed.

mod params;
mod required;
mod types;
mod values;

use std::fmt;

use arrow::record_batch::RecordBatch;
use thiserror::Error;
use tracing::debug;

use crate::error::Result;
use crate::models::{Environment, ModelType, Schema};

pub use params::validate_params;
pub use required::validate_required_checks;
pub use types::validate_types;
pub use values::validate_values;

/// A single problem found in a dataframe or its schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Schema columns absent from the dataframe
    #[error(
        "The following columns are declared in the schema but are not found in the dataframe: {}.",
        .0.join(", ")
    )]
    MissingColumns(Vec<String>),

    /// Empty model id
    #[error("model_id must be a non-empty string.")]
    InvalidModelId,

    /// Empty model version
    #[error("model_version must be a non-empty string when provided.")]
    InvalidModelVersion,

    /// Missing batch id in the validation environment
    #[error("batch_id must be a non-empty string for the validation environment.")]
    InvalidBatchId,

    /// Column names used twice in the dataframe
    #[error("The following columns appear more than once in the dataframe: {}.", .0.join(", "))]
    DuplicateColumnsInDataframe(Vec<String>),

    /// Dataframe uses names the logger adds itself
    #[error("The following column names are reserved and cannot be used: {}.", .0.join(", "))]
    ReservedColumns(Vec<String>),

    /// Delayed records without a prediction id column
    #[error(
        "Logging actuals or feature importances without predictions requires prediction_id_column_name."
    )]
    MissingPredictionIdColumnForDelayedRecords,

    /// Training or validation data lacking predictions or actuals
    #[error("The {environment} environment requires both prediction and actual columns.")]
    MissingPreprodPredAct {
        /// Training or validation
        environment: Environment,
    },

    /// Generative model without prompt or response columns
    #[error("{} models require prompt_column_names and response_column_names.", ModelType::GenerativeLlm)]
    MissingPromptResponseGenerativeLlm,

    /// Object detection model without box columns
    #[error(
        "{} models require object detection prediction or actual column names.",
        ModelType::ObjectDetection
    )]
    MissingObjectDetectionPredAct,

    /// Object detection columns on other models, or label columns on object detection
    #[error("{model_type} models cannot use the following schema fields: {}.", .fields.join(", "))]
    InvalidPredActObjectDetectionColumnNamesForModelType {
        /// Model type of the call
        model_type: ModelType,
        /// Offending schema fields
        fields: Vec<String>,
    },

    /// Too many embedding features
    #[error("The schema declares {found} embedding features, at most {max} are allowed.")]
    InvalidNumberOfEmbeddings {
        /// Declared embedding features
        found: usize,
        /// Allowed embedding features
        max: usize,
    },

    /// Score columns on a model type without scores
    #[error("Score columns cannot be used with {model_type} models: {}.", .columns.join(", "))]
    InvalidScoreColumnForModelType {
        /// Model type of the call
        model_type: ModelType,
        /// Offending score columns
        columns: Vec<String>,
    },

    /// Score column without the label column of the same side
    #[error("{model_type} models with a {side} score column require a {side} label column.")]
    MissingLabelForModelType {
        /// Model type of the call
        model_type: ModelType,
        /// `prediction` or `actual`
        side: &'static str,
    },

    /// Single column of the wrong type
    #[error("{field} column '{column}' has type {found}, expected one of: {expected}.")]
    InvalidType {
        /// Role of the column
        field: &'static str,
        /// Column name
        column: String,
        /// Arrow type found
        found: String,
        /// Accepted types
        expected: &'static str,
    },

    /// Feature columns of the wrong type
    #[error("Feature columns must be of type {expected}: {}.", .columns.join(", "))]
    InvalidTypeFeatures {
        /// Offending columns
        columns: Vec<String>,
        /// Accepted types
        expected: &'static str,
    },

    /// Tag columns of the wrong type
    #[error("Tag columns must be of type {expected}: {}.", .columns.join(", "))]
    InvalidTypeTags {
        /// Offending columns
        columns: Vec<String>,
        /// Accepted types
        expected: &'static str,
    },

    /// SHAP columns of the wrong type
    #[error("SHAP value columns must be of type {expected}: {}.", .columns.join(", "))]
    InvalidTypeShapValues {
        /// Offending columns
        columns: Vec<String>,
        /// Accepted types
        expected: &'static str,
    },

    /// Prompt or response columns of the wrong type
    #[error("Prompt and response columns must be of type {expected}: {}.", .columns.join(", "))]
    InvalidTypePromptResponse {
        /// Offending columns
        columns: Vec<String>,
        /// Accepted types
        expected: &'static str,
    },

    /// Object detection columns of the wrong type
    #[error("Object detection columns must be of type {expected}: {}.", .columns.join(", "))]
    InvalidTypeObjectDetection {
        /// Offending columns
        columns: Vec<String>,
        /// Accepted types
        expected: &'static str,
    },

    /// Timestamps outside the accepted window
    #[error("Column '{column}' contains timestamps outside the accepted range [{min}, {max}].")]
    InvalidValueTimestamp {
        /// Timestamp column
        column: String,
        /// Earliest accepted Unix second
        min: i64,
        /// Latest accepted Unix second
        max: i64,
    },

    /// Nulls or NaNs where values are required
    #[error("{field} column '{column}' must not contain missing values.")]
    InvalidValueMissingValue {
        /// Role of the column
        field: &'static str,
        /// Column name
        column: String,
    },

    /// Embedding vectors shorter than the minimum
    #[error(
        "Embedding vectors must have at least {} dimensions, found shorter vectors in: {}.",
        crate::constants::MIN_EMBEDDING_DIMENSIONALITY,
        .0.join(", ")
    )]
    InvalidValueLowEmbeddingVectorDimensionality(Vec<String>),

    /// Embedding vectors longer than the maximum
    #[error(
        "Embedding vectors must have at most {} dimensions, found longer vectors in: {}.",
        crate::constants::MAX_EMBEDDING_DIMENSIONALITY,
        .0.join(", ")
    )]
    InvalidValueHighEmbeddingVectorDimensionality(Vec<String>),

    /// Embedding raw data over the character limit
    #[error(
        "Embedding raw data must not exceed {} characters: {}.",
        crate::constants::MAX_RAW_DATA_CHARACTERS,
        .0.join(", ")
    )]
    InvalidValueEmbeddingRawDataTooLong(Vec<String>),

    /// Tag values over the character limit
    #[error(
        "Tag values must not exceed {} characters: {}.",
        crate::constants::MAX_TAG_LENGTH,
        .0.join(", ")
    )]
    InvalidTagLength(Vec<String>),

    /// Malformed bounding box coordinates
    #[error("Bounding boxes in column '{column}' are invalid: {reason}.")]
    InvalidBoundingBoxesCoordinates {
        /// Coordinates column
        column: String,
        /// What is wrong with the boxes
        reason: String,
    },

    /// Box scores outside [0, 1]
    #[error("Bounding box scores in column '{column}' must lie between 0 and 1.")]
    InvalidBoundingBoxesScores {
        /// Scores column
        column: String,
    },
}

/// Every problem reported by the stage that stopped the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    /// Problems in the order they were found
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for err in &self.errors {
            writeln!(f, "  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Call-level arguments checked alongside the dataframe
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Model id of the call
    pub model_id: &'a str,
    /// Model version of the call
    pub model_version: Option<&'a str>,
    /// Batch id of the call
    pub batch_id: Option<&'a str>,
    /// Model type of the call
    pub model_type: ModelType,
    /// Environment of the call
    pub environment: Environment,
}

fn stage(name: &str, errors: Vec<ValidationError>) -> std::result::Result<(), ValidationFailure> {
    debug!(stage = name, errors = errors.len(), "validation stage finished");
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure { errors })
    }
}

/// Run every stage in order, stopping at the first one that reports errors
pub fn validate(batch: &RecordBatch, schema: &Schema, ctx: &ValidationContext<'_>) -> Result<()> {
    stage("required", validate_required_checks(batch, schema, ctx))?;
    stage("params", validate_params(schema, ctx.model_type, ctx.environment))?;
    stage("types", validate_types(batch, schema, ctx.model_type))?;
    let now = chrono::Utc::now().timestamp();
    stage("values", validate_values(batch, schema, now)?)?;
    Ok(())
}
