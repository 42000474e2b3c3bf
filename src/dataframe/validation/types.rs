use arrow::datatypes::{DataType, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;

use super::ValidationError;
use crate::dataframe::arrays::{
    is_categorical_label, is_list_of, is_numeric, is_scalar_feature, is_string,
    is_timestamp_like, type_name,
};
use crate::models::{EmbeddingColumnNames, ModelType, Schema};

const SCALAR_TYPES: &str = "string, bool, int, float, category or null";
const EMBEDDING_TYPES: &str =
    "list<float|int> for vectors, string or list<string> for data, string for links";
const NUMERIC_TYPES: &str = "int or float";
const OBJECT_DETECTION_TYPES: &str =
    "list<list<float>> for coordinates, list<string> for categories, list<float> for scores";

fn column_type<'a>(arrow_schema: &'a ArrowSchema, column: &str) -> Option<&'a DataType> {
    arrow_schema
        .column_with_name(column)
        .map(|(_, field)| field.data_type())
}

/// Columns of `columns` whose type fails `accept`
fn rejected<'a>(
    arrow_schema: &ArrowSchema,
    columns: impl IntoIterator<Item = &'a str>,
    accept: impl Fn(&DataType) -> bool,
) -> Vec<String> {
    columns
        .into_iter()
        .filter(|c| column_type(arrow_schema, c).is_some_and(|dt| !accept(dt)))
        .map(str::to_string)
        .collect()
}

fn embedding_rejected(arrow_schema: &ArrowSchema, emb: &EmbeddingColumnNames) -> Vec<String> {
    let mut bad = rejected(arrow_schema, [emb.vector_column_name.as_str()], |dt| {
        is_list_of(dt, is_numeric)
    });
    bad.extend(rejected(arrow_schema, emb.data_column_name.as_deref(), |dt| {
        is_string(dt) || is_list_of(dt, is_string)
    }));
    bad.extend(rejected(
        arrow_schema,
        emb.link_to_data_column_name.as_deref(),
        is_string,
    ));
    bad
}

/// Arrow types of every column the schema references
pub fn validate_types(
    batch: &RecordBatch,
    schema: &Schema,
    model_type: ModelType,
) -> Vec<ValidationError> {
    let arrow_schema = batch.schema();
    let arrow_schema = arrow_schema.as_ref();
    let mut errors = Vec::new();

    let mut single = |field: &'static str,
                      column: &Option<String>,
                      expected: &'static str,
                      accept: &dyn Fn(&DataType) -> bool| {
        if let Some(column) = column {
            if let Some(dt) = column_type(arrow_schema, column) {
                if !accept(dt) {
                    errors.push(ValidationError::InvalidType {
                        field,
                        column: column.clone(),
                        found: type_name(dt),
                        expected,
                    });
                }
            }
        }
    };

    single(
        "Prediction id",
        &schema.prediction_id_column_name,
        "string or int",
        &|dt| is_string(dt) || dt.is_integer(),
    );
    single(
        "Timestamp",
        &schema.timestamp_column_name,
        "int, float, timestamp or date",
        &is_timestamp_like,
    );

    let (label_types, accept_label): (&'static str, fn(&DataType) -> bool) =
        if model_type == ModelType::Numeric {
            (NUMERIC_TYPES, is_numeric)
        } else {
            ("string, bool, int, float or category", is_categorical_label)
        };
    single(
        "Prediction label",
        &schema.prediction_label_column_name,
        label_types,
        &accept_label,
    );
    single(
        "Actual label",
        &schema.actual_label_column_name,
        label_types,
        &accept_label,
    );
    single(
        "Prediction score",
        &schema.prediction_score_column_name,
        NUMERIC_TYPES,
        &is_numeric,
    );
    single(
        "Actual score",
        &schema.actual_score_column_name,
        NUMERIC_TYPES,
        &is_numeric,
    );

    let features = rejected(
        arrow_schema,
        schema.feature_column_names.iter().flatten().map(String::as_str),
        is_scalar_feature,
    );
    if !features.is_empty() {
        errors.push(ValidationError::InvalidTypeFeatures {
            columns: features,
            expected: SCALAR_TYPES,
        });
    }

    let embedding_features: Vec<String> = schema
        .embedding_feature_column_names
        .iter()
        .flat_map(|m| m.values())
        .flat_map(|emb| embedding_rejected(arrow_schema, emb))
        .collect();
    if !embedding_features.is_empty() {
        errors.push(ValidationError::InvalidTypeFeatures {
            columns: embedding_features,
            expected: EMBEDDING_TYPES,
        });
    }

    let tags = rejected(
        arrow_schema,
        schema.tag_column_names.iter().flatten().map(String::as_str),
        is_scalar_feature,
    );
    if !tags.is_empty() {
        errors.push(ValidationError::InvalidTypeTags {
            columns: tags,
            expected: SCALAR_TYPES,
        });
    }

    let shap = rejected(
        arrow_schema,
        schema
            .shap_values_column_names
            .iter()
            .flat_map(|m| m.values())
            .map(String::as_str),
        is_numeric,
    );
    if !shap.is_empty() {
        errors.push(ValidationError::InvalidTypeShapValues {
            columns: shap,
            expected: NUMERIC_TYPES,
        });
    }

    let prompt_response: Vec<String> = schema
        .prompt_column_names
        .iter()
        .chain(schema.response_column_names.iter())
        .flat_map(|emb| embedding_rejected(arrow_schema, emb))
        .collect();
    if !prompt_response.is_empty() {
        errors.push(ValidationError::InvalidTypePromptResponse {
            columns: prompt_response,
            expected: EMBEDDING_TYPES,
        });
    }

    let mut object_detection = Vec::new();
    for od in schema
        .object_detection_prediction_column_names
        .iter()
        .chain(schema.object_detection_actual_column_names.iter())
    {
        object_detection.extend(rejected(
            arrow_schema,
            [od.bounding_boxes_coordinates_column_name.as_str()],
            |dt| is_list_of(dt, |inner| is_list_of(inner, is_numeric)),
        ));
        object_detection.extend(rejected(
            arrow_schema,
            [od.categories_column_name.as_str()],
            |dt| is_list_of(dt, is_string),
        ));
        object_detection.extend(rejected(
            arrow_schema,
            od.scores_column_name.as_deref(),
            |dt| is_list_of(dt, is_numeric),
        ));
    }
    if !object_detection.is_empty() {
        errors.push(ValidationError::InvalidTypeObjectDetection {
            columns: object_detection,
            expected: OBJECT_DETECTION_TYPES,
        });
    }

    errors
}
