use super::ValidationError;
use crate::constants::MAX_NUMBER_OF_EMBEDDINGS;
use crate::models::{Environment, ModelType, Schema};

/// Consistency of the schema with the model type and environment
pub fn validate_params(
    schema: &Schema,
    model_type: ModelType,
    environment: Environment,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schema.is_delayed() && schema.prediction_id_column_name.is_none() {
        errors.push(ValidationError::MissingPredictionIdColumnForDelayedRecords);
    }

    if environment.is_preproduction()
        && !(schema.has_prediction_columns() && schema.has_actual_columns())
    {
        errors.push(ValidationError::MissingPreprodPredAct { environment });
    }

    if model_type == ModelType::GenerativeLlm
        && (schema.prompt_column_names.is_none() || schema.response_column_names.is_none())
    {
        errors.push(ValidationError::MissingPromptResponseGenerativeLlm);
    }

    errors.extend(check_object_detection_fields(schema, model_type));
    errors.extend(check_scores(schema, model_type));

    let found = schema
        .embedding_feature_column_names
        .as_ref()
        .map_or(0, |m| m.len());
    if found > MAX_NUMBER_OF_EMBEDDINGS {
        errors.push(ValidationError::InvalidNumberOfEmbeddings {
            found,
            max: MAX_NUMBER_OF_EMBEDDINGS,
        });
    }

    errors
}

fn check_object_detection_fields(schema: &Schema, model_type: ModelType) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let forbidden: Vec<String> = if model_type == ModelType::ObjectDetection {
        if schema.object_detection_prediction_column_names.is_none()
            && schema.object_detection_actual_column_names.is_none()
        {
            errors.push(ValidationError::MissingObjectDetectionPredAct);
        }
        [
            ("prediction_label_column_name", &schema.prediction_label_column_name),
            ("prediction_score_column_name", &schema.prediction_score_column_name),
            ("actual_label_column_name", &schema.actual_label_column_name),
            ("actual_score_column_name", &schema.actual_score_column_name),
        ]
        .into_iter()
        .filter(|(_, col)| col.is_some())
        .map(|(field, _)| field.to_string())
        .collect()
    } else {
        let mut fields = Vec::new();
        if schema.object_detection_prediction_column_names.is_some() {
            fields.push("object_detection_prediction_column_names".to_string());
        }
        if schema.object_detection_actual_column_names.is_some() {
            fields.push("object_detection_actual_column_names".to_string());
        }
        fields
    };

    if !forbidden.is_empty() {
        errors.push(
            ValidationError::InvalidPredActObjectDetectionColumnNamesForModelType {
                model_type,
                fields: forbidden,
            },
        );
    }
    errors
}

fn check_scores(schema: &Schema, model_type: ModelType) -> Vec<ValidationError> {
    // Object detection reports label and score columns together above
    if model_type == ModelType::ObjectDetection {
        return Vec::new();
    }

    let mut errors = Vec::new();
    if !model_type.accepts_scores() {
        let columns: Vec<String> = [
            &schema.prediction_score_column_name,
            &schema.actual_score_column_name,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
        if !columns.is_empty() {
            errors.push(ValidationError::InvalidScoreColumnForModelType {
                model_type,
                columns,
            });
        }
    }

    if matches!(model_type, ModelType::Numeric | ModelType::ScoreCategorical) {
        if schema.prediction_score_column_name.is_some()
            && schema.prediction_label_column_name.is_none()
        {
            errors.push(ValidationError::MissingLabelForModelType {
                model_type,
                side: "prediction",
            });
        }
        if schema.actual_score_column_name.is_some() && schema.actual_label_column_name.is_none() {
            errors.push(ValidationError::MissingLabelForModelType {
                model_type,
                side: "actual",
            });
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmbeddingColumnNames, ObjectDetectionColumnNames};

    fn od_columns() -> ObjectDetectionColumnNames {
        ObjectDetectionColumnNames {
            bounding_boxes_coordinates_column_name: "boxes".into(),
            categories_column_name: "categories".into(),
            scores_column_name: Some("scores".into()),
        }
    }

    fn production(schema: &Schema, model_type: ModelType) -> Vec<ValidationError> {
        validate_params(schema, model_type, Environment::Production)
    }

    #[test]
    fn test_valid_schema() {
        let schema = Schema::new()
            .with_prediction_id("id")
            .with_prediction_label("pred")
            .with_prediction_score("score");
        assert!(production(&schema, ModelType::ScoreCategorical).is_empty());
    }

    #[test]
    fn test_delayed_records_need_prediction_id() {
        let schema = Schema::new().with_actual_label("actual");
        assert_eq!(
            production(&schema, ModelType::ScoreCategorical),
            vec![ValidationError::MissingPredictionIdColumnForDelayedRecords]
        );
        let schema = schema.with_prediction_id("id");
        assert!(production(&schema, ModelType::ScoreCategorical).is_empty());
    }

    #[test]
    fn test_preproduction_needs_both_sides() {
        let schema = Schema::new().with_prediction_id("id").with_prediction_label("pred");
        for env in [Environment::Training, Environment::Validation] {
            assert_eq!(
                validate_params(&schema, ModelType::Numeric, env),
                vec![ValidationError::MissingPreprodPredAct { environment: env }]
            );
        }
        let schema = schema.with_actual_label("actual");
        assert!(validate_params(&schema, ModelType::Numeric, Environment::Training).is_empty());
    }

    #[test]
    fn test_generative_needs_prompt_and_response() {
        let schema = Schema::new()
            .with_prediction_id("id")
            .with_prediction_label("pred")
            .with_prompt(EmbeddingColumnNames::new("prompt_vec"));
        assert_eq!(
            production(&schema, ModelType::GenerativeLlm),
            vec![ValidationError::MissingPromptResponseGenerativeLlm]
        );
        let schema = schema.with_response(EmbeddingColumnNames::new("response_vec"));
        assert!(production(&schema, ModelType::GenerativeLlm).is_empty());
    }

    #[test]
    fn test_object_detection_columns() {
        let schema = Schema::new().with_prediction_id("id");
        assert_eq!(
            production(&schema, ModelType::ObjectDetection),
            vec![ValidationError::MissingObjectDetectionPredAct]
        );

        let schema = schema
            .with_object_detection_prediction(od_columns())
            .with_prediction_label("pred");
        assert_eq!(
            production(&schema, ModelType::ObjectDetection),
            vec![ValidationError::InvalidPredActObjectDetectionColumnNamesForModelType {
                model_type: ModelType::ObjectDetection,
                fields: vec!["prediction_label_column_name".into()],
            }]
        );

        let errors = production(&schema, ModelType::ScoreCategorical);
        assert_eq!(
            errors,
            vec![ValidationError::InvalidPredActObjectDetectionColumnNamesForModelType {
                model_type: ModelType::ScoreCategorical,
                fields: vec!["object_detection_prediction_column_names".into()],
            }]
        );
    }

    #[test]
    fn test_scores_by_model_type() {
        let schema = Schema::new()
            .with_prediction_id("id")
            .with_prediction_label("pred")
            .with_actual_label("actual")
            .with_actual_score("actual_score");
        assert_eq!(
            production(&schema, ModelType::Numeric),
            vec![ValidationError::InvalidScoreColumnForModelType {
                model_type: ModelType::Numeric,
                columns: vec!["actual_score".into()],
            }]
        );
        assert!(production(&schema, ModelType::ScoreCategorical).is_empty());
    }

    #[test]
    fn test_score_without_label() {
        let schema = Schema::new()
            .with_prediction_id("id")
            .with_prediction_score("score");
        assert_eq!(
            production(&schema, ModelType::ScoreCategorical),
            vec![ValidationError::MissingLabelForModelType {
                model_type: ModelType::ScoreCategorical,
                side: "prediction",
            }]
        );
    }

    #[test]
    fn test_too_many_embeddings() {
        let mut schema = Schema::new()
            .with_prediction_id("id")
            .with_prediction_label("pred");
        for i in 0..=MAX_NUMBER_OF_EMBEDDINGS {
            schema = schema.with_embedding_feature(
                format!("emb_{}", i),
                EmbeddingColumnNames::new(format!("vec_{}", i)),
            );
        }
        assert_eq!(
            production(&schema, ModelType::Numeric),
            vec![ValidationError::InvalidNumberOfEmbeddings {
                found: MAX_NUMBER_OF_EMBEDDINGS + 1,
                max: MAX_NUMBER_OF_EMBEDDINGS,
            }]
        );
    }
}
