//! Column-name schema describing a dataframe to log

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Columns that make up one embedding feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingColumnNames {
    /// Column holding the vectors
    pub vector_column_name: String,
    /// Column holding the raw text or token arrays
    #[serde(default)]
    pub data_column_name: Option<String>,
    /// Column holding links to the raw data
    #[serde(default)]
    pub link_to_data_column_name: Option<String>,
}

impl EmbeddingColumnNames {
    /// Embedding made of a vector column only
    pub fn new(vector_column_name: impl Into<String>) -> Self {
        Self {
            vector_column_name: vector_column_name.into(),
            data_column_name: None,
            link_to_data_column_name: None,
        }
    }

    /// Set the raw data column
    pub fn with_data(mut self, column: impl Into<String>) -> Self {
        self.data_column_name = Some(column.into());
        self
    }

    /// Set the link column
    pub fn with_link(mut self, column: impl Into<String>) -> Self {
        self.link_to_data_column_name = Some(column.into());
        self
    }

    /// All referenced columns, vector first
    pub fn columns(&self) -> Vec<&str> {
        let mut cols = vec![self.vector_column_name.as_str()];
        cols.extend(self.data_column_name.as_deref());
        cols.extend(self.link_to_data_column_name.as_deref());
        cols
    }
}

/// Columns describing object detection bounding boxes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDetectionColumnNames {
    /// Column of `[[x1, y1, x2, y2], ...]` per row
    pub bounding_boxes_coordinates_column_name: String,
    /// Column of box categories per row
    pub categories_column_name: String,
    /// Column of box scores per row, predictions only
    #[serde(default)]
    pub scores_column_name: Option<String>,
}

impl ObjectDetectionColumnNames {
    /// All referenced columns
    pub fn columns(&self) -> Vec<&str> {
        let mut cols = vec![
            self.bounding_boxes_coordinates_column_name.as_str(),
            self.categories_column_name.as_str(),
        ];
        cols.extend(self.scores_column_name.as_deref());
        cols
    }
}

/// Maps the columns of a dataframe to their meaning
///
/// Every field is optional; which ones are required depends on the model
/// type and environment and is checked by the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    /// Prediction id column, strings or ints
    pub prediction_id_column_name: Option<String>,
    /// Prediction time column
    pub timestamp_column_name: Option<String>,
    /// Scalar feature columns
    pub feature_column_names: Option<Vec<String>>,
    /// Tag columns
    pub tag_column_names: Option<Vec<String>>,
    /// Predicted label column
    pub prediction_label_column_name: Option<String>,
    /// Predicted score column
    pub prediction_score_column_name: Option<String>,
    /// Actual label column
    pub actual_label_column_name: Option<String>,
    /// Actual score column
    pub actual_score_column_name: Option<String>,
    /// Feature name to the column holding its SHAP value
    pub shap_values_column_names: Option<BTreeMap<String, String>>,
    /// Display name to the columns of the embedding feature
    pub embedding_feature_column_names: Option<BTreeMap<String, EmbeddingColumnNames>>,
    /// Prompt of generative models
    pub prompt_column_names: Option<EmbeddingColumnNames>,
    /// Response of generative models
    pub response_column_names: Option<EmbeddingColumnNames>,
    /// Predicted boxes of object detection models
    pub object_detection_prediction_column_names: Option<ObjectDetectionColumnNames>,
    /// Actual boxes of object detection models
    pub object_detection_actual_column_names: Option<ObjectDetectionColumnNames>,
}

impl Schema {
    /// Empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prediction id column
    pub fn with_prediction_id(mut self, column: impl Into<String>) -> Self {
        self.prediction_id_column_name = Some(column.into());
        self
    }

    /// Set the timestamp column
    pub fn with_timestamp(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column_name = Some(column.into());
        self
    }

    /// Set the feature columns
    pub fn with_features<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.feature_column_names = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the tag columns
    pub fn with_tags<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.tag_column_names = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the predicted label column
    pub fn with_prediction_label(mut self, column: impl Into<String>) -> Self {
        self.prediction_label_column_name = Some(column.into());
        self
    }

    /// Set the predicted score column
    pub fn with_prediction_score(mut self, column: impl Into<String>) -> Self {
        self.prediction_score_column_name = Some(column.into());
        self
    }

    /// Set the actual label column
    pub fn with_actual_label(mut self, column: impl Into<String>) -> Self {
        self.actual_label_column_name = Some(column.into());
        self
    }

    /// Set the actual score column
    pub fn with_actual_score(mut self, column: impl Into<String>) -> Self {
        self.actual_score_column_name = Some(column.into());
        self
    }

    /// Add the SHAP column of a feature
    pub fn with_shap_value(mut self, feature: impl Into<String>, column: impl Into<String>) -> Self {
        self.shap_values_column_names
            .get_or_insert_with(BTreeMap::new)
            .insert(feature.into(), column.into());
        self
    }

    /// Add an embedding feature
    pub fn with_embedding_feature(
        mut self,
        name: impl Into<String>,
        columns: EmbeddingColumnNames,
    ) -> Self {
        self.embedding_feature_column_names
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), columns);
        self
    }

    /// Set the prompt columns
    pub fn with_prompt(mut self, columns: EmbeddingColumnNames) -> Self {
        self.prompt_column_names = Some(columns);
        self
    }

    /// Set the response columns
    pub fn with_response(mut self, columns: EmbeddingColumnNames) -> Self {
        self.response_column_names = Some(columns);
        self
    }

    /// Set the predicted box columns
    pub fn with_object_detection_prediction(mut self, columns: ObjectDetectionColumnNames) -> Self {
        self.object_detection_prediction_column_names = Some(columns);
        self
    }

    /// Set the actual box columns
    pub fn with_object_detection_actual(mut self, columns: ObjectDetectionColumnNames) -> Self {
        self.object_detection_actual_column_names = Some(columns);
        self
    }

    /// Whether any prediction-side column is present
    pub fn has_prediction_columns(&self) -> bool {
        self.prediction_label_column_name.is_some()
            || self.prediction_score_column_name.is_some()
            || self.object_detection_prediction_column_names.is_some()
    }

    /// Whether any actual-side column is present
    pub fn has_actual_columns(&self) -> bool {
        self.actual_label_column_name.is_some()
            || self.actual_score_column_name.is_some()
            || self.object_detection_actual_column_names.is_some()
    }

    /// Whether SHAP value columns are present
    pub fn has_feature_importance_columns(&self) -> bool {
        self.shap_values_column_names
            .as_ref()
            .is_some_and(|m| !m.is_empty())
    }

    /// A delayed schema carries actuals or feature importances but no
    /// predictions; the server joins it to earlier predictions by id.
    pub fn is_delayed(&self) -> bool {
        (self.has_actual_columns() || self.has_feature_importance_columns())
            && !self.has_prediction_columns()
    }

    /// Every column referenced by the schema, without duplicates, in order
    /// of first reference
    pub fn used_columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut cols = Vec::new();
        let mut push = |c: &str| {
            if seen.insert(c.to_string()) {
                cols.push(c.to_string());
            }
        };

        for c in [
            &self.prediction_id_column_name,
            &self.timestamp_column_name,
            &self.prediction_label_column_name,
            &self.prediction_score_column_name,
            &self.actual_label_column_name,
            &self.actual_score_column_name,
        ]
        .into_iter()
        .flatten()
        {
            push(c.as_str());
        }
        for c in self.feature_column_names.iter().flatten() {
            push(c.as_str());
        }
        for c in self.tag_column_names.iter().flatten() {
            push(c.as_str());
        }
        for c in self.shap_values_column_names.iter().flat_map(|m| m.values()) {
            push(c.as_str());
        }
        for emb in self
            .embedding_feature_column_names
            .iter()
            .flat_map(|m| m.values())
            .chain(self.prompt_column_names.iter())
            .chain(self.response_column_names.iter())
        {
            for c in emb.columns() {
                push(c);
            }
        }
        for od in self
            .object_detection_prediction_column_names
            .iter()
            .chain(self.object_detection_actual_column_names.iter())
        {
            for c in od.columns() {
                push(c);
            }
        }
        cols
    }

    /// Overwrite this schema with the fields set in `other`.
    ///
    /// Scalar and list fields are replaced. Embedding and SHAP maps are
    /// merged key by key, entries from `other` winning.
    pub fn merge(&self, other: &Schema) -> Schema {
        let mut schema = self.clone();

        macro_rules! overwrite {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    schema.$field = other.$field.clone();
                })*
            };
        }
        overwrite!(
            prediction_id_column_name,
            timestamp_column_name,
            feature_column_names,
            tag_column_names,
            prediction_label_column_name,
            prediction_score_column_name,
            actual_label_column_name,
            actual_score_column_name,
            prompt_column_names,
            response_column_names,
            object_detection_prediction_column_names,
            object_detection_actual_column_names
        );

        if let Some(ref embeddings) = other.embedding_feature_column_names {
            let merged = schema
                .embedding_feature_column_names
                .get_or_insert_with(BTreeMap::new);
            for (k, v) in embeddings {
                merged.insert(k.clone(), v.clone());
            }
        }
        if let Some(ref shap) = other.shap_values_column_names {
            let merged = schema.shap_values_column_names.get_or_insert_with(BTreeMap::new);
            for (k, v) in shap {
                merged.insert(k.clone(), v.clone());
            }
        }

        schema
    }
}
