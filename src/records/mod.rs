//! Building protobuf records from single inferences and columnar batches

pub mod bundle;
pub mod convert;

pub use bundle::{bundle_records, get_bulk_records, num_chunks};
pub use convert::{get_timestamp, get_value_object, is_timestamp_in_range};

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{ArizeError, Result};
use crate::models::{Embedding, Label, Value};
use crate::proto::{self, record::PredictionOrActual, BulkRecord, Record};

/// Identifies where records belong
#[derive(Debug, Clone)]
pub struct RecordContext {
    /// Space the model lives in
    pub space_key: String,
    /// Model identifier
    pub model_id: String,
    /// Model version, if any
    pub model_version: Option<String>,
}

/// Everything that can be logged for one prediction id
#[derive(Debug, Clone, Default)]
pub struct RecordInput {
    /// Id joining predictions, actuals and importances
    pub prediction_id: String,
    /// Predicted label
    pub prediction_label: Option<Label>,
    /// Actual label
    pub actual_label: Option<Label>,
    /// Feature values by name, nulls are dropped
    pub features: Option<BTreeMap<String, Value>>,
    /// Embedding features by name
    pub embedding_features: Option<BTreeMap<String, Embedding>>,
    /// Tags by name, sent with predictions and actuals
    pub tags: Option<BTreeMap<String, Value>>,
    /// SHAP value by feature name
    pub shap_values: Option<BTreeMap<String, f64>>,
    /// Unix seconds overriding the server receive time
    pub prediction_timestamp: Option<i64>,
}

impl RecordInput {
    /// Start an input for the given prediction id
    pub fn new(prediction_id: impl Into<String>) -> Self {
        Self {
            prediction_id: prediction_id.into(),
            ..Default::default()
        }
    }

    /// Set the predicted label
    pub fn prediction(mut self, label: impl Into<Label>) -> Self {
        self.prediction_label = Some(label.into());
        self
    }

    /// Set the actual label
    pub fn actual(mut self, label: impl Into<Label>) -> Self {
        self.actual_label = Some(label.into());
        self
    }

    /// Add a feature
    pub fn feature(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.features
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Add an embedding feature
    pub fn embedding(mut self, name: impl Into<String>, value: Embedding) -> Self {
        self.embedding_features
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value);
        self
    }

    /// Add a tag
    pub fn tag(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Add a SHAP value
    pub fn shap_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.shap_values
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value);
        self
    }

    /// Set the prediction time in Unix seconds
    pub fn timestamp(mut self, seconds: i64) -> Self {
        self.prediction_timestamp = Some(seconds);
        self
    }
}

/// Column-oriented input: one entry per prediction id in every column
#[derive(Debug, Clone, Default)]
pub struct BulkInput {
    /// One id per row
    pub prediction_ids: Vec<String>,
    /// Predicted label per row
    pub prediction_labels: Option<Vec<Label>>,
    /// Actual label per row
    pub actual_labels: Option<Vec<Label>>,
    /// Named feature columns
    pub features: Option<Vec<(String, Vec<Value>)>>,
    /// Replacement names for the feature columns, positionally
    pub feature_names_overwrite: Option<Vec<String>>,
    /// Named tag columns
    pub tags: Option<Vec<(String, Vec<Value>)>>,
    /// SHAP columns named by feature
    pub shap_values: Option<Vec<(String, Vec<f64>)>>,
    /// Prediction time per row in Unix seconds
    pub prediction_timestamps: Option<Vec<i64>>,
}

impl BulkInput {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.prediction_ids.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.prediction_ids.is_empty()
    }

    fn check_shapes(&self) -> Result<()> {
        let n = self.len();
        let check = |what: &str, len: usize| {
            if len == n {
                Ok(())
            } else {
                Err(ArizeError::invalid_shape(format!(
                    "{} has {} rows but there are {} prediction ids",
                    what, len, n
                )))
            }
        };

        if let Some(ref labels) = self.prediction_labels {
            check("prediction_labels", labels.len())?;
        }
        if let Some(ref labels) = self.actual_labels {
            check("actual_labels", labels.len())?;
        }
        if let Some(ref ts) = self.prediction_timestamps {
            check("prediction_timestamps", ts.len())?;
        }
        for (name, col) in self.features.iter().flatten() {
            check(&format!("feature column '{}'", name), col.len())?;
        }
        for (name, col) in self.tags.iter().flatten() {
            check(&format!("tag column '{}'", name), col.len())?;
        }
        for (name, col) in self.shap_values.iter().flatten() {
            check(&format!("shap column '{}'", name), col.len())?;
        }

        if let Some(ref names) = self.feature_names_overwrite {
            let num_features = self.features.as_ref().map_or(0, Vec::len);
            if names.len() != num_features {
                return Err(ArizeError::invalid_shape(format!(
                    "feature_names_overwrite has {} names but there are {} feature columns",
                    names.len(),
                    num_features
                )));
            }
        }
        Ok(())
    }

    fn feature_names(&self) -> Vec<String> {
        match (&self.feature_names_overwrite, &self.features) {
            (Some(names), _) => names.clone(),
            (None, Some(cols)) => cols.iter().map(|(name, _)| name.clone()).collect(),
            (None, None) => Vec::new(),
        }
    }

    fn row(&self, i: usize, feature_names: &[String]) -> RecordInput {
        let collect_row = |cols: &Option<Vec<(String, Vec<Value>)>>, names: Option<&[String]>| {
            cols.as_ref().map(|cols| {
                cols.iter()
                    .enumerate()
                    .map(|(c, (name, values))| {
                        let name = names.map_or(name, |n| &n[c]);
                        (name.clone(), values[i].clone())
                    })
                    .collect::<BTreeMap<_, _>>()
            })
        };

        RecordInput {
            prediction_id: self.prediction_ids[i].clone(),
            prediction_label: self.prediction_labels.as_ref().map(|l| l[i].clone()),
            actual_label: self.actual_labels.as_ref().map(|l| l[i].clone()),
            features: collect_row(&self.features, Some(feature_names)),
            embedding_features: None,
            tags: collect_row(&self.tags, None),
            shap_values: self.shap_values.as_ref().map(|cols| {
                cols.iter()
                    .map(|(name, values)| (name.clone(), values[i]))
                    .collect()
            }),
            prediction_timestamp: self.prediction_timestamps.as_ref().map(|t| t[i]),
        }
    }
}

fn check_names<'a>(kind: &str, names: impl IntoIterator<Item = &'a String>) -> Result<()> {
    if names.into_iter().any(|n| n.trim().is_empty()) {
        return Err(ArizeError::invalid_argument(format!(
            "{} names must be non-empty strings",
            kind
        )));
    }
    Ok(())
}

/// Build the records for a single prediction id
///
/// One record is produced per populated facet: prediction, actual and
/// feature importances. When `with_keys` is false the space key and model
/// id are left empty because the enclosing bulk message carries them.
pub fn build_record(ctx: &RecordContext, input: &RecordInput, with_keys: bool) -> Result<Vec<Record>> {
    if input.prediction_id.is_empty() {
        return Err(ArizeError::invalid_argument("prediction_id must be a non-empty string"));
    }
    if let Some(ref features) = input.features {
        check_names("feature", features.keys())?;
    }
    if let Some(ref tags) = input.tags {
        check_names("tag", tags.keys())?;
    }

    let timestamp = get_timestamp(input.prediction_timestamp);
    let model_version = ctx.model_version.clone().unwrap_or_default();
    let tags = match input.tags {
        Some(ref tags) => convert::convert_dictionary(tags)?,
        None => Default::default(),
    };

    let mut facets = Vec::new();

    if let Some(ref label) = input.prediction_label {
        let features = match input.features {
            Some(ref features) => convert::convert_dictionary(features)?,
            None => Default::default(),
        };
        let mut embedding_features = std::collections::HashMap::new();
        for (name, emb) in input.embedding_features.iter().flatten() {
            emb.validate(name)?;
            embedding_features.insert(
                name.clone(),
                proto::Value {
                    data: Some(proto::value::Data::Embedding(convert::get_value_embedding(emb))),
                },
            );
        }
        facets.push(PredictionOrActual::Prediction(proto::Prediction {
            timestamp: timestamp.clone(),
            model_version: model_version.clone(),
            label: Some(convert::get_label(label)),
            features,
            tags: tags.clone(),
            embedding_features,
        }));
    }

    if let Some(ref label) = input.actual_label {
        facets.push(PredictionOrActual::Actual(proto::Actual {
            timestamp: timestamp.clone(),
            label: Some(convert::get_label(label)),
            // Tags ride on the prediction when there is one
            tags: if input.prediction_label.is_some() {
                Default::default()
            } else {
                tags
            },
        }));
    }

    if let Some(ref shap) = input.shap_values {
        let feature_importances = shap
            .iter()
            .filter(|(_, v)| !v.is_nan())
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        facets.push(PredictionOrActual::FeatureImportances(proto::FeatureImportances {
            timestamp,
            model_version,
            feature_importances,
        }));
    }

    if facets.is_empty() {
        return Err(ArizeError::invalid_argument(
            "at least one of prediction label, actual label or shap values must be provided",
        ));
    }

    Ok(facets
        .into_iter()
        .map(|facet| Record {
            space_key: if with_keys { ctx.space_key.clone() } else { String::new() },
            model_id: if with_keys { ctx.model_id.clone() } else { String::new() },
            prediction_id: input.prediction_id.clone(),
            prediction_or_actual: Some(facet),
        })
        .collect())
}

/// Build size-bounded bulk messages from columnar input
pub fn build_bulk_records(ctx: &RecordContext, input: &BulkInput) -> Result<Vec<BulkRecord>> {
    input.check_shapes()?;
    if input.prediction_labels.is_none()
        && input.actual_labels.is_none()
        && input.shap_values.is_none()
    {
        return Err(ArizeError::invalid_argument(
            "at least one of prediction_labels, actual_labels or shap_values must be provided",
        ));
    }

    let feature_names = input.feature_names();
    check_names("feature", &feature_names)?;

    let rows: Vec<Vec<Record>> = (0..input.len())
        .into_par_iter()
        .map(|i| build_record(ctx, &input.row(i, &feature_names), false))
        .collect::<Result<_>>()?;
    let records: Vec<Record> = rows.into_iter().flatten().collect();
    debug!(rows = input.len(), records = records.len(), "built bulk records");

    let bundles = bundle_records(records);
    Ok(get_bulk_records(
        &ctx.space_key,
        &ctx.model_id,
        ctx.model_version.as_deref(),
        bundles,
    ))
}
