//! Protobuf wire messages
//!
//! Hand-declared prost messages mirroring the public ingestion protocol:
//! per-inference `Record`s, size-bounded `BulkRecord` envelopes, and the
//! `FileSchema` header that accompanies Arrow file uploads.

use std::collections::HashMap;

use prost_types::Timestamp;

/// A feature or tag value
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Value {
    /// Unset for null values
    #[prost(oneof = "value::Data", tags = "1, 2, 3, 4")]
    pub data: Option<value::Data>,
}

/// Nested types of [`Value`]
pub mod value {
    /// Typed payload of a [`Value`](super::Value)
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        /// Strings, and bools as `"True"`/`"False"`
        #[prost(string, tag = "1")]
        String(String),
        /// Integers
        #[prost(int64, tag = "2")]
        Int(i64),
        /// Floats
        #[prost(double, tag = "3")]
        Double(f64),
        /// Embedding features
        #[prost(message, tag = "4")]
        Embedding(super::Embedding),
    }
}

/// Embedding vector with optional raw data
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Embedding {
    /// The vector itself
    #[prost(double, repeated, tag = "1")]
    pub vector: Vec<f64>,
    /// Text the vector was computed from
    #[prost(message, optional, tag = "2")]
    pub raw_data: Option<embedding::RawData>,
    /// Encoded as `google.protobuf.StringValue`
    #[prost(message, optional, tag = "3")]
    pub link_to_data: Option<String>,
}

/// Nested types of [`Embedding`]
pub mod embedding {
    /// Raw data behind an embedding
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RawData {
        /// Tokens, a single string is one token
        #[prost(message, optional, tag = "1")]
        pub token_array: Option<TokenArray>,
    }

    /// Ordered tokens
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TokenArray {
        /// Token strings
        #[prost(string, repeated, tag = "1")]
        pub tokens: Vec<String>,
    }
}

/// Category with an optional probability
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScoreCategorical {
    /// Predicted or actual class
    #[prost(string, tag = "1")]
    pub category: String,
    /// Probability of the class
    #[prost(double, optional, tag = "2")]
    pub score: Option<f64>,
}

/// Prediction or actual label
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Label {
    /// Typed label
    #[prost(oneof = "label::Data", tags = "1, 2, 3, 4")]
    pub data: Option<label::Data>,
}

/// Nested types of [`Label`]
pub mod label {
    /// Label kinds
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        /// Binary classification
        #[prost(bool, tag = "1")]
        Binary(bool),
        /// Class name
        #[prost(string, tag = "2")]
        Categorical(String),
        /// Regression output
        #[prost(double, tag = "3")]
        Numeric(f64),
        /// Class with a score
        #[prost(message, tag = "4")]
        ScoreCategorical(super::ScoreCategorical),
    }
}

/// Prediction facet of a record
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Prediction {
    /// Time of the prediction, server time when unset
    #[prost(message, optional, tag = "1")]
    pub timestamp: Option<Timestamp>,
    /// Model version, empty when unknown
    #[prost(string, tag = "2")]
    pub model_version: String,
    /// Predicted label
    #[prost(message, optional, tag = "3")]
    pub label: Option<Label>,
    /// Feature values by name
    #[prost(map = "string, message", tag = "4")]
    pub features: HashMap<String, Value>,
    /// Tag values by name
    #[prost(map = "string, message", tag = "5")]
    pub tags: HashMap<String, Value>,
    /// Embedding features by name
    #[prost(map = "string, message", tag = "6")]
    pub embedding_features: HashMap<String, Value>,
}

/// Actual (ground truth) facet of a record
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Actual {
    /// Time the actual was observed
    #[prost(message, optional, tag = "1")]
    pub timestamp: Option<Timestamp>,
    /// Actual label
    #[prost(message, optional, tag = "2")]
    pub label: Option<Label>,
    /// Tag values by name
    #[prost(map = "string, message", tag = "3")]
    pub tags: HashMap<String, Value>,
}

/// SHAP values of one prediction
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FeatureImportances {
    /// Time of the importances
    #[prost(message, optional, tag = "1")]
    pub timestamp: Option<Timestamp>,
    /// Model version, empty when unknown
    #[prost(string, tag = "2")]
    pub model_version: String,
    /// Importance by feature name
    #[prost(map = "string, double", tag = "3")]
    pub feature_importances: HashMap<String, f64>,
}

/// A single logged inference facet
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Record {
    /// Empty inside a [`BulkRecord`]
    #[prost(string, tag = "1")]
    pub space_key: String,
    /// Empty inside a [`BulkRecord`]
    #[prost(string, tag = "2")]
    pub model_id: String,
    /// Id joining predictions, actuals and importances
    #[prost(string, tag = "3")]
    pub prediction_id: String,
    /// The facet carried by this record
    #[prost(oneof = "record::PredictionOrActual", tags = "4, 5, 6")]
    pub prediction_or_actual: Option<record::PredictionOrActual>,
}

/// Nested types of [`Record`]
pub mod record {
    /// Record facets
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PredictionOrActual {
        /// A prediction
        #[prost(message, tag = "4")]
        Prediction(super::Prediction),
        /// An actual
        #[prost(message, tag = "5")]
        Actual(super::Actual),
        /// SHAP values
        #[prost(message, tag = "6")]
        FeatureImportances(super::FeatureImportances),
    }
}

impl Record {
    /// Prediction facet, if any
    pub fn prediction(&self) -> Option<&Prediction> {
        match self.prediction_or_actual {
            Some(record::PredictionOrActual::Prediction(ref p)) => Some(p),
            _ => None,
        }
    }

    /// Actual facet, if any
    pub fn actual(&self) -> Option<&Actual> {
        match self.prediction_or_actual {
            Some(record::PredictionOrActual::Actual(ref a)) => Some(a),
            _ => None,
        }
    }

    /// Feature importance facet, if any
    pub fn feature_importances(&self) -> Option<&FeatureImportances> {
        match self.prediction_or_actual {
            Some(record::PredictionOrActual::FeatureImportances(ref f)) => Some(f),
            _ => None,
        }
    }
}

/// Envelope for many records of one model
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BulkRecord {
    /// Space the records belong to
    #[prost(string, tag = "1")]
    pub space_key: String,
    /// Model the records belong to
    #[prost(string, tag = "2")]
    pub model_id: String,
    /// Model version, empty when unknown
    #[prost(string, tag = "3")]
    pub model_version: String,
    /// Time the envelope was built
    #[prost(message, optional, tag = "4")]
    pub timestamp: Option<Timestamp>,
    /// Records without space or model
    #[prost(message, repeated, tag = "5")]
    pub records: Vec<Record>,
}

/// Header message describing an uploaded Arrow file
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileSchema {
    /// Values shared by every row
    #[prost(message, optional, tag = "1")]
    pub constants: Option<file_schema::Constants>,
    /// Role of each column
    #[prost(message, optional, tag = "2")]
    pub arrow_schema: Option<file_schema::ArrowSchema>,
}

/// Nested types of [`FileSchema`]
pub mod file_schema {
    use std::collections::HashMap;

    /// Call-level arguments of an upload
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Constants {
        /// Model id
        #[prost(string, tag = "1")]
        pub model_id: String,
        /// Model version, empty when unknown
        #[prost(string, tag = "2")]
        pub model_version: String,
        /// Wire name of the environment
        #[prost(string, tag = "3")]
        pub environment: String,
        /// Wire name of the model type
        #[prost(string, tag = "4")]
        pub model_type: String,
        /// Batch id, empty outside validation
        #[prost(string, tag = "5")]
        pub batch_id: String,
    }

    /// Columns of one embedding
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct EmbeddingColumns {
        /// Vector column
        #[prost(string, tag = "1")]
        pub vector_column_name: String,
        /// Raw data column, empty when unset
        #[prost(string, tag = "2")]
        pub data_column_name: String,
        /// Link column, empty when unset
        #[prost(string, tag = "3")]
        pub link_to_data_column_name: String,
    }

    /// Columns of object detection predictions or actuals
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ObjectDetectionColumns {
        /// Box coordinates column
        #[prost(string, tag = "1")]
        pub bounding_boxes_coordinates_column_name: String,
        /// Box categories column
        #[prost(string, tag = "2")]
        pub categories_column_name: String,
        /// Box scores column, empty when unset
        #[prost(string, tag = "3")]
        pub scores_column_name: String,
    }

    /// Column roles, empty strings for unset columns
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ArrowSchema {
        /// Prediction id column
        #[prost(string, tag = "1")]
        pub prediction_id_column_name: String,
        /// Timestamp column
        #[prost(string, tag = "2")]
        pub timestamp_column_name: String,
        /// Feature columns
        #[prost(string, repeated, tag = "3")]
        pub feature_column_names: Vec<String>,
        /// Tag columns
        #[prost(string, repeated, tag = "4")]
        pub tag_column_names: Vec<String>,
        /// Prediction label column
        #[prost(string, tag = "5")]
        pub prediction_label_column_name: String,
        /// Prediction score column
        #[prost(string, tag = "6")]
        pub prediction_score_column_name: String,
        /// Actual label column
        #[prost(string, tag = "7")]
        pub actual_label_column_name: String,
        /// Actual score column
        #[prost(string, tag = "8")]
        pub actual_score_column_name: String,
        /// SHAP column by feature name
        #[prost(map = "string, string", tag = "9")]
        pub shap_values_column_names: HashMap<String, String>,
        /// Embedding columns by feature name
        #[prost(map = "string, message", tag = "10")]
        pub embedding_feature_column_names: HashMap<String, EmbeddingColumns>,
        /// Prompt columns of generative models
        #[prost(message, optional, tag = "11")]
        pub prompt_column_names: Option<EmbeddingColumns>,
        /// Response columns of generative models
        #[prost(message, optional, tag = "12")]
        pub response_column_names: Option<EmbeddingColumns>,
        /// Object detection prediction columns
        #[prost(message, optional, tag = "13")]
        pub object_detection_prediction_column_names: Option<ObjectDetectionColumns>,
        /// Object detection actual columns
        #[prost(message, optional, tag = "14")]
        pub object_detection_actual_column_names: Option<ObjectDetectionColumns>,
    }
}
