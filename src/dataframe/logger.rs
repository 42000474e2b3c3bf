//! Dataframe logger: validate, project and upload a `RecordBatch`

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arrow::array::{ArrayRef, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use prost::Message;
use tracing::{debug, info};

use super::arrays::is_string;
use super::validation::{self, ValidationContext, ValidationError, ValidationFailure};
use crate::config::Config;
use crate::constants::{DEFAULT_URI, GENERATED_PREDICTION_LABEL_COL};
use crate::error::{ArizeError, Result};
use crate::http::{sync_header, ApiResponse, HttpSender};
use crate::models::{
    EmbeddingColumnNames, Environment, ModelType, ObjectDetectionColumnNames, Schema,
};
use crate::proto::{file_schema, FileSchema};

/// Per-call options of a dataframe upload
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Model the rows belong to
    pub model_id: String,
    /// Model type, drives which columns are allowed
    pub model_type: ModelType,
    /// Environment the rows come from
    pub environment: Environment,
    /// Model version
    pub model_version: Option<String>,
    /// Required for the validation environment
    pub batch_id: Option<String>,
    /// Ask the server to ingest before answering, `None` keeps the client default
    pub sync: Option<bool>,
    /// Run the validation stages before uploading
    pub validate: bool,
    /// Keep the Arrow stream at this path instead of a temp file
    pub path: Option<PathBuf>,
    /// Overrides the client timeout for this upload
    pub timeout: Option<Duration>,
}

impl LogOptions {
    /// Options with validation on and no version, batch or path
    pub fn new(
        model_id: impl Into<String>,
        model_type: ModelType,
        environment: Environment,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            model_type,
            environment,
            model_version: None,
            batch_id: None,
            sync: None,
            validate: true,
            path: None,
            timeout: None,
        }
    }

    /// Set the model version
    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = Some(version.into());
        self
    }

    /// Set the batch id
    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    /// Override the client `sync` default
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Turn validation on or off
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Keep the Arrow stream at `path`
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the timeout of this upload
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A batch ready to be written and sent
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    /// Only the schema columns, categorical columns decoded
    pub batch: RecordBatch,
    /// The schema after default columns were added
    pub schema: Schema,
    /// Header describing the batch to the server
    pub file_schema: FileSchema,
}

impl PreparedUpload {
    /// Value of the `schema` header
    pub fn encoded_schema(&self) -> String {
        BASE64.encode(self.file_schema.encode_to_vec())
    }

    /// Write the batch as an Arrow IPC stream
    pub fn write_stream<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = StreamWriter::try_new(writer, self.batch.schema().as_ref())?;
        writer.write(&self.batch)?;
        writer.finish()?;
        Ok(())
    }
}

fn embedding_columns(cols: &EmbeddingColumnNames) -> file_schema::EmbeddingColumns {
    file_schema::EmbeddingColumns {
        vector_column_name: cols.vector_column_name.clone(),
        data_column_name: cols.data_column_name.clone().unwrap_or_default(),
        link_to_data_column_name: cols.link_to_data_column_name.clone().unwrap_or_default(),
    }
}

fn object_detection_columns(
    cols: &ObjectDetectionColumnNames,
) -> file_schema::ObjectDetectionColumns {
    file_schema::ObjectDetectionColumns {
        bounding_boxes_coordinates_column_name: cols.bounding_boxes_coordinates_column_name.clone(),
        categories_column_name: cols.categories_column_name.clone(),
        scores_column_name: cols.scores_column_name.clone().unwrap_or_default(),
    }
}

/// Protobuf description of the upload sent alongside the Arrow stream
pub fn get_file_schema(schema: &Schema, options: &LogOptions) -> FileSchema {
    let constants = file_schema::Constants {
        model_id: options.model_id.clone(),
        model_version: options.model_version.clone().unwrap_or_default(),
        environment: options.environment.as_str().to_string(),
        model_type: options.model_type.as_str().to_string(),
        batch_id: options.batch_id.clone().unwrap_or_default(),
    };

    let arrow_schema = file_schema::ArrowSchema {
        prediction_id_column_name: schema.prediction_id_column_name.clone().unwrap_or_default(),
        timestamp_column_name: schema.timestamp_column_name.clone().unwrap_or_default(),
        feature_column_names: schema.feature_column_names.clone().unwrap_or_default(),
        tag_column_names: schema.tag_column_names.clone().unwrap_or_default(),
        prediction_label_column_name: schema.prediction_label_column_name.clone().unwrap_or_default(),
        prediction_score_column_name: schema.prediction_score_column_name.clone().unwrap_or_default(),
        actual_label_column_name: schema.actual_label_column_name.clone().unwrap_or_default(),
        actual_score_column_name: schema.actual_score_column_name.clone().unwrap_or_default(),
        shap_values_column_names: schema
            .shap_values_column_names
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        embedding_feature_column_names: schema
            .embedding_feature_column_names
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), embedding_columns(v)))
            .collect(),
        prompt_column_names: schema.prompt_column_names.as_ref().map(embedding_columns),
        response_column_names: schema.response_column_names.as_ref().map(embedding_columns),
        object_detection_prediction_column_names: schema
            .object_detection_prediction_column_names
            .as_ref()
            .map(object_detection_columns),
        object_detection_actual_column_names: schema
            .object_detection_actual_column_names
            .as_ref()
            .map(object_detection_columns),
    };

    FileSchema {
        constants: Some(constants),
        arrow_schema: Some(arrow_schema),
    }
}

/// Append the constant label generative models are logged with when the
/// caller has none
fn add_default_prediction_label(
    batch: &RecordBatch,
    schema: &Schema,
) -> Result<(RecordBatch, Schema)> {
    let mut fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    fields.push(Field::new(GENERATED_PREDICTION_LABEL_COL, DataType::Int64, false));
    columns.push(Arc::new(Int64Array::from(vec![1_i64; batch.num_rows()])));

    let batch = RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), columns)?;
    let schema = schema.merge(&Schema::new().with_prediction_label(GENERATED_PREDICTION_LABEL_COL));
    Ok((batch, schema))
}

/// Keep the schema columns in batch order
fn project(batch: &RecordBatch, schema: &Schema) -> Result<RecordBatch> {
    let used: HashSet<String> = schema.used_columns().into_iter().collect();
    let indices: Vec<usize> = batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| used.contains(f.name()))
        .map(|(i, _)| i)
        .collect();
    Ok(batch.project(&indices)?)
}

/// Replace dictionary encoded columns with their plain values
fn decode_categories(batch: &RecordBatch) -> Result<RecordBatch> {
    let arrow_schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, column) in arrow_schema.fields().iter().zip(batch.columns()) {
        match field.data_type() {
            DataType::Dictionary(_, values) => {
                let target = if is_string(values) {
                    DataType::Utf8
                } else {
                    values.as_ref().clone()
                };
                columns.push(cast(column, &target)?);
                fields.push(field.as_ref().clone().with_data_type(target));
            }
            _ => {
                columns.push(column.clone());
                fields.push(field.as_ref().clone());
            }
        }
    }

    Ok(RecordBatch::try_new(
        Arc::new(ArrowSchema::new(fields)),
        columns,
    )?)
}

/// Everything short of writing and sending: default columns, validation,
/// projection and decoding of categorical columns
pub fn prepare(
    batch: &RecordBatch,
    schema: &Schema,
    options: &LogOptions,
) -> Result<PreparedUpload> {
    if batch.schema().column_with_name(GENERATED_PREDICTION_LABEL_COL).is_some() {
        return Err(ValidationFailure {
            errors: vec![ValidationError::ReservedColumns(vec![
                GENERATED_PREDICTION_LABEL_COL.to_string(),
            ])],
        }
        .into());
    }

    let (batch, schema) = if options.model_type == ModelType::GenerativeLlm
        && schema.prediction_label_column_name.is_none()
    {
        debug!(column = GENERATED_PREDICTION_LABEL_COL, "adding default prediction label");
        add_default_prediction_label(batch, schema)?
    } else {
        (batch.clone(), schema.clone())
    };

    if options.validate {
        let ctx = ValidationContext {
            model_id: &options.model_id,
            model_version: options.model_version.as_deref(),
            batch_id: options.batch_id.as_deref(),
            model_type: options.model_type,
            environment: options.environment,
        };
        validation::validate(&batch, &schema, &ctx)?;
    }

    let batch = decode_categories(&project(&batch, &schema)?)?;
    debug!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "dataframe prepared"
    );

    Ok(PreparedUpload {
        file_schema: get_file_schema(&schema, options),
        batch,
        schema,
    })
}

/// Client for the Arrow file endpoint
#[derive(Debug, Clone)]
pub struct DataFrameClient {
    sender: HttpSender,
    uri: String,
}

impl DataFrameClient {
    /// Create a client for the default endpoint
    pub fn new(api_key: &str, space_key: &str) -> Result<Self> {
        Ok(Self {
            sender: HttpSender::new(api_key, space_key)?,
            uri: DEFAULT_URI.to_string(),
        })
    }

    /// Create a client from configuration and the environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| ArizeError::Auth("no api key configured".into()))?;
        let space_key = config
            .space_key()
            .ok_or_else(|| ArizeError::Auth("no space key configured".into()))?;

        let mut client = Self::new(&api_key, &space_key)?
            .with_uri(config.uri())
            .with_sync(config.network.sync);
        client.sender = client.sender.with_client(config.http_client()?);
        if config.network.timeout > 0 {
            client = client.with_timeout(Duration::from_secs(config.network.timeout));
        }
        Ok(client)
    }

    /// Override the base URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into().trim_end_matches('/').to_string();
        self
    }

    /// Apply a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.sender = self.sender.with_timeout(timeout);
        self
    }

    /// Default `sync` for uploads whose options leave it unset
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sender = self.sender.with_sync(sync);
        self
    }

    /// Add caller headers; reserved names are rejected
    pub fn with_additional_headers(mut self, headers: BTreeMap<String, String>) -> Result<Self> {
        self.sender = self.sender.with_additional_headers(headers)?;
        Ok(self)
    }

    /// Headers sent with every request
    pub fn headers(&self) -> &BTreeMap<String, String> {
        self.sender.headers()
    }

    fn files_uri(&self) -> String {
        format!("{}/pandas_arrow", self.uri)
    }

    /// See [`prepare`]
    pub fn prepare(
        &self,
        batch: &RecordBatch,
        schema: &Schema,
        options: &LogOptions,
    ) -> Result<PreparedUpload> {
        prepare(batch, schema, options)
    }

    /// Validate, write and upload a batch
    pub async fn log(
        &self,
        batch: &RecordBatch,
        schema: &Schema,
        options: &LogOptions,
    ) -> Result<ApiResponse> {
        let prepared = self.prepare(batch, schema, options)?;

        // The temp file lives until the upload finished
        let (path, _tmp) = match options.path {
            Some(ref path) => (path.clone(), None),
            None => {
                let tmp = tempfile::Builder::new()
                    .prefix("arize-")
                    .suffix(".arrow")
                    .tempfile()?;
                (tmp.path().to_path_buf(), Some(tmp))
            }
        };
        prepared.write_stream(File::create(&path)?)?;
        debug!(path = %path.display(), "arrow stream written");

        let mut extra = vec![("schema", prepared.encoded_schema())];
        if let Some(sync) = options.sync {
            extra.push(("sync", sync_header(sync).to_string()));
        }

        let sender = match options.timeout {
            Some(timeout) => self.sender.clone().with_timeout(timeout),
            None => self.sender.clone(),
        };
        let resp = sender.post_file(&self.files_uri(), &path, &extra).await?;
        if resp.is_success() {
            info!(
                rows = prepared.batch.num_rows(),
                model_id = %options.model_id,
                "dataframe uploaded"
            );
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::validation::fixtures::*;
    use arrow::array::{
        Array, AsArray, BooleanArray, DictionaryArray, Float64Array, Float64Builder, ListArray,
        ListBuilder, NullArray, StringArray, StringBuilder, TimestampSecondArray,
    };
    use arrow::datatypes::{Float64Type, Int32Type};
    use arrow::ipc::reader::StreamReader;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> DataFrameClient {
        DataFrameClient::new("API_KEY", "test_space").unwrap()
    }

    fn base_batch() -> RecordBatch {
        let actual: DictionaryArray<Int32Type> =
            vec!["fraud", "not fraud", "fraud"].into_iter().collect();
        batch(vec![
            ("prediction_id", strings(&["a", "b", "c"])),
            ("prediction_label", strings(&["fraud", "fraud", "not fraud"])),
            ("prediction_score", floats(&[0.2, 0.3, 0.4])),
            ("actual_label", Arc::new(actual) as ArrayRef),
            ("actual_score", ints(&[0, 1, 0])),
            ("A", floats(&[0.1, 0.2, 0.3])),
            ("B", strings(&["x", "y", "z"])),
            ("unused", strings(&["u", "v", "w"])),
        ])
    }

    fn base_schema() -> Schema {
        Schema::new()
            .with_prediction_id("prediction_id")
            .with_prediction_label("prediction_label")
            .with_prediction_score("prediction_score")
            .with_actual_label("actual_label")
            .with_actual_score("actual_score")
            .with_features(["A", "B"])
    }

    fn options(model_type: ModelType) -> LogOptions {
        LogOptions::new("model", model_type, Environment::Production)
    }

    fn validation_errors(err: ArizeError) -> Vec<ValidationError> {
        match err {
            ArizeError::Validation(failure) => failure.errors,
            other => panic!("expected validation failure, got {}", other),
        }
    }

    fn category(values: &[&str]) -> ArrayRef {
        let dict: DictionaryArray<Int32Type> = values.iter().copied().collect();
        Arc::new(dict)
    }

    fn vectors(rows: &[&[f64]]) -> ArrayRef {
        Arc::new(ListArray::from_iter_primitive::<Float64Type, _, _>(
            rows.iter().map(|r| Some(r.iter().copied().map(Some).collect::<Vec<_>>())),
        ))
    }

    fn string_lists(rows: &[&[&str]]) -> ArrayRef {
        let mut builder = ListBuilder::new(StringBuilder::new());
        for row in rows {
            for token in row.iter() {
                builder.values().append_value(token);
            }
            builder.append(true);
        }
        Arc::new(builder.finish())
    }

    fn boxes(rows: &[&[[f64; 4]]]) -> ArrayRef {
        let mut builder = ListBuilder::new(ListBuilder::new(Float64Builder::new()));
        for row in rows {
            for coords in row.iter() {
                builder.values().values().append_slice(coords);
                builder.values().append(true);
            }
            builder.append(true);
        }
        Arc::new(builder.finish())
    }

    fn recent_timestamps(n: usize) -> ArrayRef {
        let now = chrono::Utc::now().timestamp();
        Arc::new(TimestampSecondArray::from(
            (0..n as i64).map(|i| now - i * 3_600).collect::<Vec<_>>(),
        ))
    }

    /// The input without `dropped`, categorical columns decoded
    fn expected_upload(batch: &RecordBatch, dropped: &[&str]) -> RecordBatch {
        let arrow_schema = batch.schema();
        let (fields, columns): (Vec<Field>, Vec<ArrayRef>) = arrow_schema
            .fields()
            .iter()
            .zip(batch.columns())
            .filter(|(f, _)| !dropped.contains(&f.name().as_str()))
            .map(|(f, c)| match f.data_type() {
                DataType::Dictionary(_, _) => (
                    f.as_ref().clone().with_data_type(DataType::Utf8),
                    cast(c, &DataType::Utf8).unwrap(),
                ),
                _ => (f.as_ref().clone(), c.clone()),
            })
            .unzip();
        RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), columns).unwrap()
    }

    #[test]
    fn test_prepare_keeps_every_column_kind() {
        let nan = f64::NAN;
        let input = batch(vec![
            ("prediction_id", strings(&["a", "b", "c"])),
            ("prediction_ts", recent_timestamps(3)),
            ("prediction_label", strings(&["fraud", "fraud", "not fraud"])),
            ("prediction_score", floats(&[0.2, 0.3, 0.4])),
            ("actual_label", category(&["fraud", "not fraud", "fraud"])),
            ("actual_score", floats(&[1.0, 0.0, 1.0])),
            ("f_int", ints(&[1, 2, 3])),
            ("f_nan", floats(&[nan, nan, nan])),
            ("f_null", Arc::new(NullArray::new(3)) as ArrayRef),
            ("f_bool", Arc::new(BooleanArray::from(vec![true, false, true])) as ArrayRef),
            ("f_cat", category(&["x", "y", "x"])),
            ("t_str", strings(&["us", "eu", "us"])),
            ("t_nan", floats(&[nan, nan, nan])),
            ("t_bool", Arc::new(BooleanArray::from(vec![false, false, true])) as ArrayRef),
            ("t_cat", category(&["new", "old", "new"])),
            ("f_int_shap", floats(&[0.1, -0.2, 0.3])),
            ("f_bool_shap", floats(&[0.0, 0.5, 0.25])),
            ("image_vector", vectors(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]])),
            ("image_link", strings(&["s3://a.png", "s3://b.png", "s3://c.png"])),
            ("text_vector", vectors(&[&[0.1, 0.2], &[0.3, 0.4], &[0.5, 0.6]])),
            (
                "text_tokens",
                string_lists(&[&["hello", "world"], &["good", "day"], &["bye"]]),
            ),
            ("ignored", strings(&["u", "v", "w"])),
            ("also_ignored", ints(&[7, 8, 9])),
        ]);
        let schema = Schema::new()
            .with_prediction_id("prediction_id")
            .with_timestamp("prediction_ts")
            .with_prediction_label("prediction_label")
            .with_prediction_score("prediction_score")
            .with_actual_label("actual_label")
            .with_actual_score("actual_score")
            .with_features(["f_int", "f_nan", "f_null", "f_bool", "f_cat"])
            .with_tags(["t_str", "t_nan", "t_bool", "t_cat"])
            .with_shap_value("f_int", "f_int_shap")
            .with_shap_value("f_bool", "f_bool_shap")
            .with_embedding_feature(
                "image",
                EmbeddingColumnNames::new("image_vector").with_link("image_link"),
            )
            .with_embedding_feature(
                "text",
                EmbeddingColumnNames::new("text_vector").with_data("text_tokens"),
            );

        let prepared = client()
            .prepare(&input, &schema, &options(ModelType::ScoreCategorical))
            .unwrap();
        assert_eq!(
            prepared.batch,
            expected_upload(&input, &["ignored", "also_ignored"])
        );
        assert_eq!(prepared.schema, schema);

        let arrow_schema = prepared.file_schema.arrow_schema.unwrap();
        assert_eq!(arrow_schema.timestamp_column_name, "prediction_ts");
        assert_eq!(arrow_schema.shap_values_column_names["f_int"], "f_int_shap");
        assert_eq!(
            arrow_schema.embedding_feature_column_names["text"].data_column_name,
            "text_tokens"
        );
    }

    #[test]
    fn test_prepare_object_detection() {
        let input = batch(vec![
            ("prediction_id", strings(&["img-0", "img-1"])),
            ("prediction_ts", recent_timestamps(2)),
            (
                "pred_boxes",
                boxes(&[
                    &[[0.1, 0.2, 0.3, 0.4]],
                    &[[0.0, 0.0, 1.0, 1.0], [0.5, 0.5, 0.6, 0.6]],
                ]),
            ),
            ("pred_categories", string_lists(&[&["cat"], &["dog", "cat"]])),
            ("pred_scores", vectors(&[&[0.9], &[0.8, 0.3]])),
            ("actual_boxes", boxes(&[&[[0.1, 0.2, 0.35, 0.4]], &[]])),
            ("actual_categories", string_lists(&[&["cat"], &[]])),
            ("camera", category(&["front", "back"])),
            ("site", strings(&["berlin", "lagos"])),
            ("ignored", ints(&[1, 2])),
        ]);
        let schema = Schema::new()
            .with_prediction_id("prediction_id")
            .with_timestamp("prediction_ts")
            .with_features(["camera"])
            .with_tags(["site"])
            .with_object_detection_prediction(ObjectDetectionColumnNames {
                bounding_boxes_coordinates_column_name: "pred_boxes".into(),
                categories_column_name: "pred_categories".into(),
                scores_column_name: Some("pred_scores".into()),
            })
            .with_object_detection_actual(ObjectDetectionColumnNames {
                bounding_boxes_coordinates_column_name: "actual_boxes".into(),
                categories_column_name: "actual_categories".into(),
                scores_column_name: None,
            });

        let prepared = client()
            .prepare(&input, &schema, &options(ModelType::ObjectDetection))
            .unwrap();
        assert_eq!(prepared.batch, expected_upload(&input, &["ignored"]));

        let decoded = prepared.file_schema.arrow_schema.unwrap();
        let od = decoded.object_detection_prediction_column_names.unwrap();
        assert_eq!(od.scores_column_name, "pred_scores");
        assert!(decoded
            .object_detection_actual_column_names
            .unwrap()
            .scores_column_name
            .is_empty());
    }

    #[test]
    fn test_prepare_generative_with_embeddings() {
        let input = batch(vec![
            ("prediction_id", strings(&["a", "b"])),
            ("prediction_ts", recent_timestamps(2)),
            ("prompt_vector", vectors(&[&[1.0, 2.0], &[3.0, 4.0]])),
            ("prompt_text", strings(&["what is rust?", "hello"])),
            ("response_vector", vectors(&[&[5.0, 6.0], &[7.0, 8.0]])),
            ("response_tokens", string_lists(&[&["a", "language"], &["hi"]])),
            ("doc_vector", vectors(&[&[0.5, 0.5, 0.5], &[0.1, 0.2, 0.3]])),
            ("temperature", floats(&[0.7, 0.2])),
            ("user_tier", category(&["free", "pro"])),
            ("ignored", strings(&["x", "y"])),
        ]);
        let schema = Schema::new()
            .with_prediction_id("prediction_id")
            .with_timestamp("prediction_ts")
            .with_features(["temperature"])
            .with_tags(["user_tier"])
            .with_embedding_feature("doc", EmbeddingColumnNames::new("doc_vector"))
            .with_prompt(EmbeddingColumnNames::new("prompt_vector").with_data("prompt_text"))
            .with_response(
                EmbeddingColumnNames::new("response_vector").with_data("response_tokens"),
            );

        let prepared = client()
            .prepare(&input, &schema, &options(ModelType::GenerativeLlm))
            .unwrap();

        let expected = expected_upload(&input, &["ignored"]);
        let mut fields: Vec<Field> = expected
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut columns = expected.columns().to_vec();
        fields.push(Field::new(GENERATED_PREDICTION_LABEL_COL, DataType::Int64, false));
        columns.push(ints(&[1, 1]));
        let expected = RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), columns).unwrap();
        assert_eq!(prepared.batch, expected);
    }

    #[test]
    fn test_prepare_projects_and_decodes() {
        let prepared = client()
            .prepare(&base_batch(), &base_schema(), &options(ModelType::ScoreCategorical))
            .unwrap();

        let names: Vec<&str> = prepared
            .batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "prediction_id",
                "prediction_label",
                "prediction_score",
                "actual_label",
                "actual_score",
                "A",
                "B"
            ]
        );

        let actual = prepared.batch.column_by_name("actual_label").unwrap();
        assert_eq!(actual.data_type(), &DataType::Utf8);
        assert_eq!(actual.as_string::<i32>().value(1), "not fraud");
    }

    #[test]
    fn test_prepare_file_schema() {
        let opts = options(ModelType::ScoreCategorical)
            .with_model_version("1.0")
            .with_batch_id("batch");
        let prepared = client().prepare(&base_batch(), &base_schema(), &opts).unwrap();

        let decoded = FileSchema::decode(
            BASE64.decode(prepared.encoded_schema()).unwrap().as_slice(),
        )
        .unwrap();
        let constants = decoded.constants.unwrap();
        assert_eq!(constants.model_id, "model");
        assert_eq!(constants.model_version, "1.0");
        assert_eq!(constants.model_type, "score_categorical");
        assert_eq!(constants.environment, "production");
        let arrow_schema = decoded.arrow_schema.unwrap();
        assert_eq!(arrow_schema.prediction_id_column_name, "prediction_id");
        assert_eq!(arrow_schema.feature_column_names, vec!["A", "B"]);
        assert!(arrow_schema.timestamp_column_name.is_empty());
    }

    #[test]
    fn test_generative_default_label() {
        let prompt = ListArray::from_iter_primitive::<Float64Type, _, _>(vec![
            Some(vec![Some(1.0), Some(2.0)]),
            Some(vec![Some(3.0), Some(4.0)]),
        ]);
        let batch = batch(vec![
            ("prediction_id", strings(&["a", "b"])),
            ("prompt", Arc::new(prompt.clone()) as ArrayRef),
            ("response", Arc::new(prompt) as ArrayRef),
        ]);
        let schema = Schema::new()
            .with_prediction_id("prediction_id")
            .with_prompt(EmbeddingColumnNames::new("prompt"))
            .with_response(EmbeddingColumnNames::new("response"));

        let prepared = client()
            .prepare(&batch, &schema, &options(ModelType::GenerativeLlm))
            .unwrap();
        assert_eq!(
            prepared.schema.prediction_label_column_name.as_deref(),
            Some(GENERATED_PREDICTION_LABEL_COL)
        );
        let labels = prepared.batch.column_by_name(GENERATED_PREDICTION_LABEL_COL).unwrap();
        let labels = labels.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(labels.values().to_vec(), vec![1, 1]);
    }

    #[test]
    fn test_reserved_column() {
        let batch = batch(vec![
            ("prediction_id", strings(&["a"])),
            (GENERATED_PREDICTION_LABEL_COL, ints(&[1])),
        ]);
        let schema = Schema::new()
            .with_prediction_id("prediction_id")
            .with_prediction_label(GENERATED_PREDICTION_LABEL_COL);
        let err = client()
            .prepare(&batch, &schema, &options(ModelType::Numeric))
            .unwrap_err();
        assert_eq!(
            validation_errors(err),
            vec![ValidationError::ReservedColumns(vec![
                GENERATED_PREDICTION_LABEL_COL.to_string()
            ])]
        );
    }

    #[test]
    fn test_validation_can_be_skipped() {
        let schema = base_schema().with_prediction_label("prediction_label");
        let err = client()
            .prepare(&base_batch(), &schema, &options(ModelType::Numeric))
            .unwrap_err();
        assert!(!validation_errors(err).is_empty());

        let prepared = client()
            .prepare(
                &base_batch(),
                &schema,
                &options(ModelType::Numeric).with_validate(false),
            )
            .unwrap();
        assert_eq!(prepared.batch.num_rows(), 3);
    }

    #[test]
    fn test_missing_values_rejected() {
        let ids: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), None]));
        let batch = batch(vec![
            ("prediction_id", ids),
            ("prediction_label", Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef),
        ]);
        let schema = Schema::new()
            .with_prediction_id("prediction_id")
            .with_prediction_label("prediction_label");
        let err = client()
            .prepare(&batch, &schema, &options(ModelType::Numeric))
            .unwrap_err();
        assert!(matches!(
            &validation_errors(err)[..],
            [ValidationError::InvalidValueMissingValue { .. }]
        ));
    }

    #[test]
    fn test_write_stream_roundtrip() {
        let prepared = client()
            .prepare(&base_batch(), &base_schema(), &options(ModelType::ScoreCategorical))
            .unwrap();
        let mut buf = Vec::new();
        prepared.write_stream(&mut buf).unwrap();

        let reader = StreamReader::try_new(buf.as_slice(), None).unwrap();
        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], prepared.batch);
    }

    #[tokio::test]
    async fn test_log_uploads_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pandas_arrow"))
            .and(header("space", "test_space"))
            .and(header("sync", "1"))
            .and(header_exists("schema"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client().with_uri(format!("{}/v1", server.uri()));
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("upload.arrow");
        let opts = options(ModelType::ScoreCategorical)
            .with_sync(true)
            .with_path(&file);

        let resp = client.log(&base_batch(), &base_schema(), &opts).await.unwrap();
        assert!(resp.is_success());
        assert!(file.exists());

        let received = server.received_requests().await.unwrap();
        let reader = StreamReader::try_new(received[0].body.as_slice(), None).unwrap();
        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(batches[0].num_columns(), 7);
        assert!(batches[0].column_by_name("unused").is_none());
    }

    #[tokio::test]
    async fn test_sync_default_from_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pandas_arrow"))
            .and(header("sync", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/pandas_arrow"))
            .and(header("sync", "0"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.client.api_key = Some("API_KEY".into());
        config.client.space_key = Some("test_space".into());
        config.client.uri = Some(format!("{}/v1", server.uri()));
        config.network.sync = true;
        let client = DataFrameClient::from_config(&config).unwrap();
        assert_eq!(client.headers()["sync"], "1");

        let opts = options(ModelType::ScoreCategorical);
        let resp = client.log(&base_batch(), &base_schema(), &opts).await.unwrap();
        assert!(resp.is_success());

        // Per-call options win over the client default
        let opts = opts.with_sync(false);
        let resp = client.log(&base_batch(), &base_schema(), &opts).await.unwrap();
        assert!(resp.is_success());

        let received = server.received_requests().await.unwrap();
        let syncs: Vec<_> = received
            .iter()
            .map(|r| r.headers.get_all("sync").iter().count())
            .collect();
        assert_eq!(syncs, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_log_validation_failure_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client().with_uri(format!("{}/v1", server.uri()));
        let opts = LogOptions::new("model", ModelType::ScoreCategorical, Environment::Validation);
        let err = client
            .log(&base_batch(), &base_schema(), &opts)
            .await
            .unwrap_err();
        assert_eq!(validation_errors(err), vec![ValidationError::InvalidBatchId]);
    }
}
