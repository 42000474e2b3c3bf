//! Record client

use std::collections::BTreeMap;
use std::time::Duration;

use prost::Message;
use tracing::{debug, info};

use crate::config::Config;
use crate::constants::DEFAULT_URI;
use crate::error::{ArizeError, Result};
use crate::http::{ApiResponse, HttpSender};
use crate::models::Label;
use crate::proto::{BulkRecord, Record};
use crate::records::{self, BulkInput, RecordContext, RecordInput};

/// What to log
#[derive(Debug, Clone)]
pub enum LogData {
    /// One prediction id
    Single(RecordInput),
    /// Many prediction ids, column by column
    Bulk(BulkInput),
}

/// A log call for one model
#[derive(Debug, Clone)]
pub struct LogRequest {
    /// Model the data belongs to
    pub model_id: String,
    /// Model version, must not be empty when set
    pub model_version: Option<String>,
    /// Single or bulk input
    pub data: LogData,
}

impl LogRequest {
    /// Request for one prediction id
    pub fn single(model_id: impl Into<String>, input: RecordInput) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: None,
            data: LogData::Single(input),
        }
    }

    /// Request for many prediction ids
    pub fn bulk(model_id: impl Into<String>, input: BulkInput) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: None,
            data: LogData::Bulk(input),
        }
    }

    /// Set the model version
    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = Some(version.into());
        self
    }
}

/// Messages ready to be sent
#[derive(Debug, Clone)]
pub enum Payload {
    /// Individual records for the single-record endpoint
    Records(Vec<Record>),
    /// Bulk envelopes for the bulk endpoint
    Bulk(Vec<BulkRecord>),
}

impl Payload {
    /// Number of messages
    pub fn len(&self) -> usize {
        match self {
            Self::Records(r) => r.len(),
            Self::Bulk(b) => b.len(),
        }
    }

    /// Whether there is nothing to send
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize each message
    pub fn encode_all(&self) -> Vec<Vec<u8>> {
        match self {
            Self::Records(r) => r.iter().map(Message::encode_to_vec).collect(),
            Self::Bulk(b) => b.iter().map(Message::encode_to_vec).collect(),
        }
    }
}

/// Client for the record endpoints
#[derive(Debug, Clone)]
pub struct Client {
    sender: HttpSender,
    space_key: String,
    uri: String,
}

impl Client {
    /// Create a client for the default endpoint
    pub fn new(api_key: impl AsRef<str>, space_key: impl Into<String>) -> Result<Self> {
        let space_key = space_key.into();
        Ok(Self {
            sender: HttpSender::new(api_key.as_ref(), &space_key)?,
            space_key,
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

        let mut client = Self::new(api_key, space_key)?
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

    /// Ask the server to ingest before answering
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

    fn single_uri(&self) -> String {
        format!("{}/log", self.uri)
    }

    fn bulk_uri(&self) -> String {
        format!("{}/bulk", self.uri)
    }

    /// Build the messages for a request and pick the endpoint, without sending
    pub fn handle_log(&self, request: &LogRequest) -> Result<(Payload, String)> {
        if request.model_id.trim().is_empty() {
            return Err(ArizeError::invalid_argument("model_id must be a non-empty string"));
        }
        if request.model_version.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ArizeError::invalid_argument(
                "model_version must be a non-empty string when provided",
            ));
        }

        let ctx = RecordContext {
            space_key: self.space_key.clone(),
            model_id: request.model_id.clone(),
            model_version: request.model_version.clone(),
        };

        match request.data {
            LogData::Single(ref input) => {
                let records = records::build_record(&ctx, input, true)?;
                Ok((Payload::Records(records), self.single_uri()))
            }
            LogData::Bulk(ref input) => {
                let bulk = records::build_bulk_records(&ctx, input)?;
                Ok((Payload::Bulk(bulk), self.bulk_uri()))
            }
        }
    }

    /// Build and send a request; one message per task, responses in order
    pub async fn log(&self, request: &LogRequest) -> Result<Vec<ApiResponse>> {
        let (payload, uri) = self.handle_log(request)?;
        debug!(messages = payload.len(), uri = %uri, "logging records");

        let mut handles = Vec::new();
        for body in payload.encode_all() {
            let sender = self.sender.clone();
            let uri = uri.clone();
            handles.push(tokio::spawn(async move {
                sender
                    .post_bytes(&uri, body, "application/x-protobuf", &[])
                    .await
            }));
        }

        let mut responses = Vec::with_capacity(handles.len());
        for handle in handles {
            responses.push(handle.await.map_err(|e| ArizeError::Other(e.to_string()))??);
        }

        let accepted = responses.iter().filter(|r| r.is_success()).count();
        info!(accepted, total = responses.len(), "records sent");
        Ok(responses)
    }

    /// Log a prediction for one id
    pub async fn log_prediction(
        &self,
        model_id: &str,
        model_version: Option<&str>,
        input: RecordInput,
    ) -> Result<Vec<ApiResponse>> {
        if input.prediction_label.is_none() {
            return Err(ArizeError::invalid_argument("prediction label is required"));
        }
        let mut request = LogRequest::single(model_id, input);
        request.model_version = model_version.map(str::to_string);
        self.log(&request).await
    }

    /// Log an actual for a previously logged prediction id
    pub async fn log_actual(
        &self,
        model_id: &str,
        prediction_id: &str,
        label: impl Into<Label>,
    ) -> Result<Vec<ApiResponse>> {
        let input = RecordInput::new(prediction_id).actual(label);
        self.log(&LogRequest::single(model_id, input)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn setup_client() -> Client {
        Client::new("API_KEY", "test_space").unwrap()
    }

    fn features(n: usize) -> Vec<(String, Vec<Value>)> {
        vec![
            ("mpg".into(), (0..n).map(|i| Value::Double(i as f64 * 1.5)).collect()),
            ("origin".into(), (0..n).map(|_| Value::Str("usa".into())).collect()),
        ]
    }

    fn bulk(n: usize) -> BulkInput {
        BulkInput {
            prediction_ids: (0..n).map(|i| format!("id-{}", i)).collect(),
            prediction_labels: Some((0..n).map(|i| Label::Numeric(i as f64)).collect()),
            features: Some(features(n)),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_initialization() {
        assert!(matches!(Client::new("", "space"), Err(ArizeError::Auth(_))));
        assert!(matches!(Client::new("key", ""), Err(ArizeError::Auth(_))));
        assert!(Client::new("key", "space").is_ok());
    }

    #[test]
    fn test_handle_log_single_actual() {
        let client = setup_client();
        let request = LogRequest::single("model_v0", RecordInput::new("prediction_0").actual(true));
        let (payload, uri) = client.handle_log(&request).unwrap();
        match payload {
            Payload::Records(records) => {
                assert_eq!(records.len(), 1);
                assert!(records[0].actual().is_some());
            }
            Payload::Bulk(_) => panic!("expected single records"),
        }
        assert_eq!(uri, "https://api.arize.com/v1/log");
    }

    #[test]
    fn test_handle_log_single_prediction_no_features() {
        let client = setup_client();
        let request = LogRequest::single("model_v0", RecordInput::new("prediction_0").prediction(true));
        let (payload, _) = client.handle_log(&request).unwrap();
        let Payload::Records(records) = payload else {
            panic!("expected single records");
        };
        assert!(records[0].prediction().unwrap().features.is_empty());
    }

    #[test]
    fn test_handle_log_bulk() {
        let client = setup_client();
        let (payload, uri) = client.handle_log(&LogRequest::bulk("model_v0", bulk(30))).unwrap();
        assert_eq!(uri, "https://api.arize.com/v1/bulk");
        let Payload::Bulk(bulk) = payload else {
            panic!("expected bulk records");
        };
        assert!(!bulk.is_empty());
        for b in &bulk {
            for r in &b.records {
                assert!(r.space_key.is_empty());
                assert!(r.model_id.is_empty());
                assert!(!r.prediction().unwrap().features.is_empty());
            }
        }
    }

    #[test]
    fn test_handle_log_invalid_model() {
        let client = setup_client();
        let request = LogRequest::single("", RecordInput::new("p").prediction(true));
        assert!(matches!(
            client.handle_log(&request),
            Err(ArizeError::InvalidArgument(_))
        ));

        let request = LogRequest::single("m", RecordInput::new("p").prediction(true))
            .with_model_version("");
        assert!(client.handle_log(&request).is_err());
    }

    #[test]
    fn test_custom_uri() {
        let client = setup_client().with_uri("http://localhost:8080/v1/");
        let request = LogRequest::single("m", RecordInput::new("p").prediction(1.0));
        let (_, uri) = client.handle_log(&request).unwrap();
        assert_eq!(uri, "http://localhost:8080/v1/log");
    }

    #[tokio::test]
    async fn test_log_bulk_sends_every_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/bulk"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = setup_client().with_uri(format!("{}/v1", server.uri()));
        let request = LogRequest::bulk("model_v0", bulk(2_000)).with_model_version("1.0");
        let (payload, _) = client.handle_log(&request).unwrap();

        let responses = client.log(&request).await.unwrap();
        assert_eq!(responses.len(), payload.len());
        assert!(responses.iter().all(ApiResponse::is_success));

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), payload.len());
        let decoded = BulkRecord::decode(received[0].body.as_slice()).unwrap();
        assert_eq!(decoded.model_id, "model_v0");
        assert_eq!(decoded.model_version, "1.0");
    }

    #[tokio::test]
    async fn test_log_actual() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/log"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_client().with_uri(format!("{}/v1", server.uri()));
        let responses = client.log_actual("model_v0", "prediction_0", "fraud").await.unwrap();
        assert_eq!(responses.len(), 1);

        let received = server.received_requests().await.unwrap();
        let record = Record::decode(received[0].body.as_slice()).unwrap();
        assert_eq!(record.prediction_id, "prediction_0");
        assert_eq!(record.space_key, "test_space");
        assert!(record.actual().is_some());
    }

    #[tokio::test]
    async fn test_from_config_sends_sync() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/log"))
            .and(header("sync", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.client.api_key = Some("API_KEY".into());
        config.client.space_key = Some("test_space".into());
        config.client.uri = Some(format!("{}/v1", server.uri()));
        config.network.sync = true;

        let client = Client::from_config(&config).unwrap();
        assert_eq!(client.headers()["sync"], "1");
        let responses = client.log_actual("model_v0", "prediction_0", 1.0).await.unwrap();
        assert!(responses[0].is_success());
    }

    #[test]
    fn test_with_sync() {
        let client = setup_client();
        assert_eq!(client.headers()["sync"], "0");
        assert_eq!(client.with_sync(true).headers()["sync"], "1");
    }
}
