//! HTTP transport shared by the record and dataframe clients

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::constants::RESERVED_HEADERS;
use crate::error::{ArizeError, Result};

/// Language reported in the `sdk-language` header
pub const SDK_LANGUAGE: &str = "rust";

/// Toolchain version reported in the `language-version` header
pub fn language_version() -> &'static str {
    env!("CARGO_PKG_RUST_VERSION")
}

/// Outcome of a request the server answered
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
    /// Link to the ingested data in the Arize app, when the server sent one
    pub ingestion_url: Option<String>,
}

impl ApiResponse {
    /// Whether the upload was accepted
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Deserialize)]
struct IngestionResponse {
    #[serde(rename = "realTimeIngestionUri")]
    real_time_ingestion_uri: String,
}

/// Rebuild the app URL of an ingestion response.
///
/// The server answers with `.../organizations/<org>/spaces/<space>/.../<model>`;
/// the app expects the organization and space as base64 encoded global ids.
pub fn reconstruct_url(body: &str) -> Result<String> {
    let resp: IngestionResponse = serde_json::from_str(body)?;
    let parts: Vec<&str> = resp.real_time_ingestion_uri.split('/').collect();
    if parts.len() < 8 {
        return Err(ArizeError::invalid_value(format!(
            "unexpected ingestion uri: {}",
            resp.real_time_ingestion_uri
        )));
    }

    let encoded_org = BASE64.encode(format!("AccountOrganization:{}", parts[4]));
    let encoded_space = BASE64.encode(format!("Space:{}", parts[6]));
    Ok(format!(
        "https://{}/organizations/{}/spaces/{}/models/modelName/{}",
        parts[2],
        encoded_org,
        encoded_space,
        parts[parts.len() - 1]
    ))
}

/// Default header set for an authenticated client
pub fn default_headers(api_key: &str, space_key: &str) -> BTreeMap<String, String> {
    [
        ("authorization", api_key),
        ("space", space_key),
        ("sdk-language", SDK_LANGUAGE),
        ("language-version", language_version()),
        ("sdk-version", crate::VERSION),
        // Asynchronous ingestion unless a call asks otherwise
        ("sync", "0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Value of the `sync` header
pub fn sync_header(sync: bool) -> &'static str {
    if sync {
        "1"
    } else {
        "0"
    }
}

/// Shared HTTP plumbing: headers, timeouts and response handling
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    headers: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpSender {
    /// Create a sender authenticated with the given keys
    pub fn new(api_key: &str, space_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ArizeError::Auth("api_key is required".into()));
        }
        if space_key.trim().is_empty() {
            return Err(ArizeError::Auth("space_key is required".into()));
        }

        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::NAME, crate::VERSION))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            headers: default_headers(api_key, space_key),
            timeout: None,
        })
    }

    /// Replace the underlying client (proxies, TLS settings)
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Apply a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Default value of the `sync` header
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.headers.insert("sync".to_string(), sync_header(sync).to_string());
        self
    }

    /// Add caller headers; reserved names are rejected
    pub fn with_additional_headers(mut self, extra: BTreeMap<String, String>) -> Result<Self> {
        let mut conflicting: Vec<&str> = extra
            .keys()
            .filter(|k| RESERVED_HEADERS.contains(&k.to_lowercase().as_str()))
            .map(String::as_str)
            .collect();
        if !conflicting.is_empty() {
            conflicting.sort_unstable();
            return Err(ArizeError::InvalidHeaders(conflicting.join(", ")));
        }
        self.headers.extend(extra);
        Ok(self)
    }

    /// Current header set
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// POST a body with the client headers plus `extra`, which replaces
    /// client headers of the same name
    pub async fn post_bytes(
        &self,
        uri: &str,
        body: Vec<u8>,
        content_type: &str,
        extra: &[(&str, String)],
    ) -> Result<ApiResponse> {
        let mut headers = self.headers.clone();
        for (k, v) in extra {
            headers.insert(k.to_string(), v.clone());
        }

        let mut request = self
            .client
            .post(uri)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        for (k, v) in headers.iter() {
            request = request.header(k.as_str(), v.as_str());
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        debug!(uri, "sending request");
        let resp = request
            .send()
            .await
            .map_err(|e| ArizeError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(Self::handle_response(status, body))
    }

    /// POST the contents of a file
    pub async fn post_file(
        &self,
        uri: &str,
        path: &Path,
        extra: &[(&str, String)],
    ) -> Result<ApiResponse> {
        if !path.exists() {
            return Err(ArizeError::file_not_found(path));
        }
        let body = tokio::fs::read(path).await?;
        debug!(uri, bytes = body.len(), path = %path.display(), "uploading file");
        self.post_bytes(uri, body, "application/octet-stream", extra).await
    }

    fn handle_response(status: u16, body: String) -> ApiResponse {
        let ingestion_url = if status == 200 {
            reconstruct_url(&body).ok()
        } else {
            None
        };
        let resp = ApiResponse {
            status,
            body,
            ingestion_url,
        };

        if !resp.is_success() {
            error!(status = resp.status, body = %resp.body, "Arize rejected the request");
        } else if let Some(ref url) = resp.ingestion_url {
            info!("Success! Check out your data at {}", url);
        }
        resp
    }
}
