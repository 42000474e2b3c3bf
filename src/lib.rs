//! Arize - log machine learning inferences to the Arize observability platform
//!
//! Two ways of getting data to the platform:
//!
//! - **Record API**: log one prediction id at a time, or columns of many
//!   ids at once, as protobuf records ([`api::Client`])
//! - **DataFrame API**: validate an Arrow `RecordBatch` against a column
//!   [`Schema`] and upload it as an Arrow IPC stream
//!   ([`dataframe::DataFrameClient`])
//!
//! # Quick Start
//!
//! ```no_run
//! use arize::api::Client;
//! use arize::records::RecordInput;
//!
//! #[tokio::main]
//! async fn main() -> arize::Result<()> {
//!     let client = Client::new("API_KEY", "SPACE_KEY")?;
//!     let input = RecordInput::new("prediction-0")
//!         .prediction("fraud")
//!         .feature("amount", 99.5);
//!     client.log_prediction("fraud-model", Some("1.0"), input).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dataframe;
pub mod error;
pub mod http;
pub mod models;
pub mod proto;
pub mod records;

// Re-export commonly used types
pub use error::{ArizeError, Result};
pub use models::{
    Embedding, EmbeddingColumnNames, Environment, Label, ModelType, ObjectDetectionColumnNames,
    Schema, Value,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
