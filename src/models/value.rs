//! Label, feature value and embedding representation for the record API

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    MAX_EMBEDDING_DIMENSIONALITY, MAX_RAW_DATA_CHARACTERS, MIN_EMBEDDING_DIMENSIONALITY,
};
use crate::error::{ArizeError, Result};

/// A prediction or actual label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Label {
    /// Two-class outcome
    Binary(bool),
    /// Class name
    Categorical(String),
    /// Regression output
    Numeric(f64),
    /// Class name with an optional probability
    ScoreCategorical {
        /// Predicted or observed class
        category: String,
        /// Model score for the class
        score: Option<f64>,
    },
}

impl From<bool> for Label {
    fn from(v: bool) -> Self {
        Self::Binary(v)
    }
}

impl From<&str> for Label {
    fn from(v: &str) -> Self {
        Self::Categorical(v.to_string())
    }
}

impl From<String> for Label {
    fn from(v: String) -> Self {
        Self::Categorical(v)
    }
}

impl From<f64> for Label {
    fn from(v: f64) -> Self {
        Self::Numeric(v)
    }
}

impl From<i64> for Label {
    fn from(v: i64) -> Self {
        Self::Numeric(v as f64)
    }
}

impl From<(&str, f64)> for Label {
    fn from((category, score): (&str, f64)) -> Self {
        Self::ScoreCategorical {
            category: category.to_string(),
            score: Some(score),
        }
    }
}

/// Raw data an embedding vector was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingData {
    /// A single piece of text
    Text(String),
    /// Pre-tokenized text
    Tokens(Vec<String>),
}

impl EmbeddingData {
    /// Token view of the raw data; text becomes a single token
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::Text(text) => vec![text.clone()],
            Self::Tokens(tokens) => tokens.clone(),
        }
    }

    /// Total number of characters across all tokens
    pub fn char_count(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Tokens(tokens) => tokens.iter().map(|t| t.chars().count()).sum(),
        }
    }
}

/// An embedding feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Embedding vector
    pub vector: Vec<f64>,
    /// Raw data behind the vector
    pub data: Option<EmbeddingData>,
    /// Link to the raw data (image URL, document path)
    pub link_to_data: Option<String>,
}

impl Embedding {
    /// Create an embedding from its vector alone
    pub fn new(vector: Vec<f64>) -> Self {
        Self {
            vector,
            data: None,
            link_to_data: None,
        }
    }

    /// Attach raw data
    pub fn with_data(mut self, data: EmbeddingData) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a link to the raw data
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link_to_data = Some(link.into());
        self
    }

    /// Check dimensionality and raw data size
    pub fn validate(&self, name: &str) -> Result<()> {
        let dims = self.vector.len();
        if dims < MIN_EMBEDDING_DIMENSIONALITY {
            return Err(ArizeError::invalid_value(format!(
                "embedding feature '{}' has dimensionality {}, it must be at least {}",
                name, dims, MIN_EMBEDDING_DIMENSIONALITY
            )));
        }
        if dims > MAX_EMBEDDING_DIMENSIONALITY {
            return Err(ArizeError::invalid_value(format!(
                "embedding feature '{}' has dimensionality {}, it must be at most {}",
                name, dims, MAX_EMBEDDING_DIMENSIONALITY
            )));
        }
        if let Some(ref data) = self.data {
            if data.char_count() > MAX_RAW_DATA_CHARACTERS {
                return Err(ArizeError::invalid_value(format!(
                    "embedding feature '{}' raw data exceeds {} characters",
                    name, MAX_RAW_DATA_CHARACTERS
                )));
            }
        }
        Ok(())
    }
}

/// A feature or tag value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// String value
    Str(String),
    /// Boolean, sent as a string
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value; NaN counts as missing
    Double(f64),
    /// Embedding value
    Embedding(Embedding),
    /// Missing value
    Null,
}

impl Value {
    /// Whether the value is treated as missing
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Double(v) => v.is_nan(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{}", s),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(i) => write!(f, "{}", i),
            Self::Double(d) => write!(f, "{}", d),
            Self::Embedding(e) => write!(f, "<embedding dim={}>", e.vector.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<Embedding> for Value {
    fn from(v: Embedding) -> Self {
        Self::Embedding(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}
