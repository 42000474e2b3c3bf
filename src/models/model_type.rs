//! Model type and environment enumerations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ArizeError, Result};

/// Kind of model whose inferences are logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Regression / numeric output
    Numeric,
    /// Classification with a category and an optional score
    ScoreCategorical,
    /// Computer vision object detection
    ObjectDetection,
    /// Generative large language model
    GenerativeLlm,
}

impl ModelType {
    /// Wire name sent to the platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::ScoreCategorical => "score_categorical",
            Self::ObjectDetection => "object_detection",
            Self::GenerativeLlm => "generative_llm",
        }
    }

    /// Whether prediction/actual score columns are meaningful for this type
    pub fn accepts_scores(&self) -> bool {
        matches!(self, Self::ScoreCategorical | Self::GenerativeLlm)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ArizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "numeric" | "regression" => Ok(Self::Numeric),
            "score_categorical" | "binary_classification" | "classification" => {
                Ok(Self::ScoreCategorical)
            }
            "object_detection" => Ok(Self::ObjectDetection),
            "generative_llm" | "llm" => Ok(Self::GenerativeLlm),
            _ => Err(ArizeError::invalid_argument(format!(
                "Unknown model type: {}",
                s
            ))),
        }
    }
}

/// Environment the logged data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Live traffic
    Production,
    /// Training set
    Training,
    /// Validation set, always tagged with a batch id
    Validation,
}

impl Environment {
    /// Wire name sent to the platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Training => "training",
            Self::Validation => "validation",
        }
    }

    /// Training and validation data
    pub fn is_preproduction(&self) -> bool {
        matches!(self, Self::Training | Self::Validation)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ArizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "training" | "train" => Ok(Self::Training),
            "validation" => Ok(Self::Validation),
            _ => Err(ArizeError::invalid_argument(format!(
                "Unknown environment: {}",
                s
            ))),
        }
    }
}
