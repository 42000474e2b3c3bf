//! Limits and well-known names shared by the record and dataframe clients

/// Default base URI of the ingestion API
pub const DEFAULT_URI: &str = "https://api.arize.com/v1";

/// Serialized byte budget for a single bulk message
pub const MAX_BYTES_PER_BULK_RECORD: usize = 100_000;

/// How far in the future a prediction timestamp may be
pub const MAX_FUTURE_YEARS_FROM_CURRENT_TIME: i64 = 1;

/// How far in the past a prediction timestamp may be
pub const MAX_PAST_YEARS_FROM_CURRENT_TIME: i64 = 5;

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

/// Shortest accepted embedding vector
pub const MIN_EMBEDDING_DIMENSIONALITY: usize = 2;
/// Longest accepted embedding vector
pub const MAX_EMBEDDING_DIMENSIONALITY: usize = 20_000;
/// Characters of raw data allowed per embedding
pub const MAX_RAW_DATA_CHARACTERS: usize = 2_000_000;
/// Embedding features allowed per schema
pub const MAX_NUMBER_OF_EMBEDDINGS: usize = 30;
/// Characters allowed per tag value
pub const MAX_TAG_LENGTH: usize = 1_000;

/// Column appended for generative models logged without a prediction label
pub const GENERATED_PREDICTION_LABEL_COL: &str = "default_prediction_label";

/// Headers set by the client that callers may not override
pub const RESERVED_HEADERS: [&str; 6] = [
    "authorization",
    "space",
    "sdk-language",
    "language-version",
    "sdk-version",
    "sync",
];

/// Environment variable holding the API key
pub const API_KEY_ENV_VAR: &str = "ARIZE_API_KEY";

/// Environment variable holding the space key
pub const SPACE_KEY_ENV_VAR: &str = "ARIZE_SPACE_KEY";

/// Environment variable overriding the base URI
pub const URI_ENV_VAR: &str = "ARIZE_URI";
