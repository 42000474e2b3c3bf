//! Conversions from model values to protobuf messages

use std::collections::HashMap;

use prost_types::Timestamp;

use crate::constants::{
    MAX_FUTURE_YEARS_FROM_CURRENT_TIME, MAX_PAST_YEARS_FROM_CURRENT_TIME, SECONDS_PER_YEAR,
};
use crate::error::Result;
use crate::models::{Embedding, Label, Value};
use crate::proto;

/// Convert a feature or tag value. Missing values yield `None`.
pub fn get_value_object(name: &str, value: &Value) -> Result<Option<proto::Value>> {
    use proto::value::Data;

    let data = match value {
        _ if value.is_null() => return Ok(None),
        Value::Str(s) => Data::String(s.clone()),
        Value::Bool(_) => Data::String(value.to_string()),
        Value::Int(i) => Data::Int(*i),
        Value::Double(d) => Data::Double(*d),
        Value::Embedding(e) => {
            e.validate(name)?;
            Data::Embedding(get_value_embedding(e))
        }
        Value::Null => return Ok(None),
    };
    Ok(Some(proto::Value { data: Some(data) }))
}

/// Convert an embedding; raw text becomes a one-token array
pub fn get_value_embedding(val: &Embedding) -> proto::Embedding {
    proto::Embedding {
        vector: val.vector.clone(),
        raw_data: val.data.as_ref().map(|data| proto::embedding::RawData {
            token_array: Some(proto::embedding::TokenArray {
                tokens: data.tokens(),
            }),
        }),
        link_to_data: val.link_to_data.clone(),
    }
}

/// Convert a map of values, dropping missing ones
pub fn convert_dictionary<'a, I>(values: I) -> Result<HashMap<String, proto::Value>>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut converted = HashMap::new();
    for (k, v) in values {
        if let Some(val) = get_value_object(k, v)? {
            converted.insert(k.clone(), val);
        }
    }
    Ok(converted)
}

/// Wire form of a label
pub fn get_label(label: &Label) -> proto::Label {
    use proto::label::Data;

    let data = match label {
        Label::Binary(b) => Data::Binary(*b),
        Label::Categorical(c) => Data::Categorical(c.clone()),
        Label::Numeric(n) => Data::Numeric(*n),
        Label::ScoreCategorical { category, score } => {
            Data::ScoreCategorical(proto::ScoreCategorical {
                category: category.clone(),
                score: *score,
            })
        }
    };
    proto::Label { data: Some(data) }
}

/// Unix seconds to a protobuf timestamp
pub fn get_timestamp(time_overwrite: Option<i64>) -> Option<Timestamp> {
    time_overwrite.map(|seconds| Timestamp { seconds, nanos: 0 })
}

/// Current time as a protobuf timestamp
pub fn now_timestamp() -> Timestamp {
    let now = chrono::Utc::now();
    Timestamp {
        seconds: now.timestamp(),
        nanos: now.timestamp_subsec_nanos() as i32,
    }
}

/// Whether `ts` lies within the accepted window around `now` (both in seconds)
pub fn is_timestamp_in_range(now: i64, ts: i64) -> bool {
    let max_time = now + MAX_FUTURE_YEARS_FROM_CURRENT_TIME * SECONDS_PER_YEAR;
    let min_time = now - MAX_PAST_YEARS_FROM_CURRENT_TIME * SECONDS_PER_YEAR;
    (min_time..=max_time).contains(&ts)
}
