//! Arrow type predicates and per-row accessors used by validation

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Date64Type, TimeUnit};

use crate::error::Result;

/// Plain string column
pub fn is_string(dt: &DataType) -> bool {
    matches!(dt, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

/// Categorical column with string values
pub fn is_string_dictionary(dt: &DataType) -> bool {
    matches!(dt, DataType::Dictionary(_, values) if is_string(values))
}

/// Integer or float column
pub fn is_numeric(dt: &DataType) -> bool {
    dt.is_integer() || dt.is_floating()
}

/// Accepted scalar feature/tag types
pub fn is_scalar_feature(dt: &DataType) -> bool {
    is_string(dt)
        || is_string_dictionary(dt)
        || is_numeric(dt)
        || matches!(dt, DataType::Boolean | DataType::Null)
}

/// Accepted categorical label types
pub fn is_categorical_label(dt: &DataType) -> bool {
    is_string(dt) || is_string_dictionary(dt) || is_numeric(dt) || *dt == DataType::Boolean
}

/// Accepted timestamp column types
pub fn is_timestamp_like(dt: &DataType) -> bool {
    is_numeric(dt) || matches!(dt, DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64)
}

/// Element type of a list-like column
pub fn list_item(dt: &DataType) -> Option<&DataType> {
    match dt {
        DataType::List(f) | DataType::LargeList(f) | DataType::FixedSizeList(f, _) => {
            Some(f.data_type())
        }
        _ => None,
    }
}

/// List column whose elements satisfy `pred`
pub fn is_list_of(dt: &DataType, pred: impl Fn(&DataType) -> bool) -> bool {
    list_item(dt).is_some_and(|item| pred(item) || *item == DataType::Null)
}

/// Compact type name for error messages
pub fn type_name(dt: &DataType) -> String {
    match list_item(dt) {
        Some(item) => format!("list<{}>", type_name(item)),
        None => match dt {
            DataType::Dictionary(_, values) => format!("category<{}>", values),
            other => other.to_string().to_lowercase(),
        },
    }
}

/// Inner array of row `i` of a list-like column, `None` for null rows or
/// non-list columns
pub fn list_value(array: &dyn Array, i: usize) -> Option<ArrayRef> {
    if array.is_null(i) {
        return None;
    }
    if let Some(list) = array.as_list_opt::<i32>() {
        return Some(list.value(i));
    }
    if let Some(list) = array.as_list_opt::<i64>() {
        return Some(list.value(i));
    }
    array.as_fixed_size_list_opt().map(|list| list.value(i))
}

/// Length of every row of a list-like column
pub fn list_lengths(array: &dyn Array) -> Vec<Option<usize>> {
    (0..array.len())
        .map(|i| list_value(array, i).map(|inner| inner.len()))
        .collect()
}

/// Any string-like column as owned optional strings
pub fn string_values(array: &dyn Array) -> Result<Vec<Option<String>>> {
    let utf8 = cast(array, &DataType::Utf8)?;
    Ok(utf8
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Any numeric column as `f64`, nulls preserved
pub fn float_values(array: &dyn Array) -> Result<Vec<Option<f64>>> {
    let floats = cast(array, &DataType::Float64)?;
    Ok(floats
        .as_primitive::<arrow::datatypes::Float64Type>()
        .iter()
        .collect())
}

/// Whether a column has nulls, or NaNs for float columns
pub fn has_missing(array: &dyn Array) -> Result<bool> {
    if array.null_count() > 0 {
        return Ok(true);
    }
    if array.data_type().is_floating() {
        return Ok(float_values(array)?.iter().flatten().any(|v| v.is_nan()));
    }
    Ok(false)
}

/// Timestamp-like column in Unix seconds
pub fn timestamp_seconds(array: &dyn Array) -> Result<Vec<Option<i64>>> {
    let secs = match array.data_type() {
        DataType::Timestamp(unit, _) => {
            let divisor = match unit {
                TimeUnit::Second => 1,
                TimeUnit::Millisecond => 1_000,
                TimeUnit::Microsecond => 1_000_000,
                TimeUnit::Nanosecond => 1_000_000_000,
            };
            let raw = cast(array, &DataType::Int64)?;
            raw.as_primitive::<arrow::datatypes::Int64Type>()
                .iter()
                .map(|v| v.map(|v| v.div_euclid(divisor)))
                .collect()
        }
        DataType::Date32 => array
            .as_primitive::<Date32Type>()
            .iter()
            .map(|v| v.map(|days| days as i64 * 86_400))
            .collect(),
        DataType::Date64 => array
            .as_primitive::<Date64Type>()
            .iter()
            .map(|v| v.map(|ms| ms.div_euclid(1_000)))
            .collect(),
        dt if dt.is_floating() => float_values(array)?
            .into_iter()
            .map(|v| v.filter(|f| !f.is_nan()).map(|f| f.floor() as i64))
            .collect(),
        _ => {
            let raw = cast(array, &DataType::Int64)?;
            raw.as_primitive::<arrow::datatypes::Int64Type>()
                .iter()
                .collect()
        }
    };
    Ok(secs)
}
