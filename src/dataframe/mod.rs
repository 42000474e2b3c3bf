//! DataFrame API: log a whole Arrow `RecordBatch` described by a [`Schema`]
//!
//! [`Schema`]: crate::models::Schema

pub mod arrays;
mod logger;
pub mod validation;

pub use logger::*;
