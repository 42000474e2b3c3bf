//! Data models for logged inferences

mod model_type;
mod schema;
mod value;

pub use model_type::*;
pub use schema::*;
pub use value::*;
