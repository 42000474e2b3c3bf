//! Record API: log single inferences or columnar batches as protobuf records

mod client;

pub use client::*;
