//! survey.response.v1 schema
//!
//! This module defines the JSON boundary for submitted surveys: the envelope
//! itself plus the adapter that reads single, array, and NDJSON payloads.

mod adapter;
mod response;

pub use adapter::*;
pub use response::*;
