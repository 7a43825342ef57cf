//! Tourcast Survey - Answer codec for the Tourcast travel recommendation service
//!
//! Tourcast Survey turns submitted travel-preference surveys into the
//! prediction-ready feature records the regional recommendation models consume,
//! and turns model responses back into ranked places: schema validation →
//! canonicalization → table-driven encoding → region routing, with a matching
//! decoder for the return path.
//!
//! ## Modules
//!
//! - **Encode Pipeline**: Validate survey responses, encode answers into model features
//! - **Decode Pipeline**: Rank prediction responses and restore human-readable labels

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod tables;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use decoder::RecommendationDecoder;
pub use encoder::{FeatureEncoder, UnknownLabelPolicy, FEATURE_VERSION};
pub use error::CodecError;
pub use pipeline::{predictions_to_places, response_to_features, SurveyProcessor};
pub use tables::EncoderTables;

// Schema exports
pub use schema::{SurveyResponse, SurveyResponseAdapter, SCHEMA_ARITY, SCHEMA_VERSION};

/// Tourcast version embedded in all feature envelopes
pub const TOURCAST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for feature envelopes
pub const PRODUCER_NAME: &str = "tourcast-survey";
