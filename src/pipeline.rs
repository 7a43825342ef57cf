//! Pipeline orchestration
//!
//! This module provides the public API for Tourcast Survey.
//! It orchestrates both directions: submitted survey JSON to feature
//! envelopes, and prediction response JSON back to ranked places.

use crate::decoder::RecommendationDecoder;
use crate::encoder::{FeatureEncoder, UnknownLabelPolicy};
use crate::error::CodecError;
use crate::schema::{SurveyResponse, SurveyResponseAdapter};
use crate::tables::EncoderTables;
use crate::types::FeatureEnvelope;

/// Convert one submitted survey envelope to survey.features.v1 JSON.
///
/// Uses the built-in tables and the default unknown-label policy.
///
/// # Arguments
/// * `json` - A survey.response.v1 envelope
///
/// # Returns
/// Pretty-printed survey.features.v1 JSON
///
/// # Example
/// ```ignore
/// let features_json = response_to_features(submitted_json)?;
/// ```
pub fn response_to_features(json: &str) -> Result<String, CodecError> {
    let response = SurveyResponseAdapter::parse(json)?;
    FeatureEncoder::new().encode_to_json(&response)
}

/// Convert a prediction service response to ranked decoded places JSON.
///
/// Accepts either response shape (bare place array or labeled ranked list).
///
/// # Arguments
/// * `json` - The prediction service response body
///
/// # Returns
/// Pretty-printed JSON array of decoded places, score descending
///
/// # Example
/// ```ignore
/// let places_json = predictions_to_places(prediction_body)?;
/// ```
pub fn predictions_to_places(json: &str) -> Result<String, CodecError> {
    let places = RecommendationDecoder::new().decode_json(json)?;
    serde_json::to_string_pretty(&places).map_err(CodecError::JsonError)
}

/// Configured processor for repeated encode/decode calls.
///
/// Use this when the tables, policy, or ranking limit differ from the
/// defaults, or when one configuration should serve many responses.
pub struct SurveyProcessor<'a> {
    encoder: FeatureEncoder<'a>,
    decoder: RecommendationDecoder<'a>,
}

impl Default for SurveyProcessor<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyProcessor<'static> {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self {
            encoder: FeatureEncoder::new(),
            decoder: RecommendationDecoder::new(),
        }
    }
}

impl<'a> SurveyProcessor<'a> {
    /// Create a processor over custom tables
    pub fn with_tables(tables: &'a EncoderTables) -> Self {
        Self {
            encoder: FeatureEncoder::with_tables(tables),
            decoder: RecommendationDecoder::with_tables(tables),
        }
    }

    /// Set the unknown-label policy
    pub fn with_policy(mut self, policy: UnknownLabelPolicy) -> Self {
        self.encoder = self.encoder.with_policy(policy);
        self
    }

    /// Keep only the N best places when decoding predictions
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.decoder = self.decoder.with_top_n(top_n);
        self
    }

    /// Encode a parsed response into a feature envelope
    pub fn encode_response(
        &self,
        response: &SurveyResponse,
    ) -> Result<FeatureEnvelope, CodecError> {
        self.encoder.encode_response(response)
    }

    /// Process one survey envelope JSON into feature envelope JSON
    pub fn process_response(&self, json: &str) -> Result<String, CodecError> {
        let response = SurveyResponseAdapter::parse(json)?;
        self.encoder.encode_to_json(&response)
    }

    /// Process a batch payload (JSON array or NDJSON) into feature envelopes
    ///
    /// Fails on the first response that does not parse, validate, or encode.
    pub fn process_batch(&self, payload: &str) -> Result<Vec<String>, CodecError> {
        let responses = SurveyResponseAdapter::parse_batch(payload)?;

        let mut envelopes = Vec::with_capacity(responses.len());
        for response in &responses {
            envelopes.push(self.encoder.encode_to_json(response)?);
        }

        Ok(envelopes)
    }

    /// Decode a prediction response into ranked places JSON
    pub fn decode_predictions(&self, json: &str) -> Result<String, CodecError> {
        let places = self.decoder.decode_json(json)?;
        serde_json::to_string_pretty(&places).map_err(CodecError::JsonError)
    }
}
