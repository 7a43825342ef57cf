//! Core types for the Tourcast Survey codec
//!
//! This module defines the data structures that flow through the encoder and
//! decoder: canonical survey answers, the fixed feature record sent to the
//! prediction tier, the feature envelope handed to storage/audit collaborators,
//! and the prediction response entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Regional prediction model selector
///
/// The prediction tier hosts one trained model per region group; the
/// traveler's residence region picks the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRegion {
    Capital,
    West,
    East,
    Jeju,
}

impl ModelRegion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRegion::Capital => "capital",
            ModelRegion::West => "west",
            ModelRegion::East => "east",
            ModelRegion::Jeju => "jeju",
        }
    }
}

/// Survey answer positions, in submission order
///
/// Position strictly determines meaning; the variants are listed in the order
/// the answers arrive and must stay in lockstep with every lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerField {
    Residence,
    Gender,
    AgeBracket,
    Companions,
    TravelStyle,
    TripDuration,
    Transport,
    Budget,
}

impl AnswerField {
    /// All fields in positional order
    pub const ALL: [AnswerField; 8] = [
        AnswerField::Residence,
        AnswerField::Gender,
        AnswerField::AgeBracket,
        AnswerField::Companions,
        AnswerField::TravelStyle,
        AnswerField::TripDuration,
        AnswerField::Transport,
        AnswerField::Budget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerField::Residence => "residence",
            AnswerField::Gender => "gender",
            AnswerField::AgeBracket => "age_bracket",
            AnswerField::Companions => "companions",
            AnswerField::TravelStyle => "travel_style",
            AnswerField::TripDuration => "trip_duration",
            AnswerField::Transport => "transport",
            AnswerField::Budget => "budget",
        }
    }

    /// Zero-based answer position of this field
    pub fn position(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    /// Field at a zero-based answer position
    pub fn from_position(position: usize) -> Option<AnswerField> {
        Self::ALL.get(position).copied()
    }
}

impl fmt::Display for AnswerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gender code on the wire ("남" / "여")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenderCode {
    #[serde(rename = "남")]
    Male,
    #[serde(rename = "여")]
    Female,
}

impl GenderCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderCode::Male => "남",
            GenderCode::Female => "여",
        }
    }
}

/// Travel-style answer as it arrived at the boundary
///
/// The style position accepts three shapes: a single label, a
/// semicolon-joined string of labels, or a list of labels. The shape is
/// classified once at the boundary and normalized to an ordered token
/// sequence before any lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleInput {
    Single(String),
    Joined(String),
    List(Vec<String>),
}

impl StyleInput {
    /// Ordered token sequence: trimmed, blanks dropped, input order preserved
    pub fn tokens(&self) -> Vec<String> {
        match self {
            StyleInput::Single(label) => {
                let trimmed = label.trim();
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![trimmed.to_string()]
                }
            }
            StyleInput::Joined(joined) => joined
                .split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
                .collect(),
            StyleInput::List(labels) => labels
                .iter()
                .map(|l| l.trim())
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Canonical survey answers after boundary normalization
///
/// One optional slot per position; `None` means unanswered (missing, blank,
/// or an unusable JSON shape). All labels arrive trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalAnswers {
    pub residence: Option<String>,
    pub gender: Option<String>,
    pub age_bracket: Option<String>,
    pub companions: Option<String>,
    pub travel_styles: Option<StyleInput>,
    pub trip_duration: Option<String>,
    pub transport: Option<String>,
    pub budget: Option<String>,
}

/// The fixed feature record consumed by the prediction service
///
/// Field names are part of the trained feature space and must be reproduced
/// byte-for-byte on the wire. `Date` is a historical name for the
/// trip-duration code and is preserved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "LOTNO_ADDR")]
    pub residence: String,
    #[serde(rename = "GENDER")]
    pub gender: GenderCode,
    #[serde(rename = "AGE_GRP")]
    pub age_group: u8,
    #[serde(rename = "TRAVEL_COMPANIONS_NUM")]
    pub companions: u8,
    /// Semicolon-joined style codes, e.g. "1;11"
    #[serde(rename = "TRAVEL_PURPOSE")]
    pub travel_styles: String,
    #[serde(rename = "Date")]
    pub trip_duration: u8,
    #[serde(rename = "MVMN_SE_NM")]
    pub transport: u8,
    #[serde(rename = "PAYMENT_AMT_WON")]
    pub budget: u8,
}

/// Why a field received its default code instead of a looked-up one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    Unanswered,
    UnknownLabel,
}

/// One default substitution, recorded in the quality block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackFlag {
    pub field: AnswerField,
    pub reason: FallbackReason,
}

/// Feature envelope producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Feature envelope provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureProvenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    pub submitted_at_utc: String,
    pub computed_at_utc: String,
    /// Regional model the record routes to; null when the residence region
    /// is not in the routing table.
    pub model_region: Option<String>,
}

/// Feature envelope quality metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureQuality {
    /// Recognized positions / schema arity (0-1)
    pub coverage: f64,
    /// Every default substitution that happened during encoding
    pub fallbacks: Vec<FallbackFlag>,
}

/// Complete survey.features.v1 envelope
///
/// The bare [`FeatureRecord`] is the prediction-service wire contract;
/// storage and audit collaborators receive it wrapped in this envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEnvelope {
    pub feature_version: String,
    pub producer: FeatureProducer,
    pub provenance: FeatureProvenance,
    pub quality: FeatureQuality,
    pub features: FeatureRecord,
}

/// A recommended place as returned by the prediction service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecommendation {
    pub place_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub score: f64,
    /// Place category code, nominally 1-8
    #[serde(rename = "type")]
    pub type_code: i64,
}

/// One entry of a labeled ranked-list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPrediction {
    pub label: String,
    pub probability: f64,
}

/// Prediction response, in either of the two shapes the service returns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    /// `{"top_predictions": [{label, probability}, ...]}`
    Ranked {
        top_predictions: Vec<RankedPrediction>,
    },
    /// Bare array of place recommendations
    Places(Vec<PlaceRecommendation>),
}

/// A decoded, display-ready recommendation entry
///
/// Ranked-label entries carry no address or type code and decode to
/// name + score only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedPlace {
    pub place_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<i64>,
    /// Display category for the type code; "기타" for codes outside the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
