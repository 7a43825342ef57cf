//! survey.response.v1 schema definition
//!
//! The envelope for a submitted travel-preference survey. Answers are
//! position-significant: the element order carries the meaning, and the
//! schema arity is fixed at 8.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "survey.response.v1";

/// Number of answer positions in this schema version
pub const SCHEMA_ARITY: usize = 8;

/// Submission channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Web,
    Mobile,
    Kiosk,
    Import,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Web => "web",
            Channel::Mobile => "mobile",
            Channel::Kiosk => "kiosk",
            Channel::Import => "import",
        }
    }
}

/// One answer position as submitted
///
/// A position holds a string or an array of strings; anything else is
/// carried through untouched and treated as unanswered downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Many(Vec<String>),
    Other(serde_json::Value),
}

/// The main survey.response.v1 envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResponse {
    /// Schema version identifier
    pub schema_version: String,
    /// Unique response identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    /// Submission timestamp (UTC)
    pub submitted_at: DateTime<Utc>,
    /// Where the survey was filled in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// Position-significant answers
    pub answers: Vec<AnswerValue>,
}

impl SurveyResponse {
    /// Create a new response with a fresh UUID
    pub fn new(submitted_at: DateTime<Utc>, answers: Vec<AnswerValue>) -> Self {
        SurveyResponse {
            schema_version: SCHEMA_VERSION.to_string(),
            response_id: Some(uuid::Uuid::new_v4().to_string()),
            submitted_at,
            channel: None,
            answers,
        }
    }

    /// Set the submission channel
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Validate the response envelope
    ///
    /// An answer sequence longer than the schema arity indicates a
    /// mismatched schema version and is rejected; a shorter one is legal
    /// (missing tail positions default downstream).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if self.answers.len() > SCHEMA_ARITY {
            return Err(ValidationError::AnswerCountExceeded {
                arity: SCHEMA_ARITY,
                actual: self.answers.len(),
            });
        }

        Ok(())
    }
}

/// Validation errors for survey responses
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Too many answers: schema arity is {arity}, got {actual}")]
    AnswerCountExceeded { arity: usize, actual: usize },
}
