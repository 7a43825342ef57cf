//! Answer normalization
//!
//! This module turns a validated survey response into canonical answers:
//! - Position slots mapped to named fields
//! - Labels trimmed, blanks collapsed to unanswered
//! - The style position classified into its tagged shape

use crate::error::CodecError;
use crate::schema::{AnswerValue, SurveyResponse};
use crate::types::{AnswerField, CanonicalAnswers, StyleInput};

/// Normalizer for converting boundary responses to canonical answers
pub struct AnswerNormalizer;

impl AnswerNormalizer {
    /// Normalize a response into canonical answers
    ///
    /// The envelope is validated first; a missing tail is legal and stays
    /// `None` in the output. Unusable JSON shapes at a position normalize to
    /// unanswered rather than failing.
    pub fn canonicalize(response: &SurveyResponse) -> Result<CanonicalAnswers, CodecError> {
        response
            .validate()
            .map_err(|e| CodecError::InvalidEnvelope(e.to_string()))?;

        let mut answers = CanonicalAnswers::default();

        for (position, value) in response.answers.iter().enumerate() {
            let Some(field) = AnswerField::from_position(position) else {
                break;
            };

            match field {
                AnswerField::TravelStyle => {
                    answers.travel_styles = classify_style(value);
                }
                _ => {
                    let label = scalar_label(value);
                    match field {
                        AnswerField::Residence => answers.residence = label,
                        AnswerField::Gender => answers.gender = label,
                        AnswerField::AgeBracket => answers.age_bracket = label,
                        AnswerField::Companions => answers.companions = label,
                        AnswerField::TripDuration => answers.trip_duration = label,
                        AnswerField::Transport => answers.transport = label,
                        AnswerField::Budget => answers.budget = label,
                        AnswerField::TravelStyle => unreachable!(),
                    }
                }
            }
        }

        Ok(answers)
    }
}

/// Scalar label at a non-style position
///
/// Lists collapse to their first element; blank strings and non-string
/// shapes are unanswered.
fn scalar_label(value: &AnswerValue) -> Option<String> {
    let text = match value {
        AnswerValue::Text(text) => text.as_str(),
        AnswerValue::Many(labels) => labels.first().map(String::as_str).unwrap_or(""),
        AnswerValue::Other(_) => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Shape classification for the style position
fn classify_style(value: &AnswerValue) -> Option<StyleInput> {
    match value {
        AnswerValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.contains(';') {
                Some(StyleInput::Joined(trimmed.to_string()))
            } else {
                Some(StyleInput::Single(trimmed.to_string()))
            }
        }
        AnswerValue::Many(labels) => Some(StyleInput::List(labels.clone())),
        AnswerValue::Other(_) => None,
    }
}
