//! Feature encoding
//!
//! This module encodes canonical survey answers into the fixed FeatureRecord
//! the prediction service consumes, and wraps the record in the
//! survey.features.v1 envelope with producer, provenance, and quality blocks.

use crate::error::CodecError;
use crate::normalizer::AnswerNormalizer;
use crate::schema::{SurveyResponse, SCHEMA_ARITY};
use crate::tables::{self, EncoderTables};
use crate::types::{
    AnswerField, CanonicalAnswers, FallbackFlag, FallbackReason, FeatureEnvelope, FeatureProducer,
    FeatureProvenance, FeatureQuality, FeatureRecord, StyleInput,
};
use crate::{PRODUCER_NAME, TOURCAST_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current feature schema version
pub const FEATURE_VERSION: &str = "1.0.0";

/// What to do with an answered label that is not in its lookup table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLabelPolicy {
    /// Substitute the field default and record a fallback flag
    #[default]
    Default,
    /// Fail the encoding with [`CodecError::UnknownLabel`]
    Reject,
}

/// Encoder for producing prediction-ready feature records
pub struct FeatureEncoder<'a> {
    tables: &'a EncoderTables,
    policy: UnknownLabelPolicy,
    instance_id: String,
}

impl Default for FeatureEncoder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureEncoder<'static> {
    /// Create an encoder over the built-in tables with a unique instance ID
    pub fn new() -> Self {
        Self {
            tables: EncoderTables::builtin(),
            policy: UnknownLabelPolicy::default(),
            instance_id: Uuid::new_v4().to_string(),
        }
    }
}

impl<'a> FeatureEncoder<'a> {
    /// Create an encoder over custom tables
    pub fn with_tables(tables: &'a EncoderTables) -> Self {
        Self {
            tables,
            policy: UnknownLabelPolicy::default(),
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Set the unknown-label policy
    pub fn with_policy(mut self, policy: UnknownLabelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set a specific instance ID
    pub fn with_instance_id(mut self, instance_id: String) -> Self {
        self.instance_id = instance_id;
        self
    }

    /// Encode canonical answers into a feature record
    ///
    /// Every record field is populated: unanswered or unrecognized positions
    /// receive their field default, and each substitution is recorded in the
    /// returned quality block. Under [`UnknownLabelPolicy::Reject`] an
    /// answered label outside its table fails the whole encoding instead.
    pub fn encode(
        &self,
        answers: &CanonicalAnswers,
    ) -> Result<(FeatureRecord, FeatureQuality), CodecError> {
        let mut recognized = 0usize;
        let mut fallbacks = Vec::new();

        // Residence is an open set: any answered value is recognized.
        let residence = match &answers.residence {
            Some(label) => {
                recognized += 1;
                label.clone()
            }
            None => {
                fallbacks.push(unanswered(AnswerField::Residence));
                tables::DEFAULT_RESIDENCE.to_string()
            }
        };

        let gender = match answers.gender.as_deref() {
            Some(label) => match self.tables.gender_code(label) {
                Some(code) => {
                    recognized += 1;
                    code
                }
                None => {
                    self.flag_unknown(AnswerField::Gender, label, &mut fallbacks)?;
                    tables::DEFAULT_GENDER
                }
            },
            None => {
                fallbacks.push(unanswered(AnswerField::Gender));
                tables::DEFAULT_GENDER
            }
        };

        let age_group = self.encode_code(
            AnswerField::AgeBracket,
            answers.age_bracket.as_deref(),
            tables::DEFAULT_AGE_GROUP,
            EncoderTables::age_code,
            &mut recognized,
            &mut fallbacks,
        )?;

        let companions = self.encode_code(
            AnswerField::Companions,
            answers.companions.as_deref(),
            tables::DEFAULT_COMPANIONS,
            EncoderTables::companion_code,
            &mut recognized,
            &mut fallbacks,
        )?;

        let travel_styles =
            self.encode_styles(answers.travel_styles.as_ref(), &mut recognized, &mut fallbacks)?;

        let trip_duration = self.encode_code(
            AnswerField::TripDuration,
            answers.trip_duration.as_deref(),
            tables::DEFAULT_TRIP_DURATION,
            EncoderTables::duration_code,
            &mut recognized,
            &mut fallbacks,
        )?;

        let transport = self.encode_code(
            AnswerField::Transport,
            answers.transport.as_deref(),
            tables::DEFAULT_TRANSPORT,
            EncoderTables::transport_code,
            &mut recognized,
            &mut fallbacks,
        )?;

        let budget = self.encode_code(
            AnswerField::Budget,
            answers.budget.as_deref(),
            tables::DEFAULT_BUDGET,
            EncoderTables::budget_code,
            &mut recognized,
            &mut fallbacks,
        )?;

        let record = FeatureRecord {
            residence,
            gender,
            age_group,
            companions,
            travel_styles,
            trip_duration,
            transport,
            budget,
        };

        let quality = FeatureQuality {
            coverage: recognized as f64 / SCHEMA_ARITY as f64,
            fallbacks,
        };

        Ok((record, quality))
    }

    /// Encode a boundary response into a survey.features.v1 envelope
    pub fn encode_response(
        &self,
        response: &SurveyResponse,
    ) -> Result<FeatureEnvelope, CodecError> {
        let answers = AnswerNormalizer::canonicalize(response)?;
        let (features, quality) = self.encode(&answers)?;
        let computed_at = Utc::now();

        let producer = FeatureProducer {
            name: PRODUCER_NAME.to_string(),
            version: TOURCAST_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        // Route on the encoded residence so defaulted records still route.
        let model_region = self
            .tables
            .model_for_region(&features.residence)
            .map(|region| region.as_str().to_string());

        let provenance = FeatureProvenance {
            response_id: response.response_id.clone(),
            submitted_at_utc: response.submitted_at.to_rfc3339(),
            computed_at_utc: computed_at.to_rfc3339(),
            model_region,
        };

        Ok(FeatureEnvelope {
            feature_version: FEATURE_VERSION.to_string(),
            producer,
            provenance,
            quality,
            features,
        })
    }

    /// Encode a boundary response to envelope JSON
    pub fn encode_to_json(&self, response: &SurveyResponse) -> Result<String, CodecError> {
        let envelope = self.encode_response(response)?;
        serde_json::to_string_pretty(&envelope).map_err(CodecError::JsonError)
    }

    fn encode_code<F>(
        &self,
        field: AnswerField,
        label: Option<&str>,
        default: u8,
        lookup: F,
        recognized: &mut usize,
        fallbacks: &mut Vec<FallbackFlag>,
    ) -> Result<u8, CodecError>
    where
        F: Fn(&EncoderTables, &str) -> Option<u8>,
    {
        match label {
            Some(label) => match lookup(self.tables, label) {
                Some(code) => {
                    *recognized += 1;
                    Ok(code)
                }
                None => {
                    self.flag_unknown(field, label, fallbacks)?;
                    Ok(default)
                }
            },
            None => {
                fallbacks.push(unanswered(field));
                Ok(default)
            }
        }
    }

    /// Encode the style position into the joined code string
    ///
    /// Tokens fall back independently: one unknown token defaults to "1"
    /// without disturbing its neighbors. The position counts as recognized
    /// when at least one token resolved.
    fn encode_styles(
        &self,
        styles: Option<&StyleInput>,
        recognized: &mut usize,
        fallbacks: &mut Vec<FallbackFlag>,
    ) -> Result<String, CodecError> {
        let tokens = styles.map(StyleInput::tokens).unwrap_or_default();
        if tokens.is_empty() {
            fallbacks.push(unanswered(AnswerField::TravelStyle));
            return Ok(tables::DEFAULT_STYLE_CODE.to_string());
        }

        let mut codes = Vec::with_capacity(tokens.len());
        let mut resolved = 0usize;
        for token in &tokens {
            match self.tables.style_code(token) {
                Some(code) => {
                    resolved += 1;
                    codes.push(code.to_string());
                }
                None => {
                    if self.policy == UnknownLabelPolicy::Reject {
                        return Err(CodecError::UnknownLabel {
                            field: AnswerField::TravelStyle,
                            label: token.clone(),
                        });
                    }
                    codes.push(tables::DEFAULT_STYLE_CODE.to_string());
                }
            }
        }

        if resolved > 0 {
            *recognized += 1;
        }
        if resolved < tokens.len() {
            fallbacks.push(FallbackFlag {
                field: AnswerField::TravelStyle,
                reason: FallbackReason::UnknownLabel,
            });
        }

        Ok(codes.join(";"))
    }

    fn flag_unknown(
        &self,
        field: AnswerField,
        label: &str,
        fallbacks: &mut Vec<FallbackFlag>,
    ) -> Result<(), CodecError> {
        match self.policy {
            UnknownLabelPolicy::Reject => Err(CodecError::UnknownLabel {
                field,
                label: label.to_string(),
            }),
            UnknownLabelPolicy::Default => {
                fallbacks.push(FallbackFlag {
                    field,
                    reason: FallbackReason::UnknownLabel,
                });
                Ok(())
            }
        }
    }
}

fn unanswered(field: AnswerField) -> FallbackFlag {
    FallbackFlag {
        field,
        reason: FallbackReason::Unanswered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenderCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn make_test_answers() -> CanonicalAnswers {
        CanonicalAnswers {
            residence: Some("서울".to_string()),
            gender: Some("남성".to_string()),
            age_bracket: Some("20대".to_string()),
            companions: Some("혼자".to_string()),
            travel_styles: Some(StyleInput::Joined("쇼핑;캠핑".to_string())),
            trip_duration: Some("1박2일".to_string()),
            transport: Some("자가용".to_string()),
            budget: Some("10~30만원".to_string()),
        }
    }

    #[test]
    fn test_encode_full_answers() {
        let encoder = FeatureEncoder::new();
        let (record, quality) = encoder.encode(&make_test_answers()).unwrap();

        assert_eq!(record.residence, "서울");
        assert_eq!(record.gender, GenderCode::Male);
        assert_eq!(record.age_group, 20);
        assert_eq!(record.companions, 0);
        assert_eq!(record.travel_styles, "1;11");
        assert_eq!(record.trip_duration, 2);
        assert_eq!(record.transport, 0);
        assert_eq!(record.budget, 2);

        assert_eq!(quality.coverage, 1.0);
        assert!(quality.fallbacks.is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let encoder = FeatureEncoder::new();
        let (record, _) = encoder.encode(&make_test_answers()).unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "LOTNO_ADDR": "서울",
                "GENDER": "남",
                "AGE_GRP": 20,
                "TRAVEL_COMPANIONS_NUM": 0,
                "TRAVEL_PURPOSE": "1;11",
                "Date": 2,
                "MVMN_SE_NM": 0,
                "PAYMENT_AMT_WON": 2
            })
        );
    }

    #[test]
    fn test_style_shapes_encode_identically() {
        let encoder = FeatureEncoder::new();

        for styles in [
            StyleInput::Joined("쇼핑;캠핑".to_string()),
            StyleInput::List(vec!["쇼핑".to_string(), "캠핑".to_string()]),
        ] {
            let mut answers = make_test_answers();
            answers.travel_styles = Some(styles);
            let (record, _) = encoder.encode(&answers).unwrap();
            assert_eq!(record.travel_styles, "1;11");
        }

        let mut answers = make_test_answers();
        answers.travel_styles = Some(StyleInput::Single("캠핑".to_string()));
        let (record, _) = encoder.encode(&answers).unwrap();
        assert_eq!(record.travel_styles, "11");
    }

    #[test]
    fn test_unknown_style_token_defaults_alone() {
        let encoder = FeatureEncoder::new();
        let mut answers = make_test_answers();
        answers.travel_styles = Some(StyleInput::Joined("존재안함;캠핑".to_string()));

        let (record, quality) = encoder.encode(&answers).unwrap();
        assert_eq!(record.travel_styles, "1;11");

        // One token resolved, so the position still counts toward coverage.
        assert_eq!(quality.coverage, 1.0);
        assert_eq!(
            quality.fallbacks,
            vec![FallbackFlag {
                field: AnswerField::TravelStyle,
                reason: FallbackReason::UnknownLabel,
            }]
        );

        // No token resolved: the code defaults and the position is lost.
        answers.travel_styles = Some(StyleInput::Single("존재안함".to_string()));
        let (record, quality) = encoder.encode(&answers).unwrap();
        assert_eq!(record.travel_styles, "1");
        assert_eq!(quality.coverage, 7.0 / 8.0);
    }

    #[test]
    fn test_empty_answers_default_everything() {
        let encoder = FeatureEncoder::new();
        let (record, quality) = encoder.encode(&CanonicalAnswers::default()).unwrap();

        assert_eq!(record.residence, "서울");
        assert_eq!(record.gender, GenderCode::Male);
        assert_eq!(record.age_group, 10);
        assert_eq!(record.companions, 0);
        assert_eq!(record.travel_styles, "1");
        assert_eq!(record.trip_duration, 1);
        assert_eq!(record.transport, 0);
        assert_eq!(record.budget, 1);

        assert_eq!(quality.coverage, 0.0);
        assert_eq!(quality.fallbacks.len(), 8);
        assert!(quality
            .fallbacks
            .iter()
            .all(|f| f.reason == FallbackReason::Unanswered));
    }

    #[test]
    fn test_unknown_label_default_policy() {
        let encoder = FeatureEncoder::new();
        let mut answers = make_test_answers();
        answers.budget = Some("1억 이상".to_string());

        let (record, quality) = encoder.encode(&answers).unwrap();
        assert_eq!(record.budget, 1);
        assert_eq!(quality.coverage, 7.0 / 8.0);
        assert_eq!(
            quality.fallbacks,
            vec![FallbackFlag {
                field: AnswerField::Budget,
                reason: FallbackReason::UnknownLabel,
            }]
        );
    }

    #[test]
    fn test_unknown_label_reject_policy() {
        let encoder = FeatureEncoder::new().with_policy(UnknownLabelPolicy::Reject);
        let mut answers = make_test_answers();
        answers.gender = Some("기타".to_string());

        let err = encoder.encode(&answers).unwrap_err();
        match err {
            CodecError::UnknownLabel { field, label } => {
                assert_eq!(field, AnswerField::Gender);
                assert_eq!(label, "기타");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reject_policy_accepts_unanswered() {
        let encoder = FeatureEncoder::new().with_policy(UnknownLabelPolicy::Reject);

        // Unanswered positions still default silently; only answered labels
        // outside the tables reject.
        let (record, quality) = encoder.encode(&CanonicalAnswers::default()).unwrap();
        assert_eq!(record.age_group, 10);
        assert_eq!(quality.fallbacks.len(), 8);
    }

    #[test]
    fn test_encoding_is_lossy() {
        let encoder = FeatureEncoder::new();

        let mut unknown_age = make_test_answers();
        unknown_age.age_bracket = Some("백세".to_string());
        let (from_unknown, _) = encoder.encode(&unknown_age).unwrap();

        let mut teen_age = make_test_answers();
        teen_age.age_bracket = Some("10대".to_string());
        let (from_teen, _) = encoder.encode(&teen_age).unwrap();

        // Both land on AGE_GRP 10: the record alone cannot tell them apart.
        assert_eq!(from_unknown, from_teen);
    }

    #[test]
    fn test_transport_codes() {
        let encoder = FeatureEncoder::new();

        let mut answers = make_test_answers();
        answers.transport = Some("버스+지하철".to_string());
        let (record, _) = encoder.encode(&answers).unwrap();
        assert_eq!(record.transport, 50);

        answers.transport = Some("배/선박".to_string());
        let (record, _) = encoder.encode(&answers).unwrap();
        assert_eq!(record.transport, 4);
    }

    #[test]
    fn test_age_bracket_codes() {
        let encoder = FeatureEncoder::new();

        for (label, expected) in [("20대", 20u8), ("70대 이상", 70), ("없음", 10)] {
            let mut answers = make_test_answers();
            answers.age_bracket = Some(label.to_string());
            let (record, _) = encoder.encode(&answers).unwrap();
            assert_eq!(record.age_group, expected, "label {label}");
        }
    }

    #[test]
    fn test_encode_response_envelope() {
        let response = crate::schema::SurveyResponseAdapter::parse(
            r#"{
                "schema_version": "survey.response.v1",
                "response_id": "7a3f9c21-88e0-4f1b-a2d4-5b6c7d8e9f01",
                "submitted_at": "2024-06-01T09:30:00Z",
                "channel": "web",
                "answers": ["서울", "남성", "20대", "혼자", "쇼핑;캠핑", "1박2일", "자가용", "10~30만원"]
            }"#,
        )
        .unwrap();

        let encoder = FeatureEncoder::new().with_instance_id("test-instance".to_string());
        let envelope = encoder.encode_response(&response).unwrap();

        assert_eq!(envelope.feature_version, FEATURE_VERSION);
        assert_eq!(envelope.producer.name, PRODUCER_NAME);
        assert_eq!(envelope.producer.version, TOURCAST_VERSION);
        assert_eq!(envelope.producer.instance_id, "test-instance");

        assert_eq!(
            envelope.provenance.response_id.as_deref(),
            Some("7a3f9c21-88e0-4f1b-a2d4-5b6c7d8e9f01")
        );
        assert_eq!(
            envelope.provenance.submitted_at_utc,
            "2024-06-01T09:30:00+00:00"
        );
        assert_eq!(envelope.provenance.model_region.as_deref(), Some("capital"));

        assert_eq!(envelope.quality.coverage, 1.0);
        assert_eq!(envelope.features.travel_styles, "1;11");
    }

    #[test]
    fn test_unrouted_region_leaves_model_null() {
        let response = crate::schema::SurveyResponseAdapter::parse(
            r#"{
                "schema_version": "survey.response.v1",
                "submitted_at": "2024-06-01T09:30:00Z",
                "answers": ["뉴욕", "남성", "20대", "혼자", "쇼핑", "1박2일", "자가용", "10~30만원"]
            }"#,
        )
        .unwrap();

        let encoder = FeatureEncoder::new();
        let envelope = encoder.encode_response(&response).unwrap();

        assert_eq!(envelope.provenance.model_region, None);
        assert_eq!(envelope.features.residence, "뉴욕");
        // Routing never fails the encoding.
        assert_eq!(envelope.quality.coverage, 1.0);
    }

    #[test]
    fn test_custom_tables() {
        let mut custom = EncoderTables::standard();
        custom.set_style("한옥 스테이", 25);

        let encoder = FeatureEncoder::with_tables(&custom);
        let mut answers = make_test_answers();
        answers.travel_styles = Some(StyleInput::Single("한옥 스테이".to_string()));

        let (record, quality) = encoder.encode(&answers).unwrap();
        assert_eq!(record.travel_styles, "25");
        assert!(quality.fallbacks.is_empty());
    }

    #[test]
    fn test_encode_to_json() {
        let response = crate::schema::SurveyResponse::new(
            Utc::now(),
            vec![crate::schema::AnswerValue::Text("제주도".to_string())],
        );

        let encoder = FeatureEncoder::new();
        let json = encoder.encode_to_json(&response).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("feature_version").is_some());
        assert!(parsed.get("producer").is_some());
        assert!(parsed.get("provenance").is_some());
        assert!(parsed.get("quality").is_some());
        assert_eq!(parsed["features"]["LOTNO_ADDR"], "제주도");
        assert_eq!(parsed["provenance"]["model_region"], "jeju");
    }
}
