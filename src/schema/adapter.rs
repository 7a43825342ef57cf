//! Adapter for reading survey.response.v1 payloads off the JSON boundary
//!
//! Single envelopes, JSON arrays of envelopes, and NDJSON streams all land
//! here before anything downstream sees them.

use crate::error::CodecError;
use crate::schema::response::{SurveyResponse, ValidationError};

/// Adapter for parsing survey response payloads
pub struct SurveyResponseAdapter;

impl SurveyResponseAdapter {
    /// Parse a single response envelope
    pub fn parse(json: &str) -> Result<SurveyResponse, CodecError> {
        let response: SurveyResponse = serde_json::from_str(json)?;
        Ok(response)
    }

    /// Parse a JSON array of response envelopes
    ///
    /// A single bare envelope is accepted too and yields a one-element batch.
    pub fn parse_array(json: &str) -> Result<Vec<SurveyResponse>, CodecError> {
        match serde_json::from_str::<Vec<SurveyResponse>>(json) {
            Ok(responses) => Ok(responses),
            Err(array_err) => match serde_json::from_str::<SurveyResponse>(json) {
                Ok(response) => Ok(vec![response]),
                Err(_) => Err(CodecError::ParseError(format!(
                    "Failed to parse response array: {}",
                    array_err
                ))),
            },
        }
    }

    /// Parse NDJSON (newline-delimited JSON) containing response envelopes
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SurveyResponse>, CodecError> {
        let mut responses = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SurveyResponse>(trimmed) {
                Ok(response) => responses.push(response),
                Err(e) => {
                    return Err(CodecError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(responses)
    }

    /// Parse a batch payload, sniffing the format
    ///
    /// Input starting with `[` is read as a JSON array, anything else as
    /// NDJSON (which covers the single-envelope case as well).
    pub fn parse_batch(payload: &str) -> Result<Vec<SurveyResponse>, CodecError> {
        if payload.trim_start().starts_with('[') {
            Self::parse_array(payload)
        } else {
            Self::parse_ndjson(payload)
        }
    }

    /// Validate a batch of responses, returning one finding per invalid entry
    pub fn validate_all(responses: &[SurveyResponse]) -> Vec<ValidationFinding> {
        responses
            .iter()
            .enumerate()
            .filter_map(|(idx, response)| {
                response.validate().err().map(|error| ValidationFinding {
                    index: idx,
                    response_id: response.response_id.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// One invalid entry in a validated batch
#[derive(Debug)]
pub struct ValidationFinding {
    pub index: usize,
    pub response_id: Option<String>,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"{
        "schema_version": "survey.response.v1",
        "response_id": "1f0a8d6e-4b2c-4f7e-9b1a-3c5d7e9f0a2b",
        "submitted_at": "2024-06-01T09:30:00Z",
        "channel": "web",
        "answers": ["서울", "남성", "20대", "혼자", "쇼핑;캠핑", "1박2일", "자가용", "10~30만원"]
    }"#;

    #[test]
    fn test_parse_single() {
        let response = SurveyResponseAdapter::parse(SINGLE).unwrap();
        assert_eq!(response.answers.len(), 8);
        assert_eq!(
            response.response_id.as_deref(),
            Some("1f0a8d6e-4b2c-4f7e-9b1a-3c5d7e9f0a2b")
        );
    }

    #[test]
    fn test_parse_array_accepts_bare_envelope() {
        let batch = SurveyResponseAdapter::parse_array(SINGLE).unwrap();
        assert_eq!(batch.len(), 1);

        let wrapped = format!("[{}, {}]", SINGLE, SINGLE);
        let batch = SurveyResponseAdapter::parse_array(&wrapped).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = r#"{"schema_version":"survey.response.v1","submitted_at":"2024-06-01T09:30:00Z","answers":["서울","남성"]}

{"schema_version":"survey.response.v1","submitted_at":"2024-06-01T09:31:00Z","answers":["부산","여성"]}"#;

        let batch = SurveyResponseAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let ndjson = r#"{"schema_version":"survey.response.v1","submitted_at":"2024-06-01T09:30:00Z","answers":[]}
not json"#;

        let err = SurveyResponseAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_batch_sniffs_format() {
        let array = format!("  [{}]", SINGLE);
        assert_eq!(SurveyResponseAdapter::parse_batch(&array).unwrap().len(), 1);

        let ndjson = r#"{"schema_version":"survey.response.v1","submitted_at":"2024-06-01T09:30:00Z","answers":["서울"]}"#;
        assert_eq!(
            SurveyResponseAdapter::parse_batch(ndjson).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_validate_all_flags_bad_entries() {
        let ndjson = r#"{"schema_version":"survey.response.v1","submitted_at":"2024-06-01T09:30:00Z","answers":["서울"]}
{"schema_version":"survey.response.v9","response_id":"bad-one","submitted_at":"2024-06-01T09:31:00Z","answers":["부산"]}"#;

        let batch = SurveyResponseAdapter::parse_ndjson(ndjson).unwrap();
        let findings = SurveyResponseAdapter::validate_all(&batch);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].index, 1);
        assert_eq!(findings[0].response_id.as_deref(), Some("bad-one"));
    }
}
