//! Recommendation decoding
//!
//! This module turns prediction responses back into display-ready places:
//! type codes become category labels, entries are ranked by score, and the
//! five-step preference labels map to integer scores.

use crate::error::CodecError;
use crate::tables::{self, EncoderTables};
use crate::types::{DecodedPlace, PredictionResponse};
use std::cmp::Ordering;

/// Decoder for prediction service responses
pub struct RecommendationDecoder<'a> {
    tables: &'a EncoderTables,
    top_n: Option<usize>,
}

impl Default for RecommendationDecoder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationDecoder<'static> {
    /// Create a decoder over the built-in tables
    pub fn new() -> Self {
        Self {
            tables: EncoderTables::builtin(),
            top_n: None,
        }
    }
}

impl<'a> RecommendationDecoder<'a> {
    /// Create a decoder over custom tables
    pub fn with_tables(tables: &'a EncoderTables) -> Self {
        Self {
            tables,
            top_n: None,
        }
    }

    /// Keep only the N best entries after ranking
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    /// Decode a prediction response into ranked places
    ///
    /// Entries are sorted by score descending; ties keep their input order.
    /// Unknown type codes decode to the fallback category rather than
    /// failing.
    pub fn decode(&self, response: &PredictionResponse) -> Vec<DecodedPlace> {
        let mut places = match response {
            PredictionResponse::Places(recommendations) => recommendations
                .iter()
                .map(|place| DecodedPlace {
                    place_name: place.place_name.clone(),
                    address: place.address.clone(),
                    score: place.score,
                    type_code: Some(place.type_code),
                    category: Some(self.tables.category_for_type(place.type_code).to_string()),
                })
                .collect::<Vec<_>>(),
            PredictionResponse::Ranked { top_predictions } => top_predictions
                .iter()
                .map(|prediction| DecodedPlace {
                    place_name: prediction.label.clone(),
                    address: None,
                    score: prediction.probability,
                    type_code: None,
                    category: None,
                })
                .collect::<Vec<_>>(),
        };

        places.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        if let Some(top_n) = self.top_n {
            places.truncate(top_n);
        }

        places
    }

    /// Decode a prediction response from JSON
    ///
    /// Fails only on structurally unreadable JSON.
    pub fn decode_json(&self, json: &str) -> Result<Vec<DecodedPlace>, CodecError> {
        let response: PredictionResponse = serde_json::from_str(json)?;
        Ok(self.decode(&response))
    }

    /// Decode a preference rating label into its 1-5 score
    ///
    /// Unrecognized labels return the neutral midpoint.
    pub fn decode_rating(&self, label: &str) -> u8 {
        self.tables
            .rating_score(label.trim())
            .unwrap_or(tables::DEFAULT_RATING)
    }

    /// Display category for a place type code
    pub fn decode_type(&self, code: i64) -> &str {
        self.tables.category_for_type(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACES: &str = r#"[
        {"place_name": "경복궁", "address": "서울 종로구", "score": 0.82, "type": 2},
        {"place_name": "한강공원", "address": "서울 영등포구", "score": 0.91, "type": 7},
        {"place_name": "알 수 없는 곳", "score": 0.67, "type": 99}
    ]"#;

    const RANKED: &str = r#"{
        "top_predictions": [
            {"label": "성산일출봉", "probability": 0.44},
            {"label": "우도", "probability": 0.31},
            {"label": "만장굴", "probability": 0.25}
        ]
    }"#;

    #[test]
    fn test_decode_places_ranks_by_score() {
        let decoder = RecommendationDecoder::new();
        let places = decoder.decode_json(PLACES).unwrap();

        assert_eq!(places.len(), 3);
        assert_eq!(places[0].place_name, "한강공원");
        assert_eq!(places[0].category.as_deref(), Some("산책로"));
        assert_eq!(places[1].place_name, "경복궁");
        assert_eq!(places[1].category.as_deref(), Some("역사 유적지"));

        // Code 99 is outside the table and falls back.
        assert_eq!(places[2].category.as_deref(), Some("기타"));
        assert_eq!(places[2].address, None);
    }

    #[test]
    fn test_decode_ranked_shape() {
        let decoder = RecommendationDecoder::new();
        let places = decoder.decode_json(RANKED).unwrap();

        assert_eq!(places.len(), 3);
        assert_eq!(places[0].place_name, "성산일출봉");
        assert_eq!(places[0].score, 0.44);
        assert_eq!(places[0].type_code, None);
        assert_eq!(places[0].category, None);
    }

    #[test]
    fn test_top_n_truncates_after_ranking() {
        let decoder = RecommendationDecoder::new().with_top_n(2);
        let places = decoder.decode_json(PLACES).unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].place_name, "한강공원");
        assert_eq!(places[1].place_name, "경복궁");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let json = r#"[
            {"place_name": "첫째", "score": 0.5, "type": 1},
            {"place_name": "둘째", "score": 0.5, "type": 1},
            {"place_name": "셋째", "score": 0.9, "type": 1}
        ]"#;

        let decoder = RecommendationDecoder::new();
        let places = decoder.decode_json(json).unwrap();

        assert_eq!(places[0].place_name, "셋째");
        assert_eq!(places[1].place_name, "첫째");
        assert_eq!(places[2].place_name, "둘째");
    }

    #[test]
    fn test_decode_type() {
        let decoder = RecommendationDecoder::new();
        assert_eq!(decoder.decode_type(1), "자연 관광지");
        assert_eq!(decoder.decode_type(3), "문화 유적지");
        assert_eq!(decoder.decode_type(99), "기타");
    }

    #[test]
    fn test_decode_rating() {
        let decoder = RecommendationDecoder::new();
        assert_eq!(decoder.decode_rating("매우 선호"), 5);
        assert_eq!(decoder.decode_rating("선호"), 4);
        assert_eq!(decoder.decode_rating("보통"), 3);
        assert_eq!(decoder.decode_rating("비선호"), 2);
        assert_eq!(decoder.decode_rating("매우 비선호"), 1);
        assert_eq!(decoder.decode_rating("모름"), 3);
        assert_eq!(decoder.decode_rating(" 선호 "), 4);
    }

    #[test]
    fn test_unreadable_json_fails() {
        let decoder = RecommendationDecoder::new();
        let err = decoder.decode_json("{not json").unwrap_err();
        assert!(matches!(err, CodecError::JsonError(_)));
    }

    #[test]
    fn test_empty_response_decodes_empty() {
        let decoder = RecommendationDecoder::new();
        assert!(decoder.decode_json("[]").unwrap().is_empty());
        assert!(decoder
            .decode_json(r#"{"top_predictions": []}"#)
            .unwrap()
            .is_empty());
    }
}
