//! Encoding lookup tables
//!
//! Every label-to-code mapping the encoder and decoder use lives here, as one
//! immutable config object. The code values mirror the category space of the
//! Korea tourism travel logs the downstream models were trained on, so they
//! are fixed contracts: changing a code silently changes what the models see.

use crate::types::{GenderCode, ModelRegion};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Default residence when the position is unanswered
pub const DEFAULT_RESIDENCE: &str = "서울";
/// Default gender code
pub const DEFAULT_GENDER: GenderCode = GenderCode::Male;
/// Default age-group code
pub const DEFAULT_AGE_GROUP: u8 = 10;
/// Default companion-count code
pub const DEFAULT_COMPANIONS: u8 = 0;
/// Default style code, also the per-token fallback
pub const DEFAULT_STYLE_CODE: u8 = 1;
/// Default trip-duration code
pub const DEFAULT_TRIP_DURATION: u8 = 1;
/// Default transport code
pub const DEFAULT_TRANSPORT: u8 = 0;
/// Default budget-band code
pub const DEFAULT_BUDGET: u8 = 1;
/// Neutral midpoint returned for unrecognized rating labels
pub const DEFAULT_RATING: u8 = 3;
/// Display category for type codes outside the table
pub const FALLBACK_CATEGORY: &str = "기타";

static BUILTIN: OnceLock<EncoderTables> = OnceLock::new();

/// The full set of lookup tables used for encoding and decoding
///
/// Construct with [`EncoderTables::standard`] and extend per deployment via
/// the `set_*` methods before handing the tables to an encoder. The process
/// default lives behind [`EncoderTables::builtin`].
#[derive(Debug, Clone)]
pub struct EncoderTables {
    genders: HashMap<String, GenderCode>,
    age_brackets: HashMap<String, u8>,
    companions: HashMap<String, u8>,
    styles: HashMap<String, u8>,
    durations: HashMap<String, u8>,
    transports: HashMap<String, u8>,
    budgets: HashMap<String, u8>,
    categories: HashMap<i64, String>,
    ratings: HashMap<String, u8>,
    regions: HashMap<String, ModelRegion>,
}

impl EncoderTables {
    /// The standard table set shipped with the crate
    pub fn standard() -> Self {
        let mut genders = HashMap::new();
        genders.insert("남성".to_string(), GenderCode::Male);
        genders.insert("여성".to_string(), GenderCode::Female);

        let mut age_brackets = HashMap::new();
        for (label, code) in [
            ("10대", 10),
            ("20대", 20),
            ("30대", 30),
            ("40대", 40),
            ("50대", 50),
            ("60대", 60),
            ("70대 이상", 70),
        ] {
            age_brackets.insert(label.to_string(), code);
        }

        let mut companions = HashMap::new();
        companions.insert("혼자".to_string(), 0);
        for n in 1u8..=10 {
            companions.insert(format!("{}명", n), n);
        }
        companions.insert("11명 이상".to_string(), 11);

        let mut styles = HashMap::new();
        for (label, code) in [
            ("쇼핑", 1),
            ("테마파크", 2),
            ("역사 유적지", 3),
            ("시티투어", 4),
            ("야외 스포츠", 5),
            ("문화예술 관람", 6),
            ("유흥/오락", 7),
            ("등산", 8),
            ("낚시", 9),
            ("골프", 10),
            ("캠핑", 11),
            ("지역 축제", 12),
            ("온천/스파", 13),
            ("휴식/힐링", 14),
            ("맛집 탐방", 15),
            ("카페 투어", 16),
            ("드라이브", 17),
            ("사진 촬영", 18),
            ("박물관 관람", 19),
            ("공연 관람", 20),
            ("해양 스포츠", 21),
            ("겨울 스포츠", 22),
            ("자연 경관 감상", 23),
            ("종교/성지 순례", 24),
        ] {
            styles.insert(label.to_string(), code);
        }

        let mut durations = HashMap::new();
        for (label, code) in [
            ("당일치기", 1),
            ("1박2일", 2),
            ("2박3일", 3),
            ("3박4일", 4),
            ("그 이상", 5),
        ] {
            durations.insert(label.to_string(), code);
        }

        // 버스+지하철 jumps to 50 in the training data; the gap is contractual.
        let mut transports = HashMap::new();
        for (label, code) in [
            ("자가용", 0),
            ("기차", 1),
            ("고속/시외버스", 2),
            ("비행기", 3),
            ("배/선박", 4),
            ("버스+지하철", 50),
        ] {
            transports.insert(label.to_string(), code);
        }

        let mut budgets = HashMap::new();
        for (label, code) in [
            ("10만원 이하", 1),
            ("10~30만원", 2),
            ("30~50만원", 3),
            ("50~100만원", 4),
            ("100만원 이상", 5),
        ] {
            budgets.insert(label.to_string(), code);
        }

        let mut categories = HashMap::new();
        for (code, name) in [
            (1, "자연 관광지"),
            (2, "역사 유적지"),
            (3, "문화 유적지"),
            (4, "상업 지구"),
            (5, "레저 스포츠"),
            (6, "테마파크"),
            (7, "산책로"),
            (8, "지역 축제"),
        ] {
            categories.insert(code, name.to_string());
        }

        let mut ratings = HashMap::new();
        for (label, score) in [
            ("매우 선호", 5),
            ("선호", 4),
            ("보통", 3),
            ("비선호", 2),
            ("매우 비선호", 1),
        ] {
            ratings.insert(label.to_string(), score);
        }

        let mut regions = HashMap::new();
        for name in ["서울", "경기", "인천"] {
            regions.insert(name.to_string(), ModelRegion::Capital);
        }
        for name in ["전북", "전남", "충북", "충남", "광주", "대전", "세종"] {
            regions.insert(name.to_string(), ModelRegion::West);
        }
        for name in ["부산", "대구", "울산", "경남", "경북", "강원"] {
            regions.insert(name.to_string(), ModelRegion::East);
        }
        regions.insert("제주도".to_string(), ModelRegion::Jeju);

        Self {
            genders,
            age_brackets,
            companions,
            styles,
            durations,
            transports,
            budgets,
            categories,
            ratings,
            regions,
        }
    }

    /// Shared standard tables, constructed once per process
    pub fn builtin() -> &'static Self {
        BUILTIN.get_or_init(Self::standard)
    }

    pub fn gender_code(&self, label: &str) -> Option<GenderCode> {
        self.genders.get(label).copied()
    }

    pub fn age_code(&self, label: &str) -> Option<u8> {
        self.age_brackets.get(label).copied()
    }

    pub fn companion_code(&self, label: &str) -> Option<u8> {
        self.companions.get(label).copied()
    }

    pub fn style_code(&self, label: &str) -> Option<u8> {
        self.styles.get(label).copied()
    }

    pub fn duration_code(&self, label: &str) -> Option<u8> {
        self.durations.get(label).copied()
    }

    pub fn transport_code(&self, label: &str) -> Option<u8> {
        self.transports.get(label).copied()
    }

    pub fn budget_code(&self, label: &str) -> Option<u8> {
        self.budgets.get(label).copied()
    }

    /// Preference score for a rating label, if the label is recognized
    pub fn rating_score(&self, label: &str) -> Option<u8> {
        self.ratings.get(label).copied()
    }

    /// Display category for a place type code
    pub fn category_for_type(&self, code: i64) -> &str {
        self.categories
            .get(&code)
            .map(String::as_str)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Regional model for a residence label, if the region is routed
    pub fn model_for_region(&self, residence: &str) -> Option<ModelRegion> {
        self.regions.get(residence).copied()
    }

    /// Add or override a style label
    pub fn set_style(&mut self, label: impl Into<String>, code: u8) {
        self.styles.insert(label.into(), code);
    }

    /// Add or override a residence-to-model route
    pub fn set_region(&mut self, residence: impl Into<String>, region: ModelRegion) {
        self.regions.insert(residence.into(), region);
    }

    /// Number of style labels in the table
    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    /// Number of place categories in the table
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Number of routed residence regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

impl Default for EncoderTables {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_codes() {
        let tables = EncoderTables::standard();
        assert_eq!(tables.style_code("쇼핑"), Some(1));
        assert_eq!(tables.style_code("캠핑"), Some(11));
        assert_eq!(tables.style_code("존재안함"), None);
        assert_eq!(tables.style_count(), 24);
    }

    #[test]
    fn test_transport_gap_preserved() {
        let tables = EncoderTables::standard();
        assert_eq!(tables.transport_code("배/선박"), Some(4));
        assert_eq!(tables.transport_code("버스+지하철"), Some(50));
    }

    #[test]
    fn test_companion_codes() {
        let tables = EncoderTables::standard();
        assert_eq!(tables.companion_code("혼자"), Some(0));
        assert_eq!(tables.companion_code("1명"), Some(1));
        assert_eq!(tables.companion_code("10명"), Some(10));
        assert_eq!(tables.companion_code("11명 이상"), Some(11));
    }

    #[test]
    fn test_category_lookup_with_fallback() {
        let tables = EncoderTables::standard();
        assert_eq!(tables.category_for_type(3), "문화 유적지");
        assert_eq!(tables.category_for_type(8), "지역 축제");
        assert_eq!(tables.category_for_type(99), "기타");
        assert_eq!(tables.category_for_type(0), "기타");
    }

    #[test]
    fn test_rating_scores() {
        let tables = EncoderTables::standard();
        assert_eq!(tables.rating_score("매우 선호"), Some(5));
        assert_eq!(tables.rating_score("매우 비선호"), Some(1));
        assert_eq!(tables.rating_score("모름"), None);
    }

    #[test]
    fn test_region_routing() {
        let tables = EncoderTables::standard();
        assert_eq!(tables.model_for_region("서울"), Some(ModelRegion::Capital));
        assert_eq!(tables.model_for_region("광주"), Some(ModelRegion::West));
        assert_eq!(tables.model_for_region("강원"), Some(ModelRegion::East));
        assert_eq!(tables.model_for_region("제주도"), Some(ModelRegion::Jeju));
        assert_eq!(tables.model_for_region("뉴욕"), None);
        assert_eq!(tables.region_count(), 17);
    }

    #[test]
    fn test_deployment_extension() {
        let mut tables = EncoderTables::standard();
        tables.set_style("반려동물 동반", 25);
        tables.set_region("제주", ModelRegion::Jeju);
        assert_eq!(tables.style_code("반려동물 동반"), Some(25));
        assert_eq!(tables.model_for_region("제주"), Some(ModelRegion::Jeju));
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = EncoderTables::builtin();
        let b = EncoderTables::builtin();
        assert!(std::ptr::eq(a, b));
    }
}
