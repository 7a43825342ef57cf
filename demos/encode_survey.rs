//! Generate feature output for validation testing

fn main() {
    let json = r#"{
        "schema_version": "survey.response.v1",
        "response_id": "validation-test",
        "submitted_at": "2024-06-01T09:30:00Z",
        "channel": "web",
        "answers": [
            "서울",
            "남성",
            "20대",
            "2명",
            "쇼핑;캠핑",
            "1박2일",
            "기차",
            "10~30만원"
        ]
    }"#;

    match tourcast_survey::response_to_features(json) {
        Ok(features) => print!("{features}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
