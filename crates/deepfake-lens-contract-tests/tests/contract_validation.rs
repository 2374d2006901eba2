//! Validates contract fixtures against frozen JSON schemas and checks that the
//! typed parsers accept the same fixtures.

use deepfake_lens_analysis_contract::{
    parse_health_response, parse_image_response, parse_video_response,
};
use jsonschema::JSONSchema;
use serde_json::Value;

const CONTRACTS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts");

fn read_contract_file(relative: &str) -> String {
    std::fs::read_to_string(format!("{CONTRACTS_DIR}/{relative}"))
        .expect("contract file should be readable")
}

fn load_json(relative: &str) -> Value {
    serde_json::from_str(&read_contract_file(relative)).expect("json file should be valid")
}

fn compile_validator(schema: &str) -> JSONSchema {
    let schema = load_json(schema);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn health_fixture_matches_schema_and_parser() {
    let validator = compile_validator("health-response.schema.json");
    assert!(validator.is_valid(&load_json("fixtures/health-response.valid.json")));

    let parsed = parse_health_response(&read_contract_file("fixtures/health-response.valid.json"))
        .expect("health fixture should parse");
    assert!(parsed.model_loaded);
    assert_eq!(parsed.device, "cuda");
}

#[test]
fn image_fixtures_match_schema_and_parser() {
    let validator = compile_validator("image-analysis-response.schema.json");
    for fixture in [
        "fixtures/image-analysis-response.valid.json",
        "fixtures/image-analysis-failure.valid.json",
    ] {
        assert!(validator.is_valid(&load_json(fixture)), "{fixture} should validate");
        parse_image_response(&read_contract_file(fixture)).expect("image fixture should parse");
    }
}

#[test]
fn video_fixture_matches_schema_and_parser() {
    let validator = compile_validator("video-analysis-response.schema.json");
    let fixture = "fixtures/video-analysis-response.valid.json";
    assert!(validator.is_valid(&load_json(fixture)));

    let parsed = parse_video_response(&read_contract_file(fixture))
        .expect("video fixture should parse");
    assert_eq!(parsed.key_frames.map(|frames| frames.len()), Some(2));
    assert_eq!(parsed.result.map(|result| result.duration_seconds), Some(10.0));
}

#[test]
fn invalid_video_fixture_fails_schema_and_parser() {
    let validator = compile_validator("video-analysis-response.schema.json");
    let fixture = "fixtures/video-analysis-response.invalid.json";
    assert!(!validator.is_valid(&load_json(fixture)));
    assert!(parse_video_response(&read_contract_file(fixture)).is_err());
}
