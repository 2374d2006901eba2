//! Integration tests for mapping failures to user-facing messages.

mod common;

use deepfake_lens_analysis_contract::AnalysisOperation;
use deepfake_lens_client::{ClientError, VideoSampling};
use deepfake_lens_core::MediaFile;

fn video() -> MediaFile {
    MediaFile::from_bytes("clip.mp4", vec![0_u8; 4])
}

#[test]
fn failure_classification_tests_use_remote_error_field() {
    let (client, transport) = common::scripted_client();
    transport.respond(500, r#"{"error":"model unavailable"}"#);

    let error = client
        .analyze_video(&video(), VideoSampling::default())
        .expect_err("500 should fail");
    assert!(matches!(
        error,
        ClientError::Remote {
            operation: AnalysisOperation::Video,
            status: 500,
            ..
        }
    ));
    assert_eq!(error.user_message(), "model unavailable");
}

#[test]
fn failure_classification_tests_fall_back_per_operation() {
    let (client, transport) = common::scripted_client();
    transport.respond(502, "<html>bad gateway</html>");
    transport.respond(400, "{}");

    let video_error = client
        .analyze_video(&video(), VideoSampling::default())
        .expect_err("502 should fail");
    assert_eq!(video_error.user_message(), "video analysis failed");

    let image = MediaFile::from_bytes("face.jpg", vec![0_u8; 4]);
    let image_error = client.analyze_image(&image).expect_err("400 should fail");
    assert_eq!(image_error.user_message(), "image analysis failed");
}

#[test]
fn failure_classification_tests_network_and_non_json_are_unreachable() {
    let (client, transport) = common::scripted_client();
    transport.fail("connection refused");
    transport.respond(200, "definitely not json");

    let offline = client.check_health().expect_err("network failure should surface");
    assert!(matches!(offline, ClientError::Transport(_)));
    assert_eq!(offline.user_message(), "backend unreachable");

    let image = MediaFile::from_bytes("face.jpg", vec![0_u8; 4]);
    let garbled = client.analyze_image(&image).expect_err("non-JSON body should fail");
    assert!(matches!(garbled, ClientError::Transport(_)));
    assert_eq!(garbled.user_message(), "backend unreachable");
}

#[test]
fn failure_classification_tests_malformed_success_body_uses_fallback() {
    let (client, transport) = common::scripted_client();
    transport.respond(200, r#"{"result": 42}"#);

    let image = MediaFile::from_bytes("face.webp", vec![0_u8; 4]);
    let error = client.analyze_image(&image).expect_err("shape mismatch should fail");
    assert!(matches!(error, ClientError::Malformed { .. }));
    assert_eq!(error.user_message(), "image analysis failed");
}

#[test]
fn failure_classification_tests_unreadable_file_never_reaches_transport() {
    let (client, transport) = common::scripted_client();
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("vanishing.png");
    std::fs::write(&path, [1_u8, 2, 3]).expect("fixture should be written");
    let file = MediaFile::from_path(&path).expect("metadata should load");
    std::fs::remove_file(&path).expect("fixture should be removed");

    let error = client.analyze_image(&file).expect_err("missing file should fail");
    assert!(matches!(error, ClientError::File(_)));
    assert!(transport.requests().is_empty());
}
