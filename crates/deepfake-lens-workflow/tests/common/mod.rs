//! Shared fixtures for workflow integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use deepfake_lens_analysis_contract::{
    AnalysisPayload, parse_image_response, parse_video_response,
};
use deepfake_lens_client::{
    AnalysisClient, AnalysisTransport, ClientError, TransportRequest, TransportResponse,
};
use deepfake_lens_core::MediaFile;

/// Successful image body with a confident deepfake verdict.
#[allow(dead_code)]
pub const DEEPFAKE_IMAGE_BODY: &str = r#"{
    "success": true,
    "result": {
        "fake_probability": 0.82,
        "real_probability": 0.18,
        "is_deepfake": true,
        "confidence": 0.91
    },
    "visualization": "data:image/png;base64,AAAA"
}"#;

/// Successful video body with three key frames.
#[allow(dead_code)]
pub const VIDEO_BODY: &str = r#"{
    "success": true,
    "result": {
        "avg_fake_probability": 0.31, "avg_real_probability": 0.69,
        "std_deviation": 0.08, "is_deepfake": false, "confidence": 0.69,
        "frames_analyzed": 3, "total_frames": 90, "fps": 30.0, "duration": 3.0
    },
    "key_frames": [
        {"frame_index": 0, "visualization": "data:image/png;base64,K0", "fake_probability": 0.2},
        {"frame_index": 30, "visualization": "data:image/png;base64,K1", "fake_probability": 0.6},
        {"frame_index": 60, "visualization": "data:image/png;base64,K2", "fake_probability": 0.1}
    ],
    "timeline": {"indices": [0, 30, 60], "timestamps": [0.0, 1.0, 2.0],
                 "probabilities": [0.2, 0.6, 0.1]}
}"#;

/// Small in-memory PNG-named file.
#[allow(dead_code)]
pub fn photo() -> MediaFile {
    MediaFile::from_bytes("portrait.png", vec![0_u8; 256])
}

/// Small in-memory MP4-named file.
#[allow(dead_code)]
pub fn clip() -> MediaFile {
    MediaFile::from_bytes("interview.mp4", vec![0_u8; 1024])
}

/// Parsed deepfake image payload.
#[allow(dead_code)]
pub fn deepfake_image_payload() -> AnalysisPayload {
    AnalysisPayload::Image(parse_image_response(DEEPFAKE_IMAGE_BODY).expect("fixture parses"))
}

/// Parsed video payload.
#[allow(dead_code)]
pub fn video_payload() -> AnalysisPayload {
    AnalysisPayload::Video(parse_video_response(VIDEO_BODY).expect("fixture parses"))
}

/// Transport replaying scripted HTTP responses.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<TransportResponse>>,
    calls: Mutex<usize>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Queues a response.
    pub fn respond(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .expect("script lock should work")
            .push_back(TransportResponse {
                status,
                body: body.to_string(),
            });
    }

    /// Number of requests executed.
    pub fn calls(&self) -> usize {
        *self.calls.lock().expect("call lock should work")
    }
}

impl AnalysisTransport for ScriptedTransport {
    fn execute(&self, _request: TransportRequest) -> Result<TransportResponse, ClientError> {
        *self.calls.lock().expect("call lock should work") += 1;
        self.responses
            .lock()
            .expect("script lock should work")
            .pop_front()
            .ok_or_else(|| ClientError::Transport("connection refused".to_string()))
    }
}

/// Builds a client against a scripted transport.
#[allow(dead_code)]
pub fn scripted_client() -> (AnalysisClient, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::default());
    let client = AnalysisClient::new("http://detector.test/api", transport.clone())
        .expect("fixture base url should be valid");
    (client, transport)
}
