//! Shared fixtures for client integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use deepfake_lens_client::{
    AnalysisClient, AnalysisTransport, ClientError, TransportRequest, TransportResponse,
};

/// Transport replaying scripted responses and recording every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, String>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Queues an HTTP response.
    pub fn respond(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .expect("script lock should work")
            .push_back(Ok(TransportResponse {
                status,
                body: body.to_string(),
            }));
    }

    /// Queues a network-level failure.
    pub fn fail(&self, detail: &str) {
        self.responses
            .lock()
            .expect("script lock should work")
            .push_back(Err(detail.to_string()));
    }

    /// Returns recorded requests.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("request lock should work").clone()
    }
}

impl AnalysisTransport for ScriptedTransport {
    fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ClientError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request);
        self.responses
            .lock()
            .expect("script lock should work")
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response".to_string()))
            .map_err(ClientError::Transport)
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

/// Successful image analysis body.
#[allow(dead_code)]
pub const IMAGE_SUCCESS_BODY: &str = r#"{
    "success": true,
    "result": {
        "fake_probability": 0.82,
        "real_probability": 0.18,
        "is_deepfake": true,
        "confidence": 0.91,
        "face_detected": true,
        "bounding_box": [10, 20, 110, 140]
    },
    "visualization": "data:image/png;base64,AAAA"
}"#;
