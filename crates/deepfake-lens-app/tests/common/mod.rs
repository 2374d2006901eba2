//! Shared fixtures for app integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use deepfake_lens_app::AnalysisController;
use deepfake_lens_client::{
    AnalysisClient, AnalysisTransport, ClientError, TransportRequest, TransportResponse,
    VideoSampling,
};
use deepfake_lens_core::MediaFile;

/// Successful image body with a confident deepfake verdict.
#[allow(dead_code)]
pub const DEEPFAKE_IMAGE_BODY: &str = r#"{
    "success": true,
    "result": {
        "fake_probability": 0.93,
        "real_probability": 0.07,
        "is_deepfake": true,
        "confidence": 0.93,
        "face_detected": true
    }
}"#;

/// Successful video body with two key frames.
#[allow(dead_code)]
pub const VIDEO_BODY: &str = r#"{
    "success": true,
    "result": {
        "avg_fake_probability": 0.12, "avg_real_probability": 0.88,
        "std_deviation": 0.25, "is_deepfake": false, "confidence": 0.88,
        "frames_analyzed": 12, "total_frames": 1800, "fps": 30.0, "duration": 60.0
    },
    "key_frames": [
        {"frame_index": 150, "visualization": "data:image/png;base64,K0", "fake_probability": 0.08},
        {"frame_index": 900, "visualization": "data:image/png;base64,K1", "fake_probability": 0.55}
    ],
    "timeline": {"indices": [150, 900], "timestamps": [5.0, 30.0], "probabilities": [0.08, 0.55]}
}"#;

/// Transport that answers every call with the same response, optionally
/// holding each call until the test releases it.
pub struct GatedTransport {
    response: Result<TransportResponse, String>,
    gate: Option<Mutex<Receiver<()>>>,
    opener: Mutex<Option<Sender<()>>>,
    calls: AtomicUsize,
    finished: AtomicUsize,
}

#[allow(dead_code)]
impl GatedTransport {
    /// Answers immediately.
    pub fn open(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
            gate: None,
            opener: Mutex::new(None),
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        })
    }

    /// Fails every call with a network error.
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            response: Err("connection refused".to_string()),
            gate: None,
            opener: Mutex::new(None),
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        })
    }

    /// Holds each call until [`Self::release`] is called once for it.
    pub fn gated(status: u16, body: &str) -> Arc<Self> {
        let (opener, gate) = mpsc::channel();
        Arc::new(Self {
            response: Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
            gate: Some(Mutex::new(gate)),
            opener: Mutex::new(Some(opener)),
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        })
    }

    /// Lets one held call proceed.
    pub fn release(&self) {
        if let Some(opener) = self.opener.lock().expect("opener lock should work").as_ref() {
            opener.send(()).expect("gate should be open");
        }
    }

    /// Number of calls that reached the transport.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Blocks until `count` calls have returned, panicking after 5 seconds.
    pub fn wait_finished(&self, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.finished.load(Ordering::SeqCst) < count {
            assert!(Instant::now() < deadline, "transport calls did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }
        // Leave time for the worker to post its event.
        std::thread::sleep(Duration::from_millis(50));
    }
}

impl AnalysisTransport for GatedTransport {
    fn execute(&self, _request: TransportRequest) -> Result<TransportResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.lock()
                .expect("gate lock should work")
                .recv()
                .map_err(|_| ClientError::Transport("gate dropped".to_string()))?;
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(ClientError::Transport)
    }
}

/// Builds a controller over `transport`.
#[allow(dead_code)]
pub fn controller_with(transport: Arc<GatedTransport>) -> AnalysisController {
    let client = AnalysisClient::new("http://detector.test/api", transport)
        .expect("fixture base url should be valid");
    AnalysisController::new(client, VideoSampling::default())
}

/// Small in-memory JPEG-named file.
#[allow(dead_code)]
pub fn photo() -> MediaFile {
    MediaFile::from_bytes("suspect.jpeg", vec![0_u8; 512])
}

/// Small in-memory MOV-named file.
#[allow(dead_code)]
pub fn clip() -> MediaFile {
    MediaFile::from_bytes("clip.mov", vec![0_u8; 2048])
}
