#![warn(missing_docs)]
//! # deepfake-lens-analysis-contract
//!
//! ## Purpose
//! Defines the JSON contract of the media-analysis backend.
//!
//! ## Responsibilities
//! - Model the health, image, video, and frame endpoint payloads.
//! - Parse raw response bodies into owned structs.
//! - Name each remote operation with its path and fallback failure message.
//!
//! ## Data flow
//! Raw HTTP body -> [`parse_image_response`] / [`parse_video_response`] /
//! [`parse_health_response`] -> [`AnalysisPayload`] -> result normalization.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned so they can cross the worker channel back to the
//! session owner without borrowing transient network buffers.
//!
//! ## Error model
//! Invalid JSON or missing mandatory fields return [`AnalysisContractError`].
//! A well-formed `success: false` body is not an error at this layer.

use std::fmt;

use deepfake_lens_core::AnalysisMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback message for failed image analysis.
pub const IMAGE_ANALYSIS_FAILED: &str = "image analysis failed";
/// Fallback message for failed video analysis.
pub const VIDEO_ANALYSIS_FAILED: &str = "video analysis failed";
/// Fallback message for failed single-frame analysis.
pub const FRAME_ANALYSIS_FAILED: &str = "frame analysis failed";
/// Fallback message when the backend cannot be reached.
pub const BACKEND_UNREACHABLE: &str = "backend unreachable";

/// One remote call exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisOperation {
    /// `GET health`.
    Health,
    /// `POST analyze/image` (multipart).
    Image,
    /// `POST analyze/video` (multipart with sampling fields).
    Video,
    /// `POST analyze/frame` (JSON base64 body).
    Frame,
}

impl AnalysisOperation {
    /// Path relative to the configured API base.
    pub fn path(self) -> &'static str {
        match self {
            AnalysisOperation::Health => "health",
            AnalysisOperation::Image => "analyze/image",
            AnalysisOperation::Video => "analyze/video",
            AnalysisOperation::Frame => "analyze/frame",
        }
    }

    /// Message used when the backend reports a failure without details.
    pub fn failure_fallback(self) -> &'static str {
        match self {
            AnalysisOperation::Health => BACKEND_UNREACHABLE,
            AnalysisOperation::Image => IMAGE_ANALYSIS_FAILED,
            AnalysisOperation::Video => VIDEO_ANALYSIS_FAILED,
            AnalysisOperation::Frame => FRAME_ANALYSIS_FAILED,
        }
    }

    /// Operation used to analyze a file of the given mode.
    pub fn for_mode(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Image => AnalysisOperation::Image,
            AnalysisMode::Video => AnalysisOperation::Video,
        }
    }
}

impl fmt::Display for AnalysisOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Backend liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Free-form status, usually `healthy`.
    pub status: String,
    /// Whether the classification model is loaded.
    pub model_loaded: bool,
    /// Inference device (for example `cpu` or `cuda`).
    pub device: String,
}

/// Classification of one still image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Probability the image is manipulated, in [0, 1].
    pub fake_probability: f64,
    /// Probability the image is authentic, in [0, 1].
    pub real_probability: f64,
    /// Backend verdict.
    pub is_deepfake: bool,
    /// Backend confidence in [0, 1].
    pub confidence: f64,
    /// Whether a face was found; passed through untouched.
    #[serde(default)]
    pub face_detected: Option<bool>,
    /// Face box in backend coordinates; passed through untouched.
    #[serde(default)]
    pub bounding_box: Option<Vec<f64>>,
}

/// Response of `analyze/image` and `analyze/frame`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysisResponse {
    /// Whether the backend produced a result.
    pub success: bool,
    /// Backend failure message.
    #[serde(default)]
    pub error: Option<String>,
    /// Classification, present on success.
    #[serde(default)]
    pub result: Option<ImageResult>,
    /// Annotated image reference (data URL), also sent on some failures.
    #[serde(default)]
    pub visualization: Option<String>,
}

/// Aggregate classification of a sampled video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    /// Mean fake probability over analyzed frames.
    pub avg_fake_probability: f64,
    /// Mean real probability over analyzed frames.
    pub avg_real_probability: f64,
    /// Standard deviation of per-frame fake probability.
    pub std_deviation: f64,
    /// Backend verdict.
    pub is_deepfake: bool,
    /// Backend confidence in [0, 1].
    pub confidence: f64,
    /// Frames the model actually classified.
    pub frames_analyzed: u64,
    /// Frames in the source video.
    pub total_frames: u64,
    /// Source frame rate.
    pub fps: f64,
    /// Source duration in seconds.
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
}

/// Per-frame classification detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Frame index in the source video.
    pub frame_index: u64,
    /// Frame timestamp in seconds.
    pub timestamp: f64,
    /// Fake probability for this frame.
    pub fake_probability: f64,
    /// Real probability for this frame.
    pub real_probability: f64,
    /// Per-frame verdict.
    pub is_deepfake: bool,
    /// Whether a face was found in this frame.
    #[serde(default)]
    pub face_detected: bool,
    /// Face box in frame coordinates.
    #[serde(default)]
    pub bounding_box: Option<Vec<f64>>,
}

/// Representative frame chosen by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    /// Frame index in the source video.
    pub frame_index: u64,
    /// Annotated frame reference (data URL).
    #[serde(rename = "visualization")]
    pub visualization_ref: String,
    /// Fake probability for this frame.
    pub fake_probability: f64,
}

/// Three parallel series describing the per-frame probability trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Frame indices.
    #[serde(default)]
    pub indices: Vec<u64>,
    /// Fake probabilities.
    #[serde(default)]
    pub probabilities: Vec<f64>,
    /// Timestamps in seconds.
    #[serde(default)]
    pub timestamps: Vec<f64>,
}

/// Response of `analyze/video`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysisResponse {
    /// Whether the backend produced a result.
    pub success: bool,
    /// Backend failure message.
    #[serde(default)]
    pub error: Option<String>,
    /// Aggregate classification, present on success.
    #[serde(default)]
    pub result: Option<VideoResult>,
    /// Per-frame details.
    #[serde(default)]
    pub frame_analysis: Option<Vec<FrameAnalysis>>,
    /// Representative frames.
    #[serde(default)]
    pub key_frames: Option<Vec<KeyFrame>>,
    /// Probability trace.
    #[serde(default)]
    pub timeline: Option<Timeline>,
}

/// JSON body of `analyze/frame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameAnalysisRequest {
    /// Base64-encoded image bytes.
    pub image: String,
}

/// Response of one analysis call, tagged by media kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPayload {
    /// Image or frame response.
    Image(ImageAnalysisResponse),
    /// Video response.
    Video(VideoAnalysisResponse),
}

impl AnalysisPayload {
    /// Mode this payload belongs to.
    pub fn mode(&self) -> AnalysisMode {
        match self {
            AnalysisPayload::Image(_) => AnalysisMode::Image,
            AnalysisPayload::Video(_) => AnalysisMode::Video,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Parses a health response.
///
/// # Errors
/// Returns [`AnalysisContractError::Decode`] for invalid JSON and
/// [`AnalysisContractError::InvalidContract`] for a blank status.
pub fn parse_health_response(raw: &str) -> Result<HealthCheckResponse, AnalysisContractError> {
    let parsed: HealthCheckResponse = serde_json::from_str(raw)?;
    if parsed.status.trim().is_empty() {
        return Err(AnalysisContractError::InvalidContract(
            "status is empty".to_string(),
        ));
    }

    Ok(parsed)
}

/// Parses an image or frame analysis response.
///
/// # Errors
/// Returns [`AnalysisContractError::Decode`] when the body does not match the
/// response shape.
pub fn parse_image_response(raw: &str) -> Result<ImageAnalysisResponse, AnalysisContractError> {
    Ok(serde_json::from_str(raw)?)
}

/// Parses a video analysis response.
///
/// # Errors
/// Returns [`AnalysisContractError::Decode`] when the body does not match the
/// response shape.
pub fn parse_video_response(raw: &str) -> Result<VideoAnalysisResponse, AnalysisContractError> {
    Ok(serde_json::from_str(raw)?)
}

/// Extracts a non-blank `error` field from an error body, if any.
pub fn extract_error_message(raw: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(raw)
        .ok()
        .and_then(|body| body.error)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

/// Analysis contract errors.
#[derive(Debug, Error)]
pub enum AnalysisContractError {
    /// JSON decode failure.
    #[error("analysis decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("analysis contract violation: {0}")]
    InvalidContract(String),
}
