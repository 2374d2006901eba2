#![warn(missing_docs)]
//! # deepfake-lens-client
//!
//! ## Purpose
//! Boundary adapter for the media-analysis backend.
//!
//! ## Responsibilities
//! - Validate the configured API base URL.
//! - Build exactly one request per operation (health, image, video, frame).
//! - Turn HTTP status codes and error bodies into one [`ClientError`].
//!
//! ## Data flow
//! Caller -> [`AnalysisClient`] builds a [`TransportRequest`] ->
//! [`AnalysisTransport::execute`] -> [`TransportResponse`] -> contract parsing
//! -> typed response or [`ClientError`].
//!
//! ## Ownership and lifetimes
//! The client owns its base URL and shares the transport through `Arc`, so a
//! clone can be moved onto a worker thread for each request.
//!
//! ## Error model
//! No operation retries. Every failure is returned to the caller, and
//! [`ClientError::user_message`] yields the single human-readable message to
//! display for it.
//!
//! ## Example
//! ```rust
//! use deepfake_lens_client::validate_api_base;
//!
//! let base = validate_api_base("http://127.0.0.1:5000/api").unwrap();
//! assert_eq!(base.as_str(), "http://127.0.0.1:5000/api/");
//! assert!(validate_api_base("ftp://example.test/api").is_err());
//! ```

mod http;

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use deepfake_lens_analysis_contract::{
    AnalysisOperation, AnalysisPayload, BACKEND_UNREACHABLE, FrameAnalysisRequest,
    HealthCheckResponse, ImageAnalysisResponse, VideoAnalysisResponse, extract_error_message,
    parse_health_response, parse_image_response, parse_video_response,
};
use deepfake_lens_core::{AnalysisMode, CoreError, MediaFile};
use log::{debug, warn};
use thiserror::Error;
use url::Url;

pub use http::HttpTransport;

/// Default API base used by the reference backend.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000/api";

/// Default video sampling stride.
pub const DEFAULT_EVERY_N: u32 = 10;

/// Default cap on sampled video frames.
pub const DEFAULT_MAX_FRAMES: u32 = 30;

/// Sampling controls forwarded verbatim to `analyze/video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSampling {
    every_n: u32,
    max_frames: u32,
}

impl VideoSampling {
    /// Creates sampling controls.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidSampling`] when either value is zero.
    pub fn new(every_n: u32, max_frames: u32) -> Result<Self, ClientError> {
        if every_n == 0 {
            return Err(ClientError::InvalidSampling(
                "every_n must be positive".to_string(),
            ));
        }
        if max_frames == 0 {
            return Err(ClientError::InvalidSampling(
                "max_frames must be positive".to_string(),
            ));
        }

        Ok(Self {
            every_n,
            max_frames,
        })
    }

    /// Analyze every n-th frame.
    pub fn every_n(&self) -> u32 {
        self.every_n
    }

    /// Upper bound on analyzed frames.
    pub fn max_frames(&self) -> u32 {
        self.max_frames
    }
}

impl Default for VideoSampling {
    fn default() -> Self {
        Self {
            every_n: DEFAULT_EVERY_N,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

/// HTTP verb used by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    /// Plain text value.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File upload part.
    File {
        /// Field name.
        name: String,
        /// Original file name.
        file_name: String,
        /// Mime type of the part.
        mime: String,
        /// File contents.
        bytes: Vec<u8>,
    },
}

/// Request body variants used by the backend contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// `multipart/form-data` fields in order.
    Multipart(Vec<FormField>),
    /// Serialized JSON document.
    Json(String),
}

/// Fully built request handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Operation being performed.
    pub operation: AnalysisOperation,
    /// HTTP verb.
    pub method: HttpMethod,
    /// Absolute endpoint URL.
    pub url: Url,
    /// Request body.
    pub body: RequestBody,
}

/// Raw response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract transport performing one request/response exchange.
pub trait AnalysisTransport: Send + Sync {
    /// Sends a request and returns the raw response.
    ///
    /// Implementations return [`ClientError::Transport`] when no HTTP response
    /// was received at all.
    fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ClientError>;
}

/// Client for the media-analysis backend.
#[derive(Clone)]
pub struct AnalysisClient {
    base_url: Url,
    transport: Arc<dyn AnalysisTransport>,
}

impl AnalysisClient {
    /// Creates a client with a validated base URL.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidEndpoint`] when the URL does not parse or
    /// does not use `http`/`https`.
    pub fn new(base_url: &str, transport: Arc<dyn AnalysisTransport>) -> Result<Self, ClientError> {
        let base_url = validate_api_base(base_url)?;
        Ok(Self {
            base_url,
            transport,
        })
    }

    /// Returns the normalized base URL (always ending with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the absolute URL of an operation.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidEndpoint`] when the path cannot be joined.
    pub fn endpoint(&self, operation: AnalysisOperation) -> Result<Url, ClientError> {
        self.base_url
            .join(operation.path())
            .map_err(|error| ClientError::InvalidEndpoint(format!("{operation}: {error}")))
    }

    /// Reports whether the backend and its model are available.
    ///
    /// # Errors
    /// Returns [`ClientError`] for transport, status, or payload failures.
    pub fn check_health(&self) -> Result<HealthCheckResponse, ClientError> {
        let body = self.exchange(
            AnalysisOperation::Health,
            HttpMethod::Get,
            RequestBody::Empty,
        )?;
        parse_health_response(&body)
            .map_err(|error| decode_failure(AnalysisOperation::Health, &body, error))
    }

    /// Uploads one image for classification.
    ///
    /// # Errors
    /// Returns [`ClientError::File`] when the file cannot be read and other
    /// [`ClientError`] variants for request failures.
    pub fn analyze_image(&self, file: &MediaFile) -> Result<ImageAnalysisResponse, ClientError> {
        let fields = vec![file_field(file)?];
        let body = self.exchange(
            AnalysisOperation::Image,
            HttpMethod::Post,
            RequestBody::Multipart(fields),
        )?;
        parse_image_response(&body)
            .map_err(|error| decode_failure(AnalysisOperation::Image, &body, error))
    }

    /// Uploads one video with sampling controls.
    ///
    /// # Errors
    /// Returns [`ClientError::File`] when the file cannot be read and other
    /// [`ClientError`] variants for request failures.
    pub fn analyze_video(
        &self,
        file: &MediaFile,
        sampling: VideoSampling,
    ) -> Result<VideoAnalysisResponse, ClientError> {
        let fields = vec![
            file_field(file)?,
            FormField::Text {
                name: "every_n".to_string(),
                value: sampling.every_n().to_string(),
            },
            FormField::Text {
                name: "max_frames".to_string(),
                value: sampling.max_frames().to_string(),
            },
        ];
        let body = self.exchange(
            AnalysisOperation::Video,
            HttpMethod::Post,
            RequestBody::Multipart(fields),
        )?;
        parse_video_response(&body)
            .map_err(|error| decode_failure(AnalysisOperation::Video, &body, error))
    }

    /// Sends one encoded frame as base64 JSON for an ad-hoc check.
    ///
    /// # Errors
    /// Returns [`ClientError`] for request failures.
    pub fn analyze_frame(&self, image_bytes: &[u8]) -> Result<ImageAnalysisResponse, ClientError> {
        let request = FrameAnalysisRequest {
            image: STANDARD.encode(image_bytes),
        };
        let json = serde_json::to_string(&request).map_err(|error| ClientError::Malformed {
            operation: AnalysisOperation::Frame,
            detail: error.to_string(),
        })?;
        let body = self.exchange(
            AnalysisOperation::Frame,
            HttpMethod::Post,
            RequestBody::Json(json),
        )?;
        parse_image_response(&body)
            .map_err(|error| decode_failure(AnalysisOperation::Frame, &body, error))
    }

    /// Runs the analysis operation matching `mode`.
    ///
    /// # Errors
    /// Propagates the errors of [`Self::analyze_image`] / [`Self::analyze_video`].
    pub fn analyze(
        &self,
        mode: AnalysisMode,
        file: &MediaFile,
        sampling: VideoSampling,
    ) -> Result<AnalysisPayload, ClientError> {
        match mode {
            AnalysisMode::Image => self.analyze_image(file).map(AnalysisPayload::Image),
            AnalysisMode::Video => self.analyze_video(file, sampling).map(AnalysisPayload::Video),
        }
    }

    fn exchange(
        &self,
        operation: AnalysisOperation,
        method: HttpMethod,
        body: RequestBody,
    ) -> Result<String, ClientError> {
        let url = self.endpoint(operation)?;
        debug!("client | request | operation={operation} url={url}");

        let response = self
            .transport
            .execute(TransportRequest {
                operation,
                method,
                url,
                body,
            })
            .inspect_err(|error| {
                warn!("client | transport_failed | operation={operation} error={error}");
            })?;

        if !response.is_success() {
            let message = extract_error_message(&response.body)
                .unwrap_or_else(|| operation.failure_fallback().to_string());
            warn!(
                "client | remote_failed | operation={operation} status={} message={message}",
                response.status
            );
            return Err(ClientError::Remote {
                operation,
                status: response.status,
                message,
            });
        }

        debug!(
            "client | response | operation={operation} status={} bytes={}",
            response.status,
            response.body.len()
        );
        Ok(response.body)
    }
}

/// Parses and normalizes an API base URL so operation paths join below it.
///
/// # Errors
/// Returns [`ClientError::InvalidEndpoint`] for unparsable URLs, non-HTTP
/// schemes, or URLs carrying a query or fragment.
pub fn validate_api_base(raw: &str) -> Result<Url, ClientError> {
    let mut parsed = Url::parse(raw.trim())
        .map_err(|error| ClientError::InvalidEndpoint(format!("invalid api url: {error}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ClientError::InvalidEndpoint(
            "api url must use http or https".to_string(),
        ));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ClientError::InvalidEndpoint(
            "api url must not carry a query or fragment".to_string(),
        ));
    }

    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }

    Ok(parsed)
}

fn file_field(file: &MediaFile) -> Result<FormField, ClientError> {
    Ok(FormField::File {
        name: "file".to_string(),
        file_name: file.descriptor.name.clone(),
        mime: file.descriptor.mime.clone(),
        bytes: file.read_bytes()?,
    })
}

fn decode_failure(
    operation: AnalysisOperation,
    body: &str,
    error: deepfake_lens_analysis_contract::AnalysisContractError,
) -> ClientError {
    if serde_json::from_str::<serde_json::Value>(body).is_err() {
        warn!("client | non_json_body | operation={operation}");
        return ClientError::Transport(format!("{operation} returned a non-JSON body"));
    }

    warn!("client | malformed_payload | operation={operation} error={error}");
    ClientError::Malformed {
        operation,
        detail: error.to_string(),
    }
}

/// Errors produced by the analysis client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL violates the endpoint policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Video sampling controls are not positive.
    #[error("invalid video sampling: {0}")]
    InvalidSampling(String),
    /// Selected file could not be read.
    #[error("file error: {0}")]
    File(#[from] CoreError),
    /// No usable HTTP response (network failure or non-JSON body).
    #[error("transport failure: {0}")]
    Transport(String),
    /// Non-2xx response.
    #[error("{operation} failed with status {status}: {message}")]
    Remote {
        /// Operation that failed.
        operation: AnalysisOperation,
        /// HTTP status code.
        status: u16,
        /// Remote message or operation fallback.
        message: String,
    },
    /// JSON body that does not match the contract.
    #[error("{operation} returned a malformed payload: {detail}")]
    Malformed {
        /// Operation that failed.
        operation: AnalysisOperation,
        /// Decoder detail, for logs only.
        detail: String,
    },
}

impl ClientError {
    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) => BACKEND_UNREACHABLE.to_string(),
            ClientError::Remote { message, .. } => message.clone(),
            ClientError::Malformed { operation, .. } => operation.failure_fallback().to_string(),
            ClientError::File(error) => error.to_string(),
            ClientError::InvalidEndpoint(_) | ClientError::InvalidSampling(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for endpoint policy and sampling guards.

    use super::*;

    #[test]
    fn api_base_gets_trailing_slash_and_joins_operation_paths() {
        let base = validate_api_base("https://detector.example.test/api").unwrap();
        assert_eq!(
            base.join(AnalysisOperation::Video.path()).unwrap().as_str(),
            "https://detector.example.test/api/analyze/video"
        );
    }

    #[test]
    fn api_base_rejects_non_http_and_queries() {
        assert!(validate_api_base("not a url").is_err());
        assert!(validate_api_base("file:///tmp/api").is_err());
        assert!(validate_api_base("http://localhost:5000/api?x=1").is_err());
    }

    #[test]
    fn sampling_requires_positive_values() {
        assert!(VideoSampling::new(0, 30).is_err());
        assert!(VideoSampling::new(10, 0).is_err());
        let sampling = VideoSampling::new(5, 12).unwrap();
        assert_eq!((sampling.every_n(), sampling.max_frames()), (5, 12));
        assert_eq!(VideoSampling::default(), VideoSampling::new(10, 30).unwrap());
    }

    #[test]
    fn user_messages_follow_failure_family() {
        assert_eq!(
            ClientError::Transport("connection refused".to_string()).user_message(),
            "backend unreachable"
        );
        assert_eq!(
            ClientError::Malformed {
                operation: AnalysisOperation::Video,
                detail: "missing field".to_string(),
            }
            .user_message(),
            "video analysis failed"
        );
    }
}
