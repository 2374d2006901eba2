#![warn(missing_docs)]
//! # deepfake-lens-ui
//!
//! ## Purpose
//! Turns raw backend responses into the presentation model rendered by any
//! shell (terminal report, desktop window, web view).
//!
//! ## Responsibilities
//! - Normalize image and video responses into one tagged presentation.
//! - Bucket confidence and variability into descriptive labels.
//! - Build the timeline series and own key-frame carousel navigation.
//! - Project backend health and in-flight status into display text.
//!
//! ## Data flow
//! [`AnalysisPayload`] -> [`normalize`] -> [`AnalysisPresentation`] or
//! [`FailurePresentation`] -> session state -> renderer.
//!
//! ## Ownership and lifetimes
//! Normalization consumes the response so visualization references move into
//! the presentation without copies.
//!
//! ## Error model
//! A response without a usable result is not an error type here; it becomes
//! a [`FailurePresentation`] carrying the message to show. Navigation misuse
//! returns [`NavigationError`].

use deepfake_lens_analysis_contract::{
    AnalysisOperation, AnalysisPayload, FrameAnalysis, HealthCheckResponse,
    ImageAnalysisResponse, KeyFrame, Timeline, VideoAnalysisResponse,
};
use deepfake_lens_core::AnalysisStatus;
use thiserror::Error;

/// Probability at or above which a frame counts as manipulated.
pub const DETECTION_THRESHOLD: f64 = 0.5;

/// Binary classification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Content classified as manipulated.
    Deepfake,
    /// Content classified as authentic.
    Authentic,
}

impl Verdict {
    /// Maps the backend `is_deepfake` flag.
    pub fn from_flag(is_deepfake: bool) -> Self {
        if is_deepfake {
            Verdict::Deepfake
        } else {
            Verdict::Authentic
        }
    }

    /// Short label.
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Deepfake => "deepfake",
            Verdict::Authentic => "authentic",
        }
    }

    /// Returns `true` for [`Verdict::Deepfake`].
    pub fn is_deepfake(self) -> bool {
        self == Verdict::Deepfake
    }
}

/// Confidence tier. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceLevel {
    /// Below 0.5.
    Low,
    /// From 0.5.
    Medium,
    /// From 0.7.
    High,
    /// From 0.9.
    VeryHigh,
}

impl ConfidenceLevel {
    /// Buckets a confidence score.
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.9 {
            ConfidenceLevel::VeryHigh
        } else if confidence >= 0.7 {
            ConfidenceLevel::High
        } else if confidence >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Human-readable bucket.
    pub fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "very high",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

/// Spread of per-frame probabilities; descriptive only, never feeds the
/// verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variability {
    /// Standard deviation below 0.10.
    Consistent,
    /// Standard deviation below 0.20.
    MildlyVariable,
    /// Anything else.
    HighlyVariable,
}

impl Variability {
    /// Buckets a standard deviation.
    pub fn from_std_deviation(std_deviation: f64) -> Self {
        if std_deviation < 0.10 {
            Variability::Consistent
        } else if std_deviation < 0.20 {
            Variability::MildlyVariable
        } else {
            Variability::HighlyVariable
        }
    }

    /// Human-readable bucket.
    pub fn label(self) -> &'static str {
        match self {
            Variability::Consistent => "consistent",
            Variability::MildlyVariable => "mildly variable",
            Variability::HighlyVariable => "highly variable",
        }
    }
}

/// One labelled probability bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityBar {
    /// Bar caption.
    pub label: &'static str,
    /// Value in [0, 1].
    pub value: f64,
    /// Value rendered with [`format_percentage`].
    pub percentage: String,
    /// Whether this bar matches the verdict.
    pub highlighted: bool,
}

impl ProbabilityBar {
    fn new(label: &'static str, value: f64, highlighted: bool) -> Self {
        Self {
            label,
            value,
            percentage: format_percentage(value),
            highlighted,
        }
    }
}

/// Normalized still-image (or single-frame) result.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePresentation {
    /// Verdict.
    pub verdict: Verdict,
    /// Raw confidence score.
    pub confidence: f64,
    /// Confidence bucket.
    pub confidence_level: ConfidenceLevel,
    /// Fake probability.
    pub fake_probability: f64,
    /// Real probability.
    pub real_probability: f64,
    /// Face detection flag, passed through.
    pub face_detected: Option<bool>,
    /// Face box, passed through.
    pub bounding_box: Option<Vec<f64>>,
    /// Annotated image reference.
    pub visualization: Option<String>,
}

impl ImagePresentation {
    /// Headline shown above the bars.
    pub fn headline(&self) -> &'static str {
        match self.verdict {
            Verdict::Deepfake => "DEEPFAKE DETECTED",
            Verdict::Authentic => "CONTENT IS AUTHENTIC",
        }
    }

    /// Fake and real bars, in that order.
    pub fn bars(&self) -> [ProbabilityBar; 2] {
        let fake = self.verdict.is_deepfake();
        [
            ProbabilityBar::new("Deepfake", self.fake_probability, fake),
            ProbabilityBar::new("Authentic", self.real_probability, !fake),
        ]
    }
}

/// One point of the per-frame probability trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelinePoint {
    /// Frame index.
    pub frame: u64,
    /// Timestamp in seconds.
    pub time_seconds: f64,
    /// Fake probability.
    pub probability: f64,
}

/// Text for the four video stat cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStats {
    /// Average fake probability as a percentage.
    pub fake_percentage: String,
    /// `analyzed/total`.
    pub frames: String,
    /// `M:SS`.
    pub duration: String,
    /// `±` standard deviation as a percentage.
    pub deviation: String,
}

/// Normalized video result, including key-frame carousel state.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoPresentation {
    /// Verdict.
    pub verdict: Verdict,
    /// Raw confidence score.
    pub confidence: f64,
    /// Confidence bucket.
    pub confidence_level: ConfidenceLevel,
    /// Mean fake probability.
    pub avg_fake_probability: f64,
    /// Mean real probability.
    pub avg_real_probability: f64,
    /// Standard deviation of frame probabilities.
    pub std_deviation: f64,
    /// Variability bucket.
    pub variability: Variability,
    /// Frames classified.
    pub frames_analyzed: u64,
    /// Frames in the source.
    pub total_frames: u64,
    /// Source frame rate.
    pub fps: f64,
    /// Source duration in seconds.
    pub duration_seconds: f64,
    /// Ordered probability trace; empty when the backend sent none.
    pub timeline: Vec<TimelinePoint>,
    /// Representative frames in backend order.
    pub key_frames: Vec<KeyFrame>,
    /// Per-frame detail in backend order.
    pub frame_analysis: Vec<FrameAnalysis>,
    navigator: Option<KeyFrameNavigator>,
}

impl VideoPresentation {
    /// Headline shown above the stats.
    pub fn headline(&self) -> &'static str {
        match self.verdict {
            Verdict::Deepfake => "DEEPFAKE DETECTED",
            Verdict::Authentic => "VIDEO IS AUTHENTIC",
        }
    }

    /// Duration formatted as `M:SS`.
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_seconds)
    }

    /// Stat card text.
    pub fn stats(&self) -> VideoStats {
        VideoStats {
            fake_percentage: format_percentage(self.avg_fake_probability),
            frames: format!("{}/{}", self.frames_analyzed, self.total_frames),
            duration: self.duration_label(),
            deviation: format!("±{}", format_percentage(self.std_deviation)),
        }
    }

    /// Average fake and real bars, in that order.
    pub fn bars(&self) -> [ProbabilityBar; 2] {
        let fake = self.verdict.is_deepfake();
        [
            ProbabilityBar::new(
                "Average deepfake probability",
                self.avg_fake_probability,
                fake,
            ),
            ProbabilityBar::new(
                "Average authenticity probability",
                self.avg_real_probability,
                !fake,
            ),
        ]
    }

    /// Carousel state; `None` when there are no key frames.
    pub fn navigator(&self) -> Option<&KeyFrameNavigator> {
        self.navigator.as_ref()
    }

    /// Key frame under the carousel cursor.
    pub fn current_key_frame(&self) -> Option<&KeyFrame> {
        self.navigator
            .as_ref()
            .and_then(|navigator| self.key_frames.get(navigator.current()))
    }

    /// Steps the carousel forward with wraparound.
    ///
    /// # Errors
    /// Returns [`NavigationError::NoKeyFrames`] when the sequence is empty.
    pub fn next_key_frame(&mut self) -> Result<usize, NavigationError> {
        self.navigator_mut().map(KeyFrameNavigator::next)
    }

    /// Steps the carousel backward with wraparound.
    ///
    /// # Errors
    /// Returns [`NavigationError::NoKeyFrames`] when the sequence is empty.
    pub fn previous_key_frame(&mut self) -> Result<usize, NavigationError> {
        self.navigator_mut().map(KeyFrameNavigator::previous)
    }

    /// Moves the carousel to `index` without wraparound.
    ///
    /// # Errors
    /// Returns [`NavigationError`] for an empty sequence or out-of-range index.
    pub fn jump_to_key_frame(&mut self, index: usize) -> Result<usize, NavigationError> {
        self.navigator_mut()?.jump_to(index)
    }

    fn navigator_mut(&mut self) -> Result<&mut KeyFrameNavigator, NavigationError> {
        self.navigator.as_mut().ok_or(NavigationError::NoKeyFrames)
    }
}

/// Normalized successful result, tagged by media kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPresentation {
    /// Image or frame result.
    Image(ImagePresentation),
    /// Video result.
    Video(VideoPresentation),
}

/// Failure to render instead of a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailurePresentation {
    /// Remote message or operation fallback.
    pub message: String,
    /// Illustrative visualization sent alongside the failure, if any.
    pub visualization: Option<String>,
}

impl FailurePresentation {
    fn from_remote(error: Option<String>, operation: AnalysisOperation) -> Self {
        let message = error
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| operation.failure_fallback().to_string());
        Self {
            message,
            visualization: None,
        }
    }
}

/// Normalizes any analysis payload.
///
/// # Errors
/// Returns [`FailurePresentation`] when the backend reported failure or
/// omitted the result.
pub fn normalize(payload: AnalysisPayload) -> Result<AnalysisPresentation, FailurePresentation> {
    match payload {
        AnalysisPayload::Image(response) => {
            normalize_image(response).map(AnalysisPresentation::Image)
        }
        AnalysisPayload::Video(response) => {
            normalize_video(response).map(AnalysisPresentation::Video)
        }
    }
}

/// Normalizes an `analyze/image` response.
///
/// # Errors
/// Returns [`FailurePresentation`] for `success: false` or a missing result.
pub fn normalize_image(
    response: ImageAnalysisResponse,
) -> Result<ImagePresentation, FailurePresentation> {
    normalize_still(response, AnalysisOperation::Image)
}

/// Normalizes an `analyze/frame` response on the image path.
///
/// # Errors
/// Returns [`FailurePresentation`] for `success: false` or a missing result.
pub fn normalize_frame(
    response: ImageAnalysisResponse,
) -> Result<ImagePresentation, FailurePresentation> {
    normalize_still(response, AnalysisOperation::Frame)
}

fn normalize_still(
    response: ImageAnalysisResponse,
    operation: AnalysisOperation,
) -> Result<ImagePresentation, FailurePresentation> {
    let ImageAnalysisResponse {
        success,
        error,
        result,
        visualization,
    } = response;

    let Some(result) = result.filter(|_| success) else {
        let mut failure = FailurePresentation::from_remote(error, operation);
        failure.visualization = visualization;
        return Err(failure);
    };

    Ok(ImagePresentation {
        verdict: Verdict::from_flag(result.is_deepfake),
        confidence: result.confidence,
        confidence_level: ConfidenceLevel::from_score(result.confidence),
        fake_probability: result.fake_probability,
        real_probability: result.real_probability,
        face_detected: result.face_detected,
        bounding_box: result.bounding_box,
        visualization,
    })
}

/// Normalizes an `analyze/video` response.
///
/// # Errors
/// Returns [`FailurePresentation`] for `success: false` or a missing result.
pub fn normalize_video(
    response: VideoAnalysisResponse,
) -> Result<VideoPresentation, FailurePresentation> {
    let VideoAnalysisResponse {
        success,
        error,
        result,
        frame_analysis,
        key_frames,
        timeline,
    } = response;

    let Some(result) = result.filter(|_| success) else {
        return Err(FailurePresentation::from_remote(error, AnalysisOperation::Video));
    };

    let key_frames = key_frames.unwrap_or_default();
    let navigator = KeyFrameNavigator::new(key_frames.len());

    Ok(VideoPresentation {
        verdict: Verdict::from_flag(result.is_deepfake),
        confidence: result.confidence,
        confidence_level: ConfidenceLevel::from_score(result.confidence),
        avg_fake_probability: result.avg_fake_probability,
        avg_real_probability: result.avg_real_probability,
        std_deviation: result.std_deviation,
        variability: Variability::from_std_deviation(result.std_deviation),
        frames_analyzed: result.frames_analyzed,
        total_frames: result.total_frames,
        fps: result.fps,
        duration_seconds: result.duration_seconds,
        timeline: build_timeline(timeline.as_ref()),
        key_frames,
        frame_analysis: frame_analysis.unwrap_or_default(),
        navigator,
    })
}

/// Zips the three parallel timeline series index by index.
///
/// Series of unequal length are truncated to the shortest one.
pub fn build_timeline(timeline: Option<&Timeline>) -> Vec<TimelinePoint> {
    let Some(timeline) = timeline else {
        return Vec::new();
    };

    timeline
        .indices
        .iter()
        .zip(&timeline.timestamps)
        .zip(&timeline.probabilities)
        .map(|((&frame, &time_seconds), &probability)| TimelinePoint {
            frame,
            time_seconds,
            probability,
        })
        .collect()
}

/// Formats seconds as `M:SS` using floor semantics.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Formats a [0, 1] value as a percentage with one decimal.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Returns `true` when a frame probability reaches [`DETECTION_THRESHOLD`].
pub fn is_suspicious(fake_probability: f64) -> bool {
    fake_probability >= DETECTION_THRESHOLD
}

/// Cursor into a non-empty key-frame sequence.
///
/// Invariant: `current < len` and `len > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFrameNavigator {
    current: usize,
    len: usize,
}

impl KeyFrameNavigator {
    /// Creates a cursor at index 0, or `None` for an empty sequence.
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { current: 0, len })
    }

    /// Current index.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Sequence length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; empty sequences have no navigator.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Advances with wraparound and returns the new index.
    pub fn next(&mut self) -> usize {
        self.current = (self.current + 1) % self.len;
        self.current
    }

    /// Steps back with wraparound and returns the new index.
    pub fn previous(&mut self) -> usize {
        self.current = (self.current + self.len - 1) % self.len;
        self.current
    }

    /// Moves to `index`.
    ///
    /// # Errors
    /// Returns [`NavigationError::OutOfRange`] when `index >= len`.
    pub fn jump_to(&mut self, index: usize) -> Result<usize, NavigationError> {
        if index >= self.len {
            return Err(NavigationError::OutOfRange {
                index,
                len: self.len,
            });
        }

        self.current = index;
        Ok(self.current)
    }

    /// One-based position label such as `2 / 5`.
    pub fn position_label(&self) -> String {
        format!("{} / {}", self.current + 1, self.len)
    }
}

/// Key-frame navigation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// Current result has no key frames (or is not a video result).
    #[error("no key frames to navigate")]
    NoKeyFrames,
    /// Requested index is outside the sequence.
    #[error("key frame {index} is out of range (0..{len})")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Sequence length.
        len: usize,
    },
}

/// Passive backend indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// Backend answered and the model is loaded.
    Ready {
        /// Inference device.
        device: String,
    },
    /// Backend answered but the model is not loaded.
    ModelNotLoaded,
    /// Health check failed.
    Unreachable,
}

impl BackendStatus {
    /// Projects a health check outcome; `None` means the check failed.
    pub fn from_health(health: Option<&HealthCheckResponse>) -> Self {
        match health {
            Some(health) if health.model_loaded => BackendStatus::Ready {
                device: health.device.clone(),
            },
            Some(_) => BackendStatus::ModelNotLoaded,
            None => BackendStatus::Unreachable,
        }
    }

    /// Status line text.
    pub fn label(&self) -> String {
        match self {
            BackendStatus::Ready { device } => format!("model ready ({device})"),
            BackendStatus::ModelNotLoaded => "model not loaded".to_string(),
            BackendStatus::Unreachable => "backend unreachable".to_string(),
        }
    }
}

/// Text shown while a request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingBanner {
    /// Upper-case stage title.
    pub title: &'static str,
    /// Stage explanation.
    pub subtitle: &'static str,
}

/// Returns the banner for in-flight statuses, `None` otherwise.
pub fn loading_banner(status: AnalysisStatus) -> Option<LoadingBanner> {
    match status {
        AnalysisStatus::Uploading => Some(LoadingBanner {
            title: "UPLOADING",
            subtitle: "Sending data to the server...",
        }),
        AnalysisStatus::Analyzing => Some(LoadingBanner {
            title: "ANALYZING",
            subtitle: "Model ensemble is processing the data...",
        }),
        _ => None,
    }
}
