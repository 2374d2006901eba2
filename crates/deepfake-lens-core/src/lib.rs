#![warn(missing_docs)]
//! # deepfake-lens-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `deepfake-lens` workspace.
//!
//! ## Responsibilities
//! - Represent analysis modes and the session lifecycle status.
//! - Describe candidate media files and where their bytes live.
//! - Validate a candidate file against mode-specific format and size limits.
//!
//! ## Data flow
//! The shell builds a [`MediaFile`] from a path or buffer, the workflow runs
//! [`validate_file`] on its [`FileDescriptor`], and the client later calls
//! [`MediaFile::read_bytes`] when the upload is sent.
//!
//! ## Ownership and lifetimes
//! In-memory sources are held in `Arc<[u8]>` so request tickets can clone a
//! selected file without copying its contents.
//!
//! ## Error model
//! Format and size rejections are [`ValidationError`] values meant for local
//! feedback next to the file picker. I/O problems are [`CoreError`].
//!
//! ## Example
//! ```rust
//! use deepfake_lens_core::{AnalysisMode, FileDescriptor, validate_file};
//!
//! let photo = FileDescriptor::new("portrait.JPG", 2 * 1024 * 1024);
//! assert!(validate_file(AnalysisMode::Image, &photo).is_ok());
//! assert!(validate_file(AnalysisMode::Video, &photo).is_err());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bytes per MiB, used for all size ceilings.
pub const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Size ceiling for image uploads (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * BYTES_PER_MIB;

/// Size ceiling for video uploads (100 MiB).
pub const MAX_VIDEO_BYTES: u64 = 100 * BYTES_PER_MIB;

/// Extensions accepted in image mode.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Extensions accepted in video mode.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "webm", "mkv"];

const FALLBACK_MIME: &str = "application/octet-stream";

/// Media kind selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Single still image.
    #[default]
    Image,
    /// Video clip sampled frame by frame.
    Video,
}

impl AnalysisMode {
    /// Returns the lowercase mode name.
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::Image => "image",
            AnalysisMode::Video => "video",
        }
    }

    /// Returns the extension whitelist for this mode.
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            AnalysisMode::Image => IMAGE_EXTENSIONS,
            AnalysisMode::Video => VIDEO_EXTENSIONS,
        }
    }

    /// Returns the inclusive upload size ceiling in bytes.
    pub fn max_file_size_bytes(self) -> u64 {
        match self {
            AnalysisMode::Image => MAX_IMAGE_BYTES,
            AnalysisMode::Video => MAX_VIDEO_BYTES,
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(AnalysisMode::Image),
            "video" => Ok(AnalysisMode::Video),
            other => Err(CoreError::UnknownMode(other.to_string())),
        }
    }
}

/// Lifecycle status of one analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Nothing selected yet.
    #[default]
    Idle,
    /// A validated file is waiting for analysis.
    FileSelected,
    /// The request is being sent.
    Uploading,
    /// The request was accepted and the result is pending.
    Analyzing,
    /// A normalized result is available.
    Complete,
    /// The last attempt failed.
    Error,
}

impl AnalysisStatus {
    /// Returns `true` while a request is outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(self, AnalysisStatus::Uploading | AnalysisStatus::Analyzing)
    }
}

/// Name, size, and mime type of a candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// File name including extension, without directories.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Mime type derived from the extension.
    pub mime: String,
}

impl FileDescriptor {
    /// Builds a descriptor and derives the mime type from the name.
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        let name = name.into();
        let mime = mime_for_extension(&file_extension(&name)).to_string();
        Self {
            name,
            size_bytes,
            mime,
        }
    }

    /// Returns the lowercase extension of this file.
    pub fn extension(&self) -> String {
        file_extension(&self.name)
    }
}

/// Location of a file's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Read lazily from disk at upload time.
    Path(PathBuf),
    /// Already loaded in memory.
    Memory(Arc<[u8]>),
}

/// A candidate file plus the handle used to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Name/size/mime used for validation and multipart metadata.
    pub descriptor: FileDescriptor,
    /// Where the bytes come from.
    pub source: MediaSource,
}

impl MediaFile {
    /// Describes a file on disk using its metadata size.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingFileName`] when the path has no final
    /// component and [`CoreError::Io`] when metadata cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| CoreError::MissingFileName(path.display().to_string()))?;
        let metadata = std::fs::metadata(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self {
            descriptor: FileDescriptor::new(name, metadata.len()),
            source: MediaSource::Path(path.to_path_buf()),
        })
    }

    /// Wraps an in-memory buffer under the given file name.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            descriptor: FileDescriptor::new(name, bytes.len() as u64),
            source: MediaSource::Memory(bytes),
        }
    }

    /// Returns the file name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Loads the file contents.
    ///
    /// # Errors
    /// Returns [`CoreError::Io`] when a path-backed file cannot be read and
    /// [`CoreError::SizeChanged`] when its length no longer matches the
    /// validated descriptor.
    pub fn read_bytes(&self) -> Result<Vec<u8>, CoreError> {
        match &self.source {
            MediaSource::Path(path) => {
                let bytes = std::fs::read(path).map_err(|source| CoreError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                let actual_bytes = bytes.len() as u64;
                if actual_bytes != self.descriptor.size_bytes {
                    return Err(CoreError::SizeChanged {
                        path: path.display().to_string(),
                        expected_bytes: self.descriptor.size_bytes,
                        actual_bytes,
                    });
                }
                Ok(bytes)
            }
            MediaSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// Returns the lowercase substring after the last `.`, or `""` when the name
/// has no dot.
pub fn file_extension(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Maps a lowercase extension to the mime type sent with uploads.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => FALLBACK_MIME,
    }
}

/// Checks a candidate file against the rules of `mode`.
///
/// The extension is checked first and the first failing check is returned.
/// The size ceiling is inclusive.
///
/// # Errors
/// Returns [`ValidationError::UnsupportedFormat`] for extensions outside the
/// mode whitelist and [`ValidationError::FileTooLarge`] above the ceiling.
pub fn validate_file(mode: AnalysisMode, file: &FileDescriptor) -> Result<(), ValidationError> {
    let extension = file.extension();
    let allowed = mode.allowed_extensions();
    if !allowed.contains(&extension.as_str()) {
        return Err(ValidationError::UnsupportedFormat {
            mode,
            extension,
            allowed,
        });
    }

    let limit_bytes = mode.max_file_size_bytes();
    if file.size_bytes > limit_bytes {
        return Err(ValidationError::FileTooLarge {
            size_bytes: file.size_bytes,
            limit_bytes,
        });
    }

    Ok(())
}

/// Renders a byte ceiling in MB, dropping the decimal for whole values.
pub fn format_limit_mb(limit_bytes: u64) -> String {
    let megabytes = limit_bytes as f64 / BYTES_PER_MIB as f64;
    if megabytes.fract() == 0.0 {
        format!("{megabytes:.0}")
    } else {
        format!("{megabytes:.1}")
    }
}

fn join_allowed(allowed: &[&str]) -> String {
    allowed.join(", ")
}

fn describe_limit(limit_bytes: &u64) -> String {
    format_limit_mb(*limit_bytes)
}

/// Local rejection of a candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Extension is not in the mode whitelist.
    #[error("unsupported format. Allowed: {}", join_allowed(.allowed))]
    UnsupportedFormat {
        /// Mode the file was checked against.
        mode: AnalysisMode,
        /// Lowercase extension found on the file (may be empty).
        extension: String,
        /// Whitelist for `mode`.
        allowed: &'static [&'static str],
    },
    /// File exceeds the mode size ceiling.
    #[error("file is too large. Maximum: {}MB", describe_limit(.limit_bytes))]
    FileTooLarge {
        /// Actual file size.
        size_bytes: u64,
        /// Inclusive ceiling for the mode.
        limit_bytes: u64,
    },
}

/// Error type for file access and parsing of core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Path has no file name component.
    #[error("path has no file name: {0}")]
    MissingFileName(String),
    /// Filesystem access failed.
    #[error("unable to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// File length differs from the size validated at selection.
    #[error("{path} changed size: expected {expected_bytes} bytes, found {actual_bytes}")]
    SizeChanged {
        /// Path that changed.
        path: String,
        /// Size recorded at selection.
        expected_bytes: u64,
        /// Size read at upload time.
        actual_bytes: u64,
    },
    /// Mode string is neither `image` nor `video`.
    #[error("unknown analysis mode: {0}")]
    UnknownMode(String),
}
