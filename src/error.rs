//! Error types for the `stepframe` crate.
//!
//! This module defines [`StepframeError`], the unified error type returned by
//! all fallible operations. Variants carry enough context (timestamps, indices,
//! upstream messages) to diagnose a failure without extra logging at the call
//! site.

use std::io::Error as IoError;

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `stepframe` operations.
///
/// Every public method that can fail returns `Result<T, StepframeError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StepframeError {
    /// The video source could not be opened as decodable media.
    ///
    /// Fatal to the whole sample request: no candidate frames can be
    /// produced from an unreadable source.
    #[error("Failed to open video source as media: {reason}")]
    MediaOpen {
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source contains no video stream.
    #[error("No video stream found in source")]
    NoVideoStream,

    /// A frame could not be decoded after a seek.
    #[error("Failed to decode frame near {seek_seconds:.3}s: {reason}")]
    Decode {
        /// The seek position that was being resolved.
        seek_seconds: f64,
        /// Underlying decoder message.
        reason: String,
    },

    /// A seek did not settle on a stable frame within the configured bound.
    #[error("Seek to {seek_seconds:.3}s did not settle within {timeout_seconds:.1}s")]
    SeekTimeout {
        /// The seek position that was being resolved.
        seek_seconds: f64,
        /// The configured per-seek timeout.
        timeout_seconds: f64,
    },

    /// A sample request carried a non-finite target time.
    #[error("Target time must be finite, got {0}")]
    NonFiniteTarget(f64),

    /// A selection index was outside the candidate set.
    ///
    /// Returned by the strict [`select`](crate::CandidateSet::select); use
    /// [`select_clamped`](crate::CandidateSet::select_clamped) for the
    /// clamping policy instead.
    #[error("Selection index {index} is out of range (set has {len} candidates)")]
    SelectionOutOfRange {
        /// The index that was requested.
        index: usize,
        /// Number of candidates in the set.
        len: usize,
    },

    /// A commit was attempted for a superseded sample generation.
    ///
    /// Not a defect: this is how stale in-flight results are suppressed once
    /// a newer request has been issued.
    #[error("Sample generation {generation} was superseded by generation {latest}")]
    Superseded {
        /// Generation the results belong to.
        generation: u64,
        /// The latest generation issued by the session.
        latest: u64,
    },

    /// No state has been committed to the session yet.
    #[error("No candidate set has been committed yet")]
    NothingDisplayed,

    /// Sampling was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Sampling cancelled")]
    Cancelled,

    /// JPEG encoding of a decoded frame failed.
    #[error("Failed to encode still image: {0}")]
    StillEncode(String),

    /// The SOP document failed structural validation.
    #[error("Invalid SOP document: {0}")]
    InvalidSop(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error while staging source bytes or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// SOP document (de)serialization failed.
    #[error("SOP JSON error: {0}")]
    SopJson(#[from] serde_json::Error),
}

impl From<FfmpegError> for StepframeError {
    fn from(error: FfmpegError) -> Self {
        StepframeError::Ffmpeg(error.to_string())
    }
}
