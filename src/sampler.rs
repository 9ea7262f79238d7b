//! The frame sampler.
//!
//! [`FrameSampler::sample`] turns a [`SampleRequest`] into a
//! [`CandidateSet`]: it binds the source, opens one decode surface, resolves
//! the three scheduled offsets strictly in order, and encodes each settled
//! frame as a JPEG still. The binding and the surface are scoped to the call
//! and released on every exit path.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use crate::{
    candidate::{CandidateFrame, CandidateSet, OFFSET_SCHEDULE},
    error::StepframeError,
    metadata::MediaMetadata,
    source::VideoSource,
    still::{self, DEFAULT_JPEG_QUALITY},
    surface::DecodeSurface,
};

/// Default bound on how long one seek may take to settle.
///
/// The source behaviour this sampler models had no bound at all, which can
/// hang forever on malformed media; ten seconds is generous for any healthy
/// decode.
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_secs(10);

/// A validated request to sample candidate frames.
///
/// Construction clamps a negative target to zero and rejects non-finite
/// values outright.
#[derive(Debug, Clone)]
pub struct SampleRequest {
    source: VideoSource,
    target_seconds: f64,
}

impl SampleRequest {
    /// Build a request for candidates bracketing `target_seconds`.
    ///
    /// # Errors
    ///
    /// [`StepframeError::NonFiniteTarget`] if `target_seconds` is NaN or
    /// infinite.
    pub fn new(source: VideoSource, target_seconds: f64) -> Result<Self, StepframeError> {
        if !target_seconds.is_finite() {
            return Err(StepframeError::NonFiniteTarget(target_seconds));
        }
        Ok(Self {
            source,
            target_seconds: target_seconds.max(0.0),
        })
    }

    /// The video source to sample from.
    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    /// The (clamped) target time in seconds.
    pub fn target_seconds(&self) -> f64 {
        self.target_seconds
    }
}

/// What to do when a single offset fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Fail the whole sample on the first per-offset error. The default.
    #[default]
    Abort,
    /// Skip failed offsets and return a degraded set; the set reports
    /// [`is_complete() == false`](CandidateSet::is_complete). A sample where
    /// every offset fails still returns the last error.
    Partial,
}

/// Cooperative cancellation for in-flight sampling.
///
/// Clone the token and share it across threads; cancelling any clone is
/// observed by all. The sampler checks the token between offsets — there is
/// no hard abort of a seek already in progress, matching the advisory
/// cancellation model of the rest of the crate.
///
/// # Example
///
/// ```
/// use stepframe::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Builder-style sampler configuration.
///
/// A default-constructed value matches the unconfigured behaviour: quality
/// 80, ten-second seek bound, abort on first failure, no cancellation.
#[derive(Debug, Clone)]
pub struct SamplerOptions {
    pub(crate) jpeg_quality: u8,
    pub(crate) seek_timeout: Duration,
    pub(crate) failure_policy: FailurePolicy,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            seek_timeout: DEFAULT_SEEK_TIMEOUT,
            failure_policy: FailurePolicy::default(),
            cancellation: None,
        }
    }

    /// Set the JPEG quality for encoded stills (clamped to 1–100).
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Bound how long each seek may take to settle.
    #[must_use]
    pub fn with_seek_timeout(mut self, timeout: Duration) -> Self {
        self.seek_timeout = timeout;
        self
    }

    /// Choose the per-offset failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Attach a cancellation token, checked between offsets.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Configured JPEG quality.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Configured per-seek timeout.
    pub fn seek_timeout(&self) -> Duration {
        self.seek_timeout
    }

    /// Configured failure policy.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Samples candidate still frames from a video source.
///
/// Stateless across calls: each [`sample`](FrameSampler::sample) binds the
/// source afresh and discards everything when it returns. Selection state
/// lives in [`SampleSession`](crate::SampleSession), not here.
///
/// # Example
///
/// ```no_run
/// use stepframe::{FrameSampler, SampleRequest, VideoSource};
///
/// let source = VideoSource::from_path("recording.mp4");
/// let request = SampleRequest::new(source, 10.0)?;
/// let set = FrameSampler::new().sample(&request)?;
/// assert_eq!(set.len(), 3);
/// # Ok::<(), stepframe::StepframeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameSampler {
    options: SamplerOptions,
}

impl FrameSampler {
    /// Create a sampler with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sampler with explicit options.
    pub fn with_options(options: SamplerOptions) -> Self {
        Self { options }
    }

    /// The sampler's configuration.
    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// Produce a candidate set bracketing the request's target time.
    ///
    /// Seek times follow [`OFFSET_SCHEDULE`], each clamped at zero; a seek
    /// past the media duration resolves to the last frame. The three seeks
    /// run strictly sequentially over one decode surface.
    ///
    /// # Errors
    ///
    /// - [`StepframeError::MediaOpen`] / [`StepframeError::NoVideoStream`]
    ///   if the source is not usable video — always fatal.
    /// - Per-offset decode/seek errors, per the configured
    ///   [`FailurePolicy`].
    /// - [`StepframeError::Cancelled`] if the token fired between offsets.
    pub fn sample(&self, request: &SampleRequest) -> Result<CandidateSet, StepframeError> {
        // Acquire the scoped binding; released on every exit path below.
        let binding = request.source.bind()?;
        let mut surface = DecodeSurface::open(&binding)?;

        let target = request.target_seconds();
        log::debug!(
            "sampling {} offsets around {target:.3}s",
            OFFSET_SCHEDULE.len(),
        );

        let mut candidates = Vec::with_capacity(OFFSET_SCHEDULE.len());
        let mut last_error: Option<StepframeError> = None;

        for offset in OFFSET_SCHEDULE {
            if self.options.is_cancelled() {
                return Err(StepframeError::Cancelled);
            }

            let seek_seconds = (target + offset).max(0.0);
            match surface.frame_at(seek_seconds, self.options.seek_timeout) {
                Ok(image) => {
                    let still = still::encode_jpeg(&image, self.options.jpeg_quality)?;
                    candidates.push(CandidateFrame::new(offset, seek_seconds, still));
                }
                Err(error) => match self.options.failure_policy {
                    FailurePolicy::Abort => return Err(error),
                    FailurePolicy::Partial => {
                        log::warn!("offset {offset:+.1}s failed, continuing: {error}");
                        last_error = Some(error);
                    }
                },
            }
        }

        if candidates.is_empty() {
            // Partial policy with nothing to show is still a failure.
            return Err(last_error.unwrap_or(StepframeError::Decode {
                seek_seconds: target,
                reason: "No offsets produced a frame".to_string(),
            }));
        }

        Ok(CandidateSet::new(target, candidates))
    }

    /// Probe a source's metadata without sampling any frames.
    ///
    /// # Errors
    ///
    /// Same open errors as [`sample`](FrameSampler::sample).
    pub fn probe(&self, source: &VideoSource) -> Result<MediaMetadata, StepframeError> {
        let binding = source.bind()?;
        let surface = DecodeSurface::open(&binding)?;
        Ok(surface.metadata().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_clamps_negative_target() {
        let source = VideoSource::from_bytes(vec![0u8; 4], "video/mp4");
        let request = SampleRequest::new(source, -3.0).expect("negative target is clamped");
        assert_eq!(request.target_seconds(), 0.0);
    }

    #[test]
    fn request_rejects_non_finite_target() {
        let source = VideoSource::from_bytes(vec![0u8; 4], "video/mp4");
        assert!(SampleRequest::new(source.clone(), f64::NAN).is_err());
        assert!(SampleRequest::new(source, f64::INFINITY).is_err());
    }

    #[test]
    fn options_clamp_quality() {
        let options = SamplerOptions::new().with_jpeg_quality(0);
        assert_eq!(options.jpeg_quality(), 1);
        let options = SamplerOptions::new().with_jpeg_quality(200);
        assert_eq!(options.jpeg_quality(), 100);
    }

    #[test]
    fn offset_schedule_is_ordered() {
        assert_eq!(OFFSET_SCHEDULE, [-1.5, 0.0, 1.5]);
        assert!(OFFSET_SCHEDULE.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
