//! Candidate frames and candidate sets.
//!
//! A sample call produces a [`CandidateSet`]: a short ordered run of stills
//! bracketing the requested timestamp, one per entry in [`OFFSET_SCHEDULE`].
//! The set is immutable once built; picking a frame is the display layer's
//! job and lives in [`crate::session`].

use crate::{error::StepframeError, still::EncodedStill};

/// Fixed sampling offsets relative to the target time, in seconds.
///
/// Evaluated in order: one frame slightly before the target, the on-time
/// frame, and one slightly after. The bracket exists because step timestamps
/// from video analysis are approximate — the clearest frame is often a beat
/// off the reported time.
pub const OFFSET_SCHEDULE: [f64; 3] = [-1.5, 0.0, 1.5];

/// Index of the conventional default pick: the on-time frame.
pub const DEFAULT_SELECTION: usize = 1;

/// One still image sampled at a specific offset from the target time.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFrame {
    offset_seconds: f64,
    seek_seconds: f64,
    still: EncodedStill,
}

impl CandidateFrame {
    pub(crate) fn new(offset_seconds: f64, seek_seconds: f64, still: EncodedStill) -> Self {
        Self {
            offset_seconds,
            seek_seconds,
            still,
        }
    }

    /// Offset relative to the target time this frame was sampled at.
    pub fn offset_seconds(&self) -> f64 {
        self.offset_seconds
    }

    /// The resolved seek time, after clamping at zero.
    pub fn seek_seconds(&self) -> f64 {
        self.seek_seconds
    }

    /// The encoded still image.
    pub fn still(&self) -> &EncodedStill {
        &self.still
    }
}

/// An ordered sequence of candidate frames bracketing one target time.
///
/// Normally holds exactly three entries, one per [`OFFSET_SCHEDULE`] offset,
/// in increasing-offset order. Under
/// [`FailurePolicy::Partial`](crate::FailurePolicy) it may hold fewer;
/// [`is_complete`](CandidateSet::is_complete) distinguishes the degraded
/// case. Sets are created fresh per `(source, target)` pair and never cached
/// across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    target_seconds: f64,
    candidates: Vec<CandidateFrame>,
}

impl CandidateSet {
    pub(crate) fn new(target_seconds: f64, candidates: Vec<CandidateFrame>) -> Self {
        Self {
            target_seconds,
            candidates,
        }
    }

    /// The target time this set brackets.
    pub fn target_seconds(&self) -> f64 {
        self.target_seconds
    }

    /// Candidates in increasing-offset order.
    pub fn frames(&self) -> &[CandidateFrame] {
        &self.candidates
    }

    /// Number of candidates in the set.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the set holds no candidates at all.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether every scheduled offset produced a frame.
    ///
    /// `false` only under the `Partial` failure policy when at least one
    /// offset failed to resolve.
    pub fn is_complete(&self) -> bool {
        self.candidates.len() == OFFSET_SCHEDULE.len()
    }

    /// The default selection index for this set.
    ///
    /// Index 1 (the on-time frame) for a complete set, clamped into range
    /// for a degraded one.
    pub fn default_selection(&self) -> usize {
        DEFAULT_SELECTION.min(self.candidates.len().saturating_sub(1))
    }

    /// Strict selection: return the frame at `index`.
    ///
    /// # Errors
    ///
    /// [`StepframeError::SelectionOutOfRange`] if `index >= len()`. For the
    /// clamping policy use [`select_clamped`](CandidateSet::select_clamped).
    pub fn select(&self, index: usize) -> Result<&CandidateFrame, StepframeError> {
        self.candidates
            .get(index)
            .ok_or(StepframeError::SelectionOutOfRange {
                index,
                len: self.candidates.len(),
            })
    }

    /// Clamping selection: an out-of-range `index` yields the last frame.
    ///
    /// Returns `None` only when the set is empty.
    pub fn select_clamped(&self, index: usize) -> Option<&CandidateFrame> {
        if self.candidates.is_empty() {
            return None;
        }
        let clamped = index.min(self.candidates.len() - 1);
        self.candidates.get(clamped)
    }
}
