//! Display sessions and stale-result suppression.
//!
//! A [`SampleSession`] owns the state the presentation layer renders: the
//! most recently committed [`CandidateSet`] and the current selection. The
//! one concurrency hazard in this crate is a slow sample finishing after a
//! newer request was issued; the session suppresses that with a generation
//! counter. [`begin`](SampleSession::begin) tags a ticket with the next
//! generation, and [`commit`](SampleSession::commit) installs results only
//! while the ticket is still the latest — a superseded commit is rejected
//! and its results dropped (the caller's source binding was already released
//! when sampling returned).

use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    candidate::{CandidateFrame, CandidateSet},
    error::StepframeError,
    still::EncodedStill,
};

/// Proof that a sample was started under a particular generation.
///
/// Obtained from [`SampleSession::begin`] and surrendered to
/// [`SampleSession::commit`]. Tickets are not `Clone`: one begin, one
/// commit attempt.
#[derive(Debug)]
pub struct SampleTicket {
    generation: u64,
}

impl SampleTicket {
    /// The generation this ticket belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The displayable outcome of a committed sample.
#[derive(Debug, Clone)]
pub struct DisplayState {
    set: CandidateSet,
    selection: usize,
}

impl DisplayState {
    /// The committed candidate set.
    pub fn set(&self) -> &CandidateSet {
        &self.set
    }

    /// The currently selected index.
    pub fn selection(&self) -> usize {
        self.selection
    }

    /// The currently selected frame.
    pub fn selected(&self) -> &CandidateFrame {
        // selection is kept in range by construction and by `select`.
        &self.set.frames()[self.selection]
    }
}

/// Serializes sample results for one display slot.
///
/// Each independently-illustrated step gets its own session, so a failure
/// or slow sample in one step never blocks or corrupts another.
///
/// # Example
///
/// ```
/// use stepframe::SampleSession;
///
/// let session = SampleSession::new();
/// let stale = session.begin();
/// let fresh = session.begin();
/// // `stale` can no longer commit: `fresh` superseded it.
/// assert!(!session.is_current(&stale));
/// assert!(session.is_current(&fresh));
/// ```
#[derive(Debug, Default)]
pub struct SampleSession {
    latest: AtomicU64,
    display: Mutex<Option<DisplayState>>,
}

impl SampleSession {
    /// Create an empty session with nothing displayed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new sample generation, superseding any in-flight one.
    pub fn begin(&self) -> SampleTicket {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("sample generation {generation} issued");
        SampleTicket { generation }
    }

    /// Whether the ticket still belongs to the latest generation.
    pub fn is_current(&self, ticket: &SampleTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.generation
    }

    /// Install a finished candidate set if its generation is still current.
    ///
    /// The selection resets to the set's default (the on-time frame).
    ///
    /// # Errors
    ///
    /// [`StepframeError::Superseded`] if a newer generation was issued while
    /// this one was sampling. The results are dropped, not installed.
    pub fn commit(&self, ticket: SampleTicket, set: CandidateSet) -> Result<(), StepframeError> {
        let mut display = self
            .display
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // Checked under the display lock so a racing begin+commit cannot
        // interleave between the check and the install.
        let latest = self.latest.load(Ordering::Acquire);
        if latest != ticket.generation {
            log::debug!(
                "dropping stale results for generation {} (latest is {latest})",
                ticket.generation,
            );
            return Err(StepframeError::Superseded {
                generation: ticket.generation,
                latest,
            });
        }

        let selection = set.default_selection();
        *display = Some(DisplayState { set, selection });
        Ok(())
    }

    /// Change the selection on the displayed set.
    ///
    /// Follows the strict policy: an out-of-range index is rejected and the
    /// displayed selection is left untouched.
    ///
    /// # Errors
    ///
    /// - [`StepframeError::NothingDisplayed`] before the first commit.
    /// - [`StepframeError::SelectionOutOfRange`] for `index >= len`.
    pub fn select(&self, index: usize) -> Result<(), StepframeError> {
        let mut display = self
            .display
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let state = display.as_mut().ok_or(StepframeError::NothingDisplayed)?;
        if index >= state.set.len() {
            return Err(StepframeError::SelectionOutOfRange {
                index,
                len: state.set.len(),
            });
        }
        state.selection = index;
        Ok(())
    }

    /// Snapshot the current display state, if any.
    pub fn displayed(&self) -> Option<DisplayState> {
        self.display
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// The export/print artifact: the currently selected frame's still.
    ///
    /// This is the only thing collaborators should persist. Rendering for
    /// export shows this frame alone, with no interactive affordances.
    ///
    /// # Errors
    ///
    /// [`StepframeError::NothingDisplayed`] before the first commit.
    pub fn export_selected(&self) -> Result<EncodedStill, StepframeError> {
        let display = self
            .display
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let state = display.as_ref().ok_or(StepframeError::NothingDisplayed)?;
        Ok(state.selected().still().clone())
    }
}

/// Sample on a blocking thread and commit into the session on completion.
///
/// The decode work runs under `tokio::task::spawn_blocking` so it does not
/// tie up the async runtime's cooperative budget. The generation check
/// happens at commit time: if a newer request was issued while this one was
/// decoding, the result is dropped and `Superseded` is returned. The
/// source binding is released inside the blocking task regardless.
///
/// # Errors
///
/// Any sampling error, [`StepframeError::Superseded`] on stale completion,
/// or [`StepframeError::Cancelled`] if the blocking task panicked or was
/// aborted.
#[cfg(feature = "async")]
pub async fn spawn_sample(
    session: std::sync::Arc<SampleSession>,
    sampler: crate::FrameSampler,
    request: crate::SampleRequest,
) -> Result<(), StepframeError> {
    let ticket = session.begin();
    let set = tokio::task::spawn_blocking(move || sampler.sample(&request))
        .await
        .map_err(|_| StepframeError::Cancelled)??;
    session.commit(ticket, set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::OFFSET_SCHEDULE;
    use crate::still::encode_jpeg;
    use image::RgbImage;

    fn make_set(target: f64) -> CandidateSet {
        let candidates = OFFSET_SCHEDULE
            .into_iter()
            .map(|offset| {
                let image = RgbImage::from_pixel(8, 8, image::Rgb([200, 100, 50]));
                let still = encode_jpeg(&image, 80).expect("encode failed");
                CandidateFrame::new(offset, (target + offset).max(0.0), still)
            })
            .collect();
        CandidateSet::new(target, candidates)
    }

    #[test]
    fn commit_installs_default_selection() {
        let session = SampleSession::new();
        let ticket = session.begin();
        session.commit(ticket, make_set(10.0)).expect("current commit");

        let state = session.displayed().expect("state committed");
        assert_eq!(state.selection(), 1);
        assert_eq!(state.set().target_seconds(), 10.0);
        assert_eq!(state.selected().offset_seconds(), 0.0);
    }

    #[test]
    fn stale_commit_is_rejected() {
        let session = SampleSession::new();
        let stale = session.begin();
        let fresh = session.begin();
        assert!(!session.is_current(&stale));

        let result = session.commit(stale, make_set(5.0));
        assert!(matches!(
            result,
            Err(StepframeError::Superseded {
                generation: 1,
                latest: 2,
            })
        ));
        // Nothing was installed by the stale commit.
        assert!(session.displayed().is_none());

        session.commit(fresh, make_set(7.0)).expect("fresh commit");
        let state = session.displayed().expect("fresh state");
        assert_eq!(state.set().target_seconds(), 7.0);
    }

    #[test]
    fn stale_commit_never_overwrites_newer_state() {
        let session = SampleSession::new();
        let slow = session.begin();
        let fast = session.begin();

        session.commit(fast, make_set(20.0)).expect("fast commit");
        assert!(session.commit(slow, make_set(10.0)).is_err());

        let state = session.displayed().expect("state");
        assert_eq!(state.set().target_seconds(), 20.0);
    }

    #[test]
    fn select_is_strict_and_sticky() {
        let session = SampleSession::new();
        let ticket = session.begin();
        session.commit(ticket, make_set(3.0)).expect("commit");

        session.select(2).expect("index 2 is in range");
        assert_eq!(session.displayed().unwrap().selection(), 2);

        assert!(matches!(
            session.select(3),
            Err(StepframeError::SelectionOutOfRange { index: 3, len: 3 })
        ));
        // Rejected selection leaves the previous pick untouched.
        assert_eq!(session.displayed().unwrap().selection(), 2);
    }

    #[test]
    fn export_requires_a_committed_set() {
        let session = SampleSession::new();
        assert!(matches!(
            session.export_selected(),
            Err(StepframeError::NothingDisplayed)
        ));

        let ticket = session.begin();
        session.commit(ticket, make_set(1.0)).expect("commit");
        let still = session.export_selected().expect("selected still");
        assert_eq!(&still.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn selection_resets_on_new_commit() {
        let session = SampleSession::new();
        let first = session.begin();
        session.commit(first, make_set(1.0)).expect("commit");
        session.select(0).expect("select early frame");

        let second = session.begin();
        session.commit(second, make_set(2.0)).expect("commit");
        assert_eq!(session.displayed().unwrap().selection(), 1);
    }
}
