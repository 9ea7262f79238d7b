//! SOP document model.
//!
//! A Standard Operating Procedure is a titled sequence of instructional
//! steps, each optionally carrying a warning and a timestamp into the source
//! recording. Documents arrive as JSON from an upstream analysis service;
//! parsing normalises them the same way that service's consumers do — steps
//! with a blank title or instruction are dropped, and missing list fields
//! default to empty.

use serde::{Deserialize, Serialize};

use crate::{
    candidate::CandidateSet,
    error::StepframeError,
    sampler::{FrameSampler, SampleRequest},
    source::VideoSource,
};

/// One instructional step of an SOP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopStep {
    /// Short imperative title of the step.
    pub title: String,
    /// Full instruction text.
    pub instruction: String,
    /// Optional caution shown alongside the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Seconds into the source video where the action occurs. Steps without
    /// a timestamp cannot be illustrated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_seconds: Option<f64>,
    /// Text or UI element visible at the timestamp, proving the frame is
    /// the right one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_proof: Option<String>,
}

impl SopStep {
    fn is_substantive(&self) -> bool {
        !self.title.trim().is_empty() && !self.instruction.trim().is_empty()
    }
}

/// A complete SOP document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopDocument {
    /// Document title.
    pub title: String,
    /// Single emoji used as the document icon.
    #[serde(default)]
    pub emoji_icon: String,
    /// One-paragraph summary.
    #[serde(default)]
    pub summary: String,
    /// Rough completion time in minutes.
    #[serde(default)]
    pub estimated_time_minutes: u32,
    /// Tools or accounts the procedure requires.
    #[serde(default)]
    pub tools_required: Vec<String>,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<SopStep>,
    /// Free-form troubleshooting notes.
    #[serde(default)]
    pub troubleshooting_tips: Vec<String>,
}

impl SopDocument {
    /// Parse a document from JSON and normalise it.
    ///
    /// # Errors
    ///
    /// [`StepframeError::SopJson`] on malformed JSON,
    /// [`StepframeError::InvalidSop`] if the title is blank.
    pub fn from_json(json: &str) -> Result<Self, StepframeError> {
        let mut document: SopDocument = serde_json::from_str(json)?;
        document.normalize();
        if document.title.trim().is_empty() {
            return Err(StepframeError::InvalidSop("title is empty".to_string()));
        }
        Ok(document)
    }

    /// Serialise the document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, StepframeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Drop steps that lack a title or instruction.
    pub fn normalize(&mut self) {
        self.steps.retain(SopStep::is_substantive);
    }

    /// Steps that carry a timestamp, with their original indices.
    pub fn timestamped_steps(&self) -> impl Iterator<Item = (usize, &SopStep, f64)> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(index, step)| step.timestamp_seconds.map(|ts| (index, step, ts)))
    }
}

/// Candidate frames sampled for one SOP step.
#[derive(Debug, Clone)]
pub struct StepIllustration {
    /// Index of the step within [`SopDocument::steps`].
    pub step_index: usize,
    /// Title of the step, for labelling output.
    pub step_title: String,
    /// The sampled candidates.
    pub set: CandidateSet,
}

/// Sample candidate frames for every timestamped step of a document.
///
/// Each step is sampled independently: a failing step is logged and skipped,
/// and never aborts or blocks the others. Steps without timestamps are not
/// illustrated.
pub fn illustrate_steps(
    sampler: &FrameSampler,
    source: &VideoSource,
    document: &SopDocument,
) -> Vec<StepIllustration> {
    let mut results = Vec::new();
    for (index, step, timestamp) in document.timestamped_steps() {
        let outcome = SampleRequest::new(source.clone(), timestamp)
            .and_then(|request| sampler.sample(&request));
        match outcome {
            Ok(set) => results.push(StepIllustration {
                step_index: index,
                step_title: step.title.clone(),
                set,
            }),
            Err(error) => {
                log::warn!(
                    "step {} ({}) failed to illustrate: {error}",
                    index,
                    step.title,
                );
            }
        }
    }
    results
}
