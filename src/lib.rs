//! # stepframe
//!
//! Sample candidate still frames from screen recordings at SOP step
//! timestamps.
//!
//! `stepframe` takes a video (raw bytes or a file) and a target time, seeks
//! to a small bracket of offsets around that time — 1.5 s early, on time,
//! 1.5 s late — and returns each settled frame as an encoded JPEG
//! [`CandidateSet`]. A display layer picks one candidate per step; the
//! selected still is the only artifact meant for persistence or export.
//! Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Sample candidates around a timestamp
//!
//! ```no_run
//! use stepframe::{FrameSampler, SampleRequest, VideoSource};
//!
//! let bytes = std::fs::read("recording.mp4").unwrap();
//! let source = VideoSource::from_bytes(bytes, "video/mp4");
//! let request = SampleRequest::new(source, 10.0).unwrap();
//!
//! let set = FrameSampler::new().sample(&request).unwrap();
//! assert_eq!(set.len(), 3);
//! set.select(set.default_selection()).unwrap()
//!     .still()
//!     .save("step.jpg")
//!     .unwrap();
//! ```
//!
//! ### Suppress stale results when requests race
//!
//! ```no_run
//! use stepframe::{FrameSampler, SampleRequest, SampleSession, VideoSource};
//!
//! let session = SampleSession::new();
//! let sampler = FrameSampler::new();
//! let source = VideoSource::from_path("recording.mp4");
//!
//! let ticket = session.begin();
//! let set = sampler
//!     .sample(&SampleRequest::new(source, 42.0).unwrap())
//!     .unwrap();
//! // Fails with `Superseded` if a newer `begin` happened meanwhile.
//! session.commit(ticket, set).unwrap();
//! ```
//!
//! ### Illustrate a whole SOP document
//!
//! ```no_run
//! use stepframe::{FrameSampler, SopDocument, VideoSource, illustrate_steps};
//!
//! let document = SopDocument::from_json(&std::fs::read_to_string("sop.json").unwrap()).unwrap();
//! let source = VideoSource::from_path("recording.mp4");
//! for illustration in illustrate_steps(&FrameSampler::new(), &source, &document) {
//!     println!("step {} has {} candidates", illustration.step_index, illustration.set.len());
//! }
//! ```
//!
//! ## Behaviour contract
//!
//! - Seek times are `max(0, target + offset)`; targets under 1.5 s clamp the
//!   early seek to exactly zero.
//! - A seek past the media duration resolves to the last decodable frame, not
//!   an error.
//! - Every seek wait is bounded (default 10 s) — see
//!   [`SamplerOptions::with_seek_timeout`].
//! - The default selection is index 1, the on-time frame.
//! - Stale async results never overwrite newer display state: commits are
//!   generation-checked by [`SampleSession`].
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`spawn_sample`] runs decoding on a Tokio blocking thread |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod candidate;
pub mod error;
pub mod metadata;
pub mod sampler;
pub mod session;
pub mod sop;
pub mod source;
pub mod still;
pub mod surface;

pub use candidate::{CandidateFrame, CandidateSet, DEFAULT_SELECTION, OFFSET_SCHEDULE};
pub use error::StepframeError;
pub use metadata::{MediaMetadata, VideoMetadata};
pub use sampler::{
    CancellationToken, DEFAULT_SEEK_TIMEOUT, FailurePolicy, FrameSampler, SampleRequest,
    SamplerOptions,
};
#[cfg(feature = "async")]
pub use session::spawn_sample;
pub use session::{DisplayState, SampleSession, SampleTicket};
pub use sop::{SopDocument, SopStep, StepIllustration, illustrate_steps};
pub use source::{SourceBinding, VideoSource};
pub use still::{DEFAULT_JPEG_QUALITY, EncodedStill};
pub use surface::{DecodeSurface, DecoderLogLevel, set_decoder_log_level};
