//! Media metadata cached at surface-open time.

use std::time::Duration;

/// Properties of the video stream backing a decode surface.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second. `0.0` if the container does not report one.
    pub frames_per_second: f64,
    /// Estimated total frame count (duration × fps).
    pub frame_count: u64,
    /// Codec name as reported by FFmpeg (e.g. `h264`, `vp9`).
    pub codec: String,
}

/// Container-level metadata for an opened source.
///
/// Extracted once when the decode surface is opened; reading it requires no
/// additional decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    /// Video stream properties.
    pub video: VideoMetadata,
    /// Total media duration from the container header.
    pub duration: Duration,
    /// Container format name (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
    pub format: String,
}
