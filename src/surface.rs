//! The decode surface: one demuxer + decoder bound to a source.
//!
//! [`DecodeSurface`] wraps an FFmpeg input context, the best video stream's
//! decoder, and a pixel-format converter. It exposes a single operation —
//! resolve a seek time to a stable RGB frame — which the sampler calls once
//! per offset. Seeks land on the nearest preceding keyframe and decode
//! forward until the target presentation time is reached; a seek past the
//! end of the media resolves to the last decodable frame rather than an
//! error.

use std::sync::Once;
use std::time::{Duration, Instant};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};
use image::RgbImage;

use crate::{
    error::StepframeError,
    metadata::{MediaMetadata, VideoMetadata},
    source::SourceBinding,
};

static FFMPEG_LOG_SETUP: Once = Once::new();

/// Verbosity of FFmpeg's own stderr output.
///
/// This is separate from the Rust-side `log` crate: it controls what the C
/// libraries print. The surface defaults to [`Error`](DecoderLogLevel::Error)
/// on first open, which silences the demuxer chatter that is noise in
/// library use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderLogLevel {
    /// Print nothing at all.
    Quiet,
    /// Recoverable and unrecoverable errors only.
    Error,
    /// Warnings and errors (FFmpeg's default).
    Warning,
    /// Informational messages and above.
    Info,
    /// Debugging output.
    Debug,
}

impl DecoderLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            DecoderLogLevel::Quiet => Level::Quiet,
            DecoderLogLevel::Error => Level::Error,
            DecoderLogLevel::Warning => Level::Warning,
            DecoderLogLevel::Info => Level::Info,
            DecoderLogLevel::Debug => Level::Debug,
        }
    }
}

/// Set the FFmpeg internal log verbosity.
///
/// Overrides the default applied when the first surface opens.
pub fn set_decoder_log_level(level: DecoderLogLevel) {
    FFMPEG_LOG_SETUP.call_once(|| {});
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// A demuxer and video decoder bound to one [`SourceBinding`].
///
/// Holds the input context, decoder, and RGB converter for the lifetime of
/// one sample call. All three per-offset seeks share this surface and run
/// strictly sequentially. Dropping the surface releases the decoder; the
/// staging file is owned by the binding, not the surface.
pub struct DecodeSurface {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    metadata: MediaMetadata,
}

impl DecodeSurface {
    /// Open a decode surface over a bound source.
    ///
    /// Initializes FFmpeg (idempotent), demuxes the container, locates the
    /// best video stream, builds a decoder and an RGB24 converter at native
    /// resolution, and caches metadata.
    ///
    /// # Errors
    ///
    /// - [`StepframeError::MediaOpen`] if the source is not decodable media.
    /// - [`StepframeError::NoVideoStream`] if no video stream exists.
    pub fn open(binding: &SourceBinding) -> Result<Self, StepframeError> {
        ffmpeg_next::init().map_err(|error| StepframeError::MediaOpen {
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;
        FFMPEG_LOG_SETUP.call_once(|| {
            ffmpeg_next::util::log::set_level(Level::Error);
        });

        let path = binding.media_path();
        let input =
            ffmpeg_next::format::input(&path).map_err(|error| StepframeError::MediaOpen {
                reason: error.to_string(),
            })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(StepframeError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                StepframeError::MediaOpen {
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| StepframeError::MediaOpen {
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let width = decoder.width();
        let height = decoder.height();

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let duration_microseconds = input.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frame_count = if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let metadata = MediaMetadata {
            video: VideoMetadata {
                width,
                height,
                frames_per_second,
                frame_count,
                codec,
            },
            duration,
            format: input.format().name().to_string(),
        };

        log::debug!(
            "opened decode surface: {}x{} @ {:.2} fps, {:?} [{}]",
            width,
            height,
            frames_per_second,
            duration,
            metadata.video.codec,
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            metadata,
        })
    }

    /// Cached metadata for the opened source.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Resolve `seek_seconds` to a stable RGB frame at native resolution.
    ///
    /// Seeks the demuxer to the nearest keyframe at or before the target,
    /// then decodes forward until a frame's presentation time reaches the
    /// target. A target beyond the media duration drains to end-of-stream
    /// and returns the last decodable frame. The whole resolve is bounded
    /// by `timeout` wall-clock time.
    ///
    /// # Errors
    ///
    /// - [`StepframeError::SeekTimeout`] if the bound elapses first.
    /// - [`StepframeError::Decode`] if no frame can be produced at all.
    pub fn frame_at(
        &mut self,
        seek_seconds: f64,
        timeout: Duration,
    ) -> Result<RgbImage, StepframeError> {
        let started = Instant::now();

        // Seeking the demuxer past the container duration fails outright on
        // some formats; clamp the raw seek and let forward decode handle the
        // remainder (it drains to the final frame).
        let duration_seconds = self.metadata.duration.as_secs_f64();
        let raw_seek_seconds = if duration_seconds > 0.0 {
            seek_seconds.min(duration_seconds)
        } else {
            seek_seconds
        };

        let target_timestamp = seconds_to_stream_timestamp(raw_seek_seconds, self.time_base);
        self.input.seek(target_timestamp, ..target_timestamp)?;
        self.decoder.flush();

        // Accept a frame within half a frame period of the target so rounding
        // in the container's time base cannot skip the on-time frame.
        let fps = self.metadata.video.frames_per_second;
        let slack = if fps > 0.0 { 0.5 / fps } else { 0.0 };

        let width = self.metadata.video.width;
        let height = self.metadata.video.height;

        let mut decoded = VideoFrame::empty();
        let mut rgb = VideoFrame::empty();
        let mut last_before_target: Option<RgbImage> = None;

        let mut packets = self.input.packets();
        loop {
            if started.elapsed() > timeout {
                return Err(StepframeError::SeekTimeout {
                    seek_seconds,
                    timeout_seconds: timeout.as_secs_f64(),
                });
            }

            let Some((stream, packet)) = packets.next() else {
                break;
            };
            if stream.index() != self.stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts_seconds =
                    pts_to_seconds(decoded.pts().unwrap_or(0), self.time_base);
                self.scaler.run(&decoded, &mut rgb)?;
                let image = rgb_frame_to_image(&rgb, width, height, seek_seconds)?;
                if pts_seconds + slack >= seek_seconds {
                    log::debug!(
                        "seek {seek_seconds:.3}s settled at pts {pts_seconds:.3}s",
                    );
                    return Ok(image);
                }
                last_before_target = Some(image);
            }
        }

        // End of stream: drain the decoder, keeping the last frame in case
        // the target lies beyond the media duration.
        self.decoder.send_eof()?;
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            if started.elapsed() > timeout {
                return Err(StepframeError::SeekTimeout {
                    seek_seconds,
                    timeout_seconds: timeout.as_secs_f64(),
                });
            }
            let pts_seconds = pts_to_seconds(decoded.pts().unwrap_or(0), self.time_base);
            self.scaler.run(&decoded, &mut rgb)?;
            let image = rgb_frame_to_image(&rgb, width, height, seek_seconds)?;
            if pts_seconds + slack >= seek_seconds {
                return Ok(image);
            }
            last_before_target = Some(image);
        }

        last_before_target.ok_or_else(|| StepframeError::Decode {
            seek_seconds,
            reason: "No decodable frame at or before the target".to_string(),
        })
    }
}

impl std::fmt::Debug for DecodeSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSurface")
            .field("metadata", &self.metadata)
            .field("stream_index", &self.stream_index)
            .finish_non_exhaustive()
    }
}

/// Convert a scaled RGB24 frame into an [`RgbImage`], stripping row padding.
fn rgb_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
    seek_seconds: f64,
) -> Result<RgbImage, StepframeError> {
    let stride = rgb_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = rgb_frame.data(0);

    let buffer = if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        // Stride carries padding bytes; copy row by row.
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let start = row * stride;
            buffer.extend_from_slice(&data[start..start + row_bytes]);
        }
        buffer
    };

    RgbImage::from_raw(width, height, buffer).ok_or_else(|| StepframeError::Decode {
        seek_seconds,
        reason: "Failed to construct RGB image from decoded frame data".to_string(),
    })
}

/// Convert seconds to a timestamp in the stream's time base.
fn seconds_to_stream_timestamp(seconds: f64, time_base: Rational) -> i64 {
    let numerator = time_base.numerator() as f64;
    let denominator = time_base.denominator() as f64;
    (seconds * denominator / numerator) as i64
}

/// Rescale a PTS value from stream time base to seconds.
fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}
