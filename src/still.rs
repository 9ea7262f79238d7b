//! Encoded still images.
//!
//! Decoded frames leave the sampler as JPEG bytes, not raw pixels: the only
//! artifact collaborators persist or export is the compressed still.

use std::io::Cursor;
use std::path::Path;

use image::{ExtendedColorType, ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};

use crate::error::StepframeError;

/// JPEG quality used when none is configured (0–100 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// A compressed still image sampled from the video.
///
/// Holds the encoded JPEG bytes together with the pixel dimensions of the
/// source frame. The bytes are the persistence/export artifact; nothing else
/// about a candidate should leave the process.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedStill {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl EncodedStill {
    /// The encoded JPEG bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the still, yielding the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Width of the encoded frame in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the encoded frame in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Write the encoded bytes to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StepframeError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Encode an RGB frame as JPEG at the given quality.
///
/// Quality is clamped to `1..=100`.
pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<EncodedStill, StepframeError> {
    let quality = quality.clamp(1, 100);
    let (width, height) = image.dimensions();

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    encoder
        .write_image(image.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|error| StepframeError::StillEncode(error.to_string()))?;

    Ok(EncodedStill {
        bytes,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_JPEG_QUALITY, encode_jpeg};
    use image::RgbImage;

    #[test]
    fn encodes_jpeg_magic_and_dimensions() {
        let image = RgbImage::from_fn(64, 48, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let still = encode_jpeg(&image, DEFAULT_JPEG_QUALITY).expect("encode failed");
        assert_eq!(still.width(), 64);
        assert_eq!(still.height(), 48);
        // JPEG SOI marker.
        assert_eq!(&still.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn quality_is_clamped() {
        let image = RgbImage::new(8, 8);
        assert!(encode_jpeg(&image, 0).is_ok());
        assert!(encode_jpeg(&image, 255).is_ok());
    }
}
