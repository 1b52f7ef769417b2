//! Flatten-and-encode: composite the surface onto paper, JPEG it, wrap as a data URI

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::ENCODED_MIME;
use crate::surface::CpuSurface;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Cannot encode an empty surface ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Not a data URI")]
    NotDataUri,
    #[error("Unsupported data URI encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A flattened signature as a `data:image/jpeg;base64,...` URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedSignature(String);

impl EncodedSignature {
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    pub fn into_data_uri(self) -> String {
        self.0
    }

    /// Decode back into MIME type and raw image bytes
    pub fn decode(&self) -> Result<DataUri, EncodeError> {
        decode_data_uri(&self.0)
    }
}

/// Parsed data URI payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Composite the surface over an opaque paper color
///
/// The result has no alpha channel, so it carries no transparent pixels.
pub fn flatten(surface: &CpuSurface, paper: [f32; 4]) -> RgbImage {
    RgbImage::from_fn(surface.width, surface.height, |x, y| {
        let px = surface.get_pixel(x, y).unwrap_or([0.0; 4]);
        let a = px[3].clamp(0.0, 1.0);
        let channel = |i: usize| {
            let v = px[i] * a + paper[i] * (1.0 - a);
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        };
        Rgb([channel(0), channel(1), channel(2)])
    })
}

/// Lossy-encode an RGB image as JPEG at `quality` (1..=100)
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EncodeError::EmptySurface {
            width: image.width(),
            height: image.height(),
        });
    }
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Flatten onto `paper` and encode as a JPEG data URI
pub fn encode_surface(
    surface: &CpuSurface,
    paper: [f32; 4],
    quality: u8,
) -> Result<EncodedSignature, EncodeError> {
    let flat = flatten(surface, paper);
    let jpeg = encode_jpeg(&flat, quality)?;
    Ok(EncodedSignature(to_data_uri(ENCODED_MIME, &jpeg)))
}

/// Parse a base64 data URI into MIME type and bytes
pub fn decode_data_uri(uri: &str) -> Result<DataUri, EncodeError> {
    let rest = uri.strip_prefix("data:").ok_or(EncodeError::NotDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(EncodeError::NotDataUri)?;
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Err(EncodeError::UnsupportedEncoding(meta.to_string()));
    };
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(DataUri {
        mime: mime.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{JPEG_QUALITY, PAPER_COLOR};

    #[test]
    fn test_flatten_blank_is_white() {
        let surface = CpuSurface::new(4, 3);
        let flat = flatten(&surface, PAPER_COLOR);
        assert_eq!(flat.dimensions(), (4, 3));
        assert!(flat.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_flatten_ink_over_paper() {
        let mut surface = CpuSurface::new(2, 1);
        surface.set_pixel(0, 0, [0.0, 0.0, 0.0, 1.0]);
        surface.set_pixel(1, 0, [0.0, 0.0, 0.0, 0.5]);

        let flat = flatten(&surface, PAPER_COLOR);
        assert_eq!(flat.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(flat.get_pixel(1, 0).0, [128, 128, 128]);
    }

    #[test]
    fn test_encode_surface_roundtrip_is_opaque_white() {
        let mut surface = CpuSurface::new(64, 32);
        surface.set_pixel(32, 16, [0.0, 0.0, 0.0, 1.0]);

        let encoded = encode_surface(&surface, PAPER_COLOR, JPEG_QUALITY).unwrap();
        assert!(encoded.as_data_uri().starts_with("data:image/jpeg;base64,"));

        let decoded = encoded.decode().unwrap();
        assert_eq!(decoded.mime, "image/jpeg");
        let image = image::load_from_memory(&decoded.bytes).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (64, 32));
        let corner = image.get_pixel(0, 0).0;
        assert_eq!(corner[3], 255);
        assert!(corner[0] > 245 && corner[1] > 245 && corner[2] > 245);
    }

    #[test]
    fn test_encode_empty_surface_errors() {
        let surface = CpuSurface::new(0, 0);
        let err = encode_surface(&surface, PAPER_COLOR, JPEG_QUALITY).unwrap_err();
        assert!(matches!(err, EncodeError::EmptySurface { .. }));
    }

    #[test]
    fn test_decode_data_uri_rejects_garbage() {
        assert!(matches!(
            decode_data_uri("hello"),
            Err(EncodeError::NotDataUri)
        ));
        assert!(matches!(
            decode_data_uri("data:image/jpeg,abc"),
            Err(EncodeError::UnsupportedEncoding(_))
        ));
        assert!(matches!(
            decode_data_uri("data:image/jpeg;base64,!!!"),
            Err(EncodeError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_data_uri() {
        let uri = to_data_uri("image/jpeg", &[1, 2, 3]);
        let parsed = decode_data_uri(&uri).unwrap();
        assert_eq!(parsed.mime, "image/jpeg");
        assert_eq!(parsed.bytes, vec![1, 2, 3]);
    }
}
