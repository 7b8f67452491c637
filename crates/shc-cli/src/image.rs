//! # Image and QR Collaborators
//!
//! Reads an image file into RGBA pixels and finds the QR code in it. Only
//! the first grid that decodes is used; multi-part (chunked) cards are not
//! reassembled.

use std::path::{Path, PathBuf};

use shc_core::FailureKind;
use thiserror::Error;

/// Decoded image pixels, row-major RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PixelData {
    /// ITU-R BT.601 luma of each pixel, for the QR detector.
    fn luma(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .map(|px| {
                let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                ((r * 299 + g * 587 + b * 114) / 1000) as u8
            })
            .collect()
    }
}

/// Errors from the image and QR stages.
#[derive(Error, Debug)]
pub enum ImageError {
    /// The file could not be opened or decoded as an image.
    #[error("failed to read image {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: image::ImageError,
    },

    /// No QR grid in the image could be decoded.
    #[error("no QR code found ({grids} candidate grids): {reason}")]
    QrNotFound { grids: usize, reason: String },
}

impl ImageError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Read { .. } => FailureKind::ImageRead,
            Self::QrNotFound { .. } => FailureKind::QrNotFound,
        }
    }
}

/// Read and decode an image file (PNG or JPEG).
pub fn read_image(path: &Path) -> Result<PixelData, ImageError> {
    let img = image::open(path).map_err(|e| ImageError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path = %path.display(), width, height, "read image");
    Ok(PixelData {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

/// Find and decode the QR code in `pixels`, returning its text.
pub fn decode_qr(pixels: &PixelData) -> Result<String, ImageError> {
    let width = pixels.width as usize;
    let height = pixels.height as usize;
    let luma = pixels.luma();
    if width == 0 || height == 0 || luma.len() < width * height {
        return Err(ImageError::QrNotFound {
            grids: 0,
            reason: "image has no pixels".to_string(),
        });
    }

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);
    let grids = prepared.detect_grids();
    tracing::debug!(grids = grids.len(), "detected QR grids");

    let mut last_error = "no finder patterns detected".to_string();
    for grid in &grids {
        match grid.decode() {
            Ok((meta, content)) => {
                tracing::debug!(version = meta.version.0, chars = content.len(), "decoded QR grid");
                return Ok(content);
            }
            Err(e) => last_error = format!("{e:?}"),
        }
    }
    Err(ImageError::QrNotFound {
        grids: grids.len(),
        reason: last_error,
    })
}
