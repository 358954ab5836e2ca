use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Raster formats accepted for signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// A resolved signature image with its native pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureAsset {
    pub id: String,
    pub name: String,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Why raw bytes are not a usable signature image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("unsupported image format")]
    Unsupported,
    #[error("unreadable image: {0}")]
    Decode(String),
    #[error("image has zero width or height")]
    Empty,
}

impl SignatureAsset {
    /// Sniff format and native size from encoded bytes (PNG or JPEG).
    pub fn from_bytes(
        id: impl Into<String>,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, AssetError> {
        let kind = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png) => ImageKind::Png,
            Ok(image::ImageFormat::Jpeg) => ImageKind::Jpeg,
            _ => return Err(AssetError::Unsupported),
        };
        let format = match kind {
            ImageKind::Png => image::ImageFormat::Png,
            ImageKind::Jpeg => image::ImageFormat::Jpeg,
        };
        let (width, height) = image::ImageReader::with_format(Cursor::new(&bytes), format)
            .into_dimensions()
            .map_err(|e| AssetError::Decode(e.to_string()))?;
        if width == 0 || height == 0 {
            return Err(AssetError::Empty);
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            kind,
            width,
            height,
            bytes,
        })
    }

    /// Width over height of the native image.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}
