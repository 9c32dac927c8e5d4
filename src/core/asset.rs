//! # Image Assets
//!
//! [`ImageAsset`] is a user-supplied or server-returned image: its bytes, a
//! logical name, a MIME type and lazily computed pixel dimensions.
//!
//! Bytes are held behind an `Arc`, so cloning an asset is cheap and clones
//! compare byte-identical. Assets are never mutated in place; every
//! transformation (compression, export) produces a new asset.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use image::{ImageFormat, ImageReader};

use crate::error::{ClientError, ClientResult};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone)]
pub struct ImageAsset {
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
    dimensions: Arc<OnceLock<Dimensions>>,
}

impl ImageAsset {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
            dimensions: Arc::new(OnceLock::new()),
        }
    }

    /// Build an asset, sniffing the MIME type from the content.
    pub fn sniffed(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let mime = sniff_mime(&bytes).unwrap_or(OCTET_STREAM);
        Self::new(name, mime, bytes)
    }

    /// Read an asset from disk. The MIME type comes from the content, falling
    /// back to the file extension.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::io("read image", e).with_path(path.display().to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = sniff_mime(&bytes)
            .or_else(|| ImageFormat::from_path(path).ok().map(|f| f.to_mime_type()))
            .unwrap_or(OCTET_STREAM);
        Ok(Self::new(name, mime, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte size of the encoded image.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Only `image/*` MIME types are accepted by upload targets.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Pixel dimensions, read from the header on first use and cached for every
    /// clone of this asset.
    pub fn dimensions(&self) -> ClientResult<Dimensions> {
        if let Some(d) = self.dimensions.get() {
            return Ok(*d);
        }
        let (width, height) = ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()
            .map_err(|e| ClientError::decode(&self.name, e))?
            .into_dimensions()
            .map_err(|e| ClientError::decode(&self.name, e))?;
        let d = Dimensions { width, height };
        let _ = self.dimensions.set(d);
        Ok(d)
    }

    pub(crate) fn with_known_dimensions(self, d: Dimensions) -> Self {
        let _ = self.dimensions.set(d);
        self
    }

    /// True when both assets share the same underlying buffer.
    pub fn shares_bytes(&self, other: &ImageAsset) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl PartialEq for ImageAsset {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.mime == other.mime && self.bytes == other.bytes
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}
