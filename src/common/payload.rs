use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::ImageReader;
use uuid::Uuid;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Where an image payload came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    File { path: PathBuf },
    Camera { width: u32, height: u32 },
}

/// The canonical in-memory image, independent of how it was acquired.
///
/// Payloads are immutable; cloning one shares the underlying byte buffer.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    id: Uuid,
    bytes: Bytes,
    mime: String,
    origin: ImageOrigin,
    acquired_at: DateTime<Utc>,
}

impl ImagePayload {
    pub fn from_file(path: impl Into<PathBuf>, mime: impl Into<String>, bytes: Bytes) -> Self {
        Self::new(
            ImageOrigin::File { path: path.into() },
            mime.into(),
            bytes,
        )
    }

    pub fn from_camera(width: u32, height: u32, mime: impl Into<String>, bytes: Bytes) -> Self {
        Self::new(ImageOrigin::Camera { width, height }, mime.into(), bytes)
    }

    fn new(origin: ImageOrigin, mime: String, bytes: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes,
            mime,
            origin,
            acquired_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn file_path(&self) -> Option<&Path> {
        match &self.origin {
            ImageOrigin::File { path } => Some(path),
            ImageOrigin::Camera { .. } => None,
        }
    }

    /// Best-effort image dimensions read from the encoded header.
    ///
    /// Returns `None` for bytes the `image` crate cannot make sense of; payloads
    /// are never validated when they are acquired.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        if let ImageOrigin::Camera { width, height } = self.origin {
            return Some((width, height));
        }

        ImageReader::new(Cursor::new(self.bytes.as_ref()))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

impl PartialEq for ImagePayload {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImagePayload {}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let mut out = Cursor::new(Vec::new());
        RgbImage::from_pixel(width, height, Rgb([0, 128, 0]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        Bytes::from(out.into_inner())
    }

    #[test]
    fn clones_share_bytes_and_identity() {
        let payload = ImagePayload::from_file("meal.png", "image/png", png_bytes(8, 8));
        let copy = payload.clone();
        assert_eq!(payload, copy);
        assert_eq!(payload.bytes().as_ptr(), copy.bytes().as_ptr());
    }

    #[test]
    fn separately_acquired_payloads_differ() {
        let bytes = png_bytes(8, 8);
        let a = ImagePayload::from_file("a.png", "image/png", bytes.clone());
        let b = ImagePayload::from_file("a.png", "image/png", bytes);
        assert_ne!(a, b);
    }

    #[test]
    fn dimensions_from_encoded_header() {
        let payload = ImagePayload::from_file("meal.png", "image/png", png_bytes(12, 7));
        assert_eq!(payload.dimensions(), Some((12, 7)));
        assert_eq!(payload.file_path(), Some(Path::new("meal.png")));
    }

    #[test]
    fn dimensions_of_garbage_is_none() {
        let payload =
            ImagePayload::from_file("notes.txt", OCTET_STREAM, Bytes::from_static(b"hello"));
        assert_eq!(payload.dimensions(), None);
        assert!(!payload.is_empty());
    }
}
