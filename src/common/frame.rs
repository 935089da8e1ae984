use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::RgbImage;

use crate::error::CameraError;

/// One decoded frame as handed out by a video stream, packed RGB8.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    pixels: Bytes,
    captured_at: DateTime<Utc>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Bytes, captured_at: DateTime<Utc>) -> Self {
        Self {
            width,
            height,
            pixels,
            captured_at,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Copies the frame into a still image buffer at the stream's native resolution.
    pub fn snapshot(&self) -> Result<RgbImage, CameraError> {
        let invalid = || CameraError::InvalidFrame {
            width: self.width,
            height: self.height,
            len: self.pixels.len(),
        };

        if self.width == 0 || self.height == 0 {
            return Err(invalid());
        }

        RgbImage::from_raw(self.width, self.height, self.pixels.to_vec()).ok_or_else(invalid)
    }
}

impl From<RgbImage> for VideoFrame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, Bytes::from(image.into_raw()), Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn cloning_frame_shares_pixel_buffer() {
        let f1 = VideoFrame::from(RgbImage::from_pixel(16, 16, Rgb([1, 2, 3])));
        let f2 = f1.clone();
        assert_eq!(f1.pixels.as_ptr(), f2.pixels.as_ptr());
    }

    #[test]
    fn snapshot_keeps_native_resolution() {
        let frame = VideoFrame::from(RgbImage::from_pixel(64, 48, Rgb([200, 10, 10])));
        let still = frame.snapshot().unwrap();
        assert_eq!(still.dimensions(), (64, 48));
        assert_eq!(still.get_pixel(10, 10), &Rgb([200, 10, 10]));
    }

    #[test]
    fn snapshot_rejects_short_buffer() {
        let frame = VideoFrame::new(4, 4, Bytes::from_static(&[0u8; 10]), Utc::now());
        assert!(matches!(
            frame.snapshot(),
            Err(CameraError::InvalidFrame { len: 10, .. })
        ));
    }

    #[test]
    fn snapshot_rejects_empty_dimensions() {
        let frame = VideoFrame::new(0, 0, Bytes::new(), Utc::now());
        assert!(frame.snapshot().is_err());
    }
}
