use std::path::PathBuf;

use async_trait::async_trait;
use image::RgbImage;
use tracing::debug;

use super::device::{CaptureDevice, StreamConstraints, VideoStream};
use crate::common::frame::VideoFrame;
use crate::error::CameraError;

/// A "camera" that streams a single image file, frame after frame.
///
/// Handy on machines without a webcam and for demos of the capture path.
#[derive(Debug, Clone)]
pub struct StillImageDevice {
    path: PathBuf,
    name: String,
}

impl StillImageDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("still:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl CaptureDevice for StillImageDevice {
    async fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        if !constraints.video {
            return Err(CameraError::StreamStart("no video track requested".to_string()));
        }

        let path = self.path.clone();
        let decoded = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|e| CameraError::StreamStart(e.to_string()))?
            .map_err(|e| CameraError::StillImage {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        debug!("Still image device opened {:?}", self.path);
        Ok(Box::new(StillStream {
            image: decoded.to_rgb8(),
            playing: false,
            stopped: false,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct StillStream {
    image: RgbImage,
    playing: bool,
    stopped: bool,
}

#[async_trait]
impl VideoStream for StillStream {
    async fn start(&mut self) -> Result<(), CameraError> {
        if self.stopped {
            return Err(CameraError::Disconnected);
        }
        self.playing = true;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if self.stopped || !self.playing {
            return Err(CameraError::Disconnected);
        }
        Ok(VideoFrame::from(self.image.clone()))
    }

    fn stop_tracks(&mut self) {
        self.stopped = true;
        self.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use uuid::Uuid;

    #[tokio::test]
    async fn streams_the_decoded_file() {
        let path = std::env::temp_dir().join(format!("still-{}.png", Uuid::new_v4()));
        RgbImage::from_pixel(20, 10, Rgb([9, 9, 9]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let device = StillImageDevice::new(&path);
        let mut stream = device.open(&StreamConstraints::video_only()).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert!(stream.read_frame().await.is_err());
        stream.start().await.unwrap();
        let frame = stream.read_frame().await.unwrap();
        assert_eq!((frame.width(), frame.height()), (20, 10));

        stream.stop_tracks();
        assert!(stream.read_frame().await.is_err());
    }

    #[tokio::test]
    async fn unreadable_file_is_unavailable_device() {
        let device = StillImageDevice::new("/nonexistent/plate.png");
        let err = device
            .open(&StreamConstraints::video_only())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CameraError::StillImage { .. }));
    }
}
