use async_trait::async_trait;

use crate::common::frame::VideoFrame;
use crate::error::CameraError;

/// What is asked of the device when opening it. Only video is ever requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub video: bool,
    pub audio: bool,
}

impl StreamConstraints {
    pub fn video_only() -> Self {
        Self {
            video: true,
            audio: false,
        }
    }
}

/// Platform media capture API.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Requests access to the camera. May suspend on a permission prompt.
    async fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError>;

    fn name(&self) -> &str;
}

/// An open camera stream.
#[async_trait]
pub trait VideoStream: Send {
    /// Resolves once the stream has at least one decodable frame.
    async fn start(&mut self) -> Result<(), CameraError>;

    async fn read_frame(&mut self) -> Result<VideoFrame, CameraError>;

    /// Stops every track of the stream. Must not block.
    fn stop_tracks(&mut self);
}

/// Device used when no camera is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

#[async_trait]
impl CaptureDevice for NoCamera {
    async fn open(
        &self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        Err(CameraError::NoDevice)
    }

    fn name(&self) -> &str {
        "none"
    }
}
