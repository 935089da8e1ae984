use std::time::Instant;

use tracing::debug;
use uuid::Uuid;

use super::device::VideoStream;
use crate::common::frame::VideoFrame;
use crate::error::CameraError;

/// Scoped ownership of an open camera stream.
///
/// Tracks are stopped exactly once: on an explicit [`CameraSession::release`] or,
/// failing that, when the session is dropped. This covers early returns and a
/// capture future being dropped mid-flight.
pub struct CameraSession {
    id: Uuid,
    stream: Option<Box<dyn VideoStream>>,
    opened_at: Instant,
}

impl CameraSession {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        let id = Uuid::new_v4();
        debug!("Camera session {:?} opened", id);
        Self {
            id,
            stream: Some(stream),
            opened_at: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    pub async fn start(&mut self) -> Result<(), CameraError> {
        self.stream_mut()?.start().await
    }

    pub async fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        self.stream_mut()?.read_frame().await
    }

    /// Stops all tracks. Releasing an already released session does nothing.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            debug!(
                "Camera session {:?} released after {}ms",
                self.id,
                self.opened_at.elapsed().as_millis()
            );
        }
    }

    fn stream_mut(&mut self) -> Result<&mut (dyn VideoStream + 'static), CameraError> {
        self.stream
            .as_deref_mut()
            .ok_or(CameraError::Disconnected)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}
