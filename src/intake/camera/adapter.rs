use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::device::{CaptureDevice, StreamConstraints};
use super::session::CameraSession;
use crate::common::payload::ImagePayload;
use crate::config::CameraSettings;
use crate::error::CameraError;

pub const SNAPSHOT_MIME: &str = "image/jpeg";

/// Grabs a single JPEG still from a capture device.
///
/// Clones share the device and its lock, so at most one capture holds the
/// device at a time.
#[derive(Clone)]
pub struct CameraAdapter {
    device: Arc<dyn CaptureDevice>,
    exclusive: Arc<Mutex<()>>,
    open_timeout: Duration,
    start_timeout: Duration,
    frame_timeout: Duration,
    jpeg_quality: u8,
}

impl CameraAdapter {
    pub fn new(device: Arc<dyn CaptureDevice>, settings: &CameraSettings) -> Self {
        Self {
            device,
            exclusive: Arc::new(Mutex::new(())),
            open_timeout: settings.open_timeout(),
            start_timeout: settings.start_timeout(),
            frame_timeout: settings.frame_timeout(),
            jpeg_quality: settings.jpeg_quality,
        }
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Opens the device, waits for the stream, snapshots one frame and encodes
    /// it. The device is released before this returns, whatever the outcome.
    /// A capture that is still releasing holds back the next one.
    #[instrument(skip(self), fields(device = %self.device.name()))]
    pub async fn capture(&self) -> Result<ImagePayload, CameraError> {
        // Declared before the session so it is dropped after it.
        let _exclusive = self.exclusive.lock().await;

        let stream = tokio::time::timeout(
            self.open_timeout,
            self.device.open(&StreamConstraints::video_only()),
        )
        .await
        .map_err(|_| CameraError::OpenTimeout(self.open_timeout))??;

        let mut session = CameraSession::new(stream);
        let result = self.snapshot(&mut session).await;
        session.release();

        match &result {
            Ok(payload) => info!(
                "Captured {} byte snapshot in session {:?}",
                payload.len(),
                session.id()
            ),
            Err(e) => warn!("Capture in session {:?} failed: {}", session.id(), e),
        }

        result
    }

    async fn snapshot(&self, session: &mut CameraSession) -> Result<ImagePayload, CameraError> {
        tokio::time::timeout(self.start_timeout, session.start())
            .await
            .map_err(|_| CameraError::StartTimeout(self.start_timeout))??;

        let frame = tokio::time::timeout(self.frame_timeout, session.read_frame())
            .await
            .map_err(|_| CameraError::FrameTimeout(self.frame_timeout))??;
        let still = frame.snapshot()?;
        let (width, height) = still.dimensions();
        debug!("Snapshot {}x{} taken at {}", width, height, frame.captured_at());

        let mut encoded = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut encoded, self.jpeg_quality);
        still.write_with_encoder(encoder)?;

        Ok(ImagePayload::from_camera(
            width,
            height,
            SNAPSHOT_MIME,
            Bytes::from(encoded.into_inner()),
        ))
    }
}
