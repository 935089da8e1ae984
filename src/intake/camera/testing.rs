use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use image::{Rgb, RgbImage};

use super::device::{CaptureDevice, StreamConstraints, VideoStream};
use crate::common::frame::VideoFrame;
use crate::error::CameraError;

/// How a fake stream behaves once opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamScript {
    #[default]
    Healthy,
    FailStart,
    NeverStarts,
    /// Starts, then never delivers a frame.
    NoFrames,
    BadFrame,
    Disconnect,
}

/// How a fake device answers an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceScript {
    Grant(StreamScript),
    Deny,
    Missing,
    Hang,
}

pub struct FakeStream {
    script: StreamScript,
    size: (u32, u32),
    stops: Arc<AtomicUsize>,
}

impl FakeStream {
    pub fn new(script: StreamScript) -> (Self, Arc<AtomicUsize>) {
        let stops = Arc::new(AtomicUsize::new(0));
        (
            Self {
                script,
                size: (32, 24),
                stops: stops.clone(),
            },
            stops,
        )
    }
}

#[async_trait]
impl VideoStream for FakeStream {
    async fn start(&mut self) -> Result<(), CameraError> {
        match self.script {
            StreamScript::FailStart => Err(CameraError::StreamStart("no signal".to_string())),
            StreamScript::NeverStarts => std::future::pending().await,
            _ => Ok(()),
        }
    }

    async fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        match self.script {
            StreamScript::BadFrame => Ok(VideoFrame::new(
                self.size.0,
                self.size.1,
                Bytes::from_static(&[0u8; 7]),
                Utc::now(),
            )),
            StreamScript::Disconnect => Err(CameraError::Disconnected),
            StreamScript::NoFrames => std::future::pending().await,
            _ => Ok(VideoFrame::from(RgbImage::from_pixel(
                self.size.0,
                self.size.1,
                Rgb([180, 120, 40]),
            ))),
        }
    }

    fn stop_tracks(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Camera double that counts opens and stopped tracks.
#[derive(Clone)]
pub struct FakeDevice {
    script: DeviceScript,
    pub opens: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl FakeDevice {
    pub fn new(script: DeviceScript) -> Self {
        Self {
            script,
            opens: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn healthy() -> Self {
        Self::new(DeviceScript::Grant(StreamScript::Healthy))
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDevice for FakeDevice {
    async fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        assert!(constraints.video && !constraints.audio);
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.script {
            DeviceScript::Grant(script) => {
                let (mut stream, _) = FakeStream::new(script);
                stream.stops = self.stops.clone();
                Ok(Box::new(stream))
            }
            DeviceScript::Deny => Err(CameraError::PermissionDenied),
            DeviceScript::Missing => Err(CameraError::NoDevice),
            DeviceScript::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
