use std::{path::PathBuf, time::Duration};

use serde::Serialize;
use thiserror::Error;

use crate::workflow::BusyStage;

/// Failure taxonomy surfaced to whoever renders the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IoFailure,
    PermissionDenied,
    DeviceUnavailable,
    AnalysisFailure,
    BusyState,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::DeviceUnavailable => "device_unavailable",
            ErrorKind::AnalysisFailure => "analysis_failure",
            ErrorKind::BusyState => "busy_state",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Workflow Error: {0}")]
    Workflow(#[from] WorkflowError),
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::IoFailure
    }
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera access was denied")]
    PermissionDenied,
    #[error("No camera is available")]
    NoDevice,
    #[error("Camera did not respond within {0:?}")]
    OpenTimeout(Duration),
    #[error("Failed to start the camera stream: {0}")]
    StreamStart(String),
    #[error("Camera stream produced no frame within {0:?}")]
    StartTimeout(Duration),
    #[error("Camera delivered no frame within {0:?}")]
    FrameTimeout(Duration),
    #[error("Camera stream ended unexpectedly")]
    Disconnected,
    #[error("Frame of {width}x{height} carried {len} bytes")]
    InvalidFrame { width: u32, height: u32, len: usize },
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to load still image {path:?}: {message}")]
    StillImage { path: PathBuf, message: String },
}

impl CameraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CameraError::PermissionDenied => ErrorKind::PermissionDenied,
            CameraError::NoDevice
            | CameraError::OpenTimeout(_)
            | CameraError::StreamStart(_)
            | CameraError::StartTimeout(_)
            | CameraError::FrameTimeout(_)
            | CameraError::Disconnected
            | CameraError::StillImage { .. } => ErrorKind::DeviceUnavailable,
            CameraError::InvalidFrame { .. } | CameraError::Encode(_) => ErrorKind::IoFailure,
        }
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analyzer {analyzer} failed: {message}")]
    Failed {
        analyzer: &'static str,
        message: String,
    },
    #[error("Analysis timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Analyzer returned an out-of-range result: {0}")]
    InvalidResult(String),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::AnalysisFailure
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("A scan is already in progress ({stage})")]
    Busy { stage: BusyStage },
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Busy { .. } => ErrorKind::BusyState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_errors_map_onto_taxonomy() {
        assert_eq!(
            CameraError::PermissionDenied.kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(CameraError::NoDevice.kind(), ErrorKind::DeviceUnavailable);
        assert_eq!(
            CameraError::StartTimeout(Duration::from_secs(1)).kind(),
            ErrorKind::DeviceUnavailable
        );
        assert_eq!(
            CameraError::InvalidFrame {
                width: 2,
                height: 2,
                len: 3
            }
            .kind(),
            ErrorKind::IoFailure
        );
    }

    #[test]
    fn error_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::PermissionDenied).unwrap();
        assert_eq!(json, "\"permission_denied\"");
        assert_eq!(ErrorKind::BusyState.to_string(), "busy_state");
    }

    #[test]
    fn busy_error_names_the_running_stage() {
        let err = WorkflowError::Busy {
            stage: BusyStage::Acquiring,
        };
        assert_eq!(err.to_string(), "A scan is already in progress (acquiring)");
        assert_eq!(err.kind(), ErrorKind::BusyState);
    }
}
