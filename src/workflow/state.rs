use serde::Serialize;

use crate::analysis::AnalysisResult;
use crate::common::payload::{ImageOrigin, ImagePayload};
use crate::error::ErrorKind;

/// Payload-free discriminant of [`WorkflowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Idle,
    Previewing,
    Analyzing,
    Result,
    Failed,
}

impl WorkflowPhase {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Previewing => "previewing",
            WorkflowPhase::Analyzing => "analyzing",
            WorkflowPhase::Result => "result",
            WorkflowPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a running cycle is doing when another start is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyStage {
    /// Reading the file or talking to the camera; nothing is published yet.
    Acquiring,
    Previewing,
    Analyzing,
}

impl BusyStage {
    pub fn name(&self) -> &'static str {
        match self {
            BusyStage::Acquiring => "acquiring",
            BusyStage::Previewing => "previewing",
            BusyStage::Analyzing => "analyzing",
        }
    }
}

impl std::fmt::Display for BusyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a cycle ended in [`WorkflowState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Previewing(ImagePayload),
    Analyzing(ImagePayload),
    Result {
        payload: ImagePayload,
        analysis: AnalysisResult,
    },
    Failed {
        payload: Option<ImagePayload>,
        failure: Failure,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::Previewing(_) => WorkflowPhase::Previewing,
            WorkflowState::Analyzing(_) => WorkflowPhase::Analyzing,
            WorkflowState::Result { .. } => WorkflowPhase::Result,
            WorkflowState::Failed { .. } => WorkflowPhase::Failed,
        }
    }

    pub fn payload(&self) -> Option<&ImagePayload> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::Previewing(payload) | WorkflowState::Analyzing(payload) => Some(payload),
            WorkflowState::Result { payload, .. } => Some(payload),
            WorkflowState::Failed { payload, .. } => payload.as_ref(),
        }
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            WorkflowState::Result { analysis, .. } => Some(analysis),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            WorkflowState::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// `Result` and `Failed` end a cycle; only a reset or a new start leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Result { .. } | WorkflowState::Failed { .. }
        )
    }
}

/// What a presentation layer gets after every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSnapshot {
    pub cycle: u64,
    pub state: WorkflowState,
}

impl WorkflowSnapshot {
    pub fn phase(&self) -> WorkflowPhase {
        self.state.phase()
    }
}

#[derive(Serialize)]
struct SnapshotReport<'a> {
    cycle: u64,
    phase: WorkflowPhase,
    image: Option<ImageReport<'a>>,
    analysis: Option<&'a AnalysisResult>,
    error: Option<&'a Failure>,
}

#[derive(Serialize)]
struct ImageReport<'a> {
    id: String,
    mime: &'a str,
    size: usize,
    source: &'static str,
    dimensions: Option<(u32, u32)>,
}

impl Serialize for WorkflowSnapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let image = self.state.payload().map(|payload| ImageReport {
            id: payload.id().to_string(),
            mime: payload.mime(),
            size: payload.len(),
            source: match payload.origin() {
                ImageOrigin::File { .. } => "file",
                ImageOrigin::Camera { .. } => "camera",
            },
            dimensions: payload.dimensions(),
        });

        SnapshotReport {
            cycle: self.cycle,
            phase: self.phase(),
            image,
            analysis: self.state.analysis(),
            error: self.state.failure(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn payload() -> ImagePayload {
        ImagePayload::from_camera(4, 3, "image/jpeg", Bytes::from_static(b"jpeg"))
    }

    #[test]
    fn accessors_follow_variant() {
        let image = payload();
        let analysis = AnalysisResult::new(300, 20, 90.0).unwrap();
        let state = WorkflowState::Result {
            payload: image.clone(),
            analysis,
        };

        assert_eq!(state.phase(), WorkflowPhase::Result);
        assert_eq!(state.payload(), Some(&image));
        assert_eq!(state.analysis(), Some(&analysis));
        assert!(state.failure().is_none());
        assert!(state.is_terminal());
        assert!(!WorkflowState::Analyzing(image).is_terminal());
    }

    #[test]
    fn failed_without_payload() {
        let state = WorkflowState::Failed {
            payload: None,
            failure: Failure::new(ErrorKind::PermissionDenied, "denied"),
        };
        assert!(state.payload().is_none());
        assert_eq!(state.failure().unwrap().kind, ErrorKind::PermissionDenied);
    }

    #[test]
    fn snapshot_serializes_for_presentation() {
        let snapshot = WorkflowSnapshot {
            cycle: 3,
            state: WorkflowState::Failed {
                payload: Some(payload()),
                failure: Failure::new(ErrorKind::AnalysisFailure, "timed out"),
            },
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["cycle"], 3);
        assert_eq!(json["phase"], "failed");
        assert_eq!(json["image"]["source"], "camera");
        assert_eq!(json["image"]["dimensions"], serde_json::json!([4, 3]));
        assert_eq!(json["error"]["kind"], "analysis_failure");
        assert!(json["analysis"].is_null());
    }
}
