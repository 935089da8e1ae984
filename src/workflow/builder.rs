use std::sync::Arc;

use tracing::debug;

use super::machine::Workflow;
use crate::analysis::{AnalysisClient, Analyzer, SimulatedAnalyzer};
use crate::config::Settings;
use crate::error::AppError;
use crate::intake::camera::{CaptureDevice, NoCamera};
use crate::intake::{CameraAdapter, FileAdapter};

pub struct WorkflowBuilder {
    settings: Settings,
    analyzer: Option<Arc<dyn Analyzer>>,
    camera: Option<Arc<dyn CaptureDevice>>,
}

impl WorkflowBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            analyzer: None,
            camera: None,
        }
    }

    // Replaces the settings, this will override the ones given to `new`.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    // Sets the analysis capability, the simulated analyzer is used otherwise.
    pub fn analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzer = Some(Arc::new(analyzer));
        self
    }

    // Sets the capture device, captures fail as unavailable otherwise.
    pub fn camera(mut self, camera: impl CaptureDevice + 'static) -> Self {
        self.camera = Some(Arc::new(camera));
        self
    }

    pub fn build(self) -> Result<Workflow, AppError> {
        self.settings.validate()?;

        let analyzer = self.analyzer.unwrap_or_else(|| {
            Arc::new(SimulatedAnalyzer::new(
                self.settings.analysis.simulated_latency(),
            ))
        });
        let camera = self.camera.unwrap_or_else(|| Arc::new(NoCamera));
        debug!(
            "Building workflow with analyzer {} and camera {}",
            analyzer.name(),
            camera.name()
        );

        Ok(Workflow::new(
            FileAdapter::new(),
            CameraAdapter::new(camera, &self.settings.camera),
            AnalysisClient::new(analyzer, self.settings.analysis.timeout()),
            self.settings.workflow.event_capacity,
        ))
    }
}

impl Workflow {
    pub fn builder(settings: Settings) -> WorkflowBuilder {
        WorkflowBuilder::new(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WorkflowPhase;

    #[tokio::test]
    async fn builds_idle_workflow_from_defaults() {
        let workflow = WorkflowBuilder::new(Settings::default()).build().unwrap();
        let snapshot = workflow.snapshot().await;
        assert_eq!(snapshot.phase(), WorkflowPhase::Idle);
        assert_eq!(snapshot.cycle, 0);
    }

    #[test]
    fn refuses_invalid_settings() {
        let mut settings = Settings::default();
        settings.workflow.event_capacity = 0;
        assert!(matches!(
            WorkflowBuilder::new(Settings::default())
                .settings(settings)
                .build(),
            Err(AppError::InvalidSettings(_))
        ));
    }
}
