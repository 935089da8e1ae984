use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

use super::state::{BusyStage, Failure, WorkflowPhase, WorkflowSnapshot, WorkflowState};
use crate::analysis::AnalysisClient;
use crate::common::payload::ImagePayload;
use crate::error::{ErrorKind, WorkflowError};
use crate::intake::{CameraAdapter, FileAdapter, SelectedFile};

type Acquired = Result<ImagePayload, Failure>;

/// How a started cycle ended, from the point of view of its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The cycle reached `Result` or `Failed`.
    Finished(WorkflowSnapshot),
    /// A reset happened while the cycle was in flight; its late result was dropped.
    Discarded { cycle: u64 },
}

struct Machine {
    state: WorkflowState,
    generation: u64,
    in_flight: Option<u64>,
    /// Acquisition task of the in-flight cycle, until it reports back.
    acquisition: Option<AbortHandle>,
}

impl Machine {
    fn is_current(&self, cycle: u64) -> bool {
        self.in_flight == Some(cycle)
    }

    fn busy_stage(&self) -> BusyStage {
        match self.state.phase() {
            WorkflowPhase::Previewing => BusyStage::Previewing,
            WorkflowPhase::Analyzing => BusyStage::Analyzing,
            _ => BusyStage::Acquiring,
        }
    }
}

struct Shared {
    machine: Mutex<Machine>,
    events: broadcast::Sender<WorkflowSnapshot>,
    files: FileAdapter,
    camera: CameraAdapter,
    analysis: AnalysisClient,
}

/// Sequences acquisition and analysis into one live cycle at a time.
///
/// Cloning a `Workflow` yields another handle to the same machine. Each cycle
/// runs on its own task: dropping the future returned by a start does not stop
/// the cycle, it still reaches `Result` or `Failed`.
#[derive(Clone)]
pub struct Workflow {
    shared: Arc<Shared>,
}

impl Workflow {
    pub(crate) fn new(
        files: FileAdapter,
        camera: CameraAdapter,
        analysis: AnalysisClient,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(Machine {
                    state: WorkflowState::Idle,
                    generation: 0,
                    in_flight: None,
                    acquisition: None,
                }),
                events,
                files,
                camera,
                analysis,
            }),
        }
    }

    /// Receives a snapshot for every transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowSnapshot> {
        self.shared.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let machine = self.shared.machine.lock().await;
        WorkflowSnapshot {
            cycle: machine.generation,
            state: machine.state.clone(),
        }
    }

    /// Runs a full cycle on a user-selected file.
    pub async fn start_upload(&self, file: SelectedFile) -> Result<CycleOutcome, WorkflowError> {
        let files = self.shared.files;
        self.start("upload", async move {
            files
                .read(&file)
                .await
                .map_err(|e| Failure::new(e.kind(), e.to_string()))
        })
        .await
    }

    /// Runs a full cycle on a single camera snapshot.
    pub async fn start_capture(&self) -> Result<CycleOutcome, WorkflowError> {
        let camera = self.shared.camera.clone();
        self.start("capture", async move {
            debug!("Capturing from {}", camera.device_name());
            camera
                .capture()
                .await
                .map_err(|e| Failure::new(e.kind(), e.to_string()))
        })
        .await
    }

    /// Returns to `Idle` immediately. A pending acquisition is aborted, which
    /// releases the camera; a pending analysis finishes on its own and is
    /// ignored when it reports back.
    pub async fn reset(&self) -> WorkflowSnapshot {
        let mut machine = self.shared.machine.lock().await;
        if let Some(cycle) = machine.in_flight.take() {
            info!("Reset abandons in-flight cycle {}", cycle);
        }
        if let Some(acquisition) = machine.acquisition.take() {
            acquisition.abort();
        }
        machine.generation += 1;
        self.transition(&mut machine, WorkflowState::Idle)
    }

    async fn start<F>(&self, source: &'static str, acquire: F) -> Result<CycleOutcome, WorkflowError>
    where
        F: Future<Output = Acquired> + Send + 'static,
    {
        let (cycle, acquisition) = self.begin(source, acquire).await?;

        let workflow = self.clone();
        let task = tokio::spawn(async move {
            let run = AssertUnwindSafe(workflow.run_cycle(cycle, source, acquisition));
            match run.catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => workflow.abandon(cycle).await,
            }
        });

        match task.await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Cycle {} task did not complete: {}", cycle, e);
                Ok(CycleOutcome::Discarded { cycle })
            }
        }
    }

    async fn begin<F>(
        &self,
        source: &'static str,
        acquire: F,
    ) -> Result<(u64, JoinHandle<Acquired>), WorkflowError>
    where
        F: Future<Output = Acquired> + Send + 'static,
    {
        let mut machine = self.shared.machine.lock().await;
        if machine.in_flight.is_some() {
            let stage = machine.busy_stage();
            warn!("Rejected {} while a cycle is in flight ({})", source, stage);
            return Err(WorkflowError::Busy { stage });
        }

        machine.generation += 1;
        let cycle = machine.generation;
        machine.in_flight = Some(cycle);

        // The previous cycle's payload must not outlive the start of a new one.
        if machine.state.phase() != WorkflowPhase::Idle {
            self.transition(&mut machine, WorkflowState::Idle);
        }

        let acquisition = tokio::spawn(acquire);
        machine.acquisition = Some(acquisition.abort_handle());

        info!("Cycle {} started from {}", cycle, source);
        Ok((cycle, acquisition))
    }

    async fn run_cycle(
        &self,
        cycle: u64,
        source: &'static str,
        acquisition: JoinHandle<Acquired>,
    ) -> CycleOutcome {
        let acquired = acquisition.await;

        let payload = {
            let mut machine = self.shared.machine.lock().await;
            // Covers aborted acquisitions too: only reset aborts them.
            if !machine.is_current(cycle) {
                return Self::discard(cycle, "acquisition");
            }
            machine.acquisition = None;

            let acquired = acquired.unwrap_or_else(|e| {
                Err(Failure::new(
                    ErrorKind::IoFailure,
                    format!("{} ended abnormally: {}", source, e),
                ))
            });
            match acquired {
                Ok(payload) => {
                    self.transition(&mut machine, WorkflowState::Previewing(payload.clone()));
                    self.transition(&mut machine, WorkflowState::Analyzing(payload.clone()));
                    payload
                }
                Err(failure) => {
                    warn!("Cycle {} {} failed: {}", cycle, source, failure.message);
                    machine.in_flight = None;
                    let snapshot = self.transition(
                        &mut machine,
                        WorkflowState::Failed {
                            payload: None,
                            failure,
                        },
                    );
                    return CycleOutcome::Finished(snapshot);
                }
            }
        };

        let analysed = self.shared.analysis.analyze(payload.clone()).await;

        let mut machine = self.shared.machine.lock().await;
        if !machine.is_current(cycle) {
            return Self::discard(cycle, "analysis");
        }
        machine.in_flight = None;

        let state = match analysed {
            Ok(analysis) => {
                info!(
                    "Cycle {} finished by {}: {:?}",
                    cycle,
                    self.shared.analysis.analyzer_name(),
                    analysis
                );
                WorkflowState::Result { payload, analysis }
            }
            Err(e) => {
                warn!("Cycle {} analysis failed: {}", cycle, e);
                WorkflowState::Failed {
                    payload: Some(payload),
                    failure: Failure::new(e.kind(), e.to_string()),
                }
            }
        };
        CycleOutcome::Finished(self.transition(&mut machine, state))
    }

    /// Ends a cycle whose task panicked, so the machine does not stay busy.
    async fn abandon(&self, cycle: u64) -> CycleOutcome {
        let mut machine = self.shared.machine.lock().await;
        if !machine.is_current(cycle) {
            return Self::discard(cycle, "panicked");
        }
        machine.in_flight = None;
        machine.acquisition = None;

        let kind = match machine.state.phase() {
            WorkflowPhase::Analyzing => ErrorKind::AnalysisFailure,
            _ => ErrorKind::IoFailure,
        };
        error!("Cycle {} panicked while {}", cycle, machine.state.phase());
        let state = WorkflowState::Failed {
            payload: machine.state.payload().cloned(),
            failure: Failure::new(kind, "scan ended abnormally"),
        };
        CycleOutcome::Finished(self.transition(&mut machine, state))
    }

    fn discard(cycle: u64, stage: &str) -> CycleOutcome {
        debug!("Dropping stale {} result of cycle {}", stage, cycle);
        CycleOutcome::Discarded { cycle }
    }

    fn transition(&self, machine: &mut Machine, state: WorkflowState) -> WorkflowSnapshot {
        debug!(
            "Cycle {}: {} -> {}",
            machine.generation,
            machine.state.phase(),
            state.phase()
        );
        machine.state = state;

        let snapshot = WorkflowSnapshot {
            cycle: machine.generation,
            state: machine.state.clone(),
        };
        // No subscribers is fine.
        let _ = self.shared.events.send(snapshot.clone());
        snapshot
    }
}
