pub mod analysis;
pub mod common;
pub mod config;
pub mod error;
pub mod intake;
pub mod workflow;

pub use analysis::{AnalysisResult, Analyzer, SimulatedAnalyzer};
pub use common::ImagePayload;
pub use config::Settings;
pub use error::{AppError, ErrorKind, WorkflowError};
pub use intake::SelectedFile;
pub use workflow::{CycleOutcome, Workflow, WorkflowBuilder, WorkflowSnapshot, WorkflowState};
