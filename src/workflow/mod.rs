pub mod builder;
pub mod machine;
pub mod state;

pub use builder::WorkflowBuilder;
pub use machine::{CycleOutcome, Workflow};
pub use state::{BusyStage, Failure, WorkflowPhase, WorkflowSnapshot, WorkflowState};
