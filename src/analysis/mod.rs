pub mod analyzer;
pub mod service;
pub mod simulated;

pub use analyzer::{AnalysisResult, Analyzer};
pub use service::{AnalysisClient, AnalysisService};
pub use simulated::SimulatedAnalyzer;
