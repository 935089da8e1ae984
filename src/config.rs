use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const ENV_PREFIX: &str = "FOOD_SCANNER";
const DEFAULT_FILE: &str = "food-scanner";

/// Runtime settings, layered as defaults, then an optional TOML file, then
/// `FOOD_SCANNER__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisSettings,
    pub camera: CameraSettings,
    pub workflow: WorkflowSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Artificial delay of the simulated analyzer.
    pub simulated_latency_ms: u64,
    /// Upper bound for a single analysis call.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Upper bound for the permission prompt / device open.
    pub open_timeout_ms: u64,
    /// Upper bound for the stream to produce its first decodable frame.
    pub start_timeout_ms: u64,
    /// Upper bound for reading the snapshot frame off a started stream.
    pub frame_timeout_ms: u64,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Buffered transitions per subscriber before it starts lagging.
    pub event_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            simulated_latency_ms: 1500,
            timeout_ms: 10_000,
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            open_timeout_ms: 30_000,
            start_timeout_ms: 5_000,
            frame_timeout_ms: 2_000,
            jpeg_quality: 92,
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self { event_capacity: 16 }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AnalysisSettings {
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl CameraSettings {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

impl Settings {
    /// Load settings from `food-scanner.toml` in the working directory (if any)
    /// and the environment.
    pub fn load() -> Result<Self, AppError> {
        Self::layered(File::with_name(DEFAULT_FILE).required(false))
    }

    /// Same as [`Settings::load`], but reads an explicit file instead of the default one.
    /// An explicit file must exist.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        Self::layered(File::from(path).required(true))
    }

    fn layered<S>(file: S) -> Result<Self, AppError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), AppError> {
        if self.analysis.timeout_ms == 0 {
            return Err(invalid("analysis.timeout_ms must be greater than 0"));
        }

        if self.camera.open_timeout_ms == 0
            || self.camera.start_timeout_ms == 0
            || self.camera.frame_timeout_ms == 0
        {
            return Err(invalid("camera timeouts must be greater than 0"));
        }

        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(invalid("camera.jpeg_quality must be between 1 and 100"));
        }

        if self.workflow.event_capacity == 0 {
            return Err(invalid("workflow.event_capacity must be greater than 0"));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(AppError::InvalidSettings(format!(
                "unknown log level {:?}",
                self.logging.level
            )));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::InvalidSettings(message.to_string())
}
