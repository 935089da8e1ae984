use async_trait::async_trait;
use serde::Serialize;

use crate::common::payload::ImagePayload;
use crate::error::AnalysisError;

/// Nutrition estimate for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// kcal
    pub calories: u32,
    /// grams
    pub protein: u32,
    /// Percentage in `[0, 100]`.
    pub confidence: f64,
}

impl AnalysisResult {
    pub fn new(calories: u32, protein: u32, confidence: f64) -> Result<Self, AnalysisError> {
        if !confidence.is_finite() || !(0.0..=100.0).contains(&confidence) {
            return Err(AnalysisError::InvalidResult(format!(
                "confidence {confidence} is outside [0, 100]"
            )));
        }

        Ok(Self {
            calories,
            protein,
            confidence,
        })
    }
}

/// The pluggable food-recognition capability: one image in, one estimate out.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image: &ImagePayload) -> Result<AnalysisResult, AnalysisError>;

    fn name(&self) -> &'static str;
}
