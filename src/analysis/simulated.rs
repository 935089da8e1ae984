use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use super::analyzer::{AnalysisResult, Analyzer};
use crate::common::payload::ImagePayload;
use crate::error::AnalysisError;

const CALORIES: Range<u32> = 100..600;
const PROTEIN: Range<u32> = 5..35;
const CONFIDENCE: Range<f64> = 70.0..100.0;

/// Stand-in estimator: waits a fixed latency, then returns random but
/// plausible numbers. Replace with a real service behind [`Analyzer`].
#[derive(Debug, Clone)]
pub struct SimulatedAnalyzer {
    latency: Duration,
}

impl SimulatedAnalyzer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn draw(&self) -> Result<AnalysisResult, AnalysisError> {
        let mut rng = rand::rng();
        let calories = rng.random_range(CALORIES);
        let protein = rng.random_range(PROTEIN);
        // one decimal place
        let confidence = (rng.random_range(CONFIDENCE) * 10.0).round() / 10.0;
        AnalysisResult::new(calories, protein, confidence)
    }
}

impl Default for SimulatedAnalyzer {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl Analyzer for SimulatedAnalyzer {
    async fn analyze(&self, image: &ImagePayload) -> Result<AnalysisResult, AnalysisError> {
        tokio::time::sleep(self.latency).await;
        let result = self.draw()?;
        debug!(
            "Simulated analysis of {:?} ({} bytes): {:?}",
            image.id(),
            image.len(),
            result
        );
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn draws_stay_in_range() {
        let analyzer = SimulatedAnalyzer::default();
        for _ in 0..1_000 {
            let result = analyzer.draw().unwrap();
            assert!(CALORIES.contains(&result.calories));
            assert!(PROTEIN.contains(&result.protein));
            assert!((70.0..=100.0).contains(&result.confidence));
            let tenths = result.confidence * 10.0;
            assert!((tenths - tenths.round()).abs() < 1e-9);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_configured_latency() {
        let analyzer = SimulatedAnalyzer::new(Duration::from_millis(1500));
        let image = ImagePayload::from_file("x.jpg", "image/jpeg", Bytes::from_static(b"x"));

        let started = tokio::time::Instant::now();
        analyzer.analyze(&image).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }
}
