use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use tower::timeout::error::Elapsed;
use tower::timeout::Timeout;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};
use tracing::{debug, instrument};

use super::analyzer::{AnalysisResult, Analyzer};
use crate::common::payload::ImagePayload;
use crate::error::AnalysisError;

/// Exposes an [`Analyzer`] as a tower service.
#[derive(Clone)]
pub struct AnalysisService {
    inner: Arc<dyn Analyzer>,
}

impl AnalysisService {
    pub fn new(inner: Arc<dyn Analyzer>) -> Self {
        Self { inner }
    }
}

impl Service<ImagePayload> for AnalysisService {
    type Response = AnalysisResult;
    type Error = AnalysisError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ImagePayload) -> Self::Future {
        let inner = self.inner.clone();
        async move { inner.analyze(&req).await }.boxed()
    }
}

/// The analysis call as the workflow sees it: one payload in, one estimate out,
/// bounded by a timeout.
#[derive(Clone)]
pub struct AnalysisClient {
    service: Timeout<AnalysisService>,
    analyzer: &'static str,
    timeout: Duration,
}

impl AnalysisClient {
    pub fn new(analyzer: Arc<dyn Analyzer>, timeout: Duration) -> Self {
        let name = analyzer.name();
        let service = ServiceBuilder::new()
            .timeout(timeout)
            .service(AnalysisService::new(analyzer));
        Self {
            service,
            analyzer: name,
            timeout,
        }
    }

    pub fn analyzer_name(&self) -> &'static str {
        self.analyzer
    }

    #[instrument(skip(self, image), fields(analyzer = self.analyzer, image = %image.id()))]
    pub async fn analyze(&self, image: ImagePayload) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        let result = self
            .service
            .clone()
            .oneshot(image)
            .await
            .map_err(|e| self.classify(e));

        // Failures are reported by the workflow.
        if let Ok(analysis) = &result {
            debug!(
                "Analysis completed in {}ms: {:?}",
                start.elapsed().as_millis(),
                analysis
            );
        }
        result
    }

    fn classify(&self, err: BoxError) -> AnalysisError {
        if err.is::<Elapsed>() {
            return AnalysisError::TimedOut(self.timeout);
        }
        match err.downcast::<AnalysisError>() {
            Ok(err) => *err,
            Err(other) => AnalysisError::Failed {
                analyzer: self.analyzer,
                message: other.to_string(),
            },
        }
    }
}
