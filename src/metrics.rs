use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use guard::RateLimitDecision;

/// Entry point a submission came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Apply,
    Contact,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Apply => "apply",
            Route::Contact => "contact",
        }
    }
}

/// Metrics observer for intake pipelines.
pub trait IntakeMetrics: Send + Sync {
    fn record_rate_limit(&self, route: Route, decision: RateLimitDecision);
    fn record_submission(&self, route: Route, outcome: &'static str, latency: Duration);
}

/// Install or clear the global intake metrics recorder.
pub fn set_intake_metrics(recorder: Option<Arc<dyn IntakeMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn IntakeMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn IntakeMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn IntakeMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) fn record_rate_limit(route: Route, decision: RateLimitDecision) {
    if let Some(recorder) = metrics_recorder() {
        recorder.record_rate_limit(route, decision);
    }
}

/// Times one submission from the first pipeline step to its outcome.
pub(crate) struct SubmissionSpan {
    route: Route,
    start: Instant,
}

impl SubmissionSpan {
    pub(crate) fn start(route: Route) -> Self {
        Self {
            route,
            start: Instant::now(),
        }
    }

    pub(crate) fn finish(self, outcome: &'static str) {
        if let Some(recorder) = metrics_recorder() {
            recorder.record_submission(self.route, outcome, self.start.elapsed());
        }
    }
}
