//! Prometheus export of the intake pipeline counters.

use std::sync::Arc;
use std::time::Duration;

use guard::RateLimitDecision;
use intake::{set_intake_metrics, IntakeMetrics, Route};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const SUBMISSIONS_TOTAL: &str = "intake_submissions_total";
pub const SUBMISSION_DURATION: &str = "intake_submission_duration_seconds";
pub const RATE_LIMIT_DECISIONS_TOTAL: &str = "intake_rate_limit_decisions_total";

/// Forwards pipeline observations to the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusIntakeMetrics;

impl IntakeMetrics for PrometheusIntakeMetrics {
    fn record_rate_limit(&self, route: Route, decision: RateLimitDecision) {
        metrics::counter!(
            RATE_LIMIT_DECISIONS_TOTAL,
            "route" => route.as_str(),
            "decision" => decision.as_str()
        )
        .increment(1);
    }

    fn record_submission(&self, route: Route, outcome: &'static str, latency: Duration) {
        metrics::counter!(
            SUBMISSIONS_TOTAL,
            "route" => route.as_str(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(SUBMISSION_DURATION, "route" => route.as_str())
            .record(latency.as_secs_f64());
    }
}

/// Install the global Prometheus recorder and hook the pipelines into it.
pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    set_intake_metrics(Some(Arc::new(PrometheusIntakeMetrics)));
    Ok(handle)
}
