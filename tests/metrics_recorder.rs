use std::sync::{Arc, Mutex};
use std::time::Duration;

use intake::{
    set_intake_metrics, ApplyPipeline, Camouflage, ContactPipeline, Dispatcher, InMemoryLeadStore,
    InMemoryRateLimitBackend, IntakeMetrics, MemoryPublisher, RateLimitDecision, RateLimitPolicy,
    RateLimiter, Receipt, Route, StaticVerifier,
};
use serde_json::json;

#[derive(Default)]
struct CountingMetrics {
    events: Mutex<Vec<String>>,
}

impl CountingMetrics {
    fn snapshot(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl IntakeMetrics for CountingMetrics {
    fn record_rate_limit(&self, route: Route, decision: RateLimitDecision) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:limit:{}", route.as_str(), decision.as_str()));
    }

    fn record_submission(&self, route: Route, outcome: &'static str, _latency: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:{}", route.as_str(), outcome));
    }
}

#[tokio::test]
async fn recorder_tracks_pipeline_outcomes() {
    let metrics = Arc::new(CountingMetrics::default());
    set_intake_metrics(Some(metrics.clone()));

    let pipeline = ApplyPipeline::new(
        RateLimiter::new(
            Arc::new(InMemoryRateLimitBackend::new()),
            RateLimitPolicy::new("apply", 1, Duration::from_secs(300)),
        ),
        Arc::new(StaticVerifier::failing()),
        Arc::new(InMemoryLeadStore::new()),
        Dispatcher::new(Arc::new(MemoryPublisher::new())),
    )
    .with_camouflage(Camouflage::none());

    let body = serde_json::to_vec(&json!({
        "name": "Taro",
        "email": "taro@example.com",
        "detail": "Please contact me about pricing",
        "turnstileToken": "validtoken123"
    }))
    .unwrap();
    let receipt = Receipt::new("203.0.113.7", "test");

    assert!(pipeline.process(&body, &receipt).await.is_err());
    assert!(pipeline.process(&body, &receipt).await.is_err());

    let contact = ContactPipeline::new(
        RateLimiter::new(
            Arc::new(InMemoryRateLimitBackend::new()),
            RateLimitPolicy::new("contact", 10, Duration::from_secs(600)),
        ),
        Arc::new(StaticVerifier::unconfigured()),
        Dispatcher::new(Arc::new(MemoryPublisher::new())),
    );
    pipeline.reject_unreadable();
    contact.reject_unreadable();

    assert_eq!(
        metrics.snapshot(),
        vec![
            "apply:limit:allowed".to_string(),
            "apply:bot_detected".to_string(),
            "apply:limit:denied".to_string(),
            "apply:rate_limited".to_string(),
            "apply:unparseable".to_string(),
            "contact:unparseable".to_string(),
        ]
    );

    set_intake_metrics(None);
}
