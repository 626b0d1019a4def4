use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use guard::RateLimitError;
use intake::{
    ApplyPipeline, Camouflage, Dispatcher, InMemoryLeadStore, InMemoryRateLimitBackend,
    IntakeError, IntakeOutcome, LeadStore, MemoryPublisher, RateLimitBackend, RateLimitPolicy,
    RateLimiter, Receipt, SchemaError, StaticVerifier, StoreBackendConfig, LEAD_CREATED,
    LEGACY_CONTACT_SUBMITTED,
};
use serde_json::json;

fn limiter(backend: Arc<dyn RateLimitBackend>) -> RateLimiter {
    RateLimiter::new(
        backend,
        RateLimitPolicy::new("apply", 5, Duration::from_secs(300)),
    )
}

fn receipt() -> Receipt {
    Receipt::new("203.0.113.7", "Mozilla/5.0")
}

#[tokio::test]
async fn taro_end_to_end() -> Result<(), IntakeError> {
    let store = Arc::new(InMemoryLeadStore::new());
    let publisher = Arc::new(MemoryPublisher::new());
    let verifier = Arc::new(StaticVerifier::passing());
    let pipeline = ApplyPipeline::new(
        limiter(Arc::new(InMemoryRateLimitBackend::new())),
        verifier.clone(),
        store.clone(),
        Dispatcher::new(publisher.clone()),
    )
    .with_camouflage(Camouflage::none());

    let body = serde_json::to_vec(&json!({
        "name": "Taro",
        "email": "Taro@Example.com",
        "message": "Please contact me about pricing",
        "cf-turnstile-response": "validtoken123",
        "hp": ""
    }))
    .unwrap();

    let outcome = pipeline.process(&body, &receipt()).await?;
    assert!(matches!(outcome, IntakeOutcome::Accepted { .. }));

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].email, "taro@example.com");
    assert_eq!(records[0].detail, "Please contact me about pricing");

    let events = publisher.events();
    assert_eq!(publisher.calls(), 2);
    assert_eq!(events[0].name, LEAD_CREATED);
    assert_eq!(events[1].name, LEGACY_CONTACT_SUBMITTED);
    for event in &events {
        assert_eq!(event.data.message, "Please contact me about pricing");
        assert_eq!(event.data.lead_id, records[0].id.to_string());
    }
    Ok(())
}

#[tokio::test]
async fn current_shape_and_hybrid_body() {
    let store = Arc::new(InMemoryLeadStore::new());
    let publisher = Arc::new(MemoryPublisher::new());
    let pipeline = ApplyPipeline::new(
        limiter(Arc::new(InMemoryRateLimitBackend::new())),
        Arc::new(StaticVerifier::passing()),
        store.clone(),
        Dispatcher::new(publisher.clone()),
    )
    .with_camouflage(Camouflage::none());

    let current = serde_json::to_vec(&json!({
        "name": "Hanako",
        "email": "hanako@example.com",
        "detail": "We need a new storefront",
        "turnstileToken": "validtoken123",
        "company": "Hanako Foods"
    }))
    .unwrap();
    pipeline.process(&current, &receipt()).await.unwrap();
    assert_eq!(store.records()[0].company, "Hanako Foods");

    // legacy message with the current token name satisfies neither shape
    let hybrid = serde_json::to_vec(&json!({
        "name": "Hanako",
        "email": "hanako@example.com",
        "message": "We need a new storefront",
        "turnstileToken": "validtoken123"
    }))
    .unwrap();
    let err = pipeline.process(&hybrid, &receipt()).await.unwrap_err();
    assert!(matches!(err, IntakeError::Schema(SchemaError::Invalid)));
    assert_eq!(store.len(), 1);
    assert_eq!(publisher.calls(), 2);
}

#[tokio::test]
async fn malformed_json_is_unparseable() {
    let publisher = Arc::new(MemoryPublisher::new());
    let pipeline = ApplyPipeline::new(
        limiter(Arc::new(InMemoryRateLimitBackend::new())),
        Arc::new(StaticVerifier::passing()),
        Arc::new(InMemoryLeadStore::new()),
        Dispatcher::new(publisher.clone()),
    );

    let err = pipeline.process(b"{not json", &receipt()).await.unwrap_err();
    assert!(matches!(err, IntakeError::Schema(SchemaError::InvalidJson(_))));
    assert_eq!(err.outcome(), "unparseable");
    assert_eq!(publisher.calls(), 0);
}

struct BrokenBackend;

#[async_trait]
impl RateLimitBackend for BrokenBackend {
    async fn try_acquire(
        &self,
        _key: &str,
        _max_requests: u32,
        _window: Duration,
    ) -> Result<bool, RateLimitError> {
        Err(RateLimitError::Transport("connection refused".into()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn rate_limit_backend_outage_admits_requests() {
    let pipeline = ApplyPipeline::new(
        limiter(Arc::new(BrokenBackend)),
        Arc::new(StaticVerifier::passing()),
        Arc::new(InMemoryLeadStore::new()),
        Dispatcher::new(Arc::new(MemoryPublisher::new())),
    );

    for _ in 0..10 {
        pipeline.admit(&receipt()).await.unwrap();
    }
}

#[cfg(feature = "embedded")]
#[tokio::test]
async fn redb_backend_persists_applications() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.redb");
    let store: Arc<dyn LeadStore> = StoreBackendConfig::redb(path.to_string_lossy())
        .build(reqwest_client())
        .unwrap();
    assert_eq!(store.name(), "redb");

    let pipeline = ApplyPipeline::new(
        limiter(Arc::new(InMemoryRateLimitBackend::new())),
        Arc::new(StaticVerifier::passing()),
        store,
        Dispatcher::new(Arc::new(MemoryPublisher::new())),
    );
    let body = serde_json::to_vec(&json!({
        "name": "Taro",
        "email": "taro@example.com",
        "detail": "Please contact me about pricing",
        "turnstileToken": "validtoken123"
    }))
    .unwrap();

    let outcome = pipeline.process(&body, &receipt()).await.unwrap();
    assert!(matches!(outcome, IntakeOutcome::Accepted { .. }));
}

#[tokio::test(start_paused = true)]
async fn honeypot_waits_before_answering() {
    let publisher = Arc::new(MemoryPublisher::new());
    let pipeline = ApplyPipeline::new(
        limiter(Arc::new(InMemoryRateLimitBackend::new())),
        Arc::new(StaticVerifier::passing()),
        Arc::new(InMemoryLeadStore::new()),
        Dispatcher::new(publisher.clone()),
    )
    .with_camouflage(Camouflage {
        min_delay_ms: 200,
        max_delay_ms: 200,
    });
    let body = serde_json::to_vec(&json!({
        "name": "Bot",
        "email": "bot@example.com",
        "detail": "Buy cheap watches now",
        "turnstileToken": "validtoken123",
        "honeypot": "filled"
    }))
    .unwrap();

    let started = tokio::time::Instant::now();
    let outcome = pipeline.process(&body, &receipt()).await.unwrap();
    assert_eq!(outcome, IntakeOutcome::SilentlyAccepted);
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(publisher.calls(), 0);
}

fn reqwest_client() -> reqwest::Client {
    reqwest::Client::new()
}
