use std::sync::Arc;
use std::time::Duration;

use intake::{
    Camouflage, ContactPipeline, Dispatcher, FormFields, InMemoryRateLimitBackend, IntakeOutcome,
    MemoryPublisher, RateLimitPolicy, RateLimiter, Receipt, StaticVerifier,
};
use serde_json::json;

fn pipeline(publisher: Arc<MemoryPublisher>) -> ContactPipeline {
    ContactPipeline::new(
        RateLimiter::new(
            Arc::new(InMemoryRateLimitBackend::new()),
            RateLimitPolicy::new("contact", 10, Duration::from_secs(600)),
        ),
        Arc::new(StaticVerifier::passing()),
        Dispatcher::new(publisher),
    )
    .with_camouflage(Camouflage::none())
}

#[tokio::test]
async fn urlencoded_body_with_attribution() {
    let publisher = Arc::new(MemoryPublisher::new());
    let pipeline = pipeline(publisher.clone());

    let body = "name=Taro&email=Taro%40Example.com\
                &detail=Please+contact+me+about+pricing\
                &cf-turnstile-response=validtoken123\
                &utm_campaign=spring&pagePath=%2Fpricing\
                &assets=logo&assets=photos&features=blog%2C+shop";
    let fields = FormFields::from_urlencoded_bytes(body.as_bytes()).unwrap();

    let outcome = pipeline
        .process(&fields, &Receipt::new("198.51.100.4", "Mozilla/5.0"))
        .await
        .unwrap();
    let IntakeOutcome::Accepted { lead_id } = outcome else {
        panic!("expected an accepted submission");
    };

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.data.lead_id, lead_id);
    assert_eq!(event.id, format!("{lead_id}:lead/created"));

    let payload = serde_json::to_value(&event.data).unwrap();
    assert_eq!(payload["email"], "taro@example.com");
    assert_eq!(payload["message"], "Please contact me about pricing");
    assert_eq!(payload["detail"], "Please contact me about pricing");
    assert_eq!(payload["utm_campaign"], "spring");
    assert_eq!(payload["utmCampaign"], "spring");
    assert_eq!(payload["page_path"], "/pricing");
    assert_eq!(payload["pagePath"], "/pricing");
    assert_eq!(payload["assets"], json!(["logo", "photos"]));
    assert_eq!(payload["features"], json!(["blog", "shop"]));
    assert_eq!(payload["clientIp"], "198.51.100.4");
}

#[tokio::test]
async fn multipart_style_pairs_are_accepted() {
    let publisher = Arc::new(MemoryPublisher::new());
    let pipeline = pipeline(publisher.clone());

    let fields = FormFields::from_pairs(vec![
        ("name".to_string(), "Taro".to_string()),
        ("email".to_string(), "taro@example.com".to_string()),
        ("message".to_string(), "Please contact me about pricing".to_string()),
        ("turnstileToken".to_string(), "validtoken123".to_string()),
        ("features[]".to_string(), "blog".to_string()),
        ("features[]".to_string(), "shop".to_string()),
    ]);

    let outcome = pipeline
        .process(&fields, &Receipt::new("unknown", ""))
        .await
        .unwrap();
    assert!(matches!(outcome, IntakeOutcome::Accepted { .. }));
    assert_eq!(
        publisher.events()[0].data.attribution["features"],
        json!(["blog", "shop"])
    );
}
