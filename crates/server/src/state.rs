use std::sync::Arc;

use dispatch::{Dispatcher, HttpEventPublisher};
use guard::{
    InMemoryRateLimitBackend, RateLimitBackend, RateLimitPolicy, RateLimiter,
    RestRateLimitBackend, TurnstileVerifier,
};
use intake::{ApplyPipeline, ContactPipeline};
use metrics_exporter_prometheus::PrometheusHandle;
use notify::{HttpEmailSender, NotificationWorker};
use serde::Serialize;
use store::{LeadStore, UnconfiguredLeadStore};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    pub apply: Arc<ApplyPipeline>,

    pub contact: Arc<ContactPipeline>,

    /// Consumer side of the event bus
    pub notifier: Arc<NotificationWorker>,

    /// Prometheus render handle, set when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire every integration from configuration.
    ///
    /// Missing secrets never fail startup; the affected step fails per
    /// request instead. A storage backend that cannot be opened is logged
    /// and replaced by one that refuses every insert.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;

        let rate_backend: Arc<dyn RateLimitBackend> =
            match (&config.rate_limit.rest_url, &config.rate_limit.rest_token) {
                (Some(url), Some(token)) => {
                    Arc::new(RestRateLimitBackend::new(client.clone(), url, token))
                }
                _ => Arc::new(InMemoryRateLimitBackend::new()),
            };
        let apply_limit = config.rate_limit.apply;
        let contact_limit = config.rate_limit.contact;
        let apply_limiter = RateLimiter::new(
            rate_backend.clone(),
            RateLimitPolicy::new("apply", apply_limit.max_requests, apply_limit.window()),
        );
        let contact_limiter = RateLimiter::new(
            rate_backend,
            RateLimitPolicy::new("contact", contact_limit.max_requests, contact_limit.window()),
        );

        let verifier = Arc::new(TurnstileVerifier::with_endpoint(
            client.clone(),
            config.turnstile.secret_key.clone(),
            config.turnstile.verify_url.clone(),
        ));

        let store: Arc<dyn LeadStore> = match config.storage.build(client.clone()) {
            Ok(store) => store,
            Err(err) => {
                tracing::error!(error = %err, "lead_store_unavailable");
                Arc::new(UnconfiguredLeadStore)
            }
        };

        let dispatcher = Dispatcher::new(Arc::new(HttpEventPublisher::new(
            client.clone(),
            config.events.base_url.clone(),
            config.events.event_key.clone(),
        )));

        let apply = ApplyPipeline::new(apply_limiter, verifier.clone(), store, dispatcher.clone())
            .with_camouflage(config.camouflage);
        let contact = ContactPipeline::new(contact_limiter, verifier, dispatcher)
            .with_camouflage(config.camouflage);

        let notifier = NotificationWorker::new(
            Arc::new(HttpEmailSender::new(
                client,
                config.email.api_url.clone(),
                config.email.api_key.clone(),
            )),
            config.email.settings(),
        );

        Ok(Self::from_parts(config, apply, contact, notifier))
    }

    /// Assemble state from prebuilt pipelines.
    pub fn from_parts(
        config: ServerConfig,
        apply: ApplyPipeline,
        contact: ContactPipeline,
        notifier: NotificationWorker,
    ) -> Self {
        Self {
            config: Arc::new(config),
            apply: Arc::new(apply),
            contact: Arc::new(contact),
            notifier: Arc::new(notifier),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Bearer secret for `POST /api/events`, ignoring blank values.
    pub fn notify_secret(&self) -> Option<&str> {
        self.config
            .notify_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn readiness(&self) -> Readiness {
        let store = self.apply.store();
        Readiness {
            storage: ComponentStatus::new(store.name(), store.is_configured()),
            verification: ComponentStatus::new(
                "turnstile",
                self.apply.verifier().is_configured(),
            ),
            events: {
                let publisher = self.apply.dispatcher().publisher();
                ComponentStatus::new(publisher.name(), publisher.is_configured())
            },
            email: {
                let sender = self.notifier.sender();
                ComponentStatus::new(sender.name(), sender.is_configured())
            },
            notifications: ComponentStatus::new("events_endpoint", self.notify_secret().is_some()),
        }
    }
}

/// Whether each integration is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub storage: ComponentStatus,
    pub verification: ComponentStatus,
    pub events: ComponentStatus,
    pub email: ComponentStatus,
    pub notifications: ComponentStatus,
}

impl Readiness {
    /// Every component the submission routes depend on is configured.
    pub fn intake_ready(&self) -> bool {
        self.storage.configured && self.verification.configured && self.events.configured
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentStatus {
    pub backend: &'static str,
    pub configured: bool,
}

impl ComponentStatus {
    fn new(backend: &'static str, configured: bool) -> Self {
        Self {
            backend,
            configured,
        }
    }
}
