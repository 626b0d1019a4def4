use std::net::SocketAddr;
use std::time::Duration;

use guard::{Camouflage, TURNSTILE_VERIFY_URL};
use serde::{Deserialize, Serialize};
use store::StoreBackendConfig;

/// Server configuration
///
/// Loaded from an optional `intake.{toml,yaml,json}` file overlaid by
/// `INTAKE__`-prefixed environment variables, e.g.
/// `INTAKE__TURNSTILE__SECRET_KEY` or `INTAKE__RATE_LIMIT__APPLY__MAX_REQUESTS`.
/// Every integration secret is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout of every outbound call (verification, store, event bus, email)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size_kb")]
    pub max_body_size_kb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub turnstile: TurnstileSettings,

    #[serde(default)]
    pub events: EventSettings,

    #[serde(default)]
    pub storage: StoreBackendConfig,

    #[serde(default)]
    pub email: EmailConfig,

    /// Bearer secret the event bus presents to `POST /api/events`
    #[serde(default)]
    pub notify_secret: Option<String>,

    #[serde(default)]
    pub camouflage: Camouflage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteLimit {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RouteLimit {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Hosted Redis REST endpoint shared by every instance. Per-process
    /// counters when unset.
    pub rest_url: Option<String>,
    pub rest_token: Option<String>,
    pub apply: RouteLimit,
    pub contact: RouteLimit,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            rest_url: None,
            rest_token: None,
            apply: RouteLimit {
                max_requests: 5,
                window_secs: 300,
            },
            contact: RouteLimit {
                max_requests: 10,
                window_secs: 600,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TurnstileSettings {
    pub secret_key: Option<String>,
    pub verify_url: String,
}

impl Default for TurnstileSettings {
    fn default() -> Self {
        Self {
            secret_key: None,
            verify_url: TURNSTILE_VERIFY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventSettings {
    pub base_url: String,
    pub event_key: Option<String>,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            base_url: dispatch::DEFAULT_EVENT_BUS_URL.to_string(),
            event_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
    pub admin_to: Option<String>,
    pub site_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        let settings = notify::EmailSettings::default();
        Self {
            api_url: notify::DEFAULT_EMAIL_API_URL.to_string(),
            api_key: None,
            from: settings.from,
            admin_to: settings.admin_to,
            site_name: settings.site_name,
        }
    }
}

impl EmailConfig {
    pub fn settings(&self) -> notify::EmailSettings {
        notify::EmailSettings {
            from: self.from.clone(),
            admin_to: self.admin_to.clone().filter(|a| !a.trim().is_empty()),
            site_name: self.site_name.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            max_body_size_kb: default_max_body_size_kb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_enabled: default_true(),
            rate_limit: RateLimitSettings::default(),
            turnstile: TurnstileSettings::default(),
            events: EventSettings::default(),
            storage: StoreBackendConfig::default(),
            email: EmailConfig::default(),
            notify_secret: None,
            camouflage: Camouflage::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional config file and the environment
    pub fn load() -> anyhow::Result<Self> {
        // a missing .env is normal outside local development
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("intake").required(false))
            .add_source(config::Environment::with_prefix("INTAKE").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Log each integration that is not configured. Called once logging is up.
    pub fn warn_missing_integrations(&self) {
        if self.turnstile.secret_key.is_none() {
            tracing::warn!("turnstile_secret_missing_applications_rejected_contact_unverified");
        }
        if self.events.event_key.is_none() {
            tracing::warn!("event_key_missing_dispatch_will_fail");
        }
        if self.storage == StoreBackendConfig::Disabled {
            tracing::warn!("lead_storage_disabled_applications_will_fail");
        }
        if self.email.api_key.is_none() {
            tracing::warn!("email_api_key_missing_notifications_will_fail");
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_kb * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_max_body_size_kb() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
