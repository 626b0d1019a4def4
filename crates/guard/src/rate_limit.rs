//! Sliding-window rate limiting keyed by client.
//!
//! The limiter fails open: when the counter backend cannot be reached the
//! request is allowed and the failure is logged. Bot verification in
//! [`crate::verify`] fails closed and shares no code with this module.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::RateLimitError;

/// Counter store behind a [`RateLimiter`].
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Record a hit for `key` if fewer than `max_requests` hits fall inside
    /// the trailing `window`. Returns `false` when the key is over the limit
    /// (the hit is then not recorded).
    async fn try_acquire(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<bool, RateLimitError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Per-route limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Key prefix separating one route's counters from another's.
    pub prefix: String,
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(prefix: impl Into<String>, max_requests: u32, window: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            max_requests,
            window,
        }
    }

    fn key(&self, client: &str) -> String {
        format!("{}:{}", self.prefix, client)
    }
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Denied,
    /// The backend failed; the request is allowed anyway.
    BackendErrorAllowed,
}

impl RateLimitDecision {
    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitDecision::Denied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitDecision::Allowed => "allowed",
            RateLimitDecision::Denied => "denied",
            RateLimitDecision::BackendErrorAllowed => "backend_error_allowed",
        }
    }
}

/// A named-route limiter: one backend plus one policy.
#[derive(Clone)]
pub struct RateLimiter {
    backend: Arc<dyn RateLimitBackend>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(backend: Arc<dyn RateLimitBackend>, policy: RateLimitPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Check and record one request from `client`.
    pub async fn check(&self, client: &str) -> RateLimitDecision {
        let key = self.policy.key(client);
        match self
            .backend
            .try_acquire(&key, self.policy.max_requests, self.policy.window)
            .await
        {
            Ok(true) => RateLimitDecision::Allowed,
            Ok(false) => {
                debug!(key = %key, backend = self.backend.name(), "rate_limit_denied");
                RateLimitDecision::Denied
            }
            Err(err) => {
                warn!(
                    key = %key,
                    backend = self.backend.name(),
                    error = %err,
                    "rate_limit_backend_failed_open"
                );
                RateLimitDecision::BackendErrorAllowed
            }
        }
    }
}

/// How often the in-memory backend drops keys whose window has passed.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct SlidingLog {
    window: Duration,
    hits: VecDeque<Instant>,
}

impl SlidingLog {
    fn is_expired(&self, now: Instant) -> bool {
        self.hits
            .back()
            .is_none_or(|newest| now.saturating_duration_since(*newest) >= self.window)
    }
}

/// In-process sliding log. Suitable for a single instance and for tests.
///
/// Keys are caller-controlled, so stale logs are swept at most once per
/// [`SWEEP_INTERVAL`] to keep the map bounded by the clients seen within
/// one window.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitBackend {
    logs: DashMap<String, SlidingLog>,
    last_sweep: Mutex<Option<Instant>>,
}

impl InMemoryRateLimitBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    fn sweep_if_due(&self, now: Instant) {
        {
            let mut last = self
                .last_sweep
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match *last {
                Some(at) if now.saturating_duration_since(at) < SWEEP_INTERVAL => return,
                _ => *last = Some(now),
            }
        }
        let before = self.logs.len();
        self.logs.retain(|_, log| !log.is_expired(now));
        let evicted = before.saturating_sub(self.logs.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.logs.len(), "rate_limit_keys_swept");
        }
    }

    fn acquire_at(&self, key: &str, max_requests: u32, window: Duration, now: Instant) -> bool {
        // No entry guard may be held while sweeping.
        self.sweep_if_due(now);

        let mut entry = self.logs.entry(key.to_string()).or_insert_with(|| SlidingLog {
            window,
            hits: VecDeque::new(),
        });
        let log = entry.value_mut();
        log.window = window;

        while let Some(oldest) = log.hits.front() {
            if now.saturating_duration_since(*oldest) >= window {
                log.hits.pop_front();
            } else {
                break;
            }
        }

        if log.hits.len() >= max_requests as usize {
            return false;
        }
        log.hits.push_back(now);
        true
    }
}

#[async_trait]
impl RateLimitBackend for InMemoryRateLimitBackend {
    async fn try_acquire(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<bool, RateLimitError> {
        Ok(self.acquire_at(key, max_requests, window, Instant::now()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Atomic sliding window over a sorted set: drop expired members, count,
/// add when under the limit.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', key, 0, now - window)
if redis.call('ZCARD', key) >= limit then
  return 0
end
redis.call('ZADD', key, now, ARGV[4])
redis.call('PEXPIRE', key, window)
return 1
"#;

/// Hosted Redis reached through its REST interface (one `EVAL` per check).
pub struct RestRateLimitBackend {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestRateLimitBackend {
    pub fn new(client: reqwest::Client, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn eval_command(key: &str, max_requests: u32, window: Duration, now_ms: u128) -> Value {
        let member = format!("{now_ms}-{}", fastrand::u64(..));
        json!([
            "EVAL",
            SLIDING_WINDOW_SCRIPT,
            "1",
            key,
            now_ms.to_string(),
            window.as_millis().to_string(),
            max_requests.to_string(),
            member,
        ])
    }
}

#[derive(Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl RateLimitBackend for RestRateLimitBackend {
    async fn try_acquire(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<bool, RateLimitError> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RateLimitError::Backend(e.to_string()))?
            .as_millis();

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&Self::eval_command(key, max_requests, window, now_ms))
            .send()
            .await
            .map_err(|e| RateLimitError::Transport(e.to_string()))?;

        let status = response.status();
        let reply: RestReply = response
            .json()
            .await
            .map_err(|e| RateLimitError::Backend(format!("status {status}: {e}")))?;

        if let Some(error) = reply.error {
            return Err(RateLimitError::Backend(error));
        }
        match reply.result.as_ref().and_then(Value::as_i64) {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            other => Err(RateLimitError::Backend(format!(
                "unexpected script result: {other:?}"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
