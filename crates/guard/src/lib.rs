//! Abuse guard for lead intake.
//!
//! Three independent checks sit in front of storage:
//!
//! 1. [`RateLimiter`] - sliding window keyed by route and client address,
//!    failing open when its backend is down.
//! 2. [`honeypot_triggered`] - a hidden field only bots fill in; tripped
//!    submissions are acknowledged but dropped.
//! 3. [`run_verification`] - server-side check of a challenge-response token,
//!    failing closed on any error.
//!
//! The checks share no state. Each route builds its own limiter and picks
//! its own [`VerificationPolicy`].

mod client_ip;
mod error;
mod honeypot;
pub mod rate_limit;
pub mod verify;

pub use crate::client_ip::{client_ip, UNKNOWN_CLIENT};
pub use crate::error::{RateLimitError, VerifyError};
pub use crate::honeypot::{honeypot_triggered, Camouflage};
pub use crate::rate_limit::{
    InMemoryRateLimitBackend, RateLimitBackend, RateLimitDecision, RateLimitPolicy, RateLimiter,
    RestRateLimitBackend,
};
pub use crate::verify::{
    run_verification, BotVerifier, StaticVerifier, TurnstileVerifier, VerificationOutcome,
    VerificationPolicy, VerificationStep, TURNSTILE_VERIFY_URL,
};
