//! Intake Server - HTTP API for the lead intake pipeline
//!
//! Exposes the application and contact pipelines of the `intake` crate,
//! plus the endpoint the event bus delivers notification events to.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe with per-integration status
//! - `GET /metrics` - Prometheus metrics
//! - `POST /api/apply` - Application form (JSON)
//! - `POST /api/contact` - Contact form (JSON, urlencoded or multipart)
//! - `POST /api/events` - Event-bus delivery (bearer secret)

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiBody, ApiError, ApiResult};
pub use server::{build_router, init_tracing, start_server};
pub use state::AppState;
