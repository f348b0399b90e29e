//! intent-server: HTTP API for construction-materials intent classification
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
//! Every `POST` body is `{ "message": string, ... }`; anything else is a 400
//! with `Invalid payload: { message: string } expected`.
//!
//! - `POST /api/intent/embedding` - nearest exemplars (`topK` optional)
//! - `POST /api/intent/slm` - generative classification with keyword fallback
//!   (`context`, `fallback` optional)
//! - `POST /api/intent/hybrid` - nearest exemplars as context for the classifier
//! - `POST /api/intent/rank` - per-intent scores after rule bonuses (`topK` optional)
//! - `PUT /api/intent/documents` - add or replace an exemplar `{ id, intent, text }`
//! - `GET /health`, `GET /ready`, `GET /`

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
