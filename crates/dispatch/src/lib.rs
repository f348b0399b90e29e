//! # Generative dispatch (`dispatch`)
//!
//! Classification through an external text-generation model, guarded by a
//! bounded FIFO worker pool, readiness polling and linear-backoff retries,
//! with the keyword cascade from [`rules`] behind it.
//!
//! ## Request lifecycle
//!
//! 1. [`Dispatcher::dispatch`] queues the request. At most
//!    [`DispatchConfig::max_concurrency`] requests are active; the rest wait
//!    in arrival order.
//! 2. Each attempt polls [`GenerativeBackend::is_ready`] until ready or
//!    [`DispatchConfig::readiness_timeout`] elapses.
//! 3. The prompt ([`build_prompt`]) is sent; the first JSON object in the
//!    reply is extracted and validated by [`parse_classification`].
//! 4. Transient failures ([`BackendError::is_retryable`]) are retried per
//!    [`RetryConfig`]; anything else settles as "no result".
//!
//! [`ClassificationService`] wraps the dispatcher and decides, per
//! [`FallbackPolicy`], whether the keyword cascade may answer instead.
//!
//! ```no_run
//! use dispatch::{ClassificationService, DispatchConfig, FallbackPolicy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), dispatch::DispatchError> {
//! let service = ClassificationService::from_config(&DispatchConfig::default())?;
//! let result = service
//!     .classify("pintura acrílica vs vinílica", None, FallbackPolicy::AllowKeywords)
//!     .await?;
//! println!("{} ({:.2})", result.intent, result.confidence);
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod dispatcher;
mod error;
mod parse;
mod prompt;
mod retry;
mod serde_millis;
mod service;

pub use backend::{wait_until_ready, GenerativeBackend, OllamaBackend};
pub use config::DispatchConfig;
pub use dispatcher::{Dispatcher, DispatcherStats};
pub use error::{BackendError, DispatchError};
pub use parse::{extract_json_object, parse_classification};
pub use prompt::{build_prompt, INTENT_SYSTEM_PROMPT};
pub use retry::{retry_async, BackoffStrategy, RetryConfig, RetryOutcome};
pub use service::{ClassificationService, FallbackPolicy};
