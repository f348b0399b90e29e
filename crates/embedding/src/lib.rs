//! # Intent embeddings (`embedding`)
//!
//! Turns query and exemplar text into vectors for the intent matcher.
//!
//! [`EmbeddingService::get_embedding`] checks an exact-text cache, then asks
//! the configured [`EmbeddingProvider`] once, and if that fails (disabled,
//! refused, timed out, bad status, malformed body) falls back to
//! [`deterministic_embedding`], a 128-dimensional bag of UTF-16 code units.
//! The fallback keeps the pipeline usable offline and makes repeated offline
//! runs comparable. Whatever is produced is cached under the raw text until
//! [`EmbeddingService::clear_cache`] is called.
//!
//! ```
//! use embedding::{deterministic_embedding, EmbeddingService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let service = EmbeddingService::offline();
//! let v = service.get_embedding("cemento holcim 50kg").await;
//! assert_eq!(*v, deterministic_embedding("cemento holcim 50kg"));
//! # }
//! ```

mod cache;
mod config;
mod error;
mod fallback;
mod provider;
mod service;

pub use cache::{CacheStats, EmbeddingCache};
pub use config::EmbeddingConfig;
pub use error::EmbeddingError;
pub use fallback::{deterministic_embedding, FALLBACK_DIMENSION};
pub use provider::{EmbeddingProvider, OllamaEmbeddingProvider};
pub use service::{Embedding, EmbeddingService, EmbeddingSource};
