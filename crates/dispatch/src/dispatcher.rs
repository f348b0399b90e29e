//! Bounded FIFO worker pool in front of the generative backend.
//!
//! Requests enter an mpsc channel in arrival order. A single loop takes a
//! semaphore permit, then pulls the next entry and runs it on its own task
//! holding that permit; dropping the permit on completion lets the loop
//! start the next queued entry. Start order is therefore strict FIFO while
//! completion order is whatever the backend produces.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use rules::ClassificationResult;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::time::Instant;

use crate::backend::{wait_until_ready, GenerativeBackend};
use crate::parse::parse_classification;
use crate::prompt::{build_prompt, INTENT_SYSTEM_PROMPT};
use crate::retry::retry_async;
use crate::{BackendError, DispatchConfig, DispatchError};

type Reply = Result<Option<ClassificationResult>, DispatchError>;

struct QueueEntry {
    message: String,
    context: Option<String>,
    respond_to: oneshot::Sender<Reply>,
    enqueued_at: Instant,
}

#[derive(Default)]
struct Counters {
    queued: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatcherStats {
    pub queued: usize,
    pub active: usize,
    pub peak_active: usize,
    pub completed: u64,
    pub failed: u64,
    pub max_concurrency: usize,
}

/// Handle to the worker pool. Cloning shares the same queue.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<QueueEntry>,
    counters: Arc<Counters>,
    max_concurrency: usize,
}

impl Dispatcher {
    /// Start the dispatch loop on the current tokio runtime.
    ///
    /// The loop exits once every `Dispatcher` handle is dropped and the queue
    /// has drained.
    pub fn spawn(
        backend: Arc<dyn GenerativeBackend>,
        config: DispatchConfig,
    ) -> Result<Self, DispatchError> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let counters = Arc::new(Counters::default());
        let max_concurrency = config.max_concurrency;

        tokio::spawn(run(
            rx,
            backend,
            Arc::new(config),
            Arc::new(Semaphore::new(max_concurrency)),
            Arc::clone(&counters),
        ));

        Ok(Self {
            tx,
            counters,
            max_concurrency,
        })
    }

    /// Queue one classification and wait for it to settle.
    ///
    /// `Ok(None)` means the backend answered but nothing usable came back, or
    /// it failed in a way retrying cannot fix. Exhausted retries on transient
    /// failures are returned as [`DispatchError::RetriesExhausted`].
    pub async fn dispatch(
        &self,
        message: impl Into<String>,
        context: Option<String>,
    ) -> Result<Option<ClassificationResult>, DispatchError> {
        let (respond_to, response) = oneshot::channel();
        let entry = QueueEntry {
            message: message.into(),
            context,
            respond_to,
            enqueued_at: Instant::now(),
        };

        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(entry).await.is_err() {
            self.counters.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(DispatchError::Closed);
        }

        response.await.map_err(|_| DispatchError::Closed)?
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            queued: self.counters.queued.load(Ordering::SeqCst),
            active: self.counters.active.load(Ordering::SeqCst),
            peak_active: self.counters.peak_active.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            max_concurrency: self.max_concurrency,
        }
    }
}

async fn run(
    mut rx: mpsc::Receiver<QueueEntry>,
    backend: Arc<dyn GenerativeBackend>,
    config: Arc<DispatchConfig>,
    slots: Arc<Semaphore>,
    counters: Arc<Counters>,
) {
    loop {
        // Take a slot before pulling so queued entries stay in the channel
        // in arrival order until one is free.
        let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
            break;
        };
        let Some(entry) = rx.recv().await else {
            break;
        };

        counters.queued.fetch_sub(1, Ordering::SeqCst);
        let active = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_active.fetch_max(active, Ordering::SeqCst);

        let backend = Arc::clone(&backend);
        let config = Arc::clone(&config);
        let counters = Arc::clone(&counters);
        tokio::spawn(async move {
            let _permit = permit;
            let waited_ms = entry.enqueued_at.elapsed().as_millis() as u64;
            tracing::debug!(waited_ms, active, "dispatching classification");

            let reply = run_entry(
                backend.as_ref(),
                &config,
                &entry.message,
                entry.context.as_deref(),
            )
            .await;

            match &reply {
                Ok(_) => counters.completed.fetch_add(1, Ordering::SeqCst),
                Err(_) => counters.failed.fetch_add(1, Ordering::SeqCst),
            };
            counters.active.fetch_sub(1, Ordering::SeqCst);

            // The caller may have stopped waiting; nothing to do then.
            let _ = entry.respond_to.send(reply);
        });
    }
    tracing::debug!("dispatch loop stopped");
}

async fn run_entry(
    backend: &dyn GenerativeBackend,
    config: &DispatchConfig,
    message: &str,
    context: Option<&str>,
) -> Reply {
    let started = Instant::now();
    let system = config.system_prompt.as_deref().unwrap_or(INTENT_SYSTEM_PROMPT);
    let prompt = build_prompt(system, message, context);
    let prompt = prompt.as_str();

    let outcome = retry_async(&config.retry, BackendError::is_retryable, |attempt| async move {
        wait_until_ready(
            backend,
            config.readiness_timeout,
            config.readiness_poll_interval,
        )
        .await?;
        tracing::trace!(attempt, backend = backend.name(), "sending generate request");
        backend.generate(prompt).await
    })
    .await;

    let attempts = outcome.attempts;
    match outcome.result {
        Ok(text) => match parse_classification(&text) {
            Some(mut result) => {
                result.duration_ms = started.elapsed().as_millis() as u64;
                tracing::debug!(
                    intent = %result.intent,
                    confidence = result.confidence,
                    attempts,
                    "generative classification"
                );
                Ok(Some(result))
            }
            None => {
                tracing::warn!(attempts, "generative backend returned no parseable JSON");
                Ok(None)
            }
        },
        Err(last_error) if outcome.exhausted => {
            tracing::warn!(attempts, error = %last_error, "generative backend retries exhausted");
            Err(DispatchError::RetriesExhausted {
                attempts,
                last_error,
            })
        }
        Err(error) => {
            tracing::warn!(error = %error, "generative backend failed, not retrying");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use async_trait::async_trait;
    use rules::Intent;
    use std::sync::Mutex;
    use std::time::Duration;

    const PRICE_JSON: &str =
        r#"{"intent":"price_query","confidence":0.9,"params":{"product_description":"cemento"}}"#;

    /// Scripted backend: sleeps `latency`, then pops the next scripted reply
    /// (repeating the last one when the script runs out).
    struct ScriptedBackend {
        latency: Duration,
        ready_after_polls: usize,
        script: Mutex<Vec<Result<String, BackendError>>>,
        polls: AtomicUsize,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<String, BackendError>>) -> Self {
            Self {
                latency: Duration::from_millis(100),
                ready_after_polls: 0,
                script: Mutex::new(script),
                polls: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn always(reply: Result<String, BackendError>) -> Self {
            Self::new(vec![reply])
        }
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn is_ready(&self) -> bool {
            self.polls.fetch_add(1, Ordering::SeqCst) >= self.ready_after_polls
        }

        async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(prompt.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                script[0].clone()
            }
        }
    }

    fn config(max_concurrency: usize) -> DispatchConfig {
        DispatchConfig {
            max_concurrency,
            ..Default::default()
        }
    }

    fn ok(text: &str) -> Result<String, BackendError> {
        Ok(text.to_string())
    }

    fn unavailable() -> Result<String, BackendError> {
        Err(BackendError::Status {
            status: 503,
            body: "busy".into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn burst_never_exceeds_max_concurrency() {
        let backend = Arc::new(ScriptedBackend::always(ok(PRICE_JSON)));
        let dispatcher = Dispatcher::spawn(backend.clone(), config(3)).unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let d = dispatcher.clone();
                tokio::spawn(async move { d.dispatch(format!("precio {i}"), None).await })
            })
            .collect();
        for handle in handles {
            let result = handle.await.unwrap().unwrap().unwrap();
            assert_eq!(result.intent, Intent::PriceQuery);
        }

        assert_eq!(backend.peak.load(Ordering::SeqCst), 3);
        let stats = dispatcher.stats();
        assert!(stats.peak_active <= 3);
        assert_eq!(stats.completed, 20);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.queued, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn single_slot_starts_in_arrival_order() {
        let backend = Arc::new(ScriptedBackend::always(ok(PRICE_JSON)));
        let dispatcher = Dispatcher::spawn(backend.clone(), config(1)).unwrap();

        let mut handles = Vec::new();
        for i in 0..5 {
            let d = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                d.dispatch(format!("query-{i}"), None).await
            }));
            // Make sure each send lands before the next one is issued.
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let seen = backend.seen.lock().unwrap();
        let order: Vec<usize> = seen
            .iter()
            .map(|p| (0..5).find(|i| p.contains(&format!("query-{i}"))).unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert_eq!(backend.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_with_linear_backoff() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            unavailable(),
            Err(BackendError::Connect("reset".into())),
            ok(PRICE_JSON),
        ]));
        let dispatcher = Dispatcher::spawn(backend.clone(), config(3)).unwrap();

        let started = Instant::now();
        let result = dispatcher.dispatch("precio cemento", None).await.unwrap();
        assert_eq!(result.unwrap().intent, Intent::PriceQuery);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_5xx_exhausts_retries() {
        let backend = Arc::new(ScriptedBackend::always(unavailable()));
        let dispatcher = Dispatcher::spawn(backend.clone(), config(3)).unwrap();

        let err = dispatcher.dispatch("precio", None).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::RetriesExhausted { attempts: 3, last_error: BackendError::Status { status: 503, .. } }
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        assert_eq!(dispatcher.stats().failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_gives_no_result_without_retry() {
        let backend = Arc::new(ScriptedBackend::always(Err(BackendError::Status {
            status: 400,
            body: "bad model".into(),
        })));
        let dispatcher = Dispatcher::spawn(backend.clone(), config(3)).unwrap();

        assert!(dispatcher.dispatch("precio", None).await.unwrap().is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_output_gives_no_result() {
        let backend = Arc::new(ScriptedBackend::always(ok("it is probably a price query")));
        let dispatcher = Dispatcher::spawn(backend.clone(), config(3)).unwrap();

        assert!(dispatcher.dispatch("precio", None).await.unwrap().is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_readiness_before_generating() {
        let mut scripted = ScriptedBackend::always(ok(PRICE_JSON));
        scripted.ready_after_polls = 4;
        let backend = Arc::new(scripted);
        let dispatcher = Dispatcher::spawn(backend.clone(), config(3)).unwrap();

        let started = Instant::now();
        let result = dispatcher.dispatch("precio", None).await.unwrap();
        assert!(result.is_some());
        assert_eq!(backend.polls.load(Ordering::SeqCst), 5);
        // Four one-second polls plus the simulated generate latency.
        assert!(started.elapsed() >= Duration::from_secs(4));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn never_ready_backend_exhausts() {
        let mut scripted = ScriptedBackend::always(ok(PRICE_JSON));
        scripted.ready_after_polls = usize::MAX;
        let backend = Arc::new(scripted);
        let cfg = DispatchConfig {
            readiness_timeout: Duration::from_secs(3),
            retry: RetryConfig::default().with_max_attempts(2),
            ..Default::default()
        };
        let dispatcher = Dispatcher::spawn(backend.clone(), cfg).unwrap();

        let err = dispatcher.dispatch("precio", None).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::RetriesExhausted { attempts: 2, last_error: BackendError::NotReady(_) }
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn context_is_forwarded_in_prompt() {
        let backend = Arc::new(ScriptedBackend::always(ok(PRICE_JSON)));
        let dispatcher = Dispatcher::spawn(backend.clone(), config(3)).unwrap();

        dispatcher
            .dispatch("precio pvc", Some("price_query: precio de cemento".into()))
            .await
            .unwrap();
        let seen = backend.seen.lock().unwrap();
        assert!(seen[0].contains("User query: \"precio pvc\""));
        assert!(seen[0].contains("Context from vector search:\nprice_query: precio de cemento"));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let backend = Arc::new(ScriptedBackend::always(ok(PRICE_JSON)));
        assert!(matches!(
            Dispatcher::spawn(backend, config(0)),
            Err(DispatchError::InvalidConfig(_))
        ));
    }
}
