//! The update loop.
//!
//! [`Runtime`] pulls batches from an [`UpdateSource`], wraps each update in a
//! [`Context`] and feeds it to the [`Dispatcher`] on its own task. At most
//! `dispatch.max_concurrent_updates` updates are processed at once; when the
//! limit is reached the loop stops polling until a slot frees up.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use switchyard_runtime::{ChannelSource, Runtime};
//!
//! let dp = Dispatcher::new();
//! dp.message_created().handler(echo);
//!
//! let runtime = Runtime::builder()
//!     .config_file("config/switchyard.toml")
//!     .profile("production")
//!     .build(dp)?;
//!
//! let stats = runtime.run_until_ctrl_c(source, Some(bot)).await?;
//! info!(handled = stats.handled, "bye");
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower::{Service, ServiceBuilder, ServiceExt};
use tracing::{debug, error, info, warn};

use switchyard_core::{BoxedBot, Update};
use switchyard_framework::{Context, DispatchError, Dispatcher, EnrichUpdateContext, Outcome};

use crate::config::{ConfigLoader, SwitchyardConfig};
use crate::error::RuntimeResult;
use crate::logging;
use crate::source::UpdateSource;

/// Counters for one [`Runtime::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Updates handed to the dispatcher.
    pub received: u64,
    /// Updates some handler took.
    pub handled: u64,
    /// Updates no handler matched.
    pub unhandled: u64,
    /// Updates whose processing failed and no error handler took the error.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    handled: AtomicU64,
    unhandled: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn record(&self, result: Result<Outcome, DispatchError>) {
        match result {
            Ok(outcome) if outcome.is_handled() => {
                self.handled.fetch_add(1, Ordering::Relaxed);
            }
            Ok(_) => {
                self.unhandled.fetch_add(1, Ordering::Relaxed);
                debug!("Update was not handled");
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Update processing failed");
            }
        }
    }

    fn snapshot(&self) -> RunStats {
        RunStats {
            received: self.received.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Drives a [`Dispatcher`] from an [`UpdateSource`].
pub struct Runtime {
    dispatcher: Dispatcher,
    config: SwitchyardConfig,
}

impl Runtime {
    /// Creates a runtime from an already loaded configuration.
    ///
    /// Logging is left alone; use [`Runtime::builder`] or
    /// [`logging::init_from_config`] to set it up.
    pub fn new(dispatcher: Dispatcher, config: SwitchyardConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Creates a runtime builder that loads configuration and logging.
    ///
    /// ```rust,ignore
    /// let runtime = Runtime::builder()
    ///     .config_file("config/production.toml")
    ///     .build(dispatcher)?;
    /// ```
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &SwitchyardConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn context_for(&self, update: Update, bot: Option<&BoxedBot>) -> Context {
        let ctx = Context::new(update).with(EnrichUpdateContext(
            self.config.dispatch.enrich_update_context,
        ));
        match bot {
            Some(bot) => ctx.with_bot(Arc::clone(bot)),
            None => ctx,
        }
    }

    /// Processes updates until `shutdown` is cancelled or the source closes.
    ///
    /// In-flight updates get `dispatch.shutdown_grace_ms` to finish before
    /// the call returns.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Source`](crate::RuntimeError::Source) if the
    /// source fails with a non-transient error. Failing updates never stop
    /// the loop; they are logged and counted in [`RunStats::failed`].
    pub async fn run<S>(
        &self,
        mut source: S,
        bot: Option<BoxedBot>,
        shutdown: CancellationToken,
    ) -> RuntimeResult<RunStats>
    where
        S: UpdateSource,
    {
        let dispatch = &self.config.dispatch;
        let limit = dispatch.max_concurrent_updates.max(1);
        let mut service = ServiceBuilder::new()
            .concurrency_limit(limit)
            .service(self.dispatcher.clone());
        let tracker = TaskTracker::new();
        let counters = Arc::new(Counters::default());

        info!(max_concurrent_updates = limit, "Runtime started");

        let result: RuntimeResult<()> = 'poll: loop {
            let polled = tokio::select! {
                biased;
                () = shutdown.cancelled() => break 'poll Ok(()),
                polled = source.poll() => polled,
            };

            let batch = match polled {
                Ok(batch) => batch,
                Err(e) if e.is_transient() => {
                    warn!(error = %e, retry_in = ?dispatch.poll_interval(), "Update source failed, retrying");
                    tokio::select! {
                        biased;
                        () = shutdown.cancelled() => break 'poll Ok(()),
                        () = tokio::time::sleep(dispatch.poll_interval()) => {}
                    }
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "Update source failed");
                    break 'poll Err(e.into());
                }
            };

            if batch.is_empty() && source.is_closed() {
                info!("Update source closed");
                break 'poll Ok(());
            }
            debug!(count = batch.len(), "Received updates");

            for update in batch {
                let ready = tokio::select! {
                    biased;
                    () = shutdown.cancelled() => break 'poll Ok(()),
                    ready = ServiceExt::<Context>::ready(&mut service) => ready,
                };
                counters.received.fetch_add(1, Ordering::Relaxed);

                match ready {
                    Ok(svc) => {
                        let response = svc.call(self.context_for(update, bot.as_ref()));
                        let counters = Arc::clone(&counters);
                        tracker.spawn(async move {
                            counters.record(response.await);
                        });
                    }
                    Err(e) => counters.record(Err(e)),
                }
            }
        };

        tracker.close();
        if tokio::time::timeout(dispatch.shutdown_grace(), tracker.wait())
            .await
            .is_err()
        {
            warn!(
                in_flight = tracker.len(),
                "Shutdown grace period elapsed with updates still running"
            );
        }

        let stats = counters.snapshot();
        info!(
            received = stats.received,
            handled = stats.handled,
            unhandled = stats.unhandled,
            failed = stats.failed,
            "Runtime stopped"
        );
        result.map(|()| stats)
    }

    /// Runs until Ctrl+C (or SIGTERM on unix) is received.
    pub async fn run_until_ctrl_c<S>(
        &self,
        source: S,
        bot: Option<BoxedBot>,
    ) -> RuntimeResult<RunStats>
    where
        S: UpdateSource,
    {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            wait_for_shutdown().await;
            trigger.cancel();
        });

        info!("Switchyard runtime is now running. Press Ctrl+C to stop.");
        let result = self.run(source, bot, shutdown.clone()).await;
        shutdown.cancel();
        result
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: SwitchyardConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration, installs logging and builds the runtime.
    pub fn build(self, dispatcher: Dispatcher) -> RuntimeResult<Runtime> {
        let config = self.config_loader.load()?;
        logging::init_from_config(&config.logging)?;

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );
        Ok(Runtime::new(dispatcher, config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use switchyard_core::{ApiError, BotStarted, BotStopped, User};
    use switchyard_framework::Event;

    use super::*;
    use crate::RuntimeError;
    use crate::source::ChannelSource;

    fn started(chat_id: i64) -> Update {
        Update::from(BotStarted {
            chat_id,
            user: User::new(chat_id, "Ann"),
            payload: None,
            user_locale: None,
            timestamp: 0,
        })
    }

    fn stopped(chat_id: i64) -> Update {
        Update::from(BotStopped {
            chat_id,
            user: User::new(chat_id, "Ann"),
            user_locale: None,
            timestamp: 0,
        })
    }

    fn runtime(dispatcher: Dispatcher) -> Runtime {
        let mut config = SwitchyardConfig::default();
        config.dispatch.poll_interval_ms = 5;
        config.dispatch.shutdown_grace_ms = 1000;
        Runtime::new(dispatcher, config)
    }

    /// Replays scripted poll results, then reports itself closed.
    struct ScriptedSource {
        script: VecDeque<Result<Vec<Update>, ApiError>>,
    }

    impl ScriptedSource {
        fn new(script: impl IntoIterator<Item = Result<Vec<Update>, ApiError>>) -> Self {
            Self {
                script: script.into_iter().collect(),
            }
        }
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn poll(&mut self) -> Result<Vec<Update>, ApiError> {
            self.script.pop_front().unwrap_or(Ok(Vec::new()))
        }

        fn is_closed(&self) -> bool {
            self.script.is_empty()
        }
    }

    #[tokio::test]
    async fn test_run_counts_outcomes_until_source_closes() {
        let dp = Dispatcher::new();
        dp.bot_started()
            .handler(|event: Event<BotStarted>| async move {
                if event.chat_id == 3 {
                    Err(ApiError::Other("boom".into()))
                } else {
                    Ok(event.chat_id)
                }
            });

        let (tx, source) = ChannelSource::channel(16);
        for update in [started(1), started(2), started(3), stopped(4)] {
            tx.send(update).await.unwrap();
        }
        drop(tx);

        let stats = runtime(dp)
            .run(source, None, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stats, RunStats {
            received: 4,
            handled: 2,
            unhandled: 1,
            failed: 1,
        });
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let dp = Dispatcher::new();
        let (_tx, source) = ChannelSource::channel(1);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let stats = runtime(dp).run(source, None, shutdown).await.unwrap();
        assert_eq!(stats, RunStats::default());
    }

    #[tokio::test]
    async fn test_run_respects_concurrency_limit() {
        let in_flight = Arc::new(AtomicU64::new(0));
        let peak = Arc::new(AtomicU64::new(0));

        let dp = Dispatcher::new();
        let (current, max) = (Arc::clone(&in_flight), Arc::clone(&peak));
        dp.bot_started().handler(move || {
            let (current, max) = (Arc::clone(&current), Arc::clone(&max));
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
            }
        });

        let mut rt = runtime(dp);
        rt.config.dispatch.max_concurrent_updates = 1;

        let source = ScriptedSource::new([Ok((1..=4).map(started).collect())]);
        let stats = rt.run(source, None, CancellationToken::new()).await.unwrap();

        assert_eq!(stats.handled, 4);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_source_error_is_retried() {
        let dp = Dispatcher::new();
        dp.bot_started().handler(|| async {});

        let source = ScriptedSource::new([
            Err(ApiError::Timeout),
            Err(ApiError::from_status(503, "maintenance")),
            Ok(vec![started(1)]),
        ]);
        let stats = runtime(dp)
            .run(source, None, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stats.handled, 1);
    }

    #[tokio::test]
    async fn test_fatal_source_error_stops_the_loop() {
        let dp = Dispatcher::new();
        let source = ScriptedSource::new([
            Ok(vec![started(1)]),
            Err(ApiError::from_status(401, "bad token")),
            Ok(vec![started(2)]),
        ]);

        let err = runtime(dp)
            .run(source, None, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Source(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_enrich_flag_reaches_the_context() {
        let dp = Dispatcher::bare();
        dp.bot_started()
            .handler(|ctx: Context| async move { ctx.enrich_requested() });

        let mut rt = runtime(dp);
        rt.config.dispatch.enrich_update_context = true;
        let ctx = rt.context_for(started(1), None);
        let outcome = rt.dispatcher().trigger(&ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(serde_json::json!(true)));
    }
}
