//! Poll loop driving graduation notifications
//!
//! One [`Monitor`] owns the whole pipeline: it connects the sink, keeps the
//! channel registry warm, and every interval reads the watch-list, fetches
//! curve state for each token concurrently and pushes a status embed per
//! token. A failure for one token never aborts the cycle for the others.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use crate::blockchain::{ChainClient, CurveClient};
use crate::config::Config;
use crate::registry::ChannelRegistry;
use crate::sink::{status_embed, NotificationSink};
use crate::utils::error::Result;
use crate::utils::rate_limiter::RpcRateLimiter;
use crate::utils::retry::RetryPolicy;
use crate::watchlist::WatchlistSource;

/// Category that holds token channels when none is configured.
const DEFAULT_CATEGORY_NAME: &str = "token-statuses";

/// Lifecycle of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Initializing,
    Running,
    Polling,
    Dispatching,
    Stopped,
}

pub struct Monitor {
    config: Config,
    sink: Arc<dyn NotificationSink>,
    watchlist: WatchlistSource,
    client: Arc<dyn ChainClient>,
    retry: RetryPolicy,
    state: MonitorState,
    shutdown: Arc<Notify>,
}

impl Monitor {
    /// Build a monitor backed by a live RPC client.
    pub fn new(config: Config, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        let limiter = Arc::new(RpcRateLimiter::new(config.solana.rate_limit_rps));
        let client = Arc::new(CurveClient::new(&config.solana, limiter)?);
        Ok(Self::with_client(config, sink, client))
    }

    /// Build a monitor around a caller-supplied chain client.
    pub fn with_client(
        config: Config,
        sink: Arc<dyn NotificationSink>,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        let retry = RetryPolicy::new(
            config.retry.max_retries,
            Duration::from_secs_f64(config.retry.base_delay_secs),
            Duration::from_secs_f64(config.retry.max_delay_secs),
        );
        let watchlist = WatchlistSource::new(config.monitor.tokens_file.clone());

        Self {
            config,
            sink,
            watchlist,
            client,
            retry,
            state: MonitorState::Idle,
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Handle for requesting a graceful stop from another task.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    fn transition(&mut self, next: MonitorState) {
        log::debug!("Monitor state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run until shutdown is requested. Returns an error only when the sink
    /// cannot be brought up; everything after that is handled per token.
    pub async fn run(&mut self) -> Result<()> {
        let registry = match self.initialize().await {
            Ok(registry) => registry,
            Err(e) => {
                self.transition(MonitorState::Stopped);
                return Err(e);
            }
        };

        self.transition(MonitorState::Running);
        log::info!(
            "Monitoring {} every {}s via {} sink",
            self.watchlist.path().display(),
            self.config.monitor.interval_secs,
            self.sink.name()
        );

        let period = Duration::from_secs(self.config.monitor.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle(&registry).await;
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }

        self.transition(MonitorState::Stopped);
        log::info!("Monitor stopped");
        Ok(())
    }

    /// Connect the sink, resolve the category and pre-open channels for the
    /// current watch-list. Channel failures here are retried by the cycle;
    /// only a sink that will not come up is fatal.
    async fn initialize(&mut self) -> Result<ChannelRegistry> {
        self.transition(MonitorState::Initializing);

        self.sink.connect().await?;

        let category = self
            .sink
            .get_or_create_category(
                self.config.discord.category_id.as_deref(),
                DEFAULT_CATEGORY_NAME,
            )
            .await?;
        let registry = ChannelRegistry::new(self.sink.clone(), category);

        for token in self.watchlist.read_tokens() {
            if let Err(e) = registry.ensure_channel(&token).await {
                log::error!("Channel setup for {} failed: {}", token, e);
            }
        }

        Ok(registry)
    }

    async fn run_cycle(&mut self, registry: &ChannelRegistry) {
        self.transition(MonitorState::Polling);
        let tokens = self.watchlist.read_tokens();
        if tokens.is_empty() {
            log::debug!("Watch-list is empty, nothing to poll");
            self.transition(MonitorState::Running);
            return;
        }

        self.transition(MonitorState::Dispatching);
        let this = &*self;
        let outcomes =
            join_all(tokens.iter().map(|token| this.process_token(registry, token))).await;

        let delivered = outcomes.iter().filter(|delivered| **delivered).count();
        log::info!("Cycle complete: {}/{} tokens notified", delivered, tokens.len());
        self.transition(MonitorState::Running);
    }

    /// Handle one token within a cycle. All failures are logged and
    /// contained so they cannot take down the other tokens.
    async fn process_token(&self, registry: &ChannelRegistry, token: &str) -> bool {
        let channel = match registry.ensure_channel(token).await {
            Ok(channel) => channel,
            Err(e) => {
                log::error!("Channel setup for {} failed: {}", token, e);
                return false;
            }
        };

        let status = match self.retry.run(|| self.client.fetch_status(token)).await {
            Ok(status) => status,
            Err(e) => {
                log::warn!(
                    "Status fetch for {} failed after {} attempt(s): {}",
                    token,
                    self.retry.max_attempts(),
                    e
                );
                return false;
            }
        };

        log::debug!("{} graduation progress {:.2}%", token, status.percentage);

        if let Err(e) = self.sink.send_message(&channel, &status_embed(&status)).await {
            log::warn!("Status delivery for {} failed: {}", token, e);
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::TokenStatus;
    use crate::sink::testing::RecordingSink;
    use crate::utils::error::Error;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    enum Outcome {
        Progress(f64),
        Missing,
    }

    /// Chain stub with a fixed outcome per token.
    struct FakeChain {
        outcomes: HashMap<String, Outcome>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeChain {
        fn new(outcomes: Vec<(&str, Outcome)>) -> Self {
            Self {
                outcomes: outcomes.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls_for(&self, token: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|t| *t == token).count()
        }
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn fetch_status(&self, token: &str) -> crate::Result<TokenStatus> {
            self.calls.lock().unwrap().push(token.to_string());
            match self.outcomes.get(token) {
                Some(Outcome::Progress(percentage)) => {
                    Ok(TokenStatus { mint: token.to_string(), percentage: *percentage })
                }
                Some(Outcome::Missing) => {
                    Err(Error::NotFound(format!("no curve for {}", token)))
                }
                None => Err(Error::TransportError(format!("no fake entry for {}", token))),
            }
        }
    }

    /// Chain stub that fails a fixed number of times before succeeding.
    struct FlakyChain {
        failures: usize,
        percentage: f64,
        calls: AtomicUsize,
    }

    impl FlakyChain {
        fn new(failures: usize, percentage: f64) -> Self {
            Self { failures, percentage, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ChainClient for FlakyChain {
        async fn fetch_status(&self, token: &str) -> crate::Result<TokenStatus> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(Error::TransportError(format!("transient failure {}", n + 1)));
            }
            Ok(TokenStatus { mint: token.to_string(), percentage: self.percentage })
        }
    }

    fn write_watchlist(path: &Path, tokens: &[&str]) {
        let body = serde_json::json!({ "tokens": tokens });
        std::fs::write(path, body.to_string()).unwrap();
    }

    fn test_config(tokens_file: &Path) -> Config {
        let mut config = Config::default();
        config.monitor.tokens_file = tokens_file.to_string_lossy().into_owned();
        config.monitor.interval_secs = 1;
        config.retry.max_retries = 2;
        config.retry.base_delay_secs = 0.01;
        config.retry.max_delay_secs = 0.05;
        config.discord.bot_token = "test-token".to_string();
        config
    }

    #[test]
    fn test_new_monitor_is_idle() {
        let sink = Arc::new(RecordingSink::new());
        let chain = Arc::new(FakeChain::new(vec![]));
        let monitor = Monitor::with_client(test_config(Path::new("tokens.json")), sink, chain);
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[tokio::test]
    async fn test_cycle_isolates_per_token_failures() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        write_watchlist(&path, &["MintA", "MintB"]);

        let sink = Arc::new(RecordingSink::new());
        let chain = Arc::new(FakeChain::new(vec![
            ("MintA", Outcome::Missing),
            ("MintB", Outcome::Progress(55.0)),
        ]));
        let mut monitor = Monitor::with_client(test_config(&path), sink.clone(), chain.clone());

        let registry = monitor.initialize().await.unwrap();
        monitor.run_cycle(&registry).await;

        assert_eq!(monitor.state(), MonitorState::Running);
        assert_eq!(sink.created_count(), 2);

        // Two welcome embeds plus one status update for the healthy token.
        assert_eq!(sink.message_count(), 3);
        let messages = sink.messages.lock().unwrap();
        let statuses: Vec<_> = messages
            .iter()
            .filter(|(_, embed)| embed.title == "📊 Token Status Update")
            .collect();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].1.fields[1].value, "55.00%");

        // The missing token used its whole retry budget, the healthy one
        // succeeded on the first attempt.
        assert_eq!(chain.calls_for("MintA"), 2);
        assert_eq!(chain.calls_for("MintB"), 1);
    }

    #[tokio::test]
    async fn test_cycle_with_unreadable_watchlist_does_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let sink = Arc::new(RecordingSink::new());
        let chain = Arc::new(FakeChain::new(vec![("MintA", Outcome::Progress(10.0))]));
        let mut monitor = Monitor::with_client(test_config(&path), sink.clone(), chain);

        // The file does not exist yet, so cycles are no-ops.
        let registry = monitor.initialize().await.unwrap();
        monitor.run_cycle(&registry).await;
        assert_eq!(monitor.state(), MonitorState::Running);
        assert_eq!(sink.created_count(), 0);
        assert_eq!(sink.message_count(), 0);

        // Once the file appears, the next cycle picks it up.
        write_watchlist(&path, &["MintA"]);
        monitor.run_cycle(&registry).await;
        assert_eq!(sink.created_count(), 1);
        assert_eq!(sink.message_count(), 2);
    }

    #[tokio::test]
    async fn test_run_fails_fast_when_sink_rejects_connection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        write_watchlist(&path, &["MintA"]);

        let sink = Arc::new(RecordingSink::failing_connect());
        let chain = Arc::new(FakeChain::new(vec![]));
        let mut monitor = Monitor::with_client(test_config(&path), sink, chain);

        let result = monitor.run().await;
        assert_matches!(result, Err(Error::SinkConnectionError(_)));
        assert_eq!(monitor.state(), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_loop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        write_watchlist(&path, &[]);

        let sink = Arc::new(RecordingSink::new());
        let chain = Arc::new(FakeChain::new(vec![]));
        let mut monitor = Monitor::with_client(test_config(&path), sink, chain);
        let shutdown = monitor.shutdown_handle();

        let handle = tokio::spawn(async move { monitor.run().await });
        shutdown.notify_one();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("monitor did not stop")
            .expect("monitor task panicked");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_transient_rpc_failures_are_retried_within_a_cycle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        write_watchlist(&path, &["MintA"]);

        let sink = Arc::new(RecordingSink::new());
        let chain = Arc::new(FlakyChain::new(2, 50.0));
        let mut config = test_config(&path);
        config.retry.max_retries = 3;
        let mut monitor = Monitor::with_client(config, sink.clone(), chain.clone());

        let registry = monitor.initialize().await.unwrap();
        monitor.run_cycle(&registry).await;

        assert_eq!(chain.calls.load(Ordering::SeqCst), 3);
        // Welcome embed plus the delivered status update.
        assert_eq!(sink.message_count(), 2);
    }
}
