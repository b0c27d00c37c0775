//! The collection run: connect, subscribe, wait, disconnect, tabulate.

use quotes_core::error::{CollectorError, ConnectAttempt};
use quotes_core::traits::{QuoteSession, SessionConnector};
use quotes_core::types::{MarketDataClass, ResultTable, SessionEvent, Subscription};
use quotes_core::SecurityResolver;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::book::{Applied, ObservationBook};

/// How long a run waits for data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Pause after each subscribe request
    pub per_symbol_hint: Duration,
    /// Upper bound on the wait phase
    pub overall_timeout: Duration,
    /// Longest single wait for an event before re-checking the deadline
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            per_symbol_hint: Duration::from_millis(500),
            overall_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl WaitPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    pub fn with_per_symbol_hint(mut self, hint: Duration) -> Self {
        self.per_symbol_hint = hint;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), CollectorError> {
        if self.overall_timeout.is_zero() {
            return Err(CollectorError::InvalidRequest(
                "Overall timeout must be greater than 0".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(CollectorError::InvalidRequest(
                "Poll interval must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Client ids tried in order until one connects
    pub client_ids: Vec<i32>,
    pub data_class: MarketDataClass,
    /// Generic tick list sent with every request
    pub generic_ticks: String,
    pub wait: WaitPolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            client_ids: vec![10, 20, 30, 40, 50],
            data_class: MarketDataClass::Delayed,
            generic_ticks: "233".to_string(),
            wait: WaitPolicy::default(),
        }
    }
}

/// How the wait phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every symbol has a price
    Complete,
    TimedOut,
    /// The terminal closed the session
    Closed,
}

/// Delayed quote collector.
///
/// Every call to [`Collector::collect`] opens its own session and its own
/// request id space; nothing is shared between runs.
pub struct Collector<C: SessionConnector> {
    connector: C,
    resolver: SecurityResolver,
    config: CollectorConfig,
}

impl<C: SessionConnector> Collector<C> {
    pub fn new(connector: C, resolver: SecurityResolver, config: CollectorConfig) -> Self {
        Self {
            connector,
            resolver,
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Collect using the configured wait policy.
    pub async fn collect(&self, symbols: &[String]) -> Result<ResultTable, CollectorError> {
        self.collect_with(symbols, &self.config.wait).await
    }

    /// Collect prices and short fees for `symbols`.
    ///
    /// The table has one row per symbol in input order. Symbols that saw no
    /// data carry missing values; only failing to connect is an error.
    pub async fn collect_with(
        &self,
        symbols: &[String],
        wait: &WaitPolicy,
    ) -> Result<ResultTable, CollectorError> {
        let symbols = normalize_symbols(symbols)?;
        wait.validate()?;

        let mut session = self.open_session().await?;
        let mut book = ObservationBook::new();

        let outcome = self.run(&mut session, &symbols, wait, &mut book).await;

        if let Err(e) = session.disconnect().await {
            warn!("Disconnect from {} failed: {}", self.connector.endpoint(), e);
        }

        let outcome = outcome?;
        info!(
            "Collection {:?}: {}/{} symbols priced, {} events discarded",
            outcome,
            book.priced(),
            symbols.len(),
            book.discarded()
        );

        Ok(book.into_table(&symbols))
    }

    /// Try each candidate client id until a session opens.
    async fn open_session(&self) -> Result<C::Session, CollectorError> {
        let endpoint = self.connector.endpoint();
        let mut attempts = Vec::new();

        for &client_id in &self.config.client_ids {
            debug!("Connecting to {} as client {}", endpoint, client_id);
            match self.connector.connect(client_id).await {
                Ok(session) => {
                    info!("Session open on {} with client id {}", endpoint, client_id);
                    return Ok(session);
                }
                Err(e) => {
                    warn!("Client id {} failed on {}: {}", client_id, endpoint, e);
                    attempts.push(ConnectAttempt {
                        client_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(CollectorError::Connection { endpoint, attempts })
    }

    async fn run(
        &self,
        session: &mut C::Session,
        symbols: &[String],
        wait: &WaitPolicy,
        book: &mut ObservationBook,
    ) -> Result<WaitOutcome, CollectorError> {
        session.set_data_class(self.config.data_class).await?;

        for symbol in symbols {
            let request_id = book.register(symbol);
            let subscription = Subscription::new(request_id, self.resolver.resolve(symbol));
            info!(
                "Requesting {} data for {} (req {})",
                self.config.data_class, symbol, request_id
            );
            session
                .subscribe(&subscription, &self.config.generic_ticks)
                .await?;

            if !wait.per_symbol_hint.is_zero() {
                tokio::time::sleep(wait.per_symbol_hint).await;
            }
        }

        let outcome = wait_for_prices(session.events(), book, wait).await;
        drain(session.events(), book);
        Ok(outcome)
    }
}

/// Receive events until every symbol is priced, the deadline passes, or the
/// session closes. Each receive is bounded by the poll interval.
pub(crate) async fn wait_for_prices(
    events: &mut mpsc::Receiver<SessionEvent>,
    book: &mut ObservationBook,
    wait: &WaitPolicy,
) -> WaitOutcome {
    let deadline = Instant::now() + wait.overall_timeout;

    loop {
        if book.all_priced() {
            return WaitOutcome::Complete;
        }
        let now = Instant::now();
        if now >= deadline {
            return WaitOutcome::TimedOut;
        }

        let slice = wait.poll_interval.min(deadline - now);
        match tokio::time::timeout(slice, events.recv()).await {
            Ok(Some(event)) => {
                if book.apply(event) == Applied::Closed {
                    return WaitOutcome::Closed;
                }
            }
            Ok(None) => return WaitOutcome::Closed,
            Err(_) => {}
        }
    }
}

/// Apply whatever is already buffered without waiting.
fn drain(events: &mut mpsc::Receiver<SessionEvent>, book: &mut ObservationBook) {
    while let Ok(event) = events.try_recv() {
        if book.apply(event) == Applied::Closed {
            break;
        }
    }
}

/// Upper-case, trim, and reject empty or duplicate symbol lists.
fn normalize_symbols(symbols: &[String]) -> Result<Vec<String>, CollectorError> {
    if symbols.is_empty() {
        return Err(CollectorError::InvalidRequest(
            "At least one symbol required".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(CollectorError::InvalidRequest("Empty symbol".into()));
        }
        if !seen.insert(symbol.clone()) {
            return Err(CollectorError::InvalidRequest(format!(
                "Duplicate symbol: {}",
                symbol
            )));
        }
        normalized.push(symbol);
    }
    Ok(normalized)
}
