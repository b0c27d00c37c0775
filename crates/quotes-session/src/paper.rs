//! In-process paper terminal for dry runs and tests.

use async_trait::async_trait;
use quotes_core::error::SessionError;
use quotes_core::traits::{QuoteSession, SessionConnector};
use quotes_core::types::{
    MarketDataClass, Notice, RequestId, SessionEvent, Subscription, TickEvent, TickKind, TickValue,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A tick the paper terminal sends after a delay.
#[derive(Debug, Clone)]
pub struct ScriptedTick {
    pub kind: TickKind,
    pub value: TickValue,
    pub delay: Duration,
}

impl ScriptedTick {
    pub fn price(price: f64, delay: Duration) -> Self {
        Self {
            kind: TickKind::LastPrice,
            value: TickValue::Price(price),
            delay,
        }
    }

    pub fn fee(fee: &str, delay: Duration) -> Self {
        Self {
            kind: TickKind::ShortFee,
            value: TickValue::Text(fee.to_string()),
            delay,
        }
    }
}

/// Record of everything clients asked the paper terminal to do.
#[derive(Debug, Clone, Default)]
pub struct PaperLedger {
    pub connect_attempts: Vec<i32>,
    pub data_classes: Vec<MarketDataClass>,
    pub subscriptions: Vec<Subscription>,
    pub disconnects: usize,
}

/// Paper terminal: scripted ticks per symbol, refusable client ids.
#[derive(Clone, Default)]
pub struct PaperConnector {
    script: HashMap<String, Vec<ScriptedTick>>,
    stray: Vec<(RequestId, ScriptedTick)>,
    notices: Vec<Notice>,
    refused: HashSet<i32>,
    fail_subscribe_at: Option<usize>,
    close_after: Option<Duration>,
    ledger: Arc<Mutex<PaperLedger>>,
}

impl PaperConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal quoting the usual ETF trio with short delays.
    pub fn demo() -> Self {
        let ms = Duration::from_millis;
        Self::new()
            .with_tick("SPY", ScriptedTick::price(445.21, ms(50)))
            .with_tick("SPY", ScriptedTick::fee("0.30", ms(80)))
            .with_tick("GLD", ScriptedTick::price(180.55, ms(60)))
            .with_tick("GLD", ScriptedTick::fee("0.45", ms(90)))
            .with_tick("IAU", ScriptedTick::price(35.12, ms(70)))
            .with_tick("IAU", ScriptedTick::fee("0.50", ms(100)))
    }

    /// Queue a tick for every subscription to `symbol`.
    pub fn with_tick(mut self, symbol: &str, tick: ScriptedTick) -> Self {
        self.script.entry(symbol.to_uppercase()).or_default().push(tick);
        self
    }

    /// Send a tick for a request id regardless of subscriptions.
    pub fn with_stray_tick(mut self, request_id: RequestId, tick: ScriptedTick) -> Self {
        self.stray.push((request_id, tick));
        self
    }

    /// Deliver a notice right after connecting.
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    /// Reject connections under a client id.
    pub fn refuse_client(mut self, client_id: i32) -> Self {
        self.refused.insert(client_id);
        self
    }

    /// Fail the n-th subscribe request (0-based) of each session.
    pub fn fail_subscribe_at(mut self, index: usize) -> Self {
        self.fail_subscribe_at = Some(index);
        self
    }

    /// Hang up on every session this long after it connects.
    pub fn close_after(mut self, delay: Duration) -> Self {
        self.close_after = Some(delay);
        self
    }

    /// Snapshot of the ledger.
    pub fn ledger(&self) -> PaperLedger {
        self.ledger.lock().unwrap().clone()
    }

    fn schedule(
        tx: &mpsc::Sender<SessionEvent>,
        request_id: RequestId,
        tick: &ScriptedTick,
    ) -> JoinHandle<()> {
        let tx = tx.clone();
        let tick = tick.clone();
        tokio::spawn(async move {
            tokio::time::sleep(tick.delay).await;
            let event = TickEvent::new(request_id, tick.kind, tick.value);
            let _ = tx.send(SessionEvent::Tick(event)).await;
        })
    }
}

#[async_trait]
impl SessionConnector for PaperConnector {
    type Session = PaperSession;

    async fn connect(&self, client_id: i32) -> Result<PaperSession, SessionError> {
        self.ledger.lock().unwrap().connect_attempts.push(client_id);

        if self.refused.contains(&client_id) {
            return Err(SessionError::Rejected {
                code: 326,
                message: format!("client id {} is already in use", client_id),
            });
        }

        let (tx, rx) = mpsc::channel(1024);
        for notice in &self.notices {
            let _ = tx.try_send(SessionEvent::Notice(notice.clone()));
        }
        let mut tasks: Vec<JoinHandle<()>> = self
            .stray
            .iter()
            .map(|(request_id, tick)| Self::schedule(&tx, *request_id, tick))
            .collect();
        if let Some(delay) = self.close_after {
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(SessionEvent::Closed).await;
            }));
        }

        debug!("Paper terminal accepted client {}", client_id);

        Ok(PaperSession {
            client_id,
            terminal: self.clone(),
            tx,
            events: rx,
            tasks,
            subscribe_count: 0,
            connected: true,
        })
    }

    fn endpoint(&self) -> String {
        "paper".to_string()
    }
}

/// Session with the paper terminal.
pub struct PaperSession {
    client_id: i32,
    terminal: PaperConnector,
    tx: mpsc::Sender<SessionEvent>,
    events: mpsc::Receiver<SessionEvent>,
    tasks: Vec<JoinHandle<()>>,
    subscribe_count: usize,
    connected: bool,
}

#[async_trait]
impl QuoteSession for PaperSession {
    fn client_id(&self) -> i32 {
        self.client_id
    }

    fn events(&mut self) -> &mut mpsc::Receiver<SessionEvent> {
        &mut self.events
    }

    async fn set_data_class(&mut self, class: MarketDataClass) -> Result<(), SessionError> {
        self.terminal.ledger.lock().unwrap().data_classes.push(class);
        Ok(())
    }

    async fn subscribe(
        &mut self,
        subscription: &Subscription,
        _generic_ticks: &str,
    ) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::Closed);
        }
        let index = self.subscribe_count;
        self.subscribe_count += 1;
        if self.terminal.fail_subscribe_at == Some(index) {
            return Err(SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "paper terminal dropped the request",
            )));
        }

        self.terminal
            .ledger
            .lock()
            .unwrap()
            .subscriptions
            .push(subscription.clone());

        if let Some(ticks) = self.terminal.script.get(&subscription.symbol) {
            for tick in ticks {
                let task = PaperConnector::schedule(&self.tx, subscription.request_id, tick);
                self.tasks.push(task);
            }
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.terminal.ledger.lock().unwrap().disconnects += 1;
        Ok(())
    }
}

impl Drop for PaperSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotes_core::SecurityResolver;

    #[tokio::test]
    async fn test_paper_terminal_delivers_scripted_ticks() {
        let terminal = PaperConnector::new()
            .with_tick("SPY", ScriptedTick::price(445.21, Duration::from_millis(5)));
        let mut session = terminal.connect(10).await.unwrap();

        let sub = Subscription::new(1, SecurityResolver::default().resolve("SPY"));
        session.subscribe(&sub, "").await.unwrap();

        match session.events().recv().await {
            Some(SessionEvent::Tick(tick)) => {
                assert_eq!(tick.request_id, 1);
                assert_eq!(tick.value, TickValue::Price(445.21));
            }
            other => panic!("unexpected event {:?}", other),
        }

        session.disconnect().await.unwrap();
        session.disconnect().await.unwrap();
        assert_eq!(terminal.ledger().disconnects, 1);
    }

    #[tokio::test]
    async fn test_paper_terminal_refuses_client() {
        let terminal = PaperConnector::new().refuse_client(10);
        assert!(matches!(
            terminal.connect(10).await,
            Err(SessionError::Rejected { code: 326, .. })
        ));
        assert!(terminal.connect(20).await.is_ok());
        assert_eq!(terminal.ledger().connect_attempts, vec![10, 20]);
    }
}
