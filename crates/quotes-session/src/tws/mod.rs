//! TCP session against the trading terminal's local API.

pub mod codec;
pub mod messages;

use async_trait::async_trait;
use chrono::Utc;
use quotes_core::error::SessionError;
use quotes_core::traits::{QuoteSession, SessionConnector};
use quotes_core::types::{
    MarketDataClass, Notice, SessionEvent, Subscription, TickCodes, TickEvent, TickValue,
};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use messages::Inbound;

/// Terminal endpoint configuration.
#[derive(Debug, Clone)]
pub struct TwsConfig {
    pub host: String,
    pub port: u16,
    /// Bound on a single connection attempt, handshake included
    pub connect_timeout: Duration,
    pub tick_codes: TickCodes,
    /// Capacity of the inbound event channel
    pub event_buffer: usize,
}

impl Default for TwsConfig {
    fn default() -> Self {
        Self::paper_trading()
    }
}

impl TwsConfig {
    /// Local terminal in paper-trading mode.
    pub fn paper_trading() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7497,
            connect_timeout: Duration::from_secs(5),
            tick_codes: TickCodes::default(),
            event_buffer: 1024,
        }
    }

    /// Local terminal in live-trading mode.
    pub fn live_trading() -> Self {
        Self {
            port: 7496,
            ..Self::paper_trading()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_tick_codes(mut self, codes: TickCodes) -> Self {
        self.tick_codes = codes;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Opens TCP sessions to the terminal.
pub struct TwsConnector {
    config: TwsConfig,
}

impl TwsConnector {
    pub fn new(config: TwsConfig) -> Self {
        Self { config }
    }

    async fn open(&self, client_id: i32) -> Result<TwsSession, SessionError> {
        let stream = TcpStream::connect((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        stream.set_nodelay(true)?;
        let (mut reader, mut writer) = stream.into_split();

        writer.write_all(&codec::handshake()).await?;
        let server = codec::read_frame(&mut reader)
            .await?
            .ok_or_else(|| SessionError::Handshake("terminal closed during handshake".into()))?;
        let server_version: i32 = server
            .first()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| SessionError::Handshake(format!("unexpected greeting {:?}", server)))?;
        debug!(
            "Terminal server version {} (connected at {})",
            server_version,
            server.get(1).map(String::as_str).unwrap_or("?")
        );

        codec::write_frame(&mut writer, &messages::start_api(client_id)).await?;

        // Notices can precede the id that marks the session as ready, so the
        // channel exists before we wait for it.
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
        loop {
            let fields = codec::read_frame(&mut reader).await?.ok_or_else(|| {
                SessionError::Handshake("terminal closed the connection".into())
            })?;
            match messages::parse_inbound(&fields) {
                Ok(Inbound::NextValidId(_)) => break,
                Ok(Inbound::Error { code, message, .. })
                    if code == messages::CLIENT_ID_IN_USE =>
                {
                    return Err(SessionError::Rejected { code, message });
                }
                Ok(other) => {
                    if let Some(event) = to_event(other, &self.config.tick_codes) {
                        let _ = tx.try_send(event);
                    }
                }
                Err(e) => debug!("Skipping malformed message {:?}: {}", fields.first(), e),
            }
        }

        info!(
            "Connected to {} as client {} (server version {})",
            self.config.endpoint(),
            client_id,
            server_version
        );

        let codes = self.config.tick_codes.clone();
        let reader_task = tokio::spawn(deliver(reader, tx, codes));

        Ok(TwsSession {
            client_id,
            server_version,
            writer,
            events: rx,
            reader_task,
            connected: true,
        })
    }
}

#[async_trait]
impl SessionConnector for TwsConnector {
    type Session = TwsSession;

    async fn connect(&self, client_id: i32) -> Result<TwsSession, SessionError> {
        let timeout = self.config.connect_timeout;
        tokio::time::timeout(timeout, self.open(client_id))
            .await
            .map_err(|_| SessionError::Timeout(timeout))?
    }

    fn endpoint(&self) -> String {
        self.config.endpoint()
    }
}

/// Map a decoded message to a session event.
fn to_event(inbound: Inbound, codes: &TickCodes) -> Option<SessionEvent> {
    match inbound {
        Inbound::TickPrice {
            request_id,
            tick_type,
            price,
        } => Some(SessionEvent::Tick(TickEvent::new(
            request_id,
            codes.classify(tick_type),
            TickValue::Price(price),
        ))),
        Inbound::TickString {
            request_id,
            tick_type,
            value,
        } => Some(SessionEvent::Tick(TickEvent::new(
            request_id,
            codes.classify(tick_type),
            TickValue::Text(value),
        ))),
        Inbound::Error { id, code, message } => Some(SessionEvent::Notice(Notice {
            request_id: (id >= 0).then_some(id),
            code,
            message,
        })),
        Inbound::MarketDataType { request_id, class } => {
            debug!("Request {} is served as {:?} data", request_id, class);
            None
        }
        Inbound::NextValidId(_) | Inbound::Other(_) => None,
    }
}

/// Reader task: decode frames until the socket closes or the receiver is gone.
async fn deliver(mut reader: OwnedReadHalf, tx: mpsc::Sender<SessionEvent>, codes: TickCodes) {
    loop {
        match codec::read_frame(&mut reader).await {
            Ok(Some(fields)) => match messages::parse_inbound(&fields) {
                Ok(inbound) => {
                    if let Some(event) = to_event(inbound, &codes) {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => debug!("Skipping malformed message {:?}: {}", fields.first(), e),
            },
            Ok(None) => {
                debug!("Terminal closed the connection");
                let _ = tx.send(SessionEvent::Closed).await;
                return;
            }
            Err(e) => {
                warn!("Terminal read failed: {}", e);
                let _ = tx.send(SessionEvent::Closed).await;
                return;
            }
        }
    }
}

/// An established terminal session.
pub struct TwsSession {
    client_id: i32,
    server_version: i32,
    writer: OwnedWriteHalf,
    events: mpsc::Receiver<SessionEvent>,
    reader_task: JoinHandle<()>,
    connected: bool,
}

impl TwsSession {
    pub fn server_version(&self) -> i32 {
        self.server_version
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, fields: &[String]) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::Closed);
        }
        codec::write_frame(&mut self.writer, fields).await
    }
}

#[async_trait]
impl QuoteSession for TwsSession {
    fn client_id(&self) -> i32 {
        self.client_id
    }

    fn events(&mut self) -> &mut mpsc::Receiver<SessionEvent> {
        &mut self.events
    }

    async fn set_data_class(&mut self, class: MarketDataClass) -> Result<(), SessionError> {
        debug!("Selecting {} market data", class);
        self.send(&messages::market_data_type(class)).await
    }

    async fn subscribe(
        &mut self,
        subscription: &Subscription,
        generic_ticks: &str,
    ) -> Result<(), SessionError> {
        debug!(
            "Requesting market data {} for {}",
            subscription.request_id, subscription.descriptor
        );
        self.send(&messages::market_data_request(subscription, generic_ticks))
            .await
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.reader_task.abort();
        let result = self.writer.shutdown().await;
        info!(
            "Disconnected client {} at {}",
            self.client_id,
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        );
        result.map_err(SessionError::from)
    }
}

impl Drop for TwsSession {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotes_core::types::TickKind;

    #[test]
    fn test_config_endpoints() {
        assert_eq!(TwsConfig::paper_trading().endpoint(), "127.0.0.1:7497");
        assert_eq!(TwsConfig::live_trading().endpoint(), "127.0.0.1:7496");
        assert_eq!(TwsConfig::default().with_port(4002).port, 4002);
    }

    #[test]
    fn test_to_event_classifies_ticks() {
        let codes = TickCodes::default();
        let event = to_event(
            Inbound::TickString {
                request_id: 2,
                tick_type: 47,
                value: "0.45".to_string(),
            },
            &codes,
        );
        match event {
            Some(SessionEvent::Tick(tick)) => {
                assert_eq!(tick.request_id, 2);
                assert_eq!(tick.kind, TickKind::ShortFee);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_to_event_notice_without_request() {
        let event = to_event(
            Inbound::Error {
                id: -1,
                code: 2104,
                message: "farm ok".to_string(),
            },
            &TickCodes::default(),
        );
        match event {
            Some(SessionEvent::Notice(notice)) => {
                assert_eq!(notice.request_id, None);
                assert!(notice.is_informational());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = TwsConnector::new(
            TwsConfig::paper_trading()
                .with_port(port)
                .with_connect_timeout(Duration::from_secs(2)),
        );
        let result = connector.connect(10).await;
        assert!(matches!(
            result,
            Err(SessionError::Connection(_)) | Err(SessionError::Timeout(_))
        ));
    }
}
