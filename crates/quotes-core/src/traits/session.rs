//! Terminal session traits.

use crate::error::SessionError;
use crate::types::{MarketDataClass, SessionEvent, Subscription};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// An established connection to a trading terminal.
///
/// Events arrive on a channel fed by the session's own delivery task, so
/// the consumer never shares state with that task.
#[async_trait]
pub trait QuoteSession: Send {
    /// Client identifier the session was opened with.
    fn client_id(&self) -> i32;

    /// Channel of inbound events.
    fn events(&mut self) -> &mut mpsc::Receiver<SessionEvent>;

    /// Select the class of market data for subsequent requests.
    async fn set_data_class(&mut self, class: MarketDataClass) -> Result<(), SessionError>;

    /// Issue a market data request.
    ///
    /// # Arguments
    /// * `subscription` - Request id and security to subscribe
    /// * `generic_ticks` - Comma-separated generic tick list
    async fn subscribe(
        &mut self,
        subscription: &Subscription,
        generic_ticks: &str,
    ) -> Result<(), SessionError>;

    /// Close the connection. All subscriptions end with it.
    async fn disconnect(&mut self) -> Result<(), SessionError>;
}

/// Opens sessions against one terminal endpoint.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    type Session: QuoteSession;

    /// Open a session under the given client identifier.
    async fn connect(&self, client_id: i32) -> Result<Self::Session, SessionError>;

    /// Human-readable endpoint, for logs and errors.
    fn endpoint(&self) -> String;
}
