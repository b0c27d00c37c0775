//! Core traits for the quote collector.

mod session;

pub use session::{QuoteSession, SessionConnector};
