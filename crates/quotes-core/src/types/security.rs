//! Security descriptors sent with market data requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityType {
    #[default]
    Stock,
    Index,
    Future,
    Option,
}

impl SecurityType {
    /// Code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            SecurityType::Stock => "STK",
            SecurityType::Index => "IND",
            SecurityType::Future => "FUT",
            SecurityType::Option => "OPT",
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Routing information the terminal needs to locate a security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDescriptor {
    /// Ticker symbol (upper case)
    pub symbol: String,
    /// Instrument type
    pub security_type: SecurityType,
    /// Routing exchange
    pub exchange: String,
    /// Primary listing exchange, if pinned
    pub primary_exchange: Option<String>,
    /// Listing currency
    pub currency: String,
}

impl SecurityDescriptor {
    /// Stock routed through the given exchange.
    pub fn stock(symbol: &str, exchange: &str, currency: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            security_type: SecurityType::Stock,
            exchange: exchange.to_string(),
            primary_exchange: None,
            currency: currency.to_string(),
        }
    }

    /// Pin the primary listing exchange.
    pub fn with_primary_exchange(mut self, primary: &str) -> Self {
        self.primary_exchange = Some(primary.to_string());
        self
    }

    /// Whether the request is left to the terminal's smart router.
    pub fn is_smart_routed(&self) -> bool {
        self.exchange.eq_ignore_ascii_case("SMART")
    }
}

impl fmt::Display for SecurityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.primary_exchange {
            Some(primary) => write!(
                f,
                "{} {} {}/{} {}",
                self.symbol, self.security_type, self.exchange, primary, self.currency
            ),
            None => write!(
                f,
                "{} {} {} {}",
                self.symbol, self.security_type, self.exchange, self.currency
            ),
        }
    }
}
