//! Market data classes and subscriptions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{RequestId, SecurityDescriptor};

/// Class of market data requested from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketDataClass {
    /// Real-time streaming data
    Live,
    /// Last recorded data at market close
    Frozen,
    /// Data published with an exchange-mandated lag
    #[default]
    Delayed,
    /// Last delayed data at market close
    DelayedFrozen,
}

impl MarketDataClass {
    /// Numeric code used on the wire.
    pub fn code(&self) -> i32 {
        match self {
            MarketDataClass::Live => 1,
            MarketDataClass::Frozen => 2,
            MarketDataClass::Delayed => 3,
            MarketDataClass::DelayedFrozen => 4,
        }
    }

    /// Look up a class from its wire code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(MarketDataClass::Live),
            2 => Some(MarketDataClass::Frozen),
            3 => Some(MarketDataClass::Delayed),
            4 => Some(MarketDataClass::DelayedFrozen),
            _ => None,
        }
    }
}

impl fmt::Display for MarketDataClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketDataClass::Live => "live",
            MarketDataClass::Frozen => "frozen",
            MarketDataClass::Delayed => "delayed",
            MarketDataClass::DelayedFrozen => "delayed_frozen",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for MarketDataClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" | "realtime" | "1" => Ok(MarketDataClass::Live),
            "frozen" | "2" => Ok(MarketDataClass::Frozen),
            "delayed" | "3" => Ok(MarketDataClass::Delayed),
            "delayed_frozen" | "delayed-frozen" | "4" => Ok(MarketDataClass::DelayedFrozen),
            _ => Err(format!("Invalid market data class: {}", s)),
        }
    }
}

/// An outstanding market data request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Caller-assigned correlation key
    pub request_id: RequestId,
    /// Symbol as requested
    pub symbol: String,
    /// Routing information sent with the request
    pub descriptor: SecurityDescriptor,
}

impl Subscription {
    pub fn new(request_id: RequestId, descriptor: SecurityDescriptor) -> Self {
        Self {
            request_id,
            symbol: descriptor.symbol.clone(),
            descriptor,
        }
    }
}
