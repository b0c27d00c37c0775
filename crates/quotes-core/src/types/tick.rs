//! Tick events delivered by a terminal session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-assigned identifier correlating a request with its ticks.
pub type RequestId = i32;

/// Field carried by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickKind {
    LastPrice,
    ShortFee,
    /// Any other terminal tick type, by code
    Other(i32),
}

/// Value carried by a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickValue {
    Price(f64),
    Text(String),
}

impl TickValue {
    /// Interpret the value as a number.
    ///
    /// Text is parsed as a decimal; anything unparsable or non-finite yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            TickValue::Price(p) => *p,
            TickValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// A single asynchronous data update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    pub request_id: RequestId,
    pub kind: TickKind,
    pub value: TickValue,
    pub received_at: DateTime<Utc>,
}

impl TickEvent {
    pub fn new(request_id: RequestId, kind: TickKind, value: TickValue) -> Self {
        Self {
            request_id,
            kind,
            value,
            received_at: Utc::now(),
        }
    }

    pub fn price(request_id: RequestId, price: f64) -> Self {
        Self::new(request_id, TickKind::LastPrice, TickValue::Price(price))
    }

    pub fn fee(request_id: RequestId, fee: &str) -> Self {
        Self::new(request_id, TickKind::ShortFee, TickValue::Text(fee.to_string()))
    }
}

/// Status or error message from the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Request the notice refers to, if any
    pub request_id: Option<RequestId>,
    pub code: i32,
    pub message: String,
}

impl Notice {
    /// Data-farm connection status codes that carry no actionable information.
    pub const INFORMATIONAL_CODES: [i32; 3] = [2104, 2106, 2158];

    pub fn is_informational(&self) -> bool {
        Self::INFORMATIONAL_CODES.contains(&self.code)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Req {}: {} - {}",
            self.request_id.unwrap_or(-1),
            self.code,
            self.message
        )
    }
}

/// Everything a session delivers on its event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Tick(TickEvent),
    Notice(Notice),
    /// The terminal closed the connection
    Closed,
}

/// Tick type codes interpreted by the collector.
///
/// Terminal variants disagree on which code carries which field, so both
/// lists are configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCodes {
    pub last_price: Vec<i32>,
    pub short_fee: Vec<i32>,
}

impl Default for TickCodes {
    fn default() -> Self {
        Self {
            // 4 = last, 68 = delayed last
            last_price: vec![4, 68],
            short_fee: vec![47],
        }
    }
}

impl TickCodes {
    /// Classify a terminal tick type code.
    pub fn classify(&self, code: i32) -> TickKind {
        if self.last_price.contains(&code) {
            TickKind::LastPrice
        } else if self.short_fee.contains(&code) {
            TickKind::ShortFee
        } else {
            TickKind::Other(code)
        }
    }
}
