//! Message builders and parsers for the subset of the terminal API in use.

use quotes_core::error::SessionError;
use quotes_core::types::{MarketDataClass, RequestId, Subscription};

/// Outgoing message ids.
pub mod outgoing {
    pub const REQ_MKT_DATA: i32 = 1;
    pub const REQ_MARKET_DATA_TYPE: i32 = 59;
    pub const START_API: i32 = 71;
}

/// Incoming message ids.
pub mod incoming {
    pub const TICK_PRICE: i32 = 1;
    pub const TICK_SIZE: i32 = 2;
    pub const ERR_MSG: i32 = 4;
    pub const NEXT_VALID_ID: i32 = 9;
    pub const MANAGED_ACCTS: i32 = 15;
    pub const TICK_STRING: i32 = 46;
    pub const MARKET_DATA_TYPE: i32 = 58;
}

/// Error code the terminal sends when a client id is taken.
pub const CLIENT_ID_IN_USE: i32 = 326;

/// Start the API session under a client id.
pub fn start_api(client_id: i32) -> Vec<String> {
    vec![
        outgoing::START_API.to_string(),
        "2".to_string(),
        client_id.to_string(),
        String::new(), // optional capabilities
    ]
}

/// Select the market data class for following requests.
pub fn market_data_type(class: MarketDataClass) -> Vec<String> {
    vec![
        outgoing::REQ_MARKET_DATA_TYPE.to_string(),
        "1".to_string(),
        class.code().to_string(),
    ]
}

/// Streaming market data request.
pub fn market_data_request(subscription: &Subscription, generic_ticks: &str) -> Vec<String> {
    let d = &subscription.descriptor;
    vec![
        outgoing::REQ_MKT_DATA.to_string(),
        "11".to_string(),
        subscription.request_id.to_string(),
        "0".to_string(), // contract id, resolved by the terminal
        d.symbol.clone(),
        d.security_type.code().to_string(),
        String::new(), // last trade date
        "0".to_string(), // strike
        String::new(), // right
        String::new(), // multiplier
        d.exchange.clone(),
        d.primary_exchange.clone().unwrap_or_default(),
        d.currency.clone(),
        String::new(), // local symbol
        String::new(), // trading class
        "0".to_string(), // no delta-neutral leg
        generic_ticks.to_string(),
        "0".to_string(), // streaming, not snapshot
        "0".to_string(), // no regulatory snapshot
        String::new(), // options
    ]
}

/// Decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    TickPrice {
        request_id: RequestId,
        tick_type: i32,
        price: f64,
    },
    TickString {
        request_id: RequestId,
        tick_type: i32,
        value: String,
    },
    Error {
        id: i32,
        code: i32,
        message: String,
    },
    NextValidId(i32),
    MarketDataType {
        request_id: RequestId,
        class: Option<MarketDataClass>,
    },
    /// Message id this client does not interpret
    Other(i32),
}

/// Sequential reader over a message's fields.
struct Fields<'a> {
    inner: std::slice::Iter<'a, String>,
}

impl<'a> Fields<'a> {
    fn new(fields: &'a [String]) -> Self {
        Self { inner: fields.iter() }
    }

    fn next_str(&mut self) -> Result<&'a str, SessionError> {
        self.inner
            .next()
            .map(String::as_str)
            .ok_or_else(|| SessionError::Protocol("Message truncated".to_string()))
    }

    fn next_i32(&mut self) -> Result<i32, SessionError> {
        let raw = self.next_str()?;
        raw.parse()
            .map_err(|_| SessionError::Protocol(format!("Expected integer, got '{}'", raw)))
    }

    fn next_f64(&mut self) -> Result<f64, SessionError> {
        let raw = self.next_str()?;
        raw.parse()
            .map_err(|_| SessionError::Protocol(format!("Expected number, got '{}'", raw)))
    }

    fn skip(&mut self) -> Result<(), SessionError> {
        self.next_str().map(|_| ())
    }
}

/// Parse the fields of one inbound frame.
pub fn parse_inbound(fields: &[String]) -> Result<Inbound, SessionError> {
    let mut f = Fields::new(fields);
    let msg_id = f.next_i32()?;

    let inbound = match msg_id {
        incoming::TICK_PRICE => {
            f.skip()?; // version
            let request_id = f.next_i32()?;
            let tick_type = f.next_i32()?;
            let price = f.next_f64()?;
            Inbound::TickPrice {
                request_id,
                tick_type,
                price,
            }
        }
        incoming::TICK_STRING => {
            f.skip()?;
            let request_id = f.next_i32()?;
            let tick_type = f.next_i32()?;
            let value = f.next_str()?.to_string();
            Inbound::TickString {
                request_id,
                tick_type,
                value,
            }
        }
        incoming::ERR_MSG => {
            f.skip()?;
            let id = f.next_i32()?;
            let code = f.next_i32()?;
            let message = f.next_str()?.to_string();
            Inbound::Error { id, code, message }
        }
        incoming::NEXT_VALID_ID => {
            f.skip()?;
            Inbound::NextValidId(f.next_i32()?)
        }
        incoming::MARKET_DATA_TYPE => {
            f.skip()?;
            let request_id = f.next_i32()?;
            let class = MarketDataClass::from_code(f.next_i32()?);
            Inbound::MarketDataType { request_id, class }
        }
        other => Inbound::Other(other),
    };

    Ok(inbound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotes_core::SecurityResolver;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_market_data_request_fields() {
        let descriptor = SecurityResolver::default().resolve("GLD");
        let sub = Subscription::new(2, descriptor);
        let fields = market_data_request(&sub, "233");

        assert_eq!(fields.len(), 20);
        assert_eq!(fields[0], "1");
        assert_eq!(fields[2], "2");
        assert_eq!(fields[4], "GLD");
        assert_eq!(fields[5], "STK");
        assert_eq!(fields[10], "ARCA");
        assert_eq!(fields[11], "ARCA");
        assert_eq!(fields[12], "USD");
        assert_eq!(fields[16], "233");
    }

    #[test]
    fn test_parse_tick_price() {
        let msg = parse_inbound(&strings(&["1", "6", "3", "68", "180.55", "100", "0"])).unwrap();
        assert_eq!(
            msg,
            Inbound::TickPrice {
                request_id: 3,
                tick_type: 68,
                price: 180.55
            }
        );
    }

    #[test]
    fn test_parse_error_and_unknown() {
        let msg =
            parse_inbound(&strings(&["4", "2", "-1", "2104", "Market data farm OK"])).unwrap();
        assert!(matches!(msg, Inbound::Error { id: -1, code: 2104, .. }));

        let msg = parse_inbound(&strings(&["15", "1", "DU123"])).unwrap();
        assert_eq!(msg, Inbound::Other(incoming::MANAGED_ACCTS));
    }

    #[test]
    fn test_parse_truncated() {
        assert!(parse_inbound(&strings(&["46", "6", "2"])).is_err());
        assert!(parse_inbound(&strings(&["1", "6", "x", "4", "1.0"])).is_err());
    }
}
