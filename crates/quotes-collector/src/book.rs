//! Per-run registry of request ids and the values observed for them.

use chrono::{DateTime, Utc};
use quotes_core::types::{
    RequestId, ResultRow, ResultTable, SessionEvent, TickEvent, TickKind, TickValue,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Latest values seen for one symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub price: Option<f64>,
    pub short_fee: Option<f64>,
    pub last_update: Option<DateTime<Utc>>,
}

/// What applying an event did to the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Recorded,
    Discarded,
    Noted,
    Closed,
}

/// Owns the id → symbol registry and observations of one collection run.
///
/// Identifiers start at 1 for every book, so runs never share an id space.
#[derive(Debug)]
pub struct ObservationBook {
    next_id: RequestId,
    symbols_by_id: HashMap<RequestId, String>,
    observations: HashMap<String, Observation>,
    notices: Vec<String>,
    discarded: usize,
}

impl Default for ObservationBook {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationBook {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            symbols_by_id: HashMap::new(),
            observations: HashMap::new(),
            notices: Vec::new(),
            discarded: 0,
        }
    }

    /// Allocate a fresh request id for `symbol`.
    pub fn register(&mut self, symbol: &str) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.symbols_by_id.insert(id, symbol.to_string());
        self.observations.entry(symbol.to_string()).or_default();
        id
    }

    pub fn symbol_for(&self, request_id: RequestId) -> Option<&str> {
        self.symbols_by_id.get(&request_id).map(String::as_str)
    }

    pub fn observation(&self, symbol: &str) -> Option<&Observation> {
        self.observations.get(symbol)
    }

    pub fn registered(&self) -> usize {
        self.symbols_by_id.len()
    }

    /// Number of registered symbols with a price.
    pub fn priced(&self) -> usize {
        self.observations.values().filter(|o| o.price.is_some()).count()
    }

    pub fn all_priced(&self) -> bool {
        !self.observations.is_empty() && self.priced() == self.observations.len()
    }

    /// Events dropped for an unknown id or an unusable value.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Apply one session event.
    pub fn apply(&mut self, event: SessionEvent) -> Applied {
        match event {
            SessionEvent::Tick(tick) => {
                if self.record(tick) {
                    Applied::Recorded
                } else {
                    self.discarded += 1;
                    Applied::Discarded
                }
            }
            SessionEvent::Notice(notice) => {
                if notice.is_informational() {
                    debug!("Terminal: {}", notice);
                } else {
                    warn!("Terminal: {}", notice);
                    self.notices.push(notice.to_string());
                }
                Applied::Noted
            }
            SessionEvent::Closed => Applied::Closed,
        }
    }

    /// Record a tick. Returns false when it was discarded.
    fn record(&mut self, tick: TickEvent) -> bool {
        let Some(symbol) = self.symbols_by_id.get(&tick.request_id) else {
            debug!("Discarding tick for unknown request {}", tick.request_id);
            return false;
        };
        let Some(observation) = self.observations.get_mut(symbol) else {
            return false;
        };

        match tick.kind {
            TickKind::LastPrice => match tick.value.as_number() {
                // The terminal reports -1 when it has no price.
                Some(price) if price >= 0.0 => {
                    observation.price = Some(price);
                }
                _ => {
                    debug!("Discarding unusable price {:?} for {}", tick.value, symbol);
                    return false;
                }
            },
            TickKind::ShortFee => match tick.value.as_number() {
                Some(fee) => observation.short_fee = Some(fee),
                None => {
                    if let TickValue::Text(raw) = &tick.value {
                        debug!("Discarding malformed fee '{}' for {}", raw, symbol);
                    }
                    return false;
                }
            },
            TickKind::Other(_) => return false,
        }

        observation.last_update = Some(tick.received_at);
        true
    }

    /// Build the result table in `symbols` order.
    pub fn into_table(self, symbols: &[String]) -> ResultTable {
        let collected_at = Utc::now();
        let rows = symbols
            .iter()
            .map(|symbol| match self.observations.get(symbol) {
                Some(o) => ResultRow {
                    symbol: symbol.clone(),
                    price: o.price,
                    short_fee: o.short_fee,
                    observed_at: o.last_update.unwrap_or(collected_at),
                },
                None => ResultRow::missing(symbol, collected_at),
            })
            .collect();

        ResultTable::new(collected_at, rows).with_notices(self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotes_core::types::Notice;

    #[test]
    fn test_register_allocates_sequential_ids() {
        let mut book = ObservationBook::new();
        assert_eq!(book.register("SPY"), 1);
        assert_eq!(book.register("GLD"), 2);
        assert_eq!(book.symbol_for(2), Some("GLD"));
        assert_eq!(book.symbol_for(3), None);

        let mut fresh = ObservationBook::new();
        assert_eq!(fresh.register("IAU"), 1);
    }

    #[test]
    fn test_unknown_id_discarded() {
        let mut book = ObservationBook::new();
        book.register("SPY");

        let applied = book.apply(SessionEvent::Tick(TickEvent::price(42, 100.0)));
        assert_eq!(applied, Applied::Discarded);
        assert_eq!(book.discarded(), 1);
        assert_eq!(book.observation("SPY"), Some(&Observation::default()));
    }

    #[test]
    fn test_last_price_wins() {
        let mut book = ObservationBook::new();
        let id = book.register("SPY");
        book.apply(SessionEvent::Tick(TickEvent::price(id, 445.0)));
        book.apply(SessionEvent::Tick(TickEvent::price(id, 445.5)));
        assert_eq!(book.observation("SPY").unwrap().price, Some(445.5));
        assert!(book.all_priced());
    }

    #[test]
    fn test_no_data_marker_and_bad_fee_discarded() {
        let mut book = ObservationBook::new();
        let id = book.register("GLD");

        assert_eq!(
            book.apply(SessionEvent::Tick(TickEvent::price(id, -1.0))),
            Applied::Discarded
        );
        assert_eq!(
            book.apply(SessionEvent::Tick(TickEvent::fee(id, "n/a"))),
            Applied::Discarded
        );
        assert_eq!(
            book.apply(SessionEvent::Tick(TickEvent::fee(id, "0.45"))),
            Applied::Recorded
        );

        let gld = book.observation("GLD").unwrap();
        assert_eq!(gld.price, None);
        assert_eq!(gld.short_fee, Some(0.45));
        assert!(!book.all_priced());
    }

    #[test]
    fn test_other_ticks_ignored() {
        let mut book = ObservationBook::new();
        let id = book.register("SPY");
        let tick = TickEvent::new(id, TickKind::Other(69), TickValue::Price(300.0));
        assert_eq!(book.apply(SessionEvent::Tick(tick)), Applied::Discarded);
        assert_eq!(book.observation("SPY").unwrap().last_update, None);
    }

    #[test]
    fn test_notices_filtered() {
        let mut book = ObservationBook::new();
        book.apply(SessionEvent::Notice(Notice {
            request_id: None,
            code: 2106,
            message: "HMDS data farm connection is OK".to_string(),
        }));
        book.apply(SessionEvent::Notice(Notice {
            request_id: Some(1),
            code: 354,
            message: "Requested market data is not subscribed".to_string(),
        }));
        assert_eq!(
            book.notices(),
            &["Req 1: 354 - Requested market data is not subscribed".to_string()]
        );
    }

    #[test]
    fn test_into_table_keeps_order_and_missing() {
        let mut book = ObservationBook::new();
        let symbols: Vec<String> = ["SPY", "GLD", "IAU"].iter().map(|s| s.to_string()).collect();
        let ids: Vec<_> = symbols.iter().map(|s| book.register(s)).collect();
        book.apply(SessionEvent::Tick(TickEvent::price(ids[1], 180.55)));

        let table = book.into_table(&symbols);
        assert_eq!(table.symbols(), vec!["SPY", "GLD", "IAU"]);
        assert!(table.rows()[0].is_empty());
        assert_eq!(table.rows()[1].price, Some(180.55));
        assert!(table.rows()[2].is_empty());
    }
}
