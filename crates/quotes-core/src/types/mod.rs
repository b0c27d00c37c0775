//! Core data types for the quote collector.

mod market_data;
mod security;
mod table;
mod tick;

pub use market_data::{MarketDataClass, Subscription};
pub use security::{SecurityDescriptor, SecurityType};
pub use table::{ResultRow, ResultTable};
pub use tick::{Notice, RequestId, SessionEvent, TickCodes, TickEvent, TickKind, TickValue};
