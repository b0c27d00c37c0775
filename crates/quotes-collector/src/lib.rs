//! Delayed quote collection.
//!
//! Turns a list of symbols into a [`ResultTable`](quotes_core::ResultTable)
//! by subscribing on a terminal session and correlating the ticks that
//! come back by request id.

mod book;
mod collector;

pub use book::{Applied, Observation, ObservationBook};
pub use collector::{Collector, CollectorConfig, WaitOutcome, WaitPolicy};
