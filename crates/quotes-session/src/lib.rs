//! Trading terminal sessions.

mod paper;
pub mod tws;

pub use paper::{PaperConnector, PaperLedger, PaperSession, ScriptedTick};
pub use tws::{TwsConfig, TwsConnector, TwsSession};
