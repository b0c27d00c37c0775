//! Logging and terminal presentation.

mod chart;
mod logging;

pub use chart::QuoteChart;
pub use logging::setup_logging;
