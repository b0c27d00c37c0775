//! CLI command implementations.

pub mod fetch;
pub mod plot;
pub mod resolve;
pub mod validate;
