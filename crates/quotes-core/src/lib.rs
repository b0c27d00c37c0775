//! Core types and traits for the quote collector.
//!
//! This crate provides the foundational building blocks including:
//! - Subscription and tick event types
//! - Result rows and tables
//! - Security descriptors and the routing resolver
//! - Session traits implemented by terminal connections

pub mod types;
pub mod traits;
pub mod error;
pub mod market_hours;
pub mod resolver;

pub use resolver::SecurityResolver;
pub use types::*;
pub use traits::*;
