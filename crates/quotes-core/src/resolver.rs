//! Security descriptor resolution.
//!
//! A small override table pins routing for known symbols; everything else
//! goes to the terminal's smart router.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{SecurityDescriptor, SecurityType};

/// Routing pinned for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingOverride {
    pub exchange: String,
    pub primary_exchange: Option<String>,
}

impl RoutingOverride {
    /// Route directly to an exchange that is also the primary listing.
    pub fn direct(exchange: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            primary_exchange: Some(exchange.to_string()),
        }
    }
}

/// Maps symbols to the descriptor the terminal requires.
#[derive(Debug, Clone)]
pub struct SecurityResolver {
    overrides: HashMap<String, RoutingOverride>,
    default_exchange: String,
    currency: String,
    security_type: SecurityType,
}

impl Default for SecurityResolver {
    fn default() -> Self {
        let overrides = ["SPY", "GLD", "IAU"]
            .into_iter()
            .map(|s| (s.to_string(), RoutingOverride::direct("ARCA")))
            .collect();

        Self {
            overrides,
            default_exchange: "SMART".to_string(),
            currency: "USD".to_string(),
            security_type: SecurityType::Stock,
        }
    }
}

impl SecurityResolver {
    /// Resolver with no overrides.
    pub fn new(default_exchange: &str, currency: &str) -> Self {
        Self {
            overrides: HashMap::new(),
            default_exchange: default_exchange.to_string(),
            currency: currency.to_string(),
            security_type: SecurityType::Stock,
        }
    }

    /// Add or replace an override.
    pub fn with_override(mut self, symbol: &str, routing: RoutingOverride) -> Self {
        self.overrides.insert(symbol.to_uppercase(), routing);
        self
    }

    /// Replace the whole override table.
    pub fn with_overrides(mut self, overrides: HashMap<String, RoutingOverride>) -> Self {
        self.overrides = overrides
            .into_iter()
            .map(|(symbol, routing)| (symbol.to_uppercase(), routing))
            .collect();
        self
    }

    /// Resolve a symbol. Never fails: unknown symbols use the default route.
    pub fn resolve(&self, symbol: &str) -> SecurityDescriptor {
        let symbol = symbol.trim().to_uppercase();
        match self.overrides.get(&symbol) {
            Some(routing) => SecurityDescriptor {
                symbol,
                security_type: self.security_type,
                exchange: routing.exchange.clone(),
                primary_exchange: routing.primary_exchange.clone(),
                currency: self.currency.clone(),
            },
            None => SecurityDescriptor {
                symbol,
                security_type: self.security_type,
                exchange: self.default_exchange.clone(),
                primary_exchange: None,
                currency: self.currency.clone(),
            },
        }
    }

    /// Whether a symbol has an override.
    pub fn is_overridden(&self, symbol: &str) -> bool {
        self.overrides.contains_key(&symbol.trim().to_uppercase())
    }
}
