//! Configuration structures.

use quotes_collector::{CollectorConfig, WaitPolicy};
use quotes_core::resolver::RoutingOverride;
use quotes_core::{MarketDataClass, SecurityResolver, TickCodes};
use quotes_session::TwsConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::SettingsError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub terminal: TerminalSettings,
    #[serde(default)]
    pub collection: CollectionSettings,
    #[serde(default)]
    pub ticks: TickCodes,
    #[serde(default)]
    pub routing: RoutingSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "delayed-quotes".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Terminal endpoint and session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    pub host: String,
    /// 7497 for paper trading, 7496 for live
    pub port: u16,
    pub client_ids: Vec<i32>,
    pub connect_timeout_ms: u64,
    pub event_buffer: usize,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        let tws = TwsConfig::paper_trading();
        Self {
            host: tws.host,
            port: tws.port,
            client_ids: CollectorConfig::default().client_ids,
            connect_timeout_ms: tws.connect_timeout.as_millis() as u64,
            event_buffer: tws.event_buffer,
        }
    }
}

/// Collection run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub symbols: Vec<String>,
    pub data_class: MarketDataClass,
    pub generic_ticks: String,
    pub overall_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub per_symbol_wait_ms: u64,
    /// Refuse to collect outside the regular New York session
    pub require_market_hours: bool,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        let collector = CollectorConfig::default();
        Self {
            symbols: vec!["SPY".into(), "GLD".into(), "IAU".into()],
            data_class: collector.data_class,
            generic_ticks: collector.generic_ticks,
            overall_timeout_ms: collector.wait.overall_timeout.as_millis() as u64,
            poll_interval_ms: collector.wait.poll_interval.as_millis() as u64,
            per_symbol_wait_ms: collector.wait.per_symbol_hint.as_millis() as u64,
            require_market_hours: false,
        }
    }
}

/// Security routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    pub default_exchange: String,
    pub currency: String,
    pub overrides: HashMap<String, RoutingOverride>,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            default_exchange: "SMART".to_string(),
            currency: "USD".to_string(),
            overrides: ["SPY", "GLD", "IAU"]
                .into_iter()
                .map(|s| (s.to_string(), RoutingOverride::direct("ARCA")))
                .collect(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub csv_path: Option<String>,
    pub chart: bool,
    /// Show the sample table when every price is missing
    pub fallback_to_sample: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            csv_path: None,
            chart: false,
            fallback_to_sample: true,
        }
    }
}

impl AppConfig {
    /// Check values the loaders cannot express as types.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.terminal.port == 0 {
            return Err(SettingsError::Invalid("terminal.port must be non-zero".into()));
        }
        if self.terminal.client_ids.is_empty() {
            return Err(SettingsError::Invalid(
                "terminal.client_ids must list at least one id".into(),
            ));
        }
        if self.terminal.event_buffer == 0 {
            return Err(SettingsError::Invalid(
                "terminal.event_buffer must be greater than 0".into(),
            ));
        }
        if self.collection.overall_timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "collection.overall_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.collection.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "collection.poll_interval_ms must be greater than 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(SettingsError::Invalid(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    pub fn tws_config(&self) -> TwsConfig {
        TwsConfig {
            host: self.terminal.host.clone(),
            port: self.terminal.port,
            connect_timeout: Duration::from_millis(self.terminal.connect_timeout_ms),
            tick_codes: self.ticks.clone(),
            event_buffer: self.terminal.event_buffer,
        }
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            per_symbol_hint: Duration::from_millis(self.collection.per_symbol_wait_ms),
            overall_timeout: Duration::from_millis(self.collection.overall_timeout_ms),
            poll_interval: Duration::from_millis(self.collection.poll_interval_ms),
        }
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            client_ids: self.terminal.client_ids.clone(),
            data_class: self.collection.data_class,
            generic_ticks: self.collection.generic_ticks.clone(),
            wait: self.wait_policy(),
        }
    }

    pub fn resolver(&self) -> SecurityResolver {
        SecurityResolver::new(&self.routing.default_exchange, &self.routing.currency)
            .with_overrides(self.routing.overrides.clone())
    }
}
