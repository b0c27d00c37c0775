//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, CollectionSettings, LoggingConfig, OutputSettings, RoutingSettings,
    TerminalSettings,
};

use config::{Config, Environment, File};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    load(path, true)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, SettingsError> {
    load(path, false)
}

fn load(path: &Path, required: bool) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix("QUOTES")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("terminal.client_ids")
                .with_list_parse_key("collection.symbols")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Default configuration rendered as TOML.
pub fn default_toml() -> Result<String, SettingsError> {
    Ok(toml::to_string_pretty(&AppConfig::default())?)
}
