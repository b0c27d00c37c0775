//! Validate configuration command.

use anyhow::Result;
use quotes_config::{default_toml, load_config};
use std::path::Path;

use crate::cli::ValidateArgs;

pub async fn run(args: ValidateArgs, config_path: &Path) -> Result<()> {
    if args.print_default {
        print!("{}", default_toml()?);
        return Ok(());
    }

    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Terminal: {}", config.tws_config().endpoint());
            println!("Client ids: {:?}", config.terminal.client_ids);
            println!("Symbols: {}", config.collection.symbols.join(", "));
            println!("Data class: {}", config.collection.data_class);
            println!("Overall timeout: {} ms", config.collection.overall_timeout_ms);
            println!(
                "Routing overrides: {}",
                config.routing.overrides.len()
            );
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
