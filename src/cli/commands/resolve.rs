//! Resolve command implementation.

use anyhow::{Context, Result};
use quotes_config::load_config_or_default;
use quotes_core::SecurityResolver;
use std::path::Path;

use crate::cli::ResolveArgs;

pub async fn run(args: ResolveArgs, config_path: &Path) -> Result<()> {
    let config = load_config_or_default(config_path).context("Failed to load configuration")?;
    let resolver = config.resolver();

    for symbol in &args.symbols {
        println!("{}", describe(&resolver, symbol));
    }

    Ok(())
}

fn describe(resolver: &SecurityResolver, symbol: &str) -> String {
    let descriptor = resolver.resolve(symbol);
    let route = if resolver.is_overridden(&descriptor.symbol) {
        "override"
    } else {
        "default"
    };
    format!("{} ({})", descriptor, route)
}
