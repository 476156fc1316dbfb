//! Validate configuration command.

use anyhow::Result;
use market_config::load_config;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Provider: {}", config.provider.base_url);
            if config.provider.is_demo_key() {
                println!(
                    "API key: demo (set {} to use your own)",
                    config.provider.api_key_env
                );
            } else {
                println!("API key: from {}", config.provider.api_key_env);
            }
            println!("Cache directory: {}", config.cache.dir);
            println!(
                "Rate limit: {} calls per {}s",
                config.rate_limit.max_calls, config.rate_limit.window_secs
            );
            println!("Retry attempts: {}", config.retry.max_attempts);
            println!();
            println!("{}", config.to_toml()?);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
