//! Validate config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(config) => {
                println!("✅ Configuration is valid");
                config
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Connections: {}", config.connections.len());
        for connection in &config.connections {
            println!(
                "    {} -> {}:{}/{}",
                connection.id, connection.host, connection.port, connection.database
            );
        }
        println!(
            "  Reporting Threshold: {}",
            config.detection.reporting_threshold
        );
        println!(
            "  Short-circuit: {}",
            config.detection.stop_pipeline_on_high_confidence
        );
        println!(
            "  QI Analysis: {} (ML clustering: {})",
            config.detection.quasi_identifier.enabled,
            config.detection.quasi_identifier.use_machine_learning
        );
        println!(
            "  Sampling: {} rows, method '{}', {} concurrent queries",
            config.sampling.default_size,
            config.sampling.default_method,
            config.sampling.max_concurrent_queries
        );
        println!(
            "  NER: {}{}",
            if config.ner.enabled { "enabled" } else { "disabled" },
            if config.ner.enabled {
                format!(" ({})", config.ner.url)
            } else {
                String::new()
            }
        );
        println!("  Workers: {}", config.scanner.worker_threads);

        Ok(0)
    }
}
