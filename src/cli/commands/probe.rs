//! Probe command implementation
//!
//! Checks that the configured collaborators are reachable: opens each
//! database connection (or one named connection) and probes the NER service.

use crate::adapters::database::{Connector, PostgresConnector};
use crate::adapters::ner::NerClient;
use crate::config::load_config;
use crate::domain::ConnectionId;
use clap::Args;
use std::str::FromStr;

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Probe only this connection id
    #[arg(long)]
    pub connection: Option<String>,
}

impl ProbeArgs {
    /// Execute the probe command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let mut failures = 0;

        let targets: Vec<String> = match &self.connection {
            Some(id) => vec![id.clone()],
            None => config.connections.iter().map(|c| c.id.clone()).collect(),
        };

        let connector = PostgresConnector::new(config.connections.clone());
        for id in &targets {
            let connection_id = ConnectionId::from_str(id).map_err(anyhow::Error::msg)?;
            match connector.open(&connection_id).await {
                Ok(connection) => {
                    println!(
                        "✅ {}: {} {} ({})",
                        id,
                        connection.product_name(),
                        connection.product_version(),
                        connection.catalog()
                    );
                    let _ = connection.close().await;
                }
                Err(e) => {
                    println!("❌ {id}: {e}");
                    failures += 1;
                }
            }
        }

        if config.ner.enabled {
            let client = NerClient::new(config.ner.clone())?;
            if client.probe().await {
                println!("✅ NER service: {}", config.ner.url);
            } else {
                println!("❌ NER service unreachable: {}", config.ner.url);
                failures += 1;
            }
        } else {
            println!("ℹ️  NER service disabled");
        }

        Ok(if failures == 0 { 0 } else { 1 })
    }
}
