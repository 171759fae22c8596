//! Scan command implementation
//!
//! Runs one scan end-to-end against a configured connection and prints the
//! compliance report as JSON. Ctrl+C cancels the job; the worker aborts at
//! the next phase boundary.

use crate::adapters::repository::InMemoryRepository;
use crate::config::load_config;
use crate::core::jobs::{ScanRequest, ScanService};
use crate::domain::JobStatus;
use clap::Args;
use std::sync::Arc;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Connection id from the configuration file
    pub connection: String,

    /// Restrict the scan to specific tables (comma-separated)
    #[arg(long)]
    pub tables: Option<String>,

    /// Write the report JSON to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Use DBSCAN clustering for quasi-identifier grouping
    #[arg(long)]
    pub ml_clustering: bool,
}

impl ScanArgs {
    /// Execute the scan command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        if self.ml_clustering {
            config.detection.quasi_identifier.use_machine_learning = true;
        }

        let target_tables: Vec<String> = self
            .tables
            .as_deref()
            .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();

        let repository = Arc::new(InMemoryRepository::new());
        let detection = config.detection.clone();
        let sampling = config.sampling.clone();
        let service = ScanService::new(config, repository).await?;

        let job_id = service
            .start_scan(ScanRequest {
                connection_id: self.connection.clone(),
                target_tables,
                detection: Some(detection),
                sampling: Some(sampling),
            })
            .await?;

        println!("🔍 Scan started: {job_id}");

        // Stream progress while waiting; Ctrl+C cancels
        let mut events = service.subscribe_progress();
        let view = loop {
            tokio::select! {
                event = events.recv() => {
                    if let Ok(event) = event {
                        if event.job_id == job_id {
                            println!("   [{:>3}%] {}", event.progress_percent, event.status);
                        }
                    }
                    let view = service.get_job_status(&job_id).await?;
                    if view.status.is_terminal() {
                        break view;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("\n⚠️  Cancelling scan...");
                    let _ = service.cancel_job(&job_id).await;
                    break service.wait_for_completion(&job_id).await?;
                }
            }
        };

        match view.status {
            JobStatus::Completed => {
                let report = service.get_report(&job_id).await?;
                let json = serde_json::to_string_pretty(&report)?;
                match &self.output {
                    Some(path) => {
                        std::fs::write(path, &json)?;
                        println!("✅ Report written to {path}");
                    }
                    None => println!("{json}"),
                }
                println!(
                    "✅ Scan complete: {} columns, {} with PII, {} quasi-identifier groups",
                    report.summary.columns_scanned,
                    report.summary.pii_columns_found,
                    report.summary.quasi_identifier_groups_found,
                );
                Ok(0)
            }
            JobStatus::Cancelled => {
                println!("⚠️  Scan cancelled");
                Ok(4)
            }
            _ => {
                eprintln!(
                    "❌ Scan failed: {}",
                    view.error_message.as_deref().unwrap_or("unknown error")
                );
                Ok(3)
            }
        }
    }
}
