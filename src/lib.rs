// Argus - Database PII discovery and re-identification risk scanner
// Copyright (c) 2025 Argus Contributors
// Licensed under the MIT License

//! # Argus - Database PII Scanner
//!
//! Argus scans relational databases to discover columns containing
//! personally identifiable information (PII) and groups of columns that
//! together act as quasi-identifiers. It produces a compliance report
//! listing every scanned column, the PII types detected with confidence
//! scores, and re-identification risk estimates for correlated column
//! groups.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Detecting** PII per column through a multi-strategy pipeline
//!   (name/comment heuristics, a regex pattern library, and an optional
//!   remote NER service) with short-circuit evaluation and result caching
//! - **Correlating** columns (Pearson for numeric pairs, Cramér's V for
//!   categorical) and clustering them into quasi-identifier groups with
//!   re-identification risk scores
//! - **Managing** long-running scan jobs through a strict lifecycle state
//!   machine with persistence and live progress notifications
//!
//! ## Architecture
//!
//! Argus follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Scan pipeline (statistics, detection, QI analysis, jobs,
//!   execution, reporting)
//! - [`adapters`] - External integrations (PostgreSQL, NER service,
//!   repository, notification channels)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use argus::adapters::repository::InMemoryRepository;
//! use argus::config::ArgusConfig;
//! use argus::core::jobs::{ScanRequest, ScanService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load configuration
//!     let config = ArgusConfig::from_file("argus.toml")?;
//!
//!     // Create the scan service over an in-memory store
//!     let service = ScanService::new(config, Arc::new(InMemoryRepository::new())).await?;
//!
//!     // Start a scan and wait for it
//!     let job_id = service
//!         .start_scan(ScanRequest {
//!             connection_id: "prod-warehouse".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     service.wait_for_completion(&job_id).await?;
//!
//!     let report = service.get_report(&job_id).await?;
//!     println!("{} PII columns found", report.summary.pii_columns_found);
//!     Ok(())
//! }
//! ```
//!
//! ## Progress Subscription
//!
//! Every job emits an ordered stream of progress events as it moves through
//! the pipeline phases:
//!
//! ```rust,no_run
//! # use argus::core::jobs::ScanService;
//! # async fn example(service: &ScanService) {
//! let mut events = service.subscribe_progress();
//! while let Ok(event) = events.recv().await {
//!     println!("{}: {} ({}%)", event.job_id, event.status, event.progress_percent);
//! }
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Argus uses the [`domain::ArgusError`] type for all errors:
//!
//! ```rust
//! use argus::domain::{ArgusError, Result};
//!
//! fn example() -> Result<()> {
//!     // Errors are automatically converted using the ? operator
//!     let config = argus::config::ArgusConfig::from_file("argus.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Argus uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(job_id = "d4f0…", "Starting scan");
//! warn!(column = "users.email", "NER call failed");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
