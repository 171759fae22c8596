//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Argus using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Argus - Database PII discovery and re-identification risk scanner
#[derive(Parser, Debug)]
#[command(name = "argus")]
#[command(version, about, long_about = None)]
#[command(author = "Argus Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "argus.toml", env = "ARGUS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ARGUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a configured database connection for PII and quasi-identifiers
    Scan(commands::scan::ScanArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Check database connections and the NER service
    Probe(commands::probe::ProbeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_scan() {
        let cli = Cli::parse_from(["argus", "scan", "prod-db"]);
        assert_eq!(cli.config, "argus.toml");
        assert!(matches!(cli.command, Commands::Scan(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["argus", "--config", "custom.toml", "scan", "prod-db"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_scan_options() {
        let cli = Cli::parse_from([
            "argus",
            "scan",
            "prod-db",
            "--tables",
            "users,orders",
            "--ml-clustering",
        ]);
        if let Commands::Scan(args) = cli.command {
            assert_eq!(args.connection, "prod-db");
            assert_eq!(args.tables.as_deref(), Some("users,orders"));
            assert!(args.ml_clustering);
        } else {
            panic!("Expected scan command");
        }
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["argus", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_probe() {
        let cli = Cli::parse_from(["argus", "probe", "--connection", "prod-db"]);
        assert!(matches!(cli.command, Commands::Probe(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["argus", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }
}
