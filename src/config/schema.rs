//! Configuration schema types
//!
//! This module defines the configuration structure for Argus. Each section
//! validates itself; [`ArgusConfig::validate`] walks all of them.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Main Argus configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgusConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Named database connections available to scans
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,

    /// Detection pipeline settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Column sampling settings
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// NER service settings
    #[serde(default)]
    pub ner: NerConfig,

    /// Scan worker pool settings
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArgusConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        for connection in &self.connections {
            connection.validate()?;
        }
        self.detection.validate()?;
        self.sampling.validate()?;
        self.ner.validate()?;
        self.scanner.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Looks up a connection by id
    pub fn find_connection(&self, id: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.id == id)
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    /// Validates application settings
    pub fn validate(&self) -> Result<(), String> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(format!(
                "Invalid log_level '{other}': must be one of trace, debug, info, warn, error"
            )),
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// One named database connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection id referenced by scan requests
    pub id: String,

    /// Database host
    pub host: String,

    /// Database port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database / catalog name
    pub database: String,

    /// Login user
    pub username: String,

    /// Login password; supports `${VAR}` substitution in the TOML file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<SecretString>,

    /// Whether to negotiate TLS
    #[serde(default)]
    pub tls: bool,

    /// Connection pool size for sampling queries
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl ConnectionConfig {
    /// Validates the connection entry
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("connection id must not be empty".to_string());
        }
        if self.host.trim().is_empty() {
            return Err(format!("connection '{}': host must not be empty", self.id));
        }
        if self.database.trim().is_empty() {
            return Err(format!(
                "connection '{}': database must not be empty",
                self.id
            ));
        }
        if self.port == 0 {
            return Err(format!("connection '{}': port must be non-zero", self.id));
        }
        if self.pool_size == 0 {
            return Err(format!(
                "connection '{}': pool_size must be at least 1",
                self.id
            ));
        }
        Ok(())
    }
}

/// Detection pipeline configuration
///
/// A snapshot of this struct is stored on every job; the detection cache is
/// flushed whenever the active value changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Short-circuit threshold for the heuristic strategy
    #[serde(default = "default_heuristic_threshold")]
    pub heuristic_threshold: f64,

    /// Short-circuit threshold for the regex strategy
    #[serde(default = "default_regex_threshold")]
    pub regex_threshold: f64,

    /// Short-circuit threshold for the NER strategy
    #[serde(default = "default_ner_threshold")]
    pub ner_threshold: f64,

    /// Minimum confidence for a candidate to survive filtering
    #[serde(default = "default_reporting_threshold")]
    pub reporting_threshold: f64,

    /// Skip later strategies once one produces a candidate at or above its
    /// threshold
    #[serde(default = "default_true")]
    pub stop_pipeline_on_high_confidence: bool,

    /// Path to a pattern library TOML; the embedded library is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_library: Option<String>,

    /// Quasi-identifier analysis settings
    #[serde(default)]
    pub quasi_identifier: QuasiIdentifierConfig,
}

impl DetectionConfig {
    /// Validates thresholds
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("heuristic_threshold", self.heuristic_threshold),
            ("regex_threshold", self.regex_threshold),
            ("ner_threshold", self.ner_threshold),
            ("reporting_threshold", self.reporting_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        self.quasi_identifier.validate()
    }

    /// Short-circuit threshold for a strategy by name
    pub fn threshold_for(&self, strategy: &str) -> f64 {
        match strategy {
            "heuristic" => self.heuristic_threshold,
            "regex" => self.regex_threshold,
            "ner" => self.ner_threshold,
            _ => 1.0,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            heuristic_threshold: default_heuristic_threshold(),
            regex_threshold: default_regex_threshold(),
            ner_threshold: default_ner_threshold(),
            reporting_threshold: default_reporting_threshold(),
            stop_pipeline_on_high_confidence: true,
            pattern_library: None,
            quasi_identifier: QuasiIdentifierConfig::default(),
        }
    }
}

/// Quasi-identifier analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuasiIdentifierConfig {
    /// Master toggle for the QI phase
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Toggle for the correlation-based annotation pass
    #[serde(default = "default_true")]
    pub correlation_analysis_enabled: bool,

    /// Use DBSCAN clustering instead of graph components
    #[serde(default)]
    pub use_machine_learning: bool,

    /// Smallest group size worth reporting
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,

    /// Largest group size; larger components are decomposed
    #[serde(default = "default_max_group_size")]
    pub max_group_size: usize,

    /// Minimum pairwise correlation for a graph edge
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,

    /// Base distance threshold for DBSCAN
    #[serde(default = "default_clustering_distance_threshold")]
    pub clustering_distance_threshold: f64,

    /// Eligibility: minimum distinct values in the sample
    #[serde(default = "default_min_distinct_value_count")]
    pub min_distinct_value_count: usize,

    /// Eligibility: maximum distinct/total ratio (excludes near-unique columns)
    #[serde(default = "default_max_distinct_value_ratio")]
    pub max_distinct_value_ratio: f64,

    /// Eligibility: minimum sample entropy in bits
    #[serde(default = "default_entropy_threshold")]
    pub entropy_threshold: f64,

    /// k used when converting estimated k-anonymity into a risk factor
    #[serde(default = "default_k_anonymity_threshold")]
    pub k_anonymity_threshold: u32,
}

impl QuasiIdentifierConfig {
    /// Validates group sizes and thresholds
    pub fn validate(&self) -> Result<(), String> {
        if self.min_group_size < 2 {
            return Err("quasi_identifier.min_group_size must be at least 2".to_string());
        }
        if self.max_group_size < self.min_group_size {
            return Err(
                "quasi_identifier.max_group_size must be >= min_group_size".to_string()
            );
        }
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err("quasi_identifier.correlation_threshold must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.max_distinct_value_ratio) {
            return Err(
                "quasi_identifier.max_distinct_value_ratio must be within [0, 1]".to_string()
            );
        }
        if self.clustering_distance_threshold <= 0.0 {
            return Err(
                "quasi_identifier.clustering_distance_threshold must be positive".to_string()
            );
        }
        if self.k_anonymity_threshold == 0 {
            return Err("quasi_identifier.k_anonymity_threshold must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for QuasiIdentifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            correlation_analysis_enabled: true,
            use_machine_learning: false,
            min_group_size: default_min_group_size(),
            max_group_size: default_max_group_size(),
            correlation_threshold: default_correlation_threshold(),
            clustering_distance_threshold: default_clustering_distance_threshold(),
            min_distinct_value_count: default_min_distinct_value_count(),
            max_distinct_value_ratio: default_max_distinct_value_ratio(),
            entropy_threshold: default_entropy_threshold(),
            k_anonymity_threshold: default_k_anonymity_threshold(),
        }
    }
}

/// Column sampling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Rows sampled per column
    #[serde(default = "default_sample_size")]
    pub default_size: usize,

    /// `random` or `top`
    #[serde(default = "default_sample_method")]
    pub default_method: String,

    /// Upper bound on concurrent sampling queries per scan
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    /// Compute per-column entropy during sampling
    #[serde(default = "default_true")]
    pub entropy_calculation_enabled: bool,
}

impl SamplingConfig {
    /// Validates sampling settings
    pub fn validate(&self) -> Result<(), String> {
        if self.default_size == 0 {
            return Err("sampling.default_size must be at least 1".to_string());
        }
        match self.default_method.as_str() {
            "random" | "top" => {}
            other => {
                return Err(format!(
                    "sampling.default_method '{other}' is not supported: use 'random' or 'top'"
                ))
            }
        }
        if self.max_concurrent_queries == 0 {
            return Err("sampling.max_concurrent_queries must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            default_size: default_sample_size(),
            default_method: default_sample_method(),
            max_concurrent_queries: default_max_concurrent_queries(),
            entropy_calculation_enabled: true,
        }
    }
}

/// NER service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NerConfig {
    /// Whether the NER strategy participates in detection
    #[serde(default)]
    pub enabled: bool,

    /// Service endpoint; `GET {url}/health` is the liveness probe
    #[serde(default = "default_ner_url")]
    pub url: String,

    /// Per-call timeout
    #[serde(default = "default_ner_timeout")]
    pub timeout_seconds: u64,

    /// Upper bound on samples posted per column
    #[serde(default = "default_ner_max_samples")]
    pub max_samples: usize,

    /// Retries for transient failures; 404 is never retried
    #[serde(default = "default_ner_retries")]
    pub retry_attempts: u32,

    /// Fixed delay between retries
    #[serde(default = "default_ner_retry_delay")]
    pub retry_delay_ms: u64,
}

impl NerConfig {
    /// Validates NER settings
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled {
            if self.url.trim().is_empty() {
                return Err("ner.url must not be empty when ner.enabled".to_string());
            }
            if self.timeout_seconds == 0 {
                return Err("ner.timeout_seconds must be at least 1".to_string());
            }
            if self.max_samples == 0 {
                return Err("ner.max_samples must be at least 1".to_string());
            }
        }
        Ok(())
    }
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_ner_url(),
            timeout_seconds: default_ner_timeout(),
            max_samples: default_ner_max_samples(),
            retry_attempts: default_ner_retries(),
            retry_delay_ms: default_ner_retry_delay(),
        }
    }
}

/// Scan worker pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Parallel scan jobs
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Admitted jobs waiting for a worker
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

impl ScannerConfig {
    /// Validates worker pool settings
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_threads == 0 {
            return Err("scanner.worker_threads must be at least 1".to_string());
        }
        if self.queue_size == 0 {
            return Err("scanner.queue_size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            queue_size: default_queue_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to rotating files
    #[serde(default)]
    pub local_enabled: bool,

    /// Log file directory
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// `daily` or `hourly`
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    /// Validates logging settings
    pub fn validate(&self) -> Result<(), String> {
        match self.local_rotation.as_str() {
            "daily" | "hourly" => Ok(()),
            other => Err(format!(
                "logging.local_rotation '{other}' is not supported: use 'daily' or 'hourly'"
            )),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_pool_size() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_heuristic_threshold() -> f64 {
    0.7
}

fn default_regex_threshold() -> f64 {
    0.8
}

fn default_ner_threshold() -> f64 {
    0.8
}

fn default_reporting_threshold() -> f64 {
    0.5
}

fn default_min_group_size() -> usize {
    2
}

fn default_max_group_size() -> usize {
    5
}

fn default_correlation_threshold() -> f64 {
    0.7
}

fn default_clustering_distance_threshold() -> f64 {
    0.3
}

fn default_min_distinct_value_count() -> usize {
    5
}

fn default_max_distinct_value_ratio() -> f64 {
    0.95
}

fn default_entropy_threshold() -> f64 {
    1.0
}

fn default_k_anonymity_threshold() -> u32 {
    5
}

fn default_sample_size() -> usize {
    100
}

fn default_sample_method() -> String {
    "random".to_string()
}

fn default_max_concurrent_queries() -> usize {
    5
}

fn default_ner_url() -> String {
    "http://localhost:5000/ner".to_string()
}

fn default_ner_timeout() -> u64 {
    10
}

fn default_ner_max_samples() -> usize {
    50
}

fn default_ner_retries() -> u32 {
    2
}

fn default_ner_retry_delay() -> u64 {
    500
}

fn default_worker_threads() -> usize {
    4
}

fn default_queue_size() -> usize {
    32
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for ArgusConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            connections: Vec::new(),
            detection: DetectionConfig::default(),
            sampling: SamplingConfig::default(),
            ner: NerConfig::default(),
            scanner: ScannerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
