//! Configuration management
//!
//! TOML configuration with environment variable substitution and overrides,
//! plus secure credential wrappers.

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ArgusConfig, ConnectionConfig, DetectionConfig, LoggingConfig, NerConfig,
    QuasiIdentifierConfig, SamplingConfig, ScannerConfig,
};
pub use secret::{SecretString, SecretValue};

impl ArgusConfig {
    /// Loads and validates configuration from a TOML file
    ///
    /// Convenience wrapper around [`loader::load_config`].
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::domain::Result<Self> {
        loader::load_config(path)
    }
}
