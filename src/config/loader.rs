//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Two kinds of environment variable support:
//!
//! 1. **Substitution syntax (`${VAR}`)** inside the TOML file, typically for
//!    credentials:
//!
//!    ```toml
//!    [[connections]]
//!    id = "prod-warehouse"
//!    password = "${WAREHOUSE_PASSWORD}"
//!    ```
//!
//! 2. **Override syntax (`ARGUS_*`)** applied after parsing, for container
//!    deployments:
//!
//!    ```bash
//!    ARGUS_APPLICATION_LOG_LEVEL=debug
//!    ARGUS_DETECTION_REPORTING_THRESHOLD=0.6
//!    ARGUS_NER_URL=http://ner.internal:5000/ner
//!    ARGUS_QI_USE_MACHINE_LEARNING=true
//!    ```

use super::schema::ArgusConfig;
use crate::domain::errors::ArgusError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ArgusConfig`]
/// 4. Applies environment variable overrides (`ARGUS_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsing fails, a referenced
/// environment variable is missing, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<ArgusConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ArgusError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ArgusError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ArgusConfig = toml::from_str(&contents)
        .map_err(|e| ArgusError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config
        .validate()
        .map_err(|e| ArgusError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. All referenced variables must be set.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("substitution regex is valid");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ArgusError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    if result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        ArgusError::Configuration(format!("Invalid value for {name}: '{value}'"))
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ArgusError::Configuration(format!(
            "Invalid boolean for {name}: '{value}'"
        ))),
    }
}

/// Applies `ARGUS_*` environment variable overrides
///
/// Covers the knobs that deployments commonly change at runtime; connection
/// entries stay file-only since they carry credentials through `${VAR}`
/// substitution instead.
fn apply_env_overrides(config: &mut ArgusConfig) -> Result<()> {
    if let Some(v) = env_var("ARGUS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = v;
    }

    // Detection
    if let Some(v) = env_var("ARGUS_DETECTION_HEURISTIC_THRESHOLD") {
        config.detection.heuristic_threshold = parse_value("ARGUS_DETECTION_HEURISTIC_THRESHOLD", &v)?;
    }
    if let Some(v) = env_var("ARGUS_DETECTION_REGEX_THRESHOLD") {
        config.detection.regex_threshold = parse_value("ARGUS_DETECTION_REGEX_THRESHOLD", &v)?;
    }
    if let Some(v) = env_var("ARGUS_DETECTION_NER_THRESHOLD") {
        config.detection.ner_threshold = parse_value("ARGUS_DETECTION_NER_THRESHOLD", &v)?;
    }
    if let Some(v) = env_var("ARGUS_DETECTION_REPORTING_THRESHOLD") {
        config.detection.reporting_threshold =
            parse_value("ARGUS_DETECTION_REPORTING_THRESHOLD", &v)?;
    }
    if let Some(v) = env_var("ARGUS_DETECTION_STOP_PIPELINE_ON_HIGH_CONFIDENCE") {
        config.detection.stop_pipeline_on_high_confidence =
            parse_bool("ARGUS_DETECTION_STOP_PIPELINE_ON_HIGH_CONFIDENCE", &v)?;
    }
    if let Some(v) = env_var("ARGUS_DETECTION_PATTERN_LIBRARY") {
        config.detection.pattern_library = Some(v);
    }

    // Quasi-identifier analysis
    if let Some(v) = env_var("ARGUS_QI_ENABLED") {
        config.detection.quasi_identifier.enabled = parse_bool("ARGUS_QI_ENABLED", &v)?;
    }
    if let Some(v) = env_var("ARGUS_QI_CORRELATION_ANALYSIS_ENABLED") {
        config.detection.quasi_identifier.correlation_analysis_enabled =
            parse_bool("ARGUS_QI_CORRELATION_ANALYSIS_ENABLED", &v)?;
    }
    if let Some(v) = env_var("ARGUS_QI_USE_MACHINE_LEARNING") {
        config.detection.quasi_identifier.use_machine_learning =
            parse_bool("ARGUS_QI_USE_MACHINE_LEARNING", &v)?;
    }
    if let Some(v) = env_var("ARGUS_QI_CORRELATION_THRESHOLD") {
        config.detection.quasi_identifier.correlation_threshold =
            parse_value("ARGUS_QI_CORRELATION_THRESHOLD", &v)?;
    }
    if let Some(v) = env_var("ARGUS_QI_MIN_GROUP_SIZE") {
        config.detection.quasi_identifier.min_group_size =
            parse_value("ARGUS_QI_MIN_GROUP_SIZE", &v)?;
    }
    if let Some(v) = env_var("ARGUS_QI_MAX_GROUP_SIZE") {
        config.detection.quasi_identifier.max_group_size =
            parse_value("ARGUS_QI_MAX_GROUP_SIZE", &v)?;
    }

    // Sampling
    if let Some(v) = env_var("ARGUS_SAMPLING_DEFAULT_SIZE") {
        config.sampling.default_size = parse_value("ARGUS_SAMPLING_DEFAULT_SIZE", &v)?;
    }
    if let Some(v) = env_var("ARGUS_SAMPLING_DEFAULT_METHOD") {
        config.sampling.default_method = v;
    }
    if let Some(v) = env_var("ARGUS_SAMPLING_MAX_CONCURRENT_QUERIES") {
        config.sampling.max_concurrent_queries =
            parse_value("ARGUS_SAMPLING_MAX_CONCURRENT_QUERIES", &v)?;
    }

    // NER service
    if let Some(v) = env_var("ARGUS_NER_ENABLED") {
        config.ner.enabled = parse_bool("ARGUS_NER_ENABLED", &v)?;
    }
    if let Some(v) = env_var("ARGUS_NER_URL") {
        config.ner.url = v;
    }
    if let Some(v) = env_var("ARGUS_NER_TIMEOUT_SECONDS") {
        config.ner.timeout_seconds = parse_value("ARGUS_NER_TIMEOUT_SECONDS", &v)?;
    }
    if let Some(v) = env_var("ARGUS_NER_MAX_SAMPLES") {
        config.ner.max_samples = parse_value("ARGUS_NER_MAX_SAMPLES", &v)?;
    }
    if let Some(v) = env_var("ARGUS_NER_RETRY_ATTEMPTS") {
        config.ner.retry_attempts = parse_value("ARGUS_NER_RETRY_ATTEMPTS", &v)?;
    }

    // Scanner pool
    if let Some(v) = env_var("ARGUS_SCANNER_WORKER_THREADS") {
        config.scanner.worker_threads = parse_value("ARGUS_SCANNER_WORKER_THREADS", &v)?;
    }
    if let Some(v) = env_var("ARGUS_SCANNER_QUEUE_SIZE") {
        config.scanner.queue_size = parse_value("ARGUS_SCANNER_QUEUE_SIZE", &v)?;
    }

    // Logging
    if let Some(v) = env_var("ARGUS_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_bool("ARGUS_LOGGING_LOCAL_ENABLED", &v)?;
    }
    if let Some(v) = env_var("ARGUS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = v;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("ARGUS_TEST_SUBST", "secret-value");
        let result = substitute_env_vars("password = \"${ARGUS_TEST_SUBST}\"").unwrap();
        assert_eq!(result, "password = \"secret-value\"");
        std::env::remove_var("ARGUS_TEST_SUBST");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        let result = substitute_env_vars("password = \"${ARGUS_TEST_MISSING_VAR}\"");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("ARGUS_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let result = substitute_env_vars("# uses ${ARGUS_TEST_NOT_SET}\nlevel = \"info\"").unwrap();
        assert!(result.contains("${ARGUS_TEST_NOT_SET}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/argus.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_minimal() {
        let file = write_config(
            r#"
[application]
log_level = "debug"

[[connections]]
id = "test-db"
host = "localhost"
database = "app"
username = "argus"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.connections.len(), 1);
        assert_eq!(config.connections[0].port, 5432);
        assert!(config.detection.quasi_identifier.enabled);
    }

    #[test]
    fn test_load_config_invalid_threshold() {
        let file = write_config(
            r#"
[detection]
reporting_threshold = 7.5
"#,
        );
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "1").unwrap());
        assert!(!parse_bool("X", "no").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_env_override_reporting_threshold() {
        std::env::set_var("ARGUS_DETECTION_REPORTING_THRESHOLD", "0.65");
        let mut config = ArgusConfig::default();
        apply_env_overrides(&mut config).unwrap();
        assert!((config.detection.reporting_threshold - 0.65).abs() < f64::EPSILON);
        std::env::remove_var("ARGUS_DETECTION_REPORTING_THRESHOLD");
    }

    #[test]
    fn test_env_override_ner_url() {
        std::env::set_var("ARGUS_NER_URL", "http://ner.internal:5000/ner");
        let mut config = ArgusConfig::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.ner.url, "http://ner.internal:5000/ner");
        std::env::remove_var("ARGUS_NER_URL");
    }

    #[test]
    fn test_env_override_invalid_number() {
        std::env::set_var("ARGUS_SAMPLING_DEFAULT_SIZE", "lots");
        let mut config = ArgusConfig::default();
        let result = apply_env_overrides(&mut config);
        assert!(result.is_err());
        std::env::remove_var("ARGUS_SAMPLING_DEFAULT_SIZE");
    }
}
