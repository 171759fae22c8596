//! Pattern library for regex-based PII detection

use crate::domain::PiiType;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this entry
    pub patterns: Vec<String>,
    /// Confidence when every sample matches (0.0 - 1.0)
    pub base_score: f64,
    /// Canonical PII type label
    pub pii_type: String,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Entry name from the library
    pub name: String,
    /// Compiled regex
    pub regex: Regex,
    /// Canonical PII type
    pub pii_type: PiiType,
    /// Base score
    pub base_score: f64,
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: HashMap<String, PatternDefinition>,
}

/// Pattern registry for PII detection
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
}

impl PatternRegistry {
    /// Create a new pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read pattern library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut patterns = Vec::new();

        for (name, def) in library.patterns {
            let pii_type = parse_pii_type(&def.pii_type).with_context(|| {
                format!("Invalid pii_type in pattern '{}': {}", name, def.pii_type)
            })?;

            if !(0.0..=1.0).contains(&def.base_score) {
                anyhow::bail!(
                    "base_score out of range in pattern '{}': {}",
                    name,
                    def.base_score
                );
            }

            for pattern_str in &def.patterns {
                let regex = Regex::new(pattern_str)
                    .with_context(|| format!("Invalid regex in pattern '{name}': {pattern_str}"))?;

                patterns.push(CompiledPattern {
                    name: name.clone(),
                    regex,
                    pii_type,
                    base_score: def.base_score,
                });
            }
        }

        // Deterministic strategy output regardless of TOML map ordering
        patterns.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { patterns })
    }

    /// Create a registry with the embedded default patterns
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../patterns/pii_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }
}

/// Parse a PII type label to the canonical enum
fn parse_pii_type(s: &str) -> Result<PiiType> {
    match s.to_uppercase().as_str() {
        "EMAIL" => Ok(PiiType::Email),
        "PHONE" => Ok(PiiType::Phone),
        "SSN" => Ok(PiiType::Ssn),
        "PERSON_NAME" | "PERSON" | "NAME" => Ok(PiiType::PersonName),
        "ADDRESS" | "LOCATION" => Ok(PiiType::Address),
        "DATE_OF_BIRTH" | "DOB" => Ok(PiiType::DateOfBirth),
        "CREDIT_CARD_NUMBER" | "CREDIT_CARD" => Ok(PiiType::CreditCardNumber),
        "IP_ADDRESS" | "IP" => Ok(PiiType::IpAddress),
        "POSTAL_CODE" | "ZIP" => Ok(PiiType::PostalCode),
        "NATIONAL_ID" => Ok(PiiType::NationalId),
        "IBAN" => Ok(PiiType::Iban),
        "URL" => Ok(PiiType::Url),
        "GENDER" => Ok(PiiType::Gender),
        "ORGANIZATION" | "ORG" => Ok(PiiType::Organization),
        "USERNAME" => Ok(PiiType::Username),
        "PASSPORT_NUMBER" | "PASSPORT" => Ok(PiiType::PassportNumber),
        _ => anyhow::bail!("Unknown PII type: {s}"),
    }
}
