//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for scan identifiers. Each type
//! ensures type safety and provides validation for format compliance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Scan job identifier newtype wrapper
///
/// Jobs are identified by a UUID assigned when the job is created.
///
/// # Examples
///
/// ```
/// use argus::domain::ids::JobId;
///
/// let id = JobId::generate();
/// assert!(!id.as_str().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Creates a new JobId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Generates a fresh random job id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Named database connection identifier
///
/// Refers to a connection entry in the configuration. A scan request must
/// name an existing connection id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Creates a new ConnectionId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Connection ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the connection ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ConnectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reference to a column as `table.column`
///
/// Child-to-parent links in the data model are expressed through these
/// references rather than back-pointers; the pair is also the detection
/// cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table name
    pub table: String,
    /// Column name
    pub column: String,
}

impl ColumnRef {
    /// Creates a new column reference
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Cache key in `table.column` form
    pub fn key(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_generate_unique() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_job_id_rejects_empty() {
        assert!(JobId::new("").is_err());
        assert!(JobId::new("   ").is_err());
    }

    #[test]
    fn test_connection_id_from_str() {
        let id = ConnectionId::from_str("prod-warehouse").unwrap();
        assert_eq!(id.as_str(), "prod-warehouse");
    }

    #[test]
    fn test_connection_id_rejects_empty() {
        assert!(ConnectionId::new("").is_err());
    }

    #[test]
    fn test_column_ref_key() {
        let col = ColumnRef::new("customers", "email");
        assert_eq!(col.key(), "customers.email");
        assert_eq!(col.to_string(), "customers.email");
    }

    #[test]
    fn test_column_ref_equality() {
        let a = ColumnRef::new("t", "c");
        let b = ColumnRef::new("t", "c");
        assert_eq!(a, b);
    }
}
