//! Domain models and types for Argus.
//!
//! This module contains the core domain models, types, and business rules.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`JobId`], [`ConnectionId`], [`ColumnRef`])
//! - **Schema metadata** ([`SchemaInfo`], [`TableInfo`], [`ColumnInfo`])
//! - **Detection models** ([`PiiCandidate`], [`DetectionResult`])
//! - **The job state machine** ([`Job`], [`JobStatus`])
//! - **Error types** ([`ArgusError`], [`DatabaseError`], [`NerError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Argus uses the newtype pattern for identifiers to prevent mixing
//! different ID types:
//!
//! ```rust
//! use argus::domain::{ConnectionId, JobId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection_id = ConnectionId::new("prod-warehouse")?;
//! let job_id = JobId::generate();
//!
//! // This won't compile - type safety prevents mixing IDs
//! // let wrong: JobId = connection_id;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod detection;
pub mod errors;
pub mod ids;
pub mod job;
pub mod qi;
pub mod report;
pub mod result;
pub mod sample;
pub mod schema;

// Re-export commonly used types for convenience
pub use detection::{DetectionResult, PiiCandidate, PiiType};
pub use errors::{ArgusError, DatabaseError, NerError};
pub use ids::{ColumnRef, ConnectionId, JobId};
pub use job::{Job, JobStatus, JobView};
pub use qi::{ClusteringMethod, QiGroupMember, QuasiIdentifierGroup};
pub use report::{ComplianceReport, ReportSummary};
pub use result::Result;
pub use sample::SampleData;
pub use schema::{ColumnInfo, SchemaInfo, TableInfo};
