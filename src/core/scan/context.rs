//! Scan context threaded through the pipeline phases

use crate::adapters::database::DatabaseConnection;
use crate::domain::{
    ColumnRef, DetectionResult, Job, QuasiIdentifierGroup, SampleData, SchemaInfo,
};
use std::collections::HashMap;

/// Accumulated state for one scan
///
/// Each phase reads what earlier phases produced and adds its own output.
/// The context owns the database connection so the executor can release it
/// on every exit path.
pub struct ScanContext {
    /// Job snapshot, refreshed on every accepted transition
    pub job: Job,

    /// Open connection; taken and closed before report generation
    pub connection: Option<Box<dyn DatabaseConnection>>,

    /// Scanned host, captured before the connection closes
    pub host: String,

    /// Extracted schema metadata
    pub schema: Option<SchemaInfo>,

    /// Per-column samples
    pub samples: HashMap<ColumnRef, SampleData>,

    /// Per-column detection results
    pub results: Vec<DetectionResult>,

    /// Extracted quasi-identifier groups
    pub qi_groups: Vec<QuasiIdentifierGroup>,
}

impl ScanContext {
    /// Creates an empty context for a job
    pub fn new(job: Job) -> Self {
        Self {
            job,
            connection: None,
            host: String::new(),
            schema: None,
            samples: HashMap::new(),
            results: Vec::new(),
            qi_groups: Vec::new(),
        }
    }
}
