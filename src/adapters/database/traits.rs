//! Database abstraction traits
//!
//! The scan pipeline consumes databases through these traits only; concrete
//! adapters (PostgreSQL today) implement them. `as_any` lets an extractor or
//! sampler downcast a connection to its concrete type when it needs
//! driver-level access.

use crate::config::SamplingConfig;
use crate::domain::{ColumnInfo, ColumnRef, ConnectionId, Result, SampleData, SchemaInfo};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;

/// Opens connections by configured connection id
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection for a named configuration entry
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::DatabaseError::UnknownConnection`] for an
    /// unconfigured id, or a connection failure from the driver.
    async fn open(&self, connection_id: &ConnectionId) -> Result<Box<dyn DatabaseConnection>>;
}

/// An open, closable database connection
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Catalog (database) name
    fn catalog(&self) -> &str;

    /// Database product name
    fn product_name(&self) -> &str;

    /// Database product version
    fn product_version(&self) -> &str;

    /// Host the connection points at, without credentials
    fn host(&self) -> &str;

    /// Releases the connection's resources
    async fn close(&self) -> Result<()>;

    /// Downcast support for concrete adapters
    fn as_any(&self) -> &dyn Any;
}

/// Extracts schema metadata from an open connection
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Extracts the full schema
    async fn extract(&self, connection: &dyn DatabaseConnection) -> Result<SchemaInfo>;

    /// Extracts metadata restricted to the named tables
    async fn extract_for_tables(
        &self,
        connection: &dyn DatabaseConnection,
        tables: &[String],
    ) -> Result<SchemaInfo>;
}

/// Samples column values from an open connection
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Extracts samples for every column, honouring
    /// `config.max_concurrent_queries`
    async fn extract_samples(
        &self,
        connection: &dyn DatabaseConnection,
        columns: &[ColumnInfo],
        config: &SamplingConfig,
    ) -> Result<HashMap<ColumnRef, SampleData>>;
}
