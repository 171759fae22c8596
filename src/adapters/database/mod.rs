//! Database abstraction layer (trait-based) and the PostgreSQL adapter

pub mod postgres;
pub mod traits;

pub use postgres::{create_adapters, PostgresConnector, PostgresMetadataExtractor, PostgresSampler};
pub use traits::{Connector, DatabaseConnection, MetadataExtractor, Sampler};
