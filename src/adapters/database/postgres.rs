//! PostgreSQL adapter
//!
//! Implements the connector, metadata extractor, and sampler traits on top
//! of a deadpool connection pool. Metadata comes from `information_schema`
//! plus catalog comment lookups; sampling casts values to text server-side
//! so one code path covers every column type.

use super::traits::{Connector, DatabaseConnection, MetadataExtractor, Sampler};
use crate::config::{ConnectionConfig, SamplingConfig};
use crate::core::stats;
use crate::domain::{
    ColumnInfo, ColumnRef, ConnectionId, DatabaseError, Result, SampleData, SchemaInfo, TableInfo,
};
use async_trait::async_trait;
use deadpool_postgres::{Config as PoolConfig, ManagerConfig, Pool, RecyclingMethod, Runtime};
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;

/// Types reported as numeric by `information_schema`
const NUMERIC_TYPES: &[&str] = &[
    "smallint",
    "integer",
    "bigint",
    "numeric",
    "decimal",
    "real",
    "double precision",
    "money",
];

/// Connector over the configured connection entries
pub struct PostgresConnector {
    connections: Vec<ConnectionConfig>,
}

impl PostgresConnector {
    /// Creates a connector with the configured entries
    pub fn new(connections: Vec<ConnectionConfig>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn open(&self, connection_id: &ConnectionId) -> Result<Box<dyn DatabaseConnection>> {
        let entry = self
            .connections
            .iter()
            .find(|c| c.id == connection_id.as_str())
            .ok_or_else(|| DatabaseError::UnknownConnection(connection_id.to_string()))?;

        let connection = PostgresConnection::connect(entry).await?;
        Ok(Box::new(connection))
    }
}

/// One open PostgreSQL connection pool
pub struct PostgresConnection {
    pool: Pool,
    catalog: String,
    host: String,
    product_version: String,
}

impl PostgresConnection {
    /// Opens a pool and probes the server for catalog and version
    async fn connect(entry: &ConnectionConfig) -> Result<Self> {
        tracing::debug!(
            connection = %entry.id,
            host = %entry.host,
            database = %entry.database,
            tls = entry.tls,
            "Opening PostgreSQL connection pool"
        );

        let mut config = PoolConfig::new();
        config.host = Some(entry.host.clone());
        config.port = Some(entry.port);
        config.dbname = Some(entry.database.clone());
        config.user = Some(entry.username.clone());
        config.password = entry
            .password
            .as_ref()
            .map(|p| p.expose_secret().as_ref().to_string());
        config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        config.pool = Some(deadpool_postgres::PoolConfig::new(entry.pool_size));

        let pool = if entry.tls {
            let tls_connector = TlsConnector::builder().build().map_err(|e| {
                DatabaseError::ConnectionFailed(format!("Failed to build TLS connector: {e}"))
            })?;
            config
                .create_pool(Some(Runtime::Tokio1), MakeTlsConnector::new(tls_connector))
        } else {
            config.create_pool(Some(Runtime::Tokio1), tokio_postgres::NoTls)
        }
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        // Probe the server; this surfaces auth and network errors early
        let client = pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        let row = client
            .query_one("SELECT current_database(), version()", &[])
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        let catalog: String = row.get(0);
        let version_banner: String = row.get(1);

        tracing::info!(
            connection = %entry.id,
            catalog = %catalog,
            "PostgreSQL connection established"
        );

        Ok(Self {
            pool,
            catalog,
            host: format!("{}:{}", entry.host, entry.port),
            product_version: parse_server_version(&version_banner),
        })
    }

    /// Checks out a pooled client
    pub(crate) async fn client(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()).into())
    }
}

#[async_trait]
impl DatabaseConnection for PostgresConnection {
    fn catalog(&self) -> &str {
        &self.catalog
    }

    fn product_name(&self) -> &str {
        "PostgreSQL"
    }

    fn product_version(&self) -> &str {
        &self.product_version
    }

    fn host(&self) -> &str {
        &self.host
    }

    async fn close(&self) -> Result<()> {
        self.pool.close();
        tracing::debug!(catalog = %self.catalog, "PostgreSQL pool closed");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Extracts `PostgreSQL 15.4` → `15.4` from the version banner
fn parse_server_version(banner: &str) -> String {
    banner
        .split_whitespace()
        .nth(1)
        .unwrap_or(banner)
        .to_string()
}

/// Quotes an identifier for interpolation into generated SQL
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn downcast(connection: &dyn DatabaseConnection) -> Result<&PostgresConnection> {
    connection
        .as_any()
        .downcast_ref::<PostgresConnection>()
        .ok_or_else(|| {
            DatabaseError::MetadataExtraction(
                "connection is not a PostgreSQL connection".to_string(),
            )
            .into()
        })
}

/// Schema metadata extractor for PostgreSQL
#[derive(Debug, Default)]
pub struct PostgresMetadataExtractor;

impl PostgresMetadataExtractor {
    /// Creates the extractor
    pub fn new() -> Self {
        Self
    }
}

const COLUMNS_QUERY: &str = "\
    SELECT c.table_name, c.column_name, c.data_type, c.is_nullable, \
           col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, \
                           c.ordinal_position::int) AS comment \
    FROM information_schema.columns c \
    JOIN information_schema.tables t \
      ON t.table_schema = c.table_schema AND t.table_name = c.table_name \
    WHERE c.table_schema = 'public' AND t.table_type = 'BASE TABLE' \
    ORDER BY c.table_name, c.ordinal_position";

const PRIMARY_KEYS_QUERY: &str = "\
    SELECT kcu.table_name, kcu.column_name \
    FROM information_schema.table_constraints tc \
    JOIN information_schema.key_column_usage kcu \
      ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
    WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = 'public'";

const FOREIGN_KEYS_QUERY: &str = "\
    SELECT kcu.table_name, kcu.column_name, ccu.table_name, ccu.column_name \
    FROM information_schema.table_constraints tc \
    JOIN information_schema.key_column_usage kcu \
      ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
    JOIN information_schema.constraint_column_usage ccu \
      ON tc.constraint_name = ccu.constraint_name AND tc.table_schema = ccu.table_schema \
    WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public'";

#[async_trait]
impl MetadataExtractor for PostgresMetadataExtractor {
    async fn extract(&self, connection: &dyn DatabaseConnection) -> Result<SchemaInfo> {
        let pg = downcast(connection)?;
        let client = pg.client().await?;

        let column_rows = client
            .query(COLUMNS_QUERY, &[])
            .await
            .map_err(|e| DatabaseError::MetadataExtraction(e.to_string()))?;
        let pk_rows = client
            .query(PRIMARY_KEYS_QUERY, &[])
            .await
            .map_err(|e| DatabaseError::MetadataExtraction(e.to_string()))?;
        let fk_rows = client
            .query(FOREIGN_KEYS_QUERY, &[])
            .await
            .map_err(|e| DatabaseError::MetadataExtraction(e.to_string()))?;

        let primary_keys: Vec<(String, String)> = pk_rows
            .iter()
            .map(|row| (row.get(0), row.get(1)))
            .collect();

        let mut schema = SchemaInfo::new(pg.catalog().to_string());
        let mut table_index: HashMap<String, usize> = HashMap::new();

        for row in &column_rows {
            let table_name: String = row.get(0);
            let column_name: String = row.get(1);
            let data_type: String = row.get(2);
            let is_nullable: String = row.get(3);
            let comment: Option<String> = row.get(4);

            let mut column = ColumnInfo::new(table_name.clone(), column_name.clone(), &data_type);
            column.is_numeric = NUMERIC_TYPES.contains(&data_type.as_str());
            column.is_nullable = is_nullable == "YES";
            column.is_primary_key = primary_keys
                .iter()
                .any(|(t, c)| t == &table_name && c == &column_name);
            column.comment = comment;

            let index = *table_index.entry(table_name.clone()).or_insert_with(|| {
                schema
                    .tables
                    .push(TableInfo::new("public", table_name.clone()));
                schema.tables.len() - 1
            });
            schema.tables[index].columns.push(column);
        }

        // Record foreign-key participation on both ends
        for row in &fk_rows {
            let from = ColumnRef::new(row.get::<_, String>(0), row.get::<_, String>(1));
            let to = ColumnRef::new(row.get::<_, String>(2), row.get::<_, String>(3));
            for table in &mut schema.tables {
                for column in &mut table.columns {
                    if column.column_ref() == from {
                        column.imported_keys.push(to.clone());
                    } else if column.column_ref() == to {
                        column.exported_keys.push(from.clone());
                    }
                }
            }
        }

        tracing::info!(
            catalog = %schema.name,
            tables = schema.tables.len(),
            columns = schema.column_count(),
            "Schema metadata extracted"
        );

        Ok(schema)
    }

    async fn extract_for_tables(
        &self,
        connection: &dyn DatabaseConnection,
        tables: &[String],
    ) -> Result<SchemaInfo> {
        let schema = self.extract(connection).await?;
        Ok(schema.retain_tables(tables))
    }
}

/// Column value sampler for PostgreSQL
#[derive(Debug, Default)]
pub struct PostgresSampler;

impl PostgresSampler {
    /// Creates the sampler
    pub fn new() -> Self {
        Self
    }

    async fn sample_column(
        pg: &PostgresConnection,
        column: &ColumnInfo,
        config: &SamplingConfig,
    ) -> Result<(ColumnRef, SampleData)> {
        let sql = build_sample_query(column, config);
        let client = pg.client().await?;
        let rows = client
            .query(&sql, &[])
            .await
            .map_err(|e| {
                DatabaseError::Sampling(format!("column {}: {}", column.column_ref(), e))
            })?;

        let values: Vec<Option<Value>> = rows
            .iter()
            .map(|row| row.get::<_, Option<String>>(0).map(Value::String))
            .collect();

        let mut samples = SampleData::new(values);
        if config.entropy_calculation_enabled {
            samples.entropy = Some(stats::analyze(&samples).entropy);
        }

        Ok((column.column_ref(), samples))
    }
}

/// Builds the per-column sampling statement
fn build_sample_query(column: &ColumnInfo, config: &SamplingConfig) -> String {
    let table = quote_ident(&column.table.table);
    let col = quote_ident(&column.name);
    match config.default_method.as_str() {
        "top" => format!(
            "SELECT {col}::text FROM {table} LIMIT {}",
            config.default_size
        ),
        _ => format!(
            "SELECT {col}::text FROM {table} ORDER BY random() LIMIT {}",
            config.default_size
        ),
    }
}

#[async_trait]
impl Sampler for PostgresSampler {
    async fn extract_samples(
        &self,
        connection: &dyn DatabaseConnection,
        columns: &[ColumnInfo],
        config: &SamplingConfig,
    ) -> Result<HashMap<ColumnRef, SampleData>> {
        let pg = downcast(connection)?;

        let samples: HashMap<ColumnRef, SampleData> = stream::iter(columns.to_vec())
            .map(|column| async move { Self::sample_column(pg, &column, config).await }.boxed())
            .buffer_unordered(config.max_concurrent_queries)
            .try_collect()
            .await?;

        tracing::info!(
            columns = samples.len(),
            sample_size = config.default_size,
            method = %config.default_method,
            "Column sampling complete"
        );

        Ok(samples)
    }
}

/// Creates the PostgreSQL-backed adapter set
pub fn create_adapters(
    connections: Vec<ConnectionConfig>,
) -> (
    std::sync::Arc<dyn Connector>,
    std::sync::Arc<dyn MetadataExtractor>,
    std::sync::Arc<dyn Sampler>,
) {
    (
        std::sync::Arc::new(PostgresConnector::new(connections)),
        std::sync::Arc::new(PostgresMetadataExtractor::new()),
        std::sync::Arc::new(PostgresSampler::new()),
    )
}
