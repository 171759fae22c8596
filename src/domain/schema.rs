//! Extracted database schema metadata
//!
//! Ownership runs parent to child (schema → table → column); a column names
//! its table through a [`ColumnRef`] instead of a back-pointer, so the graph
//! is acyclic and serializes in the forward direction only. Metadata is
//! immutable after extraction.

use crate::domain::ids::ColumnRef;
use serde::{Deserialize, Serialize};

/// Schema metadata for one scanned database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    /// Schema (or catalog) name
    pub name: String,

    /// Tables in extraction order
    pub tables: Vec<TableInfo>,
}

impl SchemaInfo {
    /// Creates an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// All columns across all tables, in table order
    pub fn all_columns(&self) -> Vec<&ColumnInfo> {
        self.tables.iter().flat_map(|t| t.columns.iter()).collect()
    }

    /// Total column count
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Returns a copy restricted to the named tables (case-insensitive)
    pub fn retain_tables(mut self, table_names: &[String]) -> Self {
        if table_names.is_empty() {
            return self;
        }
        let wanted: Vec<String> = table_names.iter().map(|t| t.to_lowercase()).collect();
        self.tables
            .retain(|t| wanted.contains(&t.name.to_lowercase()));
        self
    }
}

/// Metadata for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name
    pub name: String,

    /// Owning schema name
    pub schema: String,

    /// Optional table comment
    pub comment: Option<String>,

    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    /// Creates a table with no columns
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            comment: None,
            columns: Vec::new(),
        }
    }
}

/// Metadata for one column
///
/// Foreign-key participation is recorded as the set of referenced /
/// referencing columns so eligibility checks don't need the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,

    /// Owning table, by reference
    pub table: ColumnRef,

    /// Database type name as reported by the driver (e.g. `varchar`, `int8`)
    pub database_type_name: String,

    /// Whether the driver reports the type as numeric
    pub is_numeric: bool,

    /// Whether the column is part of the primary key
    pub is_primary_key: bool,

    /// Whether the column is nullable
    pub is_nullable: bool,

    /// Column comment, if any
    pub comment: Option<String>,

    /// Columns this column references (imported keys)
    pub imported_keys: Vec<ColumnRef>,

    /// Columns referencing this column (exported keys)
    pub exported_keys: Vec<ColumnRef>,
}

impl ColumnInfo {
    /// Creates a plain, non-key column
    pub fn new(
        table_name: impl Into<String>,
        name: impl Into<String>,
        database_type_name: impl Into<String>,
    ) -> Self {
        let table_name = table_name.into();
        let name = name.into();
        Self {
            table: ColumnRef::new(table_name, name.clone()),
            name,
            database_type_name: database_type_name.into(),
            is_numeric: false,
            is_primary_key: false,
            is_nullable: true,
            comment: None,
            imported_keys: Vec::new(),
            exported_keys: Vec::new(),
        }
    }

    /// Reference to this column (`table.column`)
    pub fn column_ref(&self) -> ColumnRef {
        self.table.clone()
    }

    /// Whether the column participates in any foreign-key relationship
    pub fn participates_in_foreign_key(&self) -> bool {
        !self.imported_keys.is_empty() || !self.exported_keys.is_empty()
    }

    /// Builder-style numeric flag
    pub fn numeric(mut self, is_numeric: bool) -> Self {
        self.is_numeric = is_numeric;
        self
    }

    /// Builder-style primary-key flag
    pub fn primary_key(mut self, is_primary_key: bool) -> Self {
        self.is_primary_key = is_primary_key;
        self
    }

    /// Builder-style comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_ref_points_at_owner() {
        let col = ColumnInfo::new("customers", "email", "varchar");
        assert_eq!(col.column_ref().key(), "customers.email");
    }

    #[test]
    fn test_foreign_key_participation() {
        let mut col = ColumnInfo::new("orders", "customer_id", "int8").numeric(true);
        assert!(!col.participates_in_foreign_key());
        col.imported_keys.push(ColumnRef::new("customers", "id"));
        assert!(col.participates_in_foreign_key());
    }

    #[test]
    fn test_schema_column_count() {
        let mut schema = SchemaInfo::new("public");
        let mut table = TableInfo::new("public", "customers");
        table.columns.push(ColumnInfo::new("customers", "id", "int8"));
        table
            .columns
            .push(ColumnInfo::new("customers", "email", "varchar"));
        schema.tables.push(table);
        assert_eq!(schema.column_count(), 2);
        assert_eq!(schema.all_columns().len(), 2);
    }

    #[test]
    fn test_retain_tables_is_case_insensitive() {
        let mut schema = SchemaInfo::new("public");
        schema.tables.push(TableInfo::new("public", "Customers"));
        schema.tables.push(TableInfo::new("public", "orders"));
        let filtered = schema.retain_tables(&["customers".to_string()]);
        assert_eq!(filtered.tables.len(), 1);
        assert_eq!(filtered.tables[0].name, "Customers");
    }

    #[test]
    fn test_retain_tables_empty_keeps_all() {
        let mut schema = SchemaInfo::new("public");
        schema.tables.push(TableInfo::new("public", "a"));
        schema.tables.push(TableInfo::new("public", "b"));
        let filtered = schema.retain_tables(&[]);
        assert_eq!(filtered.tables.len(), 2);
    }
}
