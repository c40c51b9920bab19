//! Core traits for database-agnostic schema reading.
//!
//! - [`Dialect`]: the closed set of supported engine families
//! - [`SchemaReader`]: the five catalog queries every engine implements
//!
//! Readers only query; merging their partial results into a [`Schema`] is done
//! by the shared [`assemble`] function, which no reader overrides.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GenError, Result};

use super::assembler::assemble;
use super::identifier::NamingConvention;
use super::schema::{ForeignKey, Procedure, Schema};

/// Per-table partial result, keyed by native table name in catalog order.
pub type TableMap<T> = IndexMap<String, T>;

/// Supported database engine families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL and MariaDB.
    Mysql,
    /// PostgreSQL.
    Postgres,
    /// Microsoft SQL Server.
    Mssql,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 4] = [
        Dialect::Mysql,
        Dialect::Postgres,
        Dialect::Mssql,
        Dialect::Sqlite,
    ];

    /// Get the dialect identifier (e.g., "mssql", "postgres").
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Mssql => "mssql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Default TCP port, `None` for file-based engines.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Dialect::Mysql => Some(3306),
            Dialect::Postgres => Some(5432),
            Dialect::Mssql => Some(1433),
            Dialect::Sqlite => None,
        }
    }

    /// Default schema inspected when none is configured.
    pub fn default_schema(&self) -> &'static str {
        match self {
            Dialect::Mysql => "",
            Dialect::Postgres => "public",
            Dialect::Mssql => "dbo",
            Dialect::Sqlite => "main",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = GenError;

    /// Parse a dialect tag.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::UnsupportedDialect`] if the tag is not recognized.
    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mssql" | "sqlserver" | "sql_server" => Ok(Dialect::Mssql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(GenError::UnsupportedDialect(tag.to_string())),
        }
    }
}

/// Column as reported by one catalog query, before assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Data type as reported by the engine.
    pub data_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// 1-based position in the primary key, set only by engines that expose
    /// it per column (MySQL, SQLite). Other engines report keys via
    /// `list_primary_keys`.
    pub key_position: Option<i32>,

    /// Column comment, empty when absent.
    pub description: String,

    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}

/// Read schema metadata from a database catalog.
///
/// Each operation is independently callable and idempotent: repeated calls
/// against an unchanged database return identical results. Every operation
/// either fully succeeds or fails with [`GenError::MetadataRead`].
///
/// Identifiers are always returned exactly as the catalog stores them; the
/// naming convention a reader is built with is applied only at generation time.
#[async_trait]
pub trait SchemaReader: Send + Sync {
    /// Table name → table description.
    async fn list_tables(&self) -> Result<TableMap<String>>;

    /// Table name → columns in ordinal order.
    async fn list_columns(&self) -> Result<TableMap<Vec<ColumnInfo>>>;

    /// Table name → primary key columns in key order.
    ///
    /// Engines that flag key columns in [`list_columns`](Self::list_columns)
    /// return an empty map.
    async fn list_primary_keys(&self) -> Result<TableMap<Vec<String>>>;

    /// Table name → foreign keys.
    async fn list_foreign_keys(&self) -> Result<TableMap<Vec<ForeignKey>>>;

    /// Procedure name → procedure with parameters.
    async fn list_procedures(&self) -> Result<IndexMap<String, Procedure>>;

    /// Dialect this reader queries.
    fn dialect(&self) -> Dialect;

    /// Naming convention the reader was built with.
    fn naming(&self) -> NamingConvention;

    /// Run all five queries and assemble the canonical schema.
    ///
    /// This is a provided method; readers do not override it so the merge
    /// rules are identical across engines.
    async fn read_schema(&self) -> Result<Schema> {
        let tables = self.list_tables().await?;
        let columns = self.list_columns().await?;
        let primary_keys = self.list_primary_keys().await?;
        let foreign_keys = self.list_foreign_keys().await?;
        let procedures = self.list_procedures().await?;

        let schema = assemble(tables, columns, primary_keys, foreign_keys, procedures);

        info!(
            "Read {} tables ({} columns) and {} procedures from {}",
            schema.tables.len(),
            schema.column_count(),
            schema.procedures.len(),
            self.dialect()
        );
        Ok(schema)
    }
}

/// Append a value to the per-table list for `table`, preserving first-seen order.
pub(crate) fn push_grouped<T>(map: &mut TableMap<Vec<T>>, table: String, value: T) {
    map.entry(table).or_default().push(value);
}
