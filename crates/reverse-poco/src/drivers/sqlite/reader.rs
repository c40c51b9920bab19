//! SQLite schema reader implementation.
//!
//! Reads metadata from `sqlite_master` and the `pragma_table_info` /
//! `pragma_foreign_key_list` table-valued functions. SQLite has no table
//! comments, no named foreign keys and no stored procedures.

use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::core::identifier::NamingConvention;
use crate::core::schema::{ForeignKey, Procedure};
use crate::core::traits::{push_grouped, ColumnInfo, Dialect, SchemaReader, TableMap};
use crate::error::{GenError, Result};

const DIALECT: &str = "sqlite";

/// Open a SQLite pool on an existing database file.
pub async fn connect(config: &ConnectionConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(Path::new(&config.database))
        .create_if_missing(false)
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| GenError::connection(e, "opening SQLite database"))?;

    // Test connection
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(|e| GenError::connection(e, "testing SQLite connection"))?;

    info!("Opened SQLite database: {}", config.database);

    Ok(pool)
}

/// SQLite schema reader.
pub struct SqliteReader {
    pool: SqlitePool,
    naming: NamingConvention,
}

impl SqliteReader {
    /// Create a reader over the main database of `pool`.
    pub fn new(pool: SqlitePool, naming: NamingConvention) -> Self {
        Self { pool, naming }
    }

    async fn fetch(&self, query: &str, context: &str) -> Result<Vec<SqliteRow>> {
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GenError::metadata(DIALECT, context, e))?;

        debug!("{}: {} rows", context, rows.len());
        Ok(rows)
    }
}

fn text(row: &SqliteRow, column: &str, context: &str) -> Result<String> {
    row.try_get::<Option<String>, _>(column)
        .map(Option::unwrap_or_default)
        .map_err(|e| GenError::metadata(DIALECT, context, e))
}

fn int(row: &SqliteRow, column: &str, context: &str) -> Result<i64> {
    row.try_get::<i64, _>(column)
        .map_err(|e| GenError::metadata(DIALECT, context, e))
}

#[async_trait]
impl SchemaReader for SqliteReader {
    async fn list_tables(&self) -> Result<TableMap<String>> {
        let query = r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
        "#;

        let context = "listing SQLite tables";
        let mut tables = TableMap::new();
        for row in self.fetch(query, context).await? {
            tables.insert(text(&row, "name", context)?, String::new());
        }
        Ok(tables)
    }

    async fn list_columns(&self) -> Result<TableMap<Vec<ColumnInfo>>> {
        let query = r#"
            SELECT
                m.name AS table_name,
                p.cid AS cid,
                p.name AS column_name,
                p.type AS data_type,
                p."notnull" AS not_null,
                p.pk AS pk
            FROM sqlite_master m
            JOIN pragma_table_info(m.name) p
            WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
            ORDER BY m.name, p.cid
        "#;

        let context = "listing SQLite columns";
        let mut columns = TableMap::new();
        for row in self.fetch(query, context).await? {
            let column = ColumnInfo {
                name: text(&row, "column_name", context)?,
                data_type: text(&row, "data_type", context)?,
                is_nullable: int(&row, "not_null", context)? == 0,
                key_position: Some(int(&row, "pk", context)? as i32).filter(|&pos| pos > 0),
                description: String::new(),
                ordinal_pos: int(&row, "cid", context)? as i32 + 1,
            };
            push_grouped(&mut columns, text(&row, "table_name", context)?, column);
        }
        Ok(columns)
    }

    async fn list_primary_keys(&self) -> Result<TableMap<Vec<String>>> {
        // Key positions come from pragma_table_info.pk in list_columns
        Ok(TableMap::new())
    }

    async fn list_foreign_keys(&self) -> Result<TableMap<Vec<ForeignKey>>> {
        // A NULL "to" column means the parent's primary key
        let query = r#"
            SELECT
                m.name AS table_name,
                f."from" AS from_column,
                f."table" AS ref_table,
                COALESCE(
                    f."to",
                    (SELECT t.name FROM pragma_table_info(f."table") t WHERE t.pk = f.seq + 1)
                ) AS ref_column,
                f.seq + 1 AS position
            FROM sqlite_master m
            JOIN pragma_foreign_key_list(m.name) f
            WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
            ORDER BY m.name, f.id, f.seq
        "#;

        let context = "listing SQLite foreign keys";
        let mut foreign_keys = TableMap::new();
        for row in self.fetch(query, context).await? {
            let fk = ForeignKey::new(
                None,
                text(&row, "from_column", context)?,
                text(&row, "ref_table", context)?,
                text(&row, "ref_column", context)?,
            )
            .at_position(int(&row, "position", context)? as i32);
            push_grouped(&mut foreign_keys, text(&row, "table_name", context)?, fk);
        }
        Ok(foreign_keys)
    }

    async fn list_procedures(&self) -> Result<IndexMap<String, Procedure>> {
        Ok(IndexMap::new())
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn naming(&self) -> NamingConvention {
        self.naming
    }
}
