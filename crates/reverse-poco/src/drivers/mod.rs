//! Database driver implementations.
//!
//! One [`SchemaReader`] per supported engine:
//!
//! - [`mysql`]: MySQL/MariaDB via sqlx
//! - [`postgres`]: PostgreSQL via deadpool-postgres
//! - [`mssql`]: Microsoft SQL Server via Tiberius + bb8
//! - [`sqlite`]: SQLite via sqlx
//! - [`common`]: Shared utilities (TLS)
//!
//! # Dispatch
//!
//! A [`Connection`] is an open pool tagged with its [`Dialect`].
//! [`ReaderImpl`] wraps the four readers in an enum and implements
//! [`SchemaReader`] with a plain `match`, so adding an engine is a compile
//! error everywhere it must be handled.

pub mod common;
pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use common::SslMode;
pub use mssql::{MssqlReader, TiberiusConnectionManager};
pub use mysql::MysqlReader;
pub use postgres::PostgresReader;
pub use sqlite::SqliteReader;

pub use crate::core::traits::Dialect;

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::mysql::MySqlPool;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::core::identifier::NamingConvention;
use crate::core::schema::{ForeignKey, Procedure};
use crate::core::traits::{ColumnInfo, SchemaReader, TableMap};
use crate::error::{GenError, Result};

/// An open, dialect-tagged database handle.
///
/// Pools are cheap to clone; readers hold their own handle to the pool.
#[derive(Clone)]
pub enum Connection {
    Mysql {
        pool: MySqlPool,
        schema: String,
    },
    Postgres {
        pool: deadpool_postgres::Pool,
        schema: String,
    },
    Mssql {
        pool: bb8::Pool<TiberiusConnectionManager>,
        schema: String,
    },
    Sqlite {
        pool: SqlitePool,
    },
}

impl Connection {
    /// Open a pool for the configured engine.
    ///
    /// # Errors
    ///
    /// [`GenError::UnsupportedDialect`] for an unknown `type`, before any
    /// network I/O; [`GenError::Connection`] if the pool or test query fails.
    pub async fn open(config: &ConnectionConfig) -> Result<Self> {
        let dialect = config.dialect()?;
        let schema = config.schema_or_default(dialect);

        let conn = match dialect {
            Dialect::Mysql => Connection::Mysql {
                pool: mysql::connect(config).await?,
                schema,
            },
            Dialect::Postgres => Connection::Postgres {
                pool: postgres::connect(config).await?,
                schema,
            },
            Dialect::Mssql => Connection::Mssql {
                pool: mssql::connect(config).await?,
                schema,
            },
            Dialect::Sqlite => Connection::Sqlite {
                pool: sqlite::connect(config).await?,
            },
        };

        debug!("Opened {} connection (schema {:?})", dialect, conn.schema());
        Ok(conn)
    }

    /// Engine family of this handle.
    pub fn dialect(&self) -> Dialect {
        match self {
            Connection::Mysql { .. } => Dialect::Mysql,
            Connection::Postgres { .. } => Dialect::Postgres,
            Connection::Mssql { .. } => Dialect::Mssql,
            Connection::Sqlite { .. } => Dialect::Sqlite,
        }
    }

    /// Schema the readers inspect.
    pub fn schema(&self) -> &str {
        match self {
            Connection::Mysql { schema, .. }
            | Connection::Postgres { schema, .. }
            | Connection::Mssql { schema, .. } => schema,
            Connection::Sqlite { .. } => Dialect::Sqlite.default_schema(),
        }
    }
}

/// Enum-based static dispatch over the four schema readers.
pub enum ReaderImpl {
    Mysql(MysqlReader),
    Postgres(PostgresReader),
    Mssql(MssqlReader),
    Sqlite(SqliteReader),
}

impl ReaderImpl {
    /// Build the reader matching the connection's dialect.
    pub fn for_connection(conn: &Connection, naming: NamingConvention) -> Self {
        match conn {
            Connection::Mysql { pool, schema } => {
                ReaderImpl::Mysql(MysqlReader::new(pool.clone(), schema.clone(), naming))
            }
            Connection::Postgres { pool, schema } => {
                ReaderImpl::Postgres(PostgresReader::new(pool.clone(), schema.clone(), naming))
            }
            Connection::Mssql { pool, schema } => {
                ReaderImpl::Mssql(MssqlReader::new(pool.clone(), schema.clone(), naming))
            }
            Connection::Sqlite { pool } => {
                ReaderImpl::Sqlite(SqliteReader::new(pool.clone(), naming))
            }
        }
    }
}

#[async_trait]
impl SchemaReader for ReaderImpl {
    async fn list_tables(&self) -> Result<TableMap<String>> {
        match self {
            ReaderImpl::Mysql(r) => r.list_tables().await,
            ReaderImpl::Postgres(r) => r.list_tables().await,
            ReaderImpl::Mssql(r) => r.list_tables().await,
            ReaderImpl::Sqlite(r) => r.list_tables().await,
        }
    }

    async fn list_columns(&self) -> Result<TableMap<Vec<ColumnInfo>>> {
        match self {
            ReaderImpl::Mysql(r) => r.list_columns().await,
            ReaderImpl::Postgres(r) => r.list_columns().await,
            ReaderImpl::Mssql(r) => r.list_columns().await,
            ReaderImpl::Sqlite(r) => r.list_columns().await,
        }
    }

    async fn list_primary_keys(&self) -> Result<TableMap<Vec<String>>> {
        match self {
            ReaderImpl::Mysql(r) => r.list_primary_keys().await,
            ReaderImpl::Postgres(r) => r.list_primary_keys().await,
            ReaderImpl::Mssql(r) => r.list_primary_keys().await,
            ReaderImpl::Sqlite(r) => r.list_primary_keys().await,
        }
    }

    async fn list_foreign_keys(&self) -> Result<TableMap<Vec<ForeignKey>>> {
        match self {
            ReaderImpl::Mysql(r) => r.list_foreign_keys().await,
            ReaderImpl::Postgres(r) => r.list_foreign_keys().await,
            ReaderImpl::Mssql(r) => r.list_foreign_keys().await,
            ReaderImpl::Sqlite(r) => r.list_foreign_keys().await,
        }
    }

    async fn list_procedures(&self) -> Result<IndexMap<String, Procedure>> {
        match self {
            ReaderImpl::Mysql(r) => r.list_procedures().await,
            ReaderImpl::Postgres(r) => r.list_procedures().await,
            ReaderImpl::Mssql(r) => r.list_procedures().await,
            ReaderImpl::Sqlite(r) => r.list_procedures().await,
        }
    }

    fn dialect(&self) -> Dialect {
        match self {
            ReaderImpl::Mysql(r) => r.dialect(),
            ReaderImpl::Postgres(r) => r.dialect(),
            ReaderImpl::Mssql(r) => r.dialect(),
            ReaderImpl::Sqlite(r) => r.dialect(),
        }
    }

    fn naming(&self) -> NamingConvention {
        match self {
            ReaderImpl::Mysql(r) => r.naming(),
            ReaderImpl::Postgres(r) => r.naming(),
            ReaderImpl::Mssql(r) => r.naming(),
            ReaderImpl::Sqlite(r) => r.naming(),
        }
    }
}

/// Select the reader for a declared dialect tag.
///
/// # Errors
///
/// [`GenError::UnsupportedDialect`] if `tag` names none of the supported
/// engines; [`GenError::Config`] if it names a different engine than `conn`.
/// No query runs in either case.
pub fn select_reader(
    tag: &str,
    conn: &Connection,
    naming: NamingConvention,
) -> Result<ReaderImpl> {
    let declared: Dialect = tag.parse()?;
    if declared != conn.dialect() {
        return Err(GenError::Config(format!(
            "Dialect tag '{}' does not match the {} connection",
            tag,
            conn.dialect()
        )));
    }
    Ok(ReaderImpl::for_connection(conn, naming))
}
