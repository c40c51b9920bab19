//! MSSQL schema reader implementation.
//!
//! Reads metadata from the `sys` catalog views, descriptions from the
//! `MS_Description` extended property. Uses Tiberius with bb8 connection pooling.

use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use indexmap::IndexMap;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::core::identifier::NamingConvention;
use crate::core::schema::{ForeignKey, Parameter, ParameterDirection, Procedure};
use crate::core::traits::{push_grouped, ColumnInfo, Dialect, SchemaReader, TableMap};
use crate::error::{GenError, Result};

/// Connection acquisition timeout from pool (30 seconds).
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

const POOL_MAX_SIZE: u32 = 2;

const DIALECT: &str = "mssql";

/// Connection manager for bb8 pool with Tiberius.
#[derive(Clone)]
pub struct TiberiusConnectionManager {
    config: ConnectionConfig,
}

impl TiberiusConnectionManager {
    /// Create a manager for the given connection settings.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    fn build_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(self.config.port_or_default(Dialect::Mssql));
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(
            &self.config.user,
            &self.config.password,
        ));

        // Encryption settings
        if self.config.encrypt {
            if self.config.trust_server_cert {
                config.trust_cert();
            }
            config.encryption(EncryptionLevel::Required);
        } else {
            config.encryption(EncryptionLevel::NotSupported);
        }

        config
    }
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let config = self.build_config();
        let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
            tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            }
        })?;
        tcp.set_nodelay(true).ok();

        Client::connect(config, tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Open an MSSQL pool and verify it with a test query.
pub async fn connect(config: &ConnectionConfig) -> Result<Pool<TiberiusConnectionManager>> {
    let manager = TiberiusConnectionManager::new(config.clone());
    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .connection_timeout(POOL_CONNECTION_TIMEOUT)
        .build(manager)
        .await
        .map_err(|e| GenError::connection(e, "creating MSSQL connection pool"))?;

    // Test connection
    {
        let mut conn = pool
            .get()
            .await
            .map_err(|e| GenError::connection(e, "testing MSSQL connection"))?;
        conn.simple_query("SELECT 1")
            .await
            .map_err(|e| GenError::connection(e, "testing MSSQL connection"))?
            .into_row()
            .await
            .map_err(|e| GenError::connection(e, "testing MSSQL connection"))?;
    }

    info!(
        "Connected to MSSQL: {}:{}/{}",
        config.host,
        config.port_or_default(Dialect::Mssql),
        config.database
    );

    Ok(pool)
}

/// MSSQL schema reader.
pub struct MssqlReader {
    pool: Pool<TiberiusConnectionManager>,
    schema: String,
    naming: NamingConvention,
}

impl MssqlReader {
    /// Create a reader over `schema` (e.g. "dbo").
    pub fn new(
        pool: Pool<TiberiusConnectionManager>,
        schema: impl Into<String>,
        naming: NamingConvention,
    ) -> Self {
        Self {
            pool,
            schema: schema.into(),
            naming,
        }
    }

    /// Get a pooled connection.
    async fn get_client(
        &self,
        context: &str,
    ) -> Result<PooledConnection<'_, TiberiusConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| GenError::metadata(DIALECT, context, e))
    }

    /// Run a catalog query bound to the inspected schema.
    async fn fetch(&self, sql: &str, context: &str) -> Result<Vec<Row>> {
        let mut conn = self.get_client(context).await?;

        let mut query = Query::new(sql);
        query.bind(self.schema.as_str());

        let rows = query
            .query(&mut *conn)
            .await
            .map_err(|e| GenError::metadata(DIALECT, context, e))?
            .into_first_result()
            .await
            .map_err(|e| GenError::metadata(DIALECT, context, e))?;

        debug!("{}: {} rows", context, rows.len());
        Ok(rows)
    }
}

/// NVARCHAR cell; NULL reads as empty.
fn text(row: &Row, idx: usize, context: &str) -> Result<String> {
    let value = row
        .try_get::<&str, _>(idx)
        .map(|v| Some(v.unwrap_or_default().to_string()));
    decoded(value, idx, context)
}

/// INT cell; NULL is an error.
fn int(row: &Row, idx: usize, context: &str) -> Result<i32> {
    decoded(row.try_get::<i32, _>(idx), idx, context)
}

fn decoded<T>(
    value: std::result::Result<Option<T>, tiberius::error::Error>,
    idx: usize,
    context: &str,
) -> Result<T> {
    value
        .map_err(|e| GenError::metadata(DIALECT, context, e))?
        .ok_or_else(|| GenError::metadata(DIALECT, context, format!("column {} is NULL", idx)))
}

#[async_trait]
impl SchemaReader for MssqlReader {
    async fn list_tables(&self) -> Result<TableMap<String>> {
        let query = r#"
            SELECT
                t.name,
                CAST(ISNULL(ep.value, '') AS NVARCHAR(MAX))
            FROM sys.tables t
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            LEFT JOIN sys.extended_properties ep
                ON ep.major_id = t.object_id
                AND ep.minor_id = 0
                AND ep.class = 1
                AND ep.name = 'MS_Description'
            WHERE s.name = @P1 AND t.is_ms_shipped = 0
            ORDER BY t.name
        "#;

        let context = "listing MSSQL tables";
        let mut tables = TableMap::new();
        for row in self.fetch(query, context).await? {
            tables.insert(text(&row, 0, context)?, text(&row, 1, context)?);
        }
        Ok(tables)
    }

    async fn list_columns(&self) -> Result<TableMap<Vec<ColumnInfo>>> {
        let query = r#"
            SELECT
                t.name,
                c.name,
                TYPE_NAME(c.user_type_id),
                CAST(c.is_nullable AS INT),
                CAST(ISNULL(ep.value, '') AS NVARCHAR(MAX)),
                c.column_id
            FROM sys.columns c
            JOIN sys.tables t ON t.object_id = c.object_id
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            LEFT JOIN sys.extended_properties ep
                ON ep.major_id = c.object_id
                AND ep.minor_id = c.column_id
                AND ep.class = 1
                AND ep.name = 'MS_Description'
            WHERE s.name = @P1 AND t.is_ms_shipped = 0
            ORDER BY t.name, c.column_id
        "#;

        let context = "listing MSSQL columns";
        let mut columns = TableMap::new();
        for row in self.fetch(query, context).await? {
            let column = ColumnInfo {
                name: text(&row, 1, context)?,
                data_type: text(&row, 2, context)?,
                is_nullable: int(&row, 3, context)? == 1,
                key_position: None,
                description: text(&row, 4, context)?,
                ordinal_pos: int(&row, 5, context)?,
            };
            push_grouped(&mut columns, text(&row, 0, context)?, column);
        }
        Ok(columns)
    }

    async fn list_primary_keys(&self) -> Result<TableMap<Vec<String>>> {
        let query = r#"
            SELECT t.name, c.name
            FROM sys.indexes i
            JOIN sys.index_columns ic
                ON ic.object_id = i.object_id AND ic.index_id = i.index_id
            JOIN sys.columns c
                ON c.object_id = ic.object_id AND c.column_id = ic.column_id
            JOIN sys.tables t ON t.object_id = i.object_id
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            WHERE s.name = @P1 AND i.is_primary_key = 1
            ORDER BY t.name, ic.key_ordinal
        "#;

        let context = "listing MSSQL primary keys";
        let mut keys = TableMap::new();
        for row in self.fetch(query, context).await? {
            push_grouped(&mut keys, text(&row, 0, context)?, text(&row, 1, context)?);
        }
        Ok(keys)
    }

    async fn list_foreign_keys(&self) -> Result<TableMap<Vec<ForeignKey>>> {
        let query = r#"
            SELECT
                tp.name,
                fk.name,
                cp.name,
                tr.name,
                cr.name,
                fkc.constraint_column_id
            FROM sys.foreign_keys fk
            JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
            JOIN sys.tables tp ON tp.object_id = fkc.parent_object_id
            JOIN sys.columns cp
                ON cp.object_id = fkc.parent_object_id AND cp.column_id = fkc.parent_column_id
            JOIN sys.tables tr ON tr.object_id = fkc.referenced_object_id
            JOIN sys.columns cr
                ON cr.object_id = fkc.referenced_object_id AND cr.column_id = fkc.referenced_column_id
            JOIN sys.schemas s ON s.schema_id = tp.schema_id
            WHERE s.name = @P1
            ORDER BY tp.name, fk.name, fkc.constraint_column_id
        "#;

        let context = "listing MSSQL foreign keys";
        let mut foreign_keys = TableMap::new();
        for row in self.fetch(query, context).await? {
            let constraint = text(&row, 1, context)?;
            let fk = ForeignKey::new(
                Some(&constraint),
                text(&row, 2, context)?,
                text(&row, 3, context)?,
                text(&row, 4, context)?,
            )
            .at_position(int(&row, 5, context)?);
            push_grouped(&mut foreign_keys, text(&row, 0, context)?, fk);
        }
        Ok(foreign_keys)
    }

    async fn list_procedures(&self) -> Result<IndexMap<String, Procedure>> {
        let query = r#"
            SELECT
                p.name,
                CAST(ISNULL(m.definition, '') AS NVARCHAR(MAX)),
                CAST(ISNULL(ep.value, '') AS NVARCHAR(MAX))
            FROM sys.procedures p
            JOIN sys.schemas s ON s.schema_id = p.schema_id
            LEFT JOIN sys.sql_modules m ON m.object_id = p.object_id
            LEFT JOIN sys.extended_properties ep
                ON ep.major_id = p.object_id
                AND ep.minor_id = 0
                AND ep.class = 1
                AND ep.name = 'MS_Description'
            WHERE s.name = @P1 AND p.is_ms_shipped = 0
            ORDER BY p.name
        "#;

        let context = "listing MSSQL procedures";
        let mut procedures = IndexMap::new();
        for row in self.fetch(query, context).await? {
            let name = text(&row, 0, context)?;
            procedures.insert(
                name.clone(),
                Procedure {
                    name,
                    definition: text(&row, 1, context)?,
                    description: text(&row, 2, context)?,
                    parameters: Vec::new(),
                },
            );
        }

        let query = r#"
            SELECT
                p.name,
                prm.name,
                TYPE_NAME(prm.user_type_id),
                CAST(prm.is_output AS INT)
            FROM sys.parameters prm
            JOIN sys.procedures p ON p.object_id = prm.object_id
            JOIN sys.schemas s ON s.schema_id = p.schema_id
            WHERE s.name = @P1 AND prm.parameter_id > 0
            ORDER BY p.name, prm.parameter_id
        "#;

        let context = "listing MSSQL procedure parameters";
        for row in self.fetch(query, context).await? {
            if let Some(procedure) = procedures.get_mut(&text(&row, 0, context)?) {
                let direction = if int(&row, 3, context)? == 1 {
                    ParameterDirection::Out
                } else {
                    ParameterDirection::In
                };
                procedure.parameters.push(Parameter::new(
                    text(&row, 1, context)?,
                    text(&row, 2, context)?,
                    direction,
                ));
            }
        }

        Ok(procedures)
    }

    fn dialect(&self) -> Dialect {
        Dialect::Mssql
    }

    fn naming(&self) -> NamingConvention {
        self.naming
    }
}
