//! PostgreSQL schema reader implementation.
//!
//! Reads metadata from `pg_catalog` and `information_schema`.
//! Uses deadpool-postgres for connection pooling.

use std::collections::HashMap;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use indexmap::IndexMap;
use tokio_postgres::types::ToSql;
use tokio_postgres::Config as PgConfig;
use tokio_postgres::Row;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::core::identifier::NamingConvention;
use crate::core::schema::{ForeignKey, Parameter, ParameterDirection, Procedure};
use crate::core::traits::{push_grouped, ColumnInfo, Dialect, SchemaReader, TableMap};
use crate::drivers::common::SslMode;
use crate::error::{GenError, Result};

const POOL_MAX_SIZE: usize = 2;

const DIALECT: &str = "postgres";

/// Open a PostgreSQL pool and verify it with a test query.
pub async fn connect(config: &ConnectionConfig) -> Result<Pool> {
    let port = config.port_or_default(Dialect::Postgres);

    let mut pg_config = PgConfig::new();
    pg_config.host(&config.host);
    pg_config.port(port);
    pg_config.dbname(&config.database);
    pg_config.user(&config.user);
    pg_config.password(&config.password);

    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };

    let pool = match config.ssl_mode.parse::<SslMode>()?.connector()? {
        None => {
            warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
            let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
            Pool::builder(mgr)
                .max_size(POOL_MAX_SIZE)
                .build()
                .map_err(|e| GenError::connection(e, "creating PostgreSQL pool"))?
        }
        Some(tls_connector) => {
            let mgr = Manager::from_config(pg_config, tls_connector, mgr_config);
            Pool::builder(mgr)
                .max_size(POOL_MAX_SIZE)
                .build()
                .map_err(|e| GenError::connection(e, "creating PostgreSQL pool"))?
        }
    };

    // Test connection
    let client = pool
        .get()
        .await
        .map_err(|e| GenError::connection(e, "testing PostgreSQL connection"))?;
    client
        .simple_query("SELECT 1")
        .await
        .map_err(|e| GenError::connection(e, "testing PostgreSQL connection"))?;

    info!(
        "Connected to PostgreSQL: {}:{}/{}",
        config.host, port, config.database
    );

    Ok(pool)
}

/// PostgreSQL schema reader.
pub struct PostgresReader {
    pool: Pool,
    schema: String,
    naming: NamingConvention,
}

impl PostgresReader {
    /// Create a reader over `schema` (e.g. "public").
    pub fn new(pool: Pool, schema: impl Into<String>, naming: NamingConvention) -> Self {
        Self {
            pool,
            schema: schema.into(),
            naming,
        }
    }

    async fn client(&self, context: &str) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| GenError::metadata(DIALECT, context, e))
    }

    /// Run a catalog query bound to the inspected schema.
    async fn fetch(&self, query: &str, context: &str) -> Result<Vec<Row>> {
        let client = self.client(context).await?;
        let params: [&(dyn ToSql + Sync); 1] = [&self.schema];
        let rows = client
            .query(query, &params)
            .await
            .map_err(|e| GenError::metadata(DIALECT, context, e))?;

        debug!("{}: {} rows", context, rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl SchemaReader for PostgresReader {
    async fn list_tables(&self) -> Result<TableMap<String>> {
        let query = r#"
            SELECT c.relname::text, COALESCE(obj_description(c.oid, 'pg_class'), '')
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = $1
              AND c.relkind IN ('r', 'p')
              AND NOT c.relispartition
            ORDER BY c.relname
        "#;

        let rows = self.fetch(query, "listing PostgreSQL tables").await?;
        Ok(rows
            .iter()
            .map(|row| (row.get::<_, String>(0), row.get::<_, String>(1)))
            .collect())
    }

    async fn list_columns(&self) -> Result<TableMap<Vec<ColumnInfo>>> {
        let query = r#"
            SELECT
                c.relname::text,
                a.attname::text,
                format_type(a.atttypid, NULL),
                NOT a.attnotnull,
                COALESCE(col_description(c.oid, a.attnum), ''),
                a.attnum::int4
            FROM pg_catalog.pg_attribute a
            JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = $1
              AND c.relkind IN ('r', 'p')
              AND NOT c.relispartition
              AND a.attnum > 0
              AND NOT a.attisdropped
            ORDER BY c.relname, a.attnum
        "#;

        let mut columns = TableMap::new();
        for row in self.fetch(query, "listing PostgreSQL columns").await? {
            let column = ColumnInfo {
                name: row.get::<_, String>(1),
                data_type: row.get::<_, String>(2),
                is_nullable: row.get::<_, bool>(3),
                key_position: None,
                description: row.get::<_, String>(4),
                ordinal_pos: row.get::<_, i32>(5),
            };
            push_grouped(&mut columns, row.get::<_, String>(0), column);
        }
        Ok(columns)
    }

    async fn list_primary_keys(&self) -> Result<TableMap<Vec<String>>> {
        let query = r#"
            SELECT t.relname::text, a.attname::text
            FROM pg_catalog.pg_constraint c
            JOIN pg_catalog.pg_class t ON t.oid = c.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid
            WHERE n.nspname = $1
              AND c.contype = 'p'
              AND a.attnum = ANY(c.conkey)
            ORDER BY t.relname, array_position(c.conkey, a.attnum)
        "#;

        let mut keys = TableMap::new();
        for row in self.fetch(query, "listing PostgreSQL primary keys").await? {
            push_grouped(&mut keys, row.get::<_, String>(0), row.get::<_, String>(1));
        }
        Ok(keys)
    }

    async fn list_foreign_keys(&self) -> Result<TableMap<Vec<ForeignKey>>> {
        // Composite constraints unnest into one row per column pair
        let query = r#"
            SELECT
                t.relname::text,
                c.conname::text,
                a.attname::text,
                rt.relname::text,
                ra.attname::text,
                k.ord::int4
            FROM pg_catalog.pg_constraint c
            JOIN pg_catalog.pg_class t ON t.oid = c.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_catalog.pg_class rt ON rt.oid = c.confrelid
            CROSS JOIN LATERAL unnest(c.conkey, c.confkey) WITH ORDINALITY AS k(attnum, ref_attnum, ord)
            JOIN pg_catalog.pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = k.attnum
            JOIN pg_catalog.pg_attribute ra ON ra.attrelid = c.confrelid AND ra.attnum = k.ref_attnum
            WHERE n.nspname = $1 AND c.contype = 'f'
            ORDER BY t.relname, c.conname, k.ord
        "#;

        let mut foreign_keys = TableMap::new();
        for row in self.fetch(query, "listing PostgreSQL foreign keys").await? {
            let constraint: String = row.get(1);
            let fk = ForeignKey::new(
                Some(&constraint),
                row.get::<_, String>(2),
                row.get::<_, String>(3),
                row.get::<_, String>(4),
            )
            .at_position(row.get::<_, i32>(5));
            push_grouped(&mut foreign_keys, row.get::<_, String>(0), fk);
        }
        Ok(foreign_keys)
    }

    async fn list_procedures(&self) -> Result<IndexMap<String, Procedure>> {
        // prokind 'p' needs PostgreSQL 11+
        let query = r#"
            SELECT
                p.proname::text,
                p.proname::text || '_' || p.oid::text,
                COALESCE(pg_get_functiondef(p.oid), ''),
                COALESCE(obj_description(p.oid, 'pg_proc'), '')
            FROM pg_catalog.pg_proc p
            JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
            WHERE n.nspname = $1 AND p.prokind = 'p'
            ORDER BY p.proname, p.oid
        "#;

        let mut procedures = IndexMap::new();
        // information_schema specific_name -> procedure name
        let mut specific_names = HashMap::new();
        for row in self.fetch(query, "listing PostgreSQL procedures").await? {
            let name: String = row.get(0);
            if procedures.contains_key(&name) {
                warn!("Skipping overload of procedure {}", name);
                continue;
            }
            specific_names.insert(row.get::<_, String>(1), name.clone());
            procedures.insert(
                name.clone(),
                Procedure {
                    name,
                    definition: row.get::<_, String>(2),
                    description: row.get::<_, String>(3),
                    parameters: Vec::new(),
                },
            );
        }

        let query = r#"
            SELECT
                p.specific_name::text,
                COALESCE(p.parameter_name::text, ''),
                p.data_type::text,
                COALESCE(p.parameter_mode::text, 'IN'),
                p.ordinal_position::int4
            FROM information_schema.parameters p
            WHERE p.specific_schema = $1
            ORDER BY p.specific_name, p.ordinal_position
        "#;

        for row in self.fetch(query, "listing PostgreSQL procedure parameters").await? {
            let Some(owner) = specific_names.get(&row.get::<_, String>(0)) else {
                continue;
            };
            let Some(procedure) = procedures.get_mut(owner) else {
                continue;
            };

            let mut name: String = row.get(1);
            if name.is_empty() {
                name = format!("p{}", row.get::<_, i32>(4));
            }
            procedure.parameters.push(Parameter::new(
                name,
                row.get::<_, String>(2),
                ParameterDirection::from_mode(&row.get::<_, String>(3)),
            ));
        }

        Ok(procedures)
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn naming(&self) -> NamingConvention {
        self.naming
    }
}
