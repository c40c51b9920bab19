//! Generation pipeline: dispatch, read, assemble, render.
//!
//! The free functions work on an already-open [`Connection`]. [`Generator`]
//! is the configuration-driven entry point used by the CLI: it owns the
//! loaded [`Config`] and the connection opened from it.
//!
//! Stages run strictly in sequence on the caller's task; nothing is spawned.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::codegen::{self, GeneratedCode, GenerationOptions};
use crate::config::{Config, ConnectionConfig};
use crate::core::{NamingConvention, Schema, SchemaReader};
use crate::drivers::{select_reader, Connection, ReaderImpl};
use crate::error::Result;

/// Read and assemble the schema behind `conn`.
///
/// Foreign keys referencing a table outside the schema are kept and logged.
pub async fn read_schema(conn: &Connection, naming: NamingConvention) -> Result<Schema> {
    let reader = select_reader(conn.dialect().name(), conn, naming)?;
    let schema = reader.read_schema().await?;

    for (table, fk) in schema.dangling_foreign_keys() {
        warn!(
            "Foreign key {}.{} references {}.{}, which is not in the schema",
            table, fk.column, fk.ref_table, fk.ref_column
        );
    }
    Ok(schema)
}

/// Read the schema behind `conn` and render it.
///
/// Options are validated before any catalog query runs.
pub async fn generate(conn: &Connection, options: &GenerationOptions) -> Result<GeneratedCode> {
    options.validate()?;
    let schema = read_schema(conn, options.naming).await?;
    codegen::generate(&schema, conn.dialect(), options)
}

/// Configuration-driven generator.
pub struct Generator {
    config: Config,
    conn: Connection,
}

/// Result of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Engine the schema was read from.
    pub dialect: String,

    /// Schema that was inspected.
    pub schema: String,

    /// Tables read.
    pub tables: usize,

    /// Columns read across all tables.
    pub columns: usize,

    /// Stored procedures read.
    pub procedures: usize,

    /// Foreign keys whose referenced table is outside the schema.
    pub dangling_foreign_keys: usize,

    /// Files written, or that would be written on a dry run.
    pub files: Vec<PathBuf>,

    /// Whether files were left untouched.
    pub dry_run: bool,

    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl GenerationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of a connection health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Engine that was checked.
    pub dialect: String,

    /// Whether the connection opened and the table listing succeeded.
    pub connected: bool,

    /// Time to connect and list tables, in milliseconds.
    pub latency_ms: u64,

    /// Base tables visible in the configured schema.
    pub tables: usize,

    /// Failure message, if any.
    pub error: Option<String>,
}

impl Generator {
    /// Open the configured connection.
    pub async fn new(config: Config) -> Result<Self> {
        let conn = Connection::open(&config.connection).await?;
        Ok(Self { config, conn })
    }

    /// Use an already-open connection.
    pub fn with_connection(config: Config, conn: Connection) -> Self {
        Self { config, conn }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Read the assembled schema without rendering anything.
    pub async fn inspect(&self) -> Result<Schema> {
        read_schema(&self.conn, self.config.generation.naming_convention).await
    }

    /// Read, render and (unless `dry_run`) write the generated files into the
    /// configured output directory.
    pub async fn run(&self, dry_run: bool) -> Result<GenerationResult> {
        let start = Instant::now();
        let options = self.config.generation.options();
        options.validate()?;

        info!(
            "Reading {} schema {:?}",
            self.conn.dialect(),
            self.conn.schema()
        );
        let schema = read_schema(&self.conn, options.naming).await?;
        let code = codegen::generate(&schema, self.conn.dialect(), &options)?;

        let output_dir = &self.config.generation.output_dir;
        let files = if dry_run {
            info!("Dry run: not writing to {}", output_dir.display());
            code.file_paths(output_dir, &options.context_name)
        } else {
            code.write_to(output_dir, &options.context_name)?
        };

        Ok(GenerationResult {
            dialect: self.conn.dialect().to_string(),
            schema: self.conn.schema().to_string(),
            tables: schema.tables.len(),
            columns: schema.column_count(),
            procedures: schema.procedures.len(),
            dangling_foreign_keys: schema.dangling_foreign_keys().len(),
            files,
            dry_run,
            duration_seconds: start.elapsed().as_secs_f64(),
        })
    }
}

/// Open the configured connection and list its tables.
///
/// Connection and catalog failures are reported in the result; an
/// unsupported `type` is still an error.
pub async fn health_check(config: &ConnectionConfig) -> Result<HealthCheckResult> {
    let dialect = config.dialect()?;
    let start = Instant::now();

    let outcome = match Connection::open(config).await {
        Ok(conn) => ReaderImpl::for_connection(&conn, NamingConvention::default())
            .list_tables()
            .await
            .map(|tables| tables.len()),
        Err(e) => Err(e),
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    let result = match outcome {
        Ok(tables) => HealthCheckResult {
            dialect: dialect.to_string(),
            connected: true,
            latency_ms,
            tables,
            error: None,
        },
        Err(e) => {
            warn!("Health check failed: {}", e);
            HealthCheckResult {
                dialect: dialect.to_string(),
                connected: false,
                latency_ms,
                tables: 0,
                error: Some(e.to_string()),
            }
        }
    };
    Ok(result)
}
