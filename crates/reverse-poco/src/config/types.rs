//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::codegen::{ConfigurationStyle, GenerationOptions};
use crate::core::{Dialect, NamingConvention};
use crate::error::Result;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database to inspect.
    pub connection: ConnectionConfig,

    /// Code generation settings.
    pub generation: GenerationConfig,
}

/// Database connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database type: mysql, postgres, mssql or sqlite.
    pub r#type: String,

    /// Database host (unused for sqlite).
    #[serde(default)]
    pub host: String,

    /// Database port (default depends on the database type).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name, or the database file path for sqlite.
    pub database: String,

    /// Username (unused for sqlite).
    #[serde(default)]
    pub user: String,

    /// Password (unused for sqlite).
    #[serde(default)]
    pub password: String,

    /// Schema to inspect (default: public for postgres, dbo for mssql,
    /// the connected database for mysql).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// PostgreSQL SSL mode (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,

    /// Encrypt SQL Server connections (default: true).
    #[serde(default = "default_true")]
    pub encrypt: bool,

    /// Trust the SQL Server certificate without validation (default: false).
    #[serde(default)]
    pub trust_server_cert: bool,
}

impl ConnectionConfig {
    /// Parse the configured database type.
    pub fn dialect(&self) -> Result<Dialect> {
        self.r#type.parse()
    }

    /// Configured port, or the engine default.
    pub fn port_or_default(&self, dialect: Dialect) -> u16 {
        self.port
            .or_else(|| dialect.default_port())
            .unwrap_or_default()
    }

    /// Configured schema, or the engine default.
    pub fn schema_or_default(&self, dialect: Dialect) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => schema.clone(),
            _ => match dialect {
                Dialect::Mysql => self.database.clone(),
                other => other.default_schema().to_string(),
            },
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .field("encrypt", &self.encrypt)
            .field("trust_server_cert", &self.trust_server_cert)
            .finish()
    }
}

/// Code generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// C# namespace of the generated code.
    pub namespace: String,

    /// Name of the generated DbContext class.
    pub context_name: String,

    /// Identifier naming convention (default: word-capitalized).
    #[serde(default)]
    pub naming_convention: NamingConvention,

    /// Context configuration style (default: annotation-based).
    #[serde(default)]
    pub configuration_style: ConfigurationStyle,

    /// Directory generated files are written to (default: "generated").
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl GenerationConfig {
    /// Options handed to the code generator.
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            namespace: self.namespace.clone(),
            context_name: self.context_name.clone(),
            naming: self.naming_convention,
            style: self.configuration_style,
        }
    }
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}
