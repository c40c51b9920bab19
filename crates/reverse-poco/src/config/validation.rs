//! Configuration validation.

use super::Config;
use crate::core::identifier::{validate_csharp_identifier, validate_namespace};
use crate::core::Dialect;
use crate::drivers::common::SslMode;
use crate::error::{GenError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let conn = &config.connection;

    // Unknown types surface as UnsupportedDialect, before anything connects
    let dialect = conn.dialect()?;

    if conn.database.is_empty() {
        return Err(GenError::Config("connection.database is required".into()));
    }

    if dialect != Dialect::Sqlite {
        if conn.host.is_empty() {
            return Err(GenError::Config("connection.host is required".into()));
        }
        if conn.user.is_empty() {
            return Err(GenError::Config("connection.user is required".into()));
        }
        if conn.port == Some(0) {
            return Err(GenError::Config("connection.port must be non-zero".into()));
        }
    }

    if dialect == Dialect::Postgres {
        conn.ssl_mode.parse::<SslMode>()?;
    }

    validate_namespace(&config.generation.namespace)?;
    validate_csharp_identifier(&config.generation.context_name, "generation.context_name")?;

    Ok(())
}
