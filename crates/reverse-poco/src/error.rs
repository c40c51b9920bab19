//! Error types for schema reading and code generation.

use thiserror::Error;

/// Main error type for reverse-poco operations.
#[derive(Error, Debug)]
pub enum GenError {
    /// The connection's dialect tag names none of the supported engines.
    #[error("Unsupported database dialect: '{0}'. Supported dialects: mysql, postgres, mssql, sqlite")]
    UnsupportedDialect(String),

    /// A catalog query failed.
    #[error("Metadata read failed ({dialect}) while {context}: {message}")]
    MetadataRead {
        dialect: &'static str,
        context: String,
        message: String,
    },

    /// Connection or pool setup failed.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenError {
    /// Create a MetadataRead error from an engine diagnostic.
    pub fn metadata(
        dialect: &'static str,
        context: impl Into<String>,
        err: impl std::fmt::Display,
    ) -> Self {
        GenError::MetadataRead {
            dialect,
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Create a Connection error with context about where it occurred.
    pub fn connection(message: impl std::fmt::Display, context: impl Into<String>) -> Self {
        GenError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            GenError::Config(_)
            | GenError::UnsupportedDialect(_)
            | GenError::Yaml(_)
            | GenError::Json(_) => 1,
            GenError::Connection { .. } => 2,
            GenError::MetadataRead { .. } => 3,
            GenError::Io(_) => 7,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for reverse-poco operations.
pub type Result<T> = std::result::Result<T, GenError>;
