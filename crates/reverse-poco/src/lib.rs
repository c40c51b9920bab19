//! # reverse-poco
//!
//! Reverse-engineer Entity Framework Core POCO classes from a live database.
//!
//! The library reads catalog metadata from MySQL/MariaDB, PostgreSQL,
//! SQL Server or SQLite, assembles it into one canonical [`Schema`], and
//! renders C# source text from it:
//!
//! - **Entity classes**, one per table
//! - **A `DbContext`** with one `DbSet` per table, configured either with data
//!   annotations or with `ModelBuilder` calls
//! - **Stored-procedure wrappers** as a partial class of the context
//!
//! ## Example
//!
//! ```rust,no_run
//! use reverse_poco::{Config, Generator};
//!
//! # async fn example() -> reverse_poco::Result<()> {
//! let config = Config::load("config.yaml")?;
//! let generator = Generator::new(config).await?;
//! let result = generator.run(false).await?;
//! println!("Generated {} files", result.files.len());
//! # Ok(())
//! # }
//! ```

pub mod codegen;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod pipeline;
pub mod typemap;

// Re-exports for convenient access
pub use codegen::{ConfigurationStyle, GeneratedCode, GenerationOptions};
pub use config::{Config, ConnectionConfig, GenerationConfig};
pub use core::{
    Column, Dialect, ForeignKey, NamingConvention, Parameter, ParameterDirection, Procedure,
    Schema, SchemaReader, Table,
};
pub use drivers::{select_reader, Connection, ReaderImpl};
pub use error::{GenError, Result};
pub use pipeline::{generate, health_check, read_schema, GenerationResult, Generator, HealthCheckResult};
pub use typemap::CanonicalType;
