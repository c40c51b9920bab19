//! Core abstractions shared by every database driver.
//!
//! - [`schema`]: canonical table, column, key and procedure types
//! - [`traits`]: the [`SchemaReader`] trait and the [`Dialect`] tag
//! - [`assembler`]: merges reader output into a [`Schema`]
//! - [`identifier`]: naming conventions and C# identifier helpers

pub mod assembler;
pub mod identifier;
pub mod schema;
pub mod traits;

pub use assembler::assemble;
pub use identifier::NamingConvention;
pub use schema::{Column, ForeignKey, Parameter, ParameterDirection, Procedure, Schema, Table};
pub use traits::{ColumnInfo, Dialect, SchemaReader, TableMap};
