//! PostgreSQL database driver.
//!
//! - [`PostgresReader`]: schema reader over `pg_catalog`
//! - [`connect`]: pool setup honoring `connection.ssl_mode`

mod reader;

pub use reader::{connect, PostgresReader};
