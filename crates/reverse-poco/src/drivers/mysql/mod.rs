//! MySQL/MariaDB database driver.
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+
//!
//! The inspected schema is the connected database unless `connection.schema`
//! names another one.

mod reader;

pub use reader::{connect, MysqlReader};
