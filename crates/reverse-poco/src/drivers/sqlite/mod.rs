//! SQLite database driver.
//!
//! `connection.database` is the path of the database file; it is opened
//! read-only and never created.

mod reader;

pub use reader::{connect, SqliteReader};
