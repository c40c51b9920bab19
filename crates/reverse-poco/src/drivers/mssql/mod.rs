//! Microsoft SQL Server driver.
//!
//! - [`MssqlReader`]: schema reader over the `sys` catalog views
//! - [`TiberiusConnectionManager`]: bb8 connection manager for Tiberius

mod reader;

pub use reader::{connect, MssqlReader, TiberiusConnectionManager};
