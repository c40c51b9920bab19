//! Utilities shared across database drivers.
//!
//! - [`tls`]: PostgreSQL `sslmode` parsing and rustls connectors

pub mod tls;

pub use tls::SslMode;
