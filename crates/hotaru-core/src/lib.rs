//! # hotaru-core
//!
//! Foundation crate for the hotaru ORM. Provides the [`Error`](error::Error)
//! taxonomy shared by every layer, the process-wide default connection
//! configuration ([`DbConfig`](config::DbConfig)), and logging setup helpers.
//!
//! Application code normally depends on `hotaru-orm` and only reaches into
//! this crate for configuration and error matching.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{default_config, replace_default, update_default, DbConfig, DbConfigPatch};
pub use error::{Error, Result};
