//! # hotaru
//!
//! A fluent SQL query builder and lightweight ORM for MySQL.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `hotaru` to get the whole stack, or on the individual
//! crates for finer-grained control.

/// Foundation types: errors, default connection configuration, logging.
pub use hotaru_core as core;

/// The ORM: models, query builders, sessions, and the connection boundary.
pub use hotaru_orm as orm;

/// Blocking MySQL driver binding.
#[cfg(feature = "mysql")]
pub use hotaru_mysql as mysql;

// The working vocabulary, re-exported at the root.
pub use hotaru_orm::{
    default_config, replace_default, update_default, Conditional, Connection, Cursor, DbConfig,
    DbConfigPatch, DeleteQuery, Descriptor, Error, FieldSet, InsertManyQuery, InsertQuery,
    JoinKind, Model, On, OnConflict, Ordered, Outcome, Paged, Params, Persist, QueryBase, Result,
    Row, RowCursor, SelectQuery, Session, UpdateQuery, Value,
};
