//! # hotaru-orm
//!
//! A fluent SQL query-construction and lightweight ORM layer for MySQL.
//! Application code expresses CRUD and join operations as method chains that
//! compile to parameterized SQL, execute against a [`Session`](session::Session),
//! and optionally hydrate results into typed [`Model`](model::Model) instances.
//!
//! ## Architecture
//!
//! A query builder accumulates clause fragments without touching the database.
//! SQL is only rendered when a terminal method (`fetch()`, `one()`, `go()`,
//! ...) is called, at which point the fixed statement template for the builder
//! kind is filled in by the [`render`] module and executed through the
//! session's connection. Every user-supplied value travels as a named
//! placeholder binding, never as literal SQL text.
//!
//! ## Module Overview
//!
//! - [`model`] - The [`Model`](model::Model) trait, [`Descriptor`](model::Descriptor)
//!   metadata, and entity persistence operations
//! - [`fields`] - Map-backed column storage for record-style models
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum and [`Row`](value::Row)
//! - [`clause`] - Clause accumulators (WHERE, ORDER BY, JOIN, SET, VALUES, ...)
//! - [`render`] - The fixed SQL statement templates and placeholder renderer
//! - [`query`] - The query builder hierarchy and its terminal operations
//! - [`session`] - The execution session, connection boundary, and transactions

// These clippy lints are intentionally allowed for the ORM crate:
// - format_push_string: format! with push_str is clearer for SQL assembly
// - return_self_not_must_use: builder pattern methods are self-documenting
// - needless_pass_by_value: chainable APIs take owned values on purpose
#![allow(clippy::format_push_string)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]

pub mod clause;
pub mod fields;
pub mod model;
pub mod query;
pub mod render;
pub mod session;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use clause::{JoinKind, On, Params};
pub use fields::FieldSet;
pub use hotaru_core::{
    default_config, replace_default, update_default, DbConfig, DbConfigPatch, Error, Result,
};
pub use model::{Descriptor, Model, OnConflict, Persist};
pub use query::{
    Binding, Conditional, DeleteQuery, InsertManyQuery, InsertQuery, Ordered, Paged, QueryBase,
    SelectQuery, UpdateQuery,
};
pub use session::{register_connector, Connection, Cursor, Outcome, RowCursor, Session};
pub use value::{FromValue, Row, Value};
