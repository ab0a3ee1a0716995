//! Error types shared across the hotaru crates.
//!
//! The taxonomy is deliberately small. The first three variants are caller
//! contract violations raised before any SQL reaches the network; the last
//! wraps whatever the database driver reported, unchanged.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all hotaru operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A get/set was attempted on a column the entity does not declare.
    #[error("unknown column `{column}` on table `{table}`")]
    InvalidColumn {
        /// Table of the entity the access was made against.
        table: &'static str,
        /// The undeclared column name.
        column: String,
    },

    /// A statement was rendered with a required clause left empty, such as an
    /// INSERT or UPDATE with no fields.
    #[error("empty clause: {0}")]
    EmptyClause(String),

    /// A batch insert received a value row whose length does not match the
    /// declared column list.
    #[error("arity mismatch: declared {expected} columns, value row has {got}")]
    ArityMismatch {
        /// Number of declared columns.
        expected: usize,
        /// Length of the offending value row.
        got: usize,
    },

    /// An error propagated from the database driver: connectivity failures,
    /// SQL syntax errors, constraint violations.
    #[error("driver: {0}")]
    Driver(String),
}

impl Error {
    /// Shorthand for building an [`Error::InvalidColumn`].
    pub fn invalid_column(table: &'static str, column: impl Into<String>) -> Self {
        Self::InvalidColumn {
            table,
            column: column.into(),
        }
    }

    /// Shorthand for wrapping a driver-reported error.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    /// Returns `true` if this error is a caller contract violation rather
    /// than a driver failure.
    pub const fn is_caller_error(&self) -> bool {
        !matches!(self, Self::Driver(_))
    }
}
