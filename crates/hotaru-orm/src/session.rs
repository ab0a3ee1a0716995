//! Execution sessions and the connection boundary.
//!
//! A [`Session`] owns exactly one live database connection and executes
//! rendered SQL with bound parameters. The connection itself is an external
//! collaborator behind the [`Connection`] trait; driver crates (or test
//! fakes) implement it and register a factory with [`register_connector`] so
//! sessions can be opened from a [`DbConfig`] alone.
//!
//! A session is not safe for concurrent use: callers needing concurrency use
//! one session per thread. Execution is a blocking round trip.

use std::sync::RwLock;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::clause::Params;
use crate::value::{Row, Value};
use hotaru_core::{default_config, DbConfig, Error, Result};

/// The result of executing one mutating statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Outcome {
    /// Number of rows affected.
    pub affected: u64,
    /// The auto-increment id assigned by the database, if any.
    pub last_insert_id: Option<u64>,
}

/// A streaming result handle produced by [`Connection::query_iter`].
///
/// Implementations release driver-side resources on drop.
pub trait RowCursor {
    /// Fetches the next row, or `None` when the result set is exhausted.
    fn next_row(&mut self) -> Option<Result<Row>>;
}

/// The driver boundary: one live database connection.
///
/// hotaru issues SQL text with named parameter bindings (or positional value
/// rows for the batch path) and interprets the outcome; everything below
/// that line belongs to the driver. Errors cross this boundary unchanged,
/// wrapped in [`Error::Driver`].
pub trait Connection {
    /// Executes a mutating statement and reports affected rows and the
    /// last-insert id.
    fn execute(&mut self, sql: &str, params: &Params) -> Result<Outcome>;

    /// Executes a query and returns the full row set.
    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>>;

    /// Executes a query and returns a streaming cursor over the result.
    fn query_iter<'a>(&'a mut self, sql: &str, params: &Params)
        -> Result<Box<dyn RowCursor + 'a>>;

    /// Executes one parameterized statement once per value row and returns
    /// the total affected count.
    fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<u64>;

    /// Begins a transaction.
    fn begin(&mut self) -> Result<()>;

    /// Commits the open transaction.
    fn commit(&mut self) -> Result<()>;

    /// Rolls back the open transaction.
    fn rollback(&mut self) -> Result<()>;

    /// Returns the current autocommit setting.
    fn autocommit(&self) -> bool;

    /// Changes the autocommit setting.
    fn set_autocommit(&mut self, enabled: bool) -> Result<()>;

    /// Checks connection liveness.
    fn ping(&mut self) -> bool;

    /// Re-establishes the connection after a failed ping.
    fn reconnect(&mut self) -> Result<()>;

    /// Closes the connection. Further calls on a closed connection fail.
    fn close(&mut self) -> Result<()>;
}

// ── Connector registry ─────────────────────────────────────────────────

type Connector = Box<dyn Fn(&DbConfig) -> Result<Box<dyn Connection>> + Send + Sync>;

static CONNECTOR: Lazy<RwLock<Option<Connector>>> = Lazy::new(|| RwLock::new(None));

/// Installs the factory used to open connections from a [`DbConfig`].
///
/// Driver crates call this from their `install()` entry point; installing a
/// new factory replaces the previous one. Sessions consult the factory only
/// at creation time.
pub fn register_connector<F>(connector: F)
where
    F: Fn(&DbConfig) -> Result<Box<dyn Connection>> + Send + Sync + 'static,
{
    *CONNECTOR
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Box::new(connector));
}

fn open_connection(config: &DbConfig) -> Result<Box<dyn Connection>> {
    let guard = CONNECTOR
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    match guard.as_ref() {
        Some(connector) => connector(config),
        None => Err(Error::driver(
            "no connector registered; call a driver crate's install() first",
        )),
    }
}

// ── Cursor ─────────────────────────────────────────────────────────────

/// A live, streaming result handle borrowed from a session.
///
/// Dropping the cursor (or calling [`close`](Cursor::close)) releases the
/// underlying driver resources.
pub struct Cursor<'a> {
    inner: Box<dyn RowCursor + 'a>,
}

impl Cursor<'_> {
    /// Fetches the next row, or `None` when exhausted.
    pub fn next_row(&mut self) -> Option<Result<Row>> {
        self.inner.next_row()
    }

    /// Releases the cursor explicitly.
    pub fn close(self) {
        drop(self);
    }
}

impl Iterator for Cursor<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }
}

// ── Session ────────────────────────────────────────────────────────────

/// An owned database connection plus execution and transaction scoping.
///
/// The session closes its connection exactly once: on an explicit
/// [`close`](Session::close) or on drop, whichever comes first.
pub struct Session {
    conn: Box<dyn Connection>,
    in_transaction: bool,
    closed: bool,
}

impl Session {
    /// Opens a session with an explicit configuration.
    pub fn open(config: &DbConfig) -> Result<Self> {
        let mut conn = open_connection(config)?;
        conn.set_autocommit(config.autocommit)?;
        debug!(host = %config.host, database = %config.database, "session opened");
        Ok(Self {
            conn,
            in_transaction: false,
            closed: false,
        })
    }

    /// Opens a session from the process default configuration, read once at
    /// this call.
    pub fn open_default() -> Result<Self> {
        Self::open(&default_config())
    }

    /// Wraps an already-established connection in a session.
    pub fn from_connection(conn: Box<dyn Connection>) -> Self {
        Self {
            conn,
            in_transaction: false,
            closed: false,
        }
    }

    /// Returns `true` while a transaction scope is active.
    pub const fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Returns `true` once the session has been closed.
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// One reconnect-ping attempt before a non-transactional statement.
    /// Inside a transaction the connection must not be re-established.
    fn check_link(&mut self) {
        if !self.in_transaction && !self.conn.ping() {
            let _ = self.conn.reconnect();
        }
    }

    /// Executes a mutating statement and returns the affected-row count.
    pub fn execute(&mut self, sql: &str, params: &Params) -> Result<u64> {
        self.check_link();
        debug!(sql, params = params.len(), "execute");
        self.conn.execute(sql, params).map(|o| o.affected)
    }

    /// Executes a mutating statement and returns the last-insert id
    /// (`0` when the statement assigned none).
    pub fn execute_for_id(&mut self, sql: &str, params: &Params) -> Result<u64> {
        self.check_link();
        debug!(sql, params = params.len(), "execute for id");
        self.conn
            .execute(sql, params)
            .map(|o| o.last_insert_id.unwrap_or(0))
    }

    /// Executes a query and returns the full row set.
    pub fn fetch_all(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>> {
        self.check_link();
        debug!(sql, params = params.len(), "query");
        self.conn.query(sql, params)
    }

    /// Executes a query and returns a streaming cursor.
    ///
    /// The caller is responsible for releasing the cursor (drop or
    /// [`Cursor::close`]) before using the session again.
    pub fn cursor(&mut self, sql: &str, params: &Params) -> Result<Cursor<'_>> {
        self.check_link();
        debug!(sql, params = params.len(), "query cursor");
        let inner = self.conn.query_iter(sql, params)?;
        Ok(Cursor { inner })
    }

    /// Executes one parameterized statement once per value row and returns
    /// the total affected count.
    pub fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<u64> {
        self.check_link();
        debug!(sql, rows = rows.len(), "execute batch");
        self.conn.execute_batch(sql, rows)
    }

    /// Runs `work` inside a transaction scope.
    ///
    /// Autocommit is disabled and a transaction begun; on `Ok` the
    /// transaction commits, on `Err` it rolls back and the error propagates
    /// unchanged. The prior autocommit setting is restored on every exit
    /// path. Nested scopes are not supported.
    pub fn transaction<T>(&mut self, work: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.in_transaction {
            return Err(Error::driver("nested transaction scopes are not supported"));
        }
        let prior = self.conn.autocommit();
        self.conn.set_autocommit(false)?;
        if let Err(e) = self.conn.begin() {
            let _ = self.conn.set_autocommit(prior);
            return Err(e);
        }
        self.in_transaction = true;
        let result = work(self);
        self.in_transaction = false;

        let finished = match result {
            Ok(value) => match self.conn.commit() {
                Ok(()) => Ok(value),
                Err(e) => {
                    let _ = self.conn.rollback();
                    Err(e)
                }
            },
            Err(e) => {
                debug!(error = %e, "transaction rolled back");
                let _ = self.conn.rollback();
                Err(e)
            }
        };
        let restored = self.conn.set_autocommit(prior);
        match (finished, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
        }
    }

    /// Closes the session. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("session closed");
        self.conn.close()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.conn.close();
        }
    }
}
