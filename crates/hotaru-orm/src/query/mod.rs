//! The query builder hierarchy.
//!
//! Builders are lazy: they accumulate clause fragments and parameter
//! bindings through method chains and only render + execute when a terminal
//! method is called. Capabilities are layered as traits — every builder has
//! a session binding ([`QueryBase`]), condition support is [`Conditional`],
//! ordering is [`Ordered`], pagination is [`Paged`] — and each concrete
//! builder composes the capabilities its statement template supports.
//!
//! Terminal calls are repeatable: rendering is a pure function of the
//! accumulated state, so calling a terminal twice produces byte-identical
//! SQL. A builder without an explicitly bound session opens a temporary one
//! from the process default configuration and closes it on every exit path
//! of the terminal call.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteQuery;
pub use insert::{InsertManyQuery, InsertQuery};
pub use select::SelectQuery;
pub use update::UpdateQuery;

use crate::clause::{OrderClause, PageClause, Params, WhereClause};
use crate::session::Session;
use crate::value::Value;
use hotaru_core::Result;

/// How a builder reaches a session at terminal-call time.
pub enum Binding<'a> {
    /// No session bound; a temporary one is opened from the process default
    /// configuration and closed when the terminal call finishes.
    Deferred,
    /// A caller-supplied session; the caller keeps ownership of its
    /// lifecycle.
    Bound(&'a mut Session),
}

impl Default for Binding<'_> {
    fn default() -> Self {
        Self::Deferred
    }
}

/// Runs `work` against the bound session, or against a temporary session
/// opened from the default configuration. A temporary session is closed
/// exactly once, on success and on failure alike.
pub(crate) fn run_bound<T>(
    binding: &mut Binding<'_>,
    work: impl FnOnce(&mut Session) -> Result<T>,
) -> Result<T> {
    match binding {
        Binding::Bound(session) => work(session),
        Binding::Deferred => {
            let mut session = Session::open_default()?;
            let result = work(&mut session);
            let closed = session.close();
            match (result, closed) {
                (Ok(value), Ok(())) => Ok(value),
                (Err(e), _) | (Ok(_), Err(e)) => Err(e),
            }
        }
    }
}

/// Base capability: session binding and raw parameter bindings.
pub trait QueryBase<'a>: Sized {
    /// Accessor for the session binding.
    fn binding_mut(&mut self) -> &mut Binding<'a>;

    /// Accessor for the statement's parameter map.
    fn params_mut(&mut self) -> &mut Params;

    /// Binds the builder to a caller-owned session.
    #[must_use]
    fn via(mut self, session: &'a mut Session) -> Self {
        *self.binding_mut() = Binding::Bound(session);
        self
    }

    /// Binds to a session when one is supplied, otherwise leaves the builder
    /// on the temporary-session path.
    #[must_use]
    fn via_opt(mut self, session: Option<&'a mut Session>) -> Self {
        if let Some(session) = session {
            *self.binding_mut() = Binding::Bound(session);
        }
        self
    }

    /// Binds a caller-chosen named parameter, for use by raw fragments
    /// (e.g. `filter_raw("aid <= :aid_limit")` with `bind("aid_limit", 3)`).
    #[must_use]
    fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params_mut().insert(name, value.into());
        self
    }
}

/// Capability: WHERE conditions.
pub trait Conditional<'a>: QueryBase<'a> {
    /// Accessor for the WHERE clause and the parameter map together.
    fn where_parts(&mut self) -> (&mut WhereClause, &mut Params);

    /// Adds a `column = value` condition; the value is placeholder-bound.
    #[must_use]
    fn filter(mut self, column: &str, value: impl Into<Value>) -> Self {
        let (where_clause, params) = self.where_parts();
        where_clause.eq(column, value.into(), params);
        self
    }

    /// Adds a raw condition fragment, taken verbatim and combined with
    /// `AND`.
    #[must_use]
    fn filter_raw(mut self, fragment: impl Into<String>) -> Self {
        self.where_parts().0.raw(fragment);
        self
    }
}

/// Capability: ORDER BY.
pub trait Ordered<'a>: QueryBase<'a> {
    /// Accessor for the ORDER BY clause.
    fn order_clause_mut(&mut self) -> &mut OrderClause;

    /// Appends an ordering expression (column name, optionally with a
    /// direction keyword).
    #[must_use]
    fn order_by(mut self, expression: impl Into<String>) -> Self {
        self.order_clause_mut().push(expression);
        self
    }

    /// Toggles the ordering direction of every expression.
    #[must_use]
    fn reverse(mut self) -> Self {
        self.order_clause_mut().reverse();
        self
    }
}

/// Capability: LIMIT / OFFSET.
pub trait Paged<'a>: QueryBase<'a> {
    /// Accessor for the pagination clause.
    fn page_clause_mut(&mut self) -> &mut PageClause;

    /// Sets the row limit.
    #[must_use]
    fn limit(mut self, limit: u64) -> Self {
        self.page_clause_mut().limit(limit);
        self
    }

    /// Sets the row offset.
    #[must_use]
    fn offset(mut self, offset: u64) -> Self {
        self.page_clause_mut().offset(offset);
        self
    }

    /// Sets offset = `page * per_page` and limit = `per_page`.
    #[must_use]
    fn pagination(mut self, page: u64, per_page: u64) -> Self {
        self.page_clause_mut().pagination(page, per_page);
        self
    }
}
