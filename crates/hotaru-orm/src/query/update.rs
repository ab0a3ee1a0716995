//! The UPDATE builder.

use std::marker::PhantomData;

use super::{run_bound, Binding, Conditional, QueryBase};
use crate::clause::{Params, SetClause, WhereClause};
use crate::model::Model;
use crate::render::{self, render};
use crate::value::Value;
use hotaru_core::{Error, Result};

/// Builder for UPDATE statements.
///
/// Assignments go through [`set`](UpdateQuery::set) (placeholder-bound) or
/// [`set_raw`](UpdateQuery::set_raw); conditions come from the
/// [`Conditional`] capability. An UPDATE with an empty WHERE clause is
/// accepted and affects every row.
pub struct UpdateQuery<'a, M: Model> {
    binding: Binding<'a>,
    params: Params,
    set: SetClause,
    where_clause: WhereClause,
    _model: PhantomData<M>,
}

impl<M: Model> Default for UpdateQuery<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: Model> UpdateQuery<'a, M> {
    /// Creates a fresh builder.
    pub fn new() -> Self {
        Self {
            binding: Binding::Deferred,
            params: Params::new(),
            set: SetClause::default(),
            where_clause: WhereClause::default(),
            _model: PhantomData,
        }
    }

    /// Appends a `column = value` assignment with a placeholder-bound value.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set.assign("SET", column, value.into(), &mut self.params);
        self
    }

    /// Appends a raw assignment fragment, taken verbatim
    /// (e.g. `hits = hits + 1`).
    #[must_use]
    pub fn set_raw(mut self, fragment: impl Into<String>) -> Self {
        self.set.raw(fragment);
        self
    }

    /// Renders the statement.
    ///
    /// # Errors
    ///
    /// `EmptyClause` when no assignments have been added.
    pub fn sql(&self) -> Result<String> {
        if self.set.is_empty() {
            return Err(Error::EmptyClause("update has no fields".into()));
        }
        Ok(render(
            render::UPDATE_TEMPLATE,
            &[
                (render::KW_TABLE, M::descriptor().table),
                (render::KW_FIELDS, &self.set.render()),
                (render::KW_WHERE, &self.where_clause.render()),
            ],
        ))
    }

    /// Executes and returns the affected-row count.
    pub fn go(&mut self) -> Result<u64> {
        let sql = self.sql()?;
        let params = self.params.clone();
        run_bound(&mut self.binding, |session| session.execute(&sql, &params))
    }
}

impl<'a, M: Model> QueryBase<'a> for UpdateQuery<'a, M> {
    fn binding_mut(&mut self) -> &mut Binding<'a> {
        &mut self.binding
    }

    fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

impl<'a, M: Model> Conditional<'a> for UpdateQuery<'a, M> {
    fn where_parts(&mut self) -> (&mut WhereClause, &mut Params) {
        (&mut self.where_clause, &mut self.params)
    }
}
