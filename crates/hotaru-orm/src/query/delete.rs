//! The DELETE builder.

use std::marker::PhantomData;

use super::{run_bound, Binding, Conditional, QueryBase};
use crate::clause::{Params, WhereClause};
use crate::model::Model;
use crate::render::{self, render};
use hotaru_core::Result;

/// Builder for DELETE statements.
///
/// A DELETE with an empty WHERE clause is accepted without error and deletes
/// every row in the table. That sharp edge is part of the contract; callers
/// wanting protection add their own conditions.
pub struct DeleteQuery<'a, M: Model> {
    binding: Binding<'a>,
    params: Params,
    where_clause: WhereClause,
    _model: PhantomData<M>,
}

impl<M: Model> Default for DeleteQuery<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: Model> DeleteQuery<'a, M> {
    /// Creates a fresh builder.
    pub fn new() -> Self {
        Self {
            binding: Binding::Deferred,
            params: Params::new(),
            where_clause: WhereClause::default(),
            _model: PhantomData,
        }
    }

    /// Renders the statement. Always succeeds: an unconditioned DELETE is
    /// valid.
    pub fn sql(&self) -> Result<String> {
        Ok(render(
            render::DELETE_TEMPLATE,
            &[
                (render::KW_TABLE, M::descriptor().table),
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

impl<'a, M: Model> QueryBase<'a> for DeleteQuery<'a, M> {
    fn binding_mut(&mut self) -> &mut Binding<'a> {
        &mut self.binding
    }

    fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

impl<'a, M: Model> Conditional<'a> for DeleteQuery<'a, M> {
    fn where_parts(&mut self) -> (&mut WhereClause, &mut Params) {
        (&mut self.where_clause, &mut self.params)
    }
}
