//! The INSERT builders: single-row and batch.

use std::marker::PhantomData;

use super::{run_bound, Binding, QueryBase};
use crate::clause::{Params, SetClause, ValuesClause};
use crate::model::{Model, OnConflict};
use crate::render::{self, render};
use crate::session::Session;
use crate::value::Value;
use hotaru_core::{Error, Result};

/// Builder for single-row INSERT statements.
///
/// Values are always placeholder-bound; the duplicate-key policy selects the
/// operator keyword (`INSERT` / `INSERT IGNORE` / `REPLACE`) and, for
/// [`OnConflict::Update`], an `ON DUPLICATE KEY UPDATE` term list.
pub struct InsertQuery<'a, M: Model> {
    binding: Binding<'a>,
    params: Params,
    values: ValuesClause,
    operator: &'static str,
    upsert: SetClause,
    _model: PhantomData<M>,
}

impl<M: Model> Default for InsertQuery<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: Model> InsertQuery<'a, M> {
    /// Creates a fresh builder with the [`OnConflict::Fail`] policy.
    pub fn new() -> Self {
        Self {
            binding: Binding::Deferred,
            params: Params::new(),
            values: ValuesClause::default(),
            operator: "INSERT",
            upsert: SetClause::default(),
            _model: PhantomData,
        }
    }

    /// Appends a column with a placeholder-bound value.
    #[must_use]
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.value(column, value.into(), &mut self.params);
        self
    }

    /// Appends a column with a raw value expression, taken verbatim
    /// (e.g. `NOW()`).
    #[must_use]
    pub fn value_raw(mut self, column: &str, expression: impl Into<String>) -> Self {
        self.values.raw(column, expression);
        self
    }

    /// Selects the duplicate-key policy. The four policies are one
    /// discriminated choice; selecting a new one replaces the previous.
    #[must_use]
    pub fn on_conflict(mut self, policy: OnConflict) -> Self {
        self.upsert = SetClause::default();
        self.operator = policy.operator_keyword();
        if let OnConflict::Update(terms) = policy {
            for (column, value) in terms {
                self.upsert
                    .assign("UPSERT", &column, value, &mut self.params);
            }
        }
        self
    }

    /// Renders the statement.
    ///
    /// # Errors
    ///
    /// `EmptyClause` when no values have been added, or when the update
    /// policy was selected with an empty term list.
    pub fn sql(&self) -> Result<String> {
        if self.values.is_empty() {
            return Err(Error::EmptyClause("insert has no fields".into()));
        }
        let duplicate_key = if self.upsert.is_empty() {
            String::new()
        } else {
            format!("ON DUPLICATE KEY UPDATE {}", self.upsert.render())
        };
        Ok(render(
            render::INSERT_TEMPLATE,
            &[
                (render::KW_OPERATOR, self.operator),
                (render::KW_TABLE, M::descriptor().table),
                (render::KW_FIELDS, &self.values.render_fields()),
                (render::KW_VALUES, &self.values.render_values()),
                (render::KW_DUPLICATE_KEY, &duplicate_key),
            ],
        ))
    }

    /// Executes and returns the affected-row count.
    pub fn go(&mut self) -> Result<u64> {
        let sql = self.sql()?;
        let params = self.params.clone();
        run_bound(&mut self.binding, |session| session.execute(&sql, &params))
    }

    /// Executes and returns the last-insert id (`0` when the table has no
    /// auto-increment key).
    pub fn go_for_id(&mut self) -> Result<u64> {
        let sql = self.sql()?;
        let params = self.params.clone();
        run_bound(&mut self.binding, |session| {
            session.execute_for_id(&sql, &params)
        })
    }
}

impl<'a, M: Model> QueryBase<'a> for InsertQuery<'a, M> {
    fn binding_mut(&mut self) -> &mut Binding<'a> {
        &mut self.binding
    }

    fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

/// Builder for batch INSERT statements.
///
/// A batch insert declares a column list once and supplies one value row per
/// record. The rendered statement uses positional `?` placeholders — a
/// multi-row insert cannot use per-row-distinct named bindings against one
/// template — and the terminal call routes to the session's batch execution
/// path, which runs the prepared statement once per row.
pub struct InsertManyQuery<'a, M: Model> {
    binding: Binding<'a>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    _model: PhantomData<M>,
}

impl<M: Model> std::fmt::Debug for InsertManyQuery<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertManyQuery")
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl<M: Model> Default for InsertManyQuery<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: Model> InsertManyQuery<'a, M> {
    /// Creates a fresh builder.
    pub fn new() -> Self {
        Self {
            binding: Binding::Deferred,
            columns: Vec::new(),
            rows: Vec::new(),
            _model: PhantomData,
        }
    }

    /// Binds the builder to a caller-owned session.
    ///
    /// (The batch builder carries no named parameters, so it does not
    /// implement the shared [`QueryBase`] capability.)
    #[must_use]
    pub fn via(mut self, session: &'a mut Session) -> Self {
        self.binding = Binding::Bound(session);
        self
    }

    /// Binds to a session when one is supplied.
    #[must_use]
    pub fn via_opt(mut self, session: Option<&'a mut Session>) -> Self {
        if let Some(session) = session {
            self.binding = Binding::Bound(session);
        }
        self
    }

    /// Declares the column list and appends value rows.
    ///
    /// # Errors
    ///
    /// `ArityMismatch` immediately if any row's length differs from the
    /// column count.
    pub fn values(mut self, columns: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        for row in &rows {
            if row.len() != self.columns.len() {
                return Err(Error::ArityMismatch {
                    expected: self.columns.len(),
                    got: row.len(),
                });
            }
        }
        self.rows = rows;
        Ok(self)
    }

    /// Derives the column list and value rows from model instances.
    ///
    /// The columns are every declared column the first instance currently
    /// contains, in declaration order; instances missing one of those
    /// columns contribute `NULL` for it.
    pub fn from_models(mut self, models: &[M]) -> Result<Self> {
        let Some(first) = models.first() else {
            return Ok(self);
        };
        let descriptor = M::descriptor();
        self.columns = descriptor
            .columns()
            .filter(|column| first.contains(column))
            .map(str::to_string)
            .collect();
        self.rows = models
            .iter()
            .map(|model| {
                self.columns
                    .iter()
                    .map(|column| {
                        if model.contains(column) {
                            model.value(column)
                        } else {
                            Ok(Value::Null)
                        }
                    })
                    .collect::<Result<Vec<Value>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// Renders the statement with positional placeholders.
    ///
    /// # Errors
    ///
    /// `EmptyClause` when no columns have been declared.
    pub fn sql(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(Error::EmptyClause("batch insert has no fields".into()));
        }
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        Ok(render(
            render::INSERT_TEMPLATE,
            &[
                (render::KW_OPERATOR, "INSERT"),
                (render::KW_TABLE, M::descriptor().table),
                (render::KW_FIELDS, &self.columns.join(", ")),
                (render::KW_VALUES, &placeholders),
                (render::KW_DUPLICATE_KEY, ""),
            ],
        ))
    }

    /// Executes the batch and returns the total affected count. A batch
    /// with no value rows executes nothing and reports zero.
    pub fn go(&mut self) -> Result<u64> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        let sql = self.sql()?;
        let rows = self.rows.clone();
        run_bound(&mut self.binding, |session| {
            session.execute_batch(&sql, &rows)
        })
    }
}
