//! The SELECT builder.

use std::marker::PhantomData;

use super::{run_bound, Binding, Conditional, Ordered, Paged, QueryBase};
use crate::clause::{
    GroupClause, JoinClause, JoinKind, On, OrderClause, PageClause, Params, WhereClause,
};
use crate::model::Model;
use crate::render::{self, render};
use crate::session::{Cursor, Session};
use crate::value::{Row, Value};
use hotaru_core::{Error, Result};

/// Builder for SELECT statements against one model's table.
///
/// Composes conditions, ordering, pagination, grouping, joins, DISTINCT,
/// FOR UPDATE, and an optional table alias over the fixed SELECT template.
///
/// # Examples
///
/// ```no_run
/// use hotaru_orm::{Conditional, Model, Ordered, Paged};
/// # use hotaru_orm::{Descriptor, FieldSet, Result, Value};
/// # #[derive(Default)]
/// # struct BlogUser { record: FieldSet }
/// # impl Model for BlogUser {
/// #     fn descriptor() -> &'static Descriptor {
/// #         static D: Descriptor = Descriptor {
/// #             table: "blog_user",
/// #             primary_keys: &["uid"],
/// #             auto_increment: Some("uid"),
/// #             fields: &["username", "age"],
/// #         };
/// #         &D
/// #     }
/// #     fn value(&self, c: &str) -> Result<Value> { self.record.checked_get(Self::descriptor(), c) }
/// #     fn set_value(&mut self, c: &str, v: Value) -> Result<()> { self.record.checked_put(Self::descriptor(), c, v) }
/// #     fn contains(&self, c: &str) -> bool { self.record.contains(c) }
/// # }
/// let users: Vec<BlogUser> = BlogUser::select()
///     .filter("username", "Rinka")
///     .order_by("age")
///     .pagination(1, 3)
///     .fetch()?;
/// # Ok::<(), hotaru_orm::Error>(())
/// ```
pub struct SelectQuery<'a, M: Model> {
    binding: Binding<'a>,
    params: Params,
    columns: Option<Vec<String>>,
    distinct: bool,
    for_update: bool,
    alias: Option<String>,
    joins: JoinClause,
    where_clause: WhereClause,
    group: GroupClause,
    order: OrderClause,
    page: PageClause,
    _model: PhantomData<M>,
}

impl<M: Model> Default for SelectQuery<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: Model> SelectQuery<'a, M> {
    /// Creates a fresh builder with no session bound.
    pub fn new() -> Self {
        Self {
            binding: Binding::Deferred,
            params: Params::new(),
            columns: None,
            distinct: false,
            for_update: false,
            alias: None,
            joins: JoinClause::default(),
            where_clause: WhereClause::default(),
            group: GroupClause::default(),
            order: OrderClause::default(),
            page: PageClause::default(),
            _model: PhantomData,
        }
    }

    /// Restricts the projection to the given columns (default is `*`).
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| (*c).to_string()).collect());
        self
    }

    /// Emits `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Appends `FOR UPDATE` to lock the selected rows.
    #[must_use]
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    /// Aliases the main table (`FROM table AS alias`).
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Appends a grouping column.
    #[must_use]
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group.group_by(column);
        self
    }

    /// Appends a raw HAVING condition. Dropped at render time unless a
    /// GROUP BY column is present.
    #[must_use]
    pub fn having_raw(mut self, fragment: impl Into<String>) -> Self {
        self.group.having_raw(fragment);
        self
    }

    /// Appends a HAVING equality term with a placeholder-bound value.
    #[must_use]
    pub fn having(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.group.having_eq(column, value.into(), &mut self.params);
        self
    }

    /// Joins another model's table with the given kind, optional alias, and
    /// ON condition.
    #[must_use]
    pub fn join<O: Model>(mut self, kind: JoinKind, alias: Option<&str>, on: On) -> Self {
        self.joins
            .add(kind, O::descriptor().table, alias, on, &mut self.params);
        self
    }

    /// NATURAL JOIN against another model's table.
    #[must_use]
    pub fn natural_join<O: Model>(self, alias: Option<&str>) -> Self {
        self.join::<O>(JoinKind::Natural, alias, On::new())
    }

    /// INNER JOIN against another model's table.
    #[must_use]
    pub fn inner_join<O: Model>(self, alias: Option<&str>, on: impl Into<On>) -> Self {
        self.join::<O>(JoinKind::Inner, alias, on.into())
    }

    /// LEFT JOIN against another model's table.
    #[must_use]
    pub fn left_join<O: Model>(self, alias: Option<&str>, on: impl Into<On>) -> Self {
        self.join::<O>(JoinKind::Left, alias, on.into())
    }

    /// RIGHT JOIN against another model's table.
    #[must_use]
    pub fn right_join<O: Model>(self, alias: Option<&str>, on: impl Into<On>) -> Self {
        self.join::<O>(JoinKind::Right, alias, on.into())
    }

    /// Renders the statement.
    ///
    /// # Errors
    ///
    /// `EmptyClause` for an explicitly empty projection or for DISTINCT
    /// combined with FOR UPDATE.
    pub fn sql(&self) -> Result<String> {
        let fields = match &self.columns {
            None => "*".to_string(),
            Some(columns) if columns.is_empty() => {
                return Err(Error::EmptyClause("select projection is empty".into()))
            }
            Some(columns) => columns.join(", "),
        };
        if self.distinct && self.for_update {
            return Err(Error::EmptyClause(
                "DISTINCT cannot be combined with FOR UPDATE".into(),
            ));
        }
        let table = self.alias.as_ref().map_or_else(
            || M::descriptor().table.to_string(),
            |alias| format!("{} AS {alias}", M::descriptor().table),
        );
        Ok(render(
            render::SELECT_TEMPLATE,
            &[
                (render::KW_DISTINCT, if self.distinct { "DISTINCT" } else { "" }),
                (render::KW_FIELDS, &fields),
                (render::KW_TABLE, &table),
                (render::KW_JOIN, &self.joins.render()),
                (render::KW_WHERE, &self.where_clause.render()),
                (render::KW_GROUP_BY, &self.group.render_group()),
                (render::KW_HAVING, &self.group.render_having()),
                (render::KW_ORDER_BY, &self.order.render()),
                (render::KW_LIMIT, &self.page.render_limit()),
                (render::KW_OFFSET, &self.page.render_offset()),
                (render::KW_FOR_UPDATE, if self.for_update { "FOR UPDATE" } else { "" }),
            ],
        ))
    }

    /// Executes and returns the raw row set.
    pub fn rows(&mut self) -> Result<Vec<Row>> {
        let sql = self.sql()?;
        let params = self.params.clone();
        run_bound(&mut self.binding, |session| {
            session.fetch_all(&sql, &params)
        })
    }

    /// Executes and hydrates every row into a model instance.
    pub fn fetch(&mut self) -> Result<Vec<M>> {
        Ok(self.rows()?.iter().map(M::from_row).collect())
    }

    /// Executes and returns at most one raw row.
    pub fn one_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows()?.into_iter().next())
    }

    /// Executes and returns at most one hydrated model instance.
    pub fn one(&mut self) -> Result<Option<M>> {
        Ok(self.one_row()?.as_ref().map(M::from_row))
    }

    /// Executes with a `count(1)` projection and returns the count.
    ///
    /// This reuses the ordinary query path rather than a dedicated COUNT
    /// statement, so every accumulated condition applies.
    pub fn count(&mut self) -> Result<u64> {
        let saved = self.columns.replace(vec!["count(1)".to_string()]);
        let row = self.one_row();
        self.columns = saved;
        match row? {
            Some(row) => row.get_by_index::<i64>(0).map(|n| n.max(0) as u64),
            None => Ok(0),
        }
    }

    /// Executes a count and reports whether any row matched.
    pub fn has(&mut self) -> Result<bool> {
        Ok(self.count()? > 0)
    }

    /// Executes and returns a streaming cursor over the result.
    ///
    /// The cursor borrows `session`; the caller releases it (drop or
    /// [`Cursor::close`]) before using the session again.
    pub fn cursor<'s>(&self, session: &'s mut Session) -> Result<Cursor<'s>> {
        let sql = self.sql()?;
        session.cursor(&sql, &self.params)
    }

    /// Executes with a scoped cursor: `work` receives the cursor, and both
    /// the cursor and any temporary session opened for this call are
    /// released on every exit path.
    pub fn with_cursor<T>(
        &mut self,
        work: impl FnOnce(&mut Cursor<'_>) -> Result<T>,
    ) -> Result<T> {
        let sql = self.sql()?;
        let params = self.params.clone();
        run_bound(&mut self.binding, |session| {
            let mut cursor = session.cursor(&sql, &params)?;
            let out = work(&mut cursor);
            drop(cursor);
            out
        })
    }
}

impl<'a, M: Model> QueryBase<'a> for SelectQuery<'a, M> {
    fn binding_mut(&mut self) -> &mut Binding<'a> {
        &mut self.binding
    }

    fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

impl<'a, M: Model> Conditional<'a> for SelectQuery<'a, M> {
    fn where_parts(&mut self) -> (&mut WhereClause, &mut Params) {
        (&mut self.where_clause, &mut self.params)
    }
}

impl<'a, M: Model> Ordered<'a> for SelectQuery<'a, M> {
    fn order_clause_mut(&mut self) -> &mut OrderClause {
        &mut self.order
    }
}

impl<'a, M: Model> Paged<'a> for SelectQuery<'a, M> {
    fn page_clause_mut(&mut self) -> &mut PageClause {
        &mut self.page
    }
}
