//! Clause accumulators and parameter bindings.
//!
//! Each builder in this module accumulates fragments for one syntactic part
//! of a statement (WHERE, ORDER BY, JOIN, SET, VALUES, ...) and renders it to
//! a clause string. Key=value terms never become literal SQL text: they bind
//! a named placeholder in the statement's [`Params`] map, namespaced by
//! clause role so that one column may appear in several clauses of the same
//! statement without collision (`SET age = :SET_age WHERE age = :WHERE_age`).

use std::collections::BTreeMap;

use crate::value::Value;

/// The named parameter bindings for one statement.
///
/// Placeholder names are generated by [`Params::bind`] under a clause-role
/// namespace and are guaranteed unique within the statement; raw caller
/// bindings are inserted verbatim via [`Params::insert`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    named: BTreeMap<String, Value>,
}

impl Params {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a caller-chosen binding, overwriting any previous value under
    /// the same name. Used for parameters referenced by raw fragments.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.named.insert(name.into(), value);
    }

    /// Binds `value` under a generated placeholder name in the given clause
    /// namespace and returns the name actually used.
    ///
    /// The base name is `<namespace>_<column>` with non-identifier characters
    /// of the column replaced; if that name is already taken a numeric suffix
    /// is appended, so two bindings never collide.
    pub fn bind(&mut self, namespace: &str, column: &str, value: Value) -> String {
        let base = format!("{namespace}_{}", sanitize_identifier(column));
        let mut name = base.clone();
        let mut n = 2;
        while self.named.contains_key(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        self.named.insert(name.clone(), value);
        name
    }

    /// Returns the bound value under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.named.len()
    }

    /// Returns `true` if no parameters are bound.
    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Maps a column reference to a safe placeholder identifier fragment:
/// qualified names like `t.age` become `t_age`.
fn sanitize_identifier(column: &str) -> String {
    column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

// ── WHERE ──────────────────────────────────────────────────────────────

/// Accumulator for WHERE conditions, combined with `AND`.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    terms: Vec<String>,
}

impl WhereClause {
    /// Appends a raw condition fragment, taken verbatim.
    pub fn raw(&mut self, fragment: impl Into<String>) {
        self.terms.push(fragment.into());
    }

    /// Appends an equality term, binding the value under the `WHERE`
    /// namespace.
    pub fn eq(&mut self, column: &str, value: Value, params: &mut Params) {
        let name = params.bind("WHERE", column, value);
        self.terms.push(format!("{column} = :{name}"));
    }

    /// Returns `true` if no conditions have been added.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Renders the clause, or an empty string when no conditions exist
    /// (no `WHERE` keyword is emitted).
    pub fn render(&self) -> String {
        if self.terms.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.terms.join(" AND "))
        }
    }
}

// ── ORDER BY ───────────────────────────────────────────────────────────

/// Accumulator for ORDER BY expressions.
#[derive(Debug, Clone, Default)]
pub struct OrderClause {
    terms: Vec<String>,
    reversed: bool,
}

impl OrderClause {
    /// Appends an ordering expression (a column name with an optional
    /// direction keyword).
    pub fn push(&mut self, expression: impl Into<String>) {
        self.terms.push(expression.into());
    }

    /// Toggles the ordering direction of every expression at render time.
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Returns `true` if no ordering expressions have been added.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Renders the clause, or an empty string when no expressions exist.
    pub fn render(&self) -> String {
        if self.terms.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = if self.reversed {
            self.terms.iter().map(|t| flip_direction(t)).collect()
        } else {
            self.terms.clone()
        };
        format!("ORDER BY {}", rendered.join(", "))
    }
}

/// Flips the direction keyword of one ordering expression.
fn flip_direction(term: &str) -> String {
    let trimmed = term.trim_end();
    if let Some(prefix) = strip_suffix_ignore_case(trimmed, " DESC") {
        format!("{prefix} ASC")
    } else if let Some(prefix) = strip_suffix_ignore_case(trimmed, " ASC") {
        format!("{prefix} DESC")
    } else {
        format!("{trimmed} DESC")
    }
}

fn strip_suffix_ignore_case<'a>(term: &'a str, suffix: &str) -> Option<&'a str> {
    let split = term.len().checked_sub(suffix.len())?;
    let (head, tail) = (term.get(..split)?, term.get(split..)?);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

// ── LIMIT / OFFSET ─────────────────────────────────────────────────────

/// Independent optional LIMIT and OFFSET values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageClause {
    limit: Option<u64>,
    offset: Option<u64>,
}

impl PageClause {
    /// Sets the row limit.
    pub fn limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    /// Sets the row offset.
    pub fn offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    /// Convenience: sets offset = `page * per_page` and limit = `per_page`.
    pub fn pagination(&mut self, page: u64, per_page: u64) {
        self.offset = Some(page * per_page);
        self.limit = Some(per_page);
    }

    /// Renders the LIMIT fragment, or an empty string when unset.
    pub fn render_limit(&self) -> String {
        self.limit.map_or_else(String::new, |n| format!("LIMIT {n}"))
    }

    /// Renders the OFFSET fragment, or an empty string when unset.
    pub fn render_offset(&self) -> String {
        self.offset
            .map_or_else(String::new, |n| format!("OFFSET {n}"))
    }
}

// ── GROUP BY / HAVING ──────────────────────────────────────────────────

/// Accumulator for GROUP BY columns and HAVING conditions.
///
/// HAVING is emitted only when the GROUP BY list is non-empty; a HAVING with
/// no GROUP BY is dropped at render time. This mirrors the statement shape
/// the templates were designed around and is intentional, not an error.
#[derive(Debug, Clone, Default)]
pub struct GroupClause {
    group_by: Vec<String>,
    having: Vec<String>,
}

impl GroupClause {
    /// Appends a grouping column.
    pub fn group_by(&mut self, column: impl Into<String>) {
        self.group_by.push(column.into());
    }

    /// Appends a raw HAVING condition fragment.
    pub fn having_raw(&mut self, fragment: impl Into<String>) {
        self.having.push(fragment.into());
    }

    /// Appends a HAVING equality term, binding the value under the `HAVING`
    /// namespace.
    pub fn having_eq(&mut self, column: &str, value: Value, params: &mut Params) {
        let name = params.bind("HAVING", column, value);
        self.having.push(format!("{column} = :{name}"));
    }

    /// Renders the GROUP BY fragment, or an empty string.
    pub fn render_group(&self) -> String {
        if self.group_by.is_empty() {
            String::new()
        } else {
            format!("GROUP BY {}", self.group_by.join(", "))
        }
    }

    /// Renders the HAVING fragment. Empty when either the HAVING list or the
    /// GROUP BY list is empty.
    pub fn render_having(&self) -> String {
        if self.group_by.is_empty() || self.having.is_empty() {
            String::new()
        } else {
            format!("HAVING {}", self.having.join(" AND "))
        }
    }
}

// ── JOIN ───────────────────────────────────────────────────────────────

/// The supported join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// NATURAL JOIN; carries no ON clause.
    Natural,
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
}

impl JoinKind {
    /// Returns the SQL keyword for this join kind.
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Natural => "NATURAL JOIN",
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }

    /// Returns the placeholder namespace fragment for this join kind.
    const fn namespace(&self) -> &'static str {
        match self {
            Self::Natural => "ON_NATURAL",
            Self::Inner => "ON_INNER",
            Self::Left => "ON_LEFT",
            Self::Right => "ON_RIGHT",
        }
    }
}

/// The ON condition of one join: raw fragments and/or equality terms.
///
/// # Examples
///
/// ```
/// use hotaru_orm::clause::On;
///
/// let on = On::new().raw("a.aid = r.aid").eq("r.visible", 1_i64);
/// ```
#[derive(Debug, Clone, Default)]
pub struct On {
    raw: Vec<String>,
    eq: Vec<(String, Value)>,
}

impl On {
    /// Creates an empty ON condition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw condition fragment.
    #[must_use]
    pub fn raw(mut self, fragment: impl Into<String>) -> Self {
        self.raw.push(fragment.into());
        self
    }

    /// Appends an equality term; the value is bound as a placeholder when
    /// the join is added to a statement.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }
}

impl From<&str> for On {
    fn from(fragment: &str) -> Self {
        Self::new().raw(fragment)
    }
}

/// One rendered join target.
#[derive(Debug, Clone)]
struct JoinTarget {
    kind: JoinKind,
    table: String,
    alias: Option<String>,
    on_terms: Vec<String>,
}

/// Accumulator for an ordered list of join targets.
#[derive(Debug, Clone, Default)]
pub struct JoinClause {
    joins: Vec<JoinTarget>,
}

impl JoinClause {
    /// Appends a join target. Equality terms of `on` are bound under the
    /// `ON_<KIND>_<n>` namespace, where `n` is this join's ordinal, so two
    /// joins of the same kind never collide.
    ///
    /// A NATURAL join ignores `on`; the other kinds render an ON clause from
    /// its fragments.
    pub fn add(
        &mut self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: Option<&str>,
        on: On,
        params: &mut Params,
    ) {
        let ordinal = self.joins.len();
        let mut on_terms = Vec::new();
        if kind != JoinKind::Natural {
            on_terms.extend(on.raw);
            let namespace = format!("{}_{ordinal}", kind.namespace());
            for (column, value) in on.eq {
                let name = params.bind(&namespace, &column, value);
                on_terms.push(format!("{column} = :{name}"));
            }
        }
        self.joins.push(JoinTarget {
            kind,
            table: table.into(),
            alias: alias.map(str::to_string),
            on_terms,
        });
    }

    /// Returns `true` if no joins have been added.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Renders all join targets in order.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.joins.len());
        for join in &self.joins {
            let mut part = format!("{} {}", join.kind.sql_keyword(), join.table);
            if let Some(alias) = &join.alias {
                part.push_str(&format!(" AS {alias}"));
            }
            if !join.on_terms.is_empty() {
                part.push_str(&format!(" ON {}", join.on_terms.join(" AND ")));
            }
            parts.push(part);
        }
        parts.join(" ")
    }
}

// ── SET ────────────────────────────────────────────────────────────────

/// Accumulator for UPDATE assignments (also reused for the
/// `ON DUPLICATE KEY UPDATE` term list with its own namespace).
#[derive(Debug, Clone, Default)]
pub struct SetClause {
    terms: Vec<String>,
}

impl SetClause {
    /// Appends a raw assignment fragment.
    pub fn raw(&mut self, fragment: impl Into<String>) {
        self.terms.push(fragment.into());
    }

    /// Appends a `column = :<namespace>_column` assignment, binding the
    /// value.
    pub fn assign(&mut self, namespace: &str, column: &str, value: Value, params: &mut Params) {
        let name = params.bind(namespace, column, value);
        self.terms.push(format!("{column} = :{name}"));
    }

    /// Returns `true` if no assignments have been added.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Renders the comma-joined assignment list (no keyword).
    pub fn render(&self) -> String {
        self.terms.join(", ")
    }
}

// ── VALUES ─────────────────────────────────────────────────────────────

/// Accumulator for single-row INSERT columns and value expressions.
#[derive(Debug, Clone, Default)]
pub struct ValuesClause {
    fields: Vec<String>,
    values: Vec<String>,
}

impl ValuesClause {
    /// Appends a column with a raw value expression, taken verbatim.
    pub fn raw(&mut self, column: impl Into<String>, expression: impl Into<String>) {
        self.fields.push(column.into());
        self.values.push(expression.into());
    }

    /// Appends a column with a placeholder-bound value under the `VALUES`
    /// namespace.
    pub fn value(&mut self, column: &str, value: Value, params: &mut Params) {
        let name = params.bind("VALUES", column, value);
        self.fields.push(column.to_string());
        self.values.push(format!(":{name}"));
    }

    /// Returns `true` if no columns have been added.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Renders the comma-joined column list.
    pub fn render_fields(&self) -> String {
        self.fields.join(", ")
    }

    /// Renders the comma-joined value expression list.
    pub fn render_values(&self) -> String {
        self.values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_bind_namespaces() {
        let mut params = Params::new();
        let a = params.bind("WHERE", "age", Value::Int(10));
        let b = params.bind("SET", "age", Value::Int(20));
        assert_eq!(a, "WHERE_age");
        assert_eq!(b, "SET_age");
        assert_eq!(params.get("WHERE_age"), Some(&Value::Int(10)));
        assert_eq!(params.get("SET_age"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_params_bind_never_collides() {
        let mut params = Params::new();
        let a = params.bind("WHERE", "age", Value::Int(1));
        let b = params.bind("WHERE", "age", Value::Int(2));
        assert_ne!(a, b);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_params_bind_sanitizes_qualified_columns() {
        let mut params = Params::new();
        let name = params.bind("WHERE", "t.age", Value::Int(1));
        assert_eq!(name, "WHERE_t_age");
    }

    #[test]
    fn test_where_empty_renders_empty() {
        let clause = WhereClause::default();
        assert_eq!(clause.render(), "");
    }

    #[test]
    fn test_where_mixes_raw_and_eq() {
        let mut params = Params::new();
        let mut clause = WhereClause::default();
        clause.raw("aid < 10");
        clause.eq("author_uid", Value::Int(12), &mut params);
        assert_eq!(
            clause.render(),
            "WHERE aid < 10 AND author_uid = :WHERE_author_uid"
        );
        assert_eq!(params.get("WHERE_author_uid"), Some(&Value::Int(12)));
    }

    #[test]
    fn test_order_render_and_reverse() {
        let mut clause = OrderClause::default();
        clause.push("title");
        clause.push("age DESC");
        assert_eq!(clause.render(), "ORDER BY title, age DESC");
        clause.reverse();
        assert_eq!(clause.render(), "ORDER BY title DESC, age ASC");
        clause.reverse();
        assert_eq!(clause.render(), "ORDER BY title, age DESC");
    }

    #[test]
    fn test_order_empty_renders_empty() {
        assert_eq!(OrderClause::default().render(), "");
    }

    #[test]
    fn test_page_unset_renders_empty() {
        let page = PageClause::default();
        assert_eq!(page.render_limit(), "");
        assert_eq!(page.render_offset(), "");
    }

    #[test]
    fn test_pagination_computes_offset() {
        let mut page = PageClause::default();
        page.pagination(2, 25);
        assert_eq!(page.render_limit(), "LIMIT 25");
        assert_eq!(page.render_offset(), "OFFSET 50");
    }

    #[test]
    fn test_having_without_group_by_is_dropped() {
        let mut clause = GroupClause::default();
        clause.having_raw("count(1) > 2");
        assert_eq!(clause.render_group(), "");
        assert_eq!(clause.render_having(), "");
    }

    #[test]
    fn test_having_with_group_by() {
        let mut params = Params::new();
        let mut clause = GroupClause::default();
        clause.group_by("author_uid");
        clause.having_eq("author_uid", Value::Int(12), &mut params);
        assert_eq!(clause.render_group(), "GROUP BY author_uid");
        assert_eq!(
            clause.render_having(),
            "HAVING author_uid = :HAVING_author_uid"
        );
    }

    #[test]
    fn test_join_kinds_keywords() {
        assert_eq!(JoinKind::Natural.sql_keyword(), "NATURAL JOIN");
        assert_eq!(JoinKind::Inner.sql_keyword(), "INNER JOIN");
        assert_eq!(JoinKind::Left.sql_keyword(), "LEFT JOIN");
        assert_eq!(JoinKind::Right.sql_keyword(), "RIGHT JOIN");
    }

    #[test]
    fn test_natural_join_has_no_on() {
        let mut params = Params::new();
        let mut clause = JoinClause::default();
        clause.add(
            JoinKind::Natural,
            "blog_rating",
            None,
            On::from("ignored = 1"),
            &mut params,
        );
        assert_eq!(clause.render(), "NATURAL JOIN blog_rating");
        assert!(params.is_empty());
    }

    #[test]
    fn test_join_with_alias_and_on() {
        let mut params = Params::new();
        let mut clause = JoinClause::default();
        clause.add(
            JoinKind::Left,
            "blog_rating",
            Some("r"),
            On::from("a.aid = r.aid"),
            &mut params,
        );
        assert_eq!(
            clause.render(),
            "LEFT JOIN blog_rating AS r ON a.aid = r.aid"
        );
    }

    #[test]
    fn test_two_joins_of_same_kind_do_not_collide() {
        let mut params = Params::new();
        let mut clause = JoinClause::default();
        clause.add(
            JoinKind::Inner,
            "t1",
            None,
            On::new().eq("flag", 1_i64),
            &mut params,
        );
        clause.add(
            JoinKind::Inner,
            "t2",
            None,
            On::new().eq("flag", 2_i64),
            &mut params,
        );
        assert_eq!(params.get("ON_INNER_0_flag"), Some(&Value::Int(1)));
        assert_eq!(params.get("ON_INNER_1_flag"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_set_clause() {
        let mut params = Params::new();
        let mut clause = SetClause::default();
        clause.assign("SET", "age", Value::Int(18), &mut params);
        clause.raw("hits = hits + 1");
        assert_eq!(clause.render(), "age = :SET_age, hits = hits + 1");
    }

    #[test]
    fn test_values_clause() {
        let mut params = Params::new();
        let mut clause = ValuesClause::default();
        clause.value("username", Value::from("Rinka"), &mut params);
        clause.raw("created_at", "NOW()");
        assert_eq!(clause.render_fields(), "username, created_at");
        assert_eq!(clause.render_values(), ":VALUES_username, NOW()");
        assert_eq!(clause.len(), 2);
    }
}
