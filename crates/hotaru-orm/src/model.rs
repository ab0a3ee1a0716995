//! The model trait, entity metadata, and persistence operations.
//!
//! A model maps one application type to one table. The type declares its
//! metadata as a static [`Descriptor`] — table name, primary keys, optional
//! auto-increment key, non-key fields — and exposes per-column access
//! through the [`Model`] capability set. Two representation styles satisfy
//! the same contract: map-backed types embedding a
//! [`FieldSet`](crate::fields::FieldSet), and struct-backed types with named
//! fields. Everything downstream — query builders, hydration, persistence —
//! depends only on the capability set, never on the representation.

use crate::query::{
    Conditional, DeleteQuery, InsertManyQuery, InsertQuery, Paged, QueryBase, SelectQuery,
    UpdateQuery,
};
use crate::session::Session;
use crate::value::{Row, Value};
use hotaru_core::Result;

/// Static metadata describing how an entity type maps to a table.
///
/// Invariants: the primary-key and field lists are disjoint and together
/// contain no duplicates; the table name is a valid unquoted SQL identifier
/// derived from the entity's name.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// The table name.
    pub table: &'static str,
    /// Primary-key column names, in order. Must be non-empty for the
    /// persistence operations to be meaningful.
    pub primary_keys: &'static [&'static str],
    /// The auto-increment column, if the table has one.
    pub auto_increment: Option<&'static str>,
    /// Non-key column names, in order.
    pub fields: &'static [&'static str],
}

impl Descriptor {
    /// Iterates over all declared columns: primary keys first, then fields.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.primary_keys
            .iter()
            .copied()
            .chain(self.fields.iter().copied())
    }

    /// Returns `true` if the column is declared as a primary key or field.
    pub fn declares(&self, column: &str) -> bool {
        self.columns().any(|c| c == column)
    }

    /// Checks the descriptor invariants: no column appears twice across the
    /// primary-key and field lists, and a declared auto-increment column is
    /// one of the declared columns.
    pub fn is_well_formed(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        for column in self.columns() {
            if !seen.insert(column) {
                return false;
            }
        }
        self.auto_increment.map_or(true, |ak| seen.contains(ak))
    }
}

/// The duplicate-key policy for INSERT statements.
///
/// The four policies are one discriminated choice consumed by
/// [`InsertQuery::on_conflict`] and the entity-level insert operations.
#[derive(Debug, Clone, PartialEq)]
pub enum OnConflict {
    /// Plain `INSERT`; a key conflict surfaces as a driver error.
    Fail,
    /// `INSERT IGNORE`; a conflicting row is silently skipped.
    Ignore,
    /// `REPLACE`; a conflicting row is deleted and re-inserted.
    Replace,
    /// `INSERT ... ON DUPLICATE KEY UPDATE` with the given assignment terms.
    Update(Vec<(String, Value)>),
}

impl OnConflict {
    /// The statement operator keyword this policy selects.
    pub const fn operator_keyword(&self) -> &'static str {
        match self {
            Self::Replace => "REPLACE",
            Self::Ignore => "INSERT IGNORE",
            Self::Fail | Self::Update(_) => "INSERT",
        }
    }
}

/// The capability set every entity type implements.
///
/// Types implement the four required methods; everything else — factories,
/// hydration, and the class-level query entry points — is provided on top of
/// them.
///
/// # Examples
///
/// A map-backed model delegates to an embedded
/// [`FieldSet`](crate::fields::FieldSet):
///
/// ```
/// use hotaru_orm::{Descriptor, FieldSet, Model, Result, Value};
///
/// #[derive(Default)]
/// struct BlogUser {
///     record: FieldSet,
/// }
///
/// impl Model for BlogUser {
///     fn descriptor() -> &'static Descriptor {
///         static DESCRIPTOR: Descriptor = Descriptor {
///             table: "blog_user",
///             primary_keys: &["uid"],
///             auto_increment: Some("uid"),
///             fields: &["username", "age"],
///         };
///         &DESCRIPTOR
///     }
///
///     fn value(&self, column: &str) -> Result<Value> {
///         self.record.checked_get(Self::descriptor(), column)
///     }
///
///     fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
///         self.record.checked_put(Self::descriptor(), column, value)
///     }
///
///     fn contains(&self, column: &str) -> bool {
///         self.record.contains(column)
///     }
/// }
///
/// let user = BlogUser::create(vec![("username", Value::from("Rinka"))]).unwrap();
/// assert_eq!(user.value("username").unwrap(), Value::from("Rinka"));
/// assert!(BlogUser::create(vec![("nickname", Value::Null)]).is_err());
/// ```
pub trait Model: Default {
    /// Returns the static metadata for this entity type.
    fn descriptor() -> &'static Descriptor;

    /// Reads a declared column's current value.
    ///
    /// # Errors
    ///
    /// `InvalidColumn` for an undeclared column.
    fn value(&self, column: &str) -> Result<Value>;

    /// Writes a declared column.
    ///
    /// # Errors
    ///
    /// `InvalidColumn` for an undeclared column.
    fn set_value(&mut self, column: &str, value: Value) -> Result<()>;

    /// Returns `true` if the column currently holds a value on this
    /// instance. Map-backed types report key presence (a sentinel empty
    /// string or zero counts); struct-backed types report `Option`
    /// presence for optional columns.
    fn contains(&self, column: &str) -> bool;

    // ── Factories ────────────────────────────────────────────────────

    /// Creates an instance, seeding the given column values.
    ///
    /// # Errors
    ///
    /// `InvalidColumn` if a seed names an undeclared column.
    fn create(seed: Vec<(&str, Value)>) -> Result<Self> {
        let mut model = Self::default();
        for (column, value) in seed {
            model.set_value(column, value)?;
        }
        Ok(model)
    }

    /// Hydrates an instance from a result row.
    ///
    /// Hydration never fails: columns the type does not declare are
    /// skipped, and missing columns leave the default value in place.
    fn from_row(row: &Row) -> Self {
        let mut model = Self::default();
        for (column, value) in row.iter() {
            let _ = model.set_value(column, value.clone());
        }
        model
    }

    // ── Class-level query entry points ───────────────────────────────

    /// Starts a SELECT against this entity's table.
    fn select<'a>() -> SelectQuery<'a, Self> {
        SelectQuery::new()
    }

    /// Starts a single-row INSERT against this entity's table.
    fn insert_query<'a>() -> InsertQuery<'a, Self> {
        InsertQuery::new()
    }

    /// Starts a batch INSERT against this entity's table.
    fn insert_many<'a>() -> InsertManyQuery<'a, Self> {
        InsertManyQuery::new()
    }

    /// Starts an UPDATE against this entity's table.
    fn update_query<'a>() -> UpdateQuery<'a, Self> {
        UpdateQuery::new()
    }

    /// Starts a DELETE against this entity's table.
    fn delete_query<'a>() -> DeleteQuery<'a, Self> {
        DeleteQuery::new()
    }

    /// Fetches every row as a hydrated instance.
    fn get(session: Option<&mut Session>) -> Result<Vec<Self>> {
        Self::select().via_opt(session).fetch()
    }

    /// Fetches at most one hydrated instance.
    fn get_one(session: Option<&mut Session>) -> Result<Option<Self>> {
        Self::select().limit(1).via_opt(session).one()
    }

    /// Counts the table's rows via a `count(1)` projection.
    fn count(session: Option<&mut Session>) -> Result<u64> {
        Self::select().via_opt(session).count()
    }

    /// Reports whether the table has any row.
    fn has(session: Option<&mut Session>) -> Result<bool> {
        Self::select().via_opt(session).has()
    }
}

/// Entity persistence operations, provided for every [`Model`].
///
/// Each operation is expressed purely through the capability set and the
/// query builders; no operation looks at the representation behind the
/// trait.
pub trait Persist: Model {
    /// Inserts this instance and returns the last-insert id.
    ///
    /// The persisted column set is every declared column the instance
    /// currently contains. If an auto-increment column is declared and
    /// currently absent, the id the database assigned is written back onto
    /// the instance.
    fn insert(&mut self, session: Option<&mut Session>) -> Result<u64> {
        self.insert_or(OnConflict::Fail, session)
    }

    /// Inserts with an explicit duplicate-key policy.
    fn insert_or(&mut self, policy: OnConflict, session: Option<&mut Session>) -> Result<u64> {
        let descriptor = Self::descriptor();
        let mut query = Self::insert_query().on_conflict(policy);
        for column in descriptor.columns() {
            if self.contains(column) {
                query = query.value(column, self.value(column)?);
            }
        }
        let id = query.via_opt(session).go_for_id()?;
        if let Some(ak) = descriptor.auto_increment {
            if !self.contains(ak) {
                self.set_value(ak, Value::Int(id as i64))?;
            }
        }
        Ok(id)
    }

    /// Inserts, updating the given terms when the key already exists.
    fn insert_update(
        &mut self,
        terms: Vec<(String, Value)>,
        session: Option<&mut Session>,
    ) -> Result<u64> {
        self.insert_or(OnConflict::Update(terms), session)
    }

    /// Updates this instance's row: SET every field, WHERE every present
    /// primary-key value. Primary keys are never part of the SET clause —
    /// in-place key mutation is unsupported.
    fn save(&self, session: Option<&mut Session>) -> Result<u64> {
        let descriptor = Self::descriptor();
        let mut query = Self::update_query();
        for field in descriptor.fields.iter().copied() {
            query = query.set(field, self.value(field)?);
        }
        for pk in descriptor.primary_keys.iter().copied() {
            if self.contains(pk) {
                query = query.filter(pk, self.value(pk)?);
            }
        }
        query.via_opt(session).go()
    }

    /// Deletes this instance's row by its current primary-key values.
    ///
    /// With no primary-key values set, the WHERE clause is empty and the
    /// statement deletes every row in the table. Known sharp edge; not
    /// guarded.
    fn delete(&self, session: Option<&mut Session>) -> Result<u64> {
        let descriptor = Self::descriptor();
        let mut query = Self::delete_query();
        for pk in descriptor.primary_keys.iter().copied() {
            if self.contains(pk) {
                query = query.filter(pk, self.value(pk)?);
            }
        }
        query.via_opt(session).go()
    }
}

impl<M: Model> Persist for M {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldSet;
    use hotaru_core::Error;

    // Map-backed variant.
    #[derive(Debug, Default)]
    struct BlogUser {
        record: FieldSet,
    }

    impl Model for BlogUser {
        fn descriptor() -> &'static Descriptor {
            static DESCRIPTOR: Descriptor = Descriptor {
                table: "blog_user",
                primary_keys: &["uid"],
                auto_increment: Some("uid"),
                fields: &["username", "age"],
            };
            &DESCRIPTOR
        }

        fn value(&self, column: &str) -> Result<Value> {
            self.record.checked_get(Self::descriptor(), column)
        }

        fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
            self.record.checked_put(Self::descriptor(), column, value)
        }

        fn contains(&self, column: &str) -> bool {
            self.record.contains(column)
        }
    }

    // Struct-backed variant: optional columns are absent while `None`.
    #[derive(Default)]
    struct BlogArticle {
        aid: Option<i64>,
        author_uid: i64,
        title: String,
    }

    impl Model for BlogArticle {
        fn descriptor() -> &'static Descriptor {
            static DESCRIPTOR: Descriptor = Descriptor {
                table: "blog_article",
                primary_keys: &["aid"],
                auto_increment: Some("aid"),
                fields: &["author_uid", "title"],
            };
            &DESCRIPTOR
        }

        fn value(&self, column: &str) -> Result<Value> {
            match column {
                "aid" => Ok(Value::from(self.aid)),
                "author_uid" => Ok(Value::from(self.author_uid)),
                "title" => Ok(Value::from(self.title.as_str())),
                other => Err(Error::invalid_column(Self::descriptor().table, other)),
            }
        }

        fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
            match column {
                "aid" => self.aid = value.as_int(),
                "author_uid" => self.author_uid = value.as_int().unwrap_or_default(),
                "title" => {
                    if let Value::String(s) = value {
                        self.title = s;
                    }
                }
                other => return Err(Error::invalid_column(Self::descriptor().table, other)),
            }
            Ok(())
        }

        fn contains(&self, column: &str) -> bool {
            match column {
                "aid" => self.aid.is_some(),
                _ => Self::descriptor().declares(column),
            }
        }
    }

    #[test]
    fn test_descriptor_columns_are_pk_union_fields() {
        let descriptor = BlogUser::descriptor();
        let columns: Vec<&str> = descriptor.columns().collect();
        assert_eq!(columns, vec!["uid", "username", "age"]);
        assert!(descriptor.is_well_formed());
    }

    #[test]
    fn test_overlapping_descriptor_is_malformed() {
        static BAD: Descriptor = Descriptor {
            table: "bad",
            primary_keys: &["id"],
            auto_increment: None,
            fields: &["id", "name"],
        };
        assert!(!BAD.is_well_formed());
    }

    #[test]
    fn test_auto_increment_must_be_declared() {
        static BAD: Descriptor = Descriptor {
            table: "bad",
            primary_keys: &["id"],
            auto_increment: Some("other"),
            fields: &["name"],
        };
        assert!(!BAD.is_well_formed());
    }

    #[test]
    fn test_create_seeds_values() {
        let user = BlogUser::create(vec![
            ("username", Value::from("Rinka")),
            ("age", Value::Int(17)),
        ])
        .unwrap();
        assert_eq!(user.value("username").unwrap(), Value::from("Rinka"));
        assert!(user.contains("age"));
        assert!(!user.contains("uid"));
    }

    #[test]
    fn test_create_rejects_unknown_column() {
        let err = BlogUser::create(vec![("nickname", Value::Null)]).unwrap_err();
        assert!(matches!(err, Error::InvalidColumn { .. }));
    }

    #[test]
    fn test_from_row_skips_unknown_columns() {
        let row = Row::new(
            vec!["uid".into(), "username".into(), "stray".into()],
            vec![Value::Int(1), Value::from("Rinka"), Value::Int(9)],
        );
        let user = BlogUser::from_row(&row);
        assert_eq!(user.value("uid").unwrap(), Value::Int(1));
        assert_eq!(user.value("username").unwrap(), Value::from("Rinka"));
        assert!(!user.contains("stray"));
    }

    #[test]
    fn test_struct_variant_absence_tracking() {
        let mut article = BlogArticle::default();
        assert!(!article.contains("aid"));
        assert!(article.contains("title"));
        article.set_value("aid", Value::Int(5)).unwrap();
        assert!(article.contains("aid"));
        assert_eq!(article.value("aid").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_struct_variant_rejects_unknown_column() {
        let article = BlogArticle::default();
        assert!(article.value("missing").is_err());
    }

    #[test]
    fn test_conflict_policy_keywords() {
        assert_eq!(OnConflict::Fail.operator_keyword(), "INSERT");
        assert_eq!(OnConflict::Ignore.operator_keyword(), "INSERT IGNORE");
        assert_eq!(OnConflict::Replace.operator_keyword(), "REPLACE");
        assert_eq!(OnConflict::Update(vec![]).operator_keyword(), "INSERT");
    }
}
