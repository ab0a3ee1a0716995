//! Map-backed column storage for record-style models.
//!
//! A model type that does not want named struct fields embeds a [`FieldSet`]
//! and delegates its [`Model`](crate::model::Model) capability methods to the
//! checked accessors here. Presence in the map is what
//! [`contains`](FieldSet::contains) reports — a stored empty string or zero
//! still counts as present.

use std::collections::HashMap;

use crate::model::Descriptor;
use crate::value::Value;
use hotaru_core::{Error, Result};

/// A column → value map with descriptor-checked access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    values: HashMap<String, Value>,
}

impl FieldSet {
    /// Creates an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value for a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Stores a value without checking it against a descriptor.
    pub fn put(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    /// Removes a column, returning its previous value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(column)
    }

    /// Returns `true` if the column is present in the map.
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Number of stored columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over stored `(column, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reads a declared column, yielding `Null` when it is declared but not
    /// stored.
    ///
    /// # Errors
    ///
    /// `InvalidColumn` when the descriptor does not declare the column.
    pub fn checked_get(&self, descriptor: &Descriptor, column: &str) -> Result<Value> {
        if !descriptor.declares(column) {
            return Err(Error::invalid_column(descriptor.table, column));
        }
        Ok(self.get(column).cloned().unwrap_or(Value::Null))
    }

    /// Stores a declared column.
    ///
    /// # Errors
    ///
    /// `InvalidColumn` when the descriptor does not declare the column.
    pub fn checked_put(&mut self, descriptor: &Descriptor, column: &str, value: Value) -> Result<()> {
        if !descriptor.declares(column) {
            return Err(Error::invalid_column(descriptor.table, column));
        }
        self.put(column, value);
        Ok(())
    }
}
