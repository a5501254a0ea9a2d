use crate::Value;
use std::collections::{BTreeMap, btree_map};

/// Ordered column name to value association.
///
/// Iteration, and therefore [`Columns::keys_values`], is in ascending key
/// order, which makes generated statements deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Columns<V = Value>(BTreeMap<String, V>);

impl<V> Default for Columns<V> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<V> Columns<V> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, column: impl Into<String>, value: V) -> Option<V> {
        self.0.insert(column.into(), value)
    }
    pub fn get(&self, column: &str) -> Option<&V> {
        self.0.get(column)
    }
    pub fn get_mut(&mut self, column: &str) -> Option<&mut V> {
        self.0.get_mut(column)
    }
    pub fn remove(&mut self, column: &str) -> Option<V> {
        self.0.remove(column)
    }
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
    pub fn iter(&self) -> btree_map::Iter<'_, String, V> {
        self.0.iter()
    }
    /// Keys and values as parallel sequences, in key order.
    pub fn keys_values(self) -> (Vec<String>, Vec<V>) {
        self.0.into_iter().unzip()
    }
    /// Merge `other` into `self`, entries of `other` win.
    pub fn extend(&mut self, other: Columns<V>) {
        self.0.extend(other.0);
    }
}

impl Columns<Placeholder> {
    /// Replace each placeholder with the value it captured.
    pub fn deref_values(self) -> Columns<Value> {
        self.0
            .into_iter()
            .map(|(k, v)| (k, v.into_value()))
            .collect()
    }
}

impl<V> FromIterator<(String, V)> for Columns<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<V> IntoIterator for Columns<V> {
    type Item = (String, V);
    type IntoIter = btree_map::IntoIter<String, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a Columns<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = btree_map::Iter<'a, String, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Receives a column value that has no field to land in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholder(Option<Value>);

impl Placeholder {
    pub fn set(&mut self, value: Value) {
        self.0 = Some(value);
    }
    pub fn get(&self) -> Option<&Value> {
        self.0.as_ref()
    }
    pub fn into_value(self) -> Value {
        self.0.unwrap_or_default()
    }
}
