//! Local key/value store of a node.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::common::Id;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A value held in a [Store], with the [Id] of whoever asked to store it.
pub struct StoredValue {
    value: String,
    origin: Id,
}

impl StoredValue {
    pub fn new(value: String, origin: Id) -> Self {
        Self { value, origin }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn origin(&self) -> &Id {
        &self.origin
    }
}

impl Display for StoredValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "v: {}, o: {}", self.value, self.origin)
    }
}

#[derive(Debug, Clone, Default)]
/// Insert-or-update map from string keys to [StoredValue]s. Entries never expire.
pub struct Store {
    values: HashMap<String, StoredValue>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous entry entirely.
    ///
    /// Returns `true` if `key` was absent before this call.
    pub fn add(&mut self, key: &str, value: &str, origin: Id) -> bool {
        self.values
            .insert(key.to_string(), StoredValue::new(value.to_string(), origin))
            .is_none()
    }

    pub fn find(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(StoredValue::value)
    }

    pub fn get(&self, key: &str) -> Option<&StoredValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Display for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();

        for (i, key) in keys.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: [{}]", key, self.values[key])?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let mut store = Store::new();
        let origin = Id::random();

        assert!(store.is_empty());
        assert!(store.add("k1", "v1", origin));
        assert_eq!(store.find("k1"), Some("v1"));
        assert_eq!(store.get("k1").map(StoredValue::origin), Some(&origin));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn overwrite_replaces_value_and_origin() {
        let mut store = Store::new();
        let first = Id::random();
        let second = Id::random();

        assert!(store.add("k1", "v1", first));
        assert!(!store.add("k1", "v2", second));

        assert_eq!(
            store.get("k1"),
            Some(&StoredValue::new("v2".to_string(), second))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_key() {
        let store = Store::new();

        assert_eq!(store.find("nope"), None);
        assert_eq!(store.to_string(), "");
    }

    #[test]
    fn display() {
        let mut store = Store::new();
        let origin = Id::from([0xab_u8; 20]);

        store.add("b", "2", origin);
        store.add("a", "1", origin);

        assert_eq!(
            store.to_string(),
            format!("a: [v: 1, o: {origin}], b: [v: 2, o: {origin}]")
        );
    }
}
