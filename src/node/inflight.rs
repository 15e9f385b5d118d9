use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

#[derive(Debug)]
/// Lookups currently marked as "in find" at a node, keyed by target value.
///
/// An entry is either running (no deadline) or cooling down until its
/// deadline passes. Expired entries are dropped lazily on the next
/// [InflightLookups::try_start].
pub struct InflightLookups<K> {
    entries: HashMap<K, Option<Instant>>,
}

impl<K: Eq + Hash + Clone> InflightLookups<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Marks `key` as running. Returns `false` if it is already running or
    /// still cooling down.
    pub fn try_start(&mut self, key: &K, now: Instant) -> bool {
        self.cleanup(now);

        if self.entries.contains_key(key) {
            return false;
        }

        self.entries.insert(key.clone(), None);
        true
    }

    /// Releases `key` immediately.
    pub fn finish(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Keeps `key` marked until `until`, then releases it.
    pub fn cool_down(&mut self, key: &K, until: Instant) {
        if let Some(deadline) = self.entries.get_mut(key) {
            *deadline = Some(until);
        }
    }

    #[cfg(test)]
    pub fn contains(&self, key: &K, now: Instant) -> bool {
        match self.entries.get(key) {
            Some(None) => true,
            Some(Some(deadline)) => *deadline > now,
            None => false,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops every cooled down entry whose deadline passed.
    fn cleanup(&mut self, now: Instant) {
        self.entries.retain(|_, deadline| match deadline {
            Some(deadline) => *deadline > now,
            None => true,
        });
    }
}
