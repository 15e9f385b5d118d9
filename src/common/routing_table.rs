//! Bucketed Kademlia routing table

use std::fmt::{self, Display, Formatter};
use std::slice::Iter;

use crate::common::{Contact, Id};

/// K = the default maximum size of a k-bucket.
pub const DEFAULT_K: usize = 4;

#[derive(Debug, Clone)]
/// Kademlia routing table, owned by exactly one node.
///
/// Contacts are spread over proximity buckets indexed by [Id::bucket_index]
/// relative to the owner. Buckets are only allocated on first insertion.
pub struct RoutingTable {
    id: Id,
    k: usize,
    buckets: Vec<Option<KBucket>>,
    /// Running count of insertions, informational only.
    insertions: usize,
}

impl RoutingTable {
    /// Create a new [RoutingTable] owned by `id`, with `bucket_count` buckets of up
    /// to `k` contacts each. Both are raised to at least 1.
    pub fn new(id: Id, k: usize, bucket_count: usize) -> Self {
        RoutingTable {
            id,
            k: k.max(1),
            buckets: vec![None; bucket_count.max(1)],
            insertions: 0,
        }
    }

    // === Getters ===

    /// Returns the [Id] of the owner, where the distance is measured from.
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of insertions accepted since creation, including re-insertions.
    pub fn insertions(&self) -> usize {
        self.insertions
    }

    /// Returns the bucket at `index`, if it was ever created.
    pub fn bucket(&self, index: usize) -> Option<&KBucket> {
        self.buckets.get(index).and_then(Option::as_ref)
    }

    // === Public Methods ===

    /// Index of the bucket that `id` falls into, relative to the owner.
    ///
    /// Indices past the last bucket are clamped into it.
    pub fn bucket_index(&self, id: &Id) -> usize {
        self.id.bucket_index(id).min(self.buckets.len() - 1)
    }

    /// Adds a contact to its bucket. Returns `false` only if the contact is the owner.
    pub fn add(&mut self, contact: Contact) -> bool {
        if contact.id() == &self.id {
            // Do not add self to the routing_table
            return false;
        }

        let index = self.bucket_index(contact.id());
        let k = self.k;

        self.buckets[index]
            .get_or_insert_with(|| KBucket::new(k))
            .add(contact);
        self.insertions += 1;

        true
    }

    pub fn get(&self, id: &Id) -> Option<&Contact> {
        self.bucket(self.bucket_index(id))?.get(id)
    }

    /// Approximate `k` nearest contacts to `target`, sorted by ascending distance.
    ///
    /// Starts from the target's own bucket, then walks toward bucket 0, then
    /// toward the last bucket, stopping as soon as `k` candidates are gathered.
    /// Candidates in buckets that were not reached are never considered.
    pub fn closest(&self, target: &Id) -> Vec<Contact> {
        let index = self.bucket_index(target);
        let mut closest: Vec<Contact> = Vec::with_capacity(self.k * 2);

        if let Some(bucket) = self.bucket(index) {
            closest.extend(bucket.iter().cloned());
        }

        if closest.len() < self.k {
            for current in (0..index).rev() {
                if let Some(bucket) = self.bucket(current) {
                    closest.extend(bucket.iter().cloned());
                }
                if closest.len() >= self.k {
                    break;
                }
            }
        }

        if closest.len() < self.k {
            for current in index + 1..self.buckets.len() {
                if let Some(bucket) = self.bucket(current) {
                    closest.extend(bucket.iter().cloned());
                }
                if closest.len() >= self.k {
                    break;
                }
            }
        }

        closest.sort_by_key(|contact| contact.id().xor(target));
        closest.truncate(self.k);

        closest
    }

    /// Returns every contact, bucket by bucket, most recent first within a bucket.
    pub fn nodes(&self) -> Vec<Contact> {
        self.buckets
            .iter()
            .flatten()
            .flat_map(|bucket| bucket.iter().cloned())
            .collect()
    }

    /// Returns `true` if this routing table is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().flatten().all(KBucket::is_empty)
    }

    /// Return the number of contacts in this routing table.
    pub fn size(&self) -> usize {
        self.buckets.iter().flatten().map(KBucket::len).sum()
    }

    #[cfg(test)]
    fn contains(&self, id: &Id) -> bool {
        self.get(id).is_some()
    }
}

impl Display for RoutingTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, bucket) in self.buckets.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match bucket {
                Some(bucket) => write!(f, "{}", bucket)?,
                None => write!(f, "nil")?,
            }
        }

        Ok(())
    }
}

/// Kbuckets keep the most recently seen contacts of one proximity shell,
/// dropping the least recently seen one once full.
#[derive(Debug, Clone)]
pub struct KBucket {
    k: usize,
    /// Contacts in the k-bucket, sorted by the most recently seen.
    nodes: Vec<Contact>,
}

impl KBucket {
    /// A bucket of up to `k` contacts, `k` being raised to at least 1.
    pub fn new(k: usize) -> Self {
        let k = k.max(1);

        KBucket {
            k,
            nodes: Vec::with_capacity(k),
        }
    }

    // === Public Methods ===

    /// Inserts `incoming` at the front. A contact with the same [Id] is moved
    /// to the front instead, otherwise a full bucket evicts its last contact.
    pub fn add(&mut self, incoming: Contact) {
        if let Some(index) = self.iter().position(|n| n.id() == incoming.id()) {
            self.nodes.remove(index);
        } else if self.nodes.len() >= self.k {
            self.nodes.pop();
        }

        self.nodes.insert(0, incoming);
    }

    pub fn get(&self, id: &Id) -> Option<&Contact> {
        self.iter().find(|n| n.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> Iter<'_, Contact> {
        self.nodes.iter()
    }

    /// Contacts most recently seen first.
    pub fn nodes(&self) -> &[Contact] {
        &self.nodes
    }
}

impl Display for KBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", node.id())?;
        }
        write!(f, "}}")
    }
}
