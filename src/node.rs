//! Dht node: identity, routing table, store and the four peer facing protocols.
//!
//! A [Node] is a cheap handle to shared state. Peers only ever reach each
//! other through these protocol methods, each node mutating its own routing
//! table and store behind its own lock. That lock is never held while calling
//! into another node, so cycles of contacts can not deadlock.

mod inflight;

use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, trace};

use crate::common::{Contact, Id, RoutingTable};
use crate::store::{Store, StoredValue};
use crate::{Config, Result};

use inflight::InflightLookups;

#[derive(Clone)]
/// Handle to a Dht node. Clones share the same node.
pub struct Node(Arc<NodeInner>);

pub(crate) struct NodeInner {
    id: Id,
    name: String,
    config: Config,
    state: Mutex<State>,
}

struct State {
    routing_table: RoutingTable,
    store: Store,
    /// Targets of node lookups running at this node.
    nodes_in_find: InflightLookups<Id>,
    /// Keys of value lookups running or cooling down at this node.
    values_in_find: InflightLookups<String>,
}

impl Node {
    /// Creates a node named `name` with the default [Config].
    pub fn new(name: &str) -> Node {
        Self::build(name, Config::default())
    }

    /// Creates a node named `name`, returns Err if the config is invalid.
    pub fn with_config(name: &str, config: Config) -> Result<Node> {
        config.validate()?;

        Ok(Self::build(name, config))
    }

    fn build(name: &str, config: Config) -> Node {
        let id = Id::from_name(name);

        let state = State {
            routing_table: RoutingTable::new(id, config.k, config.bucket_count),
            store: Store::new(),
            nodes_in_find: InflightLookups::new(),
            values_in_find: InflightLookups::new(),
        };

        debug!(%id, name, "Created node");

        Node(Arc::new(NodeInner {
            id,
            name: name.to_string(),
            config,
            state: Mutex::new(state),
        }))
    }

    pub(crate) fn from_inner(inner: Arc<NodeInner>) -> Node {
        Node(inner)
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    /// A non-owning [Contact] pointing at this node.
    pub fn contact(&self) -> Contact {
        Contact::new(self.0.id, Arc::downgrade(&self.0))
    }

    /// Index of the proximity bucket `id` falls into, relative to this node.
    pub fn bucket_index(&self, id: &Id) -> usize {
        self.state().routing_table.bucket_index(id)
    }

    /// Returns a snapshot of the routing table.
    pub fn routing_table(&self) -> RoutingTable {
        self.state().routing_table.clone()
    }

    /// Every contact known to this node.
    pub fn contacts(&self) -> Vec<Contact> {
        self.state().routing_table.nodes()
    }

    /// Up to `k` known contacts closest to `target`, closest first.
    pub fn closest(&self, target: &Id) -> Vec<Contact> {
        self.state().routing_table.closest(target)
    }

    /// The entry held in this node's own store for `key`, without any lookup.
    pub fn stored(&self, key: &str) -> Option<StoredValue> {
        self.state().store.get(key).cloned()
    }

    // === Public Methods ===

    /// Contacts `peer`, enriching both routing tables.
    ///
    /// The peer learns about this node and answers with its closest contacts
    /// to this node's id, all of which are added here along with the peer.
    pub fn ping(&self, peer: &Node) {
        let neighbours = peer.handle_ping(self.contact());
        let count = neighbours.len();

        let mut state = self.state();
        state.routing_table.add(peer.contact());
        for contact in neighbours {
            state.routing_table.add(contact);
        }

        debug!(id = %self.0.id, peer = %peer.id(), neighbours = count, "Pinged");
    }

    /// Asks `target` to store `value` under `key`, with this node as the origin.
    ///
    /// Returns whether `key` was new at `target`.
    pub fn store(&self, key: &str, value: &str, target: &Node) -> bool {
        target.handle_store(key, value, self.0.id)
    }

    /// Resolves `key` from the local store, or recursively through the
    /// closest known contacts to this node.
    ///
    /// Returns `None` if no reachable node holds the key, or if a lookup for the
    /// same key is running or cooling down here.
    pub fn find_value(&self, key: &str) -> Option<String> {
        let _lookup = self.begin_value_lookup(key)?;

        let local = self.state().store.find(key).map(String::from);
        if local.is_some() {
            debug!(id = %self.0.id, key, "Found value locally");
            return local;
        }

        let nearest = self.closest(&self.0.id);

        for contact in nearest {
            let Some(node) = contact.upgrade() else {
                trace!(id = %self.0.id, contact = %contact.id(), "Skipping dropped contact");
                continue;
            };

            trace!(id = %self.0.id, hop = %node.id(), key, "Forwarding value lookup");

            if let Some(value) = node.find_value(key) {
                return Some(value);
            }
        }

        debug!(id = %self.0.id, key, "Value not found");
        None
    }

    /// Looks for the node with id `target`, recursively through the closest
    /// known contacts to it.
    ///
    /// Returns the closest contacts of the first node that knows `target`,
    /// `target` included, or `None` if the search is exhausted or a lookup
    /// for the same target is already running here.
    pub fn find_node(&self, target: &Id) -> Option<Vec<Contact>> {
        let _lookup = self.begin_node_lookup(target)?;

        let nearest = self.closest(target);

        if nearest.iter().any(|contact| contact.id() == target) {
            debug!(id = %self.0.id, lookup = %target, "Found node");
            return Some(nearest);
        }

        for contact in &nearest {
            let Some(node) = contact.upgrade() else {
                trace!(id = %self.0.id, contact = %contact.id(), "Skipping dropped contact");
                continue;
            };

            trace!(id = %self.0.id, hop = %node.id(), lookup = %target, "Forwarding node lookup");

            if let Some(found) = node.find_node(target) {
                return Some(found);
            }
        }

        debug!(id = %self.0.id, lookup = %target, "Node not found");
        None
    }

    // === Private Methods ===

    fn state(&self) -> MutexGuard<'_, State> {
        self.0.state()
    }

    fn handle_ping(&self, from: Contact) -> Vec<Contact> {
        let target = *from.id();

        let mut state = self.state();
        state.routing_table.add(from);
        state.routing_table.closest(&target)
    }

    fn handle_store(&self, key: &str, value: &str, origin: Id) -> bool {
        let fresh = self.state().store.add(key, value, origin);

        debug!(id = %self.0.id, key, %origin, fresh, "Stored value");
        fresh
    }

    fn begin_node_lookup(&self, target: &Id) -> Option<NodeLookup<'_>> {
        if !self
            .state()
            .nodes_in_find
            .try_start(target, Instant::now())
        {
            trace!(id = %self.0.id, lookup = %target, "Node lookup already in find");
            return None;
        }

        Some(NodeLookup {
            node: &self.0,
            target: *target,
        })
    }

    fn begin_value_lookup(&self, key: &str) -> Option<ValueLookup<'_>> {
        let key = key.to_string();

        if !self
            .state()
            .values_in_find
            .try_start(&key, Instant::now())
        {
            trace!(id = %self.0.id, key, "Value lookup already in find");
            return None;
        }

        Some(ValueLookup {
            node: &self.0,
            key,
        })
    }
}

impl NodeInner {
    fn state(&self) -> MutexGuard<'_, State> {
        // Every mutation is a single call, a poisoned State is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a node lookup as running until dropped.
struct NodeLookup<'a> {
    node: &'a NodeInner,
    target: Id,
}

impl Drop for NodeLookup<'_> {
    fn drop(&mut self) {
        self.node.state().nodes_in_find.finish(&self.target);
    }
}

/// Marks a value lookup as running, then cooling down once dropped.
struct ValueLookup<'a> {
    node: &'a NodeInner,
    key: String,
}

impl Drop for ValueLookup<'_> {
    fn drop(&mut self) {
        // A cooldown past what Instant can hold keeps the key in find for good.
        if let Some(until) = Instant::now().checked_add(self.node.config.value_lookup_cooldown) {
            self.node.state().values_in_find.cool_down(&self.key, until);
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Node {}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .finish()
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.state();

        write!(
            f,
            "id: {}, rt: {{{}}}, hs: {{{}}}",
            self.0.id, state.routing_table, state.store
        )
    }
}
