//! Struct and implementation of the Contact entry in the Kademlia routing table
use std::fmt::{self, Debug, Formatter};
use std::sync::Weak;

use crate::common::Id;
use crate::node::{Node, NodeInner};

#[derive(Clone)]
/// Contact entry in Kademlia routing table.
///
/// A contact is a non-owning reference to a peer [Node]: holding one never keeps
/// the peer alive, and it gives no access to the peer's table or store other
/// than through the peer's own protocol methods.
pub struct Contact {
    id: Id,
    node: Weak<NodeInner>,
}

impl Contact {
    pub(crate) fn new(id: Id, node: Weak<NodeInner>) -> Contact {
        Contact { id, node }
    }

    /// Creates a contact that is not backed by any live [Node].
    ///
    /// Useful for transport layers that know a peer's [Id] before they can
    /// resolve it, and for tests. Lookups skip such contacts as unreachable.
    pub fn detached(id: Id) -> Contact {
        Contact {
            id,
            node: Weak::new(),
        }
    }

    #[cfg(test)]
    pub fn random() -> Contact {
        Contact::detached(Id::random())
    }

    /// Contact with an Id whose first byte is `i`, the rest being zeros.
    #[cfg(test)]
    pub fn unique(i: usize) -> Contact {
        let mut bytes = [0_u8; crate::common::ID_SIZE];
        bytes[0] = i as u8;
        bytes[1] = (i >> 8) as u8;

        Contact::detached(Id::from(bytes))
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns a handle to the peer, or `None` if it no longer exists.
    pub fn upgrade(&self) -> Option<Node> {
        self.node.upgrade().map(Node::from_inner)
    }

    pub fn is_reachable(&self) -> bool {
        self.node.strong_count() > 0
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contact {}

impl Debug for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contact")
            .field("id", &self.id)
            .field("reachable", &self.is_reachable())
            .finish()
    }
}
