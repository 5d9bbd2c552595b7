//! Struct and implementation of the Node entry in the Kademlia routing table
use std::net::{IpAddr, SocketAddr};

use crate::common::Id;

#[derive(Debug, Clone, PartialEq)]
/// Node entry in Kademlia routing table
pub struct Node {
    id: Id,
    address: SocketAddr,
}

impl Node {
    /// Creates a new Node from an id and socket address.
    pub fn new(id: Id, address: SocketAddr) -> Node {
        Node { id, address }
    }

    /// Creates a new Node from its id and the ip/port pair it advertises.
    pub fn from_parts(id: Id, ip: IpAddr, port: u16) -> Node {
        Node {
            id,
            address: SocketAddr::new(ip, port),
        }
    }

    /// Create a node with a random [Id] on a loopback address, for tests and
    /// demos.
    pub fn random() -> Node {
        Node {
            id: Id::random(),
            address: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }

    // === Getters ===

    /// Returns the id of this node.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns the address this node advertises.
    pub fn address(&self) -> SocketAddr {
        self.address
    }
}
