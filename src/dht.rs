//! Dht node handle.

use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender};

use crate::actor::{Actor, ActorMessage};
use crate::common::{Id, Node};
use crate::config::Config;
use crate::gateway::Mail;
use crate::{Error, Result};

/// A handle to a routing actor.
///
/// All methods are thread safe and clones share the same actor. The actor
/// stops once [Dht::shutdown] is called or every handle is dropped.
#[derive(Debug)]
pub struct Dht {
    handle: Option<JoinHandle<()>>,
    sender: Sender<ActorMessage>,
    outbound: Receiver<Mail>,
    local: Node,
    request_timeout: Duration,
}

impl Clone for Dht {
    fn clone(&self) -> Self {
        Dht {
            handle: None,
            sender: self.sender.clone(),
            outbound: self.outbound.clone(),
            local: self.local.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl Dht {
    /// Create a new Dht node and spawn its actor thread.
    pub fn new(config: Config) -> Dht {
        let (sender, receiver) = flume::unbounded();
        let (mail_sender, mail_receiver) = flume::unbounded();

        let local = Node::from_parts(config.id, config.local_ip, config.port);
        let request_timeout = config.request_timeout;

        let actor = Actor::new(config, receiver, mail_sender);
        let handle = thread::spawn(move || actor.run());

        Dht {
            handle: Some(handle),
            sender,
            outbound: mail_receiver,
            local,
            request_timeout,
        }
    }

    // === Getters ===

    /// Returns the local [Node] distances are measured from.
    pub fn local(&self) -> &Node {
        &self.local
    }

    /// Returns the consuming end of the outbound mail queue.
    ///
    /// The attached transport must answer every [Mail] exactly once on its
    /// reply channel, or drop the channel to signal failure. Without an
    /// attached transport every outbound intent times out and is treated as
    /// failed.
    pub fn outbound(&self) -> Receiver<Mail> {
        self.outbound.clone()
    }

    // === Public Methods ===

    /// Track a node in the routing table. Fire and forget.
    pub fn add_node(&self, node: Node) {
        let _ = self.sender.send(ActorMessage::AddNode(node));
    }

    /// Drop a node from the routing table. Fire and forget.
    pub fn remove_node(&self, node: Node) {
        let _ = self.sender.send(ActorMessage::RemoveNode(node));
    }

    /// Returns up to alpha nodes closest to the target.
    ///
    /// A target equal to the local id returns an empty list. The list may be
    /// shorter than alpha when the table tracks fewer qualifying nodes.
    pub fn find(&self, target: Id) -> Result<Box<[Node]>> {
        let (sender, receiver) = flume::bounded(1);

        self.sender
            .send(ActorMessage::Find(target, sender))
            .map_err(|_| Error::RequestFailed)?;

        receiver
            .recv_timeout(self.request_timeout)
            .map_err(|_| Error::RequestFailed)
    }

    /// Returns the node with this exact id.
    ///
    /// The local id returns the local node. An id tracked in no bucket is
    /// [Error::NodeNotFound].
    pub fn find_one(&self, target: Id) -> Result<Node> {
        let (sender, receiver) = flume::bounded(1);

        self.sender
            .send(ActorMessage::FindOne(target, sender))
            .map_err(|_| Error::RequestFailed)?;

        match receiver.recv_timeout(self.request_timeout) {
            Ok(Some(node)) => Ok(node),
            Ok(None) => Err(Error::NodeNotFound),
            Err(_) => Err(Error::RequestFailed),
        }
    }

    /// Store a value in the local store, overwriting any previous value.
    /// Fire and forget.
    pub fn store<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let _ = self
            .sender
            .send(ActorMessage::Store(key.into(), value.into()));
    }

    /// Returns the value stored under a key, if any.
    pub fn get<K: Into<String>>(&self, key: K) -> Result<Option<String>> {
        let (sender, receiver) = flume::bounded(1);

        self.sender
            .send(ActorMessage::Get(key.into(), sender))
            .map_err(|_| Error::RequestFailed)?;

        receiver
            .recv_timeout(self.request_timeout)
            .map_err(|_| Error::RequestFailed)
    }

    /// Ask the transport for neighbors of the local id to repopulate the
    /// routing table. Fire and forget.
    pub fn refresh(&self) {
        let _ = self.sender.send(ActorMessage::Refresh);
    }

    /// Returns a snapshot of this node's information.
    pub fn info(&self) -> Result<Info> {
        let (sender, receiver) = flume::bounded(1);

        self.sender
            .send(ActorMessage::Info(sender))
            .map_err(|_| Error::RequestFailed)?;

        receiver
            .recv_timeout(self.request_timeout)
            .map_err(|_| Error::RequestFailed)
    }

    /// Ask the actor to stop, then wait for its thread to finish.
    pub fn shutdown(&mut self) {
        let _ = self.sender.send(ActorMessage::Shutdown);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Information about a running [Dht] node.
#[derive(Debug, Clone)]
pub struct Info {
    id: Id,
    local_addr: SocketAddr,
    nodes: usize,
    stored_keys: usize,
    seeds: Vec<String>,
}

impl Info {
    pub(crate) fn new(
        id: Id,
        local_addr: SocketAddr,
        nodes: usize,
        stored_keys: usize,
        seeds: Vec<String>,
    ) -> Self {
        Info {
            id,
            local_addr,
            nodes,
            stored_keys,
            seeds,
        }
    }

    /// This node's [Id]
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The address this node advertises.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of nodes currently tracked in the routing table.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Number of entries in the local store.
    pub fn stored_keys(&self) -> usize {
        self.stored_keys
    }

    /// The configured seed addresses, stored verbatim.
    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }
}
