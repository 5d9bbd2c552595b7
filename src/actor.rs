//! Actor owning the routing table and local store.

use std::time::Instant;

use flume::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info};

use crate::common::{AddOutcome, Id, Node, RoutingTable, Storage};
use crate::config::Config;
use crate::dht::Info;
use crate::gateway::{Gateway, Mail};

/// A note on the actor's mailbox. Request/response kinds carry their own
/// one-shot reply channel; dropping the sender without replying signals
/// failure to the blocked caller.
#[derive(Debug)]
pub(crate) enum ActorMessage {
    AddNode(Node),
    RemoveNode(Node),
    Find(Id, Sender<Box<[Node]>>),
    FindOne(Id, Sender<Option<Node>>),
    Store(String, String),
    Get(String, Sender<Option<String>>),
    Info(Sender<Info>),
    Refresh,
    Shutdown,
}

/// The single worker with exclusive write access to the routing table and
/// the local store.
///
/// All mutation is confined to this worker, so no locks are involved
/// anywhere; callers interact through the mailbox only and mutations are
/// applied in arrival order.
pub(crate) struct Actor {
    config: Config,
    local: Node,
    routing_table: RoutingTable,
    store: Storage,
    receiver: Receiver<ActorMessage>,
    gateway: Gateway,
}

impl Actor {
    pub fn new(config: Config, receiver: Receiver<ActorMessage>, outbound: Sender<Mail>) -> Self {
        let local = Node::from_parts(config.id, config.local_ip, config.port);
        let routing_table = RoutingTable::new(config.id).with_bucket_size(config.bucket_size);
        let gateway = Gateway::new(outbound, config.request_timeout);

        info!(id = %config.id, address = %local.address(), "Starting routing actor");

        Actor {
            config,
            local,
            routing_table,
            store: Storage::new(),
            receiver,
            gateway,
        }
    }

    /// Run until shutdown is requested or every [Dht](crate::Dht) handle is
    /// dropped.
    ///
    /// Each iteration handles exactly one event: a maintenance tick, or one
    /// mailbox message dispatched by kind.
    pub fn run(mut self) {
        let mut next_tick = Instant::now() + self.config.tick_interval;

        loop {
            match self.receiver.recv_deadline(next_tick) {
                Ok(message) => {
                    if !self.handle_message(message) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    next_tick = Instant::now() + self.config.tick_interval;
                    self.tick();
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!("Routing actor stopped");
    }

    // === Private Methods ===

    /// Dispatch one mailbox message. Returns `false` when the actor should
    /// stop.
    fn handle_message(&mut self, message: ActorMessage) -> bool {
        match message {
            ActorMessage::AddNode(node) => self.add(node),
            ActorMessage::RemoveNode(node) => self.routing_table.remove(node.id()),
            ActorMessage::Find(target, sender) => {
                let closest = self.routing_table.closest(&target, self.config.alpha);

                let _ = sender.send(closest.into_boxed_slice());
            }
            ActorMessage::FindOne(target, sender) => {
                let found = if target == *self.local.id() {
                    Some(self.local.clone())
                } else {
                    self.routing_table.find_exact(&target)
                };

                let _ = sender.send(found);
            }
            ActorMessage::Store(key, value) => self.store.put(key, value),
            ActorMessage::Get(key, sender) => {
                let _ = sender.send(self.store.get(&key).cloned());
            }
            ActorMessage::Info(sender) => {
                let _ = sender.send(self.info());
            }
            ActorMessage::Refresh => self.refresh(),
            ActorMessage::Shutdown => return false,
        }

        true
    }

    /// Track a node, resolving a full bucket with a liveness probe of its
    /// least recently seen entry: a responsive node is kept and the incoming
    /// one discarded, an unresponsive one is evicted.
    fn add(&mut self, node: Node) {
        if node.id() == self.local.id() {
            // identity nodes never route
            return;
        }

        if let AddOutcome::Full(least_recently_seen) = self.routing_table.add(node.clone()) {
            match self.gateway.ping(&least_recently_seen) {
                Ok(id) if id == *least_recently_seen.id() => {
                    self.routing_table.touch(least_recently_seen.id());

                    debug!(
                        kept = %least_recently_seen.id(),
                        discarded = %node.id(),
                        "Bucket full, least recently seen node is alive"
                    );
                }
                _ => {
                    debug!(
                        evicted = %least_recently_seen.id(),
                        added = %node.id(),
                        "Bucket full, evicting unresponsive node"
                    );

                    self.routing_table.replace(least_recently_seen.id(), node);
                }
            }
        }
    }

    /// Ask the transport for neighbors of the local id and track the answers.
    fn refresh(&mut self) {
        match self.gateway.find_node(self.local.id()) {
            Ok(nodes) => {
                for node in nodes.iter() {
                    self.add(node.clone());
                }

                if self.routing_table.is_empty() {
                    error!("Could not populate the routing table");
                } else {
                    debug!(size = self.routing_table.size(), "Refreshed the routing table");
                }
            }
            Err(error) => debug!(?error, "Refresh failed"),
        }
    }

    /// Maintenance tick. Only an observability report in this core; richer
    /// refresh behavior arrives as [ActorMessage::Refresh] from outside.
    fn tick(&self) {
        debug!(
            nodes = self.routing_table.size(),
            buckets = self.routing_table.bucket_count(),
            stored = self.store.len(),
            "Routing table status"
        );
    }

    fn info(&self) -> Info {
        Info::new(
            *self.local.id(),
            self.local.address(),
            self.routing_table.size(),
            self.store.len(),
            self.config.seeds.clone(),
        )
    }
}
