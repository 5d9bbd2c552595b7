//! Outbound mail handed from the actor to the external transport.

use std::time::Duration;

use flume::Sender;

use crate::common::{Id, Node};
use crate::{Error, Result};

/// An outbound network intent.
///
/// The core never touches the network itself. It posts mail on the queue
/// behind [Dht::outbound](crate::Dht::outbound); the attached transport must
/// answer each mail exactly once on its reply channel, or drop the channel
/// to signal failure.
#[derive(Debug, Clone)]
pub enum Mail {
    /// Check that a node is alive. The reply is the id the node answered
    /// with.
    Ping {
        node: Node,
        reply: Sender<Id>,
    },
    /// Ask the network for nodes close to a target.
    FindNode {
        target: Id,
        reply: Sender<Box<[Node]>>,
    },
}

/// The actor's sending side of the outbound mail queue.
#[derive(Debug, Clone)]
pub(crate) struct Gateway {
    sender: Sender<Mail>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(sender: Sender<Mail>, timeout: Duration) -> Self {
        Gateway { sender, timeout }
    }

    // === Public Methods ===

    /// Post a ping intent and block until the transport replies with the
    /// pinged node's id.
    ///
    /// Blocks the calling worker only. A closed reply channel or a timeout
    /// is [Error::PingFailed].
    pub fn ping(&self, node: &Node) -> Result<Id> {
        let (reply, response) = flume::bounded(1);

        self.sender
            .send(Mail::Ping {
                node: node.clone(),
                reply,
            })
            .map_err(|_| Error::PingFailed)?;

        response
            .recv_timeout(self.timeout)
            .map_err(|_| Error::PingFailed)
    }

    /// Post a find intent and block until the transport replies with nodes
    /// close to the target.
    ///
    /// A closed reply channel or a timeout is [Error::FindFailed].
    pub fn find_node(&self, target: &Id) -> Result<Box<[Node]>> {
        let (reply, response) = flume::bounded(1);

        self.sender
            .send(Mail::FindNode {
                target: *target,
                reply,
            })
            .map_err(|_| Error::FindFailed)?;

        response
            .recv_timeout(self.timeout)
            .map_err(|_| Error::FindFailed)
    }
}

#[cfg(test)]
mod test {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn ping_roundtrip() {
        let (sender, outbound) = flume::unbounded();
        let gateway = Gateway::new(sender, Duration::from_secs(1));

        let transport = thread::spawn(move || match outbound.recv() {
            Ok(Mail::Ping { node, reply }) => {
                let _ = reply.send(*node.id());
            }
            other => panic!("expected a ping, got {:?}", other),
        });

        let node = Node::random();
        let id = gateway.ping(&node).unwrap();

        assert_eq!(id, *node.id());
        transport.join().unwrap();
    }

    #[test]
    fn find_roundtrip() {
        let (sender, outbound) = flume::unbounded();
        let gateway = Gateway::new(sender, Duration::from_secs(1));

        let nodes: Box<[Node]> = vec![Node::random(), Node::random()].into();
        let expected = nodes.clone();

        let transport = thread::spawn(move || match outbound.recv() {
            Ok(Mail::FindNode { reply, .. }) => {
                let _ = reply.send(nodes);
            }
            other => panic!("expected a find, got {:?}", other),
        });

        let found = gateway.find_node(&Id::random()).unwrap();

        assert_eq!(found, expected);
        transport.join().unwrap();
    }

    #[test]
    fn dropped_reply_channel_is_a_failure() {
        let (sender, outbound) = flume::unbounded();
        let gateway = Gateway::new(sender, Duration::from_secs(1));

        let transport = thread::spawn(move || {
            // drop the mail, and its reply channel with it
            let _ = outbound.recv();
        });

        assert!(matches!(
            gateway.ping(&Node::random()),
            Err(Error::PingFailed)
        ));
        transport.join().unwrap();
    }

    #[test]
    fn silent_transport_is_a_timeout() {
        let (sender, _outbound) = flume::unbounded();
        let gateway = Gateway::new(sender, Duration::from_millis(10));

        assert!(matches!(
            gateway.find_node(&Id::random()),
            Err(Error::FindFailed)
        ));
    }
}
