//! Run a routing node with a toy in-process transport attached.
//!
//! ```sh
//! cargo run --example node
//! ```

use std::thread;

use kadroute::{Config, Dht, Mail, Node};
use tracing::{info, Level};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let config = Config {
        seeds: vec!["router.example.net:6881".to_string()],
        ..Default::default()
    };

    let mut dht = Dht::new(config);

    // A toy transport: answers every ping, and answers find intents with a
    // handful of made-up neighbors. A real transport would speak the wire
    // protocol here.
    let outbound = dht.outbound();
    let transport = thread::spawn(move || {
        for mail in outbound {
            match mail {
                Mail::Ping { node, reply } => {
                    let _ = reply.send(*node.id());
                }
                Mail::FindNode { target: _, reply } => {
                    let neighbors: Box<[Node]> =
                        (0..5).map(|_| Node::random()).collect::<Vec<_>>().into();
                    let _ = reply.send(neighbors);
                }
            }
        }
    });

    for _ in 0..20 {
        dht.add_node(Node::random());
    }

    dht.refresh();

    let target = Node::random();
    dht.add_node(target.clone());

    match dht.find(*target.id()) {
        Ok(closest) => {
            for node in closest.iter() {
                info!(id = %node.id(), address = %node.address(), "Close node");
            }
        }
        Err(error) => info!(?error, "Lookup failed"),
    }

    dht.store("greeting", "hello");
    if let Ok(Some(value)) = dht.get("greeting") {
        info!(value = %value, "Read back from the local store");
    }

    if let Ok(info) = dht.info() {
        info!(
            id = %info.id(),
            nodes = info.nodes(),
            stored = info.stored_keys(),
            "Node status"
        );
    }

    dht.shutdown();
    let _ = transport.join();
}
