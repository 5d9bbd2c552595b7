//! End-to-end tests driving the actor through its public handle, with a
//! thread-based mock transport attached to the outbound mail queue.

use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use kadroute::{Config, Dht, Id, Mail, Node, ID_SIZE};

fn id_with_low_byte(byte: u8) -> Id {
    let mut bytes = [0u8; ID_SIZE];
    bytes[ID_SIZE - 1] = byte;
    Id(bytes)
}

fn node_with_low_byte(byte: u8) -> Node {
    Node::new(
        id_with_low_byte(byte),
        SocketAddr::from(([127, 0, 0, 1], byte as u16)),
    )
}

fn low_bytes(nodes: &[Node]) -> Vec<u8> {
    nodes.iter().map(|node| node.id().0[ID_SIZE - 1]).collect()
}

fn zero_id_config() -> Config {
    Config {
        id: id_with_low_byte(0),
        request_timeout: Duration::from_millis(200),
        ..Default::default()
    }
}

/// A transport that answers pings (or drops them) and answers find intents
/// with a fixed node list. Exits once the dht shuts down.
fn attach_transport(dht: &Dht, answer_pings: bool, found_nodes: Vec<Node>) -> JoinHandle<()> {
    let outbound = dht.outbound();

    thread::spawn(move || {
        for mail in outbound {
            match mail {
                Mail::Ping { node, reply } => {
                    if answer_pings {
                        let _ = reply.send(*node.id());
                    }
                    // dropping the reply channel reports the ping failed
                }
                Mail::FindNode { target: _, reply } => {
                    let _ = reply.send(found_nodes.clone().into_boxed_slice());
                }
            }
        }
    })
}

#[test]
fn closest_nodes_across_buckets() {
    // k = 2, alpha = 2, local id ..0000; nodes ..0001, ..0010 and ..0100.
    // The two closest nodes to ..0011 are ..0010 then ..0001.
    let config = Config {
        bucket_size: 2,
        alpha: 2,
        ..zero_id_config()
    };

    let mut dht = Dht::new(config);

    for byte in [0b0001, 0b0010, 0b0100] {
        dht.add_node(node_with_low_byte(byte));
    }

    let closest = dht.find(id_with_low_byte(0b0011)).unwrap();

    assert_eq!(low_bytes(&closest), vec![0b0010, 0b0001]);

    dht.shutdown();
}

#[test]
fn concurrent_adds_are_serialized() {
    // k concurrent adds into the same bucket all land, whatever their
    // arrival order.
    let config = Config {
        alpha: 8,
        ..zero_id_config()
    };

    let mut dht = Dht::new(config);

    let handles: Vec<_> = (0x10..0x18u8)
        .map(|byte| {
            let dht = dht.clone();
            thread::spawn(move || dht.add_node(node_with_low_byte(byte)))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut found = low_bytes(&dht.find(id_with_low_byte(0x10)).unwrap());
    found.sort_unstable();

    assert_eq!(found, (0x10..0x18u8).collect::<Vec<_>>());

    dht.shutdown();
}

#[test]
fn full_bucket_keeps_responsive_nodes() {
    let config = Config {
        bucket_size: 2,
        alpha: 2,
        ..zero_id_config()
    };

    let mut dht = Dht::new(config);
    let transport = attach_transport(&dht, true, Vec::new());

    dht.add_node(node_with_low_byte(0x10));
    dht.add_node(node_with_low_byte(0x11));
    // the bucket is full; 0x10 answers its probe, so 0x12 is discarded
    dht.add_node(node_with_low_byte(0x12));

    let mut found = low_bytes(&dht.find(id_with_low_byte(0x12)).unwrap());
    found.sort_unstable();

    assert_eq!(found, vec![0x10, 0x11]);

    dht.shutdown();
    transport.join().unwrap();
}

#[test]
fn full_bucket_evicts_unresponsive_nodes() {
    let config = Config {
        bucket_size: 2,
        alpha: 2,
        ..zero_id_config()
    };

    let mut dht = Dht::new(config);
    let transport = attach_transport(&dht, false, Vec::new());

    dht.add_node(node_with_low_byte(0x10));
    dht.add_node(node_with_low_byte(0x11));
    // 0x10 is the least recently seen and its probe fails; 0x12 takes its
    // place
    dht.add_node(node_with_low_byte(0x12));

    let mut found = low_bytes(&dht.find(id_with_low_byte(0x10)).unwrap());
    found.sort_unstable();

    assert_eq!(found, vec![0x11, 0x12]);

    dht.shutdown();
    transport.join().unwrap();
}

#[test]
fn refresh_populates_the_routing_table() {
    let mut dht = Dht::new(zero_id_config());

    let neighbors = vec![node_with_low_byte(0x01), node_with_low_byte(0x20)];
    let transport = attach_transport(&dht, true, neighbors);

    dht.refresh();

    let info = dht.info().unwrap();
    assert_eq!(info.nodes(), 2);

    dht.shutdown();
    transport.join().unwrap();
}

#[test]
fn unattached_transport_degrades_to_eviction() {
    // nobody consumes the outbound queue: the probe times out and the
    // eviction proceeds, it just takes one request_timeout
    let config = Config {
        bucket_size: 1,
        alpha: 1,
        request_timeout: Duration::from_millis(50),
        ..zero_id_config()
    };

    let mut dht = Dht::new(config);

    dht.add_node(node_with_low_byte(0x10));
    dht.add_node(node_with_low_byte(0x11));

    // the actor may still be blocked in the probe; retry until it settles
    let mut found = Vec::new();
    for _ in 0..20 {
        if let Ok(nodes) = dht.find(id_with_low_byte(0x11)) {
            found = low_bytes(&nodes);
            if found == vec![0x11] {
                break;
            }
        }
        thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(found, vec![0x11]);

    dht.shutdown();
}

#[test]
fn removed_nodes_stop_being_returned() {
    let mut dht = Dht::new(zero_id_config());

    let node = node_with_low_byte(0x10);
    dht.add_node(node.clone());

    assert_eq!(dht.find_one(*node.id()).unwrap(), node);

    dht.remove_node(node.clone());

    assert!(dht.find_one(*node.id()).is_err());
    assert!(dht.find(*node.id()).unwrap().is_empty());

    dht.shutdown();
}
