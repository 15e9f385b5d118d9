//! End to end lookups over small in-process overlays.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use xorkad::{Config, Id, Node};

fn no_cooldown() -> Config {
    Config {
        value_lookup_cooldown: Duration::ZERO,
        ..Default::default()
    }
}

/// A chain of nodes where each one pinged the next.
fn chain(size: usize, config: &Config) -> Vec<Node> {
    let nodes: Vec<Node> = (0..size)
        .map(|i| Node::with_config(&format!("node-{i}"), config.clone()).unwrap())
        .collect();

    for pair in nodes.windows(2) {
        pair[0].ping(&pair[1]);
    }

    nodes
}

#[test]
fn find_node_through_a_peer() {
    let x = Node::new("X");
    let y = Node::new("Y");
    let z = Node::new("Z");

    x.ping(&y);
    y.ping(&z);

    let found = x.find_node(z.id()).unwrap();

    assert!(found.iter().any(|contact| contact.id() == z.id()));
    assert!(found.len() <= x.config().k);
}

#[test]
fn store_then_find_value() {
    let x = Node::new("X");
    let y = Node::new("Y");

    assert!(x.store("k1", "v1", &y));
    assert_eq!(y.find_value("k1"), Some("v1".to_string()));
}

#[test]
fn overwrite_returns_latest_value() {
    let x = Node::new("X");
    let y = Node::new("Y");

    assert!(x.store("k1", "v1", &y));
    assert!(!x.store("k1", "v2", &y));

    assert_eq!(y.find_value("k1"), Some("v2".to_string()));
}

#[test]
fn lonely_node_finds_nothing() {
    let x = Node::new("X");

    assert_eq!(x.find_value("anything"), None);
    assert_eq!(x.find_node(&Id::from_name("Y")), None);
}

#[test]
fn origin_is_the_last_caller() {
    let x = Node::new("X");
    let y = Node::new("Y");
    let z = Node::new("Z");

    x.store("k1", "v1", &z);
    y.store("k1", "v1", &z);

    let stored = z.stored("k1").unwrap();
    assert_eq!(stored.origin(), y.id());
    assert_eq!(stored.value(), "v1");
}

#[test]
fn find_value_over_multiple_hops() {
    let config = no_cooldown();
    let nodes = chain(6, &config);

    let first = &nodes[0];
    let last = &nodes[5];
    last.store("far", "away", last);

    assert_eq!(first.find_value("far"), Some("away".to_string()));
    assert_eq!(first.find_value("missing"), None);
}

#[test]
fn find_node_over_multiple_hops() {
    let nodes = chain(6, &Config::default());

    let first = &nodes[0];
    let last = &nodes[5];

    let found = first.find_node(last.id()).unwrap();
    assert!(found.iter().any(|contact| contact.id() == last.id()));

    let found = last.find_node(first.id()).unwrap();
    assert!(found.iter().any(|contact| contact.id() == first.id()));
}

#[test]
fn lookups_terminate_on_cycles() {
    let nodes = chain(8, &no_cooldown());

    // Close the ring and add some chords.
    nodes[7].ping(&nodes[0]);
    nodes[2].ping(&nodes[6]);
    nodes[5].ping(&nodes[1]);

    for node in &nodes {
        assert_eq!(node.find_node(&Id::random()), None);
        assert_eq!(node.find_value("nowhere"), None);
    }
}

#[test]
fn value_lookup_is_suppressed_during_cooldown() {
    let x = Node::new("X");
    let y = Node::new("Y");
    x.ping(&y);
    x.store("k1", "v1", &y);

    assert_eq!(x.find_value("k1"), Some("v1".to_string()));
    // x is still cooling down for "k1", even though the first lookup returned.
    assert_eq!(x.find_value("k1"), None);
    // y answered the forwarded lookup, so it is cooling down as well.
    assert_eq!(y.find_value("k1"), None);
}

#[test]
fn value_lookup_released_after_cooldown() {
    let config = Config {
        value_lookup_cooldown: Duration::from_millis(50),
        ..Default::default()
    };
    let x = Node::with_config("X", config.clone()).unwrap();
    let y = Node::with_config("Y", config).unwrap();
    x.ping(&y);
    x.store("k1", "v1", &y);

    assert_eq!(x.find_value("k1"), Some("v1".to_string()));
    assert_eq!(x.find_value("k1"), None);

    thread::sleep(Duration::from_millis(120));

    assert_eq!(x.find_value("k1"), Some("v1".to_string()));
}

#[test]
fn dropped_peers_are_skipped() {
    let config = no_cooldown();
    let x = Node::with_config("X", config.clone()).unwrap();
    let y = Node::with_config("Y", config.clone()).unwrap();
    let z = Node::with_config("Z", config).unwrap();

    x.ping(&y);
    x.ping(&z);
    z.store("k1", "v1", &z);

    drop(y);

    assert_eq!(x.find_value("k1"), Some("v1".to_string()));
}

#[test]
fn concurrent_lookups_terminate() {
    let nodes = chain(10, &no_cooldown());
    nodes[9].ping(&nodes[0]);
    nodes[9].store("shared", "value", &nodes[9]);

    let target = *nodes[9].id();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let node = nodes[i % 3].clone();
            let barrier = barrier.clone();

            thread::spawn(move || {
                barrier.wait();

                if let Some(found) = node.find_node(&target) {
                    assert!(found.iter().any(|contact| contact.id() == &target));
                }

                node.find_value("shared")
            })
        })
        .collect();

    for handle in handles {
        // Identical concurrent lookups may be suppressed, but never hang,
        // and never yield anything else than the stored value.
        if let Some(value) = handle.join().unwrap() {
            assert_eq!(value, "value");
        }
    }

    assert!(nodes[0].find_node(&target).is_some());
    assert_eq!(nodes[0].find_value("shared"), Some("value".to_string()));
}

#[test]
fn routing_tables_stay_bounded() {
    let hub = Node::new("hub");
    let peers: Vec<Node> = (0..200).map(|i| Node::new(&format!("peer-{i}"))).collect();

    for peer in &peers {
        peer.ping(&hub);
    }

    let table = hub.routing_table();
    let k = hub.config().k;

    for index in 0..xorkad::ID_BITS {
        if let Some(bucket) = table.bucket(index) {
            assert!(bucket.len() <= k);
        }
    }
    assert_eq!(table.insertions(), peers.len());
    assert!(table.size() <= k * xorkad::ID_BITS);
}
