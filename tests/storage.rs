//! Key routing, lookups and successor replication over an in-process network.

mod common;

use chord::{Id, StoreError};
use common::{value_for_key, Ring, BITS};

fn three_nodes() -> Ring {
    let mut ring = Ring::new();

    ring.join(10, None);
    ring.join(30, Some(10));
    ring.join(50, Some(10));

    ring.stabilize(5);
    ring.fix_fingers();

    ring
}

#[test]
fn add_key_routes_to_owner() {
    let ring = three_nodes();
    let value = value_for_key(Id(25), BITS);

    let key = ring.node(10).add_key(&value).unwrap();

    assert_eq!(key, Id(25));
    assert_eq!(ring.node(30).store().get(&key), Some(value.clone()));
    assert!(!ring.node(10).store().contains_key(&key));
    assert!(!ring.node(50).store().contains_key(&key));

    assert_eq!(ring.node(50).find_key(key).unwrap(), Some(value));

    ring.shutdown();
}

#[test]
fn added_values_are_found_from_every_node() {
    let ring = three_nodes();

    let values: Vec<String> = (0..20).map(|i| format!("item-{i}")).collect();
    let mut keys = vec![];

    for (i, value) in values.iter().enumerate() {
        let origin = &ring.nodes[i % ring.nodes.len()];

        match origin.add_key(value) {
            Ok(key) => keys.push((key, value.clone())),
            // Two values may share a key in a 64 position space.
            Err(StoreError::KeyExists(_)) => {}
            Err(error) => panic!("add_key failed: {error}"),
        }
    }

    for (key, value) in keys {
        let owner = ring.owner(key);
        assert_eq!(ring.node(owner.0).store().get(&key), Some(value.clone()));

        for node in &ring.nodes {
            assert_eq!(node.find_key(key).unwrap(), Some(value.clone()));
        }
    }

    ring.shutdown();
}

#[test]
fn add_key_rejects_present_key() {
    let ring = three_nodes();
    let value = value_for_key(Id(25), BITS);

    ring.node(50).add_key(&value).unwrap();

    assert!(matches!(
        ring.node(10).add_key(&value),
        Err(StoreError::KeyExists(Id(25)))
    ));
    assert!(matches!(
        ring.node(30).add_key(&value),
        Err(StoreError::KeyExists(Id(25)))
    ));

    ring.shutdown();
}

#[test]
fn missing_key_is_not_found() {
    let ring = three_nodes();

    assert_eq!(ring.node(10).find_key(Id(40)).unwrap(), None);

    ring.shutdown();
}

#[test]
fn empty_value_is_found() {
    let ring = three_nodes();

    let key = ring.node(10).add_key("").unwrap();

    assert_eq!(ring.node(30).find_key(key).unwrap(), Some(String::new()));

    ring.shutdown();
}

#[test]
fn replicate_key_is_idempotent() {
    let ring = three_nodes();
    let node = ring.node(50);

    assert!(node.replicate_key(Id(25), "first"));
    assert!(!node.replicate_key(Id(25), "second"));
    assert!(!node.replicate_key(Id(25), "first"));

    assert_eq!(node.store().get(&Id(25)), Some("first".to_string()));
    assert_eq!(node.store().len(), 1);

    ring.shutdown();
}

#[test]
fn owned_keys_are_replicated_to_successor() {
    let ring = three_nodes();
    let value = value_for_key(Id(25), BITS);

    ring.node(10).add_key(&value).unwrap();

    // A replica held on behalf of 10 is not owned by 30.
    ring.node(30).replicate_key(Id(5), "replica");

    assert_eq!(ring.node(30).replicate_storage(), 1);

    assert_eq!(ring.node(50).store().get(&Id(25)), Some(value));
    assert!(!ring.node(50).store().contains_key(&Id(5)));

    // Nothing is removed from the origin.
    assert!(ring.node(30).store().contains_key(&Id(25)));

    ring.shutdown();
}

#[test]
fn replicas_survive_owner_failure() {
    let ring = three_nodes();
    let value = value_for_key(Id(25), BITS);

    let key = ring.node(10).add_key(&value).unwrap();
    ring.node(30).replicate_storage();

    ring.network.set_reachable(&ring.descriptor(30), false);
    ring.stabilize(5);

    // 50 now owns (10, 50], including the replica.
    assert_eq!(ring.node(10).find_key(key).unwrap(), Some(value));

    ring.shutdown();
}

#[test]
fn singleton_keeps_everything() {
    let mut ring = Ring::new();
    let node = ring.join(10, None);

    let key = node.add_key("alone").unwrap();

    assert_eq!(node.find_key(key).unwrap(), Some("alone".to_string()));
    assert_eq!(node.replicate_storage(), 0);

    ring.shutdown();
}
