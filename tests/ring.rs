//! Ring formation, lookups and failure handling over an in-process network.

mod common;

use chord::{FingerRefresher, Id, JoinError, LookupError, RejoinWatchdog};
use common::{Ring, BITS};

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
fn three_node_ring_links() {
    let ring = three_nodes();

    assert_eq!(ring.node(10).successor(), ring.descriptor(30));
    assert_eq!(ring.node(30).successor(), ring.descriptor(50));
    assert_eq!(ring.node(50).successor(), ring.descriptor(10));

    assert_eq!(ring.node(30).predecessor(), Some(ring.descriptor(10)));
    assert_eq!(ring.node(50).predecessor(), Some(ring.descriptor(30)));
    assert_eq!(ring.node(10).predecessor(), Some(ring.descriptor(50)));

    assert_eq!(
        ring.node(10).successor_list()[..3],
        [ring.descriptor(30), ring.descriptor(50), ring.descriptor(10)]
    );

    ring.shutdown();
}

#[test]
fn first_node_starts_a_singleton_ring() {
    let mut ring = Ring::new();
    let node = ring.join(10, None);

    assert_eq!(node.successor(), ring.descriptor(10));
    assert_eq!(node.seed(), None);
    assert!(node.is_maintained());

    for key in 0..64 {
        assert_eq!(node.find_successor(Id(key)).unwrap(), ring.descriptor(10));
    }

    ring.shutdown();
}

#[test]
fn join_through_unjoined_seed_fails() {
    let mut ring = Ring::new();
    ring.spawn(10);
    let node = ring.spawn(30);

    let result = node.join(Some(&ring.descriptor(10)));

    assert!(matches!(result, Err(JoinError::InvalidSeed(seed)) if seed == ring.descriptor(10)));
    assert!(!node.is_maintained());

    ring.shutdown();
}

#[test]
fn join_through_unreachable_seed_fails() {
    let mut ring = Ring::new();
    ring.join(10, None);
    let node = ring.spawn(30);

    ring.network.set_reachable(&ring.descriptor(10), false);

    assert!(matches!(
        node.join(Some(&ring.descriptor(10))),
        Err(JoinError::InvalidSeed(_))
    ));

    ring.shutdown();
}

#[test]
fn failed_join_keeps_state() {
    let mut ring = Ring::new();
    ring.join(10, None);
    ring.join(30, Some(10));
    ring.stabilize(3);
    let node = ring.spawn(20);

    // 10 answers, but the successor it resolves for 20 does not.
    ring.network.set_reachable(&ring.descriptor(30), false);

    assert!(matches!(
        node.join(Some(&ring.descriptor(10))),
        Err(JoinError::Request(_))
    ));

    assert_eq!(node.seed(), None);
    assert!(node.successor_list().is_empty());
    assert!(!node.is_maintained());
    assert!(!ring.node(10).is_valid(&ring.descriptor(20)));

    ring.shutdown();
}

#[test]
fn lookups_resolve_owner_from_every_node() {
    let ring = three_nodes();

    for node in &ring.nodes {
        for key in 0..64 {
            let owner = node.find_successor(Id(key)).unwrap();

            assert_eq!(*owner.id(), ring.owner(Id(key)), "key {key} from {node:?}");
        }
    }

    ring.shutdown();
}

#[test]
fn fast_path_returns_successor() {
    let ring = three_nodes();

    for node in &ring.nodes {
        let successor = node.successor();

        for key in 0..64 {
            if node.space().is_in_range(Id(key), *node.id(), *successor.id()) {
                assert_eq!(node.find_successor(Id(key)).unwrap(), successor);
            }
        }
    }

    ring.shutdown();
}

#[test]
fn fingers_point_at_owners() {
    let ring = three_nodes();

    let fingers = ring.node(10).finger_table();
    let nodes: Vec<_> = fingers.iter().map(|finger| *finger.node.id()).collect();

    // Starts 11, 12, 14, 18, 26, 42.
    assert_eq!(
        nodes,
        vec![Id(30), Id(30), Id(30), Id(30), Id(30), Id(50)]
    );

    ring.shutdown();
}

#[test]
fn lookups_stop_at_hop_limit() {
    let ring = three_nodes();
    let n10 = ring.node(10);

    // 40 is past 10's successor, so the lookup has to be forwarded.
    assert!(matches!(
        n10.find_successor_with_hops(Id(40), BITS),
        Err(LookupError::HopLimit(BITS))
    ));
    assert_eq!(
        n10.find_successor_with_hops(Id(40), BITS - 1).unwrap(),
        ring.descriptor(50)
    );

    ring.shutdown();
}

#[test]
fn finger_cursor_advances_past_failures() {
    let mut ring = Ring::new();
    ring.join(10, None);
    ring.join(13, Some(10));
    ring.stabilize(3);
    ring.fix_fingers();

    let n10 = ring.node(10);
    ring.network.set_reachable(&ring.descriptor(13), false);

    let mut refresher = FingerRefresher::new();

    // Starts 11 and 12 resolve through the fast path.
    refresher.tick(n10);
    refresher.tick(n10);
    assert_eq!(refresher.next_index(), 2);

    // Nothing alive precedes start 14.
    assert!(matches!(
        n10.find_successor(Id(14)),
        Err(LookupError::NoRoute(Id(14)))
    ));
    let before: Vec<_> = n10.finger_table().iter().cloned().collect();

    refresher.tick(n10);

    assert_eq!(refresher.next_index(), 3);
    assert!(n10.finger_table().iter().eq(before.iter()));

    ring.shutdown();
}

#[test]
fn notify_over_rpc() {
    let ring = three_nodes();

    let n30 = ring.node(30);
    let n50 = ring.descriptor(50);

    // 50 is not between 10 and 30.
    n30.peer(&ring.descriptor(30))
        .notify(&n50)
        .unwrap();
    assert_eq!(n30.predecessor(), Some(ring.descriptor(10)));

    // With no predecessor, any caller is accepted.
    n30.peer(&ring.descriptor(30))
        .set_predecessor(None)
        .unwrap();
    ring.node(50).peer(&ring.descriptor(30)).notify(&n50).unwrap();
    assert_eq!(n30.predecessor(), Some(n50));

    ring.shutdown();
}

#[test]
fn failed_successor_is_replaced_from_successor_list() {
    let ring = three_nodes();
    let n10 = ring.node(10);

    ring.network.set_reachable(&ring.descriptor(30), false);

    n10.stabilize_successors();

    assert_eq!(n10.successor(), ring.descriptor(50));
    // No re-join happened, the fingers survived.
    assert!(n10
        .finger_table()
        .iter()
        .any(|finger| finger.node != ring.descriptor(10)));

    ring.stabilize(5);

    assert_eq!(ring.node(50).predecessor(), Some(ring.descriptor(10)));
    assert_eq!(ring.node(50).successor(), ring.descriptor(10));
    assert_eq!(n10.predecessor(), Some(ring.descriptor(50)));

    ring.shutdown();
}

#[test]
fn dead_predecessor_is_cleared() {
    let ring = three_nodes();

    ring.network.set_reachable(&ring.descriptor(30), false);
    ring.node(50).stabilize_predecessors();

    assert_eq!(ring.node(50).predecessor(), None);

    ring.shutdown();
}

#[test]
fn lookup_without_live_route_fails() {
    let mut ring = Ring::new();
    ring.join(10, None);
    ring.join(30, Some(10));
    ring.stabilize(3);
    ring.fix_fingers();

    ring.network.set_reachable(&ring.descriptor(30), false);

    let result = ring.node(10).find_successor(Id(40));

    assert!(matches!(result, Err(LookupError::NoRoute(Id(40)))));

    ring.shutdown();
}

#[test]
fn depart_splices_neighbors() {
    let ring = three_nodes();
    let n30 = ring.node(30);

    n30.depart();

    assert!(!n30.is_maintained());
    assert_eq!(ring.node(10).successor(), ring.descriptor(50));
    assert_eq!(ring.node(50).predecessor(), Some(ring.descriptor(10)));

    assert_eq!(n30.successor(), ring.descriptor(30));
    assert_eq!(n30.predecessor(), Some(ring.descriptor(30)));
    assert_eq!(n30.seed(), Some(ring.descriptor(30)));
    assert!(n30
        .finger_table()
        .iter()
        .all(|finger| finger.node == ring.descriptor(30)));

    ring.shutdown();
}

#[test]
fn departed_node_can_rejoin() {
    let ring = three_nodes();
    let n30 = ring.node(30);

    n30.depart();
    ring.stabilize(3);

    n30.join(Some(&ring.descriptor(10))).unwrap();
    ring.stabilize(5);

    assert_eq!(ring.node(10).successor(), ring.descriptor(30));
    assert_eq!(n30.successor(), ring.descriptor(50));
    assert_eq!(ring.node(50).predecessor(), Some(ring.descriptor(30)));

    ring.shutdown();
}

#[test]
fn rejoin_watchdog_is_quiet_in_healthy_ring() {
    let ring = three_nodes();
    let mut watchdog = RejoinWatchdog::new();

    assert!(!watchdog.tick(ring.node(50)));
    assert!(!watchdog.tick(ring.node(50)));

    ring.shutdown();
}

#[test]
fn rejoin_watchdog_rejoins_lost_seed() {
    let mut ring = Ring::new();
    ring.join(10, None);
    ring.join(50, None);
    let n40 = ring.join(40, Some(10));

    // Point 40 at another ring, out of reach of its seed.
    n40.peer(&ring.descriptor(40))
        .set_successor(&ring.descriptor(50))
        .unwrap();

    let mut watchdog = RejoinWatchdog::new();

    assert!(!watchdog.tick(&n40), "never fires on the first tick");
    assert_eq!(n40.successor(), ring.descriptor(50));

    assert!(watchdog.tick(&n40));
    assert_eq!(n40.successor(), ring.descriptor(10));

    ring.shutdown();
}

#[test]
fn ring_closure() {
    let mut ring = Ring::with_bits(10);
    let ids: Vec<u64> = (0..16).map(|i| (i * 61 + 7) % 1024).collect();

    ring.join(ids[0], None);
    for id in &ids[1..] {
        ring.join(*id, Some(ids[0]));
        ring.stabilize(2);
    }

    ring.stabilize(10);
    ring.fix_fingers();

    let mut sorted = ids.clone();
    sorted.sort();

    for start in &ring.nodes {
        let mut current = start.clone();
        let mut visited = vec![];

        for _ in 0..ids.len() {
            visited.push(current.id().0);
            current = ring.node(current.successor().id().0).clone();
        }

        assert_eq!(current.id(), start.id());

        visited.sort();
        assert_eq!(visited, sorted);
    }

    for node in &ring.nodes {
        for key in (0..1024).step_by(37) {
            assert_eq!(
                *node.find_successor(Id(key)).unwrap().id(),
                ring.owner(Id(key))
            );
        }
    }

    ring.shutdown();
}

#[test]
fn exhausted_successor_list_rejoins() {
    let mut ring = Ring::new();
    let ids: Vec<u64> = (1..=10).map(|i| i * 5).collect();

    ring.join(ids[0], None);
    for id in &ids[1..] {
        ring.join(*id, Some(ids[0]));
        ring.stabilize(2);
    }
    ring.stabilize(10);
    ring.fix_fingers();

    let n5 = ring.node(5);
    assert!(!n5.successor_list().contains(n5.local()));

    for id in &ids[1..] {
        ring.network.set_reachable(&ring.descriptor(*id), false);
    }

    n5.stabilize_successors();

    assert_eq!(n5.successor(), ring.descriptor(5));
    assert!(n5
        .finger_table()
        .iter()
        .all(|finger| finger.node == ring.descriptor(5)));

    ring.shutdown();
}
