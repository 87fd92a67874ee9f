//! In-process ring harness, driving maintenance tick by tick.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chord::rpc::LocalNetwork;
use chord::{Chord, FingerRefresher, Id, Node};

/// Long enough that background maintenance never ticks during a test.
const IDLE: Duration = Duration::from_secs(3600);

pub const BITS: u8 = 6;

#[derive(Debug)]
pub struct Ring {
    pub network: LocalNetwork,
    pub nodes: Vec<Chord>,
    refreshers: HashMap<Id, FingerRefresher>,
    bits: u8,
}

impl Ring {
    pub fn new() -> Self {
        Ring::with_bits(BITS)
    }

    pub fn with_bits(bits: u8) -> Self {
        Ring {
            network: LocalNetwork::new(),
            nodes: vec![],
            refreshers: HashMap::new(),
            bits,
        }
    }

    /// A node with id `id`, reachable through the network but not joined yet.
    pub fn spawn(&mut self, id: u64) -> Chord {
        let node = Chord::builder()
            .id_bits(self.bits)
            .stabilize_interval(IDLE)
            .fix_fingers_interval(IDLE)
            .rejoin_interval(IDLE)
            .replication_interval(IDLE)
            .build_with_id(
                "127.0.0.1",
                7000 + id as u16,
                Id(id),
                Arc::new(self.network.clone()),
            )
            .unwrap();

        self.network.register(node.local(), Arc::new(node.clone()));
        self.refreshers.insert(*node.id(), FingerRefresher::new());
        self.nodes.push(node.clone());

        node
    }

    /// Spawn a node and join it through `seed`.
    pub fn join(&mut self, id: u64, seed: Option<u64>) -> Chord {
        let node = self.spawn(id);
        let seed = seed.map(|seed| self.node(seed).local().clone());

        node.join(seed.as_ref()).unwrap();

        node
    }

    pub fn node(&self, id: u64) -> &Chord {
        self.nodes
            .iter()
            .find(|node| node.id() == &Id(id))
            .unwrap()
    }

    pub fn descriptor(&self, id: u64) -> Node {
        self.node(id).local().clone()
    }

    pub fn live(&self) -> Vec<Chord> {
        self.nodes
            .iter()
            .filter(|node| self.network.is_reachable(node.local()))
            .cloned()
            .collect()
    }

    /// One stabilization tick on every live node, in join order.
    pub fn stabilize(&self, rounds: usize) {
        for _ in 0..rounds {
            for node in self.live() {
                node.stabilize_successors();
                node.stabilize_predecessors();
            }
        }
    }

    /// Refresh every finger of every live node once.
    pub fn fix_fingers(&mut self) {
        for node in self.live() {
            let refresher = self.refreshers.entry(*node.id()).or_default();

            for _ in 0..self.bits {
                refresher.tick(&node);
            }
        }
    }

    /// Id of the node owning `key` among the live nodes.
    pub fn owner(&self, key: Id) -> Id {
        let mut ids: Vec<Id> = self.live().iter().map(|node| *node.id()).collect();
        ids.sort();

        ids.iter()
            .find(|id| **id >= key)
            .or(ids.first())
            .copied()
            .unwrap()
    }

    pub fn shutdown(&self) {
        for node in &self.nodes {
            node.shutdown();
        }
    }
}

/// A value hashing to `key` in a `bits` bit space.
pub fn value_for_key(key: Id, bits: u8) -> String {
    let space = chord::IdSpace::new(bits).unwrap();

    (0..)
        .map(|i| format!("value-{i}"))
        .find(|value| space.hash(value) == key)
        .unwrap()
}
