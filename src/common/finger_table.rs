//! Chord finger table.

use crate::common::{Id, IdSpace, Node};

#[derive(Debug, Clone, PartialEq)]
/// A single routing entry: the first node known to succeed `start`.
pub struct Finger {
    pub start: Id,
    pub node: Node,
}

#[derive(Debug, Clone)]
/// Routing table of `m` fingers, where finger `i` starts at `(local + 2^i) mod 2^m`.
///
/// Entries are resolved incrementally, so until then they point at the local node.
pub struct FingerTable {
    fingers: Vec<Finger>,
}

impl FingerTable {
    /// Create a new [FingerTable] with every entry pointing at `local`.
    pub fn new(local: &Node, space: &IdSpace) -> Self {
        let fingers = (0..space.bits())
            .map(|i| Finger {
                start: space.finger_start(*local.id(), i),
                node: local.clone(),
            })
            .collect();

        FingerTable { fingers }
    }

    /// Number of entries, `m`.
    pub fn len(&self) -> usize {
        self.fingers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Finger> {
        self.fingers.get(index)
    }

    /// Overwrite the node of the finger at `index`, returns the previous node if it changed.
    pub fn set(&mut self, index: usize, node: Node) -> Option<Node> {
        let finger = self.fingers.get_mut(index)?;

        if finger.node == node {
            return None;
        }

        Some(std::mem::replace(&mut finger.node, node))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finger> {
        self.fingers.iter()
    }

    /// Nodes that strictly precede `target` as seen from `local`, from the farthest finger
    /// to the nearest, skipping `local` and consecutive duplicates.
    pub fn preceding(&self, local: &Id, target: &Id, space: &IdSpace) -> Vec<Node> {
        let mut candidates: Vec<Node> = Vec::new();

        for finger in self.fingers.iter().rev() {
            if finger.node.id() == local {
                continue;
            }
            if !space.is_between(*finger.node.id(), *local, *target) {
                continue;
            }
            if candidates.last() == Some(&finger.node) {
                continue;
            }

            candidates.push(finger.node.clone());
        }

        candidates
    }
}
