//! Everything a node knows about its place on the ring.

use tracing::info;

use crate::common::{FingerTable, IdSpace, Node, SuccessorList};

#[derive(Debug, Clone)]
/// This node's identity, its neighbors, its successor list and its finger table.
///
/// Kept behind a single lock so the successor and the successor list never disagree.
pub struct RingDirectory {
    local: Node,
    predecessor: Option<Node>,
    successors: SuccessorList,
    fingers: FingerTable,
    seed: Option<Node>,
}

impl RingDirectory {
    /// A directory for a node that has not joined any ring yet.
    pub fn new(local: Node, space: &IdSpace) -> Self {
        RingDirectory {
            fingers: FingerTable::new(&local, space),
            local,
            predecessor: None,
            successors: SuccessorList::default(),
            seed: None,
        }
    }

    // === Getters ===

    /// The immediate successor, the local node itself until it knows better.
    pub fn successor(&self) -> Node {
        self.successors
            .first()
            .cloned()
            .unwrap_or_else(|| self.local.clone())
    }

    /// The successor as reported to liveness probes, absent before the first join.
    pub fn reported_successor(&self) -> Option<Node> {
        self.successors.first().cloned()
    }

    pub fn predecessor(&self) -> Option<&Node> {
        self.predecessor.as_ref()
    }

    pub fn successor_list(&self) -> Vec<Node> {
        self.successors.to_vec()
    }

    pub fn fingers(&self) -> &FingerTable {
        &self.fingers
    }

    pub fn seed(&self) -> Option<&Node> {
        self.seed.as_ref()
    }

    // === Public Methods ===

    /// Start over for a join through `seed`: fresh fingers and a successor list of self.
    ///
    /// The predecessor is kept, a stale one gets cleared by predecessor stabilization.
    pub fn reset(&mut self, seed: Option<Node>, space: &IdSpace) {
        self.seed = seed;
        self.fingers = FingerTable::new(&self.local, space);
        self.set_successors(SuccessorList::filled(&self.local));
    }

    /// Collapse into a singleton ring, where this node is its own seed and neighbors.
    pub fn reset_singleton(&mut self, space: &IdSpace) {
        self.reset(Some(self.local.clone()), space);
        self.set_predecessor(Some(self.local.clone()));
    }

    pub fn set_successor(&mut self, successor: Node) {
        if self.successors.first() != Some(&successor) {
            info!(local = %self.local, %successor, "New successor");
        }

        self.successors.set_first(successor);
    }

    /// Replace the successor list with `successor` followed by its own successor list.
    pub fn refresh_successors(&mut self, successor: Node, remote: &[Node]) {
        let mut successors = self.successors.clone();
        successors.refresh(successor, remote, &self.local);

        self.set_successors(successors);
    }

    pub fn set_predecessor(&mut self, predecessor: Option<Node>) {
        match (&self.predecessor, &predecessor) {
            (Some(_), None) => info!(local = %self.local, "Setting predecessor to none"),
            (current, Some(new)) if current.as_ref() != Some(new) => {
                info!(local = %self.local, predecessor = %new, "New predecessor")
            }
            _ => {}
        }

        self.predecessor = predecessor;
    }

    /// Accept `candidate` as predecessor if none is known, or if it sits strictly between the
    /// current predecessor and this node. Returns whether it was accepted.
    pub fn notify(&mut self, candidate: Node, space: &IdSpace) -> bool {
        let accept = match &self.predecessor {
            None => true,
            Some(current) => space.is_between(*candidate.id(), *current.id(), *self.local.id()),
        };

        if accept {
            self.set_predecessor(Some(candidate));
        }

        accept
    }

    /// Overwrite the node of finger `index`.
    pub fn set_finger(&mut self, index: usize, node: Node) {
        self.fingers.set(index, node);
    }

    fn set_successors(&mut self, successors: SuccessorList) {
        if let Some(successor) = successors.first() {
            if self.successors.first() != Some(successor) {
                info!(local = %self.local, %successor, "New successor");
            }
        }

        self.successors = successors;
    }
}
