//! Lookup routing and the liveness check gating it.

use tracing::{debug, trace};

use crate::common::{Id, Node};
use crate::rpc::RequestError;

use super::Chord;

impl Chord {
    /// Find the node owning `id`, that is the first node at or after `id` on the ring.
    pub fn find_successor(&self, id: Id) -> Result<Node, LookupError> {
        self.find_successor_with_hops(id, 0)
    }

    /// Same as [Chord::find_successor] for a lookup that already travelled `hops` nodes.
    ///
    /// Lookups travelling more than `m` hops are abandoned with [LookupError::HopLimit].
    pub fn find_successor_with_hops(&self, id: Id, hops: u8) -> Result<Node, LookupError> {
        let successor = self.successor();

        if self.space().is_in_range(id, *self.id(), *successor.id()) {
            return Ok(successor);
        }

        if hops >= self.space().bits() {
            debug!(?id, hops, "Lookup exceeded the hop limit");
            return Err(LookupError::HopLimit(hops));
        }

        let closest = self.closest_preceding_finger(id);

        if &closest == self.local() {
            debug!(?id, "No live node precedes the lookup target");
            return Err(LookupError::NoRoute(id));
        }

        trace!(?id, hops, next = %closest, "Forwarding lookup");

        Ok(self.peer(&closest).find_successor(id, hops + 1)?)
    }

    /// The live node closest to, and strictly preceding, `id` that this node knows of.
    ///
    /// Fingers are scanned from the farthest down, then the successor list, also farthest
    /// first. Returns the local node if nothing qualifies.
    pub fn closest_preceding_finger(&self, id: Id) -> Node {
        let (fingers, successors) = {
            let directory = self.directory();

            (
                directory.fingers().preceding(self.id(), &id, self.space()),
                directory.successor_list(),
            )
        };

        if let Some(node) = fingers.into_iter().find(|node| self.is_valid(node)) {
            return node;
        }

        successors
            .into_iter()
            .rev()
            .filter(|node| node != self.local())
            .filter(|node| self.space().is_between(*node.id(), *self.id(), id))
            .find(|node| self.is_valid(node))
            .unwrap_or_else(|| self.local().clone())
    }

    /// Probe `node`: it must answer, listen on a port and know a successor.
    pub fn probe(&self, node: &Node) -> Result<(), ProbeError> {
        let pong = self.peer(node).ping()?;

        if pong.port == 0 {
            return Err(ProbeError::NoPort);
        }

        if pong.successor.is_none() {
            return Err(ProbeError::NoSuccessor);
        }

        Ok(())
    }

    /// Whether `node` passes [Chord::probe]. Failures are logged, never propagated.
    pub fn is_valid(&self, node: &Node) -> bool {
        match self.probe(node) {
            Ok(()) => true,
            Err(error) => {
                debug!(%node, %error, "Incoming instance was not valid");
                false
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
/// Chord lookup error.
pub enum LookupError {
    /// A hop of the lookup failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("No live node precedes {0}")]
    /// Neither a finger nor a successor precedes the target while being alive.
    NoRoute(Id),

    #[error("Lookup abandoned after {0} hops")]
    /// Lookup travelled more hops than the identifier space has bits.
    HopLimit(u8),
}

#[derive(thiserror::Error, Debug)]
/// Reason a node failed the liveness check.
pub enum ProbeError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Node reported port 0")]
    NoPort,

    #[error("Node has no successor")]
    NoSuccessor,
}
