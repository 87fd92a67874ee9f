//! Periodic repair of successor and predecessor links.

use tracing::{debug, error, warn};

use crate::common::Node;

use super::Chord;

impl Chord {
    /// Adopt a closer successor if one joined, notify the successor of this node and refresh
    /// the successor list from it.
    ///
    /// If the successor is unreachable, the first live node of the successor list takes its
    /// place. With no live node left, the node re-joins the ring through its seed.
    pub fn stabilize_successors(&self) {
        let successor = self.successor();

        match self.peer(&successor).get_predecessor() {
            Ok(candidate) => {
                let successor = match candidate {
                    Some(candidate)
                        if self
                            .space()
                            .is_between(*candidate.id(), *self.id(), *successor.id()) =>
                    {
                        self.directory_mut().set_successor(candidate.clone());
                        candidate
                    }
                    _ => successor,
                };

                self.notify_successor(&successor);
            }
            Err(error) => {
                debug!(%successor, %error, "Successor unreachable, falling back to the successor list");

                let candidates = self.successor_list();

                for candidate in candidates {
                    if self.is_valid(&candidate) {
                        self.directory_mut().set_successor(candidate.clone());
                        self.notify_successor(&candidate);

                        return;
                    }
                }

                let seed = self.seed();
                error!(local = %self.local(), ?seed, "Ring consistency error, re-joining the Chord ring");

                // Nothing in the current state is alive, drop it even if the seed is gone too.
                self.directory_mut().reset(seed.clone(), self.space());

                if let Err(error) = self.join_ring(seed) {
                    warn!(%error, "Re-join after ring consistency error failed");
                }
            }
        }
    }

    /// Clear the predecessor if it no longer passes the liveness check.
    pub fn stabilize_predecessors(&self) {
        let Some(predecessor) = self.predecessor() else {
            return;
        };

        if &predecessor == self.local() || self.is_valid(&predecessor) {
            return;
        }

        let mut directory = self.directory_mut();

        // Only clear what was probed, a notify may have raced in.
        if directory.predecessor() == Some(&predecessor) {
            directory.set_predecessor(None);
        }
    }

    /// `candidate` claims to be this node's predecessor. Returns whether it was accepted.
    pub fn notify(&self, candidate: Node) -> bool {
        self.directory_mut().notify(candidate, self.space())
    }

    fn notify_successor(&self, successor: &Node) {
        let peer = self.peer(successor);

        if let Err(error) = peer.notify(self.local()) {
            debug!(%successor, %error, "Failed to notify successor");
        }

        match peer.get_successor_list() {
            Ok(successors) => self
                .directory_mut()
                .refresh_successors(successor.clone(), &successors),
            Err(error) => debug!(%successor, %error, "Failed to fetch the successor list"),
        }
    }
}
