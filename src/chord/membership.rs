//! Joining, leaving and re-joining the ring.

use tracing::{debug, info, warn};

use crate::common::Node;
use crate::rpc::RequestError;

use super::{Chord, LookupError};

impl Chord {
    /// Join the ring `seed` belongs to, or start a new ring if `seed` is `None`, then start the
    /// maintenance threads.
    ///
    /// Joining again while joined resets the ring state and keeps the running threads.
    pub fn join(&self, seed: Option<&Node>) -> Result<(), JoinError> {
        self.join_ring(seed.cloned())?;
        self.start_maintenance()?;

        Ok(())
    }

    /// Reset the ring state and join through `seed`, without touching maintenance threads.
    ///
    /// The ring state is only replaced once the new successor list is known, so any failure
    /// leaves it untouched.
    pub(crate) fn join_ring(&self, seed: Option<Node>) -> Result<(), JoinError> {
        let seed = match seed {
            Some(seed) if &seed != self.local() => seed,
            seed => {
                info!(local = %self.local(), "Starting a new Chord ring");
                self.directory_mut().reset(seed, self.space());

                return Ok(());
            }
        };

        info!(local = %self.local(), %seed, "Joining Chord ring");

        if let Err(error) = self.probe(&seed) {
            debug!(%seed, %error, "Seed failed the liveness check");
            return Err(JoinError::InvalidSeed(seed));
        }

        let successor = self
            .peer(&seed)
            .find_successor(*self.id(), 0)
            .map_err(LookupError::from)?;

        let successors = self.peer(&successor).get_successor_list()?;

        let mut directory = self.directory_mut();
        directory.reset(Some(seed), self.space());
        directory.refresh_successors(successor, &successors);

        Ok(())
    }

    /// Leave the ring gracefully.
    ///
    /// Stops maintenance, asks the neighbors to link to each other and collapses into a
    /// singleton ring. Failing to reach a neighbor is logged and otherwise ignored.
    pub fn depart(&self) {
        self.stop_maintenance();

        let (successor, predecessor) = {
            let directory = self.directory();

            (directory.successor(), directory.predecessor().cloned())
        };

        if &successor != self.local() {
            if let Err(error) = self.peer(&successor).set_predecessor(predecessor.as_ref()) {
                warn!(%successor, %error, "Failed to hand the predecessor over to the successor");
            }
        }

        if let Some(predecessor) = predecessor.filter(|node| node != self.local()) {
            if let Err(error) = self.peer(&predecessor).set_successor(&successor) {
                warn!(%predecessor, %error, "Failed to hand the successor over to the predecessor");
            }
        }

        self.directory_mut().reset_singleton(self.space());

        info!(local = %self.local(), "Departed from the Chord ring");
    }
}

#[derive(Debug, Default, Clone)]
/// Re-joins through the seed once the ring lost track of the seed's neighborhood.
///
/// Never fires on its first tick.
pub struct RejoinWatchdog {
    armed: bool,
}

impl RejoinWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a re-join was attempted.
    ///
    /// A re-join happens when looking up the seed's id resolves to another node while the seed
    /// itself still passes the liveness check.
    pub fn tick(&mut self, chord: &Chord) -> bool {
        if !self.armed {
            self.armed = true;
            return false;
        }

        let seed = match chord.seed() {
            Some(seed) if &seed != chord.local() => seed,
            _ => return false,
        };

        let resolved = match chord.find_successor(*seed.id()) {
            Ok(node) => node,
            Err(error) => {
                debug!(%seed, %error, "Failed to resolve the seed's id");
                return false;
            }
        };

        if resolved.id() == seed.id() || !chord.is_valid(&seed) {
            return false;
        }

        info!(%seed, %resolved, "Lost track of the seed, re-joining the Chord ring");

        if let Err(error) = chord.join_ring(Some(seed)) {
            warn!(%error, "Re-join through the seed failed");
        }

        true
    }
}

#[derive(thiserror::Error, Debug)]
/// Chord join error.
pub enum JoinError {
    #[error("Seed {0} failed the liveness check")]
    /// The seed did not answer, or has not joined a ring itself.
    InvalidSeed(Node),

    #[error(transparent)]
    /// The seed could not resolve this node's successor.
    Lookup(#[from] LookupError),

    #[error(transparent)]
    /// The new successor did not share its successor list.
    Request(#[from] RequestError),

    #[error(transparent)]
    /// Spawning the maintenance threads failed.
    IO(#[from] std::io::Error),
}
