//! Round-robin finger table refresh.

use tracing::{trace, warn};

use super::Chord;

#[derive(Debug, Default, Clone)]
/// Refreshes one finger per [FingerRefresher::tick], cycling through the whole table.
///
/// Each node's refresher thread owns its own cursor.
pub struct FingerRefresher {
    next: usize,
}

impl FingerRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the finger the next tick refreshes.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Resolve the successor of the next finger's start and store it in the finger table.
    ///
    /// The cursor advances whether the resolution succeeded or not.
    pub fn tick(&mut self, chord: &Chord) {
        let len = chord.space().bits() as usize;
        let index = self.next % len;

        let start = chord.space().finger_start(*chord.id(), index as u8);

        match chord.find_successor(start) {
            Ok(node) => {
                trace!(index, ?start, %node, "Refreshed finger");
                chord.directory_mut().set_finger(index, node);
            }
            Err(error) => warn!(index, ?start, %error, "Unable to refresh finger"),
        }

        self.next = (index + 1) % len;
    }
}
