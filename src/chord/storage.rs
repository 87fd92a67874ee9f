//! Key-value storage routed to key owners, with single hop successor replication.

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::{debug, trace};

use crate::common::{ErrorSpecific, Id, ERROR_KEY_EXISTS};
use crate::rpc::RequestError;

use super::{Chord, LookupError};

#[derive(Debug, Default)]
/// Values held by this node, either owned or replicated from its predecessor.
///
/// Entries are never removed.
pub struct LocalStore {
    entries: DashMap<Id, String>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key` unless the key is present. Returns whether it was inserted.
    pub fn insert_if_absent(&self, key: Id, value: String) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    pub fn get(&self, key: &Id) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains_key(&self, key: &Id) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<(Id, String)> {
        self.entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

impl Chord {
    /// Store `value` on the node owning its hash. Returns the key it is stored under.
    pub fn add_key(&self, value: &str) -> Result<Id, StoreError> {
        let key = self.space().hash(value);
        let owner = self.find_successor(key)?;

        if &owner == self.local() {
            return self.store_local(key, value);
        }

        trace!(?key, %owner, "Forwarding add_key to the owner");

        match self.peer(&owner).add_key(value) {
            Ok(key) => Ok(key),
            Err(RequestError::ErrorResponse(ErrorSpecific {
                code: ERROR_KEY_EXISTS,
                ..
            })) => Err(StoreError::KeyExists(key)),
            Err(error) => Err(error.into()),
        }
    }

    /// Read `key` from the node owning it. `None` means the owner does not hold it.
    pub fn find_key(&self, key: Id) -> Result<Option<String>, StoreError> {
        let owner = self.find_successor(key)?;

        if &owner == self.local() {
            return Ok(self.store().get(&key));
        }

        Ok(self.peer(&owner).find_key(key)?)
    }

    /// Keep a replica of `key`, unless a value is already held. Returns whether it was stored.
    pub fn replicate_key(&self, key: Id, value: &str) -> bool {
        let stored = self.store().insert_if_absent(key, value.to_string());

        if stored {
            trace!(?key, "Stored replica");
        }

        stored
    }

    /// Push every owned key to the successor. Returns how many keys were pushed.
    ///
    /// Stops at the first failure, the next tick starts over.
    pub fn replicate_storage(&self) -> usize {
        let successor = self.successor();

        if &successor == self.local() {
            return 0;
        }

        let peer = self.peer(&successor);
        let mut pushed = 0;

        for (key, value) in self.store().entries() {
            if !self.owns(key) {
                continue;
            }

            match peer.replicate_key(key, &value) {
                Ok(_) => pushed += 1,
                Err(error) => {
                    debug!(%successor, ?key, %error, "Replication to successor failed");
                    break;
                }
            }
        }

        pushed
    }

    /// Whether `key` lies in `(predecessor, self]`. Every key is owned while the predecessor
    /// is unknown.
    pub fn owns(&self, key: Id) -> bool {
        match self.predecessor() {
            Some(predecessor) => self.space().is_in_range(key, *predecessor.id(), *self.id()),
            None => true,
        }
    }

    /// Store on this node, as the owner of `key`.
    pub(crate) fn store_local(&self, key: Id, value: &str) -> Result<Id, StoreError> {
        if !self.store().insert_if_absent(key, value.to_string()) {
            return Err(StoreError::KeyExists(key));
        }

        debug!(?key, "Stored key");

        Ok(key)
    }
}

#[derive(thiserror::Error, Debug)]
/// Chord storage error.
pub enum StoreError {
    #[error(transparent)]
    /// The owner of the key could not be resolved.
    Lookup(#[from] LookupError),

    #[error(transparent)]
    /// The owner did not answer.
    Request(#[from] RequestError),

    #[error("Key {0} already holds a value")]
    KeyExists(Id),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_if_absent_keeps_first_value() {
        let store = LocalStore::new();

        assert!(store.insert_if_absent(Id(25), "first".to_string()));
        assert!(!store.insert_if_absent(Id(25), "second".to_string()));

        assert_eq!(store.get(&Id(25)), Some("first".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_value_is_not_missing() {
        let store = LocalStore::new();
        store.insert_if_absent(Id(1), String::new());

        assert_eq!(store.get(&Id(1)), Some(String::new()));
        assert_eq!(store.get(&Id(2)), None);
    }

    #[test]
    fn entries_snapshot() {
        let store = LocalStore::new();
        store.insert_if_absent(Id(1), "a".to_string());
        store.insert_if_absent(Id(2), "b".to_string());

        let mut entries = store.entries();
        entries.sort();

        assert_eq!(
            entries,
            vec![(Id(1), "a".to_string()), (Id(2), "b".to_string())]
        );
    }
}
