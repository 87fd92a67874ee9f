#![doc = include_str!("../README.md")]

// Public modules
mod chord;
mod common;
mod error;
pub mod rpc;
mod testnet;

pub use crate::chord::{
    Chord, ChordBuilder, FingerRefresher, JoinError, LocalStore, LookupError, ProbeError,
    RejoinWatchdog, StoreError,
};
pub use crate::common::{
    messages, Finger, FingerTable, Id, IdSpace, Node, SuccessorList, SUCCESSOR_LIST_SIZE,
};
pub use error::{Error, Result};
pub use testnet::Testnet;
