use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use flume::Sender;

use crate::common::MessageType;

#[derive(Debug, Clone)]
pub struct InflightRequest {
    pub transaction_id: u16,
    pub to: SocketAddr,
    pub sent_at: Instant,
    /// Where the caller waits for the response.
    pub sender: Sender<MessageType>,
}

impl InflightRequest {
    pub fn does_match(&self, socket: &SocketAddr, tid: u16) -> bool {
        if self.transaction_id != tid {
            return false;
        }

        if self.to.port() != socket.port() {
            return false;
        }

        // Same as SocketAddr::eq but ignores the ip if it is unspecified for testing reasons.
        if self.to.ip().is_unspecified() {
            return true;
        }

        self.to.ip() == socket.ip()
    }
}

#[derive(Debug, Default)]
pub struct InflightRequests {
    next_tid: u16,
    requests: HashMap<u16, InflightRequest>,
}

impl InflightRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request to `to` and return its transaction_id.
    pub fn add(&mut self, to: SocketAddr, sender: Sender<MessageType>) -> u16 {
        let mut transaction_id = self.tid();

        // Skip ids still waiting for a response, unlikely unless 65535 requests are pending.
        while self.requests.contains_key(&transaction_id) {
            transaction_id = self.tid();
        }

        self.requests.insert(
            transaction_id,
            InflightRequest {
                transaction_id,
                to,
                sent_at: Instant::now(),
                sender,
            },
        );

        transaction_id
    }

    /// Remove inflight request by transaction_id if it exists and matches the address
    pub fn remove_matching(
        &mut self,
        transaction_id: u16,
        from: &SocketAddr,
    ) -> Option<InflightRequest> {
        if !self.requests.get(&transaction_id)?.does_match(from, transaction_id) {
            return None;
        }

        self.requests.remove(&transaction_id)
    }

    /// Forget a request regardless of where a response would come from.
    pub fn remove(&mut self, transaction_id: u16) -> Option<InflightRequest> {
        self.requests.remove(&transaction_id)
    }

    /// Drop requests older than `timeout`.
    pub fn cleanup(&mut self, timeout: Duration) {
        self.requests
            .retain(|_, request| request.sent_at.elapsed() < timeout);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Increments self.next_tid and returns the previous value.
    fn tid(&mut self) -> u16 {
        let tid = self.next_tid;
        self.next_tid = self.next_tid.wrapping_add(1);
        tid
    }
}
