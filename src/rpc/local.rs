//! In-process transport, connecting nodes living in the same process.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::common::{Id, Node, RequestSpecific, ResponseSpecific};

use super::{RequestError, RequestHandler, Transport};

#[derive(Debug, Default)]
struct State {
    handlers: HashMap<Id, Arc<dyn RequestHandler>>,
    unreachable: HashSet<Id>,
}

#[derive(Debug, Default, Clone)]
/// A [Transport] that delivers requests by calling the addressed node's handler directly.
///
/// Useful to run many nodes in one process, and to simulate failures with
/// [LocalNetwork::set_reachable]. Registered handlers live as long as the network.
pub struct LocalNetwork {
    state: Arc<RwLock<State>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `node` reachable through this network.
    pub fn register(&self, node: &Node, handler: Arc<dyn RequestHandler>) {
        let mut state = self.state.write();

        state.handlers.insert(*node.id(), handler);
        state.unreachable.remove(node.id());
    }

    /// Forget `node` entirely.
    pub fn remove(&self, node: &Node) {
        let mut state = self.state.write();

        state.handlers.remove(node.id());
        state.unreachable.remove(node.id());
    }

    /// Cut `node` off the network, or bring it back. Requests to an unreachable node fail
    /// as if it crashed.
    pub fn set_reachable(&self, node: &Node, reachable: bool) {
        let mut state = self.state.write();

        if reachable {
            state.unreachable.remove(node.id());
        } else {
            state.unreachable.insert(*node.id());
        }
    }

    pub fn is_reachable(&self, node: &Node) -> bool {
        let state = self.state.read();

        state.handlers.contains_key(node.id()) && !state.unreachable.contains(node.id())
    }
}

impl Transport for LocalNetwork {
    fn request(
        &self,
        to: &Node,
        request: RequestSpecific,
    ) -> Result<ResponseSpecific, RequestError> {
        let handler = {
            let state = self.state.read();

            if state.unreachable.contains(to.id()) {
                None
            } else {
                state.handlers.get(to.id()).cloned()
            }
        };

        let Some(handler) = handler else {
            trace!(?to, method = request.method(), "Request to unreachable node");
            return Err(RequestError::Unreachable(to.clone()));
        };

        handler
            .handle_request(request)
            .map_err(RequestError::ErrorResponse)
    }
}
