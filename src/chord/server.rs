//! Answering requests from other nodes.

use std::sync::Arc;
use std::thread;

use flume::Receiver;
use tracing::{debug, trace};

use crate::common::{
    AddKeyRequestArguments, ErrorSpecific, FindKeyResponseArguments,
    FindSuccessorRequestArguments, KeyArguments, NodeArguments, NodesArguments,
    OptionalNodeArguments, PingResponseArguments, ReplicateKeyRequestArguments,
    ReplicateKeyResponseArguments, RequestSpecific, ResponseSpecific, ERROR_GENERIC,
    ERROR_KEY_EXISTS, ERROR_LOOKUP_FAILED,
};
use crate::rpc::{IncomingRequest, RequestHandler, RpcSocket};

use super::{Chord, StoreError};

impl RequestHandler for Chord {
    fn handle_request(&self, request: RequestSpecific) -> Result<ResponseSpecific, ErrorSpecific> {
        trace!(local = %self.local(), method = request.method(), "Handling request");

        let response = match request {
            RequestSpecific::Ping => ResponseSpecific::Ping(PingResponseArguments {
                port: self.local().port(),
                successor: self.directory().reported_successor(),
            }),
            RequestSpecific::FindSuccessor(FindSuccessorRequestArguments { id, hops }) => {
                let node = self
                    .find_successor_with_hops(id, hops)
                    .map_err(|error| error_specific(ERROR_LOOKUP_FAILED, error))?;

                ResponseSpecific::FindSuccessor(NodeArguments { node })
            }
            RequestSpecific::GetPredecessor => {
                ResponseSpecific::GetPredecessor(OptionalNodeArguments {
                    node: self.predecessor(),
                })
            }
            RequestSpecific::Notify(NodeArguments { node }) => {
                self.notify(node);

                ResponseSpecific::Ack
            }
            RequestSpecific::GetSuccessorList => {
                ResponseSpecific::GetSuccessorList(NodesArguments {
                    nodes: self.successor_list(),
                })
            }
            RequestSpecific::SetPredecessor(OptionalNodeArguments { node }) => {
                self.directory_mut().set_predecessor(node);

                ResponseSpecific::Ack
            }
            RequestSpecific::SetSuccessor(NodeArguments { node }) => {
                self.directory_mut().set_successor(node);

                ResponseSpecific::Ack
            }
            // The sender already resolved this node as the owner, so it is stored here
            // without another lookup.
            RequestSpecific::AddKey(AddKeyRequestArguments { value }) => {
                let key = self.space().hash(&value);

                match self.store_local(key, &value) {
                    Ok(key) => ResponseSpecific::AddKey(KeyArguments { key }),
                    Err(error @ StoreError::KeyExists(_)) => {
                        return Err(error_specific(ERROR_KEY_EXISTS, error))
                    }
                    Err(error) => return Err(error_specific(ERROR_GENERIC, error)),
                }
            }
            RequestSpecific::FindKey(KeyArguments { key }) => {
                ResponseSpecific::FindKey(FindKeyResponseArguments {
                    value: self.store().get(&key),
                })
            }
            RequestSpecific::ReplicateKey(ReplicateKeyRequestArguments { key, value }) => {
                ResponseSpecific::ReplicateKey(ReplicateKeyResponseArguments {
                    stored: self.replicate_key(key, &value),
                })
            }
        };

        Ok(response)
    }
}

impl Chord {
    /// Answer requests arriving on `socket` until it shuts down.
    ///
    /// Each request gets its own thread, as answering a lookup may wait on a lookup that
    /// comes back to this node.
    pub(crate) fn serve(&self, socket: Arc<RpcSocket>, incoming: Receiver<IncomingRequest>) {
        for IncomingRequest {
            from,
            transaction_id,
            request,
        } in incoming.iter()
        {
            let node = self.clone();
            let socket = socket.clone();

            let spawned = thread::Builder::new()
                .name(format!("chord-request-{transaction_id}"))
                .spawn(move || {
                    let response = node.handle_request(request);
                    socket.respond(from, transaction_id, response);
                });

            if let Err(error) = spawned {
                debug!(?from, %error, "Failed to spawn a request thread");
            }
        }

        debug!(local = %self.local(), "Chord server loop stopped");
    }
}

fn error_specific(code: i32, error: impl std::fmt::Display) -> ErrorSpecific {
    ErrorSpecific {
        code,
        description: error.to_string(),
    }
}
