//! Typed proxy for calling a single remote node.

use crate::common::{
    AddKeyRequestArguments, FindKeyResponseArguments, FindSuccessorRequestArguments, Id,
    KeyArguments, Node, NodeArguments, NodesArguments, OptionalNodeArguments,
    PingResponseArguments, ReplicateKeyRequestArguments, ReplicateKeyResponseArguments,
    RequestSpecific, ResponseSpecific,
};

use super::{RequestError, Transport};

#[derive(Debug, Clone, Copy)]
/// A callable handle for `node`, reached through `transport`.
pub struct Peer<'a> {
    transport: &'a dyn Transport,
    node: &'a Node,
}

impl<'a> Peer<'a> {
    pub fn new(transport: &'a dyn Transport, node: &'a Node) -> Self {
        Peer { transport, node }
    }

    pub fn node(&self) -> &Node {
        self.node
    }

    /// Liveness probe.
    pub fn ping(&self) -> Result<PingResponseArguments, RequestError> {
        match self.request(RequestSpecific::Ping)? {
            ResponseSpecific::Ping(arguments) => Ok(arguments),
            _ => Err(RequestError::UnexpectedResponse("ping")),
        }
    }

    pub fn find_successor(&self, id: Id, hops: u8) -> Result<Node, RequestError> {
        let request = RequestSpecific::FindSuccessor(FindSuccessorRequestArguments { id, hops });

        match self.request(request)? {
            ResponseSpecific::FindSuccessor(NodeArguments { node }) => Ok(node),
            _ => Err(RequestError::UnexpectedResponse("find_successor")),
        }
    }

    pub fn get_predecessor(&self) -> Result<Option<Node>, RequestError> {
        match self.request(RequestSpecific::GetPredecessor)? {
            ResponseSpecific::GetPredecessor(OptionalNodeArguments { node }) => Ok(node),
            _ => Err(RequestError::UnexpectedResponse("get_predecessor")),
        }
    }

    /// Tell the remote node that `node` might be its predecessor.
    pub fn notify(&self, node: &Node) -> Result<(), RequestError> {
        let request = RequestSpecific::Notify(NodeArguments { node: node.clone() });

        self.ack(request, "notify")
    }

    pub fn get_successor_list(&self) -> Result<Vec<Node>, RequestError> {
        match self.request(RequestSpecific::GetSuccessorList)? {
            ResponseSpecific::GetSuccessorList(NodesArguments { nodes }) => Ok(nodes),
            _ => Err(RequestError::UnexpectedResponse("get_successor_list")),
        }
    }

    pub fn set_predecessor(&self, node: Option<&Node>) -> Result<(), RequestError> {
        let request = RequestSpecific::SetPredecessor(OptionalNodeArguments {
            node: node.cloned(),
        });

        self.ack(request, "set_predecessor")
    }

    pub fn set_successor(&self, node: &Node) -> Result<(), RequestError> {
        let request = RequestSpecific::SetSuccessor(NodeArguments { node: node.clone() });

        self.ack(request, "set_successor")
    }

    /// Returns the key the value was stored under.
    pub fn add_key(&self, value: &str) -> Result<Id, RequestError> {
        let request = RequestSpecific::AddKey(AddKeyRequestArguments {
            value: value.to_string(),
        });

        match self.request(request)? {
            ResponseSpecific::AddKey(KeyArguments { key }) => Ok(key),
            _ => Err(RequestError::UnexpectedResponse("add_key")),
        }
    }

    pub fn find_key(&self, key: Id) -> Result<Option<String>, RequestError> {
        match self.request(RequestSpecific::FindKey(KeyArguments { key }))? {
            ResponseSpecific::FindKey(FindKeyResponseArguments { value }) => Ok(value),
            _ => Err(RequestError::UnexpectedResponse("find_key")),
        }
    }

    /// Returns whether the remote node stored the value.
    pub fn replicate_key(&self, key: Id, value: &str) -> Result<bool, RequestError> {
        let request = RequestSpecific::ReplicateKey(ReplicateKeyRequestArguments {
            key,
            value: value.to_string(),
        });

        match self.request(request)? {
            ResponseSpecific::ReplicateKey(ReplicateKeyResponseArguments { stored }) => Ok(stored),
            _ => Err(RequestError::UnexpectedResponse("replicate_key")),
        }
    }

    // === Private Methods ===

    fn request(&self, request: RequestSpecific) -> Result<ResponseSpecific, RequestError> {
        self.transport.request(self.node, request)
    }

    fn ack(&self, request: RequestSpecific, method: &'static str) -> Result<(), RequestError> {
        match self.request(request)? {
            ResponseSpecific::Ack => Ok(()),
            _ => Err(RequestError::UnexpectedResponse(method)),
        }
    }
}
