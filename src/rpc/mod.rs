//! Chord RPC: the transport collaborator and a typed proxy over it.

pub mod config;
mod local;
mod peer;
pub(crate) mod socket;

use std::fmt::Debug;
use std::sync::Arc;

use crate::common::{ErrorSpecific, Node, RequestSpecific, ResponseSpecific};

pub use config::Config;
pub use local::LocalNetwork;
pub use peer::Peer;
pub use socket::{IncomingRequest, RpcSocket, DEFAULT_REQUEST_TIMEOUT};

/// Performs a single request/response exchange with a remote node.
///
/// Implementations are expected to bound every call with a timeout, so a hung peer fails the
/// call instead of stalling the caller.
pub trait Transport: Send + Sync + Debug {
    fn request(&self, to: &Node, request: RequestSpecific)
        -> Result<ResponseSpecific, RequestError>;
}

/// Answers requests addressed to a node, implemented by [crate::Chord].
pub trait RequestHandler: Send + Sync + Debug {
    fn handle_request(&self, request: RequestSpecific) -> Result<ResponseSpecific, ErrorSpecific>;
}

#[derive(Debug, Clone)]
/// [Transport] over the UDP [RpcSocket].
pub struct UdpTransport {
    socket: Arc<RpcSocket>,
}

impl UdpTransport {
    pub fn new(socket: Arc<RpcSocket>) -> Self {
        UdpTransport { socket }
    }

    pub fn socket(&self) -> &Arc<RpcSocket> {
        &self.socket
    }
}

impl Transport for UdpTransport {
    fn request(
        &self,
        to: &Node,
        request: RequestSpecific,
    ) -> Result<ResponseSpecific, RequestError> {
        let address = to.socket_addr()?;

        self.socket.request(address, request)
    }
}

#[derive(thiserror::Error, Debug)]
/// Failure of a single remote call.
pub enum RequestError {
    /// No response within the request timeout.
    #[error("Request timed out")]
    Timeout,

    /// The remote node answered with an error message.
    #[error("Error response {}: {}", .0.code, .0.description)]
    ErrorResponse(ErrorSpecific),

    /// The response does not answer the request that was sent.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(&'static str),

    /// The node is not known to, or cut off from, the transport.
    #[error("Node {0} is unreachable")]
    Unreachable(Node),

    #[error(transparent)]
    /// Transparent [std::io::Error]
    IO(#[from] std::io::Error),

    /// Encoding or address resolution failed.
    #[error(transparent)]
    Message(#[from] crate::Error),
}
