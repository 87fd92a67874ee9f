//! Struct and implementation of a ring member's identity.
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::net::{SocketAddr, ToSocketAddrs};

use crate::common::{Id, IdSpace};
use crate::{Error, Result};

#[derive(Debug, Clone)]
/// Identity of a ring member.
///
/// Equality, ordering and hashing only consider the [Id]: two descriptors with the same id
/// are the same node.
pub struct Node {
    host: String,
    port: u16,
    id: Id,
}

impl Node {
    /// Creates a new Node, deriving its id from `"host:port"`.
    pub fn new(host: &str, port: u16, space: &IdSpace) -> Node {
        let id = space.hash(format!("{host}:{port}"));

        Node {
            host: host.to_string(),
            port,
            id,
        }
    }

    /// Creates a new Node with an explicit id.
    pub fn with_id(host: &str, port: u16, id: Id) -> Node {
        Node {
            host: host.to_string(),
            port,
            id,
        }
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolves `host:port` to the first matching socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::UnresolvedHost(self.host.clone()))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.host, self.port, self.id)
    }
}
