//! Serialize and deserialize Chord RPC messages.

mod internal;

use crate::common::{Id, Node};
use crate::{Error, Result};

#[derive(Debug, PartialEq, Clone)]
pub struct Message {
    pub transaction_id: u16,

    /// The version of the requester or responder.
    pub version: Option<Vec<u8>>,

    pub message_type: MessageType,
}

#[derive(Debug, PartialEq, Clone)]
pub enum MessageType {
    Request(RequestSpecific),

    Response(ResponseSpecific),

    Error(ErrorSpecific),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ErrorSpecific {
    pub code: i32,
    pub description: String,
}

/// Generic server error.
pub const ERROR_GENERIC: i32 = 201;
/// The responder could not resolve a lookup on behalf of the requester.
pub const ERROR_LOOKUP_FAILED: i32 = 202;
/// `add_key` for a key the owner already stores.
pub const ERROR_KEY_EXISTS: i32 = 203;
/// Unknown or malformed method.
pub const ERROR_METHOD_UNKNOWN: i32 = 204;

#[derive(Debug, PartialEq, Clone)]
pub enum RequestSpecific {
    /// Liveness probe.
    Ping,
    FindSuccessor(FindSuccessorRequestArguments),
    GetPredecessor,
    Notify(NodeArguments),
    GetSuccessorList,
    SetPredecessor(OptionalNodeArguments),
    SetSuccessor(NodeArguments),
    AddKey(AddKeyRequestArguments),
    FindKey(KeyArguments),
    ReplicateKey(ReplicateKeyRequestArguments),
}

impl RequestSpecific {
    /// Method name as it appears on the wire.
    pub fn method(&self) -> &'static str {
        match self {
            RequestSpecific::Ping => "ping",
            RequestSpecific::FindSuccessor(_) => "find_successor",
            RequestSpecific::GetPredecessor => "get_predecessor",
            RequestSpecific::Notify(_) => "notify",
            RequestSpecific::GetSuccessorList => "get_successor_list",
            RequestSpecific::SetPredecessor(_) => "set_predecessor",
            RequestSpecific::SetSuccessor(_) => "set_successor",
            RequestSpecific::AddKey(_) => "add_key",
            RequestSpecific::FindKey(_) => "find_key",
            RequestSpecific::ReplicateKey(_) => "replicate_key",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ResponseSpecific {
    Ping(PingResponseArguments),
    FindSuccessor(NodeArguments),
    GetPredecessor(OptionalNodeArguments),
    GetSuccessorList(NodesArguments),
    AddKey(KeyArguments),
    FindKey(FindKeyResponseArguments),
    ReplicateKey(ReplicateKeyResponseArguments),
    /// Acknowledges `notify`, `set_predecessor` and `set_successor`.
    Ack,
}

// === Shared ===

#[derive(Debug, PartialEq, Clone)]
pub struct NodeArguments {
    pub node: Node,
}

#[derive(Debug, PartialEq, Clone)]
pub struct OptionalNodeArguments {
    pub node: Option<Node>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NodesArguments {
    pub nodes: Vec<Node>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct KeyArguments {
    pub key: Id,
}

// === PING ===

#[derive(Debug, PartialEq, Clone)]
pub struct PingResponseArguments {
    pub port: u16,
    /// Absent until the responder joined a ring.
    pub successor: Option<Node>,
}

// === FIND_SUCCESSOR ===

#[derive(Debug, PartialEq, Clone)]
pub struct FindSuccessorRequestArguments {
    pub id: Id,
    /// Number of nodes this lookup already went through.
    pub hops: u8,
}

// === ADD_KEY ===

#[derive(Debug, PartialEq, Clone)]
pub struct AddKeyRequestArguments {
    pub value: String,
}

// === FIND_KEY ===

#[derive(Debug, PartialEq, Clone)]
pub struct FindKeyResponseArguments {
    /// `None` means the owner has no value for this key.
    pub value: Option<String>,
}

// === REPLICATE_KEY ===

#[derive(Debug, PartialEq, Clone)]
pub struct ReplicateKeyRequestArguments {
    pub key: Id,
    pub value: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReplicateKeyResponseArguments {
    /// Whether the key was absent and got stored.
    pub stored: bool,
}

impl Message {
    fn into_serde_message(self) -> internal::DHTMessage {
        internal::DHTMessage {
            transaction_id: self.transaction_id.to_be_bytes().to_vec(),
            version: self.version,
            variant: match self.message_type {
                MessageType::Request(request) => {
                    internal::DHTMessageVariant::Request(match request {
                        RequestSpecific::Ping => internal::DHTRequestSpecific::Ping {
                            arguments: internal::DHTNoArguments::default(),
                        },
                        RequestSpecific::FindSuccessor(args) => {
                            internal::DHTRequestSpecific::FindSuccessor {
                                arguments: internal::DHTFindSuccessorRequestArguments {
                                    id: args.id.to_vec(),
                                    hops: args.hops,
                                },
                            }
                        }
                        RequestSpecific::GetPredecessor => {
                            internal::DHTRequestSpecific::GetPredecessor {
                                arguments: internal::DHTNoArguments::default(),
                            }
                        }
                        RequestSpecific::Notify(args) => internal::DHTRequestSpecific::Notify {
                            arguments: internal::DHTNodeArguments {
                                node: node_to_serde(&args.node),
                            },
                        },
                        RequestSpecific::GetSuccessorList => {
                            internal::DHTRequestSpecific::GetSuccessorList {
                                arguments: internal::DHTNoArguments::default(),
                            }
                        }
                        RequestSpecific::SetPredecessor(args) => {
                            internal::DHTRequestSpecific::SetPredecessor {
                                arguments: internal::DHTOptionalNodeArguments {
                                    node: args.node.as_ref().map(node_to_serde),
                                },
                            }
                        }
                        RequestSpecific::SetSuccessor(args) => {
                            internal::DHTRequestSpecific::SetSuccessor {
                                arguments: internal::DHTNodeArguments {
                                    node: node_to_serde(&args.node),
                                },
                            }
                        }
                        RequestSpecific::AddKey(args) => internal::DHTRequestSpecific::AddKey {
                            arguments: internal::DHTAddKeyRequestArguments { value: args.value },
                        },
                        RequestSpecific::FindKey(args) => internal::DHTRequestSpecific::FindKey {
                            arguments: internal::DHTKeyArguments {
                                key: args.key.to_vec(),
                            },
                        },
                        RequestSpecific::ReplicateKey(args) => {
                            internal::DHTRequestSpecific::ReplicateKey {
                                arguments: internal::DHTReplicateKeyRequestArguments {
                                    key: args.key.to_vec(),
                                    value: args.value,
                                },
                            }
                        }
                    })
                }

                MessageType::Response(response) => {
                    internal::DHTMessageVariant::Response(match response {
                        ResponseSpecific::Ping(args) => internal::DHTResponseSpecific::Ping {
                            arguments: internal::DHTPingResponseArguments {
                                port: args.port,
                                successor: args.successor.as_ref().map(node_to_serde),
                            },
                        },
                        ResponseSpecific::FindSuccessor(args) => {
                            internal::DHTResponseSpecific::FindSuccessor {
                                arguments: internal::DHTNodeArguments {
                                    node: node_to_serde(&args.node),
                                },
                            }
                        }
                        ResponseSpecific::GetPredecessor(args) => {
                            internal::DHTResponseSpecific::GetPredecessor {
                                arguments: internal::DHTOptionalNodeArguments {
                                    node: args.node.as_ref().map(node_to_serde),
                                },
                            }
                        }
                        ResponseSpecific::GetSuccessorList(args) => {
                            internal::DHTResponseSpecific::GetSuccessorList {
                                arguments: internal::DHTNodesArguments {
                                    nodes: args.nodes.iter().map(node_to_serde).collect(),
                                },
                            }
                        }
                        ResponseSpecific::AddKey(args) => internal::DHTResponseSpecific::AddKey {
                            arguments: internal::DHTKeyArguments {
                                key: args.key.to_vec(),
                            },
                        },
                        ResponseSpecific::FindKey(args) => internal::DHTResponseSpecific::FindKey {
                            arguments: internal::DHTFindKeyResponseArguments { value: args.value },
                        },
                        ResponseSpecific::ReplicateKey(args) => {
                            internal::DHTResponseSpecific::ReplicateKey {
                                arguments: internal::DHTReplicateKeyResponseArguments {
                                    stored: i32::from(args.stored),
                                },
                            }
                        }
                        ResponseSpecific::Ack => internal::DHTResponseSpecific::Ack {
                            arguments: internal::DHTNoArguments::default(),
                        },
                    })
                }

                MessageType::Error(err) => {
                    internal::DHTMessageVariant::Error(internal::DHTErrorSpecific {
                        error_info: (err.code, err.description),
                    })
                }
            },
        }
    }

    fn from_serde_message(msg: internal::DHTMessage) -> Result<Message> {
        Ok(Message {
            transaction_id: transaction_id(msg.transaction_id)?,
            version: msg.version,
            message_type: match msg.variant {
                internal::DHTMessageVariant::Request(request) => {
                    MessageType::Request(match request {
                        internal::DHTRequestSpecific::Ping { .. } => RequestSpecific::Ping,
                        internal::DHTRequestSpecific::FindSuccessor { arguments } => {
                            RequestSpecific::FindSuccessor(FindSuccessorRequestArguments {
                                id: Id::from_bytes(arguments.id)?,
                                hops: arguments.hops,
                            })
                        }
                        internal::DHTRequestSpecific::GetPredecessor { .. } => {
                            RequestSpecific::GetPredecessor
                        }
                        internal::DHTRequestSpecific::Notify { arguments } => {
                            RequestSpecific::Notify(NodeArguments {
                                node: node_from_serde(arguments.node)?,
                            })
                        }
                        internal::DHTRequestSpecific::GetSuccessorList { .. } => {
                            RequestSpecific::GetSuccessorList
                        }
                        internal::DHTRequestSpecific::SetPredecessor { arguments } => {
                            RequestSpecific::SetPredecessor(OptionalNodeArguments {
                                node: arguments.node.map(node_from_serde).transpose()?,
                            })
                        }
                        internal::DHTRequestSpecific::SetSuccessor { arguments } => {
                            RequestSpecific::SetSuccessor(NodeArguments {
                                node: node_from_serde(arguments.node)?,
                            })
                        }
                        internal::DHTRequestSpecific::AddKey { arguments } => {
                            RequestSpecific::AddKey(AddKeyRequestArguments {
                                value: arguments.value,
                            })
                        }
                        internal::DHTRequestSpecific::FindKey { arguments } => {
                            RequestSpecific::FindKey(KeyArguments {
                                key: Id::from_bytes(arguments.key)?,
                            })
                        }
                        internal::DHTRequestSpecific::ReplicateKey { arguments } => {
                            RequestSpecific::ReplicateKey(ReplicateKeyRequestArguments {
                                key: Id::from_bytes(arguments.key)?,
                                value: arguments.value,
                            })
                        }
                    })
                }

                internal::DHTMessageVariant::Response(response) => {
                    MessageType::Response(match response {
                        internal::DHTResponseSpecific::Ping { arguments } => {
                            ResponseSpecific::Ping(PingResponseArguments {
                                port: arguments.port,
                                successor: arguments.successor.map(node_from_serde).transpose()?,
                            })
                        }
                        internal::DHTResponseSpecific::FindSuccessor { arguments } => {
                            ResponseSpecific::FindSuccessor(NodeArguments {
                                node: node_from_serde(arguments.node)?,
                            })
                        }
                        internal::DHTResponseSpecific::GetPredecessor { arguments } => {
                            ResponseSpecific::GetPredecessor(OptionalNodeArguments {
                                node: arguments.node.map(node_from_serde).transpose()?,
                            })
                        }
                        internal::DHTResponseSpecific::GetSuccessorList { arguments } => {
                            ResponseSpecific::GetSuccessorList(NodesArguments {
                                nodes: arguments
                                    .nodes
                                    .into_iter()
                                    .map(node_from_serde)
                                    .collect::<Result<Vec<_>>>()?,
                            })
                        }
                        internal::DHTResponseSpecific::AddKey { arguments } => {
                            ResponseSpecific::AddKey(KeyArguments {
                                key: Id::from_bytes(arguments.key)?,
                            })
                        }
                        internal::DHTResponseSpecific::FindKey { arguments } => {
                            ResponseSpecific::FindKey(FindKeyResponseArguments {
                                value: arguments.value,
                            })
                        }
                        internal::DHTResponseSpecific::ReplicateKey { arguments } => {
                            ResponseSpecific::ReplicateKey(ReplicateKeyResponseArguments {
                                stored: arguments.stored != 0,
                            })
                        }
                        internal::DHTResponseSpecific::Ack { .. } => ResponseSpecific::Ack,
                    })
                }

                internal::DHTMessageVariant::Error(err) => MessageType::Error(ErrorSpecific {
                    code: err.error_info.0,
                    description: err.error_info.1,
                }),
            },
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.clone().into_serde_message().to_bytes().map_err(Error::from)
    }

    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Message> {
        Message::from_serde_message(internal::DHTMessage::from_bytes(bytes.as_ref())?)
    }
}

/// For a request that fails to decode, return its transaction id and method name, so it can be
/// answered with [ERROR_METHOD_UNKNOWN].
pub fn undecodable_request<T: AsRef<[u8]>>(bytes: T) -> Option<(u16, String)> {
    let header = internal::DHTMessageHeader::from_bytes(bytes.as_ref()).ok()?;

    if header.message_type != "q" {
        return None;
    }

    let transaction_id = transaction_id(header.transaction_id).ok()?;

    Some((transaction_id, header.method.unwrap_or_default()))
}

// Return the transaction Id as a u16
pub fn transaction_id(bytes: Vec<u8>) -> Result<u16> {
    if bytes.len() == 2 {
        return Ok(((bytes[0] as u16) << 8) + (bytes[1] as u16));
    } else if bytes.len() == 4 {
        return Ok(((bytes[2] as u16) << 8) + (bytes[3] as u16));
    }

    Err(Error::InvalidTransactionId(bytes))
}

fn node_to_serde(node: &Node) -> internal::DHTNode {
    internal::DHTNode {
        host: node.host().to_string(),
        port: node.port(),
        id: node.id().to_vec(),
    }
}

fn node_from_serde(node: internal::DHTNode) -> Result<Node> {
    let id = Id::from_bytes(&node.id)?;

    Ok(Node::with_id(&node.host, node.port, id))
}
