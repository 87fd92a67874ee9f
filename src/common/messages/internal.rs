use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTMessage {
    #[serde(rename = "t", with = "serde_bytes")]
    pub transaction_id: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "v", with = "serde_bytes")]
    pub version: Option<Vec<u8>>,

    #[serde(flatten)]
    pub variant: DHTMessageVariant,
}

impl DHTMessage {
    pub fn from_bytes(bytes: &[u8]) -> Result<DHTMessage, serde_bencode::Error> {
        let obj = serde_bencode::from_bytes(bytes)?;
        Ok(obj)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_bencode::Error> {
        serde_bencode::to_bytes(self)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
/// Just enough of a message to answer it when the rest does not decode.
pub struct DHTMessageHeader {
    #[serde(rename = "t", with = "serde_bytes")]
    pub transaction_id: Vec<u8>,

    #[serde(rename = "y")]
    pub message_type: String,

    #[serde(default, rename = "q")]
    pub method: Option<String>,
}

impl DHTMessageHeader {
    pub fn from_bytes(bytes: &[u8]) -> Result<DHTMessageHeader, serde_bencode::Error> {
        serde_bencode::from_bytes(bytes)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "y")]
pub enum DHTMessageVariant {
    #[serde(rename = "q")]
    Request(DHTRequestSpecific),

    #[serde(rename = "r")]
    Response(DHTResponseSpecific),

    #[serde(rename = "e")]
    Error(DHTErrorSpecific),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "q")]
pub enum DHTRequestSpecific {
    #[serde(rename = "ping")]
    Ping {
        #[serde(rename = "a")]
        arguments: DHTNoArguments,
    },

    #[serde(rename = "find_successor")]
    FindSuccessor {
        #[serde(rename = "a")]
        arguments: DHTFindSuccessorRequestArguments,
    },

    #[serde(rename = "get_predecessor")]
    GetPredecessor {
        #[serde(rename = "a")]
        arguments: DHTNoArguments,
    },

    #[serde(rename = "notify")]
    Notify {
        #[serde(rename = "a")]
        arguments: DHTNodeArguments,
    },

    #[serde(rename = "get_successor_list")]
    GetSuccessorList {
        #[serde(rename = "a")]
        arguments: DHTNoArguments,
    },

    #[serde(rename = "set_predecessor")]
    SetPredecessor {
        #[serde(rename = "a")]
        arguments: DHTOptionalNodeArguments,
    },

    #[serde(rename = "set_successor")]
    SetSuccessor {
        #[serde(rename = "a")]
        arguments: DHTNodeArguments,
    },

    #[serde(rename = "add_key")]
    AddKey {
        #[serde(rename = "a")]
        arguments: DHTAddKeyRequestArguments,
    },

    #[serde(rename = "find_key")]
    FindKey {
        #[serde(rename = "a")]
        arguments: DHTKeyArguments,
    },

    #[serde(rename = "replicate_key")]
    ReplicateKey {
        #[serde(rename = "a")]
        arguments: DHTReplicateKeyRequestArguments,
    },
}

/// Responses are tagged with the method they answer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "q")]
pub enum DHTResponseSpecific {
    #[serde(rename = "ping")]
    Ping {
        #[serde(rename = "r")]
        arguments: DHTPingResponseArguments,
    },

    #[serde(rename = "find_successor")]
    FindSuccessor {
        #[serde(rename = "r")]
        arguments: DHTNodeArguments,
    },

    #[serde(rename = "get_predecessor")]
    GetPredecessor {
        #[serde(rename = "r")]
        arguments: DHTOptionalNodeArguments,
    },

    #[serde(rename = "get_successor_list")]
    GetSuccessorList {
        #[serde(rename = "r")]
        arguments: DHTNodesArguments,
    },

    #[serde(rename = "add_key")]
    AddKey {
        #[serde(rename = "r")]
        arguments: DHTKeyArguments,
    },

    #[serde(rename = "find_key")]
    FindKey {
        #[serde(rename = "r")]
        arguments: DHTFindKeyResponseArguments,
    },

    #[serde(rename = "replicate_key")]
    ReplicateKey {
        #[serde(rename = "r")]
        arguments: DHTReplicateKeyResponseArguments,
    },

    #[serde(rename = "ack")]
    Ack {
        #[serde(rename = "r")]
        arguments: DHTNoArguments,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTErrorSpecific {
    #[serde(rename = "e")]
    pub error_info: (i32, String),
}

// === Shared ===

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DHTNoArguments {}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTNode {
    #[serde(rename = "host")]
    pub host: String,

    #[serde(rename = "port")]
    pub port: u16,

    #[serde(rename = "id", with = "serde_bytes")]
    pub id: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTNodeArguments {
    #[serde(rename = "node")]
    pub node: DHTNode,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTOptionalNodeArguments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "node")]
    pub node: Option<DHTNode>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTNodesArguments {
    #[serde(rename = "nodes")]
    pub nodes: Vec<DHTNode>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTKeyArguments {
    #[serde(rename = "key", with = "serde_bytes")]
    pub key: Vec<u8>,
}

// === PING ===

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTPingResponseArguments {
    #[serde(rename = "port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "successor")]
    pub successor: Option<DHTNode>,
}

// === FIND_SUCCESSOR ===

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTFindSuccessorRequestArguments {
    #[serde(rename = "id", with = "serde_bytes")]
    pub id: Vec<u8>,

    #[serde(rename = "hops")]
    pub hops: u8,
}

// === ADD_KEY ===

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTAddKeyRequestArguments {
    #[serde(rename = "value")]
    pub value: String,
}

// === FIND_KEY ===

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTFindKeyResponseArguments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "value")]
    pub value: Option<String>,
}

// === REPLICATE_KEY ===

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTReplicateKeyRequestArguments {
    #[serde(rename = "key", with = "serde_bytes")]
    pub key: Vec<u8>,

    #[serde(rename = "value")]
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTReplicateKeyResponseArguments {
    #[serde(rename = "stored")]
    pub stored: i32,
}
