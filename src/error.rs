//! Main Crate Error

#[derive(thiserror::Error, Debug)]
/// Chord crate error enum.
pub enum Error {
    #[error(transparent)]
    /// Transparent [std::io::Error]
    IO(#[from] std::io::Error),

    #[error("Failed to parse packet bytes: {0}")]
    BencodeError(#[from] serde_bencode::Error),

    /// Indicates that an encoded [crate::Id] is not 8 bytes.
    #[error("Invalid Id size, expected 8, got {0}")]
    InvalidIdSize(usize),

    /// Identifier spaces are between 1 and 64 bits wide.
    #[error("Invalid identifier space of {0} bits, expected 1..=64")]
    InvalidIdBits(u8),

    /// An explicit [crate::Id] does not fit in the identifier space.
    #[error("Id {0} does not fit in {1} bits")]
    IdOutOfSpace(u64, u8),

    /// Indicates that the message transaction_id is not two bytes.
    #[error("Invalid transaction_id: {0:?}")]
    InvalidTransactionId(Vec<u8>),

    /// A known method carried arguments that could not be interpreted.
    #[error("Invalid message: {0}")]
    InvalidMessage(&'static str),

    /// A node's host did not resolve to any socket address.
    #[error("Could not resolve host: {0}")]
    UnresolvedHost(String),

    /// A node of a [crate::Testnet] failed to join.
    #[error(transparent)]
    Join(Box<crate::JoinError>),
}

impl From<crate::JoinError> for Error {
    fn from(error: crate::JoinError) -> Self {
        Error::Join(Box::new(error))
    }
}

/// Alias for `Result<T, chord::Error>`.
pub type Result<T, E = Error> = core::result::Result<T, E>;
