//! Error types for VeilRoute

use thiserror::Error;

use crate::types::NodeId;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// VeilRoute protocol error types
#[derive(Debug, Error)]
pub enum Error {
    /// Directory holds fewer candidates than a circuit needs
    #[error("directory has {available} nodes, a circuit needs 3")]
    InsufficientNodes { available: usize },

    /// A required public or private key is absent or undecodable
    #[error("missing key material: {0}")]
    MissingKeyMaterial(String),

    /// `role_base + id` does not fit the role's slice of the port space
    #[error("{role} id {id} is outside the {role} address range")]
    AddressOutOfRange { role: &'static str, id: NodeId },

    /// Envelope too short to contain the fixed-length key block
    #[error("malformed envelope: {len} chars, need at least {need}")]
    MalformedEnvelope { len: usize, need: usize },

    /// AEAD encryption failed
    #[error("encryption failed")]
    Encryption,

    /// Cryptographic failure: wrong key or corrupted ciphertext
    #[error("decryption failed")]
    Decryption,

    /// Destination field is not 10 decimal digits inside the address space
    #[error("invalid destination field: {0:?}")]
    InvalidDestinationFormat(String),
}
