//! Error types for store proof verification

/// Errors raised while decoding or verifying store proofs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreProofError {
    /// The root recomputed from the proof differs from the trusted root.
    #[error(
        "root mismatch: expected {}, computed {}",
        hex::encode(expected),
        hex::encode(computed)
    )]
    RootMismatch {
        /// The trusted root
        expected: Vec<u8>,
        /// The root implied by the proof
        computed: Vec<u8>,
    },

    /// The committed store list has no entry for the store.
    #[error("store `{0}` not found in commit info")]
    StoreNotFound(String),

    /// The ICS23 proof does not prove the claimed key and value.
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// The proof could not be decoded or is structurally unusable.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
}
