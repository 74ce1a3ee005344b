//! Error types for verified queries

use verified_query_light_client::LightClientError;
use verified_query_node_client::NodeClientError;
use verified_query_store_proofs::StoreProofError;

/// Errors returned by [`crate::QueryClient`].
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The path is not of the form `/queryType/storeName/subpath`.
    #[error("invalid query path `{0}`")]
    InvalidPath(String),

    /// The subpath has no known proof classification.
    #[error("unsupported query subpath `{0}`")]
    UnsupportedSubpath(String),

    /// The node answered with a non-zero application code.
    #[error("remote query failed with code {code}: {log}")]
    RemoteQueryFailed {
        /// Application response code
        code: u32,
        /// Diagnostic log of the node
        log: String,
    },

    /// The node could not be reached or returned garbage.
    #[error("node error: {0}")]
    Node(#[from] NodeClientError),

    /// Verified mode was requested without a header certifier.
    #[error("verification requested but no verifier is configured")]
    VerifierNotConfigured,

    /// The response failed verification; its value is discarded.
    #[error("proof verification failed: {0}")]
    ProofVerificationFailed(#[from] VerificationError),

    /// No account is stored under the address.
    #[error("account {} does not exist", hex::encode(.0))]
    AccountNotFound(Vec<u8>),

    /// The account bytes could not be decoded.
    #[error("failed to decode account: {0}")]
    AccountDecode(String),

    /// A subspace result could not be decoded.
    #[error("failed to decode subspace result: {0}")]
    SubspaceDecode(#[source] prost::DecodeError),
}

/// Reasons a query response failed verification.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// The header committing the response could not be certified.
    #[error("header certification failed: {0}")]
    Certification(#[from] LightClientError),

    /// The proof did not tie the value to the certified application state root.
    #[error(transparent)]
    Store(#[from] StoreProofError),

    /// The node sent no proof for a provable query.
    #[error("response carries no proof")]
    MissingProof,

    /// The proof is for a different store than the one queried.
    #[error("proof is for store `{actual}`, queried store is `{expected}`")]
    StoreNameMismatch {
        /// Store named in the query path
        expected: String,
        /// Store named in the proof
        actual: String,
    },

    /// The range proof operation is for a different key than the one queried.
    #[error("proof is for key {}, queried key is {}", hex::encode(.actual), hex::encode(.expected))]
    KeyMismatch {
        /// Queried key
        expected: Vec<u8>,
        /// Key of the range proof operation
        actual: Vec<u8>,
    },

    /// The committed store list is for a different height than the response.
    #[error("store list committed at version {actual}, response is at height {expected}")]
    VersionMismatch {
        /// Height reported by the node
        expected: u64,
        /// Version of the committed store list
        actual: u64,
    },

    /// The node answered at a different height than the one pinned.
    #[error("response height {actual} does not match requested height {expected}")]
    HeightMismatch {
        /// Pinned height
        expected: u64,
        /// Height reported by the node
        actual: u64,
    },

    /// The node reported a height for which no next header can exist.
    #[error("response height {0} cannot be certified")]
    InvalidHeight(u64),
}
