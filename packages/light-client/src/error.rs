//! Error types for header certification

use verified_query_node_client::NodeClientError;

/// Errors returned while certifying a header.
#[derive(Debug, thiserror::Error)]
pub enum LightClientError {
    /// The network has no header at the requested height.
    #[error("no commit found at height {0}")]
    CommitNotFound(u64),

    /// The header failed signature, quorum or chain-link verification.
    #[error("header verification failed at height {height}: {reason}")]
    HeaderVerificationFailed {
        /// Height of the rejected header
        height: u64,
        /// Reason for error
        reason: String,
    },

    /// Height zero or a height that does not fit a block height.
    #[error("invalid height {0}")]
    InvalidHeight(u64),

    /// The target is too far below the trusted checkpoint to walk back to.
    #[error(
        "height {target} is {distance} blocks below trusted height {trusted}, more than the allowed {max}"
    )]
    BackwardDistanceExceeded {
        /// Requested height
        target: u64,
        /// Height of the trusted checkpoint
        trusted: u64,
        /// `trusted - target`
        distance: u64,
        /// Configured maximum
        max: u64,
    },

    /// The node failed for a reason other than a missing height.
    #[error("node error: {0}")]
    Node(#[source] NodeClientError),
}

impl From<NodeClientError> for LightClientError {
    fn from(err: NodeClientError) -> Self {
        match err {
            NodeClientError::HeightNotFound(height) => Self::CommitNotFound(height),
            NodeClientError::InvalidHeight(height) => Self::InvalidHeight(height),
            other => Self::Node(other),
        }
    }
}
