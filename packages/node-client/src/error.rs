//! Error types for the node client

/// Errors raised while talking to a full node.
#[derive(Debug, thiserror::Error)]
pub enum NodeClientError {
    /// The node has no block at the requested height, it is either in the future or pruned.
    #[error("no block available at height {0}")]
    HeightNotFound(u64),

    /// The requested height cannot be represented as a block height.
    #[error("invalid block height {0}")]
    InvalidHeight(u64),

    /// The RPC call itself failed.
    #[error("rpc request failed: {0}")]
    Rpc(#[source] tendermint_rpc::Error),

    /// The node answered with something that cannot be turned into the expected type.
    #[error("invalid node response: {0}")]
    InvalidResponse(String),
}

/// Messages CometBFT uses when a height is above the tip or below the retained base.
const HEIGHT_UNAVAILABLE_MARKERS: [&str; 4] = [
    "must be less than or equal to the current blockchain height",
    "is not available, lowest height is",
    "could not find results for height",
    "could not find validators for height",
];

impl NodeClientError {
    /// Maps an RPC error for a height scoped request, recognising "no block at this height".
    #[must_use]
    pub fn from_rpc_at_height(err: tendermint_rpc::Error, height: u64) -> Self {
        if is_height_unavailable(&err.to_string()) {
            Self::HeightNotFound(height)
        } else {
            Self::Rpc(err)
        }
    }
}

fn is_height_unavailable(message: &str) -> bool {
    HEIGHT_UNAVAILABLE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
