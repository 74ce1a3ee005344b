//! The crate that contains the node client interface used by the verified query pipeline,
//! together with its `tendermint-rpc` HTTP implementation.
#![deny(clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

pub mod error;
pub mod http;

use async_trait::async_trait;
use tendermint::merkle::proof::ProofOps;
use tendermint_light_client_verifier::types::LightBlock;

pub use error::NodeClientError;
pub use http::HttpNodeClient;

/// The response envelope of a single ABCI query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbciQueryResponse {
    /// Application response code, `0` means success.
    pub code: u32,
    /// Diagnostic log returned by the application.
    pub log: String,
    /// Namespace of `code`.
    pub codespace: String,
    /// Key echoed back by the node.
    pub key: Vec<u8>,
    /// Raw value stored under the key, empty when absent.
    pub value: Vec<u8>,
    /// Merkle proof operations, only present when a proof was requested.
    pub proof: Option<ProofOps>,
    /// Height the query was answered at.
    pub height: u64,
}

impl AbciQueryResponse {
    /// Whether the application reported success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Transport to a single, untrusted full node.
///
/// Implementations only move bytes; nothing returned from here is trusted by the
/// verification pipeline.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Runs an ABCI query at `path` with `key`, optionally pinned to `height`.
    ///
    /// `prove` asks the node to attach merkle proof operations to the response.
    ///
    /// # Errors
    /// Returns an error if the transport fails. An application level failure is reported
    /// through [`AbciQueryResponse::code`] instead.
    async fn abci_query(
        &self,
        path: &str,
        key: &[u8],
        height: Option<u64>,
        prove: bool,
    ) -> Result<AbciQueryResponse, NodeClientError>;

    /// Fetches the signed header and validator sets at `height`.
    ///
    /// # Errors
    /// Returns [`NodeClientError::HeightNotFound`] if the node has no block at `height`.
    async fn light_block(&self, height: u64) -> Result<LightBlock, NodeClientError>;
}

#[async_trait]
impl<T: NodeClient + ?Sized> NodeClient for std::sync::Arc<T> {
    async fn abci_query(
        &self,
        path: &str,
        key: &[u8],
        height: Option<u64>,
        prove: bool,
    ) -> Result<AbciQueryResponse, NodeClientError> {
        (**self).abci_query(path, key, height, prove).await
    }

    async fn light_block(&self, height: u64) -> Result<LightBlock, NodeClientError> {
        (**self).light_block(height).await
    }
}
