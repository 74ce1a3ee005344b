//! [`NodeClient`] implementation backed by a `tendermint-rpc` [`HttpClient`].

use async_trait::async_trait;
use tendermint::{block::Height, node, validator::Set as ValidatorSet};
use tendermint_light_client_verifier::types::LightBlock;
use tendermint_rpc::{Client, HttpClient, Paging};

use crate::{AbciQueryResponse, NodeClient, NodeClientError};

/// A node client speaking the CometBFT JSON-RPC over HTTP.
#[derive(Clone, Debug)]
pub struct HttpNodeClient {
    rpc: HttpClient,
    peer_id: node::Id,
}

impl HttpNodeClient {
    /// Creates a client from an existing RPC client and the node id light blocks are attributed to.
    #[must_use]
    pub const fn new(rpc: HttpClient, peer_id: node::Id) -> Self {
        Self { rpc, peer_id }
    }

    /// Connects to `rpc_url` and reads the node id from its `/status` endpoint.
    ///
    /// # Errors
    /// Returns an error if the url is invalid or the node cannot be reached.
    pub async fn connect(rpc_url: &str) -> Result<Self, NodeClientError> {
        let rpc = HttpClient::new(rpc_url).map_err(NodeClientError::Rpc)?;
        let status = rpc.status().await.map_err(NodeClientError::Rpc)?;
        tracing::debug!(node_id = %status.node_info.id, network = %status.node_info.network, "connected to node");

        Ok(Self::new(rpc, status.node_info.id))
    }

    /// The underlying RPC client.
    #[must_use]
    pub const fn rpc(&self) -> &HttpClient {
        &self.rpc
    }
}

fn to_block_height(height: u64) -> Result<Height, NodeClientError> {
    Height::try_from(height).map_err(|_| NodeClientError::InvalidHeight(height))
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn abci_query(
        &self,
        path: &str,
        key: &[u8],
        height: Option<u64>,
        prove: bool,
    ) -> Result<AbciQueryResponse, NodeClientError> {
        let height = height.map(to_block_height).transpose()?;
        let resp = self
            .rpc
            .abci_query(Some(path.to_string()), key.to_vec(), height, prove)
            .await
            .map_err(NodeClientError::Rpc)?;

        Ok(AbciQueryResponse {
            code: resp.code.value(),
            log: resp.log,
            codespace: resp.codespace,
            key: resp.key,
            value: resp.value,
            proof: resp.proof,
            height: resp.height.value(),
        })
    }

    async fn light_block(&self, height: u64) -> Result<LightBlock, NodeClientError> {
        let tm_height = to_block_height(height)?;

        let signed_header = self
            .rpc
            .commit(tm_height)
            .await
            .map_err(|e| NodeClientError::from_rpc_at_height(e, height))?
            .signed_header;
        let validators = self
            .rpc
            .validators(tm_height, Paging::All)
            .await
            .map_err(|e| NodeClientError::from_rpc_at_height(e, height))?
            .validators;
        let next_validators = self
            .rpc
            .validators(tm_height.increment(), Paging::All)
            .await
            .map_err(|e| NodeClientError::from_rpc_at_height(e, height + 1))?
            .validators;

        if signed_header.header().height != tm_height {
            return Err(NodeClientError::InvalidResponse(format!(
                "asked for commit at height {height}, got {}",
                signed_header.header().height
            )));
        }

        Ok(LightBlock::new(
            signed_header,
            ValidatorSet::without_proposer(validators),
            ValidatorSet::without_proposer(next_validators),
            self.peer_id,
        ))
    }
}
