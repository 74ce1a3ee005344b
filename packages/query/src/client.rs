//! The query orchestrator.

use prost::Message;
use verified_query_light_client::HeaderCertifier;
use verified_query_node_client::{AbciQueryResponse, NodeClient};
use verified_query_store_proofs::MultiStoreProof;

use crate::{
    context::{QueryContext, TrustMode},
    error::{QueryError, VerificationError},
    path::QueryPath,
    policy::{ProofPolicy, QueryClass, SUBPATH_KEY, SUBPATH_SUBSPACE},
    proto::{Pair, Pairs},
};

/// Runs ABCI queries against an untrusted node and verifies the answers.
pub struct QueryClient<C> {
    node: C,
    policy: ProofPolicy,
}

impl<C: NodeClient> QueryClient<C> {
    /// Creates a client with the default [`ProofPolicy`].
    #[must_use]
    pub fn new(node: C) -> Self {
        Self::with_policy(node, ProofPolicy::default())
    }

    /// Creates a client with a custom [`ProofPolicy`].
    #[must_use]
    pub const fn with_policy(node: C, policy: ProofPolicy) -> Self {
        Self { node, policy }
    }

    /// The node this client talks to.
    #[must_use]
    pub const fn node(&self) -> &C {
        &self.node
    }

    /// The subpath classification in use.
    #[must_use]
    pub const fn policy(&self) -> &ProofPolicy {
        &self.policy
    }

    /// Runs the query at `path` with `key` and returns the value.
    ///
    /// In verified mode a provable response is only returned once its header at
    /// `height + 1` is certified and its proof ties the value to that header's app hash.
    /// An empty value is returned as an absence proven by a non-membership proof.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidPath`] or [`QueryError::UnsupportedSubpath`] before any
    /// network traffic, [`QueryError::RemoteQueryFailed`] when the node reports a failure,
    /// and [`QueryError::ProofVerificationFailed`] when verification fails.
    #[tracing::instrument(skip_all, fields(path = %path, key = %hex::encode(key), height = ?ctx.height, mode = ?ctx.trust_mode))]
    pub async fn query(
        &self,
        path: &str,
        key: &[u8],
        ctx: &QueryContext,
    ) -> Result<Vec<u8>, QueryError> {
        let parsed = QueryPath::parse(path)?;
        let class = match ctx.trust_mode {
            TrustMode::Trusted => QueryClass::Unprovable,
            TrustMode::Verified(_) => self.policy.classify(parsed.subpath)?,
        };

        let response = self
            .node
            .abci_query(path, key, ctx.height, !ctx.trust_mode.is_trusted())
            .await?;
        if !response.is_ok() {
            tracing::debug!(code = response.code, log = %response.log, "node rejected query");
            return Err(QueryError::RemoteQueryFailed {
                code: response.code,
                log: response.log,
            });
        }

        let certifier = match (&ctx.trust_mode, class) {
            (TrustMode::Verified(certifier), QueryClass::Provable) => certifier,
            _ => {
                tracing::debug!(height = response.height, "returning unverified value");
                return Ok(response.value);
            }
        };

        if let Err(err) =
            verify_response(certifier.as_ref(), &parsed, key, ctx.height, &response).await
        {
            tracing::warn!(height = response.height, error = %err, "response failed verification");
            return Err(err.into());
        }

        tracing::debug!(height = response.height, "response verified");
        Ok(response.value)
    }

    /// Looks up `key` in `store_name`.
    ///
    /// # Errors
    /// See [`QueryClient::query`].
    pub async fn query_store(
        &self,
        key: &[u8],
        store_name: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<u8>, QueryError> {
        self.query(&QueryPath::store(store_name, SUBPATH_KEY), key, ctx)
            .await
    }

    /// Lists every key/value pair under `prefix` in `store_name`.
    ///
    /// The result is never verified, no range proof covers a scan.
    ///
    /// # Errors
    /// See [`QueryClient::query`]. Returns [`QueryError::SubspaceDecode`] if the result is not
    /// a list of pairs.
    pub async fn query_subspace(
        &self,
        prefix: &[u8],
        store_name: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Pair>, QueryError> {
        let raw = self
            .query(&QueryPath::store(store_name, SUBPATH_SUBSPACE), prefix, ctx)
            .await?;

        Pairs::decode(raw.as_slice())
            .map(|pairs| pairs.pairs)
            .map_err(QueryError::SubspaceDecode)
    }
}

/// Checks `response` against the header committing its state.
async fn verify_response(
    certifier: &dyn HeaderCertifier,
    path: &QueryPath<'_>,
    key: &[u8],
    pinned_height: Option<u64>,
    response: &AbciQueryResponse,
) -> Result<(), VerificationError> {
    if let Some(expected) = pinned_height {
        if response.height != expected {
            return Err(VerificationError::HeightMismatch {
                expected,
                actual: response.height,
            });
        }
    }

    let proof_ops = response
        .proof
        .as_ref()
        .ok_or(VerificationError::MissingProof)?;
    let proof = MultiStoreProof::try_from(proof_ops)?;
    if proof.store_name() != path.store_name {
        return Err(VerificationError::StoreNameMismatch {
            expected: path.store_name.to_string(),
            actual: proof.store_name().to_string(),
        });
    }
    let range_key = proof_ops.ops.first().map(|op| op.key.as_slice());
    if range_key != Some(key) {
        return Err(VerificationError::KeyMismatch {
            expected: key.to_vec(),
            actual: range_key.unwrap_or_default().to_vec(),
        });
    }
    if let Some(version) = proof.version().filter(|&v| v != response.height) {
        return Err(VerificationError::VersionMismatch {
            expected: response.height,
            actual: version,
        });
    }

    // The app hash of height H is committed in the header at H + 1.
    let commit_height = response
        .height
        .checked_add(1)
        .ok_or(VerificationError::InvalidHeight(response.height))?;
    let header = certifier.certify(commit_height).await?;
    tracing::debug!(height = header.height, "header certified");

    proof.verify(key, &response.value, &header.app_hash)?;
    Ok(())
}
