//! The crate that contains the light client used to certify headers for verified queries.
//!
//! The client carries a single trusted checkpoint forward. Newer heights are certified with
//! skipping verification (bisecting when the trusted validators do not carry enough voting
//! power), older heights are certified by walking the `last_block_id` hash chain down from the
//! checkpoint. The checkpoint only ever moves to a strictly greater height.
#![deny(clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

pub mod error;
pub mod options;

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use async_trait::async_trait;
use tendermint::{Hash, Time};
use tendermint_light_client_verifier::{types::LightBlock, ProdVerifier, Verdict, Verifier};
use verified_query_node_client::NodeClient;

pub use error::LightClientError;
pub use options::LightClientOptions;

/// The part of a certified header the query pipeline needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertifiedHeader {
    /// Height of the certified header
    pub height: u64,
    /// Application state root after executing the block at `height - 1`
    pub app_hash: Vec<u8>,
}

impl From<&LightBlock> for CertifiedHeader {
    fn from(block: &LightBlock) -> Self {
        Self {
            height: block.height().value(),
            app_hash: block.signed_header.header().app_hash.as_bytes().to_vec(),
        }
    }
}

/// Certifies headers at arbitrary heights against locally held trust.
#[async_trait]
pub trait HeaderCertifier: Send + Sync {
    /// Fetches and certifies the header at `height`.
    ///
    /// # Errors
    /// Returns [`LightClientError::CommitNotFound`] if the network has no header at `height`,
    /// and [`LightClientError::HeaderVerificationFailed`] if it cannot be linked to trusted state.
    async fn certify(&self, height: u64) -> Result<CertifiedHeader, LightClientError>;
}

/// Light client holding a forward-only trusted checkpoint.
pub struct LightClient<C, V = ProdVerifier> {
    node: C,
    verifier: V,
    options: LightClientOptions,
    trusted: RwLock<LightBlock>,
}

impl<C: NodeClient> LightClient<C> {
    /// Creates a light client trusting `trusted` as supplied out of band.
    #[must_use]
    pub fn new(node: C, trusted: LightBlock, options: LightClientOptions) -> Self {
        Self::with_verifier(node, ProdVerifier::default(), trusted, options)
    }

    /// Fetches the block at `height` and trusts it if its header hashes to `expected_hash`.
    ///
    /// # Errors
    /// Returns an error if the block cannot be fetched, its hash differs from `expected_hash`,
    /// or its validator sets do not match the hashes committed in its header.
    pub async fn bootstrap(
        node: C,
        height: u64,
        expected_hash: Hash,
        options: LightClientOptions,
    ) -> Result<Self, LightClientError> {
        if height == 0 {
            return Err(LightClientError::InvalidHeight(height));
        }

        let block = node.light_block(height).await?;
        let header = block.signed_header.header();

        let reject = |reason: String| LightClientError::HeaderVerificationFailed { height, reason };
        if header.hash() != expected_hash {
            return Err(reject(format!(
                "header hash {} does not match trusted hash {expected_hash}",
                header.hash()
            )));
        }
        if block.validators.hash() != header.validators_hash {
            return Err(reject("validator set does not match header".to_string()));
        }
        if block.next_validators.hash() != header.next_validators_hash {
            return Err(reject("next validator set does not match header".to_string()));
        }

        tracing::info!(height, hash = %expected_hash, "light client bootstrapped");
        Ok(Self::new(node, block, options))
    }
}

impl<C: NodeClient, V: Verifier> LightClient<C, V> {
    /// Creates a light client with a custom header verifier.
    pub fn with_verifier(
        node: C,
        verifier: V,
        trusted: LightBlock,
        options: LightClientOptions,
    ) -> Self {
        Self {
            node,
            verifier,
            options,
            trusted: RwLock::new(trusted),
        }
    }

    /// Snapshot of the trusted checkpoint.
    #[must_use]
    pub fn trusted_block(&self) -> LightBlock {
        self.trusted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Height of the trusted checkpoint.
    #[must_use]
    pub fn trusted_height(&self) -> u64 {
        self.trusted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .height()
            .value()
    }

    /// The verification options in use.
    #[must_use]
    pub const fn options(&self) -> &LightClientOptions {
        &self.options
    }

    /// Fetches and certifies the light block at `height`.
    ///
    /// Heights above the checkpoint advance it on success; heights at or below it leave it
    /// untouched.
    ///
    /// # Errors
    /// See [`HeaderCertifier::certify`].
    #[tracing::instrument(skip(self))]
    pub async fn certify_light_block(&self, height: u64) -> Result<LightBlock, LightClientError> {
        if height == 0 {
            return Err(LightClientError::InvalidHeight(height));
        }

        let trusted = self.trusted_block();
        let trusted_height = trusted.height().value();

        match height.cmp(&trusted_height) {
            Ordering::Equal => Ok(trusted),
            Ordering::Greater => {
                let block = self.verify_forward(trusted, height).await?;
                if self.advance(&block) {
                    tracing::debug!(from = trusted_height, to = height, "trusted checkpoint advanced");
                }
                Ok(block)
            }
            Ordering::Less => self.verify_backward(trusted, height).await,
        }
    }

    /// Skipping verification from `trusted` up to `target`, bisecting on insufficient trust.
    async fn verify_forward(
        &self,
        mut trusted: LightBlock,
        target: u64,
    ) -> Result<LightBlock, LightClientError> {
        let options = self.options.verifier_options();
        let mut fetched = BTreeMap::new();
        let mut pending = vec![target];

        while let Some(&height) = pending.last() {
            let untrusted = match fetched.remove(&height) {
                Some(block) => block,
                None => self.node.light_block(height).await?,
            };

            let verdict = self.verifier.verify_update_header(
                untrusted.as_untrusted_state(),
                trusted.as_trusted_state(),
                &options,
                Time::now(),
            );

            match verdict {
                Verdict::Success => {
                    tracing::trace!(height, "header verified");
                    trusted = untrusted;
                    pending.pop();
                }
                Verdict::NotEnoughTrust(tally) => {
                    let trusted_height = trusted.height().value();
                    let pivot = trusted_height + (height - trusted_height) / 2;
                    if pivot == trusted_height {
                        return Err(LightClientError::HeaderVerificationFailed {
                            height,
                            reason: format!("not enough trust on adjacent header: {tally:?}"),
                        });
                    }
                    tracing::debug!(height, pivot, "not enough trust, bisecting");
                    fetched.insert(height, untrusted);
                    pending.push(pivot);
                }
                Verdict::Invalid(detail) => {
                    return Err(LightClientError::HeaderVerificationFailed {
                        height,
                        reason: format!("{detail:?}"),
                    });
                }
            }
        }

        Ok(trusted)
    }

    /// Certifies `target` below the checkpoint by following `last_block_id` hashes.
    async fn verify_backward(
        &self,
        trusted: LightBlock,
        target: u64,
    ) -> Result<LightBlock, LightClientError> {
        let trusted_height = trusted.height().value();
        let distance = trusted_height - target;
        if distance > self.options.max_backward_distance {
            return Err(LightClientError::BackwardDistanceExceeded {
                target,
                trusted: trusted_height,
                distance,
                max: self.options.max_backward_distance,
            });
        }

        let mut current = trusted;
        for height in (target..trusted_height).rev() {
            let candidate = self.node.light_block(height).await?;

            let expected = current
                .signed_header
                .header()
                .last_block_id
                .as_ref()
                .map(|id| id.hash)
                .ok_or_else(|| LightClientError::HeaderVerificationFailed {
                    height: height + 1,
                    reason: "header carries no last block id".to_string(),
                })?;
            let actual = candidate.signed_header.header().hash();
            if actual != expected {
                return Err(LightClientError::HeaderVerificationFailed {
                    height,
                    reason: format!(
                        "header hash {actual} does not match last block id {expected} at height {}",
                        height + 1
                    ),
                });
            }

            current = candidate;
        }

        Ok(current)
    }

    /// Replaces the checkpoint if `block` is strictly newer. Returns whether it did.
    fn advance(&self, block: &LightBlock) -> bool {
        let mut trusted = self
            .trusted
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if block.height() > trusted.height() {
            *trusted = block.clone();
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl<C, V> HeaderCertifier for LightClient<C, V>
where
    C: NodeClient,
    V: Verifier,
{
    async fn certify(&self, height: u64) -> Result<CertifiedHeader, LightClientError> {
        let block = self.certify_light_block(height).await?;
        Ok(CertifiedHeader::from(&block))
    }
}
