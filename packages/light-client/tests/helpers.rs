//! Common test utilities and fixtures for light client tests

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tendermint::{hash::AppHash, validator::Set as ValidatorSet};
use tendermint_light_client_verifier::{
    operations::VotingPowerTally,
    options::Options,
    types::{LightBlock, TrustThreshold, TrustedBlockState, UntrustedBlockState},
    ProdVerifier, Verdict, Verifier,
};
use tendermint_testgen::{light_block::LightBlock as TestgenLightBlock, Generator};
use tokio::sync::Notify;
use verified_query_light_client::{LightClient, LightClientError, LightClientOptions};
use verified_query_node_client::{AbciQueryResponse, NodeClient, NodeClientError};

/// Generated headers carry timestamps close to the unix epoch.
const CENTURY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Generates a valid chain of light blocks for heights `1..=tip`.
pub fn generate_chain(tip: u64) -> Vec<LightBlock> {
    let mut blocks = Vec::new();
    let mut current = TestgenLightBlock::new_default(1);
    for _ in 1..=tip {
        let tm = current.generate().expect("failed to generate light block");
        blocks.push(LightBlock::new(
            tm.signed_header,
            tm.validators,
            tm.next_validators,
            tm.provider,
        ));
        current = current.next();
    }
    blocks
}

/// In-memory node serving a fixed chain and recording every light block request.
#[derive(Default)]
pub struct MockNode {
    blocks: Mutex<HashMap<u64, LightBlock>>,
    fetches: Mutex<Vec<u64>>,
    gates: Mutex<HashMap<u64, Arc<Notify>>>,
}

impl MockNode {
    pub fn new(chain: &[LightBlock]) -> Arc<Self> {
        let blocks = chain
            .iter()
            .map(|block| (block.height().value(), block.clone()))
            .collect();
        Arc::new(Self {
            blocks: Mutex::new(blocks),
            fetches: Mutex::default(),
            gates: Mutex::default(),
        })
    }

    pub fn replace(&self, block: LightBlock) {
        self.blocks
            .lock()
            .unwrap()
            .insert(block.height().value(), block);
    }

    pub fn fetches(&self) -> Vec<u64> {
        self.fetches.lock().unwrap().clone()
    }

    /// Holds the next fetch of `height` until the returned handle is notified.
    pub fn gate(&self, height: u64) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(height, Arc::clone(&gate));
        gate
    }

    pub fn clear_fetches(&self) {
        self.fetches.lock().unwrap().clear();
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn abci_query(
        &self,
        _path: &str,
        _key: &[u8],
        _height: Option<u64>,
        _prove: bool,
    ) -> Result<AbciQueryResponse, NodeClientError> {
        Err(NodeClientError::InvalidResponse(
            "mock node does not serve queries".to_string(),
        ))
    }

    async fn light_block(&self, height: u64) -> Result<LightBlock, NodeClientError> {
        self.fetches.lock().unwrap().push(height);
        let gate = self.gates.lock().unwrap().remove(&height);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .ok_or(NodeClientError::HeightNotFound(height))
    }
}

/// Options accepting the epoch-era timestamps of generated headers.
pub fn test_options() -> LightClientOptions {
    LightClientOptions {
        trusting_period: CENTURY,
        ..LightClientOptions::default()
    }
}

pub struct TestContext {
    pub chain: Vec<LightBlock>,
    pub node: Arc<MockNode>,
    pub client: LightClient<Arc<MockNode>>,
}

/// A chain of `tip` blocks with the client trusting the block at `trusted_height`.
pub fn setup_test_context(tip: u64, trusted_height: u64) -> TestContext {
    setup_with_options(tip, trusted_height, test_options())
}

pub fn setup_with_options(tip: u64, trusted_height: u64, options: LightClientOptions) -> TestContext {
    let chain = generate_chain(tip);
    let node = MockNode::new(&chain);
    let trusted = block_at(&chain, trusted_height);
    let client = LightClient::new(Arc::clone(&node), trusted, options);

    TestContext {
        chain,
        node,
        client,
    }
}

pub fn block_at(chain: &[LightBlock], height: u64) -> LightBlock {
    chain[usize::try_from(height - 1).unwrap()].clone()
}

/// Replaces the validator set so it no longer matches the header.
pub fn strip_validators(block: &mut LightBlock) {
    block.validators = ValidatorSet::without_proposer(vec![]);
}

/// Changes the app hash, which changes the header hash without touching signatures.
pub fn tamper_app_hash(block: &mut LightBlock) {
    block.signed_header.header.app_hash = AppHash::try_from(vec![0xAB; 32]).unwrap();
}

/// Verifier that refuses to skip more than `max_skip` blocks at once.
pub struct ShortSkipVerifier {
    pub max_skip: u64,
}

impl Verifier for ShortSkipVerifier {
    fn verify_update_header(
        &self,
        untrusted: UntrustedBlockState<'_>,
        trusted: TrustedBlockState<'_>,
        options: &Options,
        now: tendermint::Time,
    ) -> Verdict {
        let skip = untrusted.signed_header.header.height.value() - trusted.height.value();
        if skip > self.max_skip {
            return Verdict::NotEnoughTrust(VotingPowerTally {
                total: 100,
                tallied: 0,
                trust_threshold: TrustThreshold::ONE_THIRD,
            });
        }
        ProdVerifier::default().verify_update_header(untrusted, trusted, options, now)
    }

    fn verify_misbehaviour_header(
        &self,
        untrusted: UntrustedBlockState<'_>,
        trusted: TrustedBlockState<'_>,
        options: &Options,
        now: tendermint::Time,
    ) -> Verdict {
        ProdVerifier::default().verify_misbehaviour_header(untrusted, trusted, options, now)
    }
}

pub fn assert_certify_fails_with(result: Result<LightBlock, LightClientError>, expected: &LightClientError) {
    match result {
        Ok(block) => panic!(
            "expected {expected:?}, certified height {}",
            block.height()
        ),
        Err(err) => assert_eq!(
            std::mem::discriminant(&err),
            std::mem::discriminant(expected),
            "expected {expected:?}, got {err:?}"
        ),
    }
}
