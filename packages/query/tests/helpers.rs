//! Common test utilities and fixtures for query tests

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ibc_proto::{cosmos::auth::v1beta1::BaseAccount, google::protobuf::Any};
use prost::Message;
use tendermint_light_client_verifier::types::LightBlock;
use verified_query::{
    proto::{Pair, Pairs},
    QueryClient, QueryContext, QueryError, VerificationError,
};
use verified_query_light_client::{CertifiedHeader, HeaderCertifier, LightClientError};
use verified_query_node_client::{AbciQueryResponse, NodeClient, NodeClientError};
use verified_query_store_proofs::test_utils::MultiStore;

pub const ALICE: &[u8] = &[0xA1; 20];
pub const BOB: &[u8] = &[0xB0; 20];
pub const BALANCE_KEY: &[u8] = b"balances/alice";
pub const BALANCE: &[u8] = b"100stake";

/// Store level proof layout served by the fake node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    CommitInfo,
    Ics23,
}

/// A single recorded `abci_query` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedQuery {
    pub path: String,
    pub key: Vec<u8>,
    pub height: Option<u64>,
    pub prove: bool,
}

type Tamper = Box<dyn Fn(&mut AbciQueryResponse) + Send + Sync>;

/// Node serving store queries from in-memory multistores, one per height.
pub struct FakeNode {
    states: BTreeMap<u64, MultiStore>,
    layout: Layout,
    tamper: Mutex<Option<Tamper>>,
    queries: Mutex<Vec<RecordedQuery>>,
}

impl FakeNode {
    pub fn new(states: BTreeMap<u64, MultiStore>, layout: Layout) -> Arc<Self> {
        Arc::new(Self {
            states,
            layout,
            tamper: Mutex::new(None),
            queries: Mutex::default(),
        })
    }

    /// Applies `tamper` to every response before it is returned.
    pub fn tamper_with(&self, tamper: impl Fn(&mut AbciQueryResponse) + Send + Sync + 'static) {
        *self.tamper.lock().unwrap() = Some(Box::new(tamper));
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn respond(&self, path: &str, key: &[u8], height: Option<u64>, prove: bool) -> AbciQueryResponse {
        let (&height, state) = match height {
            Some(h) => match self.states.get_key_value(&h) {
                Some(entry) => entry,
                None => return failure(26, format!("height {h} is not available")),
            },
            None => self.states.last_key_value().expect("node has state"),
        };

        let segments: Vec<&str> = path.trim_start_matches('/').splitn(3, '/').collect();
        let [_, store, subpath] = segments.as_slice() else {
            return failure(6, format!("unknown query path {path}"));
        };

        match *subpath {
            "key" => {
                let proof = if prove {
                    match self.layout {
                        Layout::CommitInfo => state.commit_info_proof_ops(store, key),
                        Layout::Ics23 => state.ics23_proof_ops(store, key),
                    }
                } else {
                    None
                };
                AbciQueryResponse {
                    key: key.to_vec(),
                    value: state.get(store, key),
                    proof,
                    height,
                    ..AbciQueryResponse::default()
                }
            }
            "subspace" => {
                let pairs = Pairs {
                    pairs: state
                        .prefix_scan(store, key)
                        .into_iter()
                        .map(|(key, value)| Pair { key, value })
                        .collect(),
                };
                AbciQueryResponse {
                    key: key.to_vec(),
                    value: pairs.encode_to_vec(),
                    height,
                    ..AbciQueryResponse::default()
                }
            }
            other => failure(6, format!("no route for subpath {other}")),
        }
    }
}

fn failure(code: u32, log: String) -> AbciQueryResponse {
    AbciQueryResponse {
        code,
        log,
        codespace: "sdk".to_string(),
        ..AbciQueryResponse::default()
    }
}

#[async_trait]
impl NodeClient for FakeNode {
    async fn abci_query(
        &self,
        path: &str,
        key: &[u8],
        height: Option<u64>,
        prove: bool,
    ) -> Result<AbciQueryResponse, NodeClientError> {
        self.queries.lock().unwrap().push(RecordedQuery {
            path: path.to_string(),
            key: key.to_vec(),
            height,
            prove,
        });

        let mut response = self.respond(path, key, height, prove);
        if let Some(tamper) = self.tamper.lock().unwrap().as_ref() {
            tamper(&mut response);
        }
        Ok(response)
    }

    async fn light_block(&self, height: u64) -> Result<LightBlock, NodeClientError> {
        Err(NodeClientError::HeightNotFound(height))
    }
}

/// Certifier handing out preconfigured app hashes and recording requested heights.
#[derive(Default)]
pub struct FakeCertifier {
    app_hashes: HashMap<u64, Vec<u8>>,
    requested: Mutex<Vec<u64>>,
}

impl FakeCertifier {
    pub fn new(app_hashes: HashMap<u64, Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            app_hashes,
            requested: Mutex::default(),
        })
    }

    pub fn requested(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl HeaderCertifier for FakeCertifier {
    async fn certify(&self, height: u64) -> Result<CertifiedHeader, LightClientError> {
        self.requested.lock().unwrap().push(height);
        self.app_hashes
            .get(&height)
            .map(|app_hash| CertifiedHeader {
                height,
                app_hash: app_hash.clone(),
            })
            .ok_or(LightClientError::CommitNotFound(height))
    }
}

/// The state after block 10: alice and bob have accounts, alice has a balance.
pub fn state_at_10() -> MultiStore {
    let mut state = MultiStore::new();
    state.set("acc", account_key(ALICE), account_bytes("cosmos1alice", 7, 2));
    state.set("acc", account_key(BOB), account_bytes("cosmos1bob", 8, 0));
    state.set("bank", BALANCE_KEY, BALANCE);
    state.set("bank", b"balances/bob".to_vec(), b"5stake".to_vec());
    state.set("staking", b"params".to_vec(), b"{}".to_vec());
    state.set_version(10);
    state
}

/// The state after block 11: alice spent part of her balance.
pub fn state_at_11() -> MultiStore {
    let mut state = state_at_10();
    state.set("bank", BALANCE_KEY, b"40stake".to_vec());
    state.set("acc", account_key(ALICE), account_bytes("cosmos1alice", 7, 3));
    state.set_version(11);
    state
}

pub fn account_key(address: &[u8]) -> Vec<u8> {
    verified_query::account::address_store_key(address)
}

pub fn account_bytes(address: &str, account_number: u64, sequence: u64) -> Vec<u8> {
    Any {
        type_url: verified_query::account::BASE_ACCOUNT_TYPE_URL.to_string(),
        value: BaseAccount {
            address: address.to_string(),
            pub_key: None,
            account_number,
            sequence,
        }
        .encode_to_vec(),
    }
    .encode_to_vec()
}

pub struct TestContext {
    pub node: Arc<FakeNode>,
    pub certifier: Arc<FakeCertifier>,
    pub client: QueryClient<Arc<FakeNode>>,
}

impl TestContext {
    pub fn verified(&self) -> QueryContext {
        QueryContext::verified(self.certifier.clone())
    }
}

/// A node at height 11 whose state at height `h` is committed in the header at `h + 1`.
///
/// The certifier also knows header 11, which commits the state of height 10 and must never
/// be used to verify a response at height 11.
pub fn setup_test_context(layout: Layout) -> TestContext {
    let states = BTreeMap::from([(10, state_at_10()), (11, state_at_11())]);
    let app_hashes = HashMap::from([
        (11, state_at_10().app_hash()),
        (12, state_at_11().app_hash()),
    ]);

    let node = FakeNode::new(states, layout);
    TestContext {
        client: QueryClient::new(Arc::clone(&node)),
        certifier: FakeCertifier::new(app_hashes),
        node,
    }
}

pub fn assert_verification_fails_with(
    result: Result<Vec<u8>, QueryError>,
    expected: &VerificationError,
) {
    match result {
        Err(QueryError::ProofVerificationFailed(actual)) => assert_eq!(
            std::mem::discriminant(&actual),
            std::mem::discriminant(expected),
            "expected {expected:?}, got {actual:?}"
        ),
        other => panic!("expected verification failure {expected:?}, got {other:?}"),
    }
}
