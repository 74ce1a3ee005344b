//! Common test utilities and fixtures for store proof tests

use tendermint::merkle::proof::ProofOps;
use verified_query_store_proofs::{test_utils::MultiStore, MultiStoreProof, StoreProofError};

pub const ACC_KEY: &[u8] = b"\x01alice";
pub const ACC_VALUE: &[u8] = b"account-of-alice";

/// A chain with a few populated stores.
pub fn sample_multistore() -> MultiStore {
    let mut store = MultiStore::new();
    store.set("acc", ACC_KEY, ACC_VALUE);
    store.set("acc", b"\x01bob".to_vec(), b"account-of-bob".to_vec());
    store.set("acc", b"\x01carol".to_vec(), b"account-of-carol".to_vec());
    store.set("bank", b"balances/alice".to_vec(), b"100stake".to_vec());
    store.set("staking", b"params".to_vec(), b"{}".to_vec());
    store.set("upgrade", b"plan".to_vec(), b"none".to_vec());
    store
}

#[derive(Clone, Copy, Debug)]
pub enum Layout {
    CommitInfo,
    Ics23,
}

pub fn proof_ops(store: &MultiStore, layout: Layout, name: &str, key: &[u8]) -> ProofOps {
    match layout {
        Layout::CommitInfo => store.commit_info_proof_ops(name, key),
        Layout::Ics23 => store.ics23_proof_ops(name, key),
    }
    .expect("store exists")
}

pub fn decode(ops: &ProofOps) -> MultiStoreProof {
    MultiStoreProof::try_from(ops).expect("valid proof ops")
}

pub fn assert_verify_fails_with(
    result: Result<(), StoreProofError>,
    expected: &StoreProofError,
    description: &str,
) {
    let actual = result.expect_err(&format!("verification should have failed for: {description}"));
    assert_eq!(
        std::mem::discriminant(&actual),
        std::mem::discriminant(expected),
        "expected {expected:?} but got {actual:?} for: {description}"
    );
}
