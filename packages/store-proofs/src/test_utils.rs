//! In-memory trees producing real ICS23 proofs, for tests.

use std::{collections::BTreeMap, ops::Bound};

use ics23::{
    commitment_proof::Proof, CommitmentProof, ExistenceProof, HashOp, InnerOp, LeafOp, LengthOp,
    NonExistenceProof,
};
use prost::Message;
use sha2::{Digest, Sha256};
use tendermint::merkle::proof::{ProofOp, ProofOps};

use crate::{
    commit_info::{kv_leaf_bytes, StoreInfo},
    proof::{PROOF_OP_IAVL, PROOF_OP_MULTISTORE, PROOF_OP_SIMPLE},
    proto,
};

/// Sorted key/value store committed with the simple merkle tree layout.
#[derive(Clone, Debug, Default)]
pub struct SimpleTree {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl SimpleTree {
    /// Creates a tree holding `entries`.
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A tree committing a substore list the way the multistore does.
    #[must_use]
    pub fn from_store_infos(store_infos: &[StoreInfo]) -> Self {
        Self::new(
            store_infos
                .iter()
                .map(|info| (info.name.clone().into_bytes(), info.hash.clone())),
        )
    }

    /// Inserts or overwrites an entry.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    /// The root of the tree.
    ///
    /// # Panics
    /// Panics if the tree is empty.
    #[must_use]
    pub fn root(&self) -> Vec<u8> {
        subtree_root(&self.leaf_hashes())
    }

    /// Existence proof for `key`, `None` if absent.
    #[must_use]
    pub fn existence_proof(&self, key: &[u8]) -> Option<CommitmentProof> {
        self.exist(key).map(|exist| CommitmentProof {
            proof: Some(Proof::Exist(exist)),
        })
    }

    /// Non-existence proof for `key`, `None` if present.
    #[must_use]
    pub fn non_existence_proof(&self, key: &[u8]) -> Option<CommitmentProof> {
        if self.entries.contains_key(key) {
            return None;
        }

        let left = self
            .entries
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
            .next_back()
            .and_then(|(k, _)| self.exist(k));
        let right = self
            .entries
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .and_then(|(k, _)| self.exist(k));

        Some(CommitmentProof {
            proof: Some(Proof::Nonexist(NonExistenceProof {
                key: key.to_vec(),
                left,
                right,
            })),
        })
    }

    fn leaf_hashes(&self) -> Vec<Vec<u8>> {
        self.entries
            .iter()
            .map(|(k, v)| leaf_hash(&kv_leaf_bytes(k, v)))
            .collect()
    }

    fn exist(&self, key: &[u8]) -> Option<ExistenceProof> {
        let index = self.entries.keys().position(|k| k.as_slice() == key)?;
        let value = self.entries.get(key)?.clone();

        Some(ExistenceProof {
            key: key.to_vec(),
            value,
            leaf: Some(simple_leaf_op(vec![0])),
            path: inner_path(&self.leaf_hashes(), index),
        })
    }
}

fn simple_leaf_op(prefix: Vec<u8>) -> LeafOp {
    LeafOp {
        hash: HashOp::Sha256.into(),
        prehash_key: HashOp::NoHash.into(),
        prehash_value: HashOp::Sha256.into(),
        length: LengthOp::VarProto.into(),
        prefix,
    }
}

fn leaf_hash(leaf_bytes: &[u8]) -> Vec<u8> {
    Sha256::new()
        .chain_update([0u8])
        .chain_update(leaf_bytes)
        .finalize()
        .to_vec()
}

fn inner_hash(left: &[u8], right: &[u8]) -> Vec<u8> {
    Sha256::new()
        .chain_update([1u8])
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .to_vec()
}

/// Largest power of two strictly below `n`.
fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k * 2 < n {
        k *= 2;
    }
    k
}

fn subtree_root(hashes: &[Vec<u8>]) -> Vec<u8> {
    match hashes {
        [] => panic!("empty tree has no root"),
        [single] => single.clone(),
        _ => {
            let k = split_point(hashes.len());
            inner_hash(&subtree_root(&hashes[..k]), &subtree_root(&hashes[k..]))
        }
    }
}

/// Inner operations from the leaf at `index` up to the root.
fn inner_path(hashes: &[Vec<u8>], index: usize) -> Vec<InnerOp> {
    if hashes.len() <= 1 {
        return vec![];
    }

    let k = split_point(hashes.len());
    if index < k {
        let mut path = inner_path(&hashes[..k], index);
        path.push(InnerOp {
            hash: HashOp::Sha256.into(),
            prefix: vec![1],
            suffix: subtree_root(&hashes[k..]),
        });
        path
    } else {
        let mut path = inner_path(&hashes[k..], index - k);
        let mut prefix = vec![1];
        prefix.extend(subtree_root(&hashes[..k]));
        path.push(InnerOp {
            hash: HashOp::Sha256.into(),
            prefix,
            suffix: vec![],
        });
        path
    }
}

fn encode_iavl_varint(value: i64, buf: &mut Vec<u8>) {
    #[allow(clippy::cast_sign_loss)]
    let zigzag = ((value << 1) ^ (value >> 63)) as u64;
    prost::encoding::encode_varint(zigzag, buf);
}

/// Existence proof and root of an IAVL tree holding the single entry `key -> value`.
#[must_use]
pub fn iavl_single_leaf_proof(key: &[u8], value: &[u8], version: i64) -> (CommitmentProof, Vec<u8>) {
    let mut prefix = Vec::new();
    encode_iavl_varint(0, &mut prefix);
    encode_iavl_varint(1, &mut prefix);
    encode_iavl_varint(version, &mut prefix);

    let root = Sha256::new()
        .chain_update(&prefix)
        .chain_update(kv_leaf_bytes(key, value))
        .finalize()
        .to_vec();

    let proof = CommitmentProof {
        proof: Some(Proof::Exist(ExistenceProof {
            key: key.to_vec(),
            value: value.to_vec(),
            leaf: Some(simple_leaf_op(prefix)),
            path: vec![],
        })),
    };
    (proof, root)
}

/// A chain whose application state is a set of simple-tree substores.
#[derive(Clone, Debug, Default)]
pub struct MultiStore {
    stores: BTreeMap<String, SimpleTree>,
    version: i64,
}

impl MultiStore {
    /// Creates an empty multistore.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the version the store list is committed at.
    pub fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    /// Sets `key -> value` in `store`, creating the store if needed.
    pub fn set(&mut self, store: &str, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.stores
            .entry(store.to_string())
            .or_default()
            .insert(key, value);
    }

    /// The committed substore list.
    #[must_use]
    pub fn store_infos(&self) -> Vec<StoreInfo> {
        self.stores
            .iter()
            .map(|(name, tree)| StoreInfo::new(name.clone(), tree.root()))
            .collect()
    }

    /// The application state root.
    #[must_use]
    pub fn app_hash(&self) -> Vec<u8> {
        SimpleTree::from_store_infos(&self.store_infos()).root()
    }

    /// Value of `key` in `store`, empty when absent.
    #[must_use]
    pub fn get(&self, store: &str, key: &[u8]) -> Vec<u8> {
        self.stores
            .get(store)
            .and_then(|tree| tree.entries.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Every entry of `store` whose key starts with `prefix`.
    #[must_use]
    pub fn prefix_scan(&self, store: &str, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.stores
            .get(store)
            .map(|tree| {
                tree.entries
                    .iter()
                    .filter(|(k, _)| k.starts_with(prefix))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Range proof for `key` in `store`, membership or non-membership as appropriate.
    #[must_use]
    pub fn range_proof(&self, store: &str, key: &[u8]) -> Option<CommitmentProof> {
        let tree = self.stores.get(store)?;
        tree.existence_proof(key)
            .or_else(|| tree.non_existence_proof(key))
    }

    /// Proof operations in the `multistore` layout.
    #[must_use]
    pub fn commit_info_proof_ops(&self, store: &str, key: &[u8]) -> Option<ProofOps> {
        let range = self.range_proof(store, key)?;
        let commit_info = proto::CommitInfo {
            version: self.version,
            store_infos: self
                .store_infos()
                .into_iter()
                .map(|info| proto::StoreInfo {
                    name: info.name,
                    commit_id: Some(proto::CommitId {
                        version: self.version,
                        hash: info.hash,
                    }),
                })
                .collect(),
        };

        Some(ProofOps {
            ops: vec![
                range_op(key, &range),
                ProofOp {
                    field_type: PROOF_OP_MULTISTORE.to_string(),
                    key: store.as_bytes().to_vec(),
                    data: commit_info.encode_to_vec(),
                },
            ],
        })
    }

    /// Proof operations in the chained ICS23 layout.
    #[must_use]
    pub fn ics23_proof_ops(&self, store: &str, key: &[u8]) -> Option<ProofOps> {
        let range = self.range_proof(store, key)?;
        let store_proof =
            SimpleTree::from_store_infos(&self.store_infos()).existence_proof(store.as_bytes())?;

        Some(ProofOps {
            ops: vec![
                range_op(key, &range),
                ProofOp {
                    field_type: PROOF_OP_SIMPLE.to_string(),
                    key: store.as_bytes().to_vec(),
                    data: store_proof.encode_to_vec(),
                },
            ],
        })
    }
}

fn range_op(key: &[u8], proof: &CommitmentProof) -> ProofOp {
    ProofOp {
        field_type: PROOF_OP_SIMPLE.to_string(),
        key: key.to_vec(),
        data: proof.encode_to_vec(),
    }
}

/// A single IAVL leaf wrapped as a range proof operation.
#[must_use]
pub fn iavl_range_op(key: &[u8], value: &[u8], version: i64) -> (ProofOp, Vec<u8>) {
    let (proof, root) = iavl_single_leaf_proof(key, value, version);
    (
        ProofOp {
            field_type: PROOF_OP_IAVL.to_string(),
            key: key.to_vec(),
            data: proof.encode_to_vec(),
        },
        root,
    )
}
