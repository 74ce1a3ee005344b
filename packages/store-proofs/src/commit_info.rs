//! Verification of the committed substore list against an application state root.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};
use tendermint::merkle::simple_hash_from_byte_vectors;

use crate::error::StoreProofError;

/// One entry of the committed substore list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreInfo {
    /// Name of the substore
    pub name: String,
    /// Root hash of the substore at the committed version
    pub hash: Vec<u8>,
}

impl StoreInfo {
    /// Creates a store info entry.
    #[must_use]
    pub fn new(name: impl Into<String>, hash: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
        }
    }

    /// Merkle leaf bytes: `uvarint(len name) || name || uvarint(32) || sha256(hash)`.
    #[must_use]
    pub fn leaf_bytes(&self) -> Vec<u8> {
        kv_leaf_bytes(self.name.as_bytes(), &self.hash)
    }
}

/// Length-prefixed key followed by the length-prefixed sha256 of the value.
pub(crate) fn kv_leaf_bytes(key: &[u8], value: &[u8]) -> Vec<u8> {
    let value_hash = Sha256::digest(value);

    let mut leaf = Vec::with_capacity(key.len() + value_hash.len() + 4);
    prost::encoding::encode_varint(key.len() as u64, &mut leaf);
    leaf.extend_from_slice(key);
    prost::encoding::encode_varint(value_hash.len() as u64, &mut leaf);
    leaf.extend_from_slice(&value_hash);
    leaf
}

/// Simple merkle root over the entries ordered by store name.
#[must_use]
pub fn commit_info_root(store_infos: &[StoreInfo]) -> Vec<u8> {
    let mut sorted: Vec<&StoreInfo> = store_infos.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let leaves: Vec<Vec<u8>> = sorted.iter().map(|info| info.leaf_bytes()).collect();
    simple_hash_from_byte_vectors::<Sha256>(&leaves).to_vec()
}

/// Checks `store_infos` against `trusted_root` and returns the root hash of `target`.
///
/// The root is checked before the target is looked up, so a forged list is always reported
/// as a root mismatch.
///
/// # Errors
/// Returns [`StoreProofError::MalformedProof`] for an empty list or duplicate store names,
/// [`StoreProofError::RootMismatch`] if the recomputed root differs from `trusted_root`, and
/// [`StoreProofError::StoreNotFound`] if `target` is not in the list.
pub fn verify_multi_store_commit_info(
    target: &str,
    store_infos: &[StoreInfo],
    trusted_root: &[u8],
) -> Result<Vec<u8>, StoreProofError> {
    if store_infos.is_empty() {
        return Err(StoreProofError::MalformedProof(
            "commit info has no stores".to_string(),
        ));
    }

    let mut seen = BTreeSet::new();
    if let Some(duplicate) = store_infos.iter().find(|info| !seen.insert(info.name.as_str())) {
        return Err(StoreProofError::MalformedProof(format!(
            "store `{}` listed more than once",
            duplicate.name
        )));
    }

    let computed = commit_info_root(store_infos);
    if computed != trusted_root {
        return Err(StoreProofError::RootMismatch {
            expected: trusted_root.to_vec(),
            computed,
        });
    }

    store_infos
        .iter()
        .find(|info| info.name == target)
        .map(|info| info.hash.clone())
        .ok_or_else(|| StoreProofError::StoreNotFound(target.to_string()))
}
