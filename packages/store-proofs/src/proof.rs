//! Decoding and verification of the two-level proof attached to a query response.

use ics23::{commitment_proof::Proof, CommitmentProof, ExistenceProof, HostFunctionsManager};
use prost::Message;
use tendermint::merkle::proof::{ProofOp, ProofOps};

use crate::{
    commit_info::{verify_multi_store_commit_info, StoreInfo},
    error::StoreProofError,
    proto,
    range::{existence_root, verify_range_proof, RangeProof},
};

/// Proof operation type of an ICS23 proof over an IAVL tree.
pub const PROOF_OP_IAVL: &str = "ics23:iavl";
/// Proof operation type of an ICS23 proof over a simple merkle tree.
pub const PROOF_OP_SIMPLE: &str = "ics23:simple";
/// Proof operation type carrying the full committed store list.
pub const PROOF_OP_MULTISTORE: &str = "multistore";

/// Proof that a key (or its absence) is committed under an application state root.
///
/// The range proof binds the key to a substore root; the store level proof binds that
/// substore root to the application state root.
#[derive(Clone, Debug, PartialEq)]
pub enum MultiStoreProof {
    /// Store level proof carrying every committed substore.
    CommitInfo {
        /// Name of the proven substore
        store_name: String,
        /// Version the substore list was committed at
        version: u64,
        /// The committed substore list
        store_infos: Vec<StoreInfo>,
        /// Key level proof inside the substore
        range_proof: RangeProof,
    },
    /// Store level proof as an ICS23 proof of `store_name -> substore root`.
    Ics23 {
        /// Name of the proven substore
        store_name: String,
        /// Proof of the substore root under the application state root
        store_proof: CommitmentProof,
        /// Key level proof inside the substore
        range_proof: RangeProof,
    },
}

impl MultiStoreProof {
    /// Name of the substore this proof is for.
    #[must_use]
    pub fn store_name(&self) -> &str {
        match self {
            Self::CommitInfo { store_name, .. } | Self::Ics23 { store_name, .. } => store_name,
        }
    }

    /// Version of the committed substore list, only carried by the commit info layout.
    #[must_use]
    pub const fn version(&self) -> Option<u64> {
        match self {
            Self::CommitInfo { version, .. } => Some(*version),
            Self::Ics23 { .. } => None,
        }
    }

    /// The key level proof.
    #[must_use]
    pub const fn range_proof(&self) -> &RangeProof {
        match self {
            Self::CommitInfo { range_proof, .. } | Self::Ics23 { range_proof, .. } => range_proof,
        }
    }

    /// Verifies `key -> value` (or absence of `key` when `value` is empty) against `app_hash`.
    ///
    /// The store level proof is always checked first.
    ///
    /// # Errors
    /// Returns [`StoreProofError::RootMismatch`] if the proof does not lead to `app_hash`,
    /// [`StoreProofError::StoreNotFound`] if the store is not committed, and
    /// [`StoreProofError::InvalidProof`] if the range proof does not establish the claim.
    pub fn verify(&self, key: &[u8], value: &[u8], app_hash: &[u8]) -> Result<(), StoreProofError> {
        let substore_root = self.verify_substore_root(app_hash)?;
        tracing::trace!(
            store = self.store_name(),
            root = %hex::encode(&substore_root),
            "substore root verified"
        );

        verify_range_proof(key, value, &substore_root, self.range_proof())
    }

    /// Returns the substore root after checking it is committed under `app_hash`.
    ///
    /// # Errors
    /// See [`MultiStoreProof::verify`].
    pub fn verify_substore_root(&self, app_hash: &[u8]) -> Result<Vec<u8>, StoreProofError> {
        match self {
            Self::CommitInfo {
                store_name,
                store_infos,
                ..
            } => verify_multi_store_commit_info(store_name, store_infos, app_hash),
            Self::Ics23 {
                store_name,
                store_proof,
                range_proof,
            } => verify_store_proof(store_name, store_proof, range_proof, app_hash),
        }
    }
}

fn verify_store_proof(
    store_name: &str,
    store_proof: &CommitmentProof,
    range_proof: &RangeProof,
    app_hash: &[u8],
) -> Result<Vec<u8>, StoreProofError> {
    let substore_root = range_proof.calculate_root()?;

    let Some(Proof::Exist(exist)) = &store_proof.proof else {
        return Err(StoreProofError::MalformedProof(
            "store proof is not an existence proof".to_string(),
        ));
    };
    if exist.key != store_name.as_bytes() {
        return Err(StoreProofError::MalformedProof(format!(
            "store proof is for `{}`, not `{store_name}`",
            String::from_utf8_lossy(&exist.key)
        )));
    }

    let chained = ExistenceProof {
        value: substore_root.clone(),
        ..exist.clone()
    };
    let computed = existence_root(&chained)?;
    if computed != app_hash {
        return Err(StoreProofError::RootMismatch {
            expected: app_hash.to_vec(),
            computed,
        });
    }

    if !ics23::verify_membership::<HostFunctionsManager>(
        store_proof,
        &ics23::tendermint_spec(),
        &app_hash.to_vec(),
        store_name.as_bytes(),
        &substore_root,
    ) {
        return Err(StoreProofError::InvalidProof(format!(
            "store proof for `{store_name}` does not satisfy the simple tree spec"
        )));
    }

    Ok(substore_root)
}

fn decode_commitment_proof(op: &ProofOp) -> Result<CommitmentProof, StoreProofError> {
    CommitmentProof::decode(op.data.as_slice()).map_err(|e| {
        StoreProofError::MalformedProof(format!("cannot decode {} proof: {e}", op.field_type))
    })
}

/// Decodes a committed store list. Every store must be committed at the list's version.
fn decode_commit_info(op: &ProofOp) -> Result<(u64, Vec<StoreInfo>), StoreProofError> {
    let commit_info = proto::CommitInfo::decode(op.data.as_slice())
        .map_err(|e| StoreProofError::MalformedProof(format!("cannot decode commit info: {e}")))?;
    let version = u64::try_from(commit_info.version).map_err(|_| {
        StoreProofError::MalformedProof(format!(
            "negative commit info version {}",
            commit_info.version
        ))
    })?;

    let store_infos = commit_info
        .store_infos
        .into_iter()
        .map(|info| {
            let commit_id = info.commit_id.ok_or_else(|| {
                StoreProofError::MalformedProof(format!("store `{}` has no commit id", info.name))
            })?;
            if commit_id.version != commit_info.version {
                return Err(StoreProofError::MalformedProof(format!(
                    "store `{}` committed at version {}, commit info is at {}",
                    info.name, commit_id.version, commit_info.version
                )));
            }
            Ok(StoreInfo::new(info.name, commit_id.hash))
        })
        .collect::<Result<_, _>>()?;

    Ok((version, store_infos))
}

impl TryFrom<&ProofOp> for RangeProof {
    type Error = StoreProofError;

    fn try_from(op: &ProofOp) -> Result<Self, Self::Error> {
        match op.field_type.as_str() {
            PROOF_OP_IAVL => Ok(Self::Iavl(decode_commitment_proof(op)?)),
            PROOF_OP_SIMPLE => Ok(Self::Simple(decode_commitment_proof(op)?)),
            other => Err(StoreProofError::MalformedProof(format!(
                "unsupported range proof type `{other}`"
            ))),
        }
    }
}

impl TryFrom<&ProofOps> for MultiStoreProof {
    type Error = StoreProofError;

    fn try_from(proof: &ProofOps) -> Result<Self, Self::Error> {
        let [range_op, store_op] = proof.ops.as_slice() else {
            return Err(StoreProofError::MalformedProof(format!(
                "expected 2 proof operations, got {}",
                proof.ops.len()
            )));
        };

        let range_proof = RangeProof::try_from(range_op)?;
        let store_name = String::from_utf8(store_op.key.clone()).map_err(|_| {
            StoreProofError::MalformedProof("store name is not valid utf-8".to_string())
        })?;

        match store_op.field_type.as_str() {
            PROOF_OP_MULTISTORE => {
                let (version, store_infos) = decode_commit_info(store_op)?;
                Ok(Self::CommitInfo {
                    store_name,
                    version,
                    store_infos,
                    range_proof,
                })
            }
            PROOF_OP_SIMPLE => Ok(Self::Ics23 {
                store_name,
                store_proof: decode_commitment_proof(store_op)?,
                range_proof,
            }),
            other => Err(StoreProofError::MalformedProof(format!(
                "unsupported store proof type `{other}`"
            ))),
        }
    }
}
