//! ICS23 range proofs binding a key (or its absence) to a substore root.

use ics23::{
    commitment_proof::Proof, CommitmentProof, ExistenceProof, HostFunctionsManager, ProofSpec,
};

use crate::error::StoreProofError;

/// A range proof tagged with the tree layout of the substore it was produced by.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeProof {
    /// Proof from an IAVL tree.
    Iavl(CommitmentProof),
    /// Proof from a simple merkle tree.
    Simple(CommitmentProof),
}

impl RangeProof {
    /// The ICS23 spec the proof is checked against.
    #[must_use]
    pub fn spec(&self) -> ProofSpec {
        match self {
            Self::Iavl(_) => ics23::iavl_spec(),
            Self::Simple(_) => ics23::tendermint_spec(),
        }
    }

    /// The underlying commitment proof.
    #[must_use]
    pub const fn commitment_proof(&self) -> &CommitmentProof {
        match self {
            Self::Iavl(proof) | Self::Simple(proof) => proof,
        }
    }

    /// Root implied by the proof. For a non-existence proof the root is taken from a neighbour.
    ///
    /// The result is untrusted until checked against a committed root.
    ///
    /// # Errors
    /// Returns [`StoreProofError::MalformedProof`] for batch proofs or proofs without a
    /// neighbour, and [`StoreProofError::InvalidProof`] if the root cannot be computed.
    pub fn calculate_root(&self) -> Result<Vec<u8>, StoreProofError> {
        let exist = match &self.commitment_proof().proof {
            Some(Proof::Exist(exist)) => exist,
            Some(Proof::Nonexist(nonexist)) => nonexist
                .left
                .as_ref()
                .or(nonexist.right.as_ref())
                .ok_or_else(|| {
                    StoreProofError::MalformedProof(
                        "non-existence proof has no neighbours".to_string(),
                    )
                })?,
            Some(Proof::Batch(_) | Proof::Compressed(_)) => {
                return Err(StoreProofError::MalformedProof(
                    "batch proofs are not supported".to_string(),
                ))
            }
            None => {
                return Err(StoreProofError::MalformedProof(
                    "empty commitment proof".to_string(),
                ))
            }
        };

        existence_root(exist)
    }
}

pub(crate) fn existence_root(exist: &ExistenceProof) -> Result<Vec<u8>, StoreProofError> {
    ics23::calculate_existence_root::<HostFunctionsManager>(exist)
        .map_err(|e| StoreProofError::InvalidProof(e.to_string()))
}

/// Verifies `proof` for `key` against `commitment_hash`.
///
/// A non-empty `value` is checked as membership of `key -> value`; an empty `value` as
/// non-membership of `key`.
///
/// # Errors
/// Returns [`StoreProofError::InvalidProof`] if the proof does not establish the claim.
pub fn verify_range_proof(
    key: &[u8],
    value: &[u8],
    commitment_hash: &[u8],
    proof: &RangeProof,
) -> Result<(), StoreProofError> {
    let spec = proof.spec();
    let root = commitment_hash.to_vec();

    if value.is_empty() {
        if ics23::verify_non_membership::<HostFunctionsManager>(
            proof.commitment_proof(),
            &spec,
            &root,
            key,
        ) {
            Ok(())
        } else {
            Err(StoreProofError::InvalidProof(format!(
                "key {} is not proven absent",
                hex::encode(key)
            )))
        }
    } else if ics23::verify_membership::<HostFunctionsManager>(
        proof.commitment_proof(),
        &spec,
        &root,
        key,
        value,
    ) {
        Ok(())
    } else {
        Err(StoreProofError::InvalidProof(format!(
            "key {} is not proven to hold the value",
            hex::encode(key)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{iavl_single_leaf_proof, SimpleTree};

    fn tree() -> SimpleTree {
        SimpleTree::new([
            (b"alice".to_vec(), b"1".to_vec()),
            (b"bob".to_vec(), b"2".to_vec()),
            (b"carol".to_vec(), b"3".to_vec()),
            (b"dave".to_vec(), b"4".to_vec()),
            (b"erin".to_vec(), b"5".to_vec()),
        ])
    }

    #[test]
    fn test_membership() {
        let tree = tree();
        let proof = RangeProof::Simple(tree.existence_proof(b"carol").unwrap());

        verify_range_proof(b"carol", b"3", &tree.root(), &proof).unwrap();
    }

    #[test]
    fn test_membership_wrong_value() {
        let tree = tree();
        let proof = RangeProof::Simple(tree.existence_proof(b"carol").unwrap());

        let err = verify_range_proof(b"carol", b"4", &tree.root(), &proof).unwrap_err();

        assert!(matches!(err, StoreProofError::InvalidProof(_)));
    }

    #[test]
    fn test_membership_wrong_key() {
        let tree = tree();
        let proof = RangeProof::Simple(tree.existence_proof(b"carol").unwrap());

        assert!(verify_range_proof(b"dave", b"3", &tree.root(), &proof).is_err());
    }

    #[test]
    fn test_non_membership_between_neighbours() {
        let tree = tree();
        let proof = RangeProof::Simple(tree.non_existence_proof(b"cat").unwrap());

        verify_range_proof(b"cat", b"", &tree.root(), &proof).unwrap();
    }

    #[test]
    fn test_non_membership_at_edges() {
        let tree = tree();

        let before = RangeProof::Simple(tree.non_existence_proof(b"aaron").unwrap());
        verify_range_proof(b"aaron", b"", &tree.root(), &before).unwrap();

        let after = RangeProof::Simple(tree.non_existence_proof(b"zed").unwrap());
        verify_range_proof(b"zed", b"", &tree.root(), &after).unwrap();
    }

    #[test]
    fn test_existence_proof_cannot_prove_absence() {
        let tree = tree();
        let proof = RangeProof::Simple(tree.existence_proof(b"bob").unwrap());

        assert!(verify_range_proof(b"bob", b"", &tree.root(), &proof).is_err());
    }

    #[test]
    fn test_calculate_root_matches_tree() {
        let tree = tree();

        for key in [&b"alice"[..], b"carol", b"erin"] {
            let proof = RangeProof::Simple(tree.existence_proof(key).unwrap());
            assert_eq!(proof.calculate_root().unwrap(), tree.root());
        }

        let absent = RangeProof::Simple(tree.non_existence_proof(b"zed").unwrap());
        assert_eq!(absent.calculate_root().unwrap(), tree.root());
    }

    #[test]
    fn test_calculate_root_of_empty_proof() {
        let proof = RangeProof::Simple(CommitmentProof { proof: None });

        assert!(matches!(
            proof.calculate_root(),
            Err(StoreProofError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_iavl_leaf() {
        let (proof, root) = iavl_single_leaf_proof(b"key", b"value", 7);
        let proof = RangeProof::Iavl(proof);

        assert_eq!(proof.calculate_root().unwrap(), root);
        verify_range_proof(b"key", b"value", &root, &proof).unwrap();
    }

    #[test]
    fn test_simple_proof_fails_iavl_spec() {
        let tree = tree();
        let proof = RangeProof::Iavl(tree.existence_proof(b"carol").unwrap());

        assert!(verify_range_proof(b"carol", b"3", &tree.root(), &proof).is_err());
    }
}
