//! The crate that contains the proof verification used by verified queries: the committed
//! substore list of a multi-store, ICS23 range proofs inside a substore, and the decoding of
//! the proof operations a node attaches to a query response.
#![deny(clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

pub mod commit_info;
pub mod error;
pub mod proof;
#[allow(missing_docs, clippy::derive_partial_eq_without_eq)]
pub mod proto;
pub mod range;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use commit_info::{commit_info_root, verify_multi_store_commit_info, StoreInfo};
pub use error::StoreProofError;
pub use proof::MultiStoreProof;
pub use range::{verify_range_proof, RangeProof};
