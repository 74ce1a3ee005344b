//! The crate that contains the verified query client.
//!
//! A [`QueryClient`] sends ABCI queries to an untrusted node. In verified mode every provable
//! response is checked before its value is returned: the header one block above the response
//! height is certified by a [`HeaderCertifier`](verified_query_light_client::HeaderCertifier),
//! the store level proof is checked against that header's app hash, and the range proof is
//! checked against the proven substore root.
#![deny(clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

pub mod account;
pub mod client;
pub mod context;
pub mod error;
pub mod path;
pub mod policy;
#[allow(missing_docs, clippy::derive_partial_eq_without_eq)]
pub mod proto;

pub use account::{Account, AccountDecoder, Accounts, ProtoAccountDecoder};
pub use client::QueryClient;
pub use context::{QueryContext, TrustMode};
pub use error::{QueryError, VerificationError};
pub use path::QueryPath;
pub use policy::{ProofPolicy, QueryClass};
