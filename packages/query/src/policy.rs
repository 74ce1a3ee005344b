//! Classification of query subpaths into provable and unprovable queries.

use std::collections::BTreeSet;

use crate::error::QueryError;

/// Subpath of a single key lookup.
pub const SUBPATH_KEY: &str = "key";
/// Subpath of a prefix scan.
pub const SUBPATH_SUBSPACE: &str = "subspace";

/// Whether a response to a query class can be verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryClass {
    /// A single key/value pair backed by a range proof.
    Provable,
    /// An aggregate result no range proof can attest to.
    Unprovable,
}

/// The explicit set of subpaths the client knows how to treat.
///
/// `key` is provable and `subspace` is not. Anything else must be registered before it can be
/// queried in verified mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofPolicy {
    provable: BTreeSet<String>,
    unprovable: BTreeSet<String>,
}

impl Default for ProofPolicy {
    fn default() -> Self {
        Self {
            provable: BTreeSet::from([SUBPATH_KEY.to_string()]),
            unprovable: BTreeSet::from([SUBPATH_SUBSPACE.to_string()]),
        }
    }
}

impl ProofPolicy {
    /// Registers extra subpaths whose responses are returned without verification.
    ///
    /// A subpath already known as provable stays provable.
    #[must_use]
    pub fn with_unprovable<I, S>(mut self, subpaths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for subpath in subpaths {
            let subpath = subpath.into();
            if !self.provable.contains(&subpath) {
                self.unprovable.insert(subpath);
            }
        }
        self
    }

    /// Classifies `subpath`.
    ///
    /// # Errors
    /// Returns [`QueryError::UnsupportedSubpath`] for a subpath with no classification.
    pub fn classify(&self, subpath: &str) -> Result<QueryClass, QueryError> {
        if self.provable.contains(subpath) {
            Ok(QueryClass::Provable)
        } else if self.unprovable.contains(subpath) {
            Ok(QueryClass::Unprovable)
        } else {
            Err(QueryError::UnsupportedSubpath(subpath.to_string()))
        }
    }
}
