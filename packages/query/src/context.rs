//! Per-call query context.

use std::{fmt, sync::Arc};

use verified_query_light_client::HeaderCertifier;

use crate::error::QueryError;

/// How far a response is trusted.
#[derive(Clone)]
pub enum TrustMode {
    /// The node is trusted, no proof is requested or checked.
    Trusted,
    /// Every provable response is checked against headers certified by the handle.
    Verified(Arc<dyn HeaderCertifier>),
}

impl TrustMode {
    /// Whether responses are taken as-is.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted)
    }
}

impl fmt::Debug for TrustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trusted => f.write_str("Trusted"),
            Self::Verified(_) => f.write_str("Verified"),
        }
    }
}

/// Parameters of a single query.
#[derive(Clone, Debug)]
pub struct QueryContext {
    /// Height to pin the query to, latest when `None`
    pub height: Option<u64>,
    /// Trust mode of the call
    pub trust_mode: TrustMode,
}

impl QueryContext {
    /// A context taking the node's answer at face value.
    #[must_use]
    pub const fn trusted() -> Self {
        Self {
            height: None,
            trust_mode: TrustMode::Trusted,
        }
    }

    /// A context verifying responses with `certifier`.
    #[must_use]
    pub fn verified(certifier: Arc<dyn HeaderCertifier>) -> Self {
        Self {
            height: None,
            trust_mode: TrustMode::Verified(certifier),
        }
    }

    /// Builds a context from a "trust node" flag and an optional certifier.
    ///
    /// # Errors
    /// Returns [`QueryError::VerifierNotConfigured`] if the node is not trusted and no
    /// certifier is given.
    pub fn from_flags(
        height: Option<u64>,
        trust_node: bool,
        certifier: Option<Arc<dyn HeaderCertifier>>,
    ) -> Result<Self, QueryError> {
        let trust_mode = if trust_node {
            TrustMode::Trusted
        } else {
            TrustMode::Verified(certifier.ok_or(QueryError::VerifierNotConfigured)?)
        };

        Ok(Self { height, trust_mode })
    }

    /// Pins the query to `height`.
    #[must_use]
    pub fn at_height(mut self, height: u64) -> Self {
        self.height = Some(height);
        self
    }
}
