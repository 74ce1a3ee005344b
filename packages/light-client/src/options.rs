//! Verification parameters of the light client

use std::time::Duration;

use tendermint_light_client_verifier::{options::Options, types::TrustThreshold};

/// Default trusting period, two thirds of a 21 day unbonding period.
pub const DEFAULT_TRUSTING_PERIOD: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Default tolerated clock drift between the node and this host.
pub const DEFAULT_CLOCK_DRIFT: Duration = Duration::from_secs(15);

/// Default bound on hash-chain steps taken below the trusted checkpoint.
pub const DEFAULT_MAX_BACKWARD_DISTANCE: u64 = 1000;

/// Parameters of the light client.
#[derive(Clone, Debug, PartialEq)]
pub struct LightClientOptions {
    /// Fraction of the trusted voting power that must sign an untrusted header.
    pub trust_threshold: TrustThreshold,
    /// How long a trusted header may be used to verify newer ones.
    pub trusting_period: Duration,
    /// Tolerated clock drift.
    pub clock_drift: Duration,
    /// Maximum number of blocks walked back from the checkpoint to certify an older height.
    pub max_backward_distance: u64,
}

impl Default for LightClientOptions {
    fn default() -> Self {
        Self {
            trust_threshold: TrustThreshold::ONE_THIRD,
            trusting_period: DEFAULT_TRUSTING_PERIOD,
            clock_drift: DEFAULT_CLOCK_DRIFT,
            max_backward_distance: DEFAULT_MAX_BACKWARD_DISTANCE,
        }
    }
}

impl LightClientOptions {
    /// The options understood by the tendermint verifier.
    #[must_use]
    pub fn verifier_options(&self) -> Options {
        Options {
            trust_threshold: self.trust_threshold,
            trusting_period: self.trusting_period,
            clock_drift: self.clock_drift,
        }
    }
}
