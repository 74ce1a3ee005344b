//! Defines the configuration file of the client.

use std::{path::Path, str::FromStr, time::Duration};

use anyhow::Context;
use tendermint::{hash::Algorithm, Hash};
use tracing::Level;
use verified_query::account::DEFAULT_ACCOUNT_STORE;
use verified_query_light_client::options::{
    LightClientOptions, DEFAULT_CLOCK_DRIFT, DEFAULT_MAX_BACKWARD_DISTANCE,
    DEFAULT_TRUSTING_PERIOD,
};

use crate::cli::parse_trust_threshold;

/// The top level configuration of the client.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
#[allow(clippy::module_name_repetitions)]
pub struct VerifiedQueryConfig {
    /// CometBFT RPC endpoint of the node to query.
    pub rpc_url: String,
    /// Take the node's answers at face value. Overridden by `--trust-node`.
    #[serde(default)]
    pub trust_node: bool,
    /// Store holding accounts.
    #[serde(default = "default_account_store")]
    pub account_store: String,
    /// The log level of the client.
    #[serde(default)]
    pub log_level: String,
    /// Subpaths, besides `subspace`, whose answers are returned without verification.
    #[serde(default)]
    pub unprovable_subpaths: Vec<String>,
    /// The light client certifying headers. Required unless the node is trusted.
    #[serde(default)]
    pub light_client: Option<LightClientConfig>,
}

/// The trust root and verification parameters of the light client.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
#[allow(clippy::module_name_repetitions)]
pub struct LightClientConfig {
    /// Height of the trusted header.
    pub trusted_height: u64,
    /// Hex encoded hash of the trusted header, obtained out of band.
    pub trusted_hash: String,
    /// Trust level as a fraction, e.g. `1/3`.
    #[serde(default = "default_trust_level")]
    pub trust_level: String,
    /// Trusting period in seconds.
    #[serde(default)]
    pub trusting_period_secs: Option<u64>,
    /// Tolerated clock drift in seconds.
    #[serde(default)]
    pub clock_drift_secs: Option<u64>,
    /// Maximum number of blocks walked back from the trusted header.
    #[serde(default)]
    pub max_backward_distance: Option<u64>,
}

fn default_account_store() -> String {
    DEFAULT_ACCOUNT_STORE.to_string()
}

fn default_trust_level() -> String {
    "1/3".to_string()
}

impl VerifiedQueryConfig {
    /// Reads and validates the configuration at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON for this configuration,
    /// or fails [`VerifiedQueryConfig::validate`].
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config_bz = std::fs::read(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_slice(&config_bz)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the values that deserialization alone does not.
    ///
    /// # Errors
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.rpc_url.is_empty(), "rpc_url must not be empty");
        anyhow::ensure!(
            !self.account_store.is_empty(),
            "account_store must not be empty"
        );
        anyhow::ensure!(
            self.log_level.is_empty() || Level::from_str(&self.log_level).is_ok(),
            "invalid log_level `{}`",
            self.log_level
        );
        for subpath in &self.unprovable_subpaths {
            anyhow::ensure!(
                !subpath.is_empty() && !subpath.contains('/'),
                "invalid unprovable subpath `{subpath}`"
            );
        }

        if let Some(light_client) = &self.light_client {
            light_client.validate()?;
        }
        Ok(())
    }

    /// Returns the log level of the client.
    #[must_use]
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

impl LightClientConfig {
    /// Checks the light client values.
    ///
    /// # Errors
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.trusted_height > 0, "trusted_height must be positive");
        anyhow::ensure!(
            self.trusting_period_secs != Some(0),
            "trusting_period_secs must be positive"
        );
        self.trusted_hash()?;
        self.options(None)?;
        Ok(())
    }

    /// The trusted header hash.
    ///
    /// # Errors
    /// Returns an error if `trusted_hash` is not a hex encoded SHA-256 hash.
    pub fn trusted_hash(&self) -> anyhow::Result<Hash> {
        let bytes = hex::decode(self.trusted_hash.trim_start_matches("0x"))
            .with_context(|| format!("invalid trusted_hash `{}`", self.trusted_hash))?;
        Hash::from_bytes(Algorithm::Sha256, &bytes)
            .map_err(|e| anyhow::anyhow!("invalid trusted_hash `{}`: {e}", self.trusted_hash))
    }

    /// The verification parameters, with `trust_level_override` taking precedence.
    ///
    /// # Errors
    /// Returns an error if `trust_level` is not a valid trust threshold.
    pub fn options(
        &self,
        trust_level_override: Option<tendermint_light_client_verifier::types::TrustThreshold>,
    ) -> anyhow::Result<LightClientOptions> {
        let trust_threshold = match trust_level_override {
            Some(threshold) => threshold,
            None => parse_trust_threshold(&self.trust_level)?,
        };

        Ok(LightClientOptions {
            trust_threshold,
            trusting_period: self
                .trusting_period_secs
                .map_or(DEFAULT_TRUSTING_PERIOD, Duration::from_secs),
            clock_drift: self
                .clock_drift_secs
                .map_or(DEFAULT_CLOCK_DRIFT, Duration::from_secs),
            max_backward_distance: self
                .max_backward_distance
                .unwrap_or(DEFAULT_MAX_BACKWARD_DISTANCE),
        })
    }
}
