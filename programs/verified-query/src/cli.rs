//! Contains the command line interface for the application.

use clap::{Args, Parser, Subcommand};
use tendermint_light_client_verifier::types::TrustThreshold;

/// The command line interface for verified queries.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct VerifiedQueryCli {
    /// Path to the JSON configuration file.
    #[clap(long, short = 'c', env = "VERIFIED_QUERY_CONFIG", default_value = "config.json")]
    pub config: String,

    /// Height to run the query at. The latest height when omitted.
    #[clap(long)]
    pub height: Option<u64>,

    /// Take the node's answer without asking for or checking proofs.
    #[clap(long)]
    pub trust_node: bool,

    /// Overrides the trust level of the configured light client.
    #[clap(
        long,
        value_parser = parse_trust_threshold,
        help = "Trust level as a fraction, e.g. '2/3'",
    )]
    pub trust_level: Option<TrustThreshold>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The subcommands of the client.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run an ABCI query at an arbitrary path.
    Raw(RawCmd),
    /// Read a single key of a store.
    Store(StoreCmd),
    /// List the entries of a store under a prefix. The result is never verified.
    Subspace(SubspaceCmd),
    /// Read an account.
    Account(AccountCmd),
}

/// A key given on the command line.
#[derive(Clone, Debug, Args)]
pub struct KeyArgs {
    /// The key, as UTF-8 text unless `--hex` is set.
    pub key: String,

    /// Indicates that the key is hex encoded.
    #[clap(long)]
    pub hex: bool,
}

impl KeyArgs {
    /// The raw key bytes.
    ///
    /// # Errors
    /// Returns an error if `--hex` is set and the key is not valid hex.
    pub fn bytes(&self) -> anyhow::Result<Vec<u8>> {
        decode_key(&self.key, self.hex)
    }
}

/// The arguments of the `raw` subcommand.
#[derive(Clone, Debug, Args)]
pub struct RawCmd {
    /// Query path in the form `/queryType/storeName/subpath`.
    pub path: String,

    /// The query key.
    #[clap(flatten)]
    pub key: KeyArgs,
}

/// The arguments of the `store` subcommand.
#[derive(Clone, Debug, Args)]
pub struct StoreCmd {
    /// Name of the store.
    pub store: String,

    /// The key to read.
    #[clap(flatten)]
    pub key: KeyArgs,
}

/// The arguments of the `subspace` subcommand.
#[derive(Clone, Debug, Args)]
pub struct SubspaceCmd {
    /// Name of the store.
    pub store: String,

    /// The key prefix to scan.
    #[clap(flatten)]
    pub prefix: KeyArgs,
}

/// The arguments of the `account` subcommand.
#[derive(Clone, Debug, Args)]
pub struct AccountCmd {
    /// Hex encoded account address.
    pub address: String,

    /// Account store to read from instead of the configured one.
    #[clap(long)]
    pub store: Option<String>,
}

/// Decodes a key given as text, or as hex if `hex` is set.
///
/// # Errors
/// Returns an error if `hex` is set and `key` is not valid hex.
pub fn decode_key(key: &str, hex: bool) -> anyhow::Result<Vec<u8>> {
    if hex {
        hex::decode(key.trim_start_matches("0x"))
            .map_err(|e| anyhow::anyhow!("invalid hex key `{key}`: {e}"))
    } else {
        Ok(key.as_bytes().to_vec())
    }
}

/// Parses a trust threshold written as `numerator/denominator`.
///
/// # Errors
/// Returns an error if `input` is not a valid fraction or not a valid trust threshold.
pub fn parse_trust_threshold(input: &str) -> anyhow::Result<TrustThreshold> {
    let (num_part, denom_part) = input.split_once('/').ok_or_else(|| {
        anyhow::anyhow!("invalid trust threshold fraction: expected format 'numerator/denominator'")
    })?;
    let numerator = num_part
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid numerator for the fraction"))?;
    let denominator = denom_part
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid denominator for the fraction"))?;
    TrustThreshold::new(numerator, denominator)
        .map_err(|e| anyhow::anyhow!("invalid trust threshold: {}", e))
}
