//! Runs a parsed command against a node.

use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Value};
use verified_query::{ProofPolicy, ProtoAccountDecoder, QueryClient, QueryContext};
use verified_query_light_client::{HeaderCertifier, LightClient};
use verified_query_node_client::{HttpNodeClient, NodeClient};

use crate::{
    cli::{Commands, VerifiedQueryCli},
    config::VerifiedQueryConfig,
};

/// Connects to the configured node, sets up verification and runs the command.
///
/// # Errors
/// Returns an error if the node cannot be reached, the light client cannot be bootstrapped,
/// or the query fails.
pub async fn run(cli: &VerifiedQueryCli, config: &VerifiedQueryConfig) -> anyhow::Result<Value> {
    let node = Arc::new(
        HttpNodeClient::connect(&config.rpc_url)
            .await
            .with_context(|| format!("failed to connect to {}", config.rpc_url))?,
    );

    let trust_node = cli.trust_node || config.trust_node;
    let certifier: Option<Arc<dyn HeaderCertifier>> = match (&config.light_client, trust_node) {
        (Some(light_client), false) => {
            let client = LightClient::bootstrap(
                Arc::clone(&node),
                light_client.trusted_height,
                light_client.trusted_hash()?,
                light_client.options(cli.trust_level)?,
            )
            .await
            .context("failed to bootstrap the light client")?;
            let certifier: Arc<dyn HeaderCertifier> = Arc::new(client);
            Some(certifier)
        }
        _ => None,
    };

    let ctx = QueryContext::from_flags(cli.height, trust_node, certifier)?;
    let client = QueryClient::with_policy(node, policy(config));

    execute(&client, &cli.command, &ctx, &config.account_store).await
}

/// The subpath classification described by `config`.
#[must_use]
pub fn policy(config: &VerifiedQueryConfig) -> ProofPolicy {
    ProofPolicy::default().with_unprovable(config.unprovable_subpaths.iter().cloned())
}

/// Runs `command` with `client` and renders the result as JSON.
///
/// # Errors
/// Returns an error if a key argument is malformed or the query fails.
pub async fn execute<C: NodeClient>(
    client: &QueryClient<C>,
    command: &Commands,
    ctx: &QueryContext,
    account_store: &str,
) -> anyhow::Result<Value> {
    match command {
        Commands::Raw(cmd) => {
            let key = cmd.key.bytes()?;
            let value = client.query(&cmd.path, &key, ctx).await?;
            Ok(entry(&key, &value))
        }
        Commands::Store(cmd) => {
            let key = cmd.key.bytes()?;
            let value = client.query_store(&key, &cmd.store, ctx).await?;
            Ok(entry(&key, &value))
        }
        Commands::Subspace(cmd) => {
            let prefix = cmd.prefix.bytes()?;
            let pairs = client.query_subspace(&prefix, &cmd.store, ctx).await?;
            Ok(Value::Array(
                pairs
                    .iter()
                    .map(|pair| entry(&pair.key, &pair.value))
                    .collect(),
            ))
        }
        Commands::Account(cmd) => {
            let address = hex::decode(cmd.address.trim_start_matches("0x"))
                .with_context(|| format!("invalid hex address `{}`", cmd.address))?;
            let store = cmd.store.as_deref().unwrap_or(account_store);
            let account = client
                .accounts(ProtoAccountDecoder, store)
                .get_account(&address, ctx)
                .await?;

            Ok(account.map_or(Value::Null, |account| {
                json!({
                    "address": account.address,
                    "account_number": account.account_number,
                    "sequence": account.sequence,
                })
            }))
        }
    }
}

fn entry(key: &[u8], value: &[u8]) -> Value {
    json!({
        "key": hex::encode(key),
        "value": hex::encode(value),
        "exists": !value.is_empty(),
    })
}
