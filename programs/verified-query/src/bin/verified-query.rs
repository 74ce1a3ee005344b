use clap::Parser;
use tracing::info;
use verified_query_cli::{
    cli::VerifiedQueryCli, config::VerifiedQueryConfig, runner, tracing::init_subscriber,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = VerifiedQueryCli::parse();
    let config = VerifiedQueryConfig::from_file(&cli.config)?;

    init_subscriber(config.log_level())?;
    info!(rpc_url = %config.rpc_url, "Tracing initialized with level: {}", config.log_level());

    let output = runner::run(&cli, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
