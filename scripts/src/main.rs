use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use unity_deploy::{cli::Cli, utils::setup_client};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let rpc_url = cli.rpc_url();
    let opts = cli.deploy_options();
    let (client, chain_id) = setup_client(
        &cli.priv_key,
        &rpc_url,
        cli.expected_chain_id(),
        cli.confirmations,
        cli.confirmation_timeout(),
    )
    .await?;

    if let Err(e) = cli.command.run(client, chain_id, &opts).await {
        error!("{e}");
        return Err(e.into());
    }

    Ok(())
}
