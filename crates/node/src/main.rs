//! Rollup relayer binary

use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_client::RpcClient;
use alloy_transport::layers::RetryBackoffLayer;
use clap::Parser;
use rollup_relayer::{RollupRelayer, RollupRelayerArgs};
use rollup_relayer_providers::{AlloyL1Provider, AlloyL2Provider, TimeoutProvider};
use scroll_db::{Database, DatabaseConnectionProvider};
use scroll_migration::{Migrator, MigratorTrait};
use std::{sync::Arc, time::Duration};

#[tokio::main]
async fn main() {
    init_tracing_subscriber();

    // Enable backtraces unless a RUST_BACKTRACE value has already been explicitly provided.
    if std::env::var_os("RUST_BACKTRACE").is_none() {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    if let Err(err) = run(RollupRelayerArgs::parse()).await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

async fn run(args: RollupRelayerArgs) -> eyre::Result<()> {
    args.validate().map_err(|err| eyre::eyre!(err))?;
    tracing::info!(target: "rollup_relayer::node", "Launching rollup relayer with args:\n{:#?}", args);

    // L2 provider
    let l2 = &args.l2_args;
    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(
            l2.max_retries,
            l2.initial_backoff,
            l2.compute_units_per_second,
        ))
        .http(l2.url.clone());
    let l2_provider =
        AlloyL2Provider::new(ProviderBuilder::new().connect_client(client), l2.contracts());
    let l2_provider = TimeoutProvider::new(l2_provider, Duration::from_secs(l2.rpc_timeout));

    // L1 provider
    let l1 = &args.l1_args;
    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(
            l1.max_retries,
            l1.initial_backoff,
            l1.compute_units_per_second,
        ))
        .http(l1.url.clone());
    let provider = ProviderBuilder::new().connect_client(client);
    let chain_id = match l1.chain_id {
        Some(chain_id) => chain_id,
        None => provider.get_chain_id().await?,
    };
    let l1_provider =
        TimeoutProvider::new(AlloyL1Provider::new(provider), Duration::from_secs(l1.rpc_timeout));

    // Database
    let database_url = args.database_args.url();
    let database = Database::new(&database_url).await?;
    Migrator::up(database.get_connection(), None).await?;
    let database = Arc::new(database);
    tracing::info!(target: "rollup_relayer::node", %database_url, "Opened database");

    let signer = Arc::new(args.signer_args.signer()?);
    let relayer =
        RollupRelayer::start(l2_provider, l1_provider, signer, database, args.config(chain_id))
            .await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!(target: "rollup_relayer::node", status = ?relayer.status().await?, "Received shutdown signal");
    relayer.close().await?;

    Ok(())
}

/// Initialize the tracing subscriber, logging at `info` unless `RUST_LOG` says otherwise.
fn init_tracing_subscriber() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
