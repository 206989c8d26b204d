use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::Context;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

use poolwatch::sources::{CoinGeckoClient, RpcChainSource};
use poolwatch::{HistoryStore, Recorder, Scheduler, Settings};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration
    let settings =
        Settings::new().context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    let interval_secs = settings.recorder.interval_secs;

    let user: Address = settings
        .recorder
        .user_address
        .parse()
        .context("Invalid user address in config")?;

    info!(
        "Loaded configuration pools={} user={} interval_secs={}",
        settings.pools.len(),
        user,
        interval_secs
    );

    let chain = Arc::new(
        RpcChainSource::new(&settings.rpc.url, user)
            .context("Failed to initialize RPC chain source")?,
    );

    // Probe connectivity once before the first round
    let block_number = chain
        .latest_block_number()
        .await
        .context("Failed to reach the RPC endpoint")?;
    info!("Connected to RPC endpoint block_number={}", block_number);

    for pool in &settings.pools {
        info!("Monitoring pool name={} address={}", pool.name, pool.address);
    }

    let prices =
        Arc::new(CoinGeckoClient::new().context("Failed to initialize price client")?);
    let store = HistoryStore::new(&settings.recorder.data_dir);

    let recorder = Recorder::new(store, prices, chain, interval_secs);
    let scheduler = Scheduler::new(recorder, settings.pools, interval_secs);

    let cancellation_token = CancellationToken::new();
    let scheduler_token = cancellation_token.child_token();
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(scheduler_token).await {
            error!("Scheduler failed: {:#}", e);
        }
    });

    info!("Recorder running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm_stream =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    info!("Waiting for scheduler to stop...");
    cancellation_token.cancel();
    let _ = scheduler_handle.await;

    info!("Shutdown complete");
    Ok(())
}
