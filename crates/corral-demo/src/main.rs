#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, DemoConfig};
use corral::Dispatcher;
use futures::future::join_all;
use std::sync::Arc;
use telemetry::init_telemetry;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = DemoConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let dispatcher = Arc::new(Dispatcher::new(config.dispatcher.clone())?);

    if !config.warmup.is_zero() {
        tokio::time::sleep(config.warmup).await;
    }

    tokio::select! {
        () = run_callers(Arc::clone(&dispatcher), config.callers) => {},
        () = ctrl_c() => {
            tracing::info!("Received Ctrl+C signal, abandoning remaining callers");
        },
    }

    dispatcher.shutdown().await?;

    let stats = dispatcher.stats();
    tracing::info!(
        submitted = stats.submitted,
        delivered = stats.delivered,
        dropped = stats.dropped,
        undeliverable = stats.undeliverable,
        "Demo finished"
    );

    Ok(())
}

/// Spawns `callers` tasks that each submit once and wait for their result.
async fn run_callers(dispatcher: Arc<Dispatcher>, callers: usize) {
    let tasks = (0..callers).map(|caller| {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let slot = dispatcher.submit().await?;
            let worker = slot.recv().await?;
            tracing::info!("Caller {caller} served by worker {worker}");
            Ok::<_, corral::Error>(())
        })
    });

    for (caller, result) in join_all(tasks).await.into_iter().enumerate() {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Caller {caller} failed: {e}"),
            Err(e) => tracing::error!("Caller {caller} panicked: {e}"),
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
}

fn log_startup_info(config: &DemoConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting demo with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting demo: {} callers over {} workers",
            config.callers,
            config.dispatcher.worker_count
        );
    }
}
