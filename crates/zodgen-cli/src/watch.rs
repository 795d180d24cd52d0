//! # Watch Subcommand
//!
//! Sweeps once, then polls the watch root on a fixed interval and applies
//! each non-empty change batch until Ctrl-C. Batches run on the blocking
//! pool; the coordinator's lock keeps them serialized.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::time::MissedTickBehavior;
use zodgen_core::Config;
use zodgen_sync::{PollWatcher, SyncCoordinator};

use crate::settings::FrontEndArgs;
use crate::sweep::print_summary;

/// Arguments for the watch subcommand.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Polling interval in milliseconds.
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(50..))]
    pub interval_ms: u64,

    #[command(flatten)]
    pub front_end: FrontEndArgs,
}

/// Execute the watch subcommand.
pub fn run_watch(args: &WatchArgs, config: &Config) -> Result<u8> {
    let coordinator = Arc::new(SyncCoordinator::new(config.clone(), args.front_end.front_end()?));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(watch_loop(coordinator, Duration::from_millis(args.interval_ms)))
}

async fn watch_loop(coordinator: Arc<SyncCoordinator>, interval: Duration) -> Result<u8> {
    let config = coordinator.config().clone();
    let mut watcher = PollWatcher::new(&config.watch_root, &config.source_extension);

    let sweeper = Arc::clone(&coordinator);
    let report = tokio::task::spawn_blocking(move || sweeper.sweep())
        .await
        .context("initial sweep panicked")?;
    println!("sweep:");
    print_summary(&report);

    tracing::info!(
        watch_root = %config.watch_root.display(),
        interval_ms = interval.as_millis() as u64,
        "watching for changes"
    );
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "failed to listen for Ctrl-C; stopping");
                }
                tracing::info!("shutting down");
                return Ok(0);
            }
            _ = ticker.tick() => {
                let reactor = Arc::clone(&coordinator);
                let (returned, report) = tokio::task::spawn_blocking(move || {
                    let changes = watcher.poll();
                    let report = (!changes.is_empty()).then(|| reactor.react(&changes));
                    (watcher, report)
                })
                .await
                .context("change batch panicked")?;
                watcher = returned;
                if let Some(report) = report {
                    println!("changes:");
                    print_summary(&report);
                }
            }
        }
    }
}
