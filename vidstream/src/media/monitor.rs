use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::pipeline::StreamStore;
use super::storage;

const ACTIVITY_INTERVAL: Duration = Duration::from_secs(5);
const SPACE_INTERVAL: Duration = Duration::from_secs(60);
const AGE_INTERVAL: Duration = Duration::from_secs(30);

/// Resolves once shutdown has been requested or the sender is gone.
async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    while !*shutdown_rx.borrow_and_update() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
}

/// Periodically stop transcoders nobody is watching.
pub fn spawn_activity_monitor(
    store: Arc<StreamStore>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ACTIVITY_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => store.sweep(Instant::now()).await,
                _ = shutdown_requested(&mut shutdown_rx) => return,
            }
        }
    })
}

/// Keep at least `min_free_bytes` free below `base` by dropping the oldest segments.
pub fn spawn_space_cleaner(
    base: PathBuf,
    min_free_bytes: u64,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SPACE_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let base = base.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        storage::prune_for_space(&base, min_free_bytes, storage::available_space)
                    })
                    .await;
                    match result {
                        Ok(Ok(0)) => {}
                        Ok(Ok(removed)) => {
                            log::info!("Removed {removed} segment(s) to free space");
                        }
                        Ok(Err(e)) => log::warn!("Space cleaner failed: {e}"),
                        Err(e) => log::error!("Space cleaner task panicked: {e}"),
                    }
                }
                _ = shutdown_requested(&mut shutdown_rx) => return,
            }
        }
    })
}

/// Drop segments older than `lifetime` from every channel directory below `base`.
pub fn spawn_age_cleaner(
    base: PathBuf,
    lifetime: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(AGE_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let base = base.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        storage::prune_expired_channels(&base, lifetime, SystemTime::now())
                    })
                    .await;
                    match result {
                        Ok(Ok(0)) => {}
                        Ok(Ok(removed)) => log::info!("Removed {removed} expired segment(s)"),
                        Ok(Err(e)) => log::warn!("Age cleaner failed: {e}"),
                        Err(e) => log::error!("Age cleaner task panicked: {e}"),
                    }
                }
                _ = shutdown_requested(&mut shutdown_rx) => return,
            }
        }
    })
}
