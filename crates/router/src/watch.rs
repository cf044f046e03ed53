// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dynamic config hot-reload.
//!
//! The running config is held behind a [`ConfigHandle`]; every message takes
//! a snapshot, so a reload mid-dialog only affects subsequent messages. The
//! watcher uses `notify` filesystem events with a polling fallback and keeps
//! the last good config when a reload fails to parse or validate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RouterConfig;

/// Shared handle to the current dynamic router config.
#[derive(Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<RouterConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: RouterConfig) -> Self {
        Self { current: Arc::new(RwLock::new(Arc::new(config))) }
    }

    /// The config snapshot to use for one message.
    pub async fn snapshot(&self) -> Arc<RouterConfig> {
        Arc::clone(&*self.current.read().await)
    }

    /// Swap in a new config.
    pub async fn replace(&self, config: RouterConfig) {
        *self.current.write().await = Arc::new(config);
    }
}

/// Watches the router config file and swaps reloaded versions into a
/// [`ConfigHandle`].
pub struct ConfigWatcher {
    path: PathBuf,
    handle: ConfigHandle,
    poll_interval: Duration,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf, handle: ConfigHandle) -> Self {
        Self { path, handle, poll_interval: Duration::from_secs(30) }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run until shutdown, reloading on filesystem events or each poll tick.
    pub async fn run(self, shutdown: CancellationToken) {
        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
        let _watcher = self.setup_notify_watcher(wake_tx);

        let mut poll_interval = tokio::time::interval(self.poll_interval);
        poll_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; the config was already loaded.
        poll_interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = wake_rx.recv() => {}
                _ = poll_interval.tick() => {}
            }
            self.reload().await;
        }

        debug!("config watcher shutting down");
    }

    async fn reload(&self) {
        match RouterConfig::load(&self.path) {
            Ok(config) => {
                if *self.handle.snapshot().await != config {
                    info!(path = %self.path.display(), "router config reloaded");
                    self.handle.replace(config).await;
                }
            }
            Err(e) => {
                warn!(path = %self.path.display(), err = %e, "config reload failed, keeping previous");
            }
        }
    }

    /// Set up a `notify` watcher on the config file's parent directory.
    /// Returns the watcher handle (must be kept alive).
    fn setup_notify_watcher(
        &self,
        wake_tx: mpsc::Sender<()>,
    ) -> Option<notify::RecommendedWatcher> {
        use notify::{RecursiveMode, Watcher};

        let mut watcher = notify::recommended_watcher(move |_: notify::Result<notify::Event>| {
            let _ = wake_tx.try_send(());
        })
        .ok()?;

        // Watch the parent directory so we detect replace-by-rename too
        let watch_path = self.path.parent().unwrap_or(self.path.as_ref());
        watcher.watch(watch_path, RecursiveMode::NonRecursive).ok()?;

        Some(watcher)
    }
}

/// Spawn the config watcher as a background task.
pub fn spawn_config_watcher(watcher: ConfigWatcher, shutdown: CancellationToken) {
    tokio::spawn(async move {
        watcher.run(shutdown).await;
    });
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
