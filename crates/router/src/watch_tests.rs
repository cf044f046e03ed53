// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{ConfigHandle, ConfigWatcher};
use crate::test_support::sample_router_config;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn snapshot_returns_the_current_config() {
    let handle = ConfigHandle::new(sample_router_config());
    assert_eq!(*handle.snapshot().await, sample_router_config());

    let mut updated = sample_router_config();
    updated.menu_title = "Pick one.".to_owned();
    handle.replace(updated.clone()).await;
    assert_eq!(*handle.snapshot().await, updated);
}

#[tokio::test]
async fn watcher_swaps_in_a_changed_config() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("router.json");
    std::fs::write(&path, serde_json::to_string(&sample_router_config())?)?;

    let handle = ConfigHandle::new(sample_router_config());
    let shutdown = CancellationToken::new();
    let watcher = ConfigWatcher::new(path.clone(), handle.clone())
        .with_poll_interval(Duration::from_millis(25));
    let task = tokio::spawn(watcher.run(shutdown.clone()));

    let mut updated = sample_router_config();
    updated.menu_title = "Pick one.".to_owned();
    std::fs::write(&path, serde_json::to_string(&updated)?)?;

    let deadline = tokio::time::Instant::now() + TIMEOUT;
    loop {
        if *handle.snapshot().await == updated {
            break;
        }
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("config never reloaded");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    shutdown.cancel();
    task.await?;
    Ok(())
}

#[tokio::test]
async fn broken_reload_keeps_the_previous_config() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("router.json");
    std::fs::write(&path, serde_json::to_string(&sample_router_config())?)?;

    let handle = ConfigHandle::new(sample_router_config());
    let shutdown = CancellationToken::new();
    let watcher = ConfigWatcher::new(path.clone(), handle.clone())
        .with_poll_interval(Duration::from_millis(25));
    let task = tokio::spawn(watcher.run(shutdown.clone()));

    // Both unparseable JSON and a config that fails validation are rejected.
    std::fs::write(&path, "not json")?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*handle.snapshot().await, sample_router_config());

    let mut empty_menu = sample_router_config();
    empty_menu.entries.clear();
    std::fs::write(&path, serde_json::to_string(&empty_menu)?)?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*handle.snapshot().await, sample_router_config());

    shutdown.cancel();
    task.await?;
    Ok(())
}
