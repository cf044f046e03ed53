// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Appmux: menu-based application router for an interactive messaging bus.
//!
//! Sits between a user-facing transport connector and the configured
//! application connectors. On first contact it presents a numbered menu of
//! applications; once the user picks one, the dialog is routed to that
//! application until the session ends.

pub mod config;
pub mod dispatch;
pub mod menu;
pub mod message;
pub mod reply;
pub mod routing;
pub mod session;
pub mod states;
pub mod store;
pub mod test_support;
pub mod transport;
pub mod watch;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{Config, ReplyStyle, RouterConfig};
use crate::dispatch::Dispatcher;
use crate::reply::{PlainReplyRenderer, ReplyRenderer, TemplateReplyRenderer};
use crate::store::{CorrelationCache, KvStore, MemoryStore, SessionStore};
use crate::transport::nats::{spawn_subscriber, NatsBus};
use crate::watch::{spawn_config_watcher, ConfigHandle, ConfigWatcher};

/// Run the router until shutdown.
pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let router_config = RouterConfig::load(&config.router_config)?;
    let configs = ConfigHandle::new(router_config);
    let shutdown = CancellationToken::new();

    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let renderer: Arc<dyn ReplyRenderer> = match config.reply_style_enum()? {
        ReplyStyle::Plain => Arc::new(PlainReplyRenderer),
        ReplyStyle::Template => Arc::new(TemplateReplyRenderer),
    };

    let bus = NatsBus::connect(&config).await?;
    let client = bus.client();
    let dispatcher = Arc::new(Dispatcher::new(
        SessionStore::new(Arc::clone(&store), &config.store_prefix, config.session_ttl()),
        CorrelationCache::new(store, &config.store_prefix, config.message_ttl()),
        renderer,
        Arc::new(bus),
    ));

    spawn_config_watcher(
        ConfigWatcher::new(config.router_config.clone(), configs.clone()),
        shutdown.clone(),
    );
    spawn_subscriber(
        dispatcher,
        configs,
        client,
        config.subject_prefix.clone(),
        shutdown.clone(),
    );

    tracing::info!(prefix = %config.subject_prefix, "appmux running");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    shutdown.cancel();

    Ok(())
}
