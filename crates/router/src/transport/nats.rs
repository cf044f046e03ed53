// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NATS bindings for the bus.
//!
//! Subscribes to `{prefix}.>` and consumes:
//! - `{connector}.inbound` for connectors in `receive_inbound_connectors`
//! - `{connector}.event` for connectors in `receive_inbound_connectors`
//! - `{connector}.outbound` for connectors in `receive_outbound_connectors`
//!
//! Everything else on the prefix — including this worker's own publishes —
//! is filtered out by the connector lists.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::message::{Event, UserMessage};
use crate::routing::Target;
use crate::transport::{subject, BusPublisher, PublishFuture, Stream};
use crate::watch::ConfigHandle;

/// Publishes routed traffic to NATS subjects.
pub struct NatsBus {
    client: async_nats::Client,
    prefix: String,
}

impl NatsBus {
    /// Connect to the NATS server and return a bus handle.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let mut opts = async_nats::ConnectOptions::new();
        if let Some(ref token) = config.nats_token {
            opts = opts.token(token.clone());
        }
        opts = opts.retry_on_initial_connect();

        info!(url = %config.nats_url, prefix = %config.subject_prefix, "connecting to NATS");
        let client = opts.connect(&config.nats_url).await?;
        info!("NATS connected");

        Ok(Self { client, prefix: config.subject_prefix.clone() })
    }

    /// Clone of the underlying client, for the subscriber loop.
    pub fn client(&self) -> async_nats::Client {
        self.client.clone()
    }

    async fn publish(
        &self,
        target: &Target,
        stream: Stream,
        payload: Vec<u8>,
    ) -> anyhow::Result<()> {
        let subject = subject(&self.prefix, &target.connector, stream);
        self.client.publish(subject, payload.into()).await?;
        Ok(())
    }
}

impl BusPublisher for NatsBus {
    fn publish_inbound<'a>(
        &'a self,
        msg: &'a UserMessage,
        target: &'a Target,
    ) -> PublishFuture<'a> {
        Box::pin(async move {
            let mut msg = msg.clone();
            msg.routing_endpoint = target.endpoint.clone();
            self.publish(target, Stream::Inbound, serde_json::to_vec(&msg)?).await
        })
    }

    fn publish_outbound<'a>(
        &'a self,
        msg: &'a UserMessage,
        target: &'a Target,
    ) -> PublishFuture<'a> {
        Box::pin(async move {
            let mut msg = msg.clone();
            msg.routing_endpoint = target.endpoint.clone();
            self.publish(target, Stream::Outbound, serde_json::to_vec(&msg)?).await
        })
    }

    fn publish_event<'a>(&'a self, event: &'a Event, target: &'a Target) -> PublishFuture<'a> {
        Box::pin(async move {
            let mut event = event.clone();
            event.routing_endpoint = target.endpoint.clone();
            self.publish(target, Stream::Event, serde_json::to_vec(&event)?).await
        })
    }
}

/// Spawn the bus subscriber as a background task.
pub fn spawn_subscriber(
    dispatcher: Arc<Dispatcher>,
    configs: ConfigHandle,
    client: async_nats::Client,
    prefix: String,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        if let Err(e) = run_subscriber(dispatcher, configs, client, &prefix, shutdown).await {
            tracing::error!(err = %e, "bus subscriber failed");
        }
    });
}

async fn run_subscriber(
    dispatcher: Arc<Dispatcher>,
    configs: ConfigHandle,
    client: async_nats::Client,
    prefix: &str,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let mut sub = client.subscribe(format!("{prefix}.>")).await?;
    info!(prefix, "bus subscriber listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            msg = sub.next() => {
                let Some(msg) = msg else { break };
                // Parse subject: {prefix}.{connector}.{stream}
                let suffix = match msg.subject.as_str().strip_prefix(prefix) {
                    Some(s) => s.strip_prefix('.').unwrap_or(s),
                    None => continue,
                };
                let Some((connector, stream_name)) = suffix.split_once('.') else {
                    continue;
                };
                let Some(stream) = Stream::from_name(stream_name) else {
                    trace!(stream = stream_name, connector, "unknown stream, ignoring");
                    continue;
                };
                let config = configs.snapshot().await;

                match stream {
                    Stream::Inbound if named(&config.receive_inbound_connectors, connector) => {
                        let user_msg: UserMessage = match serde_json::from_slice(&msg.payload) {
                            Ok(m) => m,
                            Err(e) => {
                                debug!(connector, err = %e, "invalid inbound payload");
                                continue;
                            }
                        };
                        dispatcher.process_inbound(&config, &user_msg, connector).await;
                    }
                    Stream::Event if named(&config.receive_inbound_connectors, connector) => {
                        let event: Event = match serde_json::from_slice(&msg.payload) {
                            Ok(ev) => ev,
                            Err(e) => {
                                debug!(connector, err = %e, "invalid event payload");
                                continue;
                            }
                        };
                        if let Err(e) = dispatcher.process_event(&config, &event, connector).await {
                            warn!(connector, err = %e, "event handling failed");
                        }
                    }
                    Stream::Outbound if named(&config.receive_outbound_connectors, connector) => {
                        let user_msg: UserMessage = match serde_json::from_slice(&msg.payload) {
                            Ok(m) => m,
                            Err(e) => {
                                debug!(connector, err = %e, "invalid outbound payload");
                                continue;
                            }
                        };
                        if let Err(e) =
                            dispatcher.process_outbound(&config, &user_msg, connector).await
                        {
                            warn!(connector, err = %e, "outbound handling failed");
                        }
                    }
                    _ => {
                        trace!(connector, stream = stream_name, "not a receive connector, ignoring");
                    }
                }
            }
        }
    }

    debug!("bus subscriber shutting down");
    Ok(())
}

fn named(connectors: &[String], connector: &str) -> bool {
    connectors.iter().any(|name| name == connector)
}
