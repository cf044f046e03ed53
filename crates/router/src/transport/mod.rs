// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus bindings: the publish seam the dispatcher routes through, and the
//! subject scheme shared by publisher and subscriber.

pub mod nats;

use std::future::Future;
use std::pin::Pin;

use crate::message::{Event, UserMessage};
use crate::routing::Target;

pub type PublishFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Per-connector stream kinds on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Inbound,
    Outbound,
    Event,
}

impl Stream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Event => "event",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            "event" => Some(Self::Event),
            _ => None,
        }
    }
}

/// Subject carrying one stream of one connector: `{prefix}.{connector}.{stream}`.
pub fn subject(prefix: &str, connector: &str, stream: Stream) -> String {
    format!("{prefix}.{connector}.{}", stream.as_str())
}

/// Publishes routed traffic to peer connectors.
///
/// Object-safe for use as `Arc<dyn BusPublisher>`. Implementations stamp the
/// target endpoint onto the message before it leaves. The dispatcher never
/// retries a publish.
pub trait BusPublisher: Send + Sync {
    fn publish_inbound<'a>(&'a self, msg: &'a UserMessage, target: &'a Target)
        -> PublishFuture<'a>;

    fn publish_outbound<'a>(
        &'a self,
        msg: &'a UserMessage,
        target: &'a Target,
    ) -> PublishFuture<'a>;

    fn publish_event<'a>(&'a self, event: &'a Event, target: &'a Target) -> PublishFuture<'a>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
