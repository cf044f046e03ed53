// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: builders, mocks, and fixtures.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use crate::config::RouterConfig;
use crate::dispatch::Dispatcher;
use crate::message::{Event, EventType, SessionEvent, UserMessage, DEFAULT_ENDPOINT};
use crate::reply::{PlainReplyRenderer, RenderFuture, ReplyRenderer};
use crate::routing::Target;
use crate::session::Session;
use crate::store::{CorrelationCache, KvStore, MemoryStore, SessionStore};
use crate::transport::{BusPublisher, PublishFuture};

/// The standard single-entry router config used across tests.
pub fn sample_router_config() -> RouterConfig {
    let value = serde_json::json!({
        "invalid_input_message": "Bad choice.",
        "error_message": "Oops! Sorry!",
        "entries": [
            { "label": "Flappy Bird", "endpoint": "flappy-bird" },
        ],
        "routing_table": {
            "transport": {
                "flappy-bird": ["app1", "default"],
                "default": ["transport", "default"],
            },
            "app1": {
                "default": ["transport", "default"],
            },
        },
        "receive_inbound_connectors": ["transport"],
        "receive_outbound_connectors": ["app1", "app2"],
    });
    // OK to panic in test-only code — a broken fixture is fatal anyway.
    #[allow(clippy::expect_used)]
    serde_json::from_value(value).expect("parse sample router config")
}

/// Build an inbound message as the transport would deliver it.
pub fn inbound_message(
    from_addr: &str,
    content: Option<&str>,
    session_event: SessionEvent,
) -> UserMessage {
    UserMessage {
        message_id: uuid::Uuid::new_v4().to_string(),
        from_addr: from_addr.to_owned(),
        to_addr: "*menu*".to_owned(),
        content: content.map(str::to_owned),
        session_event,
        routing_endpoint: DEFAULT_ENDPOINT.to_owned(),
        helper_metadata: serde_json::Map::new(),
        in_reply_to: None,
        continue_session: true,
    }
}

/// Build an ack event referring to an earlier outbound message.
pub fn ack_event(user_message_id: &str) -> Event {
    Event {
        event_id: uuid::Uuid::new_v4().to_string(),
        user_message_id: user_message_id.to_owned(),
        event_type: EventType::Ack,
        routing_endpoint: DEFAULT_ENDPOINT.to_owned(),
    }
}

pub fn target(connector: &str, endpoint: &str) -> Target {
    Target { connector: connector.to_owned(), endpoint: endpoint.to_owned() }
}

/// A [`BusPublisher`] that records everything it is asked to publish,
/// stamping target endpoints the way the NATS bus does.
#[derive(Default)]
pub struct RecordingBus {
    inbound: Mutex<Vec<(UserMessage, Target)>>,
    outbound: Mutex<Vec<(UserMessage, Target)>>,
    events: Mutex<Vec<(Event, Target)>>,
}

impl RecordingBus {
    pub async fn inbound(&self) -> Vec<(UserMessage, Target)> {
        self.inbound.lock().await.clone()
    }

    pub async fn outbound(&self) -> Vec<(UserMessage, Target)> {
        self.outbound.lock().await.clone()
    }

    pub async fn events(&self) -> Vec<(Event, Target)> {
        self.events.lock().await.clone()
    }
}

impl BusPublisher for RecordingBus {
    fn publish_inbound<'a>(
        &'a self,
        msg: &'a UserMessage,
        target: &'a Target,
    ) -> PublishFuture<'a> {
        Box::pin(async move {
            let mut msg = msg.clone();
            msg.routing_endpoint = target.endpoint.clone();
            self.inbound.lock().await.push((msg, target.clone()));
            Ok(())
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
            self.outbound.lock().await.push((msg, target.clone()));
            Ok(())
        })
    }

    fn publish_event<'a>(&'a self, event: &'a Event, target: &'a Target) -> PublishFuture<'a> {
        Box::pin(async move {
            let mut event = event.clone();
            event.routing_endpoint = target.endpoint.clone();
            self.events.lock().await.push((event, target.clone()));
            Ok(())
        })
    }
}

/// Wraps the plain renderer and parks the first reply until released, so a
/// test can observe the stored session while the handler is suspended.
#[derive(Default)]
pub struct GatedRenderer {
    entered: Notify,
    release: Notify,
}

impl GatedRenderer {
    /// Wait until a handler has reached the parked render call.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked render call proceed.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

impl ReplyRenderer for GatedRenderer {
    fn first_reply<'a>(
        &'a self,
        config: &'a RouterConfig,
        session: &'a Session,
        msg: &'a UserMessage,
    ) -> RenderFuture<'a> {
        Box::pin(async move {
            self.entered.notify_one();
            self.release.notified().await;
            PlainReplyRenderer.first_reply(config, session, msg).await
        })
    }

    fn invalid_input_reply<'a>(
        &'a self,
        config: &'a RouterConfig,
        session: &'a Session,
        msg: &'a UserMessage,
    ) -> RenderFuture<'a> {
        PlainReplyRenderer.invalid_input_reply(config, session, msg)
    }
}

/// Test handle bundling a dispatcher with its recording bus and stores.
pub struct DispatcherCtx {
    pub dispatcher: Dispatcher,
    pub bus: Arc<RecordingBus>,
    pub sessions: SessionStore,
    pub cache: CorrelationCache,
}

/// Builder for constructing a [`Dispatcher`] in tests with sensible defaults.
pub struct DispatcherBuilder {
    store: Option<Arc<dyn KvStore>>,
    renderer: Option<Arc<dyn ReplyRenderer>>,
    session_ttl: Duration,
    message_ttl: Duration,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            renderer: None,
            session_ttl: Duration::from_secs(300),
            message_ttl: Duration::from_secs(172_800),
        }
    }

    pub fn store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ReplyRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn message_ttl(mut self, ttl: Duration) -> Self {
        self.message_ttl = ttl;
        self
    }

    pub fn build(self) -> DispatcherCtx {
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let sessions = SessionStore::new(Arc::clone(&store), "appmux", self.session_ttl);
        let cache = CorrelationCache::new(store, "appmux", self.message_ttl);
        let renderer = self.renderer.unwrap_or_else(|| Arc::new(PlainReplyRenderer));
        let bus = Arc::new(RecordingBus::default());
        let dispatcher = Dispatcher::new(
            sessions.clone(),
            cache.clone(),
            renderer,
            Arc::clone(&bus) as Arc<dyn BusPublisher>,
        );
        DispatcherCtx { dispatcher, bus, sessions, cache }
    }
}
