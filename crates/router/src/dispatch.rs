// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle engine.
//!
//! Owns the load/create/save/clear cycle around every state-handler call and
//! the three processing entry points the bus feeds. `process_inbound` may
//! feed `process_outbound` for the replies a handler emits; the outbound
//! path never calls back into handlers, which is what keeps the flow
//! loop-free.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

use crate::config::RouterConfig;
use crate::message::{Event, SessionEvent, UserMessage};
use crate::reply::ReplyRenderer;
use crate::session::{Session, State};
use crate::states::{self, error_reply};
use crate::store::{CorrelationCache, SessionStore};
use crate::transport::BusPublisher;

/// Serializes message handling per user.
///
/// The store has no compare-and-set, so the full load/handle/save cycle for
/// message k must finish before message k+1 starts for the same user. Locks
/// are dropped from the registry once no task holds them.
#[derive(Default)]
struct UserGate {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserGate {
    async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id.to_owned()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Routes each user's dialog between the transport and the configured
/// applications, driving the per-user state handlers.
pub struct Dispatcher {
    sessions: SessionStore,
    cache: CorrelationCache,
    renderer: Arc<dyn ReplyRenderer>,
    bus: Arc<dyn BusPublisher>,
    gate: UserGate,
}

impl Dispatcher {
    pub fn new(
        sessions: SessionStore,
        cache: CorrelationCache,
        renderer: Arc<dyn ReplyRenderer>,
        bus: Arc<dyn BusPublisher>,
    ) -> Self {
        Self { sessions, cache, renderer, bus, gate: UserGate::default() }
    }

    /// Process one message from the user side.
    ///
    /// Any failure past session lookup clears the session and answers the
    /// user with the configured error message; the triggering message is
    /// otherwise abandoned.
    pub async fn process_inbound(
        &self,
        config: &RouterConfig,
        msg: &UserMessage,
        source_connector: &str,
    ) {
        let user_id = msg.from_addr.clone();
        let _guard = self.gate.acquire(&user_id).await;

        if let Err(e) = self.handle_inbound(config, msg, source_connector).await {
            error!(user_id = %user_id, err = %e, "inbound handling failed");
            if let Err(e) = self.sessions.clear(&user_id).await {
                error!(user_id = %user_id, err = %e, "session clear failed");
            }
            let reply = error_reply(config, msg);
            if let Err(e) = self.process_outbound(config, &reply, source_connector).await {
                error!(user_id = %user_id, err = %e, "error reply failed");
            }
        }
    }

    async fn handle_inbound(
        &self,
        config: &RouterConfig,
        msg: &UserMessage,
        source_connector: &str,
    ) -> anyhow::Result<()> {
        let user_id = &msg.from_addr;

        let mut session = match self.sessions.load(user_id).await? {
            Some(session) if msg.session_event != SessionEvent::New => {
                if msg.session_event == SessionEvent::Close {
                    return self.handle_session_close(config, &session, msg, source_connector).await;
                }
                debug!(user_id = %user_id, state = %session.state, "loaded session");
                session
            }
            _ => {
                debug!(user_id = %user_id, "creating session");
                self.sessions.create(user_id, Session::new(State::Start)).await?
            }
        };

        let state = session.state;
        let response =
            states::handle(state, self.renderer.as_ref(), config, &session, msg).await?;

        match response.next_state {
            None => self.sessions.clear(user_id).await?,
            Some(next_state) => {
                session.apply(response.update);
                session.state = next_state;
                if state != next_state {
                    debug!(user_id = %user_id, from = %state, to = %next_state, "state transition");
                }
                self.sessions.save(user_id, &session).await?;
            }
        }

        for (forwarded, endpoint) in &response.inbound {
            let Some(target) = config.routing_table.resolve(source_connector, endpoint) else {
                continue;
            };
            self.bus.publish_inbound(forwarded, target).await?;
        }
        for reply in &response.outbound {
            self.process_outbound(config, reply, source_connector).await?;
        }
        Ok(())
    }

    /// An inbound `close`: notify the active application, if any, then drop
    /// the session regardless.
    async fn handle_session_close(
        &self,
        config: &RouterConfig,
        session: &Session,
        msg: &UserMessage,
        source_connector: &str,
    ) -> anyhow::Result<()> {
        let mut publish_result = Ok(());
        if session.state == State::Selected {
            if let Some(active_endpoint) = session.active_endpoint.as_deref() {
                if config.target_endpoints().contains(active_endpoint) {
                    if let Some(target) =
                        config.routing_table.resolve(source_connector, active_endpoint)
                    {
                        publish_result = self.bus.publish_inbound(msg, target).await;
                    }
                }
            }
        }
        self.sessions.clear(&msg.from_addr).await?;
        publish_result
    }

    /// Process one message from an application toward the user: record the
    /// correlation for late delivery events, then route to the transport.
    pub async fn process_outbound(
        &self,
        config: &RouterConfig,
        msg: &UserMessage,
        source_connector: &str,
    ) -> anyhow::Result<()> {
        let user_id = &msg.to_addr;

        if msg.session_event == SessionEvent::Close
            && self.sessions.load(user_id).await?.is_some()
        {
            debug!(user_id = %user_id, "application closed the dialog");
            self.sessions.clear(user_id).await?;
        }

        self.cache.put(&msg.message_id, user_id).await?;

        let Some(target) = config.routing_table.resolve(source_connector, &msg.routing_endpoint)
        else {
            return Ok(());
        };
        self.bus.publish_outbound(msg, target).await
    }

    /// Route a delivery event back to the application that owns the dialog,
    /// recovered through the correlation cache.
    pub async fn process_event(
        &self,
        config: &RouterConfig,
        event: &Event,
        source_connector: &str,
    ) -> anyhow::Result<()> {
        let Some(user_id) = self.cache.get(&event.user_message_id).await? else {
            warn!(
                user_message_id = %event.user_message_id,
                "no cached user for event, dropping",
            );
            return Ok(());
        };

        let active_endpoint = match self.sessions.load(&user_id).await? {
            Some(session) => session.active_endpoint,
            None => None,
        };
        let Some(active_endpoint) = active_endpoint else {
            debug!(user_id = %user_id, "no active endpoint for event, dropping");
            return Ok(());
        };

        let Some(target) = config.routing_table.resolve(source_connector, &active_endpoint)
        else {
            return Ok(());
        };
        self.bus.publish_event(event, target).await
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
