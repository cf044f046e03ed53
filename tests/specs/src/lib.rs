// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec-level tests driving the router through complete user journeys.
//!
//! The router's only external surfaces are the bus and the key-value store,
//! so these tests run the dispatcher in-process against the recording bus
//! and memory store from `appmux::test_support`.

use appmux::message::{SessionEvent, UserMessage, DEFAULT_ENDPOINT};

/// Outbound message as an application connector would publish it.
pub fn app_message(to_addr: &str, content: &str, session_event: SessionEvent) -> UserMessage {
    UserMessage {
        message_id: uuid::Uuid::new_v4().to_string(),
        from_addr: "flappy-bird-app".to_owned(),
        to_addr: to_addr.to_owned(),
        content: Some(content.to_owned()),
        session_event,
        routing_endpoint: DEFAULT_ENDPOINT.to_owned(),
        helper_metadata: serde_json::Map::new(),
        in_reply_to: None,
        continue_session: session_event != SessionEvent::Close,
    }
}
