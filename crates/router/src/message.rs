// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus message model: user messages and delivery events.

use serde::{Deserialize, Serialize};

/// Endpoint name used when a message carries no explicit routing endpoint.
pub const DEFAULT_ENDPOINT: &str = "default";

/// Session phase carried on every user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    New,
    Resume,
    Close,
}

/// A user-facing message travelling between the transport and an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub message_id: String,
    pub from_addr: String,
    pub to_addr: String,
    pub content: Option<String>,
    pub session_event: SessionEvent,
    #[serde(default = "default_endpoint")]
    pub routing_endpoint: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub helper_metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default = "default_true")]
    pub continue_session: bool,
}

impl UserMessage {
    /// Build a reply to this message: addresses swapped, fresh message id,
    /// routing endpoint reset to the default. A final reply (`continue_session
    /// = false`) closes the dialog on the transport side.
    pub fn reply(&self, content: impl Into<String>, continue_session: bool) -> UserMessage {
        UserMessage {
            message_id: uuid::Uuid::new_v4().to_string(),
            from_addr: self.to_addr.clone(),
            to_addr: self.from_addr.clone(),
            content: Some(content.into()),
            session_event: if continue_session { SessionEvent::Resume } else { SessionEvent::Close },
            routing_endpoint: DEFAULT_ENDPOINT.to_owned(),
            helper_metadata: serde_json::Map::new(),
            in_reply_to: Some(self.message_id.clone()),
            continue_session,
        }
    }

    /// Copy of this message carrying a synthetic session start for the
    /// application that is about to take the dialog over.
    pub fn forwarded_new(&self) -> UserMessage {
        let mut copy = self.clone();
        copy.content = None;
        copy.session_event = SessionEvent::New;
        copy
    }
}

/// Delivery event kinds reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Ack,
    Nack,
    DeliveryReport,
}

/// An asynchronous delivery event referring back to an outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub user_message_id: String,
    pub event_type: EventType,
    #[serde(default = "default_endpoint")]
    pub routing_endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_owned()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
