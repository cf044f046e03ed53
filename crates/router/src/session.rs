// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user dialog state held in the key-value store.
//!
//! The wire form is a flat string-to-string map so the store needs no
//! schema: `endpoints` is stored as a JSON array of endpoint names, the
//! snapshot taken when the menu was presented.

use std::collections::BTreeMap;
use std::fmt;

/// Dialog states a user moves through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Start,
    Select,
    Selected,
    BadInput,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Select => "select",
            Self::Selected => "selected",
            Self::BadInput => "bad_input",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "select" => Some(Self::Select),
            "selected" => Some(Self::Selected),
            "bad_input" => Some(Self::BadInput),
            _ => None,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's dialog state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub state: State,
    /// Endpoint names in menu order, snapshotted when the menu was presented.
    /// Menu-index resolution always uses this snapshot, never live config.
    pub endpoints: Vec<String>,
    /// The endpoint the user chose, once `state` reaches `selected`.
    pub active_endpoint: Option<String>,
    /// Stamped by the store on create.
    pub created_at: Option<String>,
}

/// Partial update a state handler requests on the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub endpoints: Option<Vec<String>>,
    pub active_endpoint: Option<String>,
}

impl Session {
    pub fn new(state: State) -> Self {
        Session { state, ..Default::default() }
    }

    /// Merge a handler's partial update into this session.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(endpoints) = patch.endpoints {
            self.endpoints = endpoints;
        }
        if let Some(active_endpoint) = patch.active_endpoint {
            self.active_endpoint = Some(active_endpoint);
        }
    }

    /// Encode for the store. Absent fields are omitted rather than written
    /// as empty strings.
    pub fn to_map(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let mut map = BTreeMap::new();
        map.insert("state".to_owned(), self.state.as_str().to_owned());
        if !self.endpoints.is_empty() {
            map.insert("endpoints".to_owned(), serde_json::to_string(&self.endpoints)?);
        }
        if let Some(ref active_endpoint) = self.active_endpoint {
            map.insert("active_endpoint".to_owned(), active_endpoint.clone());
        }
        if let Some(ref created_at) = self.created_at {
            map.insert("created_at".to_owned(), created_at.clone());
        }
        Ok(map)
    }

    /// Decode from the store. A map without a valid `state` is corrupt and
    /// surfaces as an error so the caller's recovery path can clear it.
    pub fn from_map(map: &BTreeMap<String, String>) -> anyhow::Result<Self> {
        let state = map
            .get("state")
            .and_then(|s| State::from_name(s))
            .ok_or_else(|| anyhow::anyhow!("session record has no valid state"))?;
        let endpoints = match map.get("endpoints") {
            Some(raw) => serde_json::from_str(raw)?,
            None => Vec::new(),
        };
        Ok(Session {
            state,
            endpoints,
            active_endpoint: map.get("active_endpoint").cloned(),
            created_at: map.get("created_at").cloned(),
        })
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
