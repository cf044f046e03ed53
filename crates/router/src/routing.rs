// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static routing table mapping `(connector, endpoint)` pairs to publish
//! targets. Rebuilt whenever the dynamic config reloads; never mutated at
//! runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A resolved publish destination on the bus.
///
/// The wire form is a two-element array `["connector", "endpoint"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Target {
    pub connector: String,
    pub endpoint: String,
}

impl From<(String, String)> for Target {
    fn from((connector, endpoint): (String, String)) -> Self {
        Self { connector, endpoint }
    }
}

impl From<Target> for (String, String) {
    fn from(target: Target) -> Self {
        (target.connector, target.endpoint)
    }
}

/// Lookup table keyed by source connector, then by endpoint name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    routes: HashMap<String, HashMap<String, Target>>,
}

impl RoutingTable {
    /// Resolve a `(connector, endpoint)` pair to its target.
    ///
    /// A missing key at either level is a soft failure: the caller drops the
    /// message and the session is left untouched.
    pub fn resolve(&self, connector: &str, endpoint: &str) -> Option<&Target> {
        let Some(endpoint_routes) = self.routes.get(connector) else {
            tracing::warn!(connector, "no routing information for connector");
            return None;
        };
        let target = endpoint_routes.get(endpoint);
        if target.is_none() {
            tracing::warn!(connector, endpoint, "no routing information for endpoint");
        }
        target
    }
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
