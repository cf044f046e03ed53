// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::routing::RoutingTable;

/// Menu-based application router for an interactive messaging bus.
#[derive(Debug, Parser)]
#[command(name = "appmux", version, about)]
pub struct Config {
    /// NATS server URL.
    #[arg(long, env = "APPMUX_NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// NATS auth token.
    #[arg(long, env = "APPMUX_NATS_TOKEN")]
    pub nats_token: Option<String>,

    /// Subject prefix for bus traffic.
    #[arg(long, env = "APPMUX_SUBJECT_PREFIX", default_value = "appmux")]
    pub subject_prefix: String,

    /// Key namespace for the session store and correlation cache.
    #[arg(long, env = "APPMUX_STORE_PREFIX", default_value = "appmux")]
    pub store_prefix: String,

    /// Path to the dynamic router config JSON file.
    #[arg(long, env = "APPMUX_ROUTER_CONFIG")]
    pub router_config: PathBuf,

    /// Maximum time in seconds to keep session data around.
    #[arg(long, env = "APPMUX_SESSION_EXPIRY", default_value = "300")]
    pub session_expiry: u64,

    /// Maximum time in seconds to keep outbound message correlations around.
    /// This is kept to handle async delivery events.
    #[arg(long, env = "APPMUX_MESSAGE_EXPIRY", default_value = "172800")]
    pub message_expiry: u64,

    /// Reply rendering style (plain or template).
    #[arg(long, env = "APPMUX_REPLY_STYLE", default_value = "plain")]
    pub reply_style: String,
}

/// Known reply rendering styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStyle {
    Plain,
    Template,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.session_expiry == 0 {
            anyhow::bail!("--session-expiry must be positive");
        }
        if self.message_expiry == 0 {
            anyhow::bail!("--message-expiry must be positive");
        }
        self.reply_style_enum()?;
        Ok(())
    }

    /// Parse the reply style string into an enum.
    pub fn reply_style_enum(&self) -> anyhow::Result<ReplyStyle> {
        match self.reply_style.to_lowercase().as_str() {
            "plain" => Ok(ReplyStyle::Plain),
            "template" => Ok(ReplyStyle::Template),
            other => anyhow::bail!("invalid reply style: {other}"),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_expiry)
    }

    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(self.message_expiry)
    }
}

/// One menu line: the label the user sees and the endpoint it routes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub label: String,
    pub endpoint: String,
}

/// Extra fields for the template reply style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub sub_title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Dynamic per-message configuration, reloaded from disk while running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Content for the menu title.
    #[serde(default = "default_menu_title")]
    pub menu_title: String,

    /// Application endpoints and their menu labels, in menu order.
    #[serde(default)]
    pub entries: Vec<MenuEntry>,

    /// Prompt shown when warning about an invalid choice.
    #[serde(default = "default_invalid_input_message")]
    pub invalid_input_message: String,

    /// Text for the retry option under the invalid-choice prompt.
    #[serde(default = "default_try_again_message")]
    pub try_again_message: String,

    /// Prompt shown when a configuration change invalidates an active
    /// session.
    #[serde(default = "default_error_message")]
    pub error_message: String,

    /// Routing table: connector name to endpoint name to target pair.
    pub routing_table: RoutingTable,

    /// Connectors whose inbound and event streams this worker consumes.
    #[serde(default)]
    pub receive_inbound_connectors: Vec<String>,

    /// Connectors whose outbound streams this worker consumes.
    #[serde(default)]
    pub receive_outbound_connectors: Vec<String>,

    /// Template decoration fields, used by the template reply style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateConfig>,
}

impl RouterConfig {
    /// Load and validate a router config from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: RouterConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the loaded configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.entries.is_empty() {
            anyhow::bail!("router config needs at least one menu entry");
        }
        if self.receive_inbound_connectors.is_empty() {
            anyhow::bail!("router config names no inbound connectors to consume");
        }
        Ok(())
    }

    /// The set of endpoints currently reachable from the menu. Computed from
    /// live config at handling time, never from session snapshots.
    pub fn target_endpoints(&self) -> HashSet<&str> {
        self.entries.iter().map(|entry| entry.endpoint.as_str()).collect()
    }
}

fn default_menu_title() -> String {
    "Please select a choice.".to_owned()
}

fn default_invalid_input_message() -> String {
    "That is an incorrect choice. Please enter the number of the menu item you wish to choose."
        .to_owned()
}

fn default_try_again_message() -> String {
    "Try Again".to_owned()
}

fn default_error_message() -> String {
    "Oops! We experienced a temporary error. Please try and dial the line again.".to_owned()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
