// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-state message handlers.
//!
//! Each handler is a pure function of `(config, session, message)`; the
//! lifecycle engine owns all I/O and applies the returned [`StateResponse`].
//! Handlers are awaited even when a given one never suspends, so tests can
//! hook the suspension points.

use crate::config::RouterConfig;
use crate::menu::{choose_endpoint, parse_choice};
use crate::message::UserMessage;
use crate::reply::ReplyRenderer;
use crate::session::{Session, SessionPatch, State};

/// What a state handler asks the lifecycle engine to do.
#[derive(Debug, Default)]
pub struct StateResponse {
    /// `None` terminates the session.
    pub next_state: Option<State>,
    /// Partial update merged into the session before saving.
    pub update: SessionPatch,
    /// Messages to forward to applications, each with its target endpoint.
    pub inbound: Vec<(UserMessage, String)>,
    /// Messages to forward to the user. Emitted after the inbounds.
    pub outbound: Vec<UserMessage>,
}

/// The fatal reply sent when a configuration change or handler failure
/// invalidates the session.
pub fn error_reply(config: &RouterConfig, msg: &UserMessage) -> UserMessage {
    msg.reply(config.error_message.clone(), false)
}

/// Dispatch to the handler for `state`.
pub async fn handle(
    state: State,
    renderer: &dyn ReplyRenderer,
    config: &RouterConfig,
    session: &Session,
    msg: &UserMessage,
) -> anyhow::Result<StateResponse> {
    match state {
        State::Start => handle_start(renderer, config, session, msg).await,
        State::Select => handle_select(renderer, config, session, msg).await,
        State::Selected => handle_selected(config, session, msg).await,
        State::BadInput => handle_bad_input(renderer, config, session, msg).await,
    }
}

/// Present the menu and snapshot the endpoint list into the session. The
/// snapshot, not live config, is what menu-index resolution uses later in
/// the select state.
async fn handle_start(
    renderer: &dyn ReplyRenderer,
    config: &RouterConfig,
    session: &Session,
    msg: &UserMessage,
) -> anyhow::Result<StateResponse> {
    let reply = renderer.first_reply(config, session, msg).await;
    let endpoints: Vec<String> =
        config.entries.iter().map(|entry| entry.endpoint.clone()).collect();
    Ok(StateResponse {
        next_state: Some(State::Select),
        update: SessionPatch { endpoints: Some(endpoints), ..Default::default() },
        outbound: vec![reply],
        ..Default::default()
    })
}

/// Resolve the user's numeric choice against the menu snapshot and hand the
/// dialog over to the chosen application with a synthetic session start.
async fn handle_select(
    renderer: &dyn ReplyRenderer,
    config: &RouterConfig,
    session: &Session,
    msg: &UserMessage,
) -> anyhow::Result<StateResponse> {
    let Some(endpoint) = choose_endpoint(msg.content.as_deref(), &session.endpoints) else {
        let reply = renderer.invalid_input_reply(config, session, msg).await;
        return Ok(StateResponse {
            next_state: Some(State::BadInput),
            outbound: vec![reply],
            ..Default::default()
        });
    };

    if !config.target_endpoints().contains(endpoint) {
        tracing::info!(
            user_id = %msg.from_addr,
            endpoint,
            "configuration change forced session termination",
        );
        return Ok(StateResponse {
            next_state: None,
            outbound: vec![error_reply(config, msg)],
            ..Default::default()
        });
    }

    tracing::info!(user_id = %msg.from_addr, endpoint, "switched to endpoint");
    let endpoint = endpoint.to_owned();
    Ok(StateResponse {
        next_state: Some(State::Selected),
        update: SessionPatch { active_endpoint: Some(endpoint.clone()), ..Default::default() },
        inbound: vec![(msg.forwarded_new(), endpoint)],
        ..Default::default()
    })
}

/// Forward the ongoing dialog unchanged to the active endpoint, as long as
/// the current config still carries it.
async fn handle_selected(
    config: &RouterConfig,
    session: &Session,
    msg: &UserMessage,
) -> anyhow::Result<StateResponse> {
    let active_endpoint = session
        .active_endpoint
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("selected session has no active endpoint"))?;

    if !config.target_endpoints().contains(active_endpoint) {
        tracing::info!(
            user_id = %msg.from_addr,
            endpoint = active_endpoint,
            "configuration change forced session termination",
        );
        return Ok(StateResponse {
            next_state: None,
            outbound: vec![error_reply(config, msg)],
            ..Default::default()
        });
    }

    Ok(StateResponse {
        next_state: Some(State::Selected),
        inbound: vec![(msg.clone(), active_endpoint.to_owned())],
        ..Default::default()
    })
}

/// The user is looking at the invalid-choice prompt, which offers a single
/// option: `1` re-presents the menu, anything else repeats the prompt.
async fn handle_bad_input(
    renderer: &dyn ReplyRenderer,
    config: &RouterConfig,
    session: &Session,
    msg: &UserMessage,
) -> anyhow::Result<StateResponse> {
    match parse_choice(msg.content.as_deref(), 1, 1) {
        None => {
            let reply = renderer.invalid_input_reply(config, session, msg).await;
            Ok(StateResponse {
                next_state: Some(State::BadInput),
                outbound: vec![reply],
                ..Default::default()
            })
        }
        Some(_) => handle_start(renderer, config, session, msg).await,
    }
}

#[cfg(test)]
#[path = "states_tests.rs"]
mod tests;
