// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full user journeys through the router: menu, selection, ongoing dialog,
//! delivery events, and session close.

use appmux::message::SessionEvent;
use appmux::session::State;
use appmux::test_support::{
    ack_event, inbound_message, sample_router_config, target, DispatcherBuilder,
};
use appmux_specs::app_message;

#[tokio::test]
async fn menu_to_game_over() -> anyhow::Result<()> {
    let config = sample_router_config();
    let ctx = DispatcherBuilder::new().build();

    // First contact: the user dials in and gets the menu.
    let hello = inbound_message("123", None, SessionEvent::New);
    ctx.dispatcher.process_inbound(&config, &hello, "transport").await;

    let outbound = ctx.bus.outbound().await;
    let (menu, menu_target) =
        outbound.last().ok_or_else(|| anyhow::anyhow!("no menu reply"))?;
    assert_eq!(menu.content.as_deref(), Some("Please select a choice.\n1) Flappy Bird"));
    assert_eq!(menu_target, &target("transport", "default"));

    // The user picks entry 1; the application gets a synthetic session start.
    let pick = inbound_message("123", Some("1"), SessionEvent::Resume);
    ctx.dispatcher.process_inbound(&config, &pick, "transport").await;

    let inbound = ctx.bus.inbound().await;
    let (start, start_target) =
        inbound.last().ok_or_else(|| anyhow::anyhow!("no forwarded start"))?;
    assert_eq!(start_target, &target("app1", "default"));
    assert_eq!(start.content, None);
    assert_eq!(start.session_event, SessionEvent::New);

    // The application answers; the reply is routed to the transport and
    // correlated for later events.
    let welcome = app_message("123", "Flappy Flappy!", SessionEvent::Resume);
    ctx.dispatcher.process_outbound(&config, &welcome, "app1").await?;

    let outbound = ctx.bus.outbound().await;
    let (published, published_target) =
        outbound.last().ok_or_else(|| anyhow::anyhow!("no routed reply"))?;
    assert_eq!(published.content.as_deref(), Some("Flappy Flappy!"));
    assert_eq!(published_target, &target("transport", "default"));
    assert_eq!(ctx.cache.get(&welcome.message_id).await?, Some("123".to_owned()));

    // The transport acks the reply; the ack finds its way to the application.
    ctx.dispatcher.process_event(&config, &ack_event(&welcome.message_id), "transport").await?;
    let events = ctx.bus.events().await;
    let (_, event_target) = events.last().ok_or_else(|| anyhow::anyhow!("no routed event"))?;
    assert_eq!(event_target, &target("app1", "default"));

    // The dialog continues, forwarded verbatim.
    let up = inbound_message("123", Some("Up!"), SessionEvent::Resume);
    ctx.dispatcher.process_inbound(&config, &up, "transport").await;

    let inbound = ctx.bus.inbound().await;
    let (forwarded, _) = inbound.last().ok_or_else(|| anyhow::anyhow!("no forwarded turn"))?;
    assert_eq!(forwarded.content.as_deref(), Some("Up!"));
    assert_eq!(forwarded.session_event, SessionEvent::Resume);

    // The application ends the game; the close reaches the user and the
    // session is gone.
    let game_over = app_message("123", "Game Over!", SessionEvent::Close);
    ctx.dispatcher.process_outbound(&config, &game_over, "app1").await?;

    let outbound = ctx.bus.outbound().await;
    let (closed, _) = outbound.last().ok_or_else(|| anyhow::anyhow!("no routed close"))?;
    assert_eq!(closed.content.as_deref(), Some("Game Over!"));
    assert_eq!(closed.session_event, SessionEvent::Close);
    assert_eq!(ctx.sessions.load("123").await?, None);

    // Dialing back in starts over with a fresh menu.
    let again = inbound_message("123", None, SessionEvent::New);
    ctx.dispatcher.process_inbound(&config, &again, "transport").await;
    assert_eq!(ctx.sessions.load("123").await?.map(|s| s.state), Some(State::Select));
    Ok(())
}

#[tokio::test]
async fn wrong_turns_recover_into_a_selection() -> anyhow::Result<()> {
    let config = sample_router_config();
    let ctx = DispatcherBuilder::new().build();

    let hello = inbound_message("456", None, SessionEvent::New);
    ctx.dispatcher.process_inbound(&config, &hello, "transport").await;

    // Two bad answers in a row, then the retry option, then a valid pick.
    for content in ["maybe?", "7"] {
        let msg = inbound_message("456", Some(content), SessionEvent::Resume);
        ctx.dispatcher.process_inbound(&config, &msg, "transport").await;
    }
    assert_eq!(ctx.sessions.load("456").await?.map(|s| s.state), Some(State::BadInput));

    let retry = inbound_message("456", Some("1"), SessionEvent::Resume);
    ctx.dispatcher.process_inbound(&config, &retry, "transport").await;
    assert_eq!(ctx.sessions.load("456").await?.map(|s| s.state), Some(State::Select));

    let pick = inbound_message("456", Some("1"), SessionEvent::Resume);
    ctx.dispatcher.process_inbound(&config, &pick, "transport").await;

    let session = ctx.sessions.load("456").await?.ok_or_else(|| anyhow::anyhow!("no session"))?;
    assert_eq!(session.state, State::Selected);
    assert_eq!(session.active_endpoint.as_deref(), Some("flappy-bird"));

    // Each bad answer produced exactly one prompt, nothing was forwarded
    // until the valid pick.
    let outbound = ctx.bus.outbound().await;
    let prompts = outbound
        .iter()
        .filter(|(msg, _)| msg.content.as_deref() == Some("Bad choice.\n\n1. Try Again"))
        .count();
    assert_eq!(prompts, 2);
    assert_eq!(ctx.bus.inbound().await.len(), 1);
    Ok(())
}
