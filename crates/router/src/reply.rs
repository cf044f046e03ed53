// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply rendering strategies.
//!
//! The dispatcher builds its menu and invalid-input replies through a
//! [`ReplyRenderer`] chosen at construction. Channel variants may decorate
//! `helper_metadata` (e.g. rich IM templates) but must preserve the base
//! text and message identity.

use std::future::Future;
use std::pin::Pin;

use serde_json::json;

use crate::config::RouterConfig;
use crate::menu::render_menu;
use crate::message::UserMessage;
use crate::session::Session;

pub type RenderFuture<'a> = Pin<Box<dyn Future<Output = UserMessage> + Send + 'a>>;

/// Builds the user-facing menu and invalid-input replies.
///
/// Object-safe for use as `Arc<dyn ReplyRenderer>`; implementations may
/// suspend, and the dispatcher always awaits them.
pub trait ReplyRenderer: Send + Sync {
    fn first_reply<'a>(
        &'a self,
        config: &'a RouterConfig,
        session: &'a Session,
        msg: &'a UserMessage,
    ) -> RenderFuture<'a>;

    fn invalid_input_reply<'a>(
        &'a self,
        config: &'a RouterConfig,
        session: &'a Session,
        msg: &'a UserMessage,
    ) -> RenderFuture<'a>;
}

/// Plain-text replies for character-oriented channels (USSD and the like).
pub struct PlainReplyRenderer;

fn plain_first_reply(config: &RouterConfig, msg: &UserMessage) -> UserMessage {
    msg.reply(render_menu(config), true)
}

fn plain_invalid_input_reply(config: &RouterConfig, msg: &UserMessage) -> UserMessage {
    msg.reply(
        format!("{}\n\n1. {}", config.invalid_input_message, config.try_again_message),
        true,
    )
}

impl ReplyRenderer for PlainReplyRenderer {
    fn first_reply<'a>(
        &'a self,
        config: &'a RouterConfig,
        _session: &'a Session,
        msg: &'a UserMessage,
    ) -> RenderFuture<'a> {
        Box::pin(async move { plain_first_reply(config, msg) })
    }

    fn invalid_input_reply<'a>(
        &'a self,
        config: &'a RouterConfig,
        _session: &'a Session,
        msg: &'a UserMessage,
    ) -> RenderFuture<'a> {
        Box::pin(async move { plain_invalid_input_reply(config, msg) })
    }
}

/// Rich-template replies for IM channels that can render button menus.
///
/// Produces the same text as [`PlainReplyRenderer`] and adds a
/// `helper_metadata["template"]` payload; menus with more than
/// [`Self::MAX_BUTTONS`] entries fall back to text only.
pub struct TemplateReplyRenderer;

impl TemplateReplyRenderer {
    /// Largest menu the button template can carry.
    pub const MAX_BUTTONS: usize = 3;
}

impl ReplyRenderer for TemplateReplyRenderer {
    fn first_reply<'a>(
        &'a self,
        config: &'a RouterConfig,
        _session: &'a Session,
        msg: &'a UserMessage,
    ) -> RenderFuture<'a> {
        Box::pin(async move {
            let mut reply = plain_first_reply(config, msg);
            if config.entries.len() > Self::MAX_BUTTONS {
                return reply;
            }
            let template = config.template.clone().unwrap_or_default();
            let buttons: Vec<_> = config
                .entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    json!({
                        "title": entry.label,
                        "payload": {
                            "content": (idx + 1).to_string(),
                            "in_reply_to": reply.message_id,
                        },
                    })
                })
                .collect();
            reply.helper_metadata.insert(
                "template".to_owned(),
                json!({
                    "template_type": "generic",
                    "title": config.menu_title,
                    "subtitle": template.sub_title,
                    "image_url": template.image_url,
                    "buttons": buttons,
                }),
            );
            reply
        })
    }

    fn invalid_input_reply<'a>(
        &'a self,
        config: &'a RouterConfig,
        _session: &'a Session,
        msg: &'a UserMessage,
    ) -> RenderFuture<'a> {
        Box::pin(async move {
            let mut reply = plain_invalid_input_reply(config, msg);
            let template = config.template.clone().unwrap_or_default();
            reply.helper_metadata.insert(
                "template".to_owned(),
                json!({
                    "template_type": "generic",
                    "title": config.menu_title,
                    "subtitle": config.invalid_input_message,
                    "image_url": template.image_url,
                    "buttons": [{
                        "title": config.try_again_message,
                        "payload": {
                            "content": "1",
                            "in_reply_to": reply.message_id,
                        },
                    }],
                }),
            );
            reply
        })
    }
}

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;
