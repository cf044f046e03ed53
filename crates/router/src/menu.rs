// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Menu rendering and numeric choice parsing.

use crate::config::RouterConfig;

/// Render the numbered application menu: title, then one 1-based line per
/// configured entry.
pub fn render_menu(config: &RouterConfig) -> String {
    let items: Vec<String> = config
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| format!("{}) {}", idx + 1, entry.label))
        .collect();
    format!("{}\n{}", config.menu_title, items.join("\n"))
}

/// Parse user input as a base-10 menu choice within `[lo, hi]`.
///
/// Whitespace is trimmed; anything non-numeric or out of range is `None`.
pub fn parse_choice(content: Option<&str>, lo: usize, hi: usize) -> Option<usize> {
    let value: usize = content.unwrap_or("").trim().parse().ok()?;
    (lo..=hi).contains(&value).then_some(value)
}

/// Resolve user input to an endpoint name via 1-based index into the
/// session's menu snapshot.
pub fn choose_endpoint<'a>(content: Option<&str>, endpoints: &'a [String]) -> Option<&'a str> {
    let choice = parse_choice(content, 1, endpoints.len())?;
    endpoints.get(choice - 1).map(String::as_str)
}

#[cfg(test)]
#[path = "menu_tests.rs"]
mod tests;
