// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use super::{Session, SessionPatch, State};

#[yare::parameterized(
    start = { State::Start, "start" },
    select = { State::Select, "select" },
    selected = { State::Selected, "selected" },
    bad_input = { State::BadInput, "bad_input" },
)]
fn state_names_round_trip(state: State, name: &str) {
    assert_eq!(state.as_str(), name);
    assert_eq!(State::from_name(name), Some(state));
}

#[test]
fn unknown_state_name_is_none() {
    assert_eq!(State::from_name("paused"), None);
}

#[test]
fn map_round_trip_keeps_all_fields() -> anyhow::Result<()> {
    let session = Session {
        state: State::Selected,
        endpoints: vec!["flappy-bird".to_owned(), "mama".to_owned()],
        active_endpoint: Some("flappy-bird".to_owned()),
        created_at: Some("2026-02-14T01:23:45Z".to_owned()),
    };
    let map = session.to_map()?;
    assert_eq!(map.get("state").map(String::as_str), Some("selected"));
    assert_eq!(
        map.get("endpoints").map(String::as_str),
        Some(r#"["flappy-bird","mama"]"#),
    );
    assert_eq!(Session::from_map(&map)?, session);
    Ok(())
}

#[test]
fn absent_fields_are_omitted_from_the_map() -> anyhow::Result<()> {
    let map = Session::new(State::Start).to_map()?;
    assert_eq!(map.len(), 1);
    assert!(map.contains_key("state"));
    Ok(())
}

#[test]
fn map_without_state_is_corrupt() {
    let map = BTreeMap::from([("endpoints".to_owned(), r#"["a"]"#.to_owned())]);
    assert!(Session::from_map(&map).is_err());
}

#[test]
fn map_with_unparseable_endpoints_is_corrupt() {
    let map = BTreeMap::from([
        ("state".to_owned(), "select".to_owned()),
        ("endpoints".to_owned(), "not-json".to_owned()),
    ]);
    assert!(Session::from_map(&map).is_err());
}

#[test]
fn apply_merges_only_present_fields() {
    let mut session = Session {
        state: State::Select,
        endpoints: vec!["flappy-bird".to_owned()],
        active_endpoint: None,
        created_at: Some("t0".to_owned()),
    };
    session.apply(SessionPatch {
        active_endpoint: Some("flappy-bird".to_owned()),
        ..Default::default()
    });
    assert_eq!(session.active_endpoint.as_deref(), Some("flappy-bird"));
    assert_eq!(session.endpoints, vec!["flappy-bird".to_owned()]);
    assert_eq!(session.created_at.as_deref(), Some("t0"));
}
