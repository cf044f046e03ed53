// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{choose_endpoint, parse_choice, render_menu};
use crate::test_support::sample_router_config;

#[test]
fn renders_title_and_numbered_entries() {
    let mut config = sample_router_config();
    assert_eq!(render_menu(&config), "Please select a choice.\n1) Flappy Bird");

    config.entries.push(crate::config::MenuEntry {
        label: "Mama".to_owned(),
        endpoint: "mama".to_owned(),
    });
    assert_eq!(render_menu(&config), "Please select a choice.\n1) Flappy Bird\n2) Mama");
}

#[yare::parameterized(
    trailing_space = { Some("3 "), 1, 4, Some(3) },
    leading_space = { Some(" 1"), 1, 4, Some(1) },
    lower_bound = { Some("1"), 1, 4, Some(1) },
    upper_bound = { Some("4"), 1, 4, Some(4) },
    leading_zero = { Some("07"), 1, 9, Some(7) },
    out_of_range_high = { Some("3"), 1, 2, None },
    out_of_range_low = { Some("0"), 1, 2, None },
    negative = { Some("-1"), 1, 2, None },
    non_numeric = { Some("Foo "), 1, 2, None },
    empty = { Some(""), 1, 2, None },
    whitespace_only = { Some("   "), 1, 2, None },
    missing_content = { None, 1, 2, None },
    decimal = { Some("1.5"), 1, 2, None },
)]
fn parse_choice_cases(content: Option<&str>, lo: usize, hi: usize, expected: Option<usize>) {
    assert_eq!(parse_choice(content, lo, hi), expected);
}

#[test]
fn choose_endpoint_indexes_the_snapshot() {
    let endpoints = vec!["flappy-bird".to_owned(), "mama".to_owned()];
    assert_eq!(choose_endpoint(Some("1"), &endpoints), Some("flappy-bird"));
    assert_eq!(choose_endpoint(Some("2"), &endpoints), Some("mama"));
    assert_eq!(choose_endpoint(Some("3"), &endpoints), None);
    assert_eq!(choose_endpoint(Some("flappy"), &endpoints), None);
}

#[test]
fn choose_endpoint_with_empty_snapshot_is_none() {
    assert_eq!(choose_endpoint(Some("1"), &[]), None);
}

mod properties {
    use proptest::prelude::*;

    use crate::menu::parse_choice;

    proptest! {
        #[test]
        fn formatted_choice_round_trips_iff_in_bounds(
            n in 0usize..200,
            lo in 1usize..10,
            span in 0usize..10,
        ) {
            let hi = lo + span;
            let parsed = parse_choice(Some(&n.to_string()), lo, hi);
            if (lo..=hi).contains(&n) {
                prop_assert_eq!(parsed, Some(n));
            } else {
                prop_assert_eq!(parsed, None);
            }
        }

        #[test]
        fn arbitrary_input_never_panics(content in ".*", lo in 0usize..5, hi in 0usize..5) {
            let _ = parse_choice(Some(&content), lo, hi);
        }
    }
}
