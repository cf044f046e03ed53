// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{subject, Stream};

#[test]
fn subjects_carry_prefix_connector_and_stream() {
    assert_eq!(subject("appmux", "transport", Stream::Inbound), "appmux.transport.inbound");
    assert_eq!(subject("appmux", "app1", Stream::Outbound), "appmux.app1.outbound");
    assert_eq!(subject("bus", "transport", Stream::Event), "bus.transport.event");
}

#[yare::parameterized(
    inbound = { "inbound", Some(Stream::Inbound) },
    outbound = { "outbound", Some(Stream::Outbound) },
    event = { "event", Some(Stream::Event) },
    unknown = { "status", None },
)]
fn stream_names_parse(name: &str, expected: Option<Stream>) {
    assert_eq!(Stream::from_name(name), expected);
    if let Some(stream) = expected {
        assert_eq!(stream.as_str(), name);
    }
}
