//! Integration test: Settings loading
//!
//! Tests the bin_common settings loader against an in-memory lookup, so
//! nothing depends on the process environment.

use std::collections::HashMap;
use std::time::Duration;
use wsconn_cli::bin_common::{settings_from_lookup, SettingsKey};

fn lookup(pairs: &[(SettingsKey, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.env_var_name().to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_missing_endpoint_is_an_error() {
    let err = settings_from_lookup(lookup(&[])).unwrap_err();
    assert!(err.to_string().contains("WSCONN_ENDPOINT"));

    let blank = settings_from_lookup(lookup(&[(SettingsKey::Endpoint, "  ")]));
    assert!(blank.is_err());
}

#[test]
fn test_invalid_endpoint_is_an_error() {
    let result = settings_from_lookup(lookup(&[(SettingsKey::Endpoint, "not a url")]));
    assert!(result.is_err());
}

#[test]
fn test_defaults() {
    let settings =
        settings_from_lookup(lookup(&[(SettingsKey::Endpoint, "wss://echo.example.com/ws")])).unwrap();

    assert_eq!(settings.endpoint.as_str(), "wss://echo.example.com/ws");
    assert!(settings.protocols.is_empty());
    assert_eq!(settings.connect_timeout, Duration::from_secs(10));
}

#[test]
fn test_protocol_list_is_trimmed() {
    let settings = settings_from_lookup(lookup(&[
        (SettingsKey::Endpoint, "ws://localhost:9001"),
        (SettingsKey::Protocols, " graphql-ws ,, chat "),
    ]))
    .unwrap();

    assert_eq!(settings.protocols, vec!["graphql-ws", "chat"]);
}

#[test]
fn test_connect_timeout_override() {
    let settings = settings_from_lookup(lookup(&[
        (SettingsKey::Endpoint, "ws://localhost:9001"),
        (SettingsKey::ConnectTimeout, "3"),
    ]))
    .unwrap();
    assert_eq!(settings.connect_timeout, Duration::from_secs(3));
    assert_eq!(settings.socket_config().connect_timeout(), Duration::from_secs(3));

    let bad = settings_from_lookup(lookup(&[
        (SettingsKey::Endpoint, "ws://localhost:9001"),
        (SettingsKey::ConnectTimeout, "soon"),
    ]));
    assert!(bad.is_err());
}
