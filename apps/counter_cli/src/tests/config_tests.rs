use super::{apply_env, load_settings, parse_read_access, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use client_core::ReadAccess;

const CONTRACT: &str = "0x00000000000000000000000000000000000000c0";

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn missing_contract_address_is_reported() {
    let err = Settings::default()
        .session_config()
        .expect_err("missing address");
    assert!(err.to_string().contains("COUNTER_ADDRESS"));
}

#[test]
fn env_overrides_defaults_with_app_prefix_winning() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        lookup_from(&[
            ("COUNTER_ADDRESS", "0x00000000000000000000000000000000000000aa"),
            ("APP__CONTRACT_ADDRESS", CONTRACT),
            ("RPC_URL", "http://node:8545"),
            ("APP__CONFIRMATIONS", "3"),
            ("APP__STATUS_RESET_MS", "0"),
            ("APP__READ_ACCESS", "Passive"),
        ]),
    );

    assert_eq!(settings.contract_address.as_deref(), Some(CONTRACT));
    assert_eq!(settings.rpc_url, "http://node:8545");

    let config = settings.session_config().expect("session config");
    assert_eq!(config.confirmations, 3);
    assert_eq!(config.status_reset, None);
    assert_eq!(config.read_access, ReadAccess::Passive);
}

#[test]
fn invalid_numeric_env_values_are_ignored() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        lookup_from(&[("APP__CONFIRMATIONS", "many"), ("APP__READ_ACCESS", "both")]),
    );
    assert_eq!(settings.confirmations, 1);
    assert_eq!(settings.read_access, ReadAccess::Wallet);
}

#[test]
fn rejects_malformed_rpc_url() {
    let settings = Settings {
        rpc_url: "not a url".to_string(),
        ..Settings::default()
    };
    assert!(settings.rpc_wallet_config().is_err());
}

#[test]
fn rpc_wallet_config_uses_poll_interval() {
    let settings = Settings {
        poll_interval_ms: 250,
        ..Settings::default()
    };
    let config = settings.rpc_wallet_config().expect("rpc config");
    assert_eq!(config.poll_interval, Duration::from_millis(250));
    assert_eq!(config.endpoint.as_str(), "http://127.0.0.1:8545/");
}

#[test]
fn parses_read_access_names() {
    assert_eq!(parse_read_access("wallet"), Ok(ReadAccess::Wallet));
    assert_eq!(parse_read_access(" PASSIVE "), Ok(ReadAccess::Passive));
    assert!(parse_read_access("signer").is_err());
}

#[test]
fn loads_explicit_config_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("counter_cli_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("counter.toml");
    fs::write(
        &path,
        format!(
            "contract_address = \"{CONTRACT}\"\nconfirmations = 2\nread_access = \"passive\"\n"
        ),
    )
    .expect("write config");

    let settings = load_settings(Some(&path)).expect("load");
    assert_eq!(settings.confirmations, 2);
    assert_eq!(settings.read_access, ReadAccess::Passive);
    assert_eq!(settings.status_reset_ms, 2000);

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let path = env::temp_dir().join("counter_cli_definitely_missing.toml");
    assert!(load_settings(Some(&path)).is_err());
}
