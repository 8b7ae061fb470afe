use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context};
use client_core::{ReadAccess, SessionConfig};
use serde::Deserialize;
use tracing::warn;
use url::Url;
use wallet_integration::RpcWalletConfig;

pub const DEFAULT_CONFIG_FILE: &str = "counter.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub confirmations: u32,
    /// 0 disables the status auto-reset.
    pub status_reset_ms: u64,
    pub poll_interval_ms: u64,
    pub read_access: ReadAccess,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            contract_address: None,
            confirmations: 1,
            status_reset_ms: 2000,
            poll_interval_ms: 1000,
            read_access: ReadAccess::Wallet,
        }
    }
}

impl Settings {
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let raw = self.contract_address.as_deref().ok_or_else(|| {
            anyhow!(
                "contract address is not configured; set COUNTER_ADDRESS or contract_address in {DEFAULT_CONFIG_FILE}"
            )
        })?;
        let status_reset = (self.status_reset_ms > 0)
            .then(|| Duration::from_millis(self.status_reset_ms));
        Ok(SessionConfig::from_contract_address(raw)
            .with_context(|| format!("invalid contract address '{raw}'"))?
            .with_confirmations(self.confirmations)
            .with_status_reset(status_reset)
            .with_read_access(self.read_access))
    }

    pub fn rpc_wallet_config(&self) -> anyhow::Result<RpcWalletConfig> {
        let endpoint = Url::parse(&self.rpc_url)
            .with_context(|| format!("invalid rpc url '{}'", self.rpc_url))?;
        let mut config = RpcWalletConfig::new(endpoint);
        config.poll_interval = Duration::from_millis(self.poll_interval_ms.max(1));
        Ok(config)
    }
}

/// Defaults, then the config file, then environment overrides.
///
/// An explicit `path` must exist; the default `counter.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_settings_file(&default_path)?
            } else {
                Settings::default()
            }
        }
    };
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}

pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("RPC_URL") {
        settings.rpc_url = v;
    }
    if let Some(v) = lookup("APP__RPC_URL") {
        settings.rpc_url = v;
    }

    if let Some(v) = lookup("COUNTER_ADDRESS") {
        settings.contract_address = Some(v);
    }
    if let Some(v) = lookup("APP__CONTRACT_ADDRESS") {
        settings.contract_address = Some(v);
    }

    if let Some(v) = lookup("APP__CONFIRMATIONS") {
        match v.parse::<u32>() {
            Ok(parsed) => settings.confirmations = parsed,
            Err(_) => warn!("ignoring invalid APP__CONFIRMATIONS={v}"),
        }
    }
    if let Some(v) = lookup("APP__STATUS_RESET_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.status_reset_ms = parsed,
            Err(_) => warn!("ignoring invalid APP__STATUS_RESET_MS={v}"),
        }
    }
    if let Some(v) = lookup("APP__POLL_INTERVAL_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.poll_interval_ms = parsed,
            Err(_) => warn!("ignoring invalid APP__POLL_INTERVAL_MS={v}"),
        }
    }
    if let Some(v) = lookup("APP__READ_ACCESS") {
        match parse_read_access(&v) {
            Ok(parsed) => settings.read_access = parsed,
            Err(err) => warn!("ignoring APP__READ_ACCESS: {err}"),
        }
    }
}

pub fn parse_read_access(raw: &str) -> Result<ReadAccess, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "wallet" => Ok(ReadAccess::Wallet),
        "passive" => Ok(ReadAccess::Passive),
        other => Err(format!("unknown read access '{other}' (expected wallet or passive)")),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
