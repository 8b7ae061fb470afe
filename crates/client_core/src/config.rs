use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared::domain::{Address, HexValueError};

pub const DEFAULT_CONFIRMATIONS: u32 = 1;
pub const DEFAULT_STATUS_RESET: Duration = Duration::from_secs(2);

/// Which chain connection `get_number` may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadAccess {
    /// Reads go through the connected wallet; nothing is readable before `connect`.
    #[default]
    Wallet,
    /// Reads use the provider's read handle without account authorization.
    Passive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub contract_address: Address,
    pub confirmations: u32,
    /// `None` keeps terminal statuses on screen until the next update.
    pub status_reset: Option<Duration>,
    pub read_access: ReadAccess,
}

impl SessionConfig {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            confirmations: DEFAULT_CONFIRMATIONS,
            status_reset: Some(DEFAULT_STATUS_RESET),
            read_access: ReadAccess::default(),
        }
    }

    pub fn from_contract_address(raw: &str) -> Result<Self, HexValueError> {
        Ok(Self::new(raw.parse()?))
    }

    pub fn with_confirmations(mut self, confirmations: u32) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn with_status_reset(mut self, status_reset: Option<Duration>) -> Self {
        self.status_reset = status_reset;
        self
    }

    pub fn with_read_access(mut self, read_access: ReadAccess) -> Self {
        self.read_access = read_access;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_confirmation_and_two_second_reset() {
        let config = SessionConfig::from_contract_address(
            "0x00000000000000000000000000000000000000c0",
        )
        .expect("config");
        assert_eq!(config.confirmations, 1);
        assert_eq!(config.status_reset, Some(Duration::from_secs(2)));
        assert_eq!(config.read_access, ReadAccess::Wallet);
    }

    #[test]
    fn rejects_malformed_contract_address() {
        assert!(SessionConfig::from_contract_address("counter").is_err());
    }

    #[test]
    fn zero_confirmations_is_clamped_to_one() {
        let config = SessionConfig::from_contract_address(
            "0x00000000000000000000000000000000000000c0",
        )
        .expect("config")
        .with_confirmations(0);
        assert_eq!(config.confirmations, 1);
    }
}
