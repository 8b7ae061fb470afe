use std::{fmt, str::FromStr};

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// On-chain counter values are uint256.
pub type CounterValue = U256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexValueError {
    #[error("missing 0x prefix")]
    MissingPrefix,
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

fn decode_fixed<const N: usize>(raw: &str) -> Result<[u8; N], HexValueError> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .or_else(|| raw.trim().strip_prefix("0X"))
        .ok_or(HexValueError::MissingPrefix)?;
    if digits.len() != N * 2 {
        return Err(HexValueError::InvalidLength {
            expected: N,
            actual: digits.len() / 2,
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|err| HexValueError::InvalidHex(err.to_string()))?;
    Ok(out)
}

macro_rules! hex_newtype {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = HexValueError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(raw).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = HexValueError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_string()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

hex_newtype!(Address, 20);
hex_newtype!(TxHash, 32);

impl Address {
    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, ch) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if ch.is_ascii_alphabetic() && nibble >= 8 {
                out.push(ch.to_ascii_uppercase());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "address", rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(Address),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Connected(address) => Some(*address),
            _ => None,
        }
    }
}

/// User action a status message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Connect,
    FetchCounter,
    Increment,
    CopyAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Pending {
        activity: Activity,
    },
    Succeeded {
        activity: Activity,
    },
    Failed {
        activity: Activity,
        reason: String,
    },
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    pub fn activity(&self) -> Option<Activity> {
        match self {
            Self::Idle => None,
            Self::Pending { activity }
            | Self::Succeeded { activity }
            | Self::Failed { activity, .. } => Some(*activity),
        }
    }

    /// Short human-readable line for presentation layers.
    pub fn message(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Pending { activity } => match activity {
                Activity::Connect => "Connecting wallet...".to_string(),
                Activity::FetchCounter => "Fetching counter...".to_string(),
                Activity::Increment => "Transaction pending...".to_string(),
                Activity::CopyAddress => "Copying address...".to_string(),
            },
            Self::Succeeded { activity } => match activity {
                Activity::Connect => "Wallet connected".to_string(),
                Activity::FetchCounter => "Counter fetched".to_string(),
                Activity::Increment => "Increment successful".to_string(),
                Activity::CopyAddress => "Address copied to clipboard".to_string(),
            },
            Self::Failed { activity, reason } => {
                let head = match activity {
                    Activity::Connect => "Wallet connection failed",
                    Activity::FetchCounter => "Failed to fetch counter",
                    Activity::Increment => "Increment failed",
                    Activity::CopyAddress => "Failed to copy address",
                };
                if reason.is_empty() {
                    head.to_string()
                } else {
                    format!("{head}: {reason}")
                }
            }
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Write lifecycle of the `increment` transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "tx_status", content = "reason", rename_all = "snake_case")]
pub enum TxStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

impl From<&Status> for TxStatus {
    fn from(status: &Status) -> Self {
        match status {
            Status::Pending {
                activity: Activity::Increment,
            } => Self::Pending,
            Status::Succeeded {
                activity: Activity::Increment,
            } => Self::Succeeded,
            Status::Failed {
                activity: Activity::Increment,
                reason,
            } => Self::Failed(reason.clone()),
            _ => Self::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display_uses_eip55_checksum() {
        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .expect("address");
        assert_eq!(
            address.to_string(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn address_parse_rejects_bad_input() {
        assert_eq!(
            "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse::<Address>(),
            Err(HexValueError::MissingPrefix)
        );
        assert_eq!(
            "0xabc".parse::<Address>(),
            Err(HexValueError::InvalidLength {
                expected: 20,
                actual: 1
            })
        );
        assert!(matches!(
            "0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse::<Address>(),
            Err(HexValueError::InvalidHex(_))
        ));
    }

    #[test]
    fn address_serializes_as_string() {
        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .expect("address");
        let json = serde_json::to_string(&address).expect("serialize");
        assert_eq!(json, "\"0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\"");
        let back: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, address);
    }

    #[test]
    fn tx_status_projects_increment_activity_only() {
        let fetch = Status::Succeeded {
            activity: Activity::FetchCounter,
        };
        assert_eq!(TxStatus::from(&fetch), TxStatus::Idle);

        let failed = Status::Failed {
            activity: Activity::Increment,
            reason: "reverted".to_string(),
        };
        assert_eq!(
            TxStatus::from(&failed),
            TxStatus::Failed("reverted".to_string())
        );
        assert_eq!(failed.message(), "Increment failed: reverted");
    }
}
