//! Minimal ABI helpers for zero-argument calls returning at most one uint256.

use primitive_types::U256;
use sha3::{Digest, Keccak256};

use crate::WalletError;

pub type Selector = [u8; 4];

const WORD_LEN: usize = 32;

/// First four bytes of the Keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> Selector {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn encode_call(selector: Selector) -> Vec<u8> {
    selector.to_vec()
}

pub fn decode_uint256(data: &[u8]) -> Result<U256, WalletError> {
    if data.len() < WORD_LEN {
        return Err(WalletError::InvalidResponse(format!(
            "expected a {WORD_LEN}-byte uint256 word, got {} bytes",
            data.len()
        )));
    }
    Ok(U256::from_big_endian(&data[..WORD_LEN]))
}

pub fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

pub fn decode_hex(raw: &str) -> Result<Vec<u8>, WalletError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|err| WalletError::InvalidResponse(format!("bad hex data: {err}")))
}

/// Parses a JSON-RPC hex quantity such as `0x1b4`.
pub fn parse_quantity(raw: &str) -> Result<u64, WalletError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| WalletError::InvalidResponse(format!("quantity without 0x: {raw}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|err| WalletError::InvalidResponse(format!("bad quantity {raw}: {err}")))
}
