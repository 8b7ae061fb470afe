use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{Address, TxHash};
use thiserror::Error;

pub mod abi;
pub mod counter;
pub mod rpc;

pub use counter::CounterContract;
pub use rpc::{JsonRpcWallet, RpcWalletConfig};

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
    #[error("wallet exposes no accounts")]
    NoAccounts,
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            Self::UserRejected
        } else {
            Self::Rpc {
                code,
                message: message.into(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// Read side of a chain connection. Does not need an authorized account.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, WalletError>;

    /// Suspends until `tx_hash` is mined with `confirmations` blocks (counting
    /// its own). No timeout.
    async fn wait_for_transaction(
        &self,
        tx_hash: TxHash,
        confirmations: u32,
    ) -> Result<TxReceipt, WalletError>;
}

/// Write-capable handle obtained from a wallet after authorization.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn address(&self) -> Result<Address, WalletError>;
    async fn send_transaction(&self, to: Address, data: Vec<u8>) -> Result<TxHash, WalletError>;
}

/// Externally supplied wallet, the analogue of a browser-injected provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// May prompt the user; a refusal is `WalletError::UserRejected`.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;
    async fn signer(&self) -> Result<Arc<dyn TransactionSigner>, WalletError>;
    fn reader(&self) -> Arc<dyn ChainReader>;
}
