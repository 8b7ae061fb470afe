use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NoWallet,
    UserRejected,
    Wallet,
    Fetch,
    Tx,
    NotConnected,
    NotReadable,
    OperationInFlight,
    Clipboard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failures surfaced by the counter session. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no wallet provider found; install a browser wallet such as MetaMask")]
    NoWallet,
    #[error("request rejected in wallet")]
    UserRejected,
    #[error("wallet connection failed: {0}")]
    Wallet(String),
    #[error("failed to fetch counter: {0}")]
    Fetch(String),
    #[error("transaction failed: {0}")]
    Tx(String),
    #[error("wallet is not connected")]
    NotConnected,
    #[error("no read-capable chain connection")]
    NotReadable,
    #[error("another operation is already in flight")]
    OperationInFlight,
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoWallet => ErrorCode::NoWallet,
            Self::UserRejected => ErrorCode::UserRejected,
            Self::Wallet(_) => ErrorCode::Wallet,
            Self::Fetch(_) => ErrorCode::Fetch,
            Self::Tx(_) => ErrorCode::Tx,
            Self::NotConnected => ErrorCode::NotConnected,
            Self::NotReadable => ErrorCode::NotReadable,
            Self::OperationInFlight => ErrorCode::OperationInFlight,
            Self::Clipboard(_) => ErrorCode::Clipboard,
        }
    }
}

impl From<&SessionError> for ApiError {
    fn from(value: &SessionError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}
