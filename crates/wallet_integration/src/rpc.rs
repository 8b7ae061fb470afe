//! Wallet provider backed by an EIP-1193 compatible JSON-RPC endpoint, such as
//! a local dev node with unlocked accounts or a wallet bridge.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use shared::domain::{Address, TxHash};
use tracing::{debug, info};
use url::Url;

use crate::{
    abi::{decode_hex, encode_hex, parse_quantity},
    ChainReader, TransactionSigner, TxReceipt, WalletError, WalletProvider,
};

const METHOD_NOT_FOUND_CODE: i64 = -32601;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct RpcWalletConfig {
    pub endpoint: Url,
    pub poll_interval: Duration,
}

impl RpcWalletConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptJson {
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Clone)]
struct RpcTransport {
    http: Client,
    endpoint: Url,
    next_id: Arc<AtomicU64>,
}

impl RpcTransport {
    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, WalletError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "json-rpc request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|err| WalletError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| WalletError::Transport(err.to_string()))?;
        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|err| WalletError::InvalidResponse(err.to_string()))?;

        if let Some(err) = envelope.error {
            debug!(method, id, code = err.code, "json-rpc error");
            return Err(WalletError::from_rpc(err.code, err.message));
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .map_err(|err| WalletError::InvalidResponse(format!("{method}: {err}")))
    }

    async fn accounts(&self, method: &str) -> Result<Vec<Address>, WalletError> {
        let raw: Vec<String> = self.request(method, json!([])).await?;
        raw.iter()
            .map(|account| {
                account
                    .parse::<Address>()
                    .map_err(|err| WalletError::InvalidResponse(format!("account {account}: {err}")))
            })
            .collect()
    }
}

pub struct JsonRpcWallet {
    transport: RpcTransport,
    poll_interval: Duration,
}

impl JsonRpcWallet {
    pub fn new(config: RpcWalletConfig) -> Self {
        Self {
            transport: RpcTransport {
                http: Client::new(),
                endpoint: config.endpoint,
                next_id: Arc::new(AtomicU64::new(1)),
            },
            poll_interval: config.poll_interval,
        }
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let accounts = match self.transport.accounts("eth_requestAccounts").await {
            // Plain nodes do not implement the authorization method.
            Err(WalletError::Rpc { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                self.transport.accounts("eth_accounts").await?
            }
            other => other?,
        };
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        info!(accounts = accounts.len(), "wallet: accounts authorized");
        Ok(accounts)
    }

    async fn signer(&self) -> Result<Arc<dyn TransactionSigner>, WalletError> {
        let from = self
            .transport
            .accounts("eth_accounts")
            .await?
            .into_iter()
            .next()
            .ok_or(WalletError::NoAccounts)?;
        Ok(Arc::new(RpcSigner {
            transport: self.transport.clone(),
            from,
        }))
    }

    fn reader(&self) -> Arc<dyn ChainReader> {
        Arc::new(RpcReader {
            transport: self.transport.clone(),
            poll_interval: self.poll_interval,
        })
    }
}

struct RpcSigner {
    transport: RpcTransport,
    from: Address,
}

#[async_trait]
impl TransactionSigner for RpcSigner {
    async fn address(&self) -> Result<Address, WalletError> {
        Ok(self.from)
    }

    async fn send_transaction(&self, to: Address, data: Vec<u8>) -> Result<TxHash, WalletError> {
        let raw: String = self
            .transport
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": self.from.to_hex(),
                    "to": to.to_hex(),
                    "data": encode_hex(&data),
                }]),
            )
            .await?;
        raw.parse()
            .map_err(|err| WalletError::InvalidResponse(format!("tx hash {raw}: {err}")))
    }
}

struct RpcReader {
    transport: RpcTransport,
    poll_interval: Duration,
}

impl RpcReader {
    async fn block_number(&self) -> Result<u64, WalletError> {
        let raw: String = self.transport.request("eth_blockNumber", json!([])).await?;
        parse_quantity(&raw)
    }
}

#[async_trait]
impl ChainReader for RpcReader {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, WalletError> {
        let raw: String = self
            .transport
            .request(
                "eth_call",
                json!([{ "to": to.to_hex(), "data": encode_hex(&data) }, "latest"]),
            )
            .await?;
        decode_hex(&raw)
    }

    async fn wait_for_transaction(
        &self,
        tx_hash: TxHash,
        confirmations: u32,
    ) -> Result<TxReceipt, WalletError> {
        let block_number = loop {
            let receipt: Option<ReceiptJson> = self
                .transport
                .request("eth_getTransactionReceipt", json!([tx_hash.to_hex()]))
                .await?;
            if let Some(receipt) = receipt {
                if let Some(block) = receipt.block_number.as_deref() {
                    if receipt.status.as_deref() == Some("0x0") {
                        return Err(WalletError::Reverted(tx_hash));
                    }
                    break parse_quantity(block)?;
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        };

        let target = block_number + u64::from(confirmations.max(1)) - 1;
        while self.block_number().await? < target {
            tokio::time::sleep(self.poll_interval).await;
        }

        debug!(%tx_hash, block_number, confirmations, "transaction confirmed");
        Ok(TxReceipt {
            tx_hash,
            block_number,
        })
    }
}

#[cfg(test)]
#[path = "tests/rpc_tests.rs"]
mod tests;
