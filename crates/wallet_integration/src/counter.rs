use primitive_types::U256;
use shared::domain::{Address, TxHash};
use tracing::debug;

use crate::{
    abi::{self, Selector},
    ChainReader, TransactionSigner, WalletError,
};

pub const NUMBER_SIGNATURE: &str = "number()";
pub const INCREMENT_SIGNATURE: &str = "increment()";

/// Binding for the deployed counter contract:
/// `function number() view returns (uint256)` and `function increment()`.
#[derive(Debug, Clone)]
pub struct CounterContract {
    address: Address,
    number_selector: Selector,
    increment_selector: Selector,
}

impl CounterContract {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            number_selector: abi::selector(NUMBER_SIGNATURE),
            increment_selector: abi::selector(INCREMENT_SIGNATURE),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn number(&self, reader: &dyn ChainReader) -> Result<U256, WalletError> {
        let output = reader
            .call(self.address, abi::encode_call(self.number_selector))
            .await?;
        let value = abi::decode_uint256(&output)?;
        debug!(contract = %self.address, %value, "counter: number()");
        Ok(value)
    }

    pub async fn increment(&self, signer: &dyn TransactionSigner) -> Result<TxHash, WalletError> {
        let tx_hash = signer
            .send_transaction(self.address, abi::encode_call(self.increment_selector))
            .await?;
        debug!(contract = %self.address, %tx_hash, "counter: increment() submitted");
        Ok(tx_hash)
    }
}
