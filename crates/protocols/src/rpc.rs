//! RPC access to the chain.
//!
//! Thin async wrapper over the Solana RPC client, pinned to `confirmed`
//! commitment. All protocol adapters share one provider behind an `Arc`.

use anyhow::{Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::time::Duration;
use tracing::debug;

/// RPC provider for blockchain interaction.
pub struct RpcProvider {
    client: RpcClient,
}

impl RpcProvider {
    /// Creates a provider against `url` at `confirmed` commitment.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), CommitmentConfig::confirmed()),
        }
    }

    /// Checks node health. An `Err` means the endpoint should not be
    /// trusted for trading.
    pub async fn health(&self) -> Result<()> {
        self.client
            .get_health()
            .await
            .context("RPC health check failed")
    }

    pub async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .context("Failed to get recent blockhash")
    }

    /// Lamport balance of an account.
    pub async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.client
            .get_balance(address)
            .await
            .with_context(|| format!("Failed to get balance of {address}"))
    }

    /// Raw account data, for curve state decoding.
    pub async fn get_account_data(&self, address: &Pubkey) -> Result<Vec<u8>> {
        self.client
            .get_account_data(address)
            .await
            .with_context(|| format!("Failed to fetch account {address}"))
    }

    /// Whether an account exists at the current commitment.
    pub async fn account_exists(&self, address: &Pubkey) -> Result<bool> {
        let response = self
            .client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .with_context(|| format!("Failed to query account {address}"))?;
        Ok(response.value.is_some())
    }

    /// Token balance of a token account, in base units.
    pub async fn get_token_account_balance(&self, address: &Pubkey) -> Result<u64> {
        let amount = self
            .client
            .get_token_account_balance(address)
            .await
            .with_context(|| format!("Failed to get token balance of {address}"))?;
        amount
            .amount
            .parse::<u64>()
            .context("token balance is not a valid u64")
    }

    /// Submits a signed transaction and waits for confirmation. The wait
    /// is bounded by `timeout` when one is supplied; `None` waits until
    /// the RPC client itself gives up.
    pub async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
        timeout: Option<Duration>,
    ) -> Result<Signature> {
        debug!("Sending transaction...");
        let submit = self.client.send_and_confirm_transaction(transaction);
        match timeout {
            Some(limit) => tokio::time::timeout(limit, submit)
                .await
                .with_context(|| format!("confirmation timed out after {limit:?}"))?
                .context("Transaction submission failed"),
            None => submit.await.context("Transaction submission failed"),
        }
    }
}
