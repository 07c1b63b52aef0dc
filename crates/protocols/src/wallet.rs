//! Trading wallet key management.

use anyhow::{bail, Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

/// The trading wallet: holds the signing keypair and exposes the pubkey
/// everything else derives accounts from.
pub struct Wallet {
    keypair: Keypair,
}

impl Wallet {
    /// Loads a wallet from a base58-encoded 64-byte secret key, the
    /// format wallets export.
    pub fn from_base58(secret: &str) -> Result<Self> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .context("private key is not valid base58")?;
        if bytes.len() != 64 {
            bail!("private key must decode to 64 bytes, got {}", bytes.len());
        }
        let keypair = Keypair::try_from(bytes.as_slice()).context("invalid keypair bytes")?;
        Ok(Self { keypair })
    }

    #[must_use]
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    #[must_use]
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}
