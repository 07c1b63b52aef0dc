//! Token creation event parsing.
//!
//! Creation is detected from the program's `create` instruction: the data
//! carries name, symbol and metadata URI as length-prefixed strings, and
//! the instruction's account list carries the mint and curve PDAs. The
//! subscription transport delivers the raw instruction data (base64 or
//! already decoded) plus the resolved account addresses in order.

use anyhow::{bail, Context, Result};
use base64::Engine;
use pump_trader_domain::prelude::TokenHandle;
use serde::{Deserialize, Serialize};

/// Create instruction discriminator.
pub const CREATE_DISCRIMINATOR: [u8; 8] = [24, 30, 200, 40, 5, 28, 7, 119];

// Account positions within the create instruction.
const IDX_MINT: usize = 0;
const IDX_BONDING_CURVE: usize = 2;
const IDX_ASSOCIATED_BONDING_CURVE: usize = 3;
const IDX_CREATOR: usize = 7;

/// A decoded token creation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEvent {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub mint: String,
    pub creator: String,
    pub bonding_curve: String,
    pub associated_bonding_curve: String,
}

impl CreateEvent {
    /// Reduces the event to the handle the trading pipeline consumes.
    #[must_use]
    pub fn into_handle(self) -> TokenHandle {
        TokenHandle {
            mint: self.mint,
            name: self.name,
            symbol: self.symbol,
            creator: self.creator,
            bonding_curve: self.bonding_curve,
            associated_bonding_curve: self.associated_bonding_curve,
        }
    }
}

/// True if the instruction data starts with the create discriminator.
#[must_use]
pub fn is_create_instruction(data: &[u8]) -> bool {
    data.len() >= 8 && data[..8] == CREATE_DISCRIMINATOR
}

/// Decodes base64 instruction data as delivered by block subscriptions.
pub fn decode_instruction_data(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("instruction data is not valid base64")
}

/// Parses a create instruction into an event.
///
/// `accounts` are the instruction's account addresses in program order.
pub fn parse_create_instruction(data: &[u8], accounts: &[String]) -> Result<CreateEvent> {
    if !is_create_instruction(data) {
        bail!("not a create instruction");
    }
    if accounts.len() <= IDX_CREATOR {
        bail!(
            "create instruction carries {} accounts, expected at least {}",
            accounts.len(),
            IDX_CREATOR + 1
        );
    }

    let mut cursor = &data[8..];
    let name = read_string(&mut cursor).context("token name")?;
    let symbol = read_string(&mut cursor).context("token symbol")?;
    let uri = read_string(&mut cursor).context("metadata uri")?;

    Ok(CreateEvent {
        name,
        symbol,
        uri,
        mint: accounts[IDX_MINT].clone(),
        creator: accounts[IDX_CREATOR].clone(),
        bonding_curve: accounts[IDX_BONDING_CURVE].clone(),
        associated_bonding_curve: accounts[IDX_ASSOCIATED_BONDING_CURVE].clone(),
    })
}

// Length-prefixed UTF-8: u32 LE length, then the bytes.
fn read_string(cursor: &mut &[u8]) -> Result<String> {
    if cursor.len() < 4 {
        bail!("truncated string length");
    }
    let len = u32::from_le_bytes(cursor[..4].try_into().expect("checked length")) as usize;
    let rest = &cursor[4..];
    if rest.len() < len {
        bail!("string length {len} exceeds remaining {} bytes", rest.len());
    }
    let value = std::str::from_utf8(&rest[..len])
        .context("string is not valid UTF-8")?
        .to_owned();
    *cursor = &rest[len..];
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_string(data: &mut Vec<u8>, value: &str) {
        data.extend_from_slice(&(value.len() as u32).to_le_bytes());
        data.extend_from_slice(value.as_bytes());
    }

    fn create_data() -> Vec<u8> {
        let mut data = CREATE_DISCRIMINATOR.to_vec();
        push_string(&mut data, "Moon Token");
        push_string(&mut data, "MOON");
        push_string(&mut data, "https://example.org/moon.json");
        data
    }

    fn create_accounts() -> Vec<String> {
        (0..14).map(|i| format!("account{i}")).collect()
    }

    #[test]
    fn test_parse_create_instruction() {
        let event = parse_create_instruction(&create_data(), &create_accounts()).unwrap();
        assert_eq!(event.name, "Moon Token");
        assert_eq!(event.symbol, "MOON");
        assert_eq!(event.uri, "https://example.org/moon.json");
        assert_eq!(event.mint, "account0");
        assert_eq!(event.bonding_curve, "account2");
        assert_eq!(event.associated_bonding_curve, "account3");
        assert_eq!(event.creator, "account7");
    }

    #[test]
    fn test_into_handle() {
        let handle = parse_create_instruction(&create_data(), &create_accounts())
            .unwrap()
            .into_handle();
        assert_eq!(handle.symbol, "MOON");
        assert_eq!(handle.mint, "account0");
    }

    #[test]
    fn test_rejects_wrong_discriminator() {
        let mut data = create_data();
        data[0] ^= 0xff;
        assert!(!is_create_instruction(&data));
        assert!(parse_create_instruction(&data, &create_accounts()).is_err());
    }

    #[test]
    fn test_rejects_truncated_strings() {
        let data = create_data();
        assert!(parse_create_instruction(&data[..12], &create_accounts()).is_err());
    }

    #[test]
    fn test_rejects_short_account_list() {
        let accounts: Vec<String> = (0..4).map(|i| format!("account{i}")).collect();
        assert!(parse_create_instruction(&create_data(), &accounts).is_err());
    }

    #[test]
    fn test_decode_instruction_data() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(create_data());
        let decoded = decode_instruction_data(&encoded).unwrap();
        assert!(is_create_instruction(&decoded));
        assert!(decode_instruction_data("%%%").is_err());
    }
}
