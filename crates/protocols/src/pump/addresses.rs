//! Program addresses and PDA derivation for the launch platform.

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Launch platform program ID (mainnet).
pub const PUMP_PROGRAM_ID: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// Global configuration account.
pub const PUMP_GLOBAL: &str = "4wTV1YmiEkRvAtNtsSGPtUrqRYQMe5SKy2uB4Jjaxnjf";

/// Protocol fee recipient.
pub const PUMP_FEE_RECIPIENT: &str = "CebN5WGQ4jvEPvsVU4EoHEpgzq1VV7AbicfhtW4xC9iM";

/// Event authority PDA.
pub const PUMP_EVENT_AUTHORITY: &str = "Ce6TQqeHC9p8KetsN6JsjHK7UTZk7nasjjnr7XxXp9F1";

/// Token program ID.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Associated token program ID.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

/// System program ID.
pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";

/// Rent sysvar.
pub const RENT_SYSVAR_ID: &str = "SysvarRent111111111111111111111111111111111";

/// PDA seed for bonding-curve accounts.
pub const BONDING_CURVE_SEED: &[u8] = b"bonding-curve";

/// Parsed set of every static address the encoder and resolver need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramAddresses {
    pub program: Pubkey,
    pub global: Pubkey,
    pub fee_recipient: Pubkey,
    pub event_authority: Pubkey,
    pub token_program: Pubkey,
    pub ata_program: Pubkey,
    pub system_program: Pubkey,
    pub rent_sysvar: Pubkey,
}

impl ProgramAddresses {
    /// Mainnet deployment of the launch platform.
    #[must_use]
    pub fn mainnet() -> Self {
        Self {
            program: Pubkey::from_str(PUMP_PROGRAM_ID).expect("Invalid program ID"),
            global: Pubkey::from_str(PUMP_GLOBAL).expect("Invalid global account"),
            fee_recipient: Pubkey::from_str(PUMP_FEE_RECIPIENT).expect("Invalid fee recipient"),
            event_authority: Pubkey::from_str(PUMP_EVENT_AUTHORITY)
                .expect("Invalid event authority"),
            token_program: Pubkey::from_str(TOKEN_PROGRAM_ID).expect("Invalid token program ID"),
            ata_program: Pubkey::from_str(ASSOCIATED_TOKEN_PROGRAM_ID)
                .expect("Invalid ATA program ID"),
            system_program: Pubkey::from_str(SYSTEM_PROGRAM_ID).expect("Invalid system program ID"),
            rent_sysvar: Pubkey::from_str(RENT_SYSVAR_ID).expect("Invalid rent sysvar"),
        }
    }

    /// Derives the bonding-curve PDA for a mint.
    #[must_use]
    pub fn bonding_curve(&self, mint: &Pubkey) -> Pubkey {
        let (address, _bump) =
            Pubkey::find_program_address(&[BONDING_CURVE_SEED, mint.as_ref()], &self.program);
        address
    }

    /// Derives the associated token account of `owner` for `mint`. Also
    /// used for the curve's own token account, with the curve PDA as owner.
    #[must_use]
    pub fn associated_token_account(&self, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
        let (address, _bump) = Pubkey::find_program_address(
            &[owner.as_ref(), self.token_program.as_ref(), mint.as_ref()],
            &self.ata_program,
        );
        address
    }
}

impl Default for ProgramAddresses {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Parses a base58 address carried as a string in domain types.
pub fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address).with_context(|| format!("invalid base58 address: {address}"))
}
