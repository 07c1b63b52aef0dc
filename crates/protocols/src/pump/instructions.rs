//! Instruction byte encoding for the launch platform's program ABI.

use crate::pump::addresses::ProgramAddresses;
use anyhow::Result;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

/// Buy instruction discriminator.
pub const BUY_DISCRIMINATOR: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];

/// Sell instruction discriminator.
pub const SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];

/// Accounts a buy or sell touches for one specific token.
#[derive(Debug, Clone, Copy)]
pub struct TradeAccounts {
    pub mint: Pubkey,
    pub bonding_curve: Pubkey,
    pub associated_bonding_curve: Pubkey,
    /// The trader's associated token account for the mint.
    pub associated_user: Pubkey,
    /// The trading wallet; signs and pays.
    pub user: Pubkey,
}

/// Encodes instructions against one deployment of the program.
#[derive(Debug, Clone, Copy)]
pub struct InstructionEncoder {
    addresses: ProgramAddresses,
}

impl InstructionEncoder {
    #[must_use]
    pub fn new(addresses: ProgramAddresses) -> Self {
        Self { addresses }
    }

    /// Buys `token_amount` base units, paying at most `max_base_cost`
    /// lamports. Data layout: discriminator, then both amounts LE.
    #[must_use]
    pub fn buy(&self, accounts: &TradeAccounts, token_amount: u64, max_base_cost: u64) -> Instruction {
        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(&BUY_DISCRIMINATOR);
        data.extend_from_slice(&token_amount.to_le_bytes());
        data.extend_from_slice(&max_base_cost.to_le_bytes());

        Instruction {
            program_id: self.addresses.program,
            accounts: self.trade_account_metas(accounts),
            data,
        }
    }

    /// Sells `token_amount` base units, requiring at least `min_base_out`
    /// lamports back.
    #[must_use]
    pub fn sell(&self, accounts: &TradeAccounts, token_amount: u64, min_base_out: u64) -> Instruction {
        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(&SELL_DISCRIMINATOR);
        data.extend_from_slice(&token_amount.to_le_bytes());
        data.extend_from_slice(&min_base_out.to_le_bytes());

        Instruction {
            program_id: self.addresses.program,
            accounts: self.trade_account_metas(accounts),
            data,
        }
    }

    /// Creates the trader's associated token account for a mint. Safe to
    /// include only when the account does not exist yet.
    #[must_use]
    pub fn create_associated_token_account(
        &self,
        payer: &Pubkey,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Instruction {
        let ata = self.addresses.associated_token_account(owner, mint);
        Instruction {
            program_id: self.addresses.ata_program,
            accounts: vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new(ata, false),
                AccountMeta::new_readonly(*owner, false),
                AccountMeta::new_readonly(*mint, false),
                AccountMeta::new_readonly(self.addresses.system_program, false),
                AccountMeta::new_readonly(self.addresses.token_program, false),
            ],
            data: Vec::new(),
        }
    }

    /// Closes an empty token account, sending its rent lamports to `owner`.
    pub fn close_token_account(&self, account: &Pubkey, owner: &Pubkey) -> Result<Instruction> {
        let ix = spl_token::instruction::close_account(
            &self.addresses.token_program,
            account,
            owner,
            owner,
            &[],
        )?;
        Ok(ix)
    }

    // Buy and sell share the same 12-account layout.
    fn trade_account_metas(&self, accounts: &TradeAccounts) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new_readonly(self.addresses.global, false),
            AccountMeta::new(self.addresses.fee_recipient, false),
            AccountMeta::new_readonly(accounts.mint, false),
            AccountMeta::new(accounts.bonding_curve, false),
            AccountMeta::new(accounts.associated_bonding_curve, false),
            AccountMeta::new(accounts.associated_user, false),
            AccountMeta::new(accounts.user, true),
            AccountMeta::new_readonly(self.addresses.system_program, false),
            AccountMeta::new_readonly(self.addresses.token_program, false),
            AccountMeta::new_readonly(self.addresses.rent_sysvar, false),
            AccountMeta::new_readonly(self.addresses.event_authority, false),
            AccountMeta::new_readonly(self.addresses.program, false),
        ]
    }
}

/// Slippage bounds around a quoted amount. `tolerance` is a fraction
/// (0.05 = 5%); returns `(min, max)`.
#[must_use]
pub fn slippage_bounds(amount: u64, tolerance: f64) -> (u64, u64) {
    let min = (amount as f64 * (1.0 - tolerance)) as u64;
    let max = (amount as f64 * (1.0 + tolerance)) as u64;
    (min, max)
}
