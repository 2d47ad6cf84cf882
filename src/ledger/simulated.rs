// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process ledger.
//!
//! Behaves like a devnet cluster closely enough to drive the manager end to
//! end: native balances and fees, a faucet with an optional limit, mints,
//! holding accounts and pre/post token balance snapshots.
//!
//! ## Snapshot Shape
//!
//! A holding account appears in a token balance snapshot once it has been
//! credited at least once. A first mint into a fresh account therefore shows
//! `(pre, post) = (0, 1)` entries and a transfer to a fresh account shows
//! `(1, 2)`. Account creation and mint creation touch no balances.
//!
//! ## Failure Injection
//!
//! Tests can drop transaction details, fail lookups for a mint, fail account
//! creation for an owner, cap the faucet, or enforce that only the recorded
//! mint authority may mint.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256, Sha512};

use super::{
    Address, HoldingAccount, Keypair, LedgerError, LedgerGateway, LedgerResult, MintInfo, Payer,
    SignatureInfo, TokenBalanceEntry, TransactionDetail, TransactionMeta, UiTokenAmount,
};

/// Flat fee charged to the payer of every transaction.
pub const DEFAULT_FEE_LAMPORTS: u64 = 5_000;

/// Rent-exempt deposit for a mint account.
pub const MINT_RENT_LAMPORTS: u64 = 1_461_600;

/// Rent-exempt deposit for a holding account.
pub const ACCOUNT_RENT_LAMPORTS: u64 = 2_039_280;

/// Block time of the first simulated transaction.
const GENESIS_BLOCK_TIME: i64 = 1_700_000_000;

#[derive(Default)]
struct LedgerState {
    lamports: HashMap<Address, u64>,
    mints: HashMap<Address, MintInfo>,
    accounts: HashMap<Address, HoldingAccount>,
    /// Holding accounts that have been credited at least once.
    balance_records: HashSet<Address>,
    /// Signatures per touched address, oldest first.
    history: HashMap<Address, Vec<SignatureInfo>>,
    transactions: HashMap<String, TransactionDetail>,
    dropped: HashSet<String>,
    failing_lookups: HashSet<Address>,
    failing_owners: HashSet<Address>,
    faucet_remaining: Option<u32>,
    tx_count: u64,
    calls: HashMap<&'static str, usize>,
}

impl LedgerState {
    fn record_call(&mut self, op: &'static str) {
        *self.calls.entry(op).or_insert(0) += 1;
    }

    fn charge(&mut self, payer: &Address, lamports: u64) -> LedgerResult<()> {
        let balance = self.lamports.get(payer).copied().unwrap_or(0);
        if balance < lamports {
            return Err(LedgerError::InsufficientFunds(format!(
                "payer {payer} has {balance} lamports, needs {lamports}"
            )));
        }
        self.lamports.insert(*payer, balance - lamports);
        Ok(())
    }

    fn next_signature(&mut self) -> (String, i64) {
        self.tx_count += 1;
        let digest = Sha512::new()
            .chain_update(b"simulated-tx")
            .chain_update(self.tx_count.to_be_bytes())
            .finalize();
        let block_time = GENESIS_BLOCK_TIME + self.tx_count as i64;
        (bs58::encode(digest).into_string(), block_time)
    }

    fn snapshot(&self, accounts: &[Address]) -> Vec<TokenBalanceEntry> {
        accounts
            .iter()
            .enumerate()
            .filter(|(_, address)| self.balance_records.contains(address))
            .filter_map(|(index, address)| {
                let account = self.accounts.get(address)?;
                let decimals = self.mints.get(&account.mint).map(|m| m.decimals)?;
                Some(TokenBalanceEntry {
                    account_index: index as u8,
                    mint: account.mint.to_string(),
                    owner: Some(account.owner.to_string()),
                    ui_token_amount: UiTokenAmount {
                        amount: account.amount.to_string(),
                        decimals,
                    },
                })
            })
            .collect()
    }

    fn record_tx(
        &mut self,
        touched: &[Address],
        pre: Vec<TokenBalanceEntry>,
        post: Vec<TokenBalanceEntry>,
    ) -> String {
        let (signature, block_time) = self.next_signature();
        for address in touched {
            self.history.entry(*address).or_default().push(SignatureInfo {
                signature: signature.clone(),
                block_time: Some(block_time),
            });
        }
        self.transactions.insert(
            signature.clone(),
            TransactionDetail {
                signature: signature.clone(),
                block_time: Some(block_time),
                meta: Some(TransactionMeta {
                    pre_token_balances: Some(pre),
                    post_token_balances: Some(post),
                }),
            },
        );
        signature
    }
}

/// In-process [`LedgerGateway`] implementation.
pub struct SimulatedLedger {
    state: Mutex<LedgerState>,
    fee_lamports: u64,
    strict_authority: bool,
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            fee_lamports: DEFAULT_FEE_LAMPORTS,
            strict_authority: false,
        }
    }

    /// Allow only `grants` faucet requests; later ones are rate limited.
    pub fn with_faucet_limit(self, grants: u32) -> Self {
        self.state().faucet_remaining = Some(grants);
        self
    }

    /// Grant `grants` more faucet requests to a capped faucet.
    #[cfg(test)]
    pub(crate) fn refill_faucet(&self, grants: u32) {
        if let Some(remaining) = self.state().faucet_remaining.as_mut() {
            *remaining += grants;
        }
    }

    /// Reject mints signed by anything but the authority recorded on the mint.
    pub fn strict_authority(mut self) -> Self {
        self.strict_authority = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Credit native lamports to `address` outside the faucet.
    pub fn fund(&self, address: &Address, lamports: u64) {
        let mut state = self.state();
        let balance = state.lamports.entry(*address).or_insert(0);
        *balance = balance.saturating_add(lamports);
    }

    /// Overwrite the native balance of `address`.
    pub fn set_lamports(&self, address: &Address, lamports: u64) {
        self.state().lamports.insert(*address, lamports);
    }

    /// Make mint and account lookups for `mint` fail with an RPC error.
    pub fn fail_lookups_for(&self, mint: &Address) {
        self.state().failing_lookups.insert(*mint);
    }

    /// Make holding-account creation fail for accounts owned by `owner`.
    pub fn fail_account_creation_for(&self, owner: &Address) {
        self.state().failing_owners.insert(*owner);
    }

    /// Pretend the node pruned the detail of `signature`.
    pub fn drop_transaction_detail(&self, signature: &str) {
        self.state().dropped.insert(signature.to_string());
    }

    /// Number of calls made to gateway method `op` (e.g. `"create_mint"`).
    pub fn call_count(&self, op: &str) -> usize {
        self.state().calls.get(op).copied().unwrap_or(0)
    }

    /// Number of gateway calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }
}

#[async_trait]
impl LedgerGateway for SimulatedLedger {
    async fn get_balance(&self, address: &Address) -> LedgerResult<u64> {
        let mut state = self.state();
        state.record_call("get_balance");
        Ok(state.lamports.get(address).copied().unwrap_or(0))
    }

    async fn request_funding(&self, recipient: &Address, lamports: u64) -> LedgerResult<String> {
        let mut state = self.state();
        state.record_call("request_funding");

        if let Some(remaining) = state.faucet_remaining.as_mut() {
            if *remaining == 0 {
                return Err(LedgerError::RateLimited(
                    "429 Too Many Requests: airdrop limit reached".to_string(),
                ));
            }
            *remaining -= 1;
        }

        let balance = state.lamports.entry(*recipient).or_insert(0);
        *balance = balance.saturating_add(lamports);
        Ok(state.record_tx(&[*recipient], Vec::new(), Vec::new()))
    }

    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Address,
        freeze_authority: Option<&Address>,
        decimals: u8,
    ) -> LedgerResult<Address> {
        let mut state = self.state();
        state.record_call("create_mint");

        let payer_address = payer.address();
        state.charge(&payer_address, self.fee_lamports + MINT_RENT_LAMPORTS)?;

        let mint = Keypair::generate().address();
        state.mints.insert(
            mint,
            MintInfo {
                address: mint,
                supply: 0,
                decimals,
                mint_authority: Some(*mint_authority),
                freeze_authority: freeze_authority.copied(),
            },
        );
        state.record_tx(&[mint, payer_address], Vec::new(), Vec::new());
        Ok(mint)
    }

    fn holding_account_address(&self, mint: &Address, owner: &Address) -> Address {
        let digest = Sha256::new()
            .chain_update(b"holding-account")
            .chain_update(owner.as_bytes())
            .chain_update(mint.as_bytes())
            .finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Address::new(bytes)
    }

    async fn get_or_create_holding_account(
        &self,
        payer: Payer<'_>,
        mint: &Address,
        owner: &Address,
    ) -> LedgerResult<HoldingAccount> {
        let address = self.holding_account_address(mint, owner);
        let mut state = self.state();
        state.record_call("get_or_create_holding_account");

        if state.failing_owners.contains(owner) {
            return Err(LedgerError::Rpc(format!(
                "TokenAccountNotFoundError: could not create account for {owner}"
            )));
        }
        if !state.mints.contains_key(mint) {
            return Err(LedgerError::AccountNotFound(mint.to_string()));
        }
        if let Some(existing) = state.accounts.get(&address) {
            return Ok(existing.clone());
        }

        state.charge(&payer.address(), self.fee_lamports + ACCOUNT_RENT_LAMPORTS)?;

        let account = HoldingAccount {
            address,
            mint: *mint,
            owner: *owner,
            amount: 0,
        };
        state.accounts.insert(address, account.clone());
        state.record_tx(&[*mint, *owner], Vec::new(), Vec::new());
        Ok(account)
    }

    async fn mint_to(
        &self,
        authority: &Keypair,
        mint: &Address,
        account: &Address,
        amount: u64,
    ) -> LedgerResult<String> {
        let mut state = self.state();
        state.record_call("mint_to");

        let info = state
            .mints
            .get(mint)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(mint.to_string()))?;
        match state.accounts.get(account) {
            Some(holding) if holding.mint == *mint => {}
            _ => return Err(LedgerError::AccountNotFound(account.to_string())),
        }

        let signer = authority.address();
        if self.strict_authority && info.mint_authority != Some(signer) {
            return Err(LedgerError::AuthorityMismatch {
                mint: mint.to_string(),
                signer: signer.to_string(),
            });
        }

        let supply = info
            .supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Rpc("supply overflow".to_string()))?;

        state.charge(&signer, self.fee_lamports)?;

        let pre = state.snapshot(&[*account]);
        if let Some(holding) = state.accounts.get_mut(account) {
            holding.amount += amount;
        }
        if let Some(mint_info) = state.mints.get_mut(mint) {
            mint_info.supply = supply;
        }
        state.balance_records.insert(*account);
        let post = state.snapshot(&[*account]);

        Ok(state.record_tx(&[*mint, *account], pre, post))
    }

    async fn transfer(
        &self,
        payer: Payer<'_>,
        source: &Address,
        destination: &Address,
        owner: &Address,
        amount: u64,
    ) -> LedgerResult<String> {
        let mut state = self.state();
        state.record_call("transfer");

        let from = state
            .accounts
            .get(source)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(source.to_string()))?;
        let to = state
            .accounts
            .get(destination)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(destination.to_string()))?;

        if from.owner != *owner {
            return Err(LedgerError::Rpc(format!(
                "owner {owner} does not match source account owner"
            )));
        }
        if from.mint != to.mint {
            return Err(LedgerError::Rpc("account mints differ".to_string()));
        }
        if from.amount < amount {
            return Err(LedgerError::InsufficientTokenBalance {
                available: from.amount,
                requested: amount,
            });
        }

        state.charge(&payer.address(), self.fee_lamports)?;

        let pre = state.snapshot(&[*source, *destination]);
        if let Some(holding) = state.accounts.get_mut(source) {
            holding.amount -= amount;
        }
        if let Some(holding) = state.accounts.get_mut(destination) {
            holding.amount += amount;
        }
        state.balance_records.insert(*source);
        state.balance_records.insert(*destination);
        let post = state.snapshot(&[*source, *destination]);

        Ok(state.record_tx(&[from.mint, *source, *destination], pre, post))
    }

    async fn get_mint_info(&self, mint: &Address) -> LedgerResult<MintInfo> {
        let mut state = self.state();
        state.record_call("get_mint_info");

        if state.failing_lookups.contains(mint) {
            return Err(LedgerError::Rpc(format!("simulated lookup failure for {mint}")));
        }
        state
            .mints
            .get(mint)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(mint.to_string()))
    }

    async fn get_account_info(&self, account: &Address) -> LedgerResult<HoldingAccount> {
        let mut state = self.state();
        state.record_call("get_account_info");

        let holding = state
            .accounts
            .get(account)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(account.to_string()))?;
        if state.failing_lookups.contains(&holding.mint) {
            return Err(LedgerError::Rpc(format!(
                "simulated lookup failure for {}",
                holding.mint
            )));
        }
        Ok(holding)
    }

    async fn get_signatures_for_address(
        &self,
        address: &Address,
        limit: usize,
    ) -> LedgerResult<Vec<SignatureInfo>> {
        let mut state = self.state();
        state.record_call("get_signatures_for_address");

        Ok(state
            .history
            .get(address)
            .map(|sigs| sigs.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_transaction_detail(
        &self,
        signature: &str,
    ) -> LedgerResult<Option<TransactionDetail>> {
        let mut state = self.state();
        state.record_call("get_transaction_detail");

        if state.dropped.contains(signature) {
            return Ok(None);
        }
        Ok(state.transactions.get(signature).cloned())
    }

    async fn confirm_transaction(&self, signature: &str) -> LedgerResult<()> {
        let mut state = self.state();
        state.record_call("confirm_transaction");

        if state.transactions.contains_key(signature) {
            Ok(())
        } else {
            Err(LedgerError::Unconfirmed(signature.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::LAMPORTS_PER_SOL;

    async fn funded_mint(ledger: &SimulatedLedger) -> (Keypair, Address) {
        let authority = Keypair::generate();
        ledger.fund(&authority.address(), LAMPORTS_PER_SOL);
        let mint = ledger
            .create_mint(&authority, &authority.address(), Some(&authority.address()), 6)
            .await
            .unwrap();
        (authority, mint)
    }

    #[tokio::test]
    async fn fees_and_rent_are_charged_to_payer() {
        let ledger = SimulatedLedger::new();
        let (authority, _mint) = funded_mint(&ledger).await;

        let balance = ledger.get_balance(&authority.address()).await.unwrap();
        assert_eq!(
            balance,
            LAMPORTS_PER_SOL - DEFAULT_FEE_LAMPORTS - MINT_RENT_LAMPORTS
        );
    }

    #[tokio::test]
    async fn unfunded_payer_gets_insufficient_funds() {
        let ledger = SimulatedLedger::new();
        let payer = Keypair::generate();
        let result = ledger
            .create_mint(&payer, &payer.address(), None, 9)
            .await;
        assert!(matches!(result, Err(LedgerError::InsufficientFunds(_))));
    }

    #[tokio::test]
    async fn faucet_limit_rate_limits() {
        let ledger = SimulatedLedger::new().with_faucet_limit(1);
        let target = Keypair::generate().address();

        ledger.request_funding(&target, 10).await.unwrap();
        let second = ledger.request_funding(&target, 10).await;
        assert!(matches!(second, Err(LedgerError::RateLimited(_))));
        assert_eq!(ledger.get_balance(&target).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn first_mint_snapshot_is_zero_then_one() {
        let ledger = SimulatedLedger::new();
        let (authority, mint) = funded_mint(&ledger).await;
        let owner = Keypair::generate().address();

        let account = ledger
            .get_or_create_holding_account(Payer::Authority(&authority), &mint, &owner)
            .await
            .unwrap();
        let sig = ledger
            .mint_to(&authority, &mint, &account.address, 5_000_000)
            .await
            .unwrap();

        let meta = ledger
            .get_transaction_detail(&sig)
            .await
            .unwrap()
            .unwrap()
            .meta
            .unwrap();
        assert_eq!(meta.pre_token_balances.unwrap().len(), 0);
        let post = meta.post_token_balances.unwrap();
        assert_eq!(post.len(), 1);
        assert_eq!(post[0].ui_token_amount.amount, "5000000");
        assert_eq!(post[0].ui_token_amount.decimals, 6);
        assert_eq!(post[0].owner.as_deref(), Some(owner.to_string().as_str()));

        let info = ledger.get_mint_info(&mint).await.unwrap();
        assert_eq!(info.supply, 5_000_000);
    }

    #[tokio::test]
    async fn transfer_to_fresh_account_is_one_then_two() {
        let ledger = SimulatedLedger::new();
        let (authority, mint) = funded_mint(&ledger).await;
        let owner = Keypair::generate().address();
        let recipient = Keypair::generate().address();

        let source = ledger
            .get_or_create_holding_account(Payer::Authority(&authority), &mint, &owner)
            .await
            .unwrap();
        ledger
            .mint_to(&authority, &mint, &source.address, 100)
            .await
            .unwrap();
        let dest = ledger
            .get_or_create_holding_account(Payer::Authority(&authority), &mint, &recipient)
            .await
            .unwrap();

        let sig = ledger
            .transfer(
                Payer::Authority(&authority),
                &source.address,
                &dest.address,
                &owner,
                40,
            )
            .await
            .unwrap();

        let meta = ledger
            .get_transaction_detail(&sig)
            .await
            .unwrap()
            .unwrap()
            .meta
            .unwrap();
        assert_eq!(meta.pre_token_balances.unwrap().len(), 1);
        let post = meta.post_token_balances.unwrap();
        assert_eq!(post.len(), 2);
        assert_eq!(post[1].ui_token_amount.amount, "40");

        assert_eq!(ledger.get_account_info(&source.address).await.unwrap().amount, 60);
        assert_eq!(ledger.get_account_info(&dest.address).await.unwrap().amount, 40);
    }

    #[tokio::test]
    async fn transfer_beyond_balance_is_rejected() {
        let ledger = SimulatedLedger::new();
        let (authority, mint) = funded_mint(&ledger).await;
        let owner = Keypair::generate().address();
        let recipient = Keypair::generate().address();

        let source = ledger
            .get_or_create_holding_account(Payer::Authority(&authority), &mint, &owner)
            .await
            .unwrap();
        let dest = ledger
            .get_or_create_holding_account(Payer::Authority(&authority), &mint, &recipient)
            .await
            .unwrap();

        let result = ledger
            .transfer(
                Payer::Authority(&authority),
                &source.address,
                &dest.address,
                &owner,
                1,
            )
            .await;
        assert_eq!(
            result,
            Err(LedgerError::InsufficientTokenBalance {
                available: 0,
                requested: 1
            })
        );
    }

    #[tokio::test]
    async fn strict_mode_rejects_foreign_authority() {
        let ledger = SimulatedLedger::new().strict_authority();
        let (authority, mint) = funded_mint(&ledger).await;
        let owner = Keypair::generate().address();
        let account = ledger
            .get_or_create_holding_account(Payer::Authority(&authority), &mint, &owner)
            .await
            .unwrap();

        let impostor = Keypair::generate();
        ledger.fund(&impostor.address(), LAMPORTS_PER_SOL);
        let result = ledger.mint_to(&impostor, &mint, &account.address, 1).await;
        assert!(matches!(result, Err(LedgerError::AuthorityMismatch { .. })));
    }

    #[tokio::test]
    async fn signatures_are_newest_first_and_limited() {
        let ledger = SimulatedLedger::new();
        let (authority, mint) = funded_mint(&ledger).await;
        let owner = Keypair::generate().address();
        let account = ledger
            .get_or_create_holding_account(Payer::Authority(&authority), &mint, &owner)
            .await
            .unwrap();
        let first = ledger.mint_to(&authority, &mint, &account.address, 1).await.unwrap();
        let second = ledger.mint_to(&authority, &mint, &account.address, 1).await.unwrap();

        let sigs = ledger.get_signatures_for_address(&mint, 2).await.unwrap();
        assert_eq!(sigs.len(), 2);
        assert_eq!(sigs[0].signature, second);
        assert_eq!(sigs[1].signature, first);
        assert!(sigs[0].block_time > sigs[1].block_time);
    }

    #[tokio::test]
    async fn dropped_detail_reads_as_none_and_calls_are_counted() {
        let ledger = SimulatedLedger::new();
        let target = Keypair::generate().address();
        let sig = ledger.request_funding(&target, 1).await.unwrap();
        ledger.drop_transaction_detail(&sig);

        assert_eq!(ledger.get_transaction_detail(&sig).await.unwrap(), None);
        assert_eq!(ledger.call_count("request_funding"), 1);
        assert_eq!(ledger.call_count("get_transaction_detail"), 1);
        assert_eq!(ledger.total_calls(), 2);
    }
}
