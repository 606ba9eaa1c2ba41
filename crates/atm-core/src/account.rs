use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{error::StoreError, AccountId};

/// Cardholder account record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Account {
    #[serde(rename = "ACCOUNT_ID")]
    pub account_id: AccountId,
    #[serde(rename = "PIN")]
    pub pin: String,
    #[serde(rename = "BALANCE")]
    pub balance: Decimal,
}

impl Account {
    pub fn new(account_id: AccountId, pin: impl Into<String>, balance: Decimal) -> Self {
        Self {
            account_id,
            pin: pin.into(),
            balance,
        }
    }

    pub fn is_overdrawn(&self) -> bool {
        self.balance < Decimal::ZERO
    }
}

/// Durable keeper of account records. `set` only updates existing accounts.
pub trait AccountStore {
    fn get(&self, account_id: AccountId) -> Result<Account, StoreError>;

    fn set(&mut self, account: &Account) -> Result<(), StoreError>;
}

/// `HashMap` backed account store
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: HashMap<AccountId, Account>,
    fail_reads: bool,
    fail_writes: bool,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record, replacing any existing one with the same id
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.account_id, account);
    }

    /// Makes every subsequent `get` fail with an I/O error
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Makes every subsequent `set` fail with an I/O error
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl FromIterator<Account> for InMemoryAccountStore {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        let mut store = Self::new();
        for account in iter {
            store.insert(account);
        }

        store
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, account_id: AccountId) -> Result<Account, StoreError> {
        if self.fail_reads {
            return Err(simulated_failure());
        }

        self.accounts
            .get(&account_id)
            .cloned()
            .ok_or(StoreError::NotFound(account_id))
    }

    fn set(&mut self, account: &Account) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(simulated_failure());
        }

        let stored = self
            .accounts
            .get_mut(&account.account_id)
            .ok_or(StoreError::NotFound(account.account_id))?;
        stored.clone_from(account);

        Ok(())
    }
}

pub(crate) fn simulated_failure() -> StoreError {
    StoreError::Io(std::io::Error::other("simulated store failure"))
}
