//! Flat-file store backends.
//!
//! Accounts live in a CSV file with the header `ACCOUNT_ID,PIN,BALANCE`, which
//! is read whole on every lookup and rewritten whole on every update.
//! Transactions live in a CSV file with the header
//! `ACCOUNT_ID,DATE_TIME,AMOUNT,BALANCE` and are only ever appended to.
//! Currency columns are written with two decimal places.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::{
    fs::{File, OpenOptions},
    io::{self, Read},
    path::{Path, PathBuf},
};

use crate::{
    account::{Account, AccountStore},
    engine::CURRENCY_SCALE,
    error::StoreError,
    transaction::{Transaction, TransactionStore},
    AccountId,
};

fn read_records<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .deserialize()
        .map(|record| record.map_err(StoreError::from_csv_read))
        .collect()
}

fn currency(mut amount: Decimal) -> Decimal {
    amount.rescale(CURRENCY_SCALE);
    amount
}

/// Account store over a CSV file
#[derive(Debug, Clone)]
pub struct CsvAccountStore {
    path: PathBuf,
}

impl CsvAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Account>, StoreError> {
        read_records(File::open(&self.path)?)
    }

    fn write_all(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_path(&self.path)?;

        for account in accounts {
            writer.serialize(Account {
                balance: currency(account.balance),
                ..account.clone()
            })?;
        }

        writer.flush()?;

        Ok(())
    }
}

impl AccountStore for CsvAccountStore {
    fn get(&self, account_id: AccountId) -> Result<Account, StoreError> {
        self.read_all()?
            .into_iter()
            .find(|account| account.account_id == account_id)
            .ok_or(StoreError::NotFound(account_id))
    }

    fn set(&mut self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.read_all()?;

        let stored = accounts
            .iter_mut()
            .find(|stored| stored.account_id == account.account_id)
            .ok_or(StoreError::NotFound(account.account_id))?;
        stored.clone_from(account);

        self.write_all(&accounts)
    }
}

/// Append-only transaction ledger over a CSV file. A missing file is an empty ledger.
#[derive(Debug, Clone)]
pub struct CsvTransactionStore {
    path: PathBuf,
}

impl CsvTransactionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionStore for CsvTransactionStore {
    fn get(&self, account_id: AccountId) -> Result<Vec<Transaction>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut transactions: Vec<Transaction> = read_records(file)?;
        transactions.retain(|tx| tx.account_id == account_id);

        Ok(transactions)
    }

    fn set(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        writer.serialize(Transaction {
            amount: currency(transaction.amount),
            balance_after: currency(transaction.balance_after),
            ..transaction.clone()
        })?;
        writer.flush()?;

        Ok(())
    }
}
