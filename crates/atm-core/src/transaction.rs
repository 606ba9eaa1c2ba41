use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{account::simulated_failure, error::StoreError, AccountId, Timestamp};

/// Ledger entry. Negative amounts are withdrawals, positive are deposits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Transaction {
    #[serde(rename = "ACCOUNT_ID")]
    pub account_id: AccountId,
    #[serde(rename = "DATE_TIME")]
    pub timestamp: Timestamp,
    #[serde(rename = "AMOUNT")]
    pub amount: Decimal,
    #[serde(rename = "BALANCE")]
    pub balance_after: Decimal,
}

/// Append-only ledger of transactions
pub trait TransactionStore {
    /// All transactions of `account_id` in insertion order
    fn get(&self, account_id: AccountId) -> Result<Vec<Transaction>, StoreError>;

    fn set(&mut self, transaction: &Transaction) -> Result<(), StoreError>;
}

/// `Vec` backed ledger
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    transactions: Vec<Transaction>,
    fail_reads: bool,
    fail_writes: bool,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn get(&self, account_id: AccountId) -> Result<Vec<Transaction>, StoreError> {
        if self.fail_reads {
            return Err(simulated_failure());
        }

        Ok(self
            .transactions
            .iter()
            .filter(|tx| tx.account_id == account_id)
            .cloned()
            .collect())
    }

    fn set(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(simulated_failure());
        }

        self.transactions.push(transaction.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(account_id: AccountId, timestamp: Timestamp, amount: i64) -> Transaction {
        Transaction {
            account_id,
            timestamp,
            amount: Decimal::new(amount, 0),
            balance_after: Decimal::ZERO,
        }
    }

    #[test]
    fn test_get_filters_by_account_in_order() {
        let mut store = InMemoryTransactionStore::new();
        store.set(&tx(1, 10, -20)).unwrap();
        store.set(&tx(2, 11, 40)).unwrap();
        store.set(&tx(1, 12, 60)).unwrap();

        let history = store.get(1).unwrap();

        assert_eq!(history, vec![tx(1, 10, -20), tx(1, 12, 60)]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_get_without_transactions() {
        let store = InMemoryTransactionStore::new();

        assert!(store.is_empty());
        assert!(store.get(1).unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_appends_nothing() {
        let mut store = InMemoryTransactionStore::new();
        store.fail_writes(true);

        assert!(store.set(&tx(1, 10, 20)).is_err());
        assert!(store.is_empty());
    }
}
