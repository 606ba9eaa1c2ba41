use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    account::AccountStore,
    clock::{Clock, SystemClock},
    error::{AtmError, SessionError},
    session::Session,
    transaction::{Transaction, TransactionStore},
    AccountId,
};

/// Smallest note the terminal dispenses
pub const CASH_UNIT: i64 = 20;

/// Decimal places a deposit may carry
pub const CURRENCY_SCALE: u32 = 2;

/// Flat fee charged on the withdrawal that takes an account below zero
pub const OVERDRAFT_FEE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Session-gated teller for a single terminal.
///
/// Owns the terminal's session and its cash balance. Every operation other
/// than [`TransactionEngine::authorize`] is rejected unless the session is
/// held by the requested account and has not been idle for too long.
/// Writes to the two stores are not atomic with each other: a failure
/// part way through leaves earlier writes in place.
pub struct TransactionEngine<A, T, C = SystemClock> {
    accounts: A,
    transactions: T,
    clock: C,
    session: Session,
    cash: Decimal,
}

impl<A: AccountStore, T: TransactionStore> TransactionEngine<A, T> {
    pub fn new(accounts: A, transactions: T, cash: Decimal) -> Self {
        Self::with_clock(accounts, transactions, cash, SystemClock)
    }
}

impl<A: AccountStore, T: TransactionStore, C: Clock> TransactionEngine<A, T, C> {
    /// `cash` is the amount loaded into the terminal; negative amounts count as empty
    pub fn with_clock(accounts: A, transactions: T, cash: Decimal, clock: C) -> Self {
        Self {
            accounts,
            transactions,
            clock,
            session: Session::new(),
            cash: cash.max(Decimal::ZERO),
        }
    }

    pub const fn cash(&self) -> Decimal {
        self.cash
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub const fn account_store(&self) -> &A {
        &self.accounts
    }

    pub fn account_store_mut(&mut self) -> &mut A {
        &mut self.accounts
    }

    pub const fn transaction_store(&self) -> &T {
        &self.transactions
    }

    pub fn transaction_store_mut(&mut self) -> &mut T {
        &mut self.transactions
    }

    /// Opens a session for `account_id` if `pin` matches.
    ///
    /// An unknown account, a wrong PIN and a failing store all look the same
    /// to the caller.
    pub fn authorize(&mut self, account_id: AccountId, pin: &str) -> bool {
        let account = match self.accounts.get(account_id) {
            Ok(account) => account,
            Err(e) => {
                warn!(account_id, error = %e, "Authorization failed");
                return false;
            }
        };

        if account.pin != pin {
            warn!(account_id, "Authorization failed: PIN mismatch");
            return false;
        }

        self.session.authorize(account_id, self.clock.now());
        info!(account_id, "Account authorized");

        true
    }

    /// Dispenses `amount` from the account, returning whether it is now overdrawn
    pub fn withdraw(&mut self, account_id: AccountId, amount: i64) -> Result<bool, AtmError> {
        let now = self.clock.now();
        self.session.valid(account_id, now)?;

        let mut account = self.accounts.get(account_id)?;

        if self.cash <= Decimal::ZERO {
            return Err(AtmError::AtmNoFunds);
        }

        if amount <= 0 || amount % CASH_UNIT != 0 {
            return Err(AtmError::AmountNotMultipleOf20);
        }

        let requested = Decimal::from(amount);

        if requested > self.cash {
            return Err(AtmError::AtmInsufficientFunds);
        }

        if account.is_overdrawn() {
            return Err(AtmError::AccountOverdrawn);
        }

        let mut balance = account
            .balance
            .checked_sub(requested)
            .ok_or(AtmError::AmountOutOfRange)?;
        let overdrawn = balance < Decimal::ZERO;
        if overdrawn {
            balance = balance
                .checked_sub(OVERDRAFT_FEE)
                .ok_or(AtmError::AmountOutOfRange)?;
        }

        self.transactions.set(&Transaction {
            account_id,
            timestamp: now,
            amount: -requested,
            balance_after: balance,
        })?;

        account.balance = balance;
        self.accounts.set(&account)?;

        self.cash -= requested;

        info!(account_id, %amount, %balance, overdrawn, "Withdrawal dispensed");

        Ok(overdrawn)
    }

    /// Credits `amount` to the account
    pub fn deposit(&mut self, account_id: AccountId, amount: Decimal) -> Result<(), AtmError> {
        let now = self.clock.now();
        self.session.valid(account_id, now)?;

        let mut account = self.accounts.get(account_id)?;

        if amount <= Decimal::ZERO || amount.normalize().scale() > CURRENCY_SCALE {
            return Err(AtmError::InvalidAmount);
        }

        let balance = account
            .balance
            .checked_add(amount)
            .ok_or(AtmError::AmountOutOfRange)?;

        self.transactions.set(&Transaction {
            account_id,
            timestamp: now,
            amount,
            balance_after: balance,
        })?;

        account.balance = balance;
        self.accounts.set(&account)?;

        info!(account_id, %amount, %balance, "Deposit accepted");

        Ok(())
    }

    pub fn balance(&mut self, account_id: AccountId) -> Result<Decimal, AtmError> {
        self.session.valid(account_id, self.clock.now())?;

        Ok(self.accounts.get(account_id)?.balance)
    }

    /// Transactions of the account, most recent first.
    /// Any failure yields an empty history.
    pub fn history(&mut self, account_id: AccountId) -> Vec<Transaction> {
        if let Err(e) = self.session.valid(account_id, self.clock.now()) {
            debug!(account_id, error = %e, "History unavailable");
            return Vec::new();
        }

        match self.transactions.get(account_id) {
            Ok(mut transactions) => {
                transactions.reverse();
                transactions
            }
            Err(e) => {
                debug!(account_id, error = %e, "History unavailable");
                Vec::new()
            }
        }
    }

    /// Ends the current session, returning the account that held it
    pub fn logout(&mut self) -> Result<AccountId, SessionError> {
        let account_id = self.session.logout(self.clock.now())?;
        info!(account_id, "Account logged out");

        Ok(account_id)
    }
}
