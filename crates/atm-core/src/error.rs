use thiserror::Error;

use crate::AccountId;

/// Failures of the session guard that precedes every protected operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No active session found. Authorization required.")]
    NoActiveSession,
    #[error("Invalid account ID for session.")]
    WrongAccount,
    #[error("Session has timed out.")]
    SessionTimedOut,
}

/// Failures reported by an account or transaction store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account {0} could not be found in database.")]
    NotFound(AccountId),
    #[error("Malformed record at line {line}: {message}")]
    Malformed { line: u64, message: String },
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    /// Classifies an error raised while reading records from a CSV file
    pub(crate) fn from_csv_read(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(csv::Position::line)
            .unwrap_or_default();

        let message = match err.into_kind() {
            csv::ErrorKind::Io(err) => return Self::Io(err),
            csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
            csv::ErrorKind::Utf8 { err, .. } => err.to_string(),
            csv::ErrorKind::UnequalLengths { .. } => "unexpected number of fields".to_owned(),
            other => format!("{other:?}"),
        };

        Self::Malformed { line, message }
    }
}

/// Every error a teller operation can surface to the console
#[derive(Debug, Error)]
pub enum AtmError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Unable to process your withdrawal at this time.")]
    AtmNoFunds,
    #[error("Unable to process since amount is not a multiple of 20.")]
    AmountNotMultipleOf20,
    #[error("Unable to dispense full amount requested at this time.")]
    AtmInsufficientFunds,
    #[error("Your account is overdrawn! You may not make withdrawals at this time.")]
    AccountOverdrawn,
    #[error("Amount must be greater than zero with at most two decimal places.")]
    InvalidAmount,
    #[error("Amount is too large to process.")]
    AmountOutOfRange,
}
