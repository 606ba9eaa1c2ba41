pub mod account;
pub mod clock;
pub mod csv_store;
pub mod engine;
pub mod error;
pub mod session;
pub mod transaction;

/// Account number as printed on the card
pub type AccountId = u64;

/// Point in time as Unix epoch seconds
pub type Timestamp = i64;

pub use account::{Account, AccountStore, InMemoryAccountStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use csv_store::{CsvAccountStore, CsvTransactionStore};
pub use engine::TransactionEngine;
pub use error::{AtmError, SessionError, StoreError};
pub use session::{Session, SessionState};
pub use transaction::{InMemoryTransactionStore, Transaction, TransactionStore};
