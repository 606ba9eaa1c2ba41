use crate::{error::SessionError, AccountId, Timestamp};

/// Seconds of inactivity after which a session stops being valid
pub const SESSION_IDLE_TIMEOUT_SECS: i64 = 120;

/// Observable state of the terminal session at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthorized,
    Active(AccountId),
    /// Timed out but not yet cleared by a logout
    Expired(AccountId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hold {
    account_id: AccountId,
    last_activity: Timestamp,
}

/// Which account, if any, currently holds the terminal.
///
/// The holder and its last activity time are set and cleared together.
/// Expiry is sliding: every successful [`Session::valid`] call pushes it out,
/// and an expired hold stays in place until [`Session::logout`] is attempted
/// or another account authorizes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    hold: Option<Hold>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held_by(&self) -> Option<AccountId> {
        self.hold.map(|hold| hold.account_id)
    }

    pub fn last_activity(&self) -> Option<Timestamp> {
        self.hold.map(|hold| hold.last_activity)
    }

    pub fn state(&self, now: Timestamp) -> SessionState {
        match self.hold {
            None => SessionState::Unauthorized,
            Some(hold) if hold.timed_out(now) => SessionState::Expired(hold.account_id),
            Some(hold) => SessionState::Active(hold.account_id),
        }
    }

    /// Hands the terminal to `account_id`, replacing any previous holder
    pub fn authorize(&mut self, account_id: AccountId, now: Timestamp) {
        self.hold = Some(Hold {
            account_id,
            last_activity: now,
        });
    }

    /// Guard for protected operations; refreshes the activity time on success
    pub fn valid(&mut self, account_id: AccountId, now: Timestamp) -> Result<(), SessionError> {
        let hold = self.hold.as_mut().ok_or(SessionError::NoActiveSession)?;

        if hold.account_id != account_id {
            return Err(SessionError::WrongAccount);
        }

        if hold.timed_out(now) {
            return Err(SessionError::SessionTimedOut);
        }

        hold.last_activity = now;

        Ok(())
    }

    /// Clears the session, returning the account that held it.
    /// A timed out session is reported as such and left in place.
    pub fn logout(&mut self, now: Timestamp) -> Result<AccountId, SessionError> {
        let account_id = self.held_by().ok_or(SessionError::NoActiveSession)?;

        self.valid(account_id, now)?;
        self.hold = None;

        Ok(account_id)
    }
}

impl Hold {
    const fn timed_out(&self, now: Timestamp) -> bool {
        now - self.last_activity > SESSION_IDLE_TIMEOUT_SECS
    }
}
