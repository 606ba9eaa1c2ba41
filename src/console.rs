use anyhow::{Context, Result};
use atm_core::{
    engine::OVERDRAFT_FEE, AccountId, AccountStore, Clock, SessionError, Transaction,
    TransactionEngine, TransactionStore,
};
use chrono::DateTime;
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use thiserror::Error;

const USAGES: [&str; 7] = [
    Command::AUTHORIZE_USAGE,
    Command::WITHDRAW_USAGE,
    Command::DEPOSIT_USAGE,
    "balance",
    "history",
    "logout",
    "end",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Invalid command. Usage:\n{}", USAGES.join("\n"))]
    UnknownCommand,
    #[error("Invalid command. e.g. {0}")]
    Usage(&'static str),
    #[error("Account ID is not an integer")]
    InvalidAccountId,
    #[error("Amount is not valid")]
    InvalidAmount,
    #[error("Authorization failed.")]
    AuthorizationFailed,
    #[error("No account is currently authorized.")]
    NotAuthorized,
}

/// Operator command parsed from one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Authorize { account_id: AccountId, pin: String },
    Withdraw(i64),
    Deposit(Decimal),
    Balance,
    History,
    Logout,
    End,
}

/// Whether the console should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    End,
}

impl Command {
    const AUTHORIZE_USAGE: &'static str = "authorize <account_id> <pin>";
    const WITHDRAW_USAGE: &'static str = "withdraw <amount>";
    const DEPOSIT_USAGE: &'static str = "deposit <amount>";

    /// Parses a line of input. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_lowercase().as_str(), args.as_slice()) {
            ("authorize", [account_id, pin]) => Self::Authorize {
                account_id: account_id
                    .parse()
                    .map_err(|_| ConsoleError::InvalidAccountId)?,
                pin: (*pin).to_owned(),
            },
            ("authorize", _) => return Err(ConsoleError::Usage(Self::AUTHORIZE_USAGE)),
            ("withdraw", [amount]) => {
                Self::Withdraw(amount.parse().map_err(|_| ConsoleError::InvalidAmount)?)
            }
            ("withdraw", _) => return Err(ConsoleError::Usage(Self::WITHDRAW_USAGE)),
            ("deposit", [amount]) => {
                Self::Deposit(amount.parse().map_err(|_| ConsoleError::InvalidAmount)?)
            }
            ("deposit", _) => return Err(ConsoleError::Usage(Self::DEPOSIT_USAGE)),
            ("balance", []) => Self::Balance,
            ("balance", _) => return Err(ConsoleError::Usage("balance")),
            ("history", []) => Self::History,
            ("history", _) => return Err(ConsoleError::Usage("history")),
            ("logout", []) => Self::Logout,
            ("logout", _) => return Err(ConsoleError::Usage("logout")),
            ("end", []) => Self::End,
            ("end", _) => return Err(ConsoleError::Usage("end")),
            _ => return Err(ConsoleError::UnknownCommand),
        };

        Ok(Some(command))
    }
}

/// Parses and executes one line of input, writing the result to `out`
pub fn run_command<A, T, C, W>(
    engine: &mut TransactionEngine<A, T, C>,
    line: &str,
    out: &mut W,
) -> Result<Flow>
where
    A: AccountStore,
    T: TransactionStore,
    C: Clock,
    W: Write,
{
    let Some(command) = Command::parse(line)? else {
        return Ok(Flow::Continue);
    };

    match command {
        Command::Authorize { account_id, pin } => {
            if !engine.authorize(account_id, &pin) {
                return Err(ConsoleError::AuthorizationFailed.into());
            }
            writeln!(out, "{account_id} successfully authorized.")?;
        }
        Command::Withdraw(amount) => {
            let account_id = current_account(engine)?;
            let overdrawn = engine.withdraw(account_id, amount)?;
            let balance = engine.balance(account_id)?;

            writeln!(out, "Amount dispensed: {amount}")?;
            if overdrawn {
                writeln!(
                    out,
                    "You have been charged an overdraft fee of ${OVERDRAFT_FEE}. Current balance: {balance:.2}"
                )?;
            } else {
                writeln!(out, "Current balance: {balance:.2}")?;
            }
        }
        Command::Deposit(amount) => {
            let account_id = current_account(engine)?;
            engine.deposit(account_id, amount)?;
            let balance = engine.balance(account_id)?;

            writeln!(out, "Current balance: {balance:.2}")?;
        }
        Command::Balance => {
            let balance = engine.balance(current_account(engine)?)?;

            writeln!(out, "Current balance: {balance:.2}")?;
        }
        Command::History => {
            let history = match engine.session().held_by() {
                Some(account_id) => engine.history(account_id),
                None => Vec::new(),
            };

            if history.is_empty() {
                writeln!(out, "No history found")?;
            }
            for transaction in &history {
                writeln!(out, "{}", format_transaction(transaction))?;
            }
        }
        Command::Logout => {
            let account_id = engine
                .logout()
                .map_err(|_| ConsoleError::NotAuthorized)?;

            writeln!(out, "Account {account_id} logged out.")?;
        }
        Command::End => return Ok(Flow::End),
    }

    Ok(Flow::Continue)
}

/// Prompts for and executes commands until `end` or end of input.
/// Command failures are reported on `out` and do not stop the loop.
pub fn run<A, T, C, R, W>(
    engine: &mut TransactionEngine<A, T, C>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    A: AccountStore,
    T: TransactionStore,
    C: Clock,
    R: BufRead,
    W: Write,
{
    prompt(out)?;

    for line in input.lines() {
        let line = line.context("Failed to read command")?;

        match run_command(engine, &line, out) {
            Ok(Flow::End) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(e) => writeln!(out, "{e}")?,
        }

        prompt(out)?;
    }

    Ok(())
}

fn prompt<W: Write>(out: &mut W) -> Result<()> {
    write!(out, "> ")?;
    out.flush().context("Failed to flush output")?;

    Ok(())
}

fn current_account<A, T, C>(engine: &TransactionEngine<A, T, C>) -> Result<AccountId, SessionError>
where
    A: AccountStore,
    T: TransactionStore,
    C: Clock,
{
    engine
        .session()
        .held_by()
        .ok_or(SessionError::NoActiveSession)
}

fn format_transaction(transaction: &Transaction) -> String {
    let when = DateTime::from_timestamp(transaction.timestamp, 0).map_or_else(
        || transaction.timestamp.to_string(),
        |at| at.format("%m-%d-%Y %H:%M:%S").to_string(),
    );

    format!(
        "{when} {:.2} {:.2}",
        transaction.amount, transaction.balance_after
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use atm_core::{
        Account, InMemoryAccountStore, InMemoryTransactionStore, ManualClock, Timestamp,
    };
    use rstest::rstest;

    type Terminal = TransactionEngine<InMemoryAccountStore, InMemoryTransactionStore, ManualClock>;

    // 2023-11-14 22:13:20 UTC
    const T0: Timestamp = 1_700_000_000;

    fn terminal(balance: Decimal) -> (Terminal, ManualClock) {
        let accounts = [Account::new(2859459814, "7386", balance)]
            .into_iter()
            .collect();
        let clock = ManualClock::starting_at(T0);
        let engine = TransactionEngine::with_clock(
            accounts,
            InMemoryTransactionStore::new(),
            Decimal::new(1000000, 2),
            clock.clone(),
        );

        (engine, clock)
    }

    fn exec(engine: &mut Terminal, line: &str) -> Result<String> {
        let mut out = Vec::new();
        run_command(engine, line, &mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[rstest]
    #[case("authorize 2859459814 7386", Command::Authorize { account_id: 2859459814, pin: "7386".to_owned() })]
    #[case("  WITHDRAW   40 ", Command::Withdraw(40))]
    #[case("deposit 12.5", Command::Deposit(Decimal::new(125, 1)))]
    #[case("balance", Command::Balance)]
    #[case("History", Command::History)]
    #[case("logout", Command::Logout)]
    #[case("end", Command::End)]
    fn test_parse(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(Command::parse(line), Ok(Some(expected)));
    }

    #[rstest]
    #[case("authorize 2859459814", ConsoleError::Usage(Command::AUTHORIZE_USAGE))]
    #[case("authorize abc 7386", ConsoleError::InvalidAccountId)]
    #[case("withdraw", ConsoleError::Usage(Command::WITHDRAW_USAGE))]
    #[case("withdraw 20.5", ConsoleError::InvalidAmount)]
    #[case("deposit ten", ConsoleError::InvalidAmount)]
    #[case("balance now", ConsoleError::Usage("balance"))]
    #[case("transfer 20", ConsoleError::UnknownCommand)]
    fn test_parse_errors(#[case] line: &str, #[case] expected: ConsoleError) {
        assert_eq!(Command::parse(line), Err(expected));
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   \t"), Ok(None));
    }

    #[test]
    fn test_unknown_command_lists_usage() {
        let message = ConsoleError::UnknownCommand.to_string();

        for usage in USAGES {
            assert!(message.contains(usage), "{message}");
        }
    }

    #[test]
    fn test_authorize_failure() {
        let (mut engine, _) = terminal(Decimal::ONE);

        let err = exec(&mut engine, "authorize 2859459814 0000").unwrap_err();

        assert_eq!(err.to_string(), "Authorization failed.");
        assert_eq!(engine.session().held_by(), None);
    }

    #[test]
    fn test_commands_before_authorize() {
        let (mut engine, _) = terminal(Decimal::ONE);

        let err = exec(&mut engine, "balance").unwrap_err();
        assert_eq!(
            err.to_string(),
            "No active session found. Authorization required."
        );

        let err = exec(&mut engine, "logout").unwrap_err();
        assert_eq!(err.to_string(), "No account is currently authorized.");

        assert_eq!(exec(&mut engine, "history").unwrap(), "No history found\n");
    }

    #[test]
    fn test_session_walkthrough() {
        let (mut engine, clock) = terminal(Decimal::new(10012, 2));

        assert_eq!(
            exec(&mut engine, "authorize 2859459814 7386").unwrap(),
            "2859459814 successfully authorized.\n"
        );
        assert_eq!(
            exec(&mut engine, "withdraw 20").unwrap(),
            "Amount dispensed: 20\nCurrent balance: 80.12\n"
        );
        clock.advance(60);
        assert_eq!(
            exec(&mut engine, "deposit 20").unwrap(),
            "Current balance: 100.12\n"
        );
        assert_eq!(
            exec(&mut engine, "history").unwrap(),
            "11-14-2023 22:14:20 20.00 100.12\n11-14-2023 22:13:20 -20.00 80.12\n"
        );
        assert_eq!(
            exec(&mut engine, "logout").unwrap(),
            "Account 2859459814 logged out.\n"
        );
        assert_eq!(engine.cash(), Decimal::new(998000, 2));
    }

    #[test]
    fn test_overdraft_message() {
        let (mut engine, _) = terminal(Decimal::new(100, 0));
        exec(&mut engine, "authorize 2859459814 7386").unwrap();

        assert_eq!(
            exec(&mut engine, "withdraw 120").unwrap(),
            "Amount dispensed: 120\n\
             You have been charged an overdraft fee of $5. Current balance: -25.00\n"
        );

        let err = exec(&mut engine, "withdraw 20").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Your account is overdrawn! You may not make withdrawals at this time."
        );
    }

    #[test]
    fn test_timed_out_logout() {
        let (mut engine, clock) = terminal(Decimal::ONE);
        exec(&mut engine, "authorize 2859459814 7386").unwrap();
        clock.advance(121);

        let err = exec(&mut engine, "balance").unwrap_err();
        assert_eq!(err.to_string(), "Session has timed out.");

        let err = exec(&mut engine, "logout").unwrap_err();
        assert_eq!(err.to_string(), "No account is currently authorized.");
    }

    #[test]
    fn test_run_loop() {
        let (mut engine, _) = terminal(Decimal::new(10012, 2));
        let input = "\
authorize 2859459814 7386

withdraw 25
balance
end
balance
";
        let mut out = Vec::new();

        run(&mut engine, input.as_bytes(), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "> 2859459814 successfully authorized.\n\
             > > Unable to process since amount is not a multiple of 20.\n\
             > Current balance: 100.12\n\
             > "
        );
    }

    #[test]
    fn test_run_until_end_of_input() {
        let (mut engine, _) = terminal(Decimal::ONE);
        let mut out = Vec::new();

        run(&mut engine, "bogus\n".as_bytes(), &mut out).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.starts_with("> Invalid command. Usage:\n"));
        assert!(output.ends_with("end\n> "));
    }
}
