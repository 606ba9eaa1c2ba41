use clap::Parser;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

/// Trait for reading configuration parameters
pub trait Config {
    fn accounts_path(&self) -> &Path;
    fn transactions_path(&self) -> &Path;
    fn terminal_cash(&self) -> Decimal;
}

/// CLI configuration
#[derive(Parser, Debug)]
#[command(
    name = "atm",
    about = "A single teller terminal backed by CSV account and transaction files",
    version
)]
pub struct CliConfig {
    /// CSV file holding account records
    #[arg(long = "accounts", value_name = "PATH", default_value = "./accounts.csv")]
    accounts_file: PathBuf,

    /// CSV file the transaction history is appended to
    #[arg(
        long = "transactions",
        value_name = "PATH",
        default_value = "./transactions.csv"
    )]
    transactions_file: PathBuf,

    /// Cash loaded into the terminal at startup
    #[arg(long, value_name = "AMOUNT", default_value = "10000.00", value_parser = parse_cash)]
    cash: Decimal,
}

impl Config for CliConfig {
    fn accounts_path(&self) -> &Path {
        &self.accounts_file
    }

    fn transactions_path(&self) -> &Path {
        &self.transactions_file
    }

    fn terminal_cash(&self) -> Decimal {
        self.cash
    }
}

fn parse_cash(value: &str) -> Result<Decimal, String> {
    let cash: Decimal = value
        .parse()
        .map_err(|e| format!("not a decimal amount: {e}"))?;

    if cash < Decimal::ZERO {
        return Err("terminal cash cannot be negative".to_owned());
    }

    Ok(cash)
}
