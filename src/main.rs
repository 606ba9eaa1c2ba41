mod config;
mod console;

use anyhow::{Context, Result};
use atm_core::{
    AccountStore, CsvAccountStore, CsvTransactionStore, TransactionEngine, TransactionStore,
};
use clap::Parser;
use config::{CliConfig, Config};
use std::io;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CliConfig::parse();

    run_terminal(&config)?;

    info!("Terminal shut down");

    Ok(())
}

fn run_terminal<C: Config>(config: &C) -> Result<()> {
    let accounts = CsvAccountStore::new(config.accounts_path());
    let transactions = CsvTransactionStore::new(config.transactions_path());

    info!(
        accounts = %accounts.path().display(),
        transactions = %transactions.path().display(),
        cash = %config.terminal_cash(),
        "Terminal started"
    );

    let mut engine = TransactionEngine::new(accounts, transactions, config.terminal_cash());

    serve(&mut engine)
}

fn serve<A: AccountStore, T: TransactionStore>(
    engine: &mut TransactionEngine<A, T>,
) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    console::run(engine, stdin.lock(), &mut handle).context("Console session failed")
}
