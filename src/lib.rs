pub mod cli;

mod confscan;
mod rspamd_train;
mod sieve;
mod spam_rules;
mod spam_train;

use clap::Parser;
use cli::{Cli, Command};

/// Parse arguments, set up logging, and dispatch to the selected tool.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Sieve(args) => sieve::run(args).await,
        Command::SpamRules(args) => spam_rules::run(args).await,
        Command::SpamTrain(args) => spam_train::run(args).await,
        Command::RspamdTrain(args) => rspamd_train::run(args).await,
        Command::Confscan(args) => confscan::run(args),
    }
}

/// Stderr logging; `RUST_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
