//! `mailadm spam-train` — Bayes training against Stalwart.

use crate::cli::{SpamTrainArgs, TrainTypeArg};
use mailadm_stalwart::stalwart::train;
use mailadm_stalwart::{ApiClient, StalwartConfig, StalwartError, TrainClass, TrainRunner};
use std::path::PathBuf;

pub async fn run(args: SpamTrainArgs) -> i32 {
    let class = match args.train_type {
        TrainTypeArg::Spam => TrainClass::Spam,
        TrainTypeArg::Ham => TrainClass::Ham,
    };

    let files = match collect(&args) {
        Ok(files) => files,
        Err(e) => return crate::spam_rules::report(e),
    };

    eprintln!(
        "Found {} file(s) to train as {}",
        files.len(),
        class.as_str().to_uppercase()
    );
    if let Some(account) = &args.account {
        eprintln!("Training for account: {}", account);
    }

    if args.dry_run {
        eprintln!("DRY RUN - No actual training will occur");
        for file in &files {
            println!("Would train: {}", file.display());
        }
        return 0;
    }

    match execute(&args, class, &files).await {
        Ok(failed) => {
            if failed == 0 {
                0
            } else {
                1
            }
        }
        Err(e) => crate::spam_rules::report(e),
    }
}

fn collect(args: &SpamTrainArgs) -> Result<Vec<PathBuf>, StalwartError> {
    let pattern = if args.pattern == "*" {
        None
    } else {
        Some(args.pattern.as_str())
    };
    train::collect_messages(&args.path, args.recursive, pattern)
}

async fn execute(
    args: &SpamTrainArgs,
    class: TrainClass,
    files: &[PathBuf],
) -> Result<usize, StalwartError> {
    let config = StalwartConfig {
        server: args.server.clone(),
        token: args.token.clone().or_else(token_file_fallback),
        username: args.username.clone(),
        password: args.password.clone(),
        verify_tls: !args.insecure,
        ..Default::default()
    };
    let client = ApiClient::new(&config)?;
    let runner = TrainRunner::new(&client, class)
        .account(args.account.clone())
        .fail_fast(args.fail_fast);

    let report = runner.run(files).await?;

    eprintln!();
    eprintln!("{}", "=".repeat(60));
    eprintln!("Training Summary");
    eprintln!("{}", "=".repeat(60));
    eprintln!("Type:       {}", class.as_str().to_uppercase());
    eprintln!("Total:      {} messages", report.total);
    eprintln!("Successful: {}", report.succeeded);
    eprintln!("Failed:     {}", report.failed);
    if !report.failures.is_empty() {
        eprintln!();
        eprintln!("Errors:");
        for failure in report.failures.iter().take(10) {
            eprintln!("  {}: {}", failure.source, failure.reason);
        }
        if report.failures.len() > 10 {
            eprintln!("  ... and {} more errors", report.failures.len() - 10);
        }
    }
    Ok(report.failed)
}

/// `~/.stalwart-token`, matching the configuration surface of the
/// training tool.
fn token_file_fallback() -> Option<String> {
    let home = std::env::var_os("HOME")?;
    let path = PathBuf::from(home).join(".stalwart-token");
    let token = std::fs::read_to_string(path).ok()?;
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
