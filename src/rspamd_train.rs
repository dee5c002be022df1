//! `mailadm rspamd-train` — Bayes training against an Rspamd controller.

use crate::cli::{RspamdAction, RspamdTrainArgs};
use mailadm_rspamd::rspamd::error::RspamdErrorKind;
use mailadm_rspamd::rspamd::trainer;
use mailadm_rspamd::{
    LearnClass, LearnReport, RspamdClient, RspamdConfig, RspamdError, TrainState, Trainer,
};
use std::path::PathBuf;

pub async fn run(args: RspamdTrainArgs) -> i32 {
    match execute(&args).await {
        Ok(()) => 0,
        Err(e) => report(e),
    }
}

async fn execute(args: &RspamdTrainArgs) -> Result<(), RspamdError> {
    match &args.action {
        RspamdAction::Reset { yes } => {
            if !*yes {
                eprintln!("This resets the training state file; messages will be retrained");
                eprintln!("on the next run. Rspamd's Bayes database is NOT cleared.");
                eprintln!("Re-run with --yes to confirm.");
                return Ok(());
            }
            let mut state = TrainState::default();
            state.save(&args.state_file)?;
            println!("State file reset: {}", args.state_file.display());
            Ok(())
        }
        RspamdAction::Stats => {
            let client = client(args)?;
            let state = TrainState::load(&args.state_file)?;
            match client.stat().await {
                Ok(stats) => {
                    println!("Rspamd stats:");
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                Err(e) => eprintln!("Warning: could not get rspamd stats: {}", e),
            }
            println!();
            println!("Local training state:");
            println!(
                "  Spam messages trained: {}",
                state.trained_count(LearnClass::Spam)
            );
            println!(
                "  Ham messages trained:  {}",
                state.trained_count(LearnClass::Ham)
            );
            println!(
                "  Last training run:     {}",
                state.last_run.as_deref().unwrap_or("never")
            );
            for line in trainer::readiness_lines(&state) {
                println!("  {}", line);
            }
            Ok(())
        }
        RspamdAction::Train {
            spam_dir,
            ham_dir,
            recursive,
        } => {
            if spam_dir.is_none() && ham_dir.is_none() {
                return Err(RspamdError::invalid_config(
                    "Nothing to train: pass --spam-dir and/or --ham-dir",
                ));
            }
            let client = client(args)?;
            let mut state = TrainState::load(&args.state_file)?;
            let trainer = Trainer::new(&client, args.max);

            if let Some(dir) = spam_dir {
                train_class(&trainer, &mut state, dir, LearnClass::Spam, *recursive).await?;
            }
            if let Some(dir) = ham_dir {
                train_class(&trainer, &mut state, dir, LearnClass::Ham, *recursive).await?;
            }
            state.save(&args.state_file)?;

            println!();
            for line in trainer::readiness_lines(&state) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

async fn train_class(
    trainer: &Trainer<'_>,
    state: &mut TrainState,
    dir: &PathBuf,
    class: LearnClass,
    recursive: bool,
) -> Result<(), RspamdError> {
    println!(
        "Training {} from {}",
        class.as_str().to_uppercase(),
        dir.display()
    );
    let paths = trainer::collect_messages(dir, recursive)?;
    if paths.is_empty() {
        println!("  no messages found");
        return Ok(());
    }
    let report = trainer.run(state, &paths, class).await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &LearnReport) {
    println!(
        "  {} trained, {} skipped (already known), {} failed of {} total",
        report.trained, report.skipped, report.failed, report.total
    );
    for error in report.errors.iter().take(10) {
        eprintln!("  {}", error);
    }
    if report.errors.len() > 10 {
        eprintln!("  ... and {} more errors", report.errors.len() - 10);
    }
}

fn client(args: &RspamdTrainArgs) -> Result<RspamdClient, RspamdError> {
    RspamdClient::new(&RspamdConfig {
        url: args.url.clone(),
        password: args.password.clone(),
        ..Default::default()
    })
}

fn report(e: RspamdError) -> i32 {
    match e.kind {
        RspamdErrorKind::Api => {
            eprintln!("Rspamd error: {}", e.message);
            1
        }
        RspamdErrorKind::InvalidConfig => {
            eprintln!("Error: {}", e.message);
            2
        }
        _ => {
            eprintln!("Network error: {}", e.message);
            2
        }
    }
}
