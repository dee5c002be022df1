//! `mailadm spam-rules` — bulk spam-rule listing/export/import.

use crate::cli::{SpamRulesAction, SpamRulesArgs};
use mailadm_stalwart::stalwart::error::StalwartErrorKind;
use mailadm_stalwart::stalwart::{offline, rules};
use mailadm_stalwart::{ApiClient, RuleSet, SettingsSource, StalwartConfig, StalwartError};
use std::io::Read;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";
const RULE_PREFIXES: [&str; 2] = ["spam-filter.rule", "spam-filter.list.scores"];

pub async fn run(args: SpamRulesArgs) -> i32 {
    match execute(&args).await {
        Ok(()) => 0,
        Err(e) => report(e),
    }
}

async fn execute(args: &SpamRulesArgs) -> Result<(), StalwartError> {
    if let SpamRulesAction::ParseDump = args.action {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|e| StalwartError::io(format!("reading stdin: {}", e)))?;
        let records = offline::parse_cli_table(&raw);
        print!("{}", offline::render_key_dump(&records));
        return Ok(());
    }

    let source = settings_source(args)?;
    let settings = source.fetch(&RULE_PREFIXES).await?;
    let rule_set = RuleSet::from_settings(&settings, args.include_disabled);

    match &args.action {
        SpamRulesAction::List { limit } => {
            print_summary(&rule_set, *limit);
            Ok(())
        }
        SpamRulesAction::Export { output, pretty } => {
            let export = rule_set.to_export(&source.source_label());
            let json = if *pretty {
                serde_json::to_string_pretty(&export)?
            } else {
                serde_json::to_string(&export)?
            };
            std::fs::write(output, json + "\n")?;
            println!(
                "Wrote {} ({} rules / {} scores)",
                output.display(),
                export.rules.len(),
                export.scores.len()
            );
            Ok(())
        }
        SpamRulesAction::Import {
            input,
            replace,
            dry_run,
        } => {
            let client = source.remote()?;
            let raw = std::fs::read_to_string(input)?;
            let export: mailadm_stalwart::RuleExport = serde_json::from_str(&raw)?;
            let (mut operations, score_values) = rules::build_import_payload(&export);
            let rule_count = operations.len();

            if *replace && !*dry_run {
                client.clear_prefix("spam-filter.rule").await?;
                client.clear_prefix("spam-filter.list.scores").await?;
                println!("Cleared existing spam-filter rules and scores.");
            }
            if !score_values.is_empty() {
                operations.push(rules::score_batch_operation(&score_values));
            }

            if *dry_run {
                println!("Dry-run: would submit {} operations.", operations.len());
            } else {
                client.apply_settings(&operations).await?;
                println!(
                    "Imported {} rules and {} scores.",
                    rule_count,
                    score_values.len()
                );
            }
            Ok(())
        }
        SpamRulesAction::ParseDump => unreachable!("handled above"),
    }
}

/// Decide between a live server and an offline snapshot, matching the
/// precedence of the configuration surface: explicit offline sources win,
/// otherwise the server (flag, env, or default) is used.
fn settings_source(args: &SpamRulesArgs) -> Result<SettingsSource, StalwartError> {
    if args.config_file.is_some() || args.key_dump.is_some() {
        let mut settings = std::collections::BTreeMap::new();
        if let Some(path) = &args.config_file {
            settings.extend(offline::load_flat_config(path)?);
        }
        if let Some(path) = &args.key_dump {
            settings.extend(offline::load_key_dump(path)?);
        }
        return Ok(SettingsSource::Offline(settings));
    }

    let server = args
        .server
        .clone()
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let config = StalwartConfig {
        server,
        token: args.token.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
        api_prefix: args.api_prefix.clone(),
        verify_tls: !args.insecure,
        ..Default::default()
    };
    Ok(SettingsSource::Remote(ApiClient::new(&config)?))
}

fn print_summary(rule_set: &RuleSet, limit: Option<usize>) {
    let mut rows = rule_set.summary_rows(3);
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    let headers = ["Rule", "Scope", "Priority", "Enabled", "Conditions / Tags"];
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (idx, value) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(value.chars().count());
        }
    }

    let format_row = |values: &[String]| -> String {
        values
            .iter()
            .enumerate()
            .map(|(idx, value)| format!("{:<width$}", value, width = widths[idx]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", format_row(&headers.map(String::from)));
    println!(
        "{}",
        format_row(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>())
    );
    for row in &rows {
        println!("{}", format_row(row));
    }
    println!(
        "\nTotal rules: {} | Total scores: {}",
        rule_set.rules.len(),
        rule_set.scores.len()
    );
}

/// Map an error to the user-visible category and exit code. Shared with
/// `spam-train`, which talks to the same API.
pub(crate) fn report(e: StalwartError) -> i32 {
    match e.kind {
        StalwartErrorKind::Api => {
            eprintln!("Stalwart API error: {}", e.message);
            1
        }
        StalwartErrorKind::Offline | StalwartErrorKind::InvalidConfig => {
            eprintln!("Error: {}", e.message);
            2
        }
        _ => {
            eprintln!("Network error: {}", e.message);
            2
        }
    }
}
