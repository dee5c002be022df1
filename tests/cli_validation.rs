//! CLI validation tests for the mailadm binary.

use clap::Parser;
use mailadm::cli::{
    Cli, Command, RspamdAction, SieveAction, SpamRulesAction, TrainTypeArg, UsageFormat,
};

#[test]
fn test_sieve_upload_defaults() {
    let cli = Cli::try_parse_from([
        "mailadm", "sieve", "--username", "jd", "--password", "secret", "upload",
        "--script-file", "filter.sieve",
    ])
    .unwrap();

    let Command::Sieve(args) = cli.command else {
        panic!("expected sieve subcommand");
    };
    assert_eq!(args.host, "localhost");
    assert_eq!(args.port, 4190);
    assert_eq!(args.timeout, 10);
    assert!(!args.plaintext);
    assert!(!args.insecure);

    let SieveAction::Upload {
        script_name,
        no_activate,
        dry_run,
        ..
    } = args.action
    else {
        panic!("expected upload action");
    };
    assert_eq!(script_name, "uploaded");
    assert!(!no_activate);
    assert!(!dry_run);
}

#[test]
fn test_sieve_requires_credentials() {
    // --username has no default and no env fallback.
    std::env::remove_var("SIEVE_PASSWORD");
    let result = Cli::try_parse_from(["mailadm", "sieve", "list"]);
    assert!(result.is_err());
}

#[test]
fn test_sieve_delete_takes_name() {
    let cli = Cli::try_parse_from([
        "mailadm", "sieve", "--username", "jd", "--password", "x", "--starttls", "delete",
        "vacation",
    ])
    .unwrap();
    let Command::Sieve(args) = cli.command else {
        panic!();
    };
    assert!(args.starttls);
    let SieveAction::Delete { name } = args.action else {
        panic!("expected delete action");
    };
    assert_eq!(name, "vacation");
}

#[test]
fn test_spam_rules_list_with_limit() {
    let cli = Cli::try_parse_from([
        "mailadm",
        "spam-rules",
        "--server",
        "https://mail.example.org",
        "list",
        "--limit",
        "5",
    ])
    .unwrap();
    let Command::SpamRules(args) = cli.command else {
        panic!();
    };
    assert_eq!(args.api_prefix, "/api");
    let SpamRulesAction::List { limit } = args.action else {
        panic!("expected list action");
    };
    assert_eq!(limit, Some(5));
}

#[test]
fn test_spam_rules_offline_flags() {
    let cli = Cli::try_parse_from([
        "mailadm",
        "spam-rules",
        "--key-dump",
        "keys.txt",
        "export",
        "rules.json",
        "--pretty",
    ])
    .unwrap();
    let Command::SpamRules(args) = cli.command else {
        panic!();
    };
    assert!(args.key_dump.is_some());
    let SpamRulesAction::Export { output, pretty } = args.action else {
        panic!("expected export action");
    };
    assert_eq!(output.to_str(), Some("rules.json"));
    assert!(pretty);
}

#[test]
fn test_spam_train_requires_type() {
    assert!(Cli::try_parse_from(["mailadm", "spam-train", "mail/"]).is_err());

    let cli =
        Cli::try_parse_from(["mailadm", "spam-train", "--type", "ham", "mail/"]).unwrap();
    let Command::SpamTrain(args) = cli.command else {
        panic!();
    };
    assert_eq!(args.train_type, TrainTypeArg::Ham);
    assert_eq!(args.pattern, "*");
    assert!(!args.fail_fast);
}

#[test]
fn test_rspamd_train_subcommands() {
    let cli = Cli::try_parse_from([
        "mailadm",
        "rspamd-train",
        "--max",
        "50",
        "train",
        "--spam-dir",
        "Junk",
        "--recursive",
    ])
    .unwrap();
    let Command::RspamdTrain(args) = cli.command else {
        panic!();
    };
    assert_eq!(args.max, 50);
    assert_eq!(args.url, "http://localhost:11334");
    let RspamdAction::Train {
        spam_dir,
        ham_dir,
        recursive,
    } = args.action
    else {
        panic!("expected train action");
    };
    assert!(spam_dir.is_some());
    assert!(ham_dir.is_none());
    assert!(recursive);
}

#[test]
fn test_confscan_usage_format() {
    let cli = Cli::try_parse_from([
        "mailadm", "confscan", "usage", "srcdir", "--format", "json", "--filter", "queue",
    ])
    .unwrap();
    let Command::Confscan(args) = cli.command else {
        panic!();
    };
    let mailadm::cli::ConfscanAction::Usage {
        source_dir,
        format,
        filter,
        ..
    } = args.action
    else {
        panic!("expected usage action");
    };
    assert_eq!(source_dir.to_str(), Some("srcdir"));
    assert_eq!(format, UsageFormat::Json);
    assert_eq!(filter.as_deref(), Some("queue"));
}

#[test]
fn test_global_verbose_flag() {
    let cli = Cli::try_parse_from([
        "mailadm", "sieve", "-vv", "--username", "jd", "--password", "x", "list",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 2);
}
