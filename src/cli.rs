//! Command-line argument parsing for the mailadm toolkit.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// mailadm - administrative tooling for a small mail server.
#[derive(Debug, Parser)]
#[command(
    name = "mailadm",
    version,
    about = "Sieve script management, spam-rule bulk editing, and Bayes training"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage Sieve scripts over ManageSieve
    Sieve(SieveArgs),
    /// List, export, and re-import Stalwart spam-filter rules in bulk
    SpamRules(SpamRulesArgs),
    /// Train Stalwart's Bayes spam filter with local messages
    SpamTrain(SpamTrainArgs),
    /// Train Rspamd's Bayes classifier from local mail folders
    RspamdTrain(RspamdTrainArgs),
    /// Extract configuration keys from a Rust source tree
    Confscan(ConfscanArgs),
}

// ─── sieve ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SieveArgs {
    /// ManageSieve host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// ManageSieve port
    #[arg(long, default_value_t = 4190)]
    pub port: u16,

    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long, env = "SIEVE_PASSWORD")]
    pub password: String,

    /// Disable TLS (only for trusted dev labs)
    #[arg(long)]
    pub plaintext: bool,

    /// Use STARTTLS instead of implicit TLS
    #[arg(long)]
    pub starttls: bool,

    /// Skip TLS certificate validation
    #[arg(long)]
    pub insecure: bool,

    /// Network timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    #[command(subcommand)]
    pub action: SieveAction,
}

#[derive(Debug, Subcommand)]
pub enum SieveAction {
    /// Upload (and optionally activate) a script
    Upload {
        /// Local Sieve script to upload
        #[arg(long, value_name = "FILE")]
        script_file: PathBuf,

        /// Remote script name
        #[arg(long, default_value = "uploaded")]
        script_name: String,

        /// Do not set the uploaded script active
        #[arg(long)]
        no_activate: bool,

        /// Print what would happen without contacting the server
        #[arg(long)]
        dry_run: bool,
    },
    /// List scripts on the server
    List,
    /// Delete the named script
    Delete {
        /// Remote script name
        name: String,
    },
    /// Mark the named script active
    Activate {
        /// Remote script name
        name: String,
    },
}

// ─── spam-rules ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SpamRulesArgs {
    /// Base URL of the Stalwart management API
    #[arg(long, env = "STALWART_SERVER")]
    pub server: Option<String>,

    /// API token
    #[arg(long, env = "STALWART_TOKEN")]
    pub token: Option<String>,

    /// Fallback HTTP basic auth username
    #[arg(long)]
    pub username: Option<String>,

    /// Fallback HTTP basic auth password
    #[arg(long, env = "STALWART_PASSWORD")]
    pub password: Option<String>,

    /// Path prefix for management endpoints
    #[arg(long, env = "STALWART_API_PREFIX", default_value = "/api")]
    pub api_prefix: String,

    /// Skip TLS verification (development only)
    #[arg(long)]
    pub insecure: bool,

    /// Offline mode: flattened config file to read rules from
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Offline mode: parsed key dump to read rules from
    #[arg(long, value_name = "FILE")]
    pub key_dump: Option<PathBuf>,

    /// Include disabled rules in the listing/export
    #[arg(long)]
    pub include_disabled: bool,

    #[command(subcommand)]
    pub action: SpamRulesAction,
}

#[derive(Debug, Subcommand)]
pub enum SpamRulesAction {
    /// Print a summary of the rules
    List {
        /// Limit how many rules are shown
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write the rules and scores to JSON
    Export {
        /// Destination file
        output: PathBuf,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Read JSON created by `export` and push it to the server
    Import {
        /// Source file
        input: PathBuf,

        /// Clear existing rules and scores before importing
        #[arg(long)]
        replace: bool,

        /// Show the operations that would run without calling the API
        #[arg(long)]
        dry_run: bool,
    },
    /// Convert `stalwart-cli server list-config` table output (stdin)
    /// into a Key/Value dump usable with --key-dump
    ParseDump,
}

// ─── spam-train ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrainTypeArg {
    /// Unwanted mail
    Spam,
    /// Legitimate mail
    Ham,
}

#[derive(Debug, Args)]
pub struct SpamTrainArgs {
    /// Path to an email file or directory
    pub path: PathBuf,

    /// Training type
    #[arg(long = "type", value_enum)]
    pub train_type: TrainTypeArg,

    /// Account ID for per-user training (email address or username)
    #[arg(long)]
    pub account: Option<String>,

    /// Stalwart server URL
    #[arg(long, env = "STALWART_SERVER", default_value = "http://localhost:8080")]
    pub server: String,

    /// API token
    #[arg(long, env = "STALWART_TOKEN")]
    pub token: Option<String>,

    /// Username for basic authentication (if no token)
    #[arg(long)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "STALWART_PASSWORD")]
    pub password: Option<String>,

    /// Skip TLS verification (development only)
    #[arg(long)]
    pub insecure: bool,

    /// Recursively scan directories
    #[arg(long)]
    pub recursive: bool,

    /// File pattern to match (e.g. "*.eml")
    #[arg(long, default_value = "*")]
    pub pattern: String,

    /// Stop on the first error instead of continuing and reporting
    #[arg(long)]
    pub fail_fast: bool,

    /// Show what would be done without training
    #[arg(long)]
    pub dry_run: bool,
}

// ─── rspamd-train ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RspamdTrainArgs {
    /// Rspamd controller URL
    #[arg(long, default_value = "http://localhost:11334")]
    pub url: String,

    /// Controller password
    #[arg(long, env = "RSPAMD_PASSWORD")]
    pub password: Option<String>,

    /// Training state file
    #[arg(long, default_value = "/tmp/rspamd-train-state.json", value_name = "FILE")]
    pub state_file: PathBuf,

    /// Max newly-trained messages per run (0 = unlimited)
    #[arg(long, default_value_t = 1000)]
    pub max: usize,

    #[command(subcommand)]
    pub action: RspamdAction,
}

#[derive(Debug, Subcommand)]
pub enum RspamdAction {
    /// Train Bayes from local mail folders
    Train {
        /// Folder of spam messages
        #[arg(long, value_name = "DIR")]
        spam_dir: Option<PathBuf>,

        /// Folder of ham messages
        #[arg(long, value_name = "DIR")]
        ham_dir: Option<PathBuf>,

        /// Recursively scan the folders
        #[arg(long)]
        recursive: bool,
    },
    /// Show controller statistics and local training state
    Stats,
    /// Reset the training state file (does not untrain Rspamd)
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

// ─── confscan ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UsageFormat {
    #[default]
    Tree,
    Flat,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SchemaFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Args)]
pub struct ConfscanArgs {
    #[command(subcommand)]
    pub action: ConfscanAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfscanAction {
    /// Scan runtime accessor calls (config.property(...), sub_keys, ...)
    Usage {
        /// Path to the source tree (its `crates/` subdirectory is used
        /// when present)
        #[arg(default_value = ".")]
        source_dir: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "tree")]
        format: UsageFormat,

        /// Output file for JSON format
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Filter keys by prefix (e.g. "queue" or "server.listener")
        #[arg(long)]
        filter: Option<String>,
    },
    /// Scan serde config structs and expand their nested keys
    Schema {
        /// Path to the source tree
        #[arg(default_value = ".")]
        source_dir: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: SchemaFormat,

        /// Output file (stdout when omitted)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}
