//! `mailadm confscan` — configuration-key extraction.

use crate::cli::{ConfscanAction, ConfscanArgs, SchemaFormat, UsageFormat};
use mailadm_confscan::{SchemaScan, UsageScan};
use std::path::{Path, PathBuf};

pub fn run(args: ConfscanArgs) -> i32 {
    match execute(&args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    }
}

fn execute(args: &ConfscanArgs) -> std::io::Result<()> {
    match &args.action {
        ConfscanAction::Usage {
            source_dir,
            format,
            output,
            filter,
        } => {
            let root = resolve_root(source_dir)?;
            let mut scan = UsageScan::scan_dir(&root)?;
            if let Some(prefix) = filter {
                scan.filter_prefix(prefix);
                eprintln!("Filtered to {} keys matching '{}'", scan.keys.len(), prefix);
            }
            match format {
                UsageFormat::Flat => {
                    for key in scan.flat() {
                        println!("{}", key);
                    }
                }
                UsageFormat::Tree => {
                    print!("{}", scan.hierarchy().render());
                }
                UsageFormat::Json => {
                    let json = serde_json::to_string_pretty(&scan.to_json())?;
                    write_output(output.as_deref(), &json)?;
                }
            }
            Ok(())
        }
        ConfscanAction::Schema {
            source_dir,
            format,
            output,
        } => {
            let root = resolve_root(source_dir)?;
            let scan = SchemaScan::scan_dir(&root)?;
            if scan.roots_from_heuristic {
                eprintln!("Warning: no config parsing patterns found, using name-based heuristic");
            }
            let rendered = match format {
                SchemaFormat::Markdown => scan.render_markdown(),
                SchemaFormat::Json => serde_json::to_string_pretty(&scan.to_json())?,
            };
            write_output(output.as_deref(), &rendered)
        }
    }
}

/// Prefer the `crates/` subdirectory when the given path has one.
fn resolve_root(source_dir: &Path) -> std::io::Result<PathBuf> {
    if !source_dir.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory {} does not exist", source_dir.display()),
        ));
    }
    let crates = source_dir.join("crates");
    Ok(if crates.is_dir() {
        crates
    } else {
        source_dir.to_path_buf()
    })
}

fn write_output(output: Option<&Path>, content: &str) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            eprintln!("Exported to {}", path.display());
            Ok(())
        }
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
