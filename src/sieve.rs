//! `mailadm sieve` — Sieve script management over ManageSieve.

use crate::cli::{SieveAction, SieveArgs};
use mailadm_managesieve::managesieve::error::SieveErrorKind;
use mailadm_managesieve::managesieve::types::{SieveConnectionConfig, SieveSecurityMode};
use mailadm_managesieve::{SieveClient, SieveError};

pub async fn run(args: SieveArgs) -> i32 {
    if let SieveAction::Upload {
        script_file,
        script_name,
        no_activate,
        dry_run: true,
    } = &args.action
    {
        println!(
            "[dry-run] Would upload {} as '{}' to {}:{}",
            script_file.display(),
            script_name,
            args.host,
            args.port
        );
        if *no_activate {
            println!("[dry-run] Script would remain inactive after upload");
        }
        return 0;
    }

    match execute(&args).await {
        Ok(()) => 0,
        Err(e) => report(e),
    }
}

async fn execute(args: &SieveArgs) -> Result<(), SieveError> {
    let security = if args.plaintext {
        SieveSecurityMode::None
    } else if args.starttls {
        SieveSecurityMode::StartTls
    } else {
        SieveSecurityMode::Implicit
    };
    let config = SieveConnectionConfig {
        host: args.host.clone(),
        port: args.port,
        username: args.username.clone(),
        password: args.password.clone(),
        security,
        accept_invalid_certs: args.insecure,
        timeout_secs: args.timeout,
    };

    let mut client = SieveClient::new(config)?;
    client.connect().await?;
    client.authenticate().await?;

    let result = dispatch(&mut client, args).await;
    // Teardown is best-effort regardless of how the command went.
    let _ = client.close().await;
    result
}

async fn dispatch(client: &mut SieveClient, args: &SieveArgs) -> Result<(), SieveError> {
    match &args.action {
        SieveAction::List => {
            let scripts = client.list_scripts().await?;
            if scripts.is_empty() {
                println!("No scripts found.");
            } else {
                for entry in scripts {
                    let marker = if entry.active { "*" } else { " " };
                    println!("{} {}", marker, entry.name);
                }
            }
            Ok(())
        }
        SieveAction::Delete { name } => {
            client.delete_script(name).await?;
            println!("Deleted script '{}' from {}:{}", name, args.host, args.port);
            Ok(())
        }
        SieveAction::Activate { name } => {
            client.set_active(name).await?;
            println!("Activated script '{}' on {}:{}", name, args.host, args.port);
            Ok(())
        }
        SieveAction::Upload {
            script_file,
            script_name,
            no_activate,
            ..
        } => {
            let body = std::fs::read(script_file)
                .map_err(|e| SieveError::io(format!("{}: {}", script_file.display(), e)))?;
            client.put_script(script_name, &body).await?;
            if !no_activate {
                client.set_active(script_name).await?;
            }
            let mut message = format!(
                "Uploaded {} as '{}' to {}:{}",
                script_file.display(),
                script_name,
                args.host,
                args.port
            );
            if *no_activate {
                message.push_str(" (not activated)");
            }
            println!("{}", message);
            Ok(())
        }
    }
}

/// Map an error to the user-visible category and exit code: text the
/// server produced prints verbatim, everything else is a network or
/// usage problem.
fn report(e: SieveError) -> i32 {
    match e.kind {
        SieveErrorKind::Rejected
        | SieveErrorKind::ServerBye
        | SieveErrorKind::AuthFailed
        | SieveErrorKind::Protocol => {
            eprintln!("ManageSieve error: {}", e.message);
            1
        }
        SieveErrorKind::InvalidName
        | SieveErrorKind::InvalidConfig
        | SieveErrorKind::InvalidState => {
            eprintln!("Error: {}", e.message);
            2
        }
        _ => {
            eprintln!("Network error: {}", e.message);
            2
        }
    }
}
