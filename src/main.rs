mod backup;
mod client;
mod config;
mod discovery;
mod error;
mod model;
mod prompt;
mod rotate;

use crate::client::ApiClient;
use crate::config::{Overrides, Scope, resolve, save};
use crate::discovery::{discover, list_networks, list_organizations, resolve_organization};
use crate::model::{mask, value_to_str};
use crate::prompt::Prompter;
use crate::rotate::{Outcome, RotateOptions, backup_target, rotate};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use env_logger::{Builder, Env};
use log::info;
use serde_json::{Value, json};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "merakictl",
    version,
    about = "Rotate Meraki SSID pre-shared keys through the Dashboard API"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "MERAKI_API",
        hide_env_values = true,
        help = "Dashboard API key (otherwise read from config)"
    )]
    api_key: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "Base URL for the API (defaults to https://api.meraki.com/api/v0)"
    )]
    base_url: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "ORG",
        help = "Organization id or name (defaults to the first one visible)"
    )]
    org: Option<String>,

    #[arg(
        long,
        short = 'o',
        value_enum,
        default_value_t = OutputFormat::Pretty,
        global = true,
        help = "Output format for listings"
    )]
    output: OutputFormat,

    #[arg(long, short = 'v', global = true, help = "Log API calls and payloads")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Persist settings to the chosen scope
    Configure {
        #[arg(long)]
        key: Option<String>,
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
        #[arg(long, value_name = "URL", help = "Base URL to store alongside the key")]
        base_url: Option<String>,
        #[arg(long, value_name = "NAME", help = "Default SSID to rotate")]
        ssid: Option<String>,
        #[arg(long, value_name = "DIR", help = "Directory for SSID backups")]
        backup_dir: Option<PathBuf>,
    },
    /// Show current configuration (API key masked)
    ConfigShow,
    /// Check that the API key can list organizations
    Validate,
    /// List organizations visible to the API key
    Orgs,
    /// List networks of the selected organization
    Networks,
    /// List enabled SSIDs with a PSK across networks with access points
    Ssids,
    /// Back up an SSID's configuration without changing it
    Backup {
        #[arg(long, value_name = "NAME", help = "SSID to back up (defaults to config or Guest)")]
        ssid: Option<String>,
        #[arg(long, value_name = "NETWORK", help = "Network id or name holding the SSID")]
        network: Option<String>,
    },
    /// Back up an SSID, then set a new pre-shared key
    Rotate {
        #[arg(long, value_name = "NAME", help = "SSID to rotate (defaults to config or Guest)")]
        ssid: Option<String>,
        #[arg(long, value_name = "NETWORK", help = "Network id or name holding the SSID")]
        network: Option<String>,
        #[arg(long, help = "Take the backup and show the request without sending it")]
        dry_run: bool,
    },
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info,merakictl=debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(level))
        .format(|f, record| match record.level() {
            log::Level::Error | log::Level::Warn => {
                writeln!(f, "{}: {}", record.level().as_str().to_lowercase(), record.args())
            }
            _ => writeln!(f, "{}", record.args()),
        })
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cwd = std::env::current_dir().context("reading current directory")?;

    match &cli.command {
        Commands::Configure {
            key,
            scope,
            base_url,
            ssid,
            backup_dir,
        } => {
            let mut existing = config::load_scope((*scope).into(), &cwd)?;
            if let Some(key) = key.clone() {
                existing.api_key = Some(key);
            }
            if let Some(url) = base_url.clone() {
                existing.base_url = Some(url);
            }
            if let Some(ssid) = ssid.clone() {
                existing.ssid = Some(ssid);
            }
            if let Some(dir) = backup_dir.clone() {
                existing.backup_dir = Some(dir);
            }

            let path = save((*scope).into(), &existing, &cwd)?;
            println!("Saved configuration to {}", path.display());
            return Ok(());
        }
        Commands::ConfigShow => {
            let mut masked = config::load(&cwd)?;
            if masked.api_key.is_some() {
                masked.api_key = Some(mask(masked.api_key.as_deref()));
            }
            println!("{}", serde_json::to_string_pretty(&masked)?);
            return Ok(());
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            match shell {
                CompletionShell::Bash => {
                    generate(shells::Bash, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Zsh => {
                    generate(shells::Zsh, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Fish => {
                    generate(shells::Fish, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut std::io::stdout())
                }
            }
            return Ok(());
        }
        _ => {}
    }

    let target_ssid = match &cli.command {
        Commands::Backup { ssid, .. } | Commands::Rotate { ssid, .. } => ssid.clone(),
        _ => None,
    };
    let effective = resolve(
        &cwd,
        Overrides {
            api_key: cli.api_key.clone(),
            base_url: cli.base_url.clone(),
            ssid: target_ssid,
        },
    )?;
    let client = ApiClient::new(&effective.base_url, &effective.api_key)?;
    let org = cli.org.as_deref();

    match cli.command {
        Commands::Validate => {
            println!("Validating Dashboard API key...");
            match list_organizations(&client) {
                Ok(orgs) => println!("Dashboard API: ok ({} organization(s))", orgs.len()),
                Err(e) => return Err(e.context("Dashboard API key check failed")),
            }
        }
        Commands::Orgs => {
            let orgs = list_organizations(&client)?;
            render(&serde_json::to_value(orgs)?, cli.output, &["name", "id"])?;
        }
        Commands::Networks => {
            let organization = resolve_organization(&client, org)?;
            let networks = list_networks(&client, &organization)?;
            render(
                &serde_json::to_value(networks.networks())?,
                cli.output,
                &["name", "id"],
            )?;
        }
        Commands::Ssids => {
            let discovery = discover(&client, org)?;
            info!(
                "{} eligible SSID(s) across {} wireless network(s) in '{}'",
                discovery.ssids.len(),
                discovery.wireless.len(),
                discovery.organization.name
            );
            let rows: Vec<Value> = discovery
                .ssids
                .iter()
                .map(|s| {
                    json!({
                        "name": s.name,
                        "number": s.number,
                        "encryptionMode": s.encryption_mode,
                        "network": s.network_name,
                        "networkId": s.network_id,
                    })
                })
                .collect();
            render(
                &Value::Array(rows),
                cli.output,
                &["name", "number", "encryptionMode", "network", "networkId"],
            )?;
        }
        Commands::Backup { network, .. } => {
            let opts = RotateOptions {
                org: cli.org.clone(),
                ssid: effective.ssid.clone(),
                network,
                backup_dir: effective.backup_dir.clone(),
                min_psk_len: effective.min_psk_len,
                dry_run: true,
            };
            let backup = backup_target(&client, &opts)?;
            println!("Snapshot: {}", backup.snapshot.display());
            println!("Latest:   {}", backup.latest.display());
            println!("History:  {}", backup.csv.display());
        }
        Commands::Rotate {
            network, dry_run, ..
        } => {
            let opts = RotateOptions {
                org: cli.org.clone(),
                ssid: effective.ssid.clone(),
                network,
                backup_dir: effective.backup_dir.clone(),
                min_psk_len: effective.min_psk_len,
                dry_run,
            };
            let stdin = std::io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
            match rotate(&client, &opts, &mut prompter)? {
                Outcome::Updated(resp) => info!("PSK updated (HTTP {})", resp.status),
                Outcome::Declined | Outcome::DryRun => {}
            }
        }
        Commands::Configure { .. } | Commands::ConfigShow | Commands::Completion { .. } => {
            unreachable!("handled earlier")
        }
    }

    Ok(())
}

fn render(json: &Value, output: OutputFormat, columns: &[&str]) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(json)?),
        OutputFormat::Pretty => {
            if !print_table(json, columns) {
                println!("{}", serde_json::to_string_pretty(json)?);
            }
        }
    }
    Ok(())
}

fn print_table(json: &Value, columns: &[&str]) -> bool {
    let rows = match json {
        Value::Array(arr) => arr,
        _ => return false,
    };

    if rows.is_empty() {
        println!("No resources found.");
        return true;
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    let mut table: Vec<Vec<String>> = Vec::new();
    for row in rows {
        let out_row: Vec<String> = columns
            .iter()
            .map(|col| value_to_str(row.get(*col).unwrap_or(&Value::Null)))
            .collect();
        for (idx, cell) in out_row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.len());
        }
        table.push(out_row);
    }

    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            print!("  ");
        }
        print!("{:width$}", col, width = widths[i]);
    }
    println!();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            print!("  ");
        }
        print!("{:-<width$}", "", width = *width);
    }
    println!();
    for row in table {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                print!("  ");
            }
            print!("{:width$}", cell, width = widths[i]);
        }
        println!();
    }

    true
}
