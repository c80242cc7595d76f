//! Rekor CLI
//!
//! Inspects the registered entry kinds and validates proposed entries
//! locally before they are submitted to a transparency log.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rekor_types::{KindRegistry, ProposedEntry, RegistryError, RekorConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rekor")]
#[command(about = "Rekor transparency log CLI")]
#[command(version)]
struct Cli {
    /// Config file (default is $HOME/.rekor.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server address:port
    #[arg(long, global = true)]
    log_rpc_server: Option<String>,

    /// Transparency log ID
    #[arg(long, global = true)]
    tlog_id: Option<i64>,

    /// In-toto link file
    #[arg(long, global = true)]
    linkfile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entry kinds and the versions they accept
    Kinds,

    /// Validate a proposed entry file without submitting it
    Validate {
        /// Proposed entry JSON file
        file: PathBuf,
    },

    /// View and manage client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Write the effective configuration to a file
    Init {
        /// Output path
        #[arg(short, long, default_value = ".rekor.toml")]
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Loaded configuration with command-line overrides applied
fn effective_config(cli: &Cli) -> anyhow::Result<RekorConfig> {
    let mut config = RekorConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(server) = &cli.log_rpc_server {
        config.log_rpc_server = server.clone();
    }
    if let Some(tlog_id) = cli.tlog_id {
        config.tlog_id = tlog_id;
    }
    if let Some(linkfile) = &cli.linkfile {
        config.linkfile = Some(linkfile.clone());
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = effective_config(&cli)?;
    tracing::debug!(server = %config.log_rpc_server, tlog_id = config.tlog_id, "configuration loaded");

    match cli.command {
        Commands::Kinds => {
            let registry = KindRegistry::with_builtin_kinds()?;
            for kind in registry.kinds() {
                println!("{}", kind);
                if let Some(handler) = registry.lookup(&kind) {
                    for constraint in handler.versions() {
                        println!("  {}", constraint);
                    }
                }
            }
            Ok(())
        }

        Commands::Validate { file } => {
            let content = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let entry = ProposedEntry::from_slice(&content)
                .with_context(|| format!("{} is not a proposed entry", file.display()))?;

            let registry = KindRegistry::with_builtin_kinds()?;
            let object = registry.unmarshal(&entry).map_err(|e| with_entry_context(e, &entry))?;

            let canonical = object
                .canonicalize()
                .map_err(|e| anyhow::anyhow!("failed to canonicalize entry: {}", e))?;
            println!("{}", String::from_utf8_lossy(&canonical));
            if object.has_external_entities() {
                eprintln!("note: entry references external data that must be fetched before submission");
            }
            Ok(())
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    println!("{}", toml::to_string_pretty(&config)?);
                }
                Ok(())
            }
            ConfigCommands::Init { output } => {
                if output.exists() {
                    anyhow::bail!("{} already exists", output.display());
                }
                config
                    .save(&output)
                    .with_context(|| format!("failed to write {}", output.display()))?;
                println!("Config written to {}", output.display());
                Ok(())
            }
        },
    }
}

fn with_entry_context(err: RegistryError, entry: &ProposedEntry) -> anyhow::Error {
    let kind = err.kind().unwrap_or(entry.kind.as_str()).to_string();
    let version = err.version().unwrap_or(entry.api_version.as_str()).to_string();
    anyhow::Error::new(err).context(format!("entry of kind '{}' at version '{}' rejected", kind, version))
}
