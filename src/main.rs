use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use t3monitoring_core::storage::{NewClient, SqliteStore};
use t3monitoring_core::{init_logger, run_client_import, ImportConfig};

#[derive(Parser, Debug)]
#[command(name = "t3monitoring-import", version, about = "Import client reports into t3monitoring")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "T3MONITORING_CONFIG")]
    config: Option<PathBuf>,

    /// Database path, overrides the configuration.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import all eligible clients, or a single one.
    Run {
        #[arg(long)]
        client: Option<i64>,
    },
    /// Register a client to be imported.
    AddClient {
        #[arg(long)]
        title: String,
        #[arg(long)]
        domain: String,
        #[arg(long)]
        secret: String,
        #[arg(long)]
        hidden: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        log::error!("error: {:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ImportConfig::load(cli.config.as_deref()).context("config load failed")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    init_logger(config.log_filter()?);

    match cli.command {
        Command::Run { client } => {
            let outcome = run_client_import(&config, client)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::AddClient {
            title,
            domain,
            secret,
            hidden,
        } => {
            let store = SqliteStore::open(&config.database_path)?;
            let id = store.register_client(&NewClient {
                title,
                domain,
                secret,
                hidden,
            })?;
            println!("{}", id);
        }
    }

    Ok(())
}
