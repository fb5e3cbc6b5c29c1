#![forbid(unsafe_code)]

//! Operator tool for a tracker database.
//!
//! ```bash
//! tk-admin --config tracker.toml init
//! tk-admin show-issue 12 --short
//! tk-admin history 12
//! RUST_LOG=tk_storage=debug tk-admin reset --yes
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tk_core::ids::{IssueId, ProjectId};
use tk_core::views::Projection;
use tk_storage::{SqliteStore, StoreConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tk-admin")]
#[command(about = "Inspect and maintain an issue tracker database")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overrides the configuration
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and install the schema
    Init,
    /// Drop every table and install an empty schema
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Print a project as JSON
    ShowProject {
        project_id: i64,
        #[arg(long)]
        short: bool,
    },
    /// Print an issue as JSON
    ShowIssue {
        issue_id: i64,
        #[arg(long)]
        short: bool,
    },
    /// Print the change history of an issue in order
    History { issue_id: i64 },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(database = %config.database_path.display(), "tk-admin starting");

    match args.command {
        Command::Init => {
            let store = SqliteStore::open(config).context("open database")?;
            print_json(&serde_json::json!({
                "database": store.config().database_path,
                "ready": true,
            }))
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("reset drops every table; pass --yes to confirm");
            }
            let mut store = SqliteStore::open_or_reset(config).context("open database")?;
            store.reset_schema().context("reset schema")?;
            print_json(&serde_json::json!({
                "database": store.config().database_path,
                "reset": true,
            }))
        }
        Command::ShowProject { project_id, short } => {
            let store = SqliteStore::open(config).context("open database")?;
            let project = store
                .read()
                .project(ProjectId::new(project_id))?
                .with_context(|| format!("project {project_id} not found"))?;
            print_projection(&project, short)
        }
        Command::ShowIssue { issue_id, short } => {
            let store = SqliteStore::open(config).context("open database")?;
            let issue = store
                .read()
                .issue(IssueId::new(issue_id))?
                .with_context(|| format!("issue {issue_id} not found"))?;
            print_projection(&issue, short)
        }
        Command::History { issue_id } => {
            let store = SqliteStore::open(config).context("open database")?;
            let entries = store
                .read()
                .history_for(IssueId::new(issue_id))?
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&entries)
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }
    Ok(config)
}

fn print_projection<T: Projection>(value: &T, short: bool) -> anyhow::Result<()> {
    if short {
        print_json(&value.short())
    } else {
        print_json(&value.long())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
