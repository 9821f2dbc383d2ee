//! CLI tool for configuration files.
//!
//! Provides commands for:
//! - Showing a backend's entries
//! - Diffing two backends
//! - Applying puts/removes to one or more backends in one request

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config_change_core::{ChangeConfig, ChangeRequestFactory, ChangeSetBuilder};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the configuration tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,

    #[command(subcommand)]
    command: Command,
}

/// Options applied to every backend the tool opens.
#[derive(Args, Debug)]
struct BackendArgs {
    /// Locator suffix selecting the XML format
    #[arg(long, global = true, default_value = ".xml")]
    xml_suffix: String,

    /// Create missing parent directories on commit
    #[arg(long, global = true)]
    create_parent_dirs: bool,

    /// Skip fsync before replacing files
    #[arg(long, global = true)]
    no_sync: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a backend's entries as JSON
    Show {
        /// Backend locator (path or file: URI)
        locator: String,
    },
    /// Print the change set between two backends as JSON
    Diff {
        /// Baseline backend locator
        baseline: String,
        /// Target backend locator
        target: String,
    },
    /// Stage changes and commit them to every listed backend
    Apply {
        /// Backend locators; more than one makes a compound request
        #[arg(required = true)]
        locators: Vec<String>,

        /// Entry to write, as key=value
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        sets: Vec<(String, String)>,

        /// Key to remove
        #[arg(long = "unset", value_name = "KEY")]
        unsets: Vec<String>,

        /// Stage the changes, then cancel instead of committing
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

impl BackendArgs {
    fn to_config(&self) -> ChangeConfig {
        ChangeConfig {
            xml_suffix: self.xml_suffix.clone(),
            create_parent_dirs: self.create_parent_dirs,
            sync_on_commit: !self.no_sync,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let factory = ChangeRequestFactory::new(cli.backend.to_config());
    match cli.command {
        Command::Show { locator } => show(&factory, &locator),
        Command::Diff { baseline, target } => diff(&factory, &baseline, &target),
        Command::Apply {
            locators,
            sets,
            unsets,
            dry_run,
        } => apply(&factory, &locators, sets, unsets, dry_run),
    }
}

fn show(factory: &ChangeRequestFactory, locator: &str) -> Result<()> {
    let snapshot = factory
        .load_snapshot(locator)
        .with_context(|| format!("Failed to read {}", locator))?;
    match snapshot {
        Some(snapshot) => println!("{}", serde_json::to_string_pretty(snapshot.as_map())?),
        None => bail!("{} does not exist", locator),
    }
    Ok(())
}

fn diff(factory: &ChangeRequestFactory, baseline: &str, target: &str) -> Result<()> {
    let before = factory
        .load_snapshot(baseline)
        .with_context(|| format!("Failed to read {}", baseline))?;
    let after = factory
        .load_snapshot(target)
        .with_context(|| format!("Failed to read {}", target))?;

    let changes = ChangeSetBuilder::compare(before.as_ref(), after.as_ref()).build();
    tracing::info!(
        added = changes.added_size(),
        removed = changes.removed_size(),
        updated = changes.updated_size(),
        "Computed change set"
    );
    println!("{}", serde_json::to_string_pretty(&changes)?);
    Ok(())
}

fn apply(
    factory: &ChangeRequestFactory,
    locators: &[String],
    sets: Vec<(String, String)>,
    unsets: Vec<String>,
    dry_run: bool,
) -> Result<()> {
    let mut request = factory
        .create(locators)
        .context("Failed to open change request")?;

    request.put_all(sets)?;
    request.remove_all(unsets)?;

    if dry_run {
        tracing::info!(
            request = %request.id(),
            operations = request.buffer().len(),
            "Dry run, cancelling change request"
        );
        request.cancel()?;
        return Ok(());
    }

    match request.commit() {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => {
            for changes in request.applied_changes() {
                tracing::warn!(locator = changes.source().name(), "Backend was persisted before failure");
            }
            Err(err).context(format!("Commit of request {} failed", request.id()))
        }
    }
}
