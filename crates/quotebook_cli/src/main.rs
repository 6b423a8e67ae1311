//! Command-line adapter for the quote core.
//!
//! Every subcommand opens the configured store, performs one action through
//! `QuotebookApi`, and prints the result.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use quotebook_core::{
    init_logging, LoadOrigin, Quote, QuoteFilter, QuotebookApi, QuotebookConfig, SyncOutcome,
};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_EXPORT_FILE: &str = "quotes_export.json";

#[derive(Debug, Parser)]
#[command(name = "quotebook", version, about = "Keep a synced collection of quotes")]
struct Cli {
    /// JSON config file. Missing files fall back to defaults.
    #[arg(long, global = true, env = "QUOTEBOOK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add one quote.
    Add { text: String, category: String },
    /// List quotes, optionally for one category.
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// List known categories.
    Categories,
    /// Show one random quote under the selected filter.
    Random {
        /// Select this category (or `all`) before picking.
        #[arg(long)]
        category: Option<String>,
    },
    /// Remember a category filter (`all` clears it).
    Filter { value: String },
    /// Write the collection to a JSON file.
    Export { path: Option<PathBuf> },
    /// Append quotes from a JSON file.
    Import { path: PathBuf },
    /// Reconcile with the remote source once.
    Sync,
    /// Reconcile on a timer until interrupted.
    Watch {
        /// Override the configured period.
        #[arg(long)]
        secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = QuotebookConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("initializing logging")?;
    }

    let (api, report) = QuotebookApi::open(&config).context("opening quote store")?;
    if report.origin != LoadOrigin::Stored {
        eprintln!("note: seeded default quotes ({:?})", report.origin);
    }
    if let Some(err) = report.persist_error {
        eprintln!("warning: default quotes were not saved: {err}");
    }

    match cli.command {
        Command::Add { text, category } => {
            let response = api.add_quote(&text, &category);
            report_action(response.ok, &response.message)?;
            if let Some(quote) = response.quote {
                print_quote(&quote);
            }
        }
        Command::List { category } => {
            let filter = category
                .as_deref()
                .map(QuoteFilter::parse)
                .unwrap_or_else(|| api.selected_filter());
            let quotes = api.visible_quotes(&filter);
            if quotes.is_empty() {
                println!("No quotes for `{filter}`.");
            }
            quotes.iter().for_each(print_quote);
        }
        Command::Categories => {
            for category in api.categories() {
                println!("{category}");
            }
        }
        Command::Random { category } => {
            if let Some(category) = category {
                let response = api.select_filter(&category);
                report_action(response.ok, &response.message)?;
            }
            let response = api.show_random();
            report_action(response.ok, &response.message)?;
            if let Some(quote) = response.quote {
                print_quote(&quote);
            }
        }
        Command::Filter { value } => {
            let response = api.select_filter(&value);
            report_action(response.ok, &response.message)?;
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
            let payload = api.export_json()?;
            std::fs::write(&path, payload)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Exported {} quote(s) to {}.", api.collection().len(), path.display());
        }
        Command::Import { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let response = api.import_json(&raw);
            report_action(response.ok, &response.message)?;
        }
        Command::Sync => {
            let outcome = api.request_sync().await;
            println!("{}", api.sync_state().status_text());
            if let SyncOutcome::Failed(reason) = outcome {
                bail!("sync failed: {reason}");
            }
        }
        Command::Watch { secs } => {
            let period = Duration::from_secs(secs.unwrap_or(config.sync_interval_secs).max(1));
            let handle = api.start_sync(period);
            let mut changes = api.subscribe();
            println!("Syncing every {}s; press Ctrl-C to stop.", period.as_secs());
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        println!(
                            "{} ({} quote(s))",
                            api.sync_state().status_text(),
                            api.collection().len()
                        );
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            handle.stop().await;
        }
    }

    Ok(())
}

fn report_action(ok: bool, message: &str) -> Result<()> {
    if !ok {
        bail!("{message}");
    }
    println!("{message}");
    Ok(())
}

fn print_quote(quote: &Quote) {
    println!("\"{}\" [{}]", quote.text, quote.category);
}
