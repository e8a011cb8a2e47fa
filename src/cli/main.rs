use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use time::OffsetDateTime;

use logview::core::config::LogViewConfig;
use logview::core::telemetry::logging::init_logging_with_default;
use logview::services::fs::listing::{list_dir, search_files, view_file, ListParams, LogBrowser};
use logview::SortBy;

#[derive(Debug, Parser)]
#[command(name = "logview", version, about = "Browse log folders and archives")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log root; overrides the configuration and environment.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List a folder or archive below the root.
    List {
        #[arg(long)]
        base: Option<String>,
        #[arg(long, default_value = "filename")]
        sort: SortBy,
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print an entry, or its last lines with --tail.
    View {
        name: String,
        #[arg(long)]
        base: Option<String>,
        /// Number of lines; the configured default when given without a value.
        #[arg(long, num_args = 0..=1)]
        tail: Option<Option<usize>>,
    },
    /// Print matching lines from every log file in the root.
    Search { term: String },
}

/// `--tail` alone means the configured count; `--tail 0` is taken literally.
fn tail_count(flag: Option<Option<usize>>, configured: usize) -> Option<usize> {
    flag.map(|lines| lines.unwrap_or(configured))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging_with_default(if cli.verbose { "debug" } else { "info" });

    let config = match &cli.config {
        Some(path) => LogViewConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LogViewConfig::default(),
    }
    .with_env_overrides();

    let root = match cli.root.clone() {
        Some(root) => root,
        None => config.resolve_root()?,
    };
    tracing::debug!(root = %root.display(), "using log root");
    let browser = Arc::new(LogBrowser::new(root));

    match cli.command {
        Command::List {
            base,
            sort,
            desc,
            json,
        } => {
            let params = ListParams {
                base: base.as_deref(),
                sort_by: sort,
                desc,
            };
            let listing = list_dir(browser, params, OffsetDateTime::now_utc())
                .await
                .context("listing failed")?;
            let mut out = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &listing)?;
                writeln!(out)?;
            } else {
                for entry in &listing.entries {
                    writeln!(
                        out,
                        "{:<8} {:>12}  {:<18} {}",
                        entry.kind.as_str(),
                        entry.size,
                        entry.modified_pretty,
                        entry.display_name
                    )?;
                }
            }
        }
        Command::View { name, base, tail } => {
            let tail = tail_count(tail, config.tail_lines);
            view_file(browser, name.clone(), base, tail, io::stdout())
                .await
                .with_context(|| format!("cannot show {name}"))?;
        }
        Command::Search { term } => {
            search_files(browser, term, io::stdout())
                .await
                .context("search failed")?;
        }
    }
    Ok(())
}
