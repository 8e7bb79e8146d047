use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use importers::{DelimitedReader, TabularNormalizer};
use roster_engine::{
    classify, Delivery, EngineConfig, HttpRosterService, NoteKind, PseudoFilter,
    RosterImporter, RosterListener, RosterPageController,
};
use shared_types::{ImportSummary, RosterPage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    log_file_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a delimited customer list into the roster
    Import {
        file: PathBuf,
        /// Print the normalized records without sending them
        #[arg(long)]
        dry_run: bool,
        /// Field delimiter, sniffed from the leading lines when omitted
        #[arg(long)]
        delimiter: Option<char>,
    },
    /// Fetch and print one roster page
    List {
        #[arg(long = "status")]
        statuses: Vec<String>,
        #[arg(long)]
        old_clients: bool,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Tell whether a legacy note reads as an address or a comment
    Classify { text: String },
}

/// Prints whatever reaches the rendering layer.
struct ConsoleListener;

impl RosterListener for ConsoleListener {
    fn on_page_ready(&self, page: &RosterPage) {
        match serde_json::to_string_pretty(page) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize roster page: {}", e),
        }
    }

    fn on_import_complete(&self, summary: &ImportSummary) {
        println!(
            "Imported {} of {} rows ({} skipped, {} failed)",
            summary.imported, summary.total, summary.skipped, summary.failed
        );
    }
}

fn init_tracing(log_file_path: Option<String>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("roster.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let (config, path) = EngineConfig::load().context("Failed to load config")?;
            tracing::debug!("Loaded config from {}", path.display());
            Ok(config)
        }
    }
}

fn reader_for(delimiter: Option<char>) -> anyhow::Result<DelimitedReader> {
    match delimiter {
        None => Ok(DelimitedReader::new()),
        Some(c) if c.is_ascii() => Ok(DelimitedReader::with_delimiter(c as u8)),
        Some(c) => bail!("Delimiter must be a single ASCII character, got {:?}", c),
    }
}

fn classify_note(text: &str) {
    let kind = match classify(text) {
        NoteKind::Address => "address",
        NoteKind::Comment => "comment",
    };
    println!("{}", kind);
}

async fn import(
    file: PathBuf,
    dry_run: bool,
    delimiter: Option<char>,
    config: EngineConfig,
) -> anyhow::Result<()> {
    let reader = reader_for(delimiter)?;

    if dry_run {
        let rows = reader
            .read_file(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let normalized = TabularNormalizer::new().normalize(&rows);
        println!("{}", serde_json::to_string_pretty(&normalized.records)?);
        println!(
            "Header at row {}, {} records, {} rows skipped",
            normalized.header_row_index + 1,
            normalized.records.len(),
            normalized.skipped
        );
        return Ok(());
    }

    let listener: Arc<dyn RosterListener> = Arc::new(ConsoleListener);
    let service = Arc::new(HttpRosterService::new(&config.service)?);
    let importer =
        RosterImporter::new(service.clone(), listener.clone(), &config.import).with_reader(reader);

    let report = importer.import_file(&file).await?;
    for error in &report.errors {
        tracing::warn!("{}", error);
    }

    let mut controller = RosterPageController::new(service, listener, config.paging)?;
    controller.refresh().run().await?;
    Ok(())
}

async fn list(
    statuses: Vec<String>,
    old_clients: bool,
    page: Option<u32>,
    page_size: Option<u32>,
    config: EngineConfig,
) -> anyhow::Result<()> {
    let service = Arc::new(HttpRosterService::new(&config.service)?);
    let mut controller =
        RosterPageController::new(service, Arc::new(ConsoleListener), config.paging)?;

    // Earlier fetches are superseded by later mutations and never awaited.
    let mut pending = controller.fetch_page();
    if !statuses.is_empty() {
        pending = controller.set_status_filter_names(statuses.as_slice())?;
    }
    if old_clients {
        pending = controller.set_pseudo_filter(PseudoFilter::OldClients, true);
    }
    if let Some(page_size) = page_size {
        pending = controller.set_page_size(page_size)?;
    }
    if let Some(page) = page {
        if let Some(fetch) = controller.set_page(page)? {
            pending = fetch;
        }
    }

    if let Delivery::Discarded(page) = pending.run().await? {
        tracing::warn!(generation = page.generation, "Roster page arrived stale");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path);

    match args.command {
        Command::Classify { text } => classify_note(&text),
        Command::Import {
            file,
            dry_run,
            delimiter,
        } => import(file, dry_run, delimiter, load_config(args.config)?).await?,
        Command::List {
            statuses,
            old_clients,
            page,
            page_size,
        } => list(statuses, old_clients, page, page_size, load_config(args.config)?).await?,
    }

    Ok(())
}
