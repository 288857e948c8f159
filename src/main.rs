//! gallery-mocker — fills a local media library with provenance-tagged mock
//! photos and videos for testing, tracks what it created, and cleans it up
//! again. Large sample videos are fetched on demand into a local cache with
//! progress reporting and cancellation.

#![warn(clippy::all)]

mod cli;
mod compose;
mod config;
mod download;
mod gallery;
mod library;
mod provenance;
mod shutdown;
mod store;
mod types;
mod util;

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use cli::Command;
use config::Config;
use download::{DownloadCatalog, DownloadCoordinator, DownloadEvent, SampleVideo};
use gallery::{MediaEraser, MediaWriter, PhotoOptions};
use library::{FsMediaLibrary, MediaLibrary};
use store::{JsonFileStore, LocalIndex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = match cli.log_level {
        types::LogLevel::Debug => "debug",
        types::LogLevel::Info => "info",
        types::LogLevel::Warn => "warn",
        types::LogLevel::Error => "error",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = Config::resolve(cli.data_dir.as_deref());
    config.ensure_dirs().context("Failed to create data directories")?;

    match cli.command {
        Command::Photo(args) => run_photo(&config, args).await,
        Command::Video(args) => run_video(&config, args).await,
        Command::Wipe(args) => run_wipe(&config, args).await,
        Command::Download(args) => run_download(&config, args.kind, cli.no_progress_bar).await,
        Command::Downloads => run_downloads(&config),
        Command::DeleteDownloads => run_delete_downloads(&config),
        Command::Status => run_status(&config).await,
    }
}

fn open_components(config: &Config) -> anyhow::Result<(Arc<FsMediaLibrary>, LocalIndex)> {
    let library = Arc::new(
        FsMediaLibrary::open(&config.library_dir).context("Failed to open media library")?,
    );
    let index = LocalIndex::new(Arc::new(JsonFileStore::new(&config.store_path)));
    Ok((library, index))
}

async fn run_photo(config: &Config, args: cli::PhotoArgs) -> anyhow::Result<()> {
    let creation_date = args
        .date
        .as_deref()
        .map(config::parse_creation_date)
        .transpose()?;
    let (library, index) = open_components(config)?;
    let writer = MediaWriter::new(library, index);

    let opts = PhotoOptions {
        overlay_text: args.text,
        random_tint: args.tint,
        creation_date,
    };
    for _ in 0..args.count {
        writer.write_photo(&args.source, opts).await?;
    }
    println!(
        "Wrote {} photo{} to the library",
        args.count,
        if args.count == 1 { "" } else { "s" }
    );
    Ok(())
}

async fn run_video(config: &Config, args: cli::VideoArgs) -> anyhow::Result<()> {
    let creation_date = args
        .date
        .as_deref()
        .map(config::parse_creation_date)
        .transpose()?;

    let source = match (&args.source, args.sample) {
        (Some(source), _) => source.clone(),
        (None, Some(kind)) => {
            let catalog = DownloadCatalog::scan(&config.cache_dir);
            if !catalog.status(kind).is_downloaded() {
                anyhow::bail!(
                    "Sample video '{kind}' is not downloaded yet. Run `gallery-mocker download {kind}` first."
                );
            }
            kind.cache_path(&config.cache_dir)
        }
        (None, None) => unreachable!("clap enforces source or --sample"),
    };

    let (library, index) = open_components(config)?;
    let writer = MediaWriter::new(library, index);
    writer.write_video(&source, creation_date).await?;
    println!("Wrote video to the library");
    Ok(())
}

async fn run_wipe(config: &Config, args: cli::WipeArgs) -> anyhow::Result<()> {
    let (library, index) = open_components(config)?;
    let eraser = MediaEraser::new(library, index);

    let (deleted, strategy) = if args.scan {
        (eraser.delete_by_provenance_scan().await?, "provenance scan")
    } else {
        (eraser.delete_tracked().await?, "tracked index")
    };
    println!(
        "Deleted {deleted} entr{} via {strategy}",
        if deleted == 1 { "y" } else { "ies" }
    );
    Ok(())
}

async fn run_download(
    config: &Config,
    kind: SampleVideo,
    no_progress_bar: bool,
) -> anyhow::Result<()> {
    let mut catalog = DownloadCatalog::scan(&config.cache_dir);
    if catalog.status(kind).is_downloaded() {
        println!(
            "'{kind}' is already downloaded at {}",
            kind.cache_path(&config.cache_dir).display()
        );
        return Ok(());
    }

    let (coordinator, mut events) = DownloadCoordinator::new(reqwest::Client::new(), &config.cache_dir);
    let shutdown_token = shutdown::install_signal_handler();
    coordinator.start(kind)?;

    println!("Downloading '{kind}' (~{} MB)...", kind.size_mb());
    let progress_bar = create_progress_bar(no_progress_bar, 100);
    let mut poll = tokio::time::interval(Duration::from_millis(250));
    let mut cancel_requested = false;

    loop {
        let mut idle_check = false;
        tokio::select! {
            _ = shutdown_token.cancelled(), if !cancel_requested => {
                cancel_requested = true;
                coordinator.cancel();
            }
            update = events.recv() => {
                let Some(update) = update else { break };
                if handle_update(&mut catalog, &progress_bar, update)? {
                    break;
                }
            }
            _ = poll.tick() => {
                idle_check = true;
            }
        }

        if idle_check {
            // Drain anything queued before judging the slot, so a
            // just-finished transfer isn't mistaken for a dropped one.
            let mut saw_terminal = false;
            while let Ok(update) = events.try_recv() {
                if handle_update(&mut catalog, &progress_bar, update)? {
                    saw_terminal = true;
                    break;
                }
            }
            if saw_terminal {
                break;
            }
            if coordinator.active_kind().is_none() {
                // The transfer ended without a terminal event: a non-2xx
                // completion is dropped without notification.
                progress_bar.abandon();
                println!("Download ended without a result; see the log for details");
                break;
            }
        }
    }
    Ok(())
}

/// Apply one update to the catalog and the progress bar. Returns true when
/// the event was terminal.
fn handle_update(
    catalog: &mut DownloadCatalog,
    progress_bar: &ProgressBar,
    update: download::DownloadUpdate,
) -> anyhow::Result<bool> {
    catalog.apply(update.kind, &update.event);
    match update.event {
        DownloadEvent::Progress(fraction) => {
            progress_bar.set_position((fraction * 100.0).round() as u64);
            Ok(false)
        }
        DownloadEvent::Finished(path) => {
            progress_bar.finish();
            println!("Saved to {}", path.display());
            Ok(true)
        }
        DownloadEvent::Cancelled => {
            progress_bar.abandon();
            println!("Download cancelled");
            Ok(true)
        }
        DownloadEvent::Failed(error) => {
            progress_bar.abandon();
            Err(error.into())
        }
    }
}

fn run_downloads(config: &Config) -> anyhow::Result<()> {
    let catalog = DownloadCatalog::scan(&config.cache_dir);
    println!("Download cache: {}", catalog.cache_dir().display());
    for kind in SampleVideo::ALL {
        let status = match catalog.status(kind) {
            download::DownloadStatus::NotDownloaded => "not downloaded".to_string(),
            download::DownloadStatus::InProgress { progress } => {
                format!("in progress ({:.0}%)", progress * 100.0)
            }
            download::DownloadStatus::Downloaded => "downloaded".to_string(),
        };
        println!("  {kind:<10} ~{:>3} MB  {status}", kind.size_mb());
    }
    Ok(())
}

fn run_delete_downloads(config: &Config) -> anyhow::Result<()> {
    let mut catalog = DownloadCatalog::scan(&config.cache_dir);
    catalog
        .delete_downloads()
        .context("Failed to delete downloads (is a cache file missing?)")?;
    println!("Deleted all downloaded sample videos");
    Ok(())
}

async fn run_status(config: &Config) -> anyhow::Result<()> {
    let (library, index) = open_components(config)?;
    let tracked = index.load()?;
    let entries = library.fetch_all().await?;
    let tagged = entries
        .iter()
        .filter(|e| e.location.is_some_and(|tag| tag.is_marker()))
        .count();

    println!("Library: {}", config.library_dir.display());
    println!("  Entries:          {}", entries.len());
    println!("  Provenance-tagged: {tagged}");
    println!("  Tracked in index:  {}", tracked.len());
    println!();
    run_downloads(config)
}

/// Hidden when the user passed `--no-progress-bar` or stdout is not a TTY
/// (piped output would be corrupted by the bar).
fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
            .expect("valid template")
            .progress_chars("=> "),
    );
    pb
}
