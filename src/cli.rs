use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::download::SampleVideo;
use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "gallery-mocker",
    about = "Populate a local media library with provenance-tagged mock photos and videos"
)]
pub struct Cli {
    /// Data directory (library, download cache, index store)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write mock photos into the library
    Photo(PhotoArgs),
    /// Write a mock video into the library
    Video(VideoArgs),
    /// Delete tool-created entries from the library
    Wipe(WipeArgs),
    /// Download a sample video into the local cache
    Download(DownloadArgs),
    /// Show the download cache status
    Downloads,
    /// Delete every downloaded sample video
    DeleteDownloads,
    /// Show the tracked index and library summary
    Status,
}

#[derive(Args, Debug)]
pub struct PhotoArgs {
    /// Source image file
    pub source: PathBuf,

    /// Overlay a caption (random tag + timestamp)
    #[arg(long)]
    pub text: bool,

    /// Blend a random tint over the image
    #[arg(long)]
    pub tint: bool,

    /// Creation date (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    pub date: Option<String>,

    /// Number of photos to write
    #[arg(long, default_value_t = 1)]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct VideoArgs {
    /// Source video file
    #[arg(conflicts_with = "sample", required_unless_present = "sample")]
    pub source: Option<PathBuf>,

    /// Use a downloaded sample video instead of a source file
    #[arg(long, value_enum)]
    pub sample: Option<SampleVideo>,

    /// Creation date (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct WipeArgs {
    /// Scan the whole library for the provenance marker instead of using the
    /// tracked index (recovery path, slower)
    #[arg(long)]
    pub scan: bool,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Which sample video to fetch
    #[arg(value_enum)]
    pub kind: SampleVideo,
}
