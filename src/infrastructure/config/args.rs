use super::app_config::LogLevel;
use crate::domain::entities::ImageSize;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "modio-asset-cache",
    version,
    about = "Fetch and cache mod.io images with request deduplication",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Disk cache directory.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum images kept in memory.
    #[arg(long)]
    pub memory_capacity: Option<usize>,

    /// Maximum concurrent downloads.
    #[arg(long)]
    pub max_concurrent_downloads: Option<usize>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Mod ids to treat as subscribed.
    #[arg(long, value_name = "MOD_ID")]
    pub subscribe: Vec<u64>,

    /// Read mod profiles (JSON array or mod.io page) and fetch their logos and video thumbnails.
    #[arg(long, value_name = "PATH")]
    pub profiles: Option<PathBuf>,

    /// Logo size to fetch for `--profiles`.
    #[arg(long, default_value = "thumb_320x180")]
    pub size: ImageSize,

    /// Persist plain URL downloads to the disk cache.
    #[arg(long)]
    pub persist: bool,

    /// Image URLs or YouTube links to fetch.
    pub urls: Vec<String>,
}
