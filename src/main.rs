//! BorgorTube - adaptive playback sessions for online video
//!
//! Resolves videos with yt-dlp, falls back to browser cookies when anonymous
//! extraction is refused, and drives mpv over its JSON IPC socket.

use anyhow::Result;
use borgortube::app;
use borgortube::extractor::ytdlp::find_ytdlp;
use borgortube::utils::{platform, AppSettings};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "borgortube", version, about)]
struct Args {
    /// Video URL or ID to open on startup
    reference: Option<String>,

    /// Run a search on startup
    #[arg(long)]
    search: Option<String>,

    /// Window id to embed the player into
    #[arg(long)]
    wid: Option<String>,

    /// Start with the player in its own window
    #[arg(long)]
    detach: bool,

    /// Settings file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let settings_path = args.config.unwrap_or_else(platform::settings_path);
    let settings = AppSettings::load_or_default(&settings_path);
    info!("Using settings from {}", settings_path.display());

    check_ytdlp_installed(&settings);

    app::run(settings, args.reference, args.search, args.wid, args.detach).await
}

fn check_ytdlp_installed(settings: &AppSettings) {
    let found = settings
        .extractor_path
        .clone()
        .or_else(find_ytdlp)
        .filter(|path| path.exists());

    match found {
        Some(path) => info!("yt-dlp found at: {}", path.display()),
        None => {
            eprintln!("ERROR: yt-dlp not found in common locations");
            eprintln!("Install it, or set extractor_path in the settings file:");
            eprintln!("  pip install yt-dlp");
            eprintln!("  or visit: https://github.com/yt-dlp/yt-dlp");
        }
    }
}
