// crates/server/src/main.rs
//! Clipdeck server binary.
//!
//! Wires the yt-dlp extractor into the download controller, builds the Axum
//! app, and serves it. Configuration comes from CLI flags with env-var
//! fallbacks for the port.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use clipdeck_core::controller::default_download_dir;
use clipdeck_core::engine::{MediaExtractor, YtDlpExtractor};
use clipdeck_core::{ControllerConfig, DownloadController};
use clipdeck_server::{create_app, logging, AppState};

/// Default port for the server.
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Parser)]
#[command(name = "clipdeck", version, about = "Self-hosted video/audio download manager")]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on (falls back to CLIPDECK_PORT, then PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Directory downloads land in.
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Concurrent download workers.
    #[arg(long, default_value_t = clipdeck_core::controller::DEFAULT_WORKERS)]
    workers: usize,

    /// Path to the yt-dlp binary.
    #[arg(long, default_value = "yt-dlp")]
    ytdlp_bin: PathBuf,

    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Get the server port from the CLI flag or environment.
fn resolve_port(flag: Option<u16>) -> u16 {
    flag.or_else(|| {
        std::env::var("CLIPDECK_PORT")
            .ok()
            .or_else(|| std::env::var("PORT").ok())
            .and_then(|p| p.parse().ok())
    })
    .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_file.as_deref())?;

    eprintln!("\n\u{2b07} clipdeck v{}\n", env!("CARGO_PKG_VERSION"));

    let download_dir = cli.download_dir.unwrap_or_else(default_download_dir);
    let extractor = Arc::new(YtDlpExtractor::with_binary(&cli.ytdlp_bin));
    if let Err(e) = extractor.health_check().await {
        tracing::warn!(error = %e, "yt-dlp unavailable; downloads will fail until it is installed");
        eprintln!("  \u{2717} yt-dlp not found \u{2014} install it or pass --ytdlp-bin");
    }

    let controller = Arc::new(DownloadController::new(
        extractor,
        ControllerConfig {
            workers: cli.workers,
            download_dir: download_dir.clone(),
            ..Default::default()
        },
    ));
    let state = AppState::new(controller);
    let app = create_app(state);

    let port = resolve_port(cli.port);
    let addr = SocketAddr::from((cli.host, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    eprintln!(
        "  \u{2713} Ready \u{2014} {} workers, downloads in {}",
        cli.workers,
        download_dir.display()
    );
    eprintln!("  \u{2192} http://{addr}\n");
    tracing::info!(%addr, workers = cli.workers, download_dir = %download_dir.display(), "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
