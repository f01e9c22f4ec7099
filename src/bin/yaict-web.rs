// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! YAICT Web Gallery
//!
//! Standalone web server for browsing and captioning a dataset.

use clap::Parser;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, error, info, warn};

use yaict::config::AppConfig;
use yaict::dataset::DatasetManager;
use yaict::Result;

#[derive(Parser, Debug)]
#[command(name = "yaict-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "0.1.0")]
#[command(about = "YAICT Web Gallery Server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Dataset root directory (overrides config)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Open browser automatically
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("YAICT Web Gallery v0.1.0");

    // Load config
    let mut config = AppConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(root) = args.root {
        config.dataset.root = root.to_string_lossy().to_string();
    }
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }

    let dataset = DatasetManager::open(config.dataset.root_path())?;
    info!("Dataset: {} ({} images)", config.dataset.root, dataset.len());

    if args.open {
        let url = format!("http://{}:{}", config.web.host, config.web.port);
        if let Err(e) = open_browser(&url) {
            error!("Failed to open browser: {}", e);
        }
    }

    yaict::web::start_server(config, dataset).await
}

/// Platform launcher for `url`, `None` where no launcher is known
fn browser_command(url: &str) -> Option<Command> {
    let (program, prefix): (&str, &[&str]) = if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        ("cmd", &["/c", "start", ""])
    } else if cfg!(unix) {
        ("xdg-open", &[])
    } else {
        return None;
    };

    let mut command = Command::new(program);
    command.args(prefix).arg(url);
    Some(command)
}

fn open_browser(url: &str) -> std::io::Result<()> {
    match browser_command(url) {
        Some(mut command) => {
            debug!("Launching {:?}", command);
            command.spawn().map(|_| ())
        }
        None => {
            warn!("No browser launcher for this platform, open {} manually", url);
            Ok(())
        }
    }
}
