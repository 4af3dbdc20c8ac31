use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use staticd::config::Config;
use staticd::files::FsReader;
use staticd::handler::StaticFiles;
use staticd::server::Server;

#[derive(Parser, Debug)]
#[command(version, about = "Serve static files over HTTP/1.1")]
struct Args {
    /// Number of worker tasks
    #[arg(short, long)]
    workers: Option<usize>,

    /// Document root
    #[arg(short = 'r', long)]
    directory: Option<PathBuf>,

    /// Address to listen on, e.g. localhost:8080
    #[arg(short, long)]
    listen: Option<String>,

    /// YAML config file, taking precedence over STATICD_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let mut cfg = match args.config.as_deref() {
        Some(path) => Config::load_from(Some(path))?,
        None => Config::load()?,
    };
    if let Some(workers) = args.workers {
        cfg.server.workers = workers;
    }
    if let Some(root) = args.directory {
        cfg.static_files.root = root;
    }
    if let Some(listen) = args.listen {
        cfg.server.listen_addr = listen;
    }
    cfg.validate()?;

    let reader = FsReader::new(&cfg.static_files.root).with_context(|| {
        format!("invalid document root {}", cfg.static_files.root.display())
    })?;
    tracing::info!(root = %reader.root().display(), "serving files");

    let server = Server::bind(cfg.server, StaticFiles::new(reader)).await?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                signal.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
        }
    });

    server.run(shutdown).await?;

    Ok(())
}
