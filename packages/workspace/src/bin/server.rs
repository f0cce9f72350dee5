use abc_workspace::{
    bind_first_server, resolve_socket_path, serve, BindOutcome, Config, DocumentStore, Handlers,
    SharedStore,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Structural editing server for ABC notation
#[derive(Parser, Debug)]
#[command(name = "abc-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root directory; its documents are opened at startup
    #[arg(default_value = ".")]
    root_dir: PathBuf,

    /// Socket name (overrides the config file)
    #[arg(long)]
    socket_name: Option<String>,

    /// Explicit socket path (overrides the derived one)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Stale-socket probe timeout in milliseconds
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Do not open documents found under the root directory
    #[arg(long)]
    no_preload: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout stays free
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load(&args.root_dir)
        .with_context(|| format!("Failed to load config from {}", args.root_dir.display()))?;
    if let Some(name) = args.socket_name {
        config.socket_name = name;
    }
    if let Some(timeout) = args.probe_timeout_ms {
        config.probe_timeout_ms = timeout;
    }

    let mut store = DocumentStore::new();
    if !args.no_preload {
        let opened = preload(&mut store, &args.root_dir, &config)?;
        tracing::info!("Opened {} document(s) from {}", opened, args.root_dir.display());
    }

    let socket = args
        .socket
        .unwrap_or_else(|| resolve_socket_path(&config.socket_name));
    let probe_timeout = config.probe_timeout();
    let handlers = Handlers::new(SharedStore::new(RwLock::new(store)), config);

    match bind_first_server(&socket, probe_timeout)
        .await
        .with_context(|| format!("Failed to bind {}", socket.display()))?
    {
        BindOutcome::Bound(listener) => {
            tracing::info!("Serving on {}", socket.display());
            serve(listener, handlers).await.context("Server stopped")?;
        }
        BindOutcome::NotOwner => {
            tracing::info!("Another server owns {}; exiting", socket.display());
        }
    }
    Ok(())
}

/// Open every document under `root` with a configured extension
fn preload(store: &mut DocumentStore, root: &Path, config: &Config) -> Result<usize> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Root directory does not exist: {}", root.display()))?;
    let mut opened = 0;

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        let uri = format!("file://{}", path.display());
        if !entry.file_type().is_file() || !config.accepts(&uri) {
            continue;
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        store.open(&uri, text);
        opened += 1;
    }
    Ok(opened)
}
