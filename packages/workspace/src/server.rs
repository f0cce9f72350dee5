//! Newline-delimited JSON over a Unix socket
//!
//! One task per connection. Within a connection, each line is validated,
//! dispatched and answered before the next line is read.

use crate::handlers::Handlers;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Socket path for `name`
///
/// `$XDG_RUNTIME_DIR/<name>.sock` when the runtime dir is set, otherwise
/// `/tmp/<name>-$USER/lsp.sock`.
pub fn resolve_socket_path(name: &str) -> PathBuf {
    socket_path_from(
        name,
        std::env::var("XDG_RUNTIME_DIR").ok().as_deref(),
        std::env::var("USER").ok().as_deref(),
    )
}

fn socket_path_from(name: &str, runtime_dir: Option<&str>, user: Option<&str>) -> PathBuf {
    match runtime_dir.filter(|dir| !dir.is_empty()) {
        Some(dir) => Path::new(dir).join(format!("{}.sock", name)),
        None => {
            let user = user.unwrap_or("unknown");
            PathBuf::from("/tmp")
                .join(format!("{}-{}", name, user))
                .join("lsp.sock")
        }
    }
}

pub enum BindOutcome {
    Bound(UnixListener),
    /// Another live server owns the socket
    NotOwner,
}

/// Bind `path` unless a live server already listens there
///
/// An existing socket that refuses the connection or does not answer within
/// `probe_timeout` is stale: it is removed and the path rebound.
pub async fn bind_first_server(path: &Path, probe_timeout: Duration) -> io::Result<BindOutcome> {
    if path.exists() {
        match tokio::time::timeout(probe_timeout, UnixStream::connect(path)).await {
            Ok(Ok(_)) => {
                tracing::info!("[Server] {} is owned by a live server", path.display());
                return Ok(BindOutcome::NotOwner);
            }
            Ok(Err(_)) | Err(_) => {
                tracing::warn!("[Server] removing stale socket {}", path.display());
                std::fs::remove_file(path)?;
            }
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(path)?;
    tracing::info!("[Server] listening on {}", path.display());
    Ok(BindOutcome::Bound(listener))
}

/// Accept connections until the listener fails
pub async fn serve(listener: UnixListener, handlers: Handlers) -> io::Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        let handlers = handlers.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, handlers).await {
                tracing::warn!("[Server] connection closed with error: {}", e);
            }
        });
    }
}

/// Answer requests on one connection, strictly in order
pub async fn handle_connection(stream: UnixStream, handlers: Handlers) -> io::Result<()> {
    tracing::debug!("[Server] client connected");
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handlers.handle_line(&line);
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        writer.write_all(&payload).await?;
        writer.flush().await?;
    }

    tracing::debug!("[Server] client disconnected");
    Ok(())
}
