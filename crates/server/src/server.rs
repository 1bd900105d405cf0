//! Listener lifecycle and the line-delimited JSON transport.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use cosmos_kernel::Universe;
use cosmos_nav::{Navigator, Reply};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::grpc::serve_grpc;
use crate::protocol::{MAX_LINE_LEN, Response};
use crate::session::run_line;

/// Port of the gRPC service unless configured otherwise.
pub const DEFAULT_PORT: u16 = 50051;

/// Port of the line-delimited JSON transport unless configured otherwise.
pub const DEFAULT_LINE_PORT: u16 = 50052;

/// Configuration for the navigation server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The host address to bind to.
    pub host: String,
    /// The gRPC port. Zero picks a free port.
    pub port: u16,
    /// The line-JSON port; `None` disables that transport.
    pub line_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: DEFAULT_PORT,
            line_port: Some(DEFAULT_LINE_PORT),
        }
    }
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Bind a listener on `host:port`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is malformed or in use.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Bind every configured transport and serve until `Ctrl-C`.
pub async fn start_server(
    config: &ServerConfig,
    universe: Arc<Universe>,
) -> Result<(), ServerError> {
    let grpc = bind(&config.host, config.port).await?;
    let line = match config.line_port {
        Some(port) => Some(bind(&config.host, port).await?),
        None => None,
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = stop_tx.send(true);
            }
            Err(e) => warn!(error = %e, "cannot listen for ctrl-c"),
        }
    });

    let grpc_task = serve_grpc(grpc, Arc::clone(&universe), stopped(stop_rx.clone()));
    let line_task = async move {
        match line {
            Some(listener) => serve(listener, universe, stopped(stop_rx)).await,
            None => Ok(()),
        }
    };
    tokio::try_join!(grpc_task, line_task)?;
    Ok(())
}

async fn stopped(mut rx: watch::Receiver<bool>) {
    // A dropped sender means no signal will ever arrive.
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Accept line-protocol connections on `listener` until `shutdown` resolves.
///
/// Each connection runs in its own task with its own navigator.
pub async fn serve<F>(
    listener: TcpListener,
    universe: Arc<Universe>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Serve(format!("local address: {e}")))?;
    info!(%addr, galaxies = universe.galaxies().len(), "line server listening");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("line server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "client connected");
                    let universe = Arc::clone(&universe);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, universe).await {
                            debug!(%peer, error = %e, "connection ended with error");
                        }
                        debug!(%peer, "client disconnected");
                    });
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
        }
    }
}

async fn handle_connection(stream: TcpStream, universe: Arc<Universe>) -> std::io::Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut navigator = Navigator::new(universe);
    let mut buf = Vec::with_capacity(256);
    // Room for the longest line plus "\r\n".
    let limit = (MAX_LINE_LEN + 2) as u64;

    loop {
        buf.clear();
        let n = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        let line = strip_newline(&buf);

        if line.len() > MAX_LINE_LEN {
            let msg = format!("line exceeds {MAX_LINE_LEN} bytes");
            send(&mut writer, &Response::error(msg, navigator.location())).await?;
            return writer.shutdown().await;
        }
        let Ok(line) = std::str::from_utf8(line) else {
            let response = Response::error("line is not valid UTF-8", navigator.location());
            send(&mut writer, &response).await?;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        let (nav, result) = run_line(navigator, line.to_owned())
            .await
            .map_err(std::io::Error::other)?;
        navigator = nav;
        let quit = matches!(result, Ok(Reply::Bye));
        send(&mut writer, &Response::from_result(result, navigator.location())).await?;
        if quit {
            return Ok(());
        }
    }
}

fn strip_newline(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

async fn send<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = response.to_line().map_err(std::io::Error::other)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.host, "127.0.0.1");
        assert_eq!(c.port, DEFAULT_PORT);
        assert_eq!(c.line_port, Some(DEFAULT_LINE_PORT));
    }

    #[test]
    fn strips_line_endings() {
        assert_eq!(strip_newline(b"ls\r\n"), b"ls");
        assert_eq!(strip_newline(b"ls\n"), b"ls");
        assert_eq!(strip_newline(b"ls"), b"ls");
    }

    #[tokio::test]
    async fn bind_rejects_bad_host() {
        assert!(matches!(
            bind("not an address", 0).await,
            Err(ServerError::Bind(_))
        ));
    }

    #[tokio::test]
    async fn stopped_resolves_on_signal() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(stopped(rx));
        tx.send(true).unwrap();
        waiter.await.unwrap();
    }
}
