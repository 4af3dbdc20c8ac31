use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, lookup_host};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::Handler;
use crate::http::connection::ReadLimits;
use crate::server::ServerStats;
use crate::server::pool::{Job, WorkerPool};

pub const LISTEN_BACKLOG: u32 = 128;

/// Pause after a failed accept, so running out of file descriptors does
/// not turn the loop into a spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// A bound listening socket plus everything needed to serve it.
pub struct Server<H> {
    listener: TcpListener,
    config: ServerConfig,
    handler: Arc<H>,
    stats: Arc<ServerStats>,
}

impl<H: Handler> Server<H> {
    /// Binds `config.listen_addr` with address reuse and a backlog of 128.
    pub async fn bind(config: ServerConfig, handler: H) -> Result<Self, ServerError> {
        let listener = bind_listener(&config.listen_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.listen_addr.clone(),
                source,
            })?;

        if let Ok(addr) = listener.local_addr() {
            info!(%addr, workers = config.workers, "listening");
        }

        Ok(Self {
            listener,
            config,
            handler: Arc::new(handler),
            stats: Arc::new(ServerStats::default()),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until `shutdown` is cancelled, then drains the
    /// worker pool and releases the socket.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ServerError> {
        let Server {
            listener,
            config,
            handler,
            stats,
        } = self;

        let pool = WorkerPool::start(
            config.workers,
            config.queue_capacity,
            ReadLimits::from_config(&config),
            handler,
            Arc::clone(&stats),
            shutdown.clone(),
        );

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                res = listener.accept() => res,
            };

            let (stream, peer) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %ServerError::Accept(e), "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                debug!(%peer, error = %e, "failed to set TCP_NODELAY");
            }

            let id = stats.accepted.fetch_add(1, Ordering::Relaxed);
            info!(%peer, conn = id, "connection accepted");

            let job = Job { stream, peer, id };
            tokio::select! {
                _ = shutdown.cancelled() => break,
                res = pool.enqueue(job) => {
                    if res.is_err() {
                        error!("worker pool is gone, stopping listener");
                        break;
                    }
                }
            }
        }

        info!("shutting down, draining in-flight connections");
        pool.shutdown(config.drain_timeout()).await;
        drop(listener);

        let (accepted, served, rejected) = stats.snapshot();
        info!(accepted, served, rejected, "server stopped");
        Ok(())
    }
}

/// Binds the first resolved address that accepts a bind.
async fn bind_listener(addr: &str) -> io::Result<TcpListener> {
    let mut last_err = None;

    for addr in lookup_host(addr).await? {
        match bind_addr(addr) {
            Ok(listener) => return Ok(listener),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
    }))
}

fn bind_addr(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}
