//! Fixed-size worker pool fed by a bounded queue.
//!
//! The listener pushes accepted connections into an `mpsc` channel of
//! capacity `queue_capacity`; a full queue makes `enqueue` wait, and the
//! kernel accept backlog absorbs the rest. Workers share the receiving half
//! and each serves one connection at a time.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ServerError;
use crate::handler::Handler;
use crate::http::connection::{Connection, ReadLimits, ReadOutcome};
use crate::http::response::Response;
use crate::server::ServerStats;

/// An accepted connection waiting for a worker.
#[derive(Debug)]
pub struct Job {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub id: u64,
}

pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    abort: CancellationToken,
}

impl WorkerPool {
    /// Spawns `workers` workers. They stop dequeuing once `shutdown` is
    /// cancelled.
    pub fn start<H: Handler>(
        workers: usize,
        queue_capacity: usize,
        limits: ReadLimits,
        handler: Arc<H>,
        stats: Arc<ServerStats>,
        shutdown: CancellationToken,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let abort = CancellationToken::new();

        let workers = (0..workers.max(1))
            .map(|worker| {
                let worker = Worker {
                    id: worker,
                    queue: Arc::clone(&receiver),
                    handler: Arc::clone(&handler),
                    stats: Arc::clone(&stats),
                    limits,
                    shutdown: shutdown.clone(),
                    abort: abort.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        Self {
            sender,
            workers,
            abort,
        }
    }

    /// Queues a connection, waiting while the queue is full. Fails only if
    /// every worker is gone; the job is handed back.
    pub async fn enqueue(&self, job: Job) -> Result<(), Job> {
        self.sender.send(job).await.map_err(|e| e.0)
    }

    /// Waits up to `drain` for workers to finish in-flight connections,
    /// then aborts whatever is still running and joins every worker.
    ///
    /// Connections still queued are closed without a response.
    pub async fn shutdown(self, drain: Duration) {
        let WorkerPool {
            sender,
            mut workers,
            abort,
        } = self;
        drop(sender);

        let deadline = Instant::now() + drain;
        let mut pending = Vec::new();
        for mut handle in workers.drain(..) {
            if timeout_at(deadline, &mut handle).await.is_err() {
                pending.push(handle);
            }
        }

        if !pending.is_empty() {
            warn!(workers = pending.len(), "drain deadline passed, aborting in-flight connections");
            abort.cancel();
            for handle in pending {
                let _ = handle.await;
            }
        }
    }
}

struct Worker<H> {
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Job>>>,
    handler: Arc<H>,
    stats: Arc<ServerStats>,
    limits: ReadLimits,
    shutdown: CancellationToken,
    abort: CancellationToken,
}

impl<H: Handler> Worker<H> {
    async fn run(self) {
        debug!(worker = self.id, "worker started");

        while let Some(job) = self.next_job().await {
            let peer = job.peer;
            let conn = job.id;

            // a panic while serving surfaces as a JoinError instead of
            // unwinding through the worker
            let mut task = tokio::spawn(serve(
                job,
                Arc::clone(&self.handler),
                Arc::clone(&self.stats),
                self.limits,
            ));

            tokio::select! {
                res = &mut task => match res {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(%peer, conn, error = %e, "connection failed"),
                    Err(e) => error!(%peer, conn, error = %e, "connection task panicked"),
                },
                _ = self.abort.cancelled() => {
                    task.abort();
                    warn!(%peer, conn, "aborted in-flight connection");
                    break;
                }
            }
        }

        debug!(worker = self.id, "worker stopped");
    }

    async fn next_job(&self) -> Option<Job> {
        let mut queue = self.queue.lock().await;
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            job = queue.recv() => job,
        }
    }
}

/// Reads one request, answers it, and closes the connection.
async fn serve<H: Handler>(
    job: Job,
    handler: Arc<H>,
    stats: Arc<ServerStats>,
    limits: ReadLimits,
) -> Result<(), ServerError> {
    let Job { stream, peer, id } = job;
    let mut conn = Connection::new(stream, limits);

    let outcome = conn.read_request().await;
    let response = match outcome {
        ReadOutcome::Complete(request) => {
            info!(%peer, conn = id, method = %request.method, path = %request.path, "request parsed");
            handler.handle(&request.method, &request.path).await
        }
        ReadOutcome::Reset(e) => {
            debug!(%peer, conn = id, error = %e, "read failed, closing");
            return Ok(());
        }
        _ if conn.bytes_received() == 0 => {
            debug!(%peer, conn = id, "peer sent nothing, closing");
            return Ok(());
        }
        ReadOutcome::Malformed(e) => {
            warn!(%peer, conn = id, error = %e, "malformed request");
            stats.rejected.fetch_add(1, Ordering::Relaxed);
            Response::bad_request()
        }
        ReadOutcome::TimedOut => {
            warn!(%peer, conn = id, received = conn.bytes_received(), "request timed out");
            stats.rejected.fetch_add(1, Ordering::Relaxed);
            Response::bad_request()
        }
    };

    let bytes = conn.respond(&response).await.map_err(ServerError::Write)?;
    stats.served.fetch_add(1, Ordering::Relaxed);
    info!(
        %peer,
        conn = id,
        status = response.status.as_u16(),
        bytes,
        "response sent"
    );

    Ok(())
}
