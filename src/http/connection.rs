use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};

use crate::config::ServerConfig;
use crate::http::headers::{HeaderState, Progress};
use crate::http::parser::{ParseError, parse_request_line};
use crate::http::request::ParsedRequest;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// Upper bound on a single read.
pub const READ_CHUNK: usize = 2048;

/// Per-connection read bounds.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    pub idle_timeout: Duration,
    pub max_request_bytes: usize,
}

impl ReadLimits {
    pub fn from_config(cfg: &ServerConfig) -> Self {
        Self {
            idle_timeout: cfg.idle_timeout(),
            max_request_bytes: cfg.max_request_bytes,
        }
    }

    /// Absolute ceiling on reading one request, counted from its first byte.
    pub fn hard_timeout(&self) -> Duration {
        self.idle_timeout * 2
    }
}

/// Terminal state of [`Connection::read_request`].
#[derive(Debug)]
pub enum ReadOutcome {
    Complete(ParsedRequest),
    Malformed(ParseError),
    TimedOut,
    /// The read itself failed, e.g. the peer reset the connection.
    Reset(io::Error),
}

/// One accepted connection: reads a single request, writes a single
/// response.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    headers: HeaderState,
    limits: ReadLimits,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, limits: ReadLimits) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            headers: HeaderState::new(),
            limits,
        }
    }

    /// Reads until the request is complete, malformed or out of time.
    ///
    /// Every read is bounded by the idle timeout. Once the first byte has
    /// arrived, the request as a whole must also finish within the hard
    /// timeout, however steadily the peer trickles data.
    pub async fn read_request(&mut self) -> ReadOutcome {
        let mut chunk = [0u8; READ_CHUNK];
        let mut hard_deadline: Option<Instant> = None;

        loop {
            let now = Instant::now();
            if hard_deadline.is_some_and(|hard| now >= hard) {
                return ReadOutcome::TimedOut;
            }

            let idle_deadline = now + self.limits.idle_timeout;
            let deadline = hard_deadline.map_or(idle_deadline, |hard| hard.min(idle_deadline));

            let n = match timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return ReadOutcome::Reset(e),
                Err(_) => return ReadOutcome::TimedOut,
            };

            if n == 0 {
                return self.finish_at_eof();
            }

            if hard_deadline.is_none() {
                hard_deadline = Some(Instant::now() + self.limits.hard_timeout());
            }

            self.buffer.extend_from_slice(&chunk[..n]);
            if self.buffer.len() > self.limits.max_request_bytes {
                return ReadOutcome::Malformed(ParseError::TooLarge(self.limits.max_request_bytes));
            }

            match self.headers.update(&self.buffer) {
                Ok(Progress::Complete) => return self.complete(),
                Ok(Progress::NeedMore) => {}
                Err(e) => return ReadOutcome::Malformed(e),
            }

            // reject an oversize declared body without waiting for it
            if self
                .headers
                .expected_len()
                .is_some_and(|len| len > self.limits.max_request_bytes)
            {
                return ReadOutcome::Malformed(ParseError::TooLarge(self.limits.max_request_bytes));
            }
        }
    }

    /// Writes the response and shuts down the write half. Returns the
    /// number of bytes written.
    pub async fn respond(&mut self, response: &Response) -> io::Result<usize> {
        let mut writer = ResponseWriter::new(response);
        writer.write_to_stream(&mut self.stream).await?;

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(error = %e, "shutdown after response failed");
        }

        Ok(writer.len())
    }

    /// Bytes received so far. Zero means the peer never sent anything.
    pub fn bytes_received(&self) -> usize {
        self.buffer.len()
    }

    pub fn headers(&self) -> &HeaderState {
        &self.headers
    }

    fn finish_at_eof(&mut self) -> ReadOutcome {
        if self.buffer.is_empty() {
            return ReadOutcome::Malformed(ParseError::Empty);
        }

        match self.headers.finish(&self.buffer) {
            Ok(()) => self.complete(),
            Err(e) => ReadOutcome::Malformed(e),
        }
    }

    fn complete(&self) -> ReadOutcome {
        let line = self.headers.request_line().unwrap_or_default();
        match parse_request_line(line) {
            Ok(request) => ReadOutcome::Complete(request),
            Err(e) => ReadOutcome::Malformed(e),
        }
    }
}
