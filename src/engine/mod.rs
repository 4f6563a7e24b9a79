//! Console engine: the transport automaton.
//!
//! Owns exactly one transport and one reception buffer, and provides the
//! blocking primitives everything else is built from: raw send, buffered
//! read, and `wait_for_match` — expect-with-timeout over a set of
//! patterns evaluated against the accumulating buffer.

mod buffer;
mod patterns;
mod rawlog;

pub use buffer::ReceptionBuffer;
pub use patterns::{ConsolePattern, MatchResult, compile_patterns};
pub use rawlog::RawLog;

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::time::Instant;

use crate::error::{EngineError, Result, TransportError};
use crate::transport::{Transport, TransportSpec};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Console name, used for the default raw-log path.
    pub name: String,

    /// Separator appended by `send_line` (default `"\n"`).
    pub line_separator: String,

    /// Tick of the expect loop: how long one transport read waits before
    /// patterns are re-evaluated against the buffer.
    pub poll_interval: Duration,

    /// Per-read timeout of the best-effort drain loop in `read_all`.
    pub read_timeout: Duration,

    /// Transport read chunk size.
    pub chunk_size: usize,

    /// Raw tee log path; `None` derives one from the console name and the
    /// timestamp of the first open.
    pub log_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "console".to_string(),
            line_separator: "\n".to_string(),
            poll_interval: Duration::from_millis(20),
            read_timeout: Duration::from_millis(50),
            chunk_size: 4096,
            log_path: None,
        }
    }
}

/// Transport-agnostic console automaton.
///
/// Lifecycle is Closed → Open → Closed; `close()` releases the transport
/// and a later `open()` establishes a fresh one (nothing resumes). All
/// methods take `&mut self`: one console is driven by one caller at a
/// time, by construction.
pub struct ConsoleEngine {
    config: EngineConfig,
    transport: Option<Box<dyn Transport>>,
    buffer: ReceptionBuffer,
    raw_log: Option<RawLog>,
    /// Resolved once so every open generation appends to the same file.
    log_path: Option<PathBuf>,
}

impl ConsoleEngine {
    /// Create a closed engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            transport: None,
            buffer: ReceptionBuffer::new(),
            raw_log: None,
            log_path: None,
        }
    }

    /// Create a closed engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Establish the transport described by `spec` and start the raw log.
    ///
    /// No-op when already open. Any establishment failure — spawn error,
    /// fd not pollable, transport not alive right after setup — surfaces
    /// as [`EngineError::CannotOpen`].
    pub async fn open(&mut self, spec: &TransportSpec) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let transport = spec.connect().map_err(|e| EngineError::CannotOpen {
            reason: format!("{}: {e}", spec.describe()),
        })?;

        debug!("open: {}", spec.describe());
        self.finish_open(transport, &spec.describe())
    }

    /// Liveness check plus raw-log setup, shared by `open` and tests.
    fn finish_open(&mut self, mut transport: Box<dyn Transport>, what: &str) -> Result<()> {
        if !transport.is_alive() {
            return Err(EngineError::CannotOpen {
                reason: format!("{what}: transport died during setup"),
            }
            .into());
        }

        let path = match &self.log_path {
            Some(path) => path.clone(),
            None => {
                let path = self
                    .config
                    .log_path
                    .clone()
                    .unwrap_or_else(|| RawLog::default_path(&self.config.name));
                self.log_path = Some(path.clone());
                path
            }
        };
        let raw_log = RawLog::open(&path).map_err(|e| EngineError::CannotOpen {
            reason: format!("{what}: {e}"),
        })?;

        self.transport = Some(transport);
        self.raw_log = Some(raw_log);
        Ok(())
    }

    /// Attach an already-established transport, for tests.
    #[cfg(test)]
    pub(crate) fn open_with(&mut self, transport: Box<dyn Transport>) -> Result<()> {
        self.finish_open(transport, "test transport")
    }

    /// Release the transport and close the raw log. Idempotent.
    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            debug!("close: {}", self.config.name);
            transport.shutdown().await;
        }
        self.raw_log = None;
    }

    /// Whether the console is open, derived from transport liveness (a
    /// transport that died unexpectedly reads as closed here).
    pub fn is_open(&mut self) -> bool {
        self.transport.as_mut().is_some_and(|t| t.is_alive())
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current reception buffer size in bytes.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Send raw text to the transport.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        self.send_bytes(text.as_bytes()).await
    }

    /// Send text followed by the configured line separator.
    pub async fn send_line(&mut self, text: &str) -> Result<()> {
        let line = format!("{text}{}", self.config.line_separator);
        self.send_bytes(line.as_bytes()).await
    }

    /// Send a control character: `A`..`Z` (case-insensitive) map to
    /// 0x01..0x1A. Anything else is an argument error, raised before the
    /// transport is touched.
    pub async fn send_control(&mut self, c: char) -> Result<()> {
        if !c.is_ascii_alphabetic() {
            return Err(EngineError::InvalidControlChar(c).into());
        }
        let byte = c.to_ascii_uppercase() as u8 - b'A' + 1;
        self.send_bytes(&[byte]).await
    }

    async fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(log) = self.raw_log.as_mut() {
            log.record(bytes);
        }
        let transport = self.transport.as_mut().ok_or(EngineError::NotOpen)?;
        trace!("send {} bytes", bytes.len());
        transport
            .write_all(bytes)
            .await
            .map_err(TransportError::Io)?;
        Ok(())
    }

    /// Append received bytes to the buffer and tee them to the raw log.
    fn append_received(&mut self, bytes: &[u8]) {
        trace!("recv {} bytes", bytes.len());
        self.buffer.extend(bytes);
        if let Some(log) = self.raw_log.as_mut() {
            log.record(bytes);
        }
    }

    /// Best-effort non-blocking drain: pull whatever the transport has
    /// ready into the buffer. Bounded by the configured read timeout as a
    /// whole, so a continuously chatty device cannot pin the caller here.
    /// Returns the number of bytes appended.
    pub async fn pump_available(&mut self) -> Result<usize> {
        let deadline = Instant::now() + self.config.read_timeout;
        let mut chunk = vec![0u8; self.config.chunk_size];
        let mut total = 0;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let read = {
                let transport = self.transport.as_mut().ok_or(EngineError::NotOpen)?;
                tokio::time::timeout(deadline - now, transport.read_chunk(&mut chunk)).await
            };
            match read {
                Ok(Ok(0)) => break, // end of stream
                Ok(Ok(n)) => {
                    self.append_received(&chunk[..n]);
                    total += n;
                }
                Ok(Err(e)) => return Err(TransportError::Io(e).into()),
                Err(_elapsed) => break, // nothing ready right now
            }
        }
        Ok(total)
    }

    /// Drain all currently available bytes into the buffer, then either
    /// peek the whole buffer (`preserve = true`) or return it while
    /// clearing it.
    pub async fn read_all(&mut self, preserve_read_buffer: bool) -> Result<String> {
        self.pump_available().await?;
        if preserve_read_buffer {
            Ok(self.buffer.peek().into_owned())
        } else {
            Ok(self.buffer.drain())
        }
    }

    /// Block until one of `patterns` matches, the transport reaches
    /// end-of-stream, or `timeout` elapses.
    ///
    /// Matching is first-pattern-first-match in supplied order, evaluated
    /// against the accumulating buffer, so a pattern can match output
    /// produced partway through the wait. On a match the buffer is
    /// consumed through the end of the matched text and the remainder
    /// stays buffered; on timeout or EOF everything seen is drained into
    /// the result.
    pub async fn wait_for_match(
        &mut self,
        patterns: &[ConsolePattern],
        timeout: Duration,
    ) -> Result<MatchResult> {
        let deadline = Instant::now() + timeout;
        let mut chunk = vec![0u8; self.config.chunk_size];

        loop {
            if let Some((idx, start, end)) = patterns::first_match(patterns, self.buffer.as_slice())
            {
                let text_matched =
                    String::from_utf8_lossy(&self.buffer.as_slice()[start..end]).into_owned();
                let text_received = self.buffer.consume_to(end);
                debug!("matched pattern {:?}", patterns[idx].source());
                return Ok(MatchResult::matched(
                    &patterns[idx],
                    text_matched,
                    text_received,
                ));
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("wait_for_match: timeout after {timeout:?}");
                return Ok(MatchResult::unmatched(self.buffer.drain()));
            }
            let step = self.config.poll_interval.min(deadline - now);

            let read = {
                let transport = self.transport.as_mut().ok_or(EngineError::NotOpen)?;
                tokio::time::timeout(step, transport.read_chunk(&mut chunk)).await
            };
            match read {
                Ok(Ok(0)) => {
                    // Buffer unchanged since the check above, so nothing
                    // new can match.
                    debug!("wait_for_match: end of stream");
                    return Ok(MatchResult::unmatched(self.buffer.drain()));
                }
                Ok(Ok(n)) => self.append_received(&chunk[..n]),
                Ok(Err(e)) => return Err(TransportError::Io(e).into()),
                Err(_elapsed) => {} // tick over and re-check the deadline
            }
        }
    }

    /// Hand the transport to the caller for live bidirectional use.
    ///
    /// Bytes flowing both ways are still teed to the raw log, and received
    /// bytes land in the reception buffer, so engine state stays
    /// consistent afterward. Returns when either side reaches EOF.
    pub async fn interact(&mut self) -> Result<()> {
        let mut transport = self.transport.take().ok_or(EngineError::NotOpen)?;
        let result = self.interact_loop(transport.as_mut()).await;
        self.transport = Some(transport);
        result
    }

    async fn interact_loop(&mut self, transport: &mut (dyn Transport + '_)) -> Result<()> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        enum Side {
            Device(usize),
            User(usize),
            Eof,
        }

        let mut stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut from_device = vec![0u8; self.config.chunk_size];
        let mut from_user = vec![0u8; self.config.chunk_size];

        loop {
            let side = tokio::select! {
                r = transport.read_chunk(&mut from_device) => match r.map_err(TransportError::Io)? {
                    0 => Side::Eof,
                    n => Side::Device(n),
                },
                r = stdin.read(&mut from_user) => match r.map_err(TransportError::Io)? {
                    0 => Side::Eof,
                    n => Side::User(n),
                },
            };

            match side {
                Side::Eof => break,
                Side::Device(n) => {
                    stdout
                        .write_all(&from_device[..n])
                        .await
                        .map_err(TransportError::Io)?;
                    stdout.flush().await.map_err(TransportError::Io)?;
                    self.append_received(&from_device[..n]);
                }
                Side::User(n) => {
                    if let Some(log) = self.raw_log.as_mut() {
                        log.record(&from_user[..n]);
                    }
                    transport
                        .write_all(&from_user[..n])
                        .await
                        .map_err(TransportError::Io)?;
                }
            }
        }
        Ok(())
    }
}

impl Drop for ConsoleEngine {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!(
                "console '{}' dropped while open; transport released without close()",
                self.config.name
            );
        }
    }
}
