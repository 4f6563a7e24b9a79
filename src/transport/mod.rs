//! Byte-level transports underlying a console.
//!
//! A transport is the channel a console talks through: either the stdio of
//! a process spawned by the engine, or a raw file descriptor (serial port,
//! SSH pipe) that the caller already opened and keeps ownership of.

mod fd;
mod process;

#[cfg(test)]
pub(crate) mod mock;

pub use fd::FdTransport;
pub use process::ProcessSpec;
pub use process::ProcessTransport;

use std::io;
use std::os::fd::RawFd;

use async_trait::async_trait;

use crate::error::TransportError;

/// Which transport `open()` should establish.
///
/// Exactly one form exists by construction; the "both or neither supplied"
/// failure mode of looser APIs cannot be expressed.
#[derive(Debug, Clone)]
pub enum TransportSpec {
    /// Spawn a child process and talk to its stdio.
    Process(ProcessSpec),

    /// Poll a file descriptor owned by the caller.
    ///
    /// The engine works on a private duplicate; closing the console never
    /// closes the caller's descriptor.
    Fd(RawFd),
}

impl TransportSpec {
    /// Spec for a spawned-process transport.
    pub fn process(program: impl Into<String>) -> Self {
        Self::Process(ProcessSpec::new(program))
    }

    /// Spec for a caller-owned file descriptor.
    pub fn fd(fd: RawFd) -> Self {
        Self::Fd(fd)
    }

    /// Establish the transport this spec describes.
    pub(crate) fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        match self {
            Self::Process(spec) => Ok(Box::new(ProcessTransport::spawn(spec)?)),
            Self::Fd(fd) => Ok(Box::new(FdTransport::from_raw_fd(*fd)?)),
        }
    }

    /// Short human-readable description for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Process(spec) => format!("process '{}'", spec.command_line()),
            Self::Fd(fd) => format!("fd {fd}"),
        }
    }
}

/// Trait for console transports.
///
/// Implementations deliver bytes asynchronously and in arbitrary chunk
/// sizes; framing and pattern recognition live above, in the engine.
#[async_trait]
pub trait Transport: Send {
    /// Read the next chunk of bytes into `buf`.
    ///
    /// Awaits until at least one byte is available. Returns `Ok(0)` at
    /// end-of-stream. Callers bound the wait with their own timeout.
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `data` to the transport.
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Whether the transport is still live.
    ///
    /// Derived from the underlying resource (child running, fd pollable),
    /// not a cached flag, so unexpected death is observed on the next call.
    fn is_alive(&mut self) -> bool;

    /// Release the transport.
    ///
    /// Process transports interrupt the child first; fd transports simply
    /// stop polling their private duplicate.
    async fn shutdown(&mut self);
}
