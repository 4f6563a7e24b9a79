//! File-descriptor transport.
//!
//! Wraps a descriptor the caller already opened (serial port, SSH pipe,
//! pty). The engine polls a private duplicate; the caller keeps ownership
//! of the original and is responsible for eventually closing it.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use async_trait::async_trait;
use log::{debug, trace};
use tokio::io::unix::AsyncFd;

use super::Transport;
use crate::error::TransportError;

/// Transport over a caller-owned file descriptor.
///
/// The duplicate shares the file description with the caller's descriptor,
/// so the non-blocking flag set here is visible on the original as well;
/// the caller's original flags are put back when the transport is released.
pub struct FdTransport {
    inner: AsyncFd<OwnedFd>,
    source_fd: RawFd,
    orig_flags: libc::c_int,
}

impl FdTransport {
    /// Duplicate `fd`, make it non-blocking, and register it for polling.
    ///
    /// Fails if the descriptor cannot be duplicated or is not pollable
    /// (e.g. a regular file).
    pub fn from_raw_fd(fd: RawFd) -> Result<Self, TransportError> {
        let setup_err = |source| TransportError::FdSetup { fd, source };

        let dup = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 0) };
        if dup < 0 {
            return Err(setup_err(io::Error::last_os_error()));
        }
        let owned = unsafe { OwnedFd::from_raw_fd(dup) };

        let flags = unsafe { libc::fcntl(dup, libc::F_GETFL) };
        if flags < 0 {
            return Err(setup_err(io::Error::last_os_error()));
        }
        if unsafe { libc::fcntl(dup, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
            return Err(setup_err(io::Error::last_os_error()));
        }

        let inner = match AsyncFd::new(owned) {
            Ok(inner) => inner,
            Err(source) => {
                // The dup is already gone, but O_NONBLOCK lives on the
                // shared description; put the caller's flags back.
                unsafe { libc::fcntl(fd, libc::F_SETFL, flags) };
                return Err(setup_err(source));
            }
        };
        debug!("fd transport: polling dup {dup} of fd {fd}");

        Ok(Self {
            inner,
            source_fd: fd,
            orig_flags: flags,
        })
    }

    /// The caller's descriptor this transport was built from.
    pub fn source_fd(&self) -> RawFd {
        self.source_fd
    }
}

#[async_trait]
impl Transport for FdTransport {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.inner.readable().await?;
            let result = guard.try_io(|inner| {
                let n = unsafe {
                    libc::read(
                        inner.as_raw_fd(),
                        buf.as_mut_ptr().cast::<libc::c_void>(),
                        buf.len(),
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            });
            match result {
                Ok(read) => return read,
                Err(_would_block) => continue,
            }
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut written = 0;
        while written < data.len() {
            let mut guard = self.inner.writable().await?;
            let result = guard.try_io(|inner| {
                let n = unsafe {
                    libc::write(
                        inner.as_raw_fd(),
                        data[written..].as_ptr().cast::<libc::c_void>(),
                        data.len() - written,
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            });
            match result {
                Ok(wrote) => written += wrote?,
                Err(_would_block) => continue,
            }
        }
        Ok(())
    }

    fn is_alive(&mut self) -> bool {
        // Zero-timeout poll: hangup, error, or an invalid descriptor all
        // count as dead.
        let mut pfd = libc::pollfd {
            fd: self.inner.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let ret = unsafe { libc::poll(&mut pfd, 1, 0) };
        if ret < 0 {
            return false;
        }
        pfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) == 0
    }

    async fn shutdown(&mut self) {
        // Dropping the AsyncFd closes our duplicate; the caller's
        // descriptor stays open and its flags are restored on drop.
        trace!("fd transport: releasing dup of fd {}", self.source_fd);
    }
}

impl Drop for FdTransport {
    fn drop(&mut self) {
        // O_NONBLOCK was set on the file description shared with the
        // caller's fd; restore the original flags before the dup closes.
        unsafe {
            libc::fcntl(self.inner.as_raw_fd(), libc::F_SETFL, self.orig_flags);
        }
    }
}
