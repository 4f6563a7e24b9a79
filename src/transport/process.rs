//! Spawned-process transport.
//!
//! Runs a child with piped stdio and merges stdout/stderr into a single
//! received-byte stream, the way an interactive console presents them.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use super::Transport;
use crate::error::TransportError;

/// How long `shutdown()` waits after SIGINT before force-killing.
const INTERRUPT_GRACE: Duration = Duration::from_millis(500);

/// Command line for a spawned-process transport.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    /// Program to execute.
    pub program: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl ProcessSpec {
    /// Create a spec for the given program with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The full command line as one string, for logs and errors.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Transport over a spawned child process's stdio.
#[derive(Debug)]
pub struct ProcessTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    stderr: ChildStderr,
    stdout_eof: bool,
    stderr_eof: bool,
}

impl ProcessTransport {
    /// Spawn the child and wire up its stdio pipes.
    pub fn spawn(spec: &ProcessSpec) -> Result<Self, TransportError> {
        let spawn_err = |source| TransportError::SpawnFailed {
            command: spec.command_line(),
            source,
        };

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_err(io::Error::other("no stdin pipe")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_err(io::Error::other("no stdout pipe")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_err(io::Error::other("no stderr pipe")))?;

        debug!("spawned '{}' (pid {:?})", spec.command_line(), child.id());

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            stdout_eof: false,
            stderr_eof: false,
        })
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // End-of-stream only once both pipes are exhausted.
        loop {
            if self.stdout_eof && self.stderr_eof {
                return Ok(0);
            }

            if self.stderr_eof {
                match self.stdout.read(buf).await? {
                    0 => self.stdout_eof = true,
                    n => return Ok(n),
                }
                continue;
            }

            if self.stdout_eof {
                match self.stderr.read(buf).await? {
                    0 => self.stderr_eof = true,
                    n => return Ok(n),
                }
                continue;
            }

            // Both pipes live: take whichever produces data first. The reads
            // are cancel-safe (unconsumed bytes stay in the pipe).
            let mut tmp = [0u8; 4096];
            let cap = buf.len().min(tmp.len());
            tokio::select! {
                r = self.stdout.read(buf) => match r? {
                    0 => self.stdout_eof = true,
                    n => return Ok(n),
                },
                r = self.stderr.read(&mut tmp[..cap]) => match r? {
                    0 => self.stderr_eof = true,
                    n => {
                        buf[..n].copy_from_slice(&tmp[..n]);
                        return Ok(n);
                    }
                },
            }
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stdin.write_all(data).await?;
        self.stdin.flush().await
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn shutdown(&mut self) {
        // Interrupt first so shells and interpreters can clean up.
        if let Some(pid) = self.child.id() {
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGINT);
            }
        }

        if tokio::time::timeout(INTERRUPT_GRACE, self.child.wait())
            .await
            .is_err()
        {
            warn!("child ignored SIGINT, killing");
            let _ = self.child.start_kill();
            let _ = self.child.wait().await;
        }
    }
}
