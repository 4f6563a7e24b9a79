//! Raw tee log for post-mortem diagnosis.
//!
//! Every byte sent and received goes to an append-mode file alongside the
//! session. The format is plain passthrough: nothing else in the system
//! parses it, humans read it when a board misbehaves. Append mode means
//! multiple open/close generations of the same console accumulate history
//! in one file instead of overwriting it.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::error::EngineError;

/// Append-mode tee of all bytes crossing the transport.
#[derive(Debug)]
pub struct RawLog {
    file: File,
    path: PathBuf,
}

impl RawLog {
    /// Open (creating parent directories as needed) the log at `path`.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let log_err = |source| EngineError::RawLog {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(log_err)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(log_err)?;

        debug!("raw log: {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Default path: console name plus open timestamp, under the system
    /// temp directory.
    pub fn default_path(name: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("labconsole/{name}-{ts}.raw"))
    }

    /// Where this log writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tee bytes into the log. A failing tee must not kill the session,
    /// so write errors are only warned about.
    pub fn record(&mut self, bytes: &[u8]) {
        if let Err(e) = self.file.write_all(bytes).and_then(|()| self.file.flush()) {
            warn!("raw log write failed at {}: {e}", self.path.display());
        }
    }
}
