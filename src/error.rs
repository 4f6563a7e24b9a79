//! Error types for labconsole.

use std::io;
use thiserror::Error;

/// Main error type for labconsole operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (process spawn, fd polling, raw I/O)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Engine-level errors (lifecycle, control characters, patterns)
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Console façade errors (login, expected output, JSON payloads)
    #[error("Console error: {0}")]
    Console(#[from] ConsoleError),
}

/// Transport layer errors (process and file-descriptor channels).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to spawn the child process
    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: io::Error,
    },

    /// File descriptor could not be duplicated or made pollable
    #[error("File descriptor {fd} is not usable: {source}")]
    FdSetup {
        fd: i32,
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Engine layer errors (lifecycle and the expect primitive).
#[derive(Error, Debug)]
pub enum EngineError {
    /// Transport could not be established by `open()`
    #[error("Cannot open console: {reason}")]
    CannotOpen { reason: String },

    /// Operation requires an open transport
    #[error("Console not open - call open() first")]
    NotOpen,

    /// `send_control` called with something outside `A`-`Z`
    #[error("Invalid control character {0:?} (expected A-Z)")]
    InvalidControlChar(char),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Raw tee log could not be created or written
    #[error("Raw log error at {path}: {source}")]
    RawLog {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Console façade errors (command/response semantics).
///
/// The password value is never formatted into any of these variants; error
/// context carries the username and the patterns that were attempted.
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Login handshake did not reach an accepted state
    #[error("Login failed for user '{user}': {reason} (patterns tried: {patterns:?})")]
    LoginFailed {
        user: String,
        reason: String,
        patterns: Vec<String>,
    },

    /// An explicitly disallowed pattern matched instead of an expected one
    #[error("Exception keyword received: pattern {pattern:?} matched")]
    ExceptionKeywordReceived { pattern: String, received: String },

    /// Expected JSON payload was absent or unparseable
    #[error("Invalid JSON received: {reason}")]
    InvalidJsonReceived { reason: String },

    /// Prompt pattern unset or never matched
    #[error("Prompt not reached: {reason}")]
    PromptNotReached { reason: String },
}

/// Result type alias using labconsole's Error.
pub type Result<T> = std::result::Result<T, Error>;
