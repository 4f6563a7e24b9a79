//! # labconsole
//!
//! Interactive console automation engine for hardware test labs.
//!
//! labconsole talks to embedded targets that expose only an unstructured,
//! line-oriented text stream — a serial port, an SSH pipe, a spawned
//! shell — and reliably answers the two questions every board-farm
//! component keeps asking: *has the device produced the output I expect,
//! within a deadline?* and *has the device stopped producing output?*
//!
//! ## Layers
//!
//! - [`transport`]: byte channels — a spawned process's stdio, or a raw
//!   file descriptor the caller already opened.
//! - [`engine`]: the transport automaton owning the reception buffer, the
//!   raw tee log, and the core expect primitive
//!   [`wait_for_match`](engine::ConsoleEngine::wait_for_match).
//! - [`console`]: the façade — quiet-period detection, command/response
//!   round-trips, the login handshake, JSON extraction, prompt waiting.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use labconsole::{Console, Credentials, SystemContext, TransportSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), labconsole::Error> {
//!     let context = SystemContext::new(Credentials::new("root", "secret"))
//!         .with_prompt_pattern(r"# $");
//!     let mut console = Console::new(TransportSpec::fd(3), context);
//!
//!     console.login(&Default::default()).await?;
//!     console.wait_for_prompt(Some(Duration::from_secs(10))).await?;
//!
//!     let (output, matched) = console
//!         .send_and_expect("reboot", &["Restarting system"], &["Kernel panic"], None, true)
//!         .await?;
//!     println!("{output} (matched: {matched:?})");
//!
//!     console.close().await;
//!     Ok(())
//! }
//! ```
//!
//! Every operation is bounded by an explicit timeout; there is no
//! background task or event loop inside the crate. A console instance is
//! `&mut self` throughout — one caller at a time, enforced by the borrow
//! checker.

pub mod console;
pub mod engine;
pub mod error;
pub mod transport;

// Re-export main types for convenience
pub use console::{Console, ConsoleBuilder, ConsoleConfig, Credentials, LoginSequence, SystemContext};
pub use engine::{ConsoleEngine, ConsolePattern, EngineConfig, MatchResult};
pub use error::{ConsoleError, EngineError, Error, Result, TransportError};
pub use transport::{FdTransport, ProcessSpec, ProcessTransport, TransportSpec};
