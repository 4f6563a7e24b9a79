//! Caller-owned configuration the façade reads during login and
//! prompt-wait operations.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Credentials for the login handshake.
///
/// The password is held behind [`SecretString`] so it never shows up in
/// `Debug` output or error messages.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Account name sent at the username prompt.
    pub login: String,

    /// Password sent at the password prompt; `None` for passwordless
    /// targets.
    pub password: Option<SecretString>,
}

impl Credentials {
    /// Credentials with a password.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: Some(SecretString::from(password.into())),
        }
    }

    /// Credentials for a passwordless account.
    pub fn passwordless(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: None,
        }
    }

    /// The password value, for the one place that actually sends it.
    pub(crate) fn expose_password(&self) -> Option<&str> {
        self.password.as_ref().map(ExposeSecret::expose_secret)
    }
}

/// Per-target context passed to the façade at construction.
///
/// Owned by the caller (typically the board under test), borrowed by the
/// console, never mutated by it.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemContext {
    /// Login credentials for this target.
    pub credentials: Credentials,

    /// Regex recognizing the target's shell prompt, if known.
    pub prompt_pattern: Option<String>,
}

impl SystemContext {
    /// Context with credentials and no prompt pattern.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            prompt_pattern: None,
        }
    }

    /// Set the prompt pattern.
    pub fn with_prompt_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.prompt_pattern = Some(pattern.into());
        self
    }
}
