//! Login handshake configuration.
//!
//! The handshake itself runs in [`Console::login`](super::Console::login);
//! this module defines which prompts it recognizes and compiles them into
//! an insertion-ordered role set.

use std::time::Duration;

use indexmap::IndexMap;

use crate::engine::ConsolePattern;
use crate::error::EngineError;

/// Which prompt a pattern recognizes during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum LoginRole {
    Username,
    Password,
    Success,
}

/// Patterns driving the login handshake.
///
/// `success_match` is optional: without it, running out of prompts after
/// credentials were sent counts as success; with it, the handshake only
/// succeeds once it matches.
#[derive(Debug, Clone)]
pub struct LoginSequence {
    /// Pattern recognizing the username prompt.
    pub username_match: String,

    /// Pattern recognizing the password prompt.
    pub password_match: String,

    /// Pattern confirming a completed login, if the target prints one.
    pub success_match: Option<String>,

    /// Per-step timeout override; falls back to the console default.
    pub timeout: Option<Duration>,
}

impl Default for LoginSequence {
    fn default() -> Self {
        Self {
            username_match: "login:".to_string(),
            password_match: "Password:".to_string(),
            success_match: None,
            timeout: None,
        }
    }
}

impl LoginSequence {
    /// Sequence with the stock `login:` / `Password:` prompts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the username prompt pattern.
    pub fn username_match(mut self, pattern: impl Into<String>) -> Self {
        self.username_match = pattern.into();
        self
    }

    /// Set the password prompt pattern.
    pub fn password_match(mut self, pattern: impl Into<String>) -> Self {
        self.password_match = pattern.into();
        self
    }

    /// Require this pattern before the handshake is considered complete.
    pub fn success_match(mut self, pattern: impl Into<String>) -> Self {
        self.success_match = Some(pattern.into());
        self
    }

    /// Override the per-step timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Compile the role set, preserving username → password → success
    /// order for first-pattern-first-match semantics.
    pub(crate) fn compiled(&self) -> Result<IndexMap<LoginRole, ConsolePattern>, EngineError> {
        let mut roles = IndexMap::new();
        roles.insert(
            LoginRole::Username,
            ConsolePattern::compile(&self.username_match)?,
        );
        roles.insert(
            LoginRole::Password,
            ConsolePattern::compile(&self.password_match)?,
        );
        if let Some(success) = &self.success_match {
            roles.insert(LoginRole::Success, ConsolePattern::compile(success)?);
        }
        Ok(roles)
    }

    /// Pattern sources, for error context.
    pub(crate) fn pattern_sources(&self) -> Vec<String> {
        let mut sources = vec![self.username_match.clone(), self.password_match.clone()];
        if let Some(success) = &self.success_match {
            sources.push(success.clone());
        }
        sources
    }
}
