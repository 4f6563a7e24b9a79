//! High-level console operations.
//!
//! The façade turns the engine's expect primitive into command/response
//! semantics: quiet-period detection, round-trips, the login handshake,
//! JSON extraction, and prompt waiting. Every operation opens the engine
//! on demand, so callers never manage the lifecycle explicitly.

mod context;
mod login;

pub use context::{Credentials, SystemContext};
pub use login::LoginSequence;

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, trace};
use serde_json::Value;
use tokio::time::Instant;

use crate::engine::{ConsoleEngine, ConsolePattern, EngineConfig, compile_patterns};
use crate::error::{ConsoleError, EngineError, Error, Result};
use crate::transport::TransportSpec;
use login::LoginRole;

/// Default timings for façade operations; any per-call `None` falls back
/// to these.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Overall deadline for blocking operations.
    pub timeout: Duration,

    /// Polling tick for the byte-count sampling loops.
    pub sleep_time: Duration,

    /// Quiet window treated as "the command finished printing".
    pub quiet_time: Duration,

    /// Quiet window applied before a JSON query.
    pub json_quiet: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            sleep_time: Duration::from_millis(100),
            quiet_time: Duration::from_millis(500),
            json_quiet: Duration::from_secs(1),
        }
    }
}

/// Builder for assembling a [`Console`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use labconsole::{Console, Credentials, ProcessSpec, SystemContext, TransportSpec};
///
/// let spec = TransportSpec::Process(ProcessSpec::new("picocom").args(["-b", "115200", "/dev/ttyUSB0"]));
/// let context = SystemContext::new(Credentials::new("root", "secret"))
///     .with_prompt_pattern(r"# $");
/// let console = Console::builder(spec, context)
///     .name("board-1")
///     .timeout(Duration::from_secs(60))
///     .build();
/// ```
pub struct ConsoleBuilder {
    spec: TransportSpec,
    context: SystemContext,
    config: ConsoleConfig,
    engine_config: EngineConfig,
}

impl ConsoleBuilder {
    /// Start a builder for the given transport and target context.
    pub fn new(spec: TransportSpec, context: SystemContext) -> Self {
        Self {
            spec,
            context,
            config: ConsoleConfig::default(),
            engine_config: EngineConfig::default(),
        }
    }

    /// Console name, used in logs and the default raw-log path.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.engine_config.name = name.into();
        self
    }

    /// Default operation timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Default polling tick.
    pub fn sleep_time(mut self, sleep_time: Duration) -> Self {
        self.config.sleep_time = sleep_time;
        self
    }

    /// Default quiet window.
    pub fn quiet_time(mut self, quiet_time: Duration) -> Self {
        self.config.quiet_time = quiet_time;
        self
    }

    /// Quiet window applied before JSON queries.
    pub fn json_quiet(mut self, json_quiet: Duration) -> Self {
        self.config.json_quiet = json_quiet;
        self
    }

    /// Line separator appended by newline-sending operations.
    pub fn line_separator(mut self, separator: impl Into<String>) -> Self {
        self.engine_config.line_separator = separator.into();
        self
    }

    /// Raw tee log path (default: derived from name + open timestamp).
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_config.log_path = Some(path.into());
        self
    }

    /// Tick of the engine's expect loop.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.engine_config.poll_interval = poll_interval;
        self
    }

    /// Build the console (still closed; it opens on first use).
    pub fn build(self) -> Console {
        Console {
            engine: ConsoleEngine::new(self.engine_config),
            spec: self.spec,
            context: self.context,
            config: self.config,
        }
    }
}

/// Console façade: one engine, one transport spec, one target context.
pub struct Console {
    engine: ConsoleEngine,
    spec: TransportSpec,
    context: SystemContext,
    config: ConsoleConfig,
}

impl Console {
    /// Console with default configuration.
    pub fn new(spec: TransportSpec, context: SystemContext) -> Self {
        Self::builder(spec, context).build()
    }

    /// Start a [`ConsoleBuilder`].
    pub fn builder(spec: TransportSpec, context: SystemContext) -> ConsoleBuilder {
        ConsoleBuilder::new(spec, context)
    }

    /// The target context this console was built with.
    pub fn context(&self) -> &SystemContext {
        &self.context
    }

    /// Direct access to the underlying engine.
    pub fn engine(&mut self) -> &mut ConsoleEngine {
        &mut self.engine
    }

    /// Open the engine if it is not already open, then fail with
    /// `CannotOpen` if it still is not. Every façade operation calls this
    /// first.
    pub async fn require_open(&mut self) -> Result<()> {
        if !self.engine.is_open() {
            debug!("require_open: opening {}", self.spec.describe());
            self.engine.open(&self.spec).await?;
        }
        if !self.engine.is_open() {
            return Err(EngineError::CannotOpen {
                reason: format!("{} not alive after open", self.spec.describe()),
            }
            .into());
        }
        Ok(())
    }

    /// Close the underlying engine. Idempotent.
    pub async fn close(&mut self) {
        self.engine.close().await;
    }

    /// Send `cmd`, with or without the line separator.
    pub async fn send(&mut self, cmd: &str, send_newline: bool) -> Result<()> {
        self.require_open().await?;
        if send_newline {
            self.engine.send_line(cmd).await
        } else {
            self.engine.send(cmd).await
        }
    }

    /// Drain or peek everything currently buffered.
    pub async fn read_all(&mut self, preserve_read_buffer: bool) -> Result<String> {
        self.require_open().await?;
        self.engine.read_all(preserve_read_buffer).await
    }

    /// Poll until the reception buffer grows beyond `start_bytes` (data
    /// arrived → `true`) or `timeout` elapses (`false`).
    pub async fn wait_for_bytes(
        &mut self,
        timeout: Option<Duration>,
        sleep_time: Option<Duration>,
        start_bytes: usize,
    ) -> Result<bool> {
        let timeout = timeout.unwrap_or(self.config.timeout);
        let sleep_time = sleep_time.unwrap_or(self.config.sleep_time);
        self.require_open().await?;

        let started = Instant::now();
        loop {
            self.engine.pump_available().await?;
            if self.engine.buffer_len() > start_bytes {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(sleep_time).await;
        }
    }

    /// Debounce heuristic for "the command has finished printing".
    ///
    /// Each tick compares the buffer size to the size at the start of the
    /// current quiet window: unchanged accumulates quiet time, changed
    /// restarts the window. Returns `true` once the window exceeds
    /// `quiet`; a window completing strictly before the deadline wins, and
    /// once elapsed time reaches `timeout` the answer is `false`.
    ///
    /// This is a heuristic, not a protocol guarantee: noisy targets can
    /// make it over-wait and silent-but-busy targets under-wait.
    pub async fn wait_for_quiet(
        &mut self,
        quiet: Option<Duration>,
        sleep_time: Option<Duration>,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let quiet = quiet.unwrap_or(self.config.quiet_time);
        let sleep_time = sleep_time.unwrap_or(self.config.sleep_time);
        let timeout = timeout.unwrap_or(self.config.timeout);
        self.require_open().await?;

        let started = Instant::now();
        self.engine.pump_available().await?;
        let mut window_start_size = self.engine.buffer_len();
        let mut window_start = Instant::now();

        loop {
            tokio::time::sleep(sleep_time).await;
            self.engine.pump_available().await?;

            let size = self.engine.buffer_len();
            if size != window_start_size {
                window_start_size = size;
                window_start = Instant::now();
            } else if window_start.elapsed() >= quiet && started.elapsed() < timeout {
                trace!("quiet after {:?}", started.elapsed());
                return Ok(true);
            }

            if started.elapsed() >= timeout {
                debug!("wait_for_quiet: still noisy after {timeout:?}");
                return Ok(false);
            }
        }
    }

    /// Round-trip for when no terminator string is known in advance:
    /// send, wait for the output to go quiet, drain.
    pub async fn send_and_read(
        &mut self,
        cmd: &str,
        timeout: Option<Duration>,
        sleep_time: Option<Duration>,
        quiet_time: Option<Duration>,
        send_newline: bool,
    ) -> Result<String> {
        self.send(cmd, send_newline).await?;
        self.wait_for_quiet(quiet_time, sleep_time, timeout).await?;
        self.engine.read_all(false).await
    }

    /// Send `cmd` and wait for one of `expected`, guarding against
    /// `excepts` (patterns that signal abnormal output, e.g. a panic
    /// banner).
    ///
    /// Expected patterns are supplied first, so when both an expected and
    /// an exception pattern are visible the expected one wins. An
    /// exception pattern winning is an error; no pattern winning returns
    /// `(everything_received, None)`.
    pub async fn send_and_expect(
        &mut self,
        cmd: &str,
        expected: &[&str],
        excepts: &[&str],
        timeout: Option<Duration>,
        send_newline: bool,
    ) -> Result<(String, Option<String>)> {
        let timeout = timeout.unwrap_or(self.config.timeout);

        let mut patterns = compile_patterns(expected)?;
        patterns.extend(compile_patterns(excepts)?);

        self.send(cmd, send_newline).await?;
        let result = self.engine.wait_for_match(&patterns, timeout).await?;

        if let Some(winner) = &result.regex_matched {
            if excepts.contains(&winner.as_str()) {
                return Err(ConsoleError::ExceptionKeywordReceived {
                    pattern: winner.clone(),
                    received: result.text_received,
                }
                .into());
            }
        }
        Ok((result.text_received, result.text_matched))
    }

    /// Run the login handshake with the context's credentials.
    ///
    /// An empty line provokes the first prompt, then each recognized
    /// prompt is answered at most once: the username prompt recurring
    /// after the username was sent (or either credential prompt after the
    /// password) means the credentials were rejected. Without a
    /// `success_match`, running out of prompts after the credentials went
    /// in counts as success.
    pub async fn login(&mut self, seq: &LoginSequence) -> Result<()> {
        let timeout = seq.timeout.unwrap_or(self.config.timeout);
        let roles: Vec<(LoginRole, ConsolePattern)> = seq.compiled()?.into_iter().collect();
        let patterns: Vec<ConsolePattern> = roles.iter().map(|(_, p)| p.clone()).collect();
        let user = self.context.credentials.login.clone();
        let sources = seq.pattern_sources();

        self.require_open().await?;
        self.engine.send_line("").await?;

        let mut sent_username = false;
        let mut sent_password = false;

        loop {
            let result = self.engine.wait_for_match(&patterns, timeout).await?;

            let Some(winner) = &result.regex_matched else {
                if !sent_username && !sent_password {
                    return Err(login_failed(&user, &sources, "no login prompt received"));
                }
                if seq.success_match.is_some() {
                    return Err(login_failed(&user, &sources, "success pattern never matched"));
                }
                // Prompts exhausted and no explicit confirmation required.
                debug!("login: prompts exhausted, treating as success");
                return Ok(());
            };

            let role = roles
                .iter()
                .find(|(_, p)| p.source() == winner.as_str())
                .map(|(role, _)| *role);

            match role {
                Some(LoginRole::Username) => {
                    if sent_username {
                        return Err(login_failed(&user, &sources, "username rejected"));
                    }
                    debug!("login: sending username");
                    self.engine.send_line(&user).await?;
                    sent_username = true;
                }
                Some(LoginRole::Password) => {
                    if sent_password {
                        return Err(login_failed(&user, &sources, "credentials rejected"));
                    }
                    let Some(password) = self
                        .context
                        .credentials
                        .expose_password()
                        .map(str::to_string)
                    else {
                        return Err(login_failed(
                            &user,
                            &sources,
                            "password requested but none configured",
                        ));
                    };
                    debug!("login: sending password");
                    self.engine.send_line(&password).await?;
                    sent_password = true;
                }
                Some(LoginRole::Success) => {
                    debug!("login: success pattern matched");
                    return Ok(());
                }
                None => {
                    return Err(login_failed(&user, &sources, "unrecognized pattern won"));
                }
            }
        }
    }

    /// Query a JSON envelope: let the console go quiet, send `cmd`, and
    /// extract the brace-delimited payload from the response.
    pub async fn get_json_data(&mut self, cmd: &str) -> Result<Value> {
        self.wait_for_quiet(Some(self.config.json_quiet), None, None)
            .await?;

        let (_, matched) = self
            .send_and_expect(cmd, &[r"(?s)\{.*\}"], &[], None, true)
            .await?;

        let Some(text) = matched else {
            return Err(ConsoleError::InvalidJsonReceived {
                reason: "no JSON object in output".to_string(),
            }
            .into());
        };
        serde_json::from_str(&text).map_err(|e| {
            ConsoleError::InvalidJsonReceived {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Wait for the context's prompt pattern; confirms a session is
    /// interactively ready before issuing commands.
    pub async fn wait_for_prompt(&mut self, timeout: Option<Duration>) -> Result<String> {
        let timeout = timeout.unwrap_or(self.config.timeout);

        let Some(source) = self.context.prompt_pattern.clone() else {
            return Err(ConsoleError::PromptNotReached {
                reason: "no prompt pattern configured".to_string(),
            }
            .into());
        };
        let pattern = ConsolePattern::compile(&source)?;

        self.require_open().await?;
        let result = self.engine.wait_for_match(&[pattern], timeout).await?;
        if !result.is_match() {
            return Err(ConsoleError::PromptNotReached {
                reason: format!("pattern {source:?} not matched within {timeout:?}"),
            }
            .into());
        }
        Ok(result.text_received)
    }

    /// Liveness probe: send an empty line and watch for any new bytes.
    /// Leaves buffer contents alone beyond what the device itself prints.
    pub async fn check_alive(&mut self, timeout: Option<Duration>) -> Result<bool> {
        self.require_open().await?;
        self.engine.pump_available().await?;
        let start_bytes = self.engine.buffer_len();
        self.engine.send_line("").await?;
        self.wait_for_bytes(timeout, None, start_bytes).await
    }

    /// Hand the transport to the operator for live use.
    pub async fn interact(&mut self) -> Result<()> {
        self.require_open().await?;
        self.engine.interact().await
    }
}

fn login_failed(user: &str, sources: &[String], reason: &str) -> Error {
    ConsoleError::LoginFailed {
        user: user.to_string(),
        reason: reason.to_string(),
        patterns: sources.to_vec(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::ScriptedTransport;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn test_console(transport: ScriptedTransport) -> Console {
        let _ = env_logger::builder().is_test(true).try_init();
        let context = SystemContext::new(Credentials::new("bob", "secret"))
            .with_prompt_pattern(r"\$ $");
        let mut console = Console::builder(TransportSpec::fd(-1), context)
            .timeout(ms(300))
            .sleep_time(ms(10))
            .quiet_time(ms(40))
            .json_quiet(ms(40))
            .poll_interval(ms(5))
            .log_path(
                std::env::temp_dir().join(format!("labconsole-test-{}.raw", std::process::id())),
            )
            .build();
        console.engine.open_with(Box::new(transport)).unwrap();
        console
    }

    #[tokio::test]
    async fn login_succeeds_with_success_match() {
        let transport = ScriptedTransport::new()
            .on_input("\n", "debian login: ")
            .on_input("bob\n", "Password: ")
            .on_input("secret\n", "prompt> ");
        let mut console = test_console(transport);

        let seq = LoginSequence::new().success_match("prompt>").timeout(ms(300));
        console.login(&seq).await.unwrap();
    }

    #[tokio::test]
    async fn login_succeeds_without_success_match_when_prompts_stop() {
        let transport = ScriptedTransport::new()
            .on_input("\n", "login: ")
            .on_input("bob\n", "Password: ")
            .on_input("secret\n", "~ $ ");
        let mut console = test_console(transport);

        let seq = LoginSequence::new().timeout(ms(150));
        console.login(&seq).await.unwrap();
    }

    #[tokio::test]
    async fn login_fails_when_username_prompt_recurs() {
        let transport = ScriptedTransport::new()
            .on_input("\n", "login: ")
            .on_input("bob\n", "login: ");
        let mut console = test_console(transport);

        let seq = LoginSequence::new().timeout(ms(300));
        let err = console.login(&seq).await.unwrap_err();
        match err {
            Error::Console(ConsoleError::LoginFailed { user, reason, .. }) => {
                assert_eq!(user, "bob");
                assert!(reason.contains("username rejected"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn login_fails_without_initial_prompt() {
        let transport = ScriptedTransport::new();
        let mut console = test_console(transport);

        let seq = LoginSequence::new().timeout(ms(100));
        let err = console.login(&seq).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Console(ConsoleError::LoginFailed { .. })
        ));
    }

    #[tokio::test]
    async fn login_fails_when_password_prompted_but_unset() {
        let transport = ScriptedTransport::new().on_input("\n", "Password: ");
        let context = SystemContext::new(Credentials::passwordless("guest"));
        let mut console = Console::builder(TransportSpec::fd(-1), context)
            .timeout(ms(300))
            .sleep_time(ms(10))
            .poll_interval(ms(5))
            .log_path(
                std::env::temp_dir().join(format!("labconsole-test-{}.raw", std::process::id())),
            )
            .build();
        console
            .engine
            .open_with(Box::new(transport))
            .unwrap();

        let seq = LoginSequence::new().timeout(ms(300));
        let err = console.login(&seq).await.unwrap_err();
        match err {
            Error::Console(ConsoleError::LoginFailed { reason, .. }) => {
                assert!(reason.contains("none configured"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn login_error_never_contains_password() {
        let transport = ScriptedTransport::new()
            .on_input("\n", "login: ")
            .on_input("bob\n", "login: ");
        let mut console = test_console(transport);

        let seq = LoginSequence::new().timeout(ms(300));
        let err = console.login(&seq).await.unwrap_err();
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn send_and_expect_round_trip_leaves_no_duplicate() {
        let transport = ScriptedTransport::new().on_input("echo hi\n", "hi\n");
        let mut console = test_console(transport);

        let (received, matched) = console
            .send_and_expect("echo hi", &["hi"], &[], Some(ms(300)), true)
            .await
            .unwrap();
        assert_eq!(matched.as_deref(), Some("hi"));
        assert_eq!(received, "hi");

        // Only the unconsumed remainder is left.
        assert_eq!(console.read_all(false).await.unwrap(), "\n");
    }

    #[tokio::test]
    async fn send_and_expect_raises_on_exception_keyword() {
        let transport =
            ScriptedTransport::new().on_input("boot\n", "Kernel panic - not syncing\n");
        let mut console = test_console(transport);

        let err = console
            .send_and_expect("boot", &["login:"], &["Kernel panic"], Some(ms(300)), true)
            .await
            .unwrap_err();
        match err {
            Error::Console(ConsoleError::ExceptionKeywordReceived { pattern, received }) => {
                assert_eq!(pattern, "Kernel panic");
                // The buffer is consumed through the end of the match only.
                assert!(received.ends_with("Kernel panic"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Output past the matched keyword stays buffered.
        assert_eq!(console.read_all(false).await.unwrap(), " - not syncing\n");
    }

    #[tokio::test]
    async fn send_and_expect_returns_none_on_timeout() {
        let transport = ScriptedTransport::new().on_input("status\n", "no banner here\n");
        let mut console = test_console(transport);

        let (received, matched) = console
            .send_and_expect("status", &["READY"], &[], Some(ms(100)), true)
            .await
            .unwrap();
        assert!(matched.is_none());
        assert_eq!(received, "no banner here\n");
    }

    #[tokio::test]
    async fn send_and_read_collects_until_quiet() {
        let transport = ScriptedTransport::new().on_input("dmesg\n", "line one\nline two\n");
        let mut console = test_console(transport);

        let output = console
            .send_and_read("dmesg", Some(ms(300)), Some(ms(10)), Some(ms(40)), true)
            .await
            .unwrap();
        assert_eq!(output, "line one\nline two\n");
    }

    #[tokio::test]
    async fn wait_for_quiet_reports_quiet_console() {
        let transport = ScriptedTransport::new().emit("boot noise\n");
        let mut console = test_console(transport);

        let quiet = console
            .wait_for_quiet(Some(ms(40)), Some(ms(10)), Some(ms(400)))
            .await
            .unwrap();
        assert!(quiet);
    }

    #[tokio::test]
    async fn wait_for_quiet_with_continuous_output_runs_to_timeout() {
        let transport = ScriptedTransport::new();
        let handle = transport.handle();
        let mut console = test_console(transport);

        let feeder = tokio::spawn(async move {
            loop {
                handle.push_emit("tick ");
                tokio::time::sleep(ms(10)).await;
            }
        });

        let started = Instant::now();
        let quiet = console
            .wait_for_quiet(Some(ms(50)), Some(ms(20)), Some(ms(200)))
            .await
            .unwrap();
        let elapsed = started.elapsed();
        feeder.abort();

        assert!(!quiet);
        // No earlier than the deadline, no later than roughly one tick past.
        assert!(elapsed >= ms(200), "returned early: {elapsed:?}");
        assert!(elapsed < ms(500), "overshot: {elapsed:?}");
    }

    #[tokio::test]
    async fn get_json_data_parses_payload() {
        let transport = ScriptedTransport::new()
            .on_input("status -j\n", "{\"power\": \"on\", \"volts\": 5.1}\n");
        let mut console = test_console(transport);

        let value = console.get_json_data("status -j").await.unwrap();
        assert_eq!(value["power"], "on");
    }

    #[tokio::test]
    async fn get_json_data_rejects_missing_payload() {
        let transport = ScriptedTransport::new().on_input("status -j\n", "ERROR 42\n");
        let mut console = test_console(transport);

        let err = console.get_json_data("status -j").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Console(ConsoleError::InvalidJsonReceived { .. })
        ));
    }

    #[tokio::test]
    async fn get_json_data_rejects_unparseable_payload() {
        let transport = ScriptedTransport::new().on_input("status -j\n", "{not json}\n");
        let mut console = test_console(transport);

        let err = console.get_json_data("status -j").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Console(ConsoleError::InvalidJsonReceived { .. })
        ));
    }

    #[tokio::test]
    async fn wait_for_prompt_matches_configured_pattern() {
        let transport = ScriptedTransport::new().emit("~ $ ");
        let mut console = test_console(transport);

        let received = console.wait_for_prompt(Some(ms(300))).await.unwrap();
        assert_eq!(received, "~ $ ");
    }

    #[tokio::test]
    async fn wait_for_prompt_requires_configured_pattern() {
        let transport = ScriptedTransport::new();
        let context = SystemContext::new(Credentials::new("bob", "secret"));
        let mut console = Console::builder(TransportSpec::fd(-1), context)
            .log_path(
                std::env::temp_dir().join(format!("labconsole-test-{}.raw", std::process::id())),
            )
            .build();
        console
            .engine
            .open_with(Box::new(transport))
            .unwrap();

        let err = console.wait_for_prompt(Some(ms(50))).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Console(ConsoleError::PromptNotReached { .. })
        ));
    }

    #[tokio::test]
    async fn check_alive_sees_response_to_empty_line() {
        let transport = ScriptedTransport::new().on_input("\n", "\nlogin: ");
        let mut console = test_console(transport);

        assert!(console.check_alive(Some(ms(200))).await.unwrap());
    }

    #[tokio::test]
    async fn check_alive_false_for_silent_target() {
        let transport = ScriptedTransport::new();
        let mut console = test_console(transport);

        assert!(!console.check_alive(Some(ms(100))).await.unwrap());
    }

    #[tokio::test]
    async fn require_open_fails_for_unopenable_spec() {
        // fd -1 can never be established, and no transport is attached.
        let context = SystemContext::new(Credentials::new("bob", "secret"));
        let mut console = Console::new(TransportSpec::fd(-1), context);

        let err = console.send("hello", true).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Engine(EngineError::CannotOpen { .. })
        ));
    }
}
