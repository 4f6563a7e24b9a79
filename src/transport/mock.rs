//! Scripted in-memory transport for deterministic tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::Transport;

/// One step of a scripted exchange.
#[derive(Debug)]
struct Exchange {
    /// Input that must be written before `emit` becomes readable;
    /// `None` emits unconditionally.
    on_input: Option<Vec<u8>>,
    emit: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    pending: VecDeque<u8>,
    script: VecDeque<Exchange>,
    written: Vec<u8>,
    eof_after_script: bool,
    alive: bool,
}

/// Shared handle for inspecting and driving a [`ScriptedTransport`]
/// after the console has taken ownership of it.
#[derive(Debug, Clone)]
pub(crate) struct ScriptHandle(Arc<Mutex<Inner>>);

impl ScriptHandle {
    /// Everything the engine has written so far.
    pub(crate) fn written(&self) -> Vec<u8> {
        self.0.lock().unwrap().written.clone()
    }

    /// Inject bytes as if the device produced them spontaneously.
    pub(crate) fn push_emit(&self, text: &str) {
        self.0.lock().unwrap().pending.extend(text.as_bytes());
    }

    /// Simulate the device dying.
    pub(crate) fn kill(&self) {
        self.0.lock().unwrap().alive = false;
    }
}

/// Transport that replays a script of emit / expect-input-then-emit steps.
#[derive(Debug)]
pub(crate) struct ScriptedTransport(ScriptHandle);

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self(ScriptHandle(Arc::new(Mutex::new(Inner {
            alive: true,
            ..Inner::default()
        }))))
    }

    /// Emit `text` as soon as the reader gets to it.
    pub(crate) fn emit(self, text: &str) -> Self {
        self.0.0.lock().unwrap().script.push_back(Exchange {
            on_input: None,
            emit: text.as_bytes().to_vec(),
        });
        self
    }

    /// Emit `emit` only after exactly `input` has been written.
    pub(crate) fn on_input(self, input: &str, emit: &str) -> Self {
        self.0.0.lock().unwrap().script.push_back(Exchange {
            on_input: Some(input.as_bytes().to_vec()),
            emit: emit.as_bytes().to_vec(),
        });
        self
    }

    /// Report end-of-stream once the script is exhausted (default is to
    /// stay silent, like an idle device).
    pub(crate) fn eof_after_script(self) -> Self {
        self.0.0.lock().unwrap().eof_after_script = true;
        self
    }

    pub(crate) fn handle(&self) -> ScriptHandle {
        self.0.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            {
                let mut inner = self.0.0.lock().unwrap();

                // Promote at most one unconditional emit per read, so a
                // script of several emits arrives as separate chunks.
                if inner.pending.is_empty()
                    && inner
                        .script
                        .front()
                        .is_some_and(|ex| ex.on_input.is_none())
                {
                    let ex = inner.script.pop_front().unwrap();
                    inner.pending.extend(ex.emit);
                }

                if !inner.pending.is_empty() {
                    let n = buf.len().min(inner.pending.len());
                    for slot in buf.iter_mut().take(n) {
                        *slot = inner.pending.pop_front().unwrap();
                    }
                    return Ok(n);
                }

                if !inner.alive || (inner.eof_after_script && inner.script.is_empty()) {
                    return Ok(0);
                }
            }

            // Device is quiet; the caller's timeout bounds this wait.
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut inner = self.0.0.lock().unwrap();
        inner.written.extend_from_slice(data);

        if inner
            .script
            .front()
            .and_then(|ex| ex.on_input.as_deref())
            .is_some_and(|expected| expected == data)
        {
            let ex = inner.script.pop_front().unwrap();
            inner.pending.extend(ex.emit);
        }
        Ok(())
    }

    fn is_alive(&mut self) -> bool {
        self.0.0.lock().unwrap().alive
    }

    async fn shutdown(&mut self) {
        self.0.0.lock().unwrap().alive = false;
    }
}
