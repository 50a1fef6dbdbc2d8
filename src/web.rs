//! Browser bindings
//!
//! The wasm surface the desktop UI consumes: open/close terminal sessions,
//! run lines, read logs, drive background jobs from the frame loop, and
//! persist the filesystem as JSON. The UI itself (windows, taskbar,
//! rendering) lives entirely on the JS side.

use crate::console_log;
use crate::shell::{CommandOutput, Session, Shell};
use crate::vfs::FsSnapshot;
use serde::Serialize;
use slab::Slab;
use wasm_bindgen::prelude::*;

/// Outcome of one executed line, handed to JS as JSON.
#[derive(Serialize)]
struct RunOutcome<'a> {
    /// "text" | "none" | "clear" | "launch" | "close" | "error"
    kind: &'static str,
    text: &'a str,
    app: Option<&'a str>,
}

fn outcome_json(kind: &'static str, text: &str, app: Option<&str>) -> String {
    serde_json::to_string(&RunOutcome { kind, text, app })
        .unwrap_or_else(|_| r#"{"kind":"error","text":"serialization failed","app":null}"#.into())
}

#[wasm_bindgen]
pub struct WebShell {
    shell: Shell,
    sessions: Slab<Session>,
}

#[wasm_bindgen]
impl WebShell {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebShell {
        WebShell {
            shell: Shell::new(),
            sessions: Slab::new(),
        }
    }

    /// Open a terminal session; returns its handle.
    pub fn open_session(&mut self) -> usize {
        self.sessions.insert(self.shell.create_session())
    }

    /// Close a terminal session. The shared stores live on.
    pub fn close_session(&mut self, handle: usize) {
        if self.sessions.contains(handle) {
            self.sessions.remove(handle);
        }
    }

    /// Execute one line in a session. Returns a JSON outcome:
    /// `{"kind": "text"|"none"|"clear"|"launch"|"close", "text": ..., "app": ...}`
    pub fn run(&mut self, handle: usize, line: &str) -> String {
        let Some(session) = self.sessions.get_mut(handle) else {
            return outcome_json("error", "no such session", None);
        };
        let output = self.shell.execute_line(line, session);
        match &output {
            CommandOutput::Text(text) => outcome_json("text", text, None),
            CommandOutput::None => outcome_json("none", "", None),
            CommandOutput::Clear => outcome_json("clear", "", None),
            CommandOutput::Launch(app) => outcome_json("launch", "", Some(app)),
            CommandOutput::CloseWindow(app) => outcome_json("close", "", Some(app)),
        }
    }

    /// A session's output log, newline-joined.
    pub fn output(&self, handle: usize) -> String {
        self.sessions
            .get(handle)
            .map(|s| s.output_text())
            .unwrap_or_default()
    }

    /// A session's working directory (for prompt rendering).
    pub fn cwd(&self, handle: usize) -> String {
        self.sessions
            .get(handle)
            .map(|s| s.cwd.clone())
            .unwrap_or_default()
    }

    /// Poll background jobs once; call from requestAnimationFrame.
    pub fn tick(&mut self) -> usize {
        self.shell.tick()
    }

    /// Arrow-key history navigation (shared across sessions).
    pub fn history_prev(&self) -> Option<String> {
        self.shell.history_prev()
    }

    pub fn history_next(&self) -> Option<String> {
        self.shell.history_next()
    }

    /// Serialize the filesystem for persistence (e.g. localStorage).
    pub fn save(&self) -> String {
        match self.shell.snapshot().to_json() {
            Ok(json) => json,
            Err(e) => {
                console_log!("[web] snapshot failed: {}", e);
                String::new()
            }
        }
    }

    /// Restore the filesystem from snapshot JSON. Returns false on bad input.
    pub fn restore(&mut self, json: &str) -> bool {
        match FsSnapshot::from_json(json) {
            Ok(snapshot) => {
                self.shell.restore(&snapshot);
                true
            }
            Err(e) => {
                console_log!("[web] snapshot restore failed: {}", e);
                false
            }
        }
    }
}

impl Default for WebShell {
    fn default() -> Self {
        Self::new()
    }
}
