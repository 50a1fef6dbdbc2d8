//! Shell - the virtual command processor
//!
//! A small interpreter for a shell-like command language:
//! - quote-aware parsing, `$VAR` expansion, aliases
//! - pipelines (`|`) with text filters (grep/sort/uniq/wc/head/tail)
//! - conditional chaining (`&&`/`||`), redirection (`>`/`>>`)
//! - fire-and-forget background execution (`&`)
//! - a registry of built-in commands, open for extension
//!
//! One [`Shell`] exists per page; it owns the process-wide variable/alias
//! stores, the history ring, the command registry, the filesystem, and the
//! background-job executor. Terminal windows each own a [`Session`] and
//! pass it in with every line.

pub mod command;
pub mod commands;
pub mod expand;
pub mod filters;
pub mod history;
mod interp;
pub mod parser;
pub mod session;
pub mod state;

pub use command::{Command, CommandOutput, CommandRegistry, Context, ShellError};
pub use history::History;
pub use session::Session;
pub use state::{AliasTable, ShellState, UnsetError, VarType, Variable, VariableStore};

use crate::clock::{Clock, SystemClock};
use crate::jobs;
use crate::vfs::{FsSnapshot, MemoryFs};
use interp::Engine;
use std::cell::RefCell;
use std::rc::Rc;

/// The process-wide shell.
pub struct Shell {
    engine: Engine,
}

impl Shell {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    /// Construct with an injected clock (tests, replay).
    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        let started_ms = clock.now_ms();
        Self {
            engine: Engine {
                state: Rc::new(RefCell::new(ShellState::new())),
                vfs: Rc::new(RefCell::new(MemoryFs::new())),
                registry: Rc::new(RefCell::new(commands::default_registry())),
                jobs: Rc::new(jobs::Executor::new()),
                clock,
                started_ms,
            },
        }
    }

    /// A fresh session rooted at the home directory. Sessions share this
    /// shell's stores; their lifecycle belongs to the window layer.
    pub fn create_session(&self) -> Session {
        let state = self.engine.state.borrow();
        Session::new(state.vars.get("HOME").unwrap_or("/home/user"))
    }

    /// Process one input line for a session.
    ///
    /// The returned output has already been applied to the session's log
    /// (text appended, `Clear` wiping it); it is returned so the host can
    /// react to window signals. Blank lines do nothing and are not
    /// recorded in history.
    pub fn execute_line(&mut self, line: &str, session: &mut Session) -> CommandOutput {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return CommandOutput::None;
        }

        session.processing = true;
        let output = self.engine.run_line(trimmed, session, 0);

        match &output {
            CommandOutput::Text(text) if !text.is_empty() => session.push_output(text),
            CommandOutput::Clear => session.clear_output(),
            _ => {}
        }

        self.engine.state.borrow_mut().history.record(trimmed);
        session.processing = false;
        output
    }

    /// Register an additional command (host extensions, plugins).
    pub fn register_command(&mut self, cmd: Box<dyn Command>) {
        self.engine.registry.borrow_mut().register(cmd);
    }

    /// Poll background jobs once. Hosts call this from their frame loop.
    pub fn tick(&self) -> usize {
        self.engine.jobs.tick()
    }

    /// Drain all background jobs (tests, shutdown).
    pub fn run_background(&self) {
        self.engine.jobs.run()
    }

    pub fn has_background_jobs(&self) -> bool {
        self.engine.jobs.has_jobs()
    }

    /// History navigation for the terminal's arrow keys. The cursor is
    /// shared, like the history itself.
    pub fn history_prev(&self) -> Option<String> {
        self.engine
            .state
            .borrow_mut()
            .history
            .prev()
            .map(|s| s.to_string())
    }

    pub fn history_next(&self) -> Option<String> {
        self.engine
            .state
            .borrow_mut()
            .history
            .next()
            .map(|s| s.to_string())
    }

    /// Snapshot the filesystem for host-side persistence.
    pub fn snapshot(&self) -> FsSnapshot {
        self.engine.vfs.borrow().snapshot()
    }

    /// Replace the filesystem with a restored snapshot.
    pub fn restore(&mut self, snapshot: &FsSnapshot) {
        *self.engine.vfs.borrow_mut() = MemoryFs::from_snapshot(snapshot);
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
