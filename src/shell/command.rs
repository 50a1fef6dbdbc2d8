//! Command trait, registry, and dispatch types
//!
//! Built-in commands are polymorphic handlers registered by name at
//! startup. A command gets its parsed arguments and a [`Context`] borrowing
//! the shared stores, the filesystem, and the issuing session, and returns
//! a tagged [`CommandOutput`] - plain text, nothing, or a side-effect
//! signal the window layer interprets. Failures a user caused come back as
//! `Text`; only genuine handler faults surface as [`ShellError`], and the
//! dispatcher converts those to text at its boundary.

use super::session::Session;
use super::state::ShellState;
use crate::vfs::{self, Vfs, VfsError};
use std::collections::HashMap;
use std::fmt;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines for the session's output log
    Text(String),
    /// Command produced no visible output
    None,
    /// Signal: erase the session's output log
    Clear,
    /// Signal: open an application window
    Launch(String),
    /// Signal: close an application window
    CloseWindow(String),
}

impl CommandOutput {
    /// The text carried by this output; signals carry none.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(t) => t,
            _ => "",
        }
    }

    /// The success heuristic used by conditional chains: output that does
    /// not contain "error" (case-insensitive) counts as success.
    pub fn is_success(&self) -> bool {
        !self.text().to_lowercase().contains("error")
    }
}

/// A handler fault. User-visible refusals are `Text` output, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// Filesystem refusal escaping a handler
    Vfs(VfsError),
    /// Anything else a handler could not recover from
    Fault(String),
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vfs(e) => write!(f, "{}", e),
            Self::Fault(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ShellError {}

impl From<VfsError> for ShellError {
    fn from(e: VfsError) -> Self {
        Self::Vfs(e)
    }
}

/// Everything a command may touch while running.
pub struct Context<'a> {
    /// Process-wide stores (variables, aliases, history)
    pub state: &'a mut ShellState,
    /// The filesystem collaborator
    pub vfs: &'a mut dyn Vfs,
    /// The issuing terminal session
    pub session: &'a mut Session,
    /// The registry itself, for `help`
    pub registry: &'a CommandRegistry,
    /// Current time, milliseconds since epoch
    pub now_ms: f64,
    /// When the shell was constructed
    pub started_ms: f64,
}

impl Context<'_> {
    pub fn home(&self) -> &str {
        self.state.vars.get("HOME").unwrap_or("/home/user")
    }

    /// Resolve a user-supplied path against the session's working
    /// directory, with `~` expansion.
    pub fn resolve_path(&self, arg: &str) -> String {
        resolve_path(&self.session.cwd, self.home(), arg)
    }
}

/// Shared path resolution: `~`/`~/...` to HOME, absolute paths stand
/// alone, everything else is relative to `cwd`.
pub fn resolve_path(cwd: &str, home: &str, arg: &str) -> String {
    if arg.is_empty() || arg == "~" {
        home.to_string()
    } else if let Some(rest) = arg.strip_prefix("~/") {
        vfs::join(home, rest)
    } else {
        vfs::join(cwd, arg)
    }
}

/// A single built-in command.
pub trait Command {
    /// The command name (what the user types)
    fn name(&self) -> &str;

    /// One-line description for `help`
    fn description(&self) -> &str;

    /// Usage string, e.g. `mkdir <directory_name>`
    fn usage(&self) -> &str;

    /// Execute with parsed arguments and the current context.
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError>;
}

/// Registry of available commands. Populated at startup, open for
/// extension: hosts and plugins may register additional commands.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
