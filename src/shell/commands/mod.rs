//! Built-in commands
//!
//! Commands are grouped by category and registered into the default
//! registry at startup. Interpreter-level constructs (`script`, `if`,
//! `for`) live in the interpreter itself, not here, because they recurse
//! into line execution.

pub mod environ;
pub mod fs;
pub mod system;
pub mod text;

use super::command::{CommandOutput, CommandRegistry};
use crate::vfs::VfsError;

/// Registry with every built-in registered.
pub fn default_registry() -> CommandRegistry {
    let mut reg = CommandRegistry::new();

    // Filesystem
    reg.register(Box::new(fs::Pwd));
    reg.register(Box::new(fs::Cd));
    reg.register(Box::new(fs::Ls));
    reg.register(Box::new(fs::Cat));
    reg.register(Box::new(fs::Mkdir));
    reg.register(Box::new(fs::Touch));
    reg.register(Box::new(fs::Rm));

    // Environment
    reg.register(Box::new(environ::Export));
    reg.register(Box::new(environ::Unset));
    reg.register(Box::new(environ::Env));
    reg.register(Box::new(environ::Alias));
    reg.register(Box::new(environ::Unalias));

    // Session and system
    reg.register(Box::new(system::Help));
    reg.register(Box::new(system::Clear));
    reg.register(Box::new(system::Echo));
    reg.register(Box::new(system::Date));
    reg.register(Box::new(system::Whoami));
    reg.register(Box::new(system::Uptime));
    reg.register(Box::new(system::HistoryCmd));
    reg.register(Box::new(system::Open));
    reg.register(Box::new(system::ListApps));
    reg.register(Box::new(system::Close));

    // Text processing (standalone forms of the pipeline filters)
    reg.register(Box::new(text::Grep));
    reg.register(Box::new(text::FilterCommand::new(
        "sort",
        "Sort lines of text",
        "sort [-r] [file]",
    )));
    reg.register(Box::new(text::FilterCommand::new(
        "uniq",
        "Filter adjacent duplicate lines",
        "uniq [-c] [file]",
    )));
    reg.register(Box::new(text::FilterCommand::new(
        "wc",
        "Count lines, words, and characters",
        "wc [-l|-w|-c] [file]",
    )));
    reg.register(Box::new(text::FilterCommand::new(
        "head",
        "Output the first lines",
        "head [-n N] [file]",
    )));
    reg.register(Box::new(text::FilterCommand::new(
        "tail",
        "Output the last lines",
        "tail [-n N] [file]",
    )));

    reg
}

// ============ Shared helpers ============

/// The user-error shape: command name, what went wrong, usage.
pub(crate) fn usage_error(cmd: &str, what: &str, usage: &str) -> CommandOutput {
    CommandOutput::Text(format!("{}: {}\nUsage: {}", cmd, what, usage))
}

/// Render a filesystem refusal. The word "error" is load-bearing here:
/// conditional chains judge segment success by its absence.
pub(crate) fn fs_failure(cmd: &str, target: &str, err: VfsError) -> CommandOutput {
    CommandOutput::Text(format!("{}: error: {}: {}", cmd, target, err))
}
