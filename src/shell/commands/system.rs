//! Session and system commands
//!
//! help, clear, echo, date, whoami, uptime, history, and the window-layer
//! signals (open/list/close).

use super::usage_error;
use crate::shell::command::{Command, CommandOutput, Context, ShellError};
use time::OffsetDateTime;
use time::macros::format_description;

/// Applications the desktop can launch from the terminal.
pub const APPS: &[&str] = &[
    "browser",
    "calculator",
    "explorer",
    "notepad",
    "settings",
    "terminal",
];

/// help - list commands or show one command's usage
pub struct Help;

impl Command for Help {
    fn name(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "Show available commands"
    }
    fn usage(&self) -> &str {
        "help [command]"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        if let Some(topic) = args.first() {
            if let Some(cmd) = ctx.registry.get(topic) {
                return Ok(CommandOutput::Text(format!(
                    "{} - {}\nUsage: {}",
                    cmd.name(),
                    cmd.description(),
                    cmd.usage()
                )));
            }
            let construct = match topic.as_str() {
                "script" => Some("script - run commands from a file\nUsage: script <file>"),
                "if" => Some(
                    "if - conditional execution\nUsage: if <condition> then <command> [else <command>]",
                ),
                "for" => Some("for - iterate over items\nUsage: for NAME in <items...> do <command>"),
                _ => None,
            };
            return Ok(match construct {
                Some(text) => CommandOutput::Text(text.to_string()),
                None => CommandOutput::Text(format!("help: no help for '{}'", topic)),
            });
        }

        let mut out = String::from("Available commands:\n");
        for name in ctx.registry.names() {
            if let Some(cmd) = ctx.registry.get(name) {
                out.push_str(&format!("  {:<10} {}\n", name, cmd.description()));
            }
        }
        out.push_str("\nShell constructs:\n");
        out.push_str("  script <file>                              run commands from a file\n");
        out.push_str("  if <cond> then <cmd> [else <cmd>]          conditional execution\n");
        out.push_str("  for NAME in <items...> do <cmd>            iteration\n");
        out.push_str("\nOperators: | > >> && || &");
        Ok(CommandOutput::Text(out))
    }
}

/// clear - erase the terminal's output log
///
/// Returns the `Clear` signal regardless of arguments; the caller applies
/// it to the session.
pub struct Clear;

impl Command for Clear {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the terminal"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn run(&self, _args: &[String], _ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        Ok(CommandOutput::Clear)
    }
}

/// echo - print arguments
///
/// Escape sequences are always processed; `echo "a\nb"` prints two lines.
pub struct Echo;

impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print arguments"
    }
    fn usage(&self) -> &str {
        "echo [args...]"
    }
    fn run(&self, args: &[String], _ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        Ok(CommandOutput::Text(process_escapes(&args.join(" "))))
    }
}

/// Process backslash escape sequences in a string
fn process_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// date - current date and time
pub struct Date;

impl Command for Date {
    fn name(&self) -> &str {
        "date"
    }
    fn description(&self) -> &str {
        "Print the current date and time"
    }
    fn usage(&self) -> &str {
        "date"
    }
    fn run(&self, _args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let secs = (ctx.now_ms / 1000.0).floor() as i64;
        let dt = OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let fmt = format_description!(
            "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] UTC [year]"
        );
        match dt.format(&fmt) {
            Ok(s) => Ok(CommandOutput::Text(s)),
            Err(e) => Err(ShellError::Fault(e.to_string())),
        }
    }
}

/// whoami - current user
pub struct Whoami;

impl Command for Whoami {
    fn name(&self) -> &str {
        "whoami"
    }
    fn description(&self) -> &str {
        "Print the current user"
    }
    fn usage(&self) -> &str {
        "whoami"
    }
    fn run(&self, _args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let user = ctx.state.vars.get("USER").unwrap_or("user").to_string();
        Ok(CommandOutput::Text(user))
    }
}

/// uptime - time since the shell started
pub struct Uptime;

impl Command for Uptime {
    fn name(&self) -> &str {
        "uptime"
    }
    fn description(&self) -> &str {
        "Show time since the shell started"
    }
    fn usage(&self) -> &str {
        "uptime"
    }
    fn run(&self, _args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let elapsed_ms = (ctx.now_ms - ctx.started_ms).max(0.0);
        Ok(CommandOutput::Text(format!("up {}", humanize(elapsed_ms))))
    }
}

/// "N days, N hours, N minutes", dropping leading zero units
fn humanize(ms: f64) -> String {
    let secs = (ms / 1000.0) as u64;
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{} day{}", days, if days == 1 { "" } else { "s" }));
    }
    if hours > 0 {
        parts.push(format!(
            "{} hour{}",
            hours,
            if hours == 1 { "" } else { "s" }
        ));
    }
    parts.push(format!(
        "{} minute{}",
        minutes,
        if minutes == 1 { "" } else { "s" }
    ));
    parts.join(", ")
}

/// history - render the shared command history
pub struct HistoryCmd;

impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn description(&self) -> &str {
        "Show command history"
    }
    fn usage(&self) -> &str {
        "history"
    }
    fn run(&self, _args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        if ctx.state.history.is_empty() {
            return Ok(CommandOutput::None);
        }
        let lines: Vec<String> = ctx
            .state
            .history
            .entries()
            .enumerate()
            .map(|(i, entry)| format!("{:>4}  {}", i + 1, entry))
            .collect();
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

/// open - ask the window layer to launch an application
pub struct Open;

impl Command for Open {
    fn name(&self) -> &str {
        "open"
    }
    fn description(&self) -> &str {
        "Open an application window"
    }
    fn usage(&self) -> &str {
        "open <application>"
    }
    fn run(&self, args: &[String], _ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let Some(arg) = args.first() else {
            return Ok(usage_error("open", "missing operand", self.usage()));
        };
        let app = arg.to_lowercase();
        if APPS.contains(&app.as_str()) {
            Ok(CommandOutput::Launch(app))
        } else {
            Ok(CommandOutput::Text(format!(
                "open: unknown application: {}\nType 'list' to see available applications.",
                arg
            )))
        }
    }
}

/// list - show launchable applications
pub struct ListApps;

impl Command for ListApps {
    fn name(&self) -> &str {
        "list"
    }
    fn description(&self) -> &str {
        "List available applications"
    }
    fn usage(&self) -> &str {
        "list"
    }
    fn run(&self, _args: &[String], _ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        Ok(CommandOutput::Text(APPS.join("\n")))
    }
}

/// close - ask the window layer to close an application window
pub struct Close;

impl Command for Close {
    fn name(&self) -> &str {
        "close"
    }
    fn description(&self) -> &str {
        "Close an application window"
    }
    fn usage(&self) -> &str {
        "close <application>"
    }
    fn run(&self, args: &[String], _ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let Some(arg) = args.first() else {
            return Ok(usage_error("close", "missing operand", self.usage()));
        };
        let app = arg.to_lowercase();
        if APPS.contains(&app.as_str()) {
            Ok(CommandOutput::CloseWindow(app))
        } else {
            Ok(CommandOutput::Text(format!(
                "close: unknown application: {}",
                arg
            )))
        }
    }
}
