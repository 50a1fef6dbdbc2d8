//! Environment commands: variables and aliases

use super::usage_error;
use crate::shell::command::{Command, CommandOutput, Context, ShellError};
use crate::shell::state::{ShellState, UnsetError};
use crate::vfs;
use once_cell::sync::Lazy;
use regex::Regex;

static VAR_ASSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z_][A-Z0-9_]*)=(.*)$").expect("variable assignment pattern"));

static ALIAS_ASSIGN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z_][a-zA-Z0-9_]*)=(.*)$").expect("alias assignment pattern")
});

/// `NAME=value` lines, sorted by name.
fn render_env(state: &ShellState) -> CommandOutput {
    let lines: Vec<String> = state
        .vars
        .iter()
        .map(|(name, var)| format!("{}={}", name, var.value))
        .collect();
    CommandOutput::Text(lines.join("\n"))
}

/// export - define or overwrite a shell variable
///
/// Export always succeeds, readonly or not. `export PWD=...` doubles as a
/// directory change for the issuing session.
pub struct Export;

impl Command for Export {
    fn name(&self) -> &str {
        "export"
    }
    fn description(&self) -> &str {
        "Set a shell variable"
    }
    fn usage(&self) -> &str {
        "export [NAME=value]"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        if args.is_empty() {
            return Ok(render_env(ctx.state));
        }

        for arg in args {
            let Some(caps) = VAR_ASSIGN_RE.captures(arg) else {
                return Ok(CommandOutput::Text("export: invalid assignment".to_string()));
            };
            let name = &caps[1];
            let value = &caps[2];

            if name == "PWD" {
                // Directory change through the environment
                let target = vfs::normalize(value);
                let old = std::mem::replace(&mut ctx.session.cwd, target.clone());
                ctx.state.vars.upsert("OLDPWD", &old);
                ctx.state.vars.upsert("PWD", &target);
            } else {
                ctx.state.vars.upsert(name, value);
            }
        }
        Ok(CommandOutput::None)
    }
}

/// unset - remove a shell variable
pub struct Unset;

impl Command for Unset {
    fn name(&self) -> &str {
        "unset"
    }
    fn description(&self) -> &str {
        "Remove a shell variable"
    }
    fn usage(&self) -> &str {
        "unset <NAME>"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let Some(name) = args.first() else {
            return Ok(usage_error("unset", "missing operand", self.usage()));
        };
        match ctx.state.vars.unset(name) {
            Ok(()) => Ok(CommandOutput::None),
            Err(UnsetError::Readonly) => Ok(CommandOutput::Text(format!(
                "unset: cannot unset '{}': readonly variable",
                name
            ))),
            Err(UnsetError::NotFound) => Ok(CommandOutput::Text(format!(
                "unset: '{}': not found",
                name
            ))),
        }
    }
}

/// env - list shell variables
pub struct Env;

impl Command for Env {
    fn name(&self) -> &str {
        "env"
    }
    fn description(&self) -> &str {
        "List shell variables"
    }
    fn usage(&self) -> &str {
        "env"
    }
    fn run(&self, _args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        Ok(render_env(ctx.state))
    }
}

/// alias - define or list aliases
pub struct Alias;

impl Command for Alias {
    fn name(&self) -> &str {
        "alias"
    }
    fn description(&self) -> &str {
        "Define or list aliases"
    }
    fn usage(&self) -> &str {
        "alias [name=command]"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let Some(arg) = args.first() else {
            if ctx.state.aliases.is_empty() {
                return Ok(CommandOutput::None);
            }
            let lines: Vec<String> = ctx
                .state
                .aliases
                .iter()
                .map(|(name, expansion)| format!("{}='{}'", name, expansion))
                .collect();
            return Ok(CommandOutput::Text(lines.join("\n")));
        };

        if arg.contains('=') {
            let Some(caps) = ALIAS_ASSIGN_RE.captures(arg) else {
                return Ok(CommandOutput::Text("alias: invalid alias name".to_string()));
            };
            let name = &caps[1];
            // Surrounding quote characters are stripped at definition time
            let expansion = caps[2].trim_matches('\'').trim_matches('"');
            ctx.state.aliases.set(name, expansion);
            return Ok(CommandOutput::None);
        }

        match ctx.state.aliases.get(arg) {
            Some(expansion) => Ok(CommandOutput::Text(format!("{}='{}'", arg, expansion))),
            None => Ok(CommandOutput::Text(format!("alias: {}: not found", arg))),
        }
    }
}

/// unalias - remove an alias
pub struct Unalias;

impl Command for Unalias {
    fn name(&self) -> &str {
        "unalias"
    }
    fn description(&self) -> &str {
        "Remove an alias"
    }
    fn usage(&self) -> &str {
        "unalias <name>"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let Some(name) = args.first() else {
            return Ok(usage_error("unalias", "missing operand", self.usage()));
        };
        if ctx.state.aliases.remove(name) {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Text(format!(
                "unalias: {}: not found",
                name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::command::CommandRegistry;
    use crate::shell::session::Session;
    use crate::vfs::MemoryFs;

    fn run_in(
        cmd: &dyn Command,
        args: &[&str],
        state: &mut ShellState,
        session: &mut Session,
    ) -> CommandOutput {
        let registry = CommandRegistry::new();
        let mut fs = MemoryFs::new();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut ctx = Context {
            state,
            vfs: &mut fs,
            session,
            registry: &registry,
            now_ms: 0.0,
            started_ms: 0.0,
        };
        cmd.run(&args, &mut ctx).unwrap()
    }

    fn fresh() -> (ShellState, Session) {
        (ShellState::new(), Session::new("/home/user"))
    }

    // ============ export ============

    #[test]
    fn test_export_sets_variable() {
        let (mut state, mut session) = fresh();
        let out = run_in(&Export, &["GREETING=hi"], &mut state, &mut session);
        assert_eq!(out, CommandOutput::None);
        assert_eq!(state.vars.get("GREETING"), Some("hi"));
    }

    #[test]
    fn test_export_invalid_assignment() {
        let (mut state, mut session) = fresh();
        for bad in ["lower=x", "2X=x", "NOEQUALS", "FOO-BAR=x"] {
            let out = run_in(&Export, &[bad], &mut state, &mut session);
            assert_eq!(out.text(), "export: invalid assignment", "input: {}", bad);
        }
    }

    #[test]
    fn test_export_overwrites_readonly() {
        let (mut state, mut session) = fresh();
        let out = run_in(&Export, &["USER=alice"], &mut state, &mut session);
        assert_eq!(out, CommandOutput::None);
        assert_eq!(state.vars.get("USER"), Some("alice"));
    }

    #[test]
    fn test_export_empty_value() {
        let (mut state, mut session) = fresh();
        run_in(&Export, &["EMPTY="], &mut state, &mut session);
        assert_eq!(state.vars.get("EMPTY"), Some(""));
    }

    #[test]
    fn test_export_no_args_lists_env() {
        let (mut state, mut session) = fresh();
        let out = run_in(&Export, &[], &mut state, &mut session);
        assert!(out.text().contains("USER=user"));
        assert!(out.text().contains("HOME=/home/user"));
    }

    #[test]
    fn test_export_pwd_moves_session() {
        let (mut state, mut session) = fresh();
        run_in(&Export, &["PWD=/etc"], &mut state, &mut session);
        assert_eq!(session.cwd, "/etc");
        assert_eq!(state.vars.get("PWD"), Some("/etc"));
        assert_eq!(state.vars.get("OLDPWD"), Some("/home/user"));
    }

    // ============ unset ============

    #[test]
    fn test_unset_removes() {
        let (mut state, mut session) = fresh();
        state.vars.upsert("TMP", "1");
        let out = run_in(&Unset, &["TMP"], &mut state, &mut session);
        assert_eq!(out, CommandOutput::None);
        assert_eq!(state.vars.get("TMP"), None);
    }

    #[test]
    fn test_unset_readonly_refused_and_kept() {
        let (mut state, mut session) = fresh();
        let out = run_in(&Unset, &["USER"], &mut state, &mut session);
        assert_eq!(out.text(), "unset: cannot unset 'USER': readonly variable");
        assert_eq!(state.vars.get("USER"), Some("user"));
        // env still lists it afterwards
        let out = run_in(&Env, &[], &mut state, &mut session);
        assert!(out.text().contains("USER=user"));
    }

    #[test]
    fn test_unset_missing() {
        let (mut state, mut session) = fresh();
        let out = run_in(&Unset, &["GHOST"], &mut state, &mut session);
        assert_eq!(out.text(), "unset: 'GHOST': not found");
    }

    // ============ env ============

    #[test]
    fn test_env_sorted() {
        let (mut state, mut session) = fresh();
        state.vars.upsert("ZZZ", "last");
        state.vars.upsert("AAA", "first");
        let out = run_in(&Env, &[], &mut state, &mut session);
        let text = out.text().to_string();
        let a = text.find("AAA=").unwrap();
        let z = text.find("ZZZ=").unwrap();
        assert!(a < z);
    }

    // ============ alias ============

    #[test]
    fn test_alias_set_strips_quotes() {
        let (mut state, mut session) = fresh();
        run_in(&Alias, &["ll='ls -la'"], &mut state, &mut session);
        assert_eq!(state.aliases.get("ll"), Some("ls -la"));
    }

    #[test]
    fn test_alias_listing_sorted() {
        let (mut state, mut session) = fresh();
        run_in(&Alias, &["zz=date"], &mut state, &mut session);
        run_in(&Alias, &["aa=pwd"], &mut state, &mut session);
        let out = run_in(&Alias, &[], &mut state, &mut session);
        assert_eq!(out.text(), "aa='pwd'\nzz='date'");
    }

    #[test]
    fn test_alias_invalid_name() {
        let (mut state, mut session) = fresh();
        let out = run_in(&Alias, &["2bad=x"], &mut state, &mut session);
        assert_eq!(out.text(), "alias: invalid alias name");
    }

    #[test]
    fn test_alias_show_single() {
        let (mut state, mut session) = fresh();
        run_in(&Alias, &["ll=ls"], &mut state, &mut session);
        let out = run_in(&Alias, &["ll"], &mut state, &mut session);
        assert_eq!(out.text(), "ll='ls'");
        let out = run_in(&Alias, &["nope"], &mut state, &mut session);
        assert_eq!(out.text(), "alias: nope: not found");
    }

    #[test]
    fn test_unalias() {
        let (mut state, mut session) = fresh();
        run_in(&Alias, &["ll=ls"], &mut state, &mut session);
        let out = run_in(&Unalias, &["ll"], &mut state, &mut session);
        assert_eq!(out, CommandOutput::None);
        let out = run_in(&Unalias, &["ll"], &mut state, &mut session);
        assert_eq!(out.text(), "unalias: ll: not found");
    }
}
