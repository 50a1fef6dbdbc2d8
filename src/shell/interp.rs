//! The interpreter
//!
//! Takes one raw line through expansion, alias resolution, and operator
//! precedence, then into command dispatch. Precedence is checked against
//! the whole (expanded) line, never nested:
//!
//! 1. `|`  - pipeline; the entire line is pipeline content
//! 2. `>`/`>>` - redirection of a single command's output
//! 3. trailing `&` - background execution
//! 4. `&&`/`||` - conditional chain
//! 5. otherwise - single command dispatch
//!
//! The `script`, `if`, and `for` constructs recurse back into line
//! execution, so they live here rather than in the command registry.

use super::command::{resolve_path, CommandOutput, CommandRegistry, Context, ShellError};
use super::expand::{expand_variables, resolve_alias};
use super::filters;
use super::parser::{self, ChainOp};
use super::session::Session;
use super::state::{ShellState, VariableStore};
use crate::clock::Clock;
use crate::console_log;
use crate::jobs;
use crate::vfs::{self, MemoryFs, Vfs, VfsError};
use std::cell::RefCell;
use std::rc::Rc;

/// Nesting cap for script/if/for recursion.
const MAX_DEPTH: usize = 8;

/// The shared machinery behind a [`super::Shell`]. Cloning is cheap and
/// shares everything; background jobs hold a clone.
#[derive(Clone)]
pub(crate) struct Engine {
    pub state: Rc<RefCell<ShellState>>,
    pub vfs: Rc<RefCell<MemoryFs>>,
    pub registry: Rc<RefCell<CommandRegistry>>,
    pub jobs: Rc<jobs::Executor>,
    pub clock: Rc<dyn Clock>,
    pub started_ms: f64,
}

impl Engine {
    /// Full treatment of one line: expansion, alias resolution, operator
    /// precedence, dispatch.
    pub fn run_line(&self, line: &str, session: &mut Session, depth: usize) -> CommandOutput {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return CommandOutput::None;
        }
        if depth > MAX_DEPTH {
            return CommandOutput::Text("shell: maximum nesting depth exceeded".to_string());
        }

        let expanded = {
            let state = self.state.borrow();
            let with_vars = expand_variables(line, &state);
            resolve_alias(&with_vars, &state)
        };

        if parser::has_pipe(&expanded) {
            return self.run_pipeline(&expanded, session, depth);
        }
        if let Some((command, target, append)) = parser::find_redirect(&expanded) {
            return self.run_redirect(&command, &target, append, session, depth);
        }
        if let Some(stripped) = parser::strip_background(&expanded) {
            return self.spawn_background(&stripped, session);
        }
        if let Some(op) = parser::find_chain(&expanded) {
            return self.run_chain(&expanded, op, session, depth);
        }
        self.dispatch_segment(&expanded, session, depth)
    }

    /// Left-to-right pipeline; each stage's output is the next stage's
    /// input. Filter stages consume the piped text directly; everything
    /// else goes through normal dispatch and ignores the pipe.
    fn run_pipeline(&self, line: &str, session: &mut Session, depth: usize) -> CommandOutput {
        let segments = parser::split_pipes(line);
        let mut input: Option<String> = None;

        for (i, segment) in segments.iter().enumerate() {
            let tokens = parser::tokenize(segment.trim());
            if tokens.is_empty() {
                return CommandOutput::Text(format!(
                    "Pipeline error at stage {}: empty command",
                    i + 1
                ));
            }
            let name = tokens[0].as_str();

            let output = match (&input, filters::is_filter(name)) {
                (Some(prev), true) => filters::apply(name, &tokens[1..], prev),
                _ => match self.dispatch_tokens(&tokens, session, depth) {
                    Ok(out) => out.text().to_string(),
                    Err(e) => {
                        return CommandOutput::Text(format!(
                            "Pipeline error at stage {}: {}",
                            i + 1,
                            e
                        ));
                    }
                },
            };
            input = Some(output);
        }

        match input {
            Some(text) if !text.is_empty() => CommandOutput::Text(text),
            _ => CommandOutput::None,
        }
    }

    /// `<command> > <target>`: run the command, write its output through
    /// the filesystem, acknowledge. The target is never dispatched.
    fn run_redirect(
        &self,
        command: &str,
        target: &str,
        append: bool,
        session: &mut Session,
        depth: usize,
    ) -> CommandOutput {
        if command.is_empty() || target.is_empty() {
            return CommandOutput::Text("shell: missing redirection target".to_string());
        }

        let result = self.dispatch_segment(command, session, depth);
        let text = result.text().to_string();

        let path = resolve_path(&session.cwd, &self.home(), target);
        let (parent, name) = vfs::split_parent(&path);

        let write_result = {
            let mut fs = self.vfs.borrow_mut();
            if append {
                let existing = match fs.read(&path) {
                    Ok(content) => Some(content),
                    Err(VfsError::NotFound) => None,
                    Err(e) => return CommandOutput::Text(format!("{}: error: {}", target, e)),
                };
                let combined = match existing {
                    Some(old) if !old.is_empty() => format!("{}\n{}", old, text),
                    _ => text,
                };
                fs.write(&parent, &name, &combined)
            } else {
                fs.write(&parent, &name, &text)
            }
        };

        match write_result {
            Ok(()) => CommandOutput::Text(format!(
                "{} to {}",
                if append { "appended" } else { "written" },
                target
            )),
            Err(e) => CommandOutput::Text(format!("{}: error: {}", target, e)),
        }
    }

    /// Fire-and-forget: acknowledge immediately, run the stripped command
    /// on the job executor. Output and failures go to the diagnostic
    /// channel only, never back to the issuing session.
    fn spawn_background(&self, stripped: &str, session: &Session) -> CommandOutput {
        let engine = self.clone();
        let line = stripped.to_string();
        let cwd = session.cwd.clone();
        let display = line.clone();

        self.jobs.spawn(async move {
            let mut scratch = Session::new(cwd);
            let out = engine.run_line(&line, &mut scratch, 0);
            match out {
                CommandOutput::Text(text) if !text.is_empty() => {
                    console_log!("[jobs] '{}' finished: {}", line, text)
                }
                _ => console_log!("[jobs] '{}' finished", line),
            }
        });

        CommandOutput::Text(format!("Started background process: {}", display))
    }

    /// `&&`/`||` chain, short-circuiting on the success heuristic. The
    /// result is the last executed segment's output.
    fn run_chain(
        &self,
        line: &str,
        op: ChainOp,
        session: &mut Session,
        depth: usize,
    ) -> CommandOutput {
        let segments = parser::split_chain(line, op);
        let mut last = CommandOutput::None;

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                let succeeded = last.is_success();
                match op {
                    ChainOp::And if !succeeded => break,
                    ChainOp::Or if succeeded => break,
                    _ => {}
                }
            }
            last = self.dispatch_segment(segment.trim(), session, depth);
        }
        last
    }

    /// Single command. Handler faults become text here, at the dispatcher
    /// boundary; nothing escapes to the caller.
    fn dispatch_segment(&self, segment: &str, session: &mut Session, depth: usize) -> CommandOutput {
        let tokens = parser::tokenize(segment);
        if tokens.is_empty() {
            return CommandOutput::None;
        }
        let name = tokens[0].clone();
        match self.dispatch_tokens(&tokens, session, depth) {
            Ok(out) => out,
            Err(e) => CommandOutput::Text(format!("Error executing '{}': {}", name, e)),
        }
    }

    /// Interpreter constructs first, then the registry. An unknown name is
    /// user-facing text, not a fault.
    fn dispatch_tokens(
        &self,
        tokens: &[String],
        session: &mut Session,
        depth: usize,
    ) -> Result<CommandOutput, ShellError> {
        match tokens[0].as_str() {
            "script" => return self.run_script(&tokens[1..], session, depth),
            "if" => return self.run_if(tokens, session, depth),
            "for" => return self.run_for(tokens, session, depth),
            _ => {}
        }

        let registry = self.registry.borrow();
        let Some(cmd) = registry.get(&tokens[0]) else {
            return Ok(CommandOutput::Text(format!(
                "Command '{}' not found. Type 'help' for available commands.",
                tokens[0]
            )));
        };

        let mut state = self.state.borrow_mut();
        let mut fs = self.vfs.borrow_mut();
        let mut ctx = Context {
            state: &mut state,
            vfs: &mut *fs,
            session,
            registry: &*registry,
            now_ms: self.clock.now_ms(),
            started_ms: self.started_ms,
        };
        cmd.run(&tokens[1..], &mut ctx)
    }

    fn home(&self) -> String {
        self.state
            .borrow()
            .vars
            .get("HOME")
            .unwrap_or("/home/user")
            .to_string()
    }

    /// `script <file>`: run each line of a file through the interpreter.
    fn run_script(
        &self,
        args: &[String],
        session: &mut Session,
        depth: usize,
    ) -> Result<CommandOutput, ShellError> {
        let Some(file) = args.first() else {
            return Ok(CommandOutput::Text(
                "script: missing operand\nUsage: script <file>".to_string(),
            ));
        };

        let path = resolve_path(&session.cwd, &self.home(), file);
        let content = {
            match self.vfs.borrow().read(&path) {
                Ok(content) => content,
                Err(e) => {
                    return Ok(CommandOutput::Text(format!("script: error: {}: {}", file, e)));
                }
            }
        };

        let mut outputs = Vec::new();
        for line in content.lines() {
            let out = self.run_line(line, session, depth + 1);
            let text = out.text();
            if !text.is_empty() {
                outputs.push(text.to_string());
            }
        }

        Ok(if outputs.is_empty() {
            CommandOutput::None
        } else {
            CommandOutput::Text(outputs.join("\n"))
        })
    }

    /// `if <condition> then <command> [else <command>]`, single-line form.
    /// The condition's own output is consumed, not displayed.
    fn run_if(
        &self,
        tokens: &[String],
        session: &mut Session,
        depth: usize,
    ) -> Result<CommandOutput, ShellError> {
        const USAGE: &str = "if: malformed conditional\nUsage: if <condition> then <command> [else <command>]";

        let Some(then_pos) = tokens.iter().position(|t| t == "then") else {
            return Ok(CommandOutput::Text(USAGE.to_string()));
        };
        if then_pos < 2 || then_pos + 1 >= tokens.len() {
            return Ok(CommandOutput::Text(USAGE.to_string()));
        }

        let condition = tokens[1..then_pos].join(" ");
        let else_pos = tokens.iter().position(|t| t == "else");
        let (then_branch, else_branch) = match else_pos {
            Some(pos) if pos > then_pos => (
                tokens[then_pos + 1..pos].join(" "),
                Some(tokens[pos + 1..].join(" ")),
            ),
            _ => (tokens[then_pos + 1..].join(" "), None),
        };

        let condition_result = self.run_line(&condition, session, depth + 1);
        let branch = if condition_result.is_success() {
            Some(then_branch)
        } else {
            else_branch
        };

        Ok(match branch {
            Some(body) if !body.trim().is_empty() => self.run_line(&body, session, depth + 1),
            _ => CommandOutput::None,
        })
    }

    /// `for NAME in <items...> do <command>`: sets NAME per iteration and
    /// relies on re-expansion of the body, restoring any prior value.
    fn run_for(
        &self,
        tokens: &[String],
        session: &mut Session,
        depth: usize,
    ) -> Result<CommandOutput, ShellError> {
        const USAGE: &str = "for: malformed loop\nUsage: for NAME in <items...> do <command>";

        if tokens.len() < 6 || tokens[2] != "in" {
            return Ok(CommandOutput::Text(USAGE.to_string()));
        }
        let name = &tokens[1];
        if !VariableStore::is_valid_name(name) {
            return Ok(CommandOutput::Text(format!(
                "for: invalid variable name: {}",
                name
            )));
        }
        let Some(do_pos) = tokens.iter().position(|t| t == "do") else {
            return Ok(CommandOutput::Text(USAGE.to_string()));
        };
        if do_pos <= 3 || do_pos + 1 >= tokens.len() {
            return Ok(CommandOutput::Text(USAGE.to_string()));
        }

        let items = &tokens[3..do_pos];
        let body = tokens[do_pos + 1..].join(" ");

        let prior = {
            let state = self.state.borrow();
            state.vars.get(name).map(|v| v.to_string())
        };

        let mut outputs = Vec::new();
        for item in items {
            self.state.borrow_mut().vars.upsert(name, item);
            let out = self.run_line(&body, session, depth + 1);
            let text = out.text();
            if !text.is_empty() {
                outputs.push(text.to_string());
            }
        }

        {
            let mut state = self.state.borrow_mut();
            match prior {
                Some(value) => state.vars.upsert(name, &value),
                None => state.vars.remove(name),
            }
        }

        Ok(if outputs.is_empty() {
            CommandOutput::None
        } else {
            CommandOutput::Text(outputs.join("\n"))
        })
    }
}
