//! Filesystem commands
//!
//! Every check (existence, type, permission) is delegated to the VFS
//! collaborator; its refusals come back as plain text, never as errors
//! crossing the dispatcher boundary.

use super::{fs_failure, usage_error};
use crate::shell::command::{Command, CommandOutput, Context, ShellError};
use crate::vfs::{self, Vfs, VfsError};

/// pwd - print the working directory
pub struct Pwd;

impl Command for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print the working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn run(&self, _args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        Ok(CommandOutput::Text(ctx.session.cwd.clone()))
    }
}

/// cd - change the working directory
///
/// Also updates the process-wide PWD/OLDPWD variables, so a second
/// terminal sees the move in its environment (though not in its own cwd).
pub struct Cd;

impl Command for Cd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change the working directory"
    }
    fn usage(&self) -> &str {
        "cd [directory]"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        if args.len() > 1 {
            return Ok(CommandOutput::Text("cd: too many arguments".to_string()));
        }

        let arg = args.first().map(|s| s.as_str()).unwrap_or("");
        let target = if arg == "-" {
            ctx.state
                .vars
                .get("OLDPWD")
                .unwrap_or("/home/user")
                .to_string()
        } else {
            ctx.resolve_path(arg)
        };

        let shown = if arg.is_empty() { target.as_str() } else { arg };
        match ctx.vfs.navigate_to(&target) {
            Ok(()) => {
                let old = std::mem::replace(&mut ctx.session.cwd, target.clone());
                ctx.state.vars.upsert("OLDPWD", &old);
                ctx.state.vars.upsert("PWD", &target);
                Ok(CommandOutput::None)
            }
            Err(VfsError::NotADirectory) => Ok(CommandOutput::Text(format!(
                "cd: {}: Not a directory",
                shown
            ))),
            Err(_) => Ok(CommandOutput::Text(format!(
                "cd: {}: No such file or directory",
                shown
            ))),
        }
    }
}

/// ls - list a directory
pub struct Ls;

impl Command for Ls {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [path]"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        // Flags like -la are accepted and ignored; the first non-flag
        // argument names the directory
        let arg = args
            .iter()
            .find(|a| !a.starts_with('-'))
            .map(|s| s.as_str());
        let path = match arg {
            Some(a) => ctx.resolve_path(a),
            None => ctx.session.cwd.clone(),
        };
        match ctx.vfs.list(&path) {
            Ok(entries) => {
                if entries.is_empty() {
                    return Ok(CommandOutput::None);
                }
                // The VFS already orders directories first, then by name
                let lines: Vec<String> = entries
                    .iter()
                    .map(|e| {
                        if e.is_dir {
                            format!("{}/", e.name)
                        } else {
                            e.name.clone()
                        }
                    })
                    .collect();
                Ok(CommandOutput::Text(lines.join("\n")))
            }
            Err(e) => Ok(fs_failure("ls", arg.unwrap_or(path.as_str()), e)),
        }
    }
}

/// cat - print file contents
pub struct Cat;

impl Command for Cat {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Print file contents"
    }
    fn usage(&self) -> &str {
        "cat <file>"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let Some(arg) = args.first() else {
            return Ok(usage_error("cat", "missing operand", self.usage()));
        };
        let path = ctx.resolve_path(arg);
        match ctx.vfs.read(&path) {
            Ok(content) => Ok(CommandOutput::Text(content)),
            Err(e) => Ok(fs_failure("cat", arg, e)),
        }
    }
}

/// mkdir - create a directory
pub struct Mkdir;

impl Command for Mkdir {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create a directory"
    }
    fn usage(&self) -> &str {
        "mkdir <directory_name>"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let Some(arg) = args.first() else {
            return Ok(usage_error("mkdir", "missing operand", self.usage()));
        };
        let path = ctx.resolve_path(arg);
        let (parent, name) = vfs::split_parent(&path);
        if name.is_empty() {
            return Ok(fs_failure("mkdir", arg, VfsError::AlreadyExists));
        }
        match ctx.vfs.create_dir(&parent, &name) {
            Ok(()) => Ok(CommandOutput::None),
            Err(e) => Ok(fs_failure("mkdir", arg, e)),
        }
    }
}

/// touch - create an empty file
pub struct Touch;

impl Command for Touch {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create an empty file"
    }
    fn usage(&self) -> &str {
        "touch <file>"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let Some(arg) = args.first() else {
            return Ok(usage_error("touch", "missing operand", self.usage()));
        };
        let path = ctx.resolve_path(arg);
        match ctx.vfs.resolve(&path) {
            Some(info) if info.is_dir => Ok(fs_failure("touch", arg, VfsError::IsADirectory)),
            // Existing file: nothing to do (no timestamps in this tree)
            Some(_) => Ok(CommandOutput::None),
            None => {
                let (parent, name) = vfs::split_parent(&path);
                match ctx.vfs.write(&parent, &name, "") {
                    Ok(()) => Ok(CommandOutput::None),
                    Err(e) => Ok(fs_failure("touch", arg, e)),
                }
            }
        }
    }
}

/// rm - remove files and directories
pub struct Rm;

impl Command for Rm {
    fn name(&self) -> &str {
        "rm"
    }
    fn description(&self) -> &str {
        "Remove a file or directory"
    }
    fn usage(&self) -> &str {
        "rm [-r] <name>"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let recursive = args.iter().any(|a| a == "-r" || a == "-rf");
        let targets: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
        if targets.is_empty() {
            return Ok(usage_error("rm", "missing operand", self.usage()));
        }

        for target in targets {
            let path = ctx.resolve_path(target);
            let result = if recursive {
                remove_tree(ctx.vfs, &path)
            } else {
                ctx.vfs.remove(&path)
            };
            if let Err(e) = result {
                return Ok(fs_failure("rm", target, e));
            }
        }
        Ok(CommandOutput::None)
    }
}

/// Depth-first removal of a whole subtree.
fn remove_tree(fs: &mut dyn Vfs, path: &str) -> Result<(), VfsError> {
    if let Ok(entries) = fs.list(path) {
        for entry in entries {
            remove_tree(fs, &vfs::join(path, &entry.name))?;
        }
    }
    fs.remove(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::command::CommandRegistry;
    use crate::shell::session::Session;
    use crate::shell::state::ShellState;
    use crate::vfs::MemoryFs;

    fn run_in(
        cmd: &dyn Command,
        args: &[&str],
        state: &mut ShellState,
        fs: &mut MemoryFs,
        session: &mut Session,
    ) -> CommandOutput {
        let registry = CommandRegistry::new();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut ctx = Context {
            state,
            vfs: fs,
            session,
            registry: &registry,
            now_ms: 0.0,
            started_ms: 0.0,
        };
        cmd.run(&args, &mut ctx).unwrap()
    }

    fn run(cmd: &dyn Command, args: &[&str]) -> (CommandOutput, Session, ShellState) {
        let mut state = ShellState::new();
        let mut fs = MemoryFs::new();
        let mut session = Session::new("/home/user");
        let out = run_in(cmd, args, &mut state, &mut fs, &mut session);
        (out, session, state)
    }

    // ============ pwd / cd ============

    #[test]
    fn test_pwd() {
        let (out, ..) = run(&Pwd, &[]);
        assert_eq!(out, CommandOutput::Text("/home/user".into()));
    }

    #[test]
    fn test_cd_into_subdir() {
        let (out, session, state) = run(&Cd, &["documents"]);
        assert_eq!(out, CommandOutput::None);
        assert_eq!(session.cwd, "/home/user/documents");
        assert_eq!(state.vars.get("PWD"), Some("/home/user/documents"));
        assert_eq!(state.vars.get("OLDPWD"), Some("/home/user"));
    }

    #[test]
    fn test_cd_missing_target() {
        let (out, session, _) = run(&Cd, &["nope"]);
        assert_eq!(
            out.text(),
            "cd: nope: No such file or directory"
        );
        assert_eq!(session.cwd, "/home/user");
    }

    #[test]
    fn test_cd_to_file_not_a_directory() {
        let (out, ..) = run(&Cd, &["notes.txt"]);
        assert_eq!(out.text(), "cd: notes.txt: Not a directory");
    }

    #[test]
    fn test_cd_no_args_goes_home() {
        let mut state = ShellState::new();
        let mut fs = MemoryFs::new();
        let mut session = Session::new("/etc");
        let out = run_in(&Cd, &[], &mut state, &mut fs, &mut session);
        assert_eq!(out, CommandOutput::None);
        assert_eq!(session.cwd, "/home/user");
    }

    #[test]
    fn test_cd_parent() {
        let (_, session, _) = run(&Cd, &[".."]);
        assert_eq!(session.cwd, "/home");
    }

    #[test]
    fn test_cd_too_many_args() {
        let (out, ..) = run(&Cd, &["a", "b"]);
        assert_eq!(out.text(), "cd: too many arguments");
    }

    // ============ ls ============

    #[test]
    fn test_ls_home_dirs_first() {
        let (out, ..) = run(&Ls, &[]);
        assert_eq!(out.text(), "documents/\nnotes.txt");
    }

    #[test]
    fn test_ls_missing_path() {
        let (out, ..) = run(&Ls, &["ghost"]);
        assert_eq!(out.text(), "ls: error: ghost: no such file or directory");
    }

    // ============ cat ============

    #[test]
    fn test_cat_reads_file() {
        let (out, ..) = run(&Cat, &["/etc/motd"]);
        assert!(out.text().contains("Welcome"));
    }

    #[test]
    fn test_cat_missing_operand() {
        let (out, ..) = run(&Cat, &[]);
        assert_eq!(out.text(), "cat: missing operand\nUsage: cat <file>");
    }

    #[test]
    fn test_cat_directory_refused() {
        let (out, ..) = run(&Cat, &["documents"]);
        assert_eq!(out.text(), "cat: error: documents: is a directory");
    }

    // ============ mkdir / touch / rm ============

    #[test]
    fn test_mkdir_creates_relative() {
        let mut state = ShellState::new();
        let mut fs = MemoryFs::new();
        let mut session = Session::new("/home/user");
        run_in(&Mkdir, &["projects"], &mut state, &mut fs, &mut session);
        assert_eq!(fs.navigate_to("/home/user/projects"), Ok(()));
    }

    #[test]
    fn test_mkdir_duplicate_is_error_text() {
        let mut state = ShellState::new();
        let mut fs = MemoryFs::new();
        let mut session = Session::new("/home/user");
        run_in(&Mkdir, &["projects"], &mut state, &mut fs, &mut session);
        let out = run_in(&Mkdir, &["projects"], &mut state, &mut fs, &mut session);
        assert_eq!(out.text(), "mkdir: error: projects: file exists");
        assert!(!out.is_success());
    }

    #[test]
    fn test_mkdir_missing_operand() {
        let (out, ..) = run(&Mkdir, &[]);
        assert_eq!(
            out.text(),
            "mkdir: missing operand\nUsage: mkdir <directory_name>"
        );
    }

    #[test]
    fn test_touch_creates_and_is_idempotent() {
        let mut state = ShellState::new();
        let mut fs = MemoryFs::new();
        let mut session = Session::new("/home/user");
        run_in(&Touch, &["new.txt"], &mut state, &mut fs, &mut session);
        assert_eq!(fs.read("/home/user/new.txt").unwrap(), "");
        let out = run_in(&Touch, &["new.txt"], &mut state, &mut fs, &mut session);
        assert_eq!(out, CommandOutput::None);
    }

    #[test]
    fn test_rm_file() {
        let mut state = ShellState::new();
        let mut fs = MemoryFs::new();
        let mut session = Session::new("/home/user");
        let out = run_in(&Rm, &["notes.txt"], &mut state, &mut fs, &mut session);
        assert_eq!(out, CommandOutput::None);
        assert!(fs.resolve("/home/user/notes.txt").is_none());
    }

    #[test]
    fn test_rm_populated_dir_needs_recursive() {
        let mut state = ShellState::new();
        let mut fs = MemoryFs::new();
        let mut session = Session::new("/home/user");
        let out = run_in(&Rm, &["documents"], &mut state, &mut fs, &mut session);
        assert_eq!(out.text(), "rm: error: documents: directory not empty");
        let out = run_in(&Rm, &["-r", "documents"], &mut state, &mut fs, &mut session);
        assert_eq!(out, CommandOutput::None);
        assert!(fs.resolve("/home/user/documents").is_none());
    }

    #[test]
    fn test_rm_permission_denied() {
        let (out, ..) = run(&Rm, &["/etc/motd"]);
        assert_eq!(out.text(), "rm: error: /etc/motd: permission denied");
    }
}
