//! Text-processing commands
//!
//! Standalone forms of the pipeline filters. Each reads the named file (if
//! any) through the VFS and feeds it to the shared filter in
//! [`crate::shell::filters`], so `sort notes.txt` and `cat notes.txt | sort`
//! agree on semantics.

use super::fs_failure;
use crate::shell::command::{Command, CommandOutput, Context, ShellError};
use crate::shell::filters;

/// grep - search for a pattern in a file
pub struct Grep;

impl Command for Grep {
    fn name(&self) -> &str {
        "grep"
    }
    fn description(&self) -> &str {
        "Search for a pattern"
    }
    fn usage(&self) -> &str {
        "grep <pattern> [file]"
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        // First non-flag argument is the pattern, second names a file
        let mut flags: Vec<String> = Vec::new();
        let mut positional: Vec<&String> = Vec::new();
        for arg in args {
            if arg.starts_with('-') {
                flags.push(arg.clone());
            } else {
                positional.push(arg);
            }
        }

        let input = match positional.get(1) {
            Some(file) => {
                let path = ctx.resolve_path(file);
                match ctx.vfs.read(&path) {
                    Ok(content) => content,
                    Err(e) => return Ok(fs_failure("grep", file, e)),
                }
            }
            None => String::new(),
        };

        let mut filter_args: Vec<String> = Vec::new();
        if let Some(pattern) = positional.first() {
            filter_args.push((*pattern).clone());
        }
        filter_args.extend(flags);

        Ok(CommandOutput::Text(filters::apply(
            "grep",
            &filter_args,
            &input,
        )))
    }
}

/// Standalone form of a file-or-nothing filter (sort, uniq, wc, head, tail).
pub struct FilterCommand {
    name: &'static str,
    description: &'static str,
    usage: &'static str,
}

impl FilterCommand {
    pub const fn new(name: &'static str, description: &'static str, usage: &'static str) -> Self {
        Self {
            name,
            description,
            usage,
        }
    }
}

impl Command for FilterCommand {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        self.description
    }
    fn usage(&self) -> &str {
        self.usage
    }
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<CommandOutput, ShellError> {
        let (flags, file) = split_file_arg(args);
        let input = match file {
            Some(file) => {
                let path = ctx.resolve_path(&file);
                match ctx.vfs.read(&path) {
                    Ok(content) => content,
                    Err(e) => return Ok(fs_failure(self.name, &file, e)),
                }
            }
            None => String::new(),
        };
        Ok(CommandOutput::Text(filters::apply(
            self.name, &flags, &input,
        )))
    }
}

/// Separate flags (with their `-n N` operand) from the single file operand.
fn split_file_arg(args: &[String]) -> (Vec<String>, Option<String>) {
    let mut flags = Vec::new();
    let mut file = None;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];
        if arg == "-n" && i + 1 < args.len() {
            flags.push(arg.clone());
            flags.push(args[i + 1].clone());
            i += 2;
            continue;
        }
        if arg.starts_with('-') {
            flags.push(arg.clone());
        } else if file.is_none() {
            file = Some(arg.clone());
        }
        i += 1;
    }
    (flags, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::command::CommandRegistry;
    use crate::shell::session::Session;
    use crate::shell::state::ShellState;
    use crate::vfs::{MemoryFs, Vfs};

    fn run_on(cmd: &dyn Command, args: &[&str], fs: &mut MemoryFs) -> CommandOutput {
        let registry = CommandRegistry::new();
        let mut state = ShellState::new();
        let mut session = Session::new("/home/user");
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut ctx = Context {
            state: &mut state,
            vfs: fs,
            session: &mut session,
            registry: &registry,
            now_ms: 0.0,
            started_ms: 0.0,
        };
        cmd.run(&args, &mut ctx).unwrap()
    }

    #[test]
    fn test_grep_reads_file() {
        let mut fs = MemoryFs::new();
        fs.write("/home/user", "fruit.txt", "apple\nbanana\napricot")
            .unwrap();
        let out = run_on(&Grep, &["ap", "fruit.txt"], &mut fs);
        assert_eq!(out.text(), "apple\napricot");
    }

    #[test]
    fn test_grep_missing_file() {
        let mut fs = MemoryFs::new();
        let out = run_on(&Grep, &["x", "ghost.txt"], &mut fs);
        assert_eq!(out.text(), "grep: error: ghost.txt: no such file or directory");
    }

    #[test]
    fn test_sort_reads_file() {
        let mut fs = MemoryFs::new();
        fs.write("/home/user", "l.txt", "b\na\nc").unwrap();
        let sort = FilterCommand::new("sort", "", "sort [-r] [file]");
        let out = run_on(&sort, &["l.txt"], &mut fs);
        assert_eq!(out.text(), "a\nb\nc");
        let out = run_on(&sort, &["-r", "l.txt"], &mut fs);
        assert_eq!(out.text(), "c\nb\na");
    }

    #[test]
    fn test_wc_counts_file_lines() {
        let mut fs = MemoryFs::new();
        fs.write("/home/user", "l.txt", "a\nb\nc").unwrap();
        let wc = FilterCommand::new("wc", "", "wc [-l|-w|-c] [file]");
        let out = run_on(&wc, &["-l", "l.txt"], &mut fs);
        assert_eq!(out.text(), "3");
    }

    #[test]
    fn test_head_with_count_and_file() {
        let mut fs = MemoryFs::new();
        fs.write("/home/user", "l.txt", "1\n2\n3\n4\n5").unwrap();
        let head = FilterCommand::new("head", "", "head [-n N] [file]");
        let out = run_on(&head, &["-n", "2", "l.txt"], &mut fs);
        assert_eq!(out.text(), "1\n2");
    }

    #[test]
    fn test_split_file_arg() {
        let args: Vec<String> = ["-n", "3", "file.txt"].iter().map(|s| s.to_string()).collect();
        let (flags, file) = split_file_arg(&args);
        assert_eq!(flags, vec!["-n", "3"]);
        assert_eq!(file, Some("file.txt".to_string()));
    }

    #[test]
    fn test_split_file_arg_count_not_taken_as_file() {
        let args: Vec<String> = ["file.txt", "-r"].iter().map(|s| s.to_string()).collect();
        let (flags, file) = split_file_arg(&args);
        assert_eq!(flags, vec!["-r"]);
        assert_eq!(file, Some("file.txt".to_string()));
    }
}
