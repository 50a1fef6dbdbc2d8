//! Terminal session state
//!
//! One `Session` per terminal window, created and destroyed by the window
//! layer. The shell core reads and mutates it (working directory, output
//! log) but never owns its lifecycle. Several sessions may exist at once;
//! they all share the process-wide stores.

/// Per-terminal mutable state.
pub struct Session {
    /// Working directory, absolute
    pub cwd: String,
    /// Output log, one entry per line
    output: Vec<String>,
    /// Current input buffer (owned by the UI's input field)
    pub input: String,
    /// Set while a command is being processed
    pub processing: bool,
}

impl Session {
    pub fn new(cwd: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            output: Vec::new(),
            input: String::new(),
            processing: false,
        }
    }

    /// Append text to the output log, one entry per line.
    pub fn push_output(&mut self, text: &str) {
        if text.is_empty() {
            self.output.push(String::new());
            return;
        }
        for line in text.lines() {
            self.output.push(line.to_string());
        }
    }

    /// Erase the output log (the `clear` signal).
    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// The whole log joined with newlines.
    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_splits_lines() {
        let mut session = Session::new("/home/user");
        session.push_output("one\ntwo");
        session.push_output("three");
        assert_eq!(session.output(), &["one", "two", "three"]);
        assert_eq!(session.output_text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_push_empty_is_blank_line() {
        let mut session = Session::new("/");
        session.push_output("");
        assert_eq!(session.output(), &[""]);
    }

    #[test]
    fn test_clear() {
        let mut session = Session::new("/");
        session.push_output("x");
        session.clear_output();
        assert!(session.output().is_empty());
    }
}
