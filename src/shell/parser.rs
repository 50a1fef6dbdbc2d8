//! Command line parser
//!
//! Two jobs, both string-level and quote-aware:
//! - tokenize a command segment into words (quotes group, quote characters
//!   are dropped, an unterminated quote leniently runs to end of line);
//! - locate top-level shell operators (`|`, `>`, `>>`, `&&`, `||`, trailing
//!   `&`) so the interpreter can split before dispatch. Operators inside
//!   quotes are plain text, which is what lets a variable expansion inject
//!   a `|` into an argument without creating a pipeline.

/// Split a raw segment into tokens.
///
/// Whitespace outside quotes separates tokens; `'` and `"` toggle an
/// in-quote mode whose content is taken verbatim. Quotes may sit mid-word
/// (`foo"bar"` is one token `foobar`). Blank input gives an empty list.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                in_token = true;
                // Consume to the matching quote; an unterminated quote
                // consumes to end of string, by design.
                for q in chars.by_ref() {
                    if q == c {
                        break;
                    }
                    current.push(q);
                }
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            other => {
                in_token = true;
                current.push(other);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Conditional chain flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOp {
    And,
    Or,
}

/// Byte offsets of every occurrence of `op` outside quotes.
fn top_level_positions(line: &str, op: &str) -> Vec<usize> {
    let bytes = line.as_bytes();
    let op_bytes = op.as_bytes();
    let mut positions = Vec::new();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'\'' || b == b'"' {
                    quote = Some(b);
                } else if bytes[i..].starts_with(op_bytes) {
                    positions.push(i);
                    i += op_bytes.len();
                    continue;
                }
            }
        }
        i += 1;
    }
    positions
}

/// Cut `line` at the given operator offsets.
fn split_at(line: &str, positions: &[usize], width: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut start = 0;
    for &pos in positions {
        segments.push(line[start..pos].to_string());
        start = pos + width;
    }
    segments.push(line[start..].to_string());
    segments
}

/// Offsets of single pipes: `|` that is not half of a `||`.
fn pipe_positions(line: &str) -> Vec<usize> {
    let bytes = line.as_bytes();
    top_level_positions(line, "|")
        .into_iter()
        .filter(|&i| {
            let next_is_pipe = bytes.get(i + 1) == Some(&b'|');
            let prev_is_pipe = i > 0 && bytes[i - 1] == b'|';
            !next_is_pipe && !prev_is_pipe
        })
        .collect()
}

/// Does the line contain a top-level pipeline operator?
pub fn has_pipe(line: &str) -> bool {
    !pipe_positions(line).is_empty()
}

/// Split a pipeline into stage segments (untrimmed).
pub fn split_pipes(line: &str) -> Vec<String> {
    split_at(line, &pipe_positions(line), 1)
}

/// Match `<command> (> | >>) <target>` at the first top-level `>`.
/// Returns (command, target, append).
pub fn find_redirect(line: &str) -> Option<(String, String, bool)> {
    let positions = top_level_positions(line, ">");
    let &pos = positions.first()?;
    let append = line.as_bytes().get(pos + 1) == Some(&b'>');
    let command = line[..pos].trim().to_string();
    let target = line[pos + if append { 2 } else { 1 }..].trim().to_string();
    Some((command, target, append))
}

/// A trailing top-level `&` (not `&&`) marks background execution.
/// Returns the line with the marker stripped.
pub fn strip_background(line: &str) -> Option<String> {
    let trimmed = line.trim_end();
    if !trimmed.ends_with('&') || trimmed.ends_with("&&") {
        return None;
    }
    let pos = trimmed.len() - 1;
    if !top_level_positions(trimmed, "&").contains(&pos) {
        return None;
    }
    Some(trimmed[..pos].trim_end().to_string())
}

/// Which chain operator governs this line. When both appear, whichever
/// comes first in the string wins and the whole chain uses its semantics.
pub fn find_chain(line: &str) -> Option<ChainOp> {
    let and = top_level_positions(line, "&&").first().copied();
    let or = top_level_positions(line, "||").first().copied();
    match (and, or) {
        (Some(a), Some(o)) => Some(if a < o { ChainOp::And } else { ChainOp::Or }),
        (Some(_), None) => Some(ChainOp::And),
        (None, Some(_)) => Some(ChainOp::Or),
        (None, None) => None,
    }
}

/// Split a chain into its segments (untrimmed).
pub fn split_chain(line: &str, op: ChainOp) -> Vec<String> {
    let token = match op {
        ChainOp::And => "&&",
        ChainOp::Or => "||",
    };
    split_at(line, &top_level_positions(line, token), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line)
    }

    // ============ tokenize ============

    #[test]
    fn test_simple_tokens() {
        assert_eq!(toks("ls -la /home"), vec!["ls", "-la", "/home"]);
    }

    #[test]
    fn test_blank_input_empty_list() {
        assert!(toks("").is_empty());
        assert!(toks("   \t ").is_empty());
    }

    #[test]
    fn test_extra_whitespace() {
        assert_eq!(toks("  echo   hi  "), vec!["echo", "hi"]);
    }

    #[test]
    fn test_double_quotes_group() {
        assert_eq!(toks(r#"echo "hello world""#), vec!["echo", "hello world"]);
    }

    #[test]
    fn test_single_quotes_group() {
        assert_eq!(toks("echo 'a b c'"), vec!["echo", "a b c"]);
    }

    #[test]
    fn test_quote_chars_dropped() {
        assert_eq!(toks(r#"echo "hi""#), vec!["echo", "hi"]);
    }

    #[test]
    fn test_mid_word_quotes_concatenate() {
        assert_eq!(toks(r#"echo foo"bar"baz"#), vec!["echo", "foobarbaz"]);
    }

    #[test]
    fn test_operators_inside_quotes_are_text() {
        assert_eq!(toks(r#"echo "a | b && c""#), vec!["echo", "a | b && c"]);
    }

    #[test]
    fn test_unterminated_quote_consumes_to_end() {
        // Leniency, not an error
        assert_eq!(toks(r#"echo "hello"#), vec!["echo", "hello"]);
        assert_eq!(toks("echo 'a b"), vec!["echo", "a b"]);
    }

    #[test]
    fn test_empty_quoted_token() {
        assert_eq!(toks(r#"echo """#), vec!["echo", ""]);
    }

    #[test]
    fn test_other_quote_kind_is_literal() {
        assert_eq!(toks(r#"echo "it's""#), vec!["echo", "it's"]);
    }

    // ============ pipes ============

    #[test]
    fn test_has_pipe() {
        assert!(has_pipe("a | b"));
        assert!(has_pipe("a|b"));
        assert!(!has_pipe("a b"));
    }

    #[test]
    fn test_double_pipe_is_not_a_pipeline() {
        assert!(!has_pipe("a || b"));
    }

    #[test]
    fn test_mixed_single_and_double_pipe() {
        assert!(has_pipe("a | b || c"));
    }

    #[test]
    fn test_pipe_in_quotes_ignored() {
        assert!(!has_pipe(r#"echo "a | b""#));
        assert!(!has_pipe("echo '|'"));
    }

    #[test]
    fn test_split_pipes() {
        assert_eq!(split_pipes("a | b | c"), vec!["a ", " b ", " c"]);
    }

    #[test]
    fn test_split_pipes_keeps_quoted_pipe() {
        let segments = split_pipes(r#"echo "x|y" | wc"#);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].trim(), r#"echo "x|y""#);
    }

    // ============ redirect ============

    #[test]
    fn test_find_redirect_write() {
        let (cmd, target, append) = find_redirect("echo hi > out.txt").unwrap();
        assert_eq!(cmd, "echo hi");
        assert_eq!(target, "out.txt");
        assert!(!append);
    }

    #[test]
    fn test_find_redirect_append() {
        let (cmd, target, append) = find_redirect("echo hi >> out.txt").unwrap();
        assert_eq!(cmd, "echo hi");
        assert_eq!(target, "out.txt");
        assert!(append);
    }

    #[test]
    fn test_find_redirect_no_spaces() {
        let (cmd, target, append) = find_redirect("echo hi>out.txt").unwrap();
        assert_eq!(cmd, "echo hi");
        assert_eq!(target, "out.txt");
        assert!(!append);
    }

    #[test]
    fn test_redirect_in_quotes_ignored() {
        assert!(find_redirect(r#"echo "a > b""#).is_none());
    }

    #[test]
    fn test_no_redirect() {
        assert!(find_redirect("echo hi").is_none());
    }

    // ============ background ============

    #[test]
    fn test_strip_background() {
        assert_eq!(strip_background("sleep 10 &").unwrap(), "sleep 10");
        assert_eq!(strip_background("sleep 10&").unwrap(), "sleep 10");
    }

    #[test]
    fn test_double_ampersand_is_not_background() {
        assert!(strip_background("a && b").is_none());
        assert!(strip_background("a &&").is_none());
    }

    #[test]
    fn test_no_trailing_ampersand() {
        assert!(strip_background("echo hi").is_none());
        assert!(strip_background("a & b").is_none());
    }

    // ============ chains ============

    #[test]
    fn test_find_chain_and() {
        assert_eq!(find_chain("a && b"), Some(ChainOp::And));
    }

    #[test]
    fn test_find_chain_or() {
        assert_eq!(find_chain("a || b"), Some(ChainOp::Or));
    }

    #[test]
    fn test_find_chain_none() {
        assert_eq!(find_chain("a b c"), None);
    }

    #[test]
    fn test_mixed_chain_first_operator_wins() {
        assert_eq!(find_chain("a && b || c"), Some(ChainOp::And));
        assert_eq!(find_chain("a || b && c"), Some(ChainOp::Or));
    }

    #[test]
    fn test_chain_in_quotes_ignored() {
        assert_eq!(find_chain(r#"echo "a && b""#), None);
    }

    #[test]
    fn test_split_chain() {
        assert_eq!(
            split_chain("a && b && c", ChainOp::And),
            vec!["a ", " b ", " c"]
        );
    }

    #[test]
    fn test_split_chain_keeps_other_operator_inline() {
        // first-operator-wins: the || stays inside a segment
        assert_eq!(
            split_chain("a && b || c", ChainOp::And),
            vec!["a ", " b || c"]
        );
    }
}
