//! Pipeline text filters
//!
//! The pipeline-aware variants of grep, sort, uniq, wc, head, and tail.
//! Each operates on a newline-separated text blob and returns the filtered
//! blob; the standalone commands read a file first and feed it through the
//! same functions, so filter behavior is identical in and out of a
//! pipeline.

use regex::RegexBuilder;

/// Is this command name a pipeline-aware filter?
pub fn is_filter(name: &str) -> bool {
    matches!(name, "grep" | "head" | "sort" | "tail" | "uniq" | "wc")
}

/// Apply a filter by name. Callers guarantee `is_filter(name)`.
pub fn apply(name: &str, args: &[String], input: &str) -> String {
    match name {
        "grep" => grep(args, input),
        "sort" => sort(args, input),
        "uniq" => uniq(args, input),
        "wc" => wc(args, input),
        "head" => head(args, input),
        "tail" => tail(args, input),
        other => format!("{}: not a filter", other),
    }
}

/// Keep lines matching the pattern, case-insensitive, order preserved.
/// The pattern is tried as a regex first; if it does not parse, it is
/// used as a plain substring.
fn grep(args: &[String], input: &str) -> String {
    let Some(pattern) = args.first() else {
        return "grep: missing pattern\nUsage: grep <pattern>".to_string();
    };

    let matcher = RegexBuilder::new(pattern).case_insensitive(true).build();
    let lowered = pattern.to_lowercase();

    let matches: Vec<&str> = input
        .lines()
        .filter(|line| match &matcher {
            Ok(re) => re.is_match(line),
            Err(_) => line.to_lowercase().contains(&lowered),
        })
        .collect();
    matches.join("\n")
}

/// Lexicographic line sort; `-r` reverses.
fn sort(args: &[String], input: &str) -> String {
    let reverse = args.iter().any(|a| a == "-r");
    let mut lines: Vec<&str> = input.lines().collect();
    lines.sort_unstable();
    if reverse {
        lines.reverse();
    }
    lines.join("\n")
}

/// Collapse adjacent duplicate lines; `-c` prefixes counts.
fn uniq(args: &[String], input: &str) -> String {
    let count = args.iter().any(|a| a == "-c");
    let mut out: Vec<String> = Vec::new();
    let mut prev: Option<&str> = None;
    let mut run = 0usize;

    for line in input.lines() {
        if Some(line) == prev {
            run += 1;
            continue;
        }
        if let Some(p) = prev {
            out.push(render_uniq(p, run, count));
        }
        prev = Some(line);
        run = 1;
    }
    if let Some(p) = prev {
        out.push(render_uniq(p, run, count));
    }
    out.join("\n")
}

fn render_uniq(line: &str, run: usize, count: bool) -> String {
    if count {
        format!("{:>4} {}", run, line)
    } else {
        line.to_string()
    }
}

/// `<lines> <words> <chars>`, or a single count with `-l`/`-w`/`-c`.
fn wc(args: &[String], input: &str) -> String {
    let lines = input.lines().count();
    let words = input.split_whitespace().count();
    let chars = input.len();

    if args.iter().any(|a| a == "-l") {
        lines.to_string()
    } else if args.iter().any(|a| a == "-w") {
        words.to_string()
    } else if args.iter().any(|a| a == "-c") {
        chars.to_string()
    } else {
        format!("{} {} {}", lines, words, chars)
    }
}

/// First N lines (default 10).
fn head(args: &[String], input: &str) -> String {
    let n = parse_count(args, 10);
    let lines: Vec<&str> = input.lines().take(n).collect();
    lines.join("\n")
}

/// Last N lines (default 10).
fn tail(args: &[String], input: &str) -> String {
    let n = parse_count(args, 10);
    let lines: Vec<&str> = input.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// `-n N` or `-nN`, falling back to the default on anything unparseable.
fn parse_count(args: &[String], default: usize) -> usize {
    let mut i = 0;
    while i < args.len() {
        if args[i] == "-n" && i + 1 < args.len() {
            return args[i + 1].parse().unwrap_or(default);
        }
        if let Some(rest) = args[i].strip_prefix("-n") {
            if !rest.is_empty() {
                return rest.parse().unwrap_or(default);
            }
        }
        i += 1;
    }
    default
}
