//! Expansion stage
//!
//! Runs on the raw line before any operator splitting: first `$VAR`
//! substitution, then alias resolution on the leading command token.
//! Both passes are single-shot: expanded text is never re-expanded and
//! aliases never resolve recursively.

use super::state::ShellState;
use once_cell::sync::Lazy;
use regex::Regex;

static VAR_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Z_][A-Z0-9_]*)").expect("variable reference pattern"));

/// Replace every `$NAME` reference with the variable's value. Undefined
/// names stay literal text; a lone `$` is left alone.
pub fn expand_variables(line: &str, state: &ShellState) -> String {
    VAR_REF_RE
        .replace_all(line, |caps: &regex::Captures<'_>| {
            match state.vars.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resolve the leading command token against the alias table. Only the
/// first token is alias-eligible; the rest of the line is carried over
/// verbatim.
pub fn resolve_alias(line: &str, state: &ShellState) -> String {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return line.to_string();
    }
    let end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let first = &trimmed[..end];

    match state.aliases.get(first) {
        Some(expansion) => {
            let rest = trimmed[end..].trim_start();
            if rest.is_empty() {
                expansion.to_string()
            } else {
                format!("{} {}", expansion, rest)
            }
        }
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ShellState {
        let mut state = ShellState::new();
        state.vars.upsert("GREETING", "hi");
        state.vars.upsert("SEP", "|");
        state.aliases.set("ll", "ls -la");
        state
    }

    // ============ variables ============

    #[test]
    fn test_expand_defined_variable() {
        let state = state();
        assert_eq!(
            expand_variables("echo $GREETING world", &state),
            "echo hi world"
        );
    }

    #[test]
    fn test_expand_builtin_variable() {
        let state = state();
        assert_eq!(expand_variables("echo $USER", &state), "echo user");
    }

    #[test]
    fn test_undefined_stays_literal() {
        let state = state();
        assert_eq!(expand_variables("echo $NOPE", &state), "echo $NOPE");
    }

    #[test]
    fn test_lowercase_is_not_a_reference() {
        let state = state();
        assert_eq!(expand_variables("echo $greeting", &state), "echo $greeting");
    }

    #[test]
    fn test_lone_dollar_untouched() {
        let state = state();
        assert_eq!(expand_variables("echo $ 5", &state), "echo $ 5");
    }

    #[test]
    fn test_multiple_references() {
        let state = state();
        assert_eq!(
            expand_variables("$GREETING $USER $GREETING", &state),
            "hi user hi"
        );
    }

    #[test]
    fn test_expansion_can_carry_operator_chars() {
        let state = state();
        assert_eq!(expand_variables(r#"echo "$SEP""#, &state), r#"echo "|""#);
    }

    #[test]
    fn test_longest_name_match() {
        let mut state = state();
        state.vars.upsert("AB", "short");
        state.vars.upsert("ABC", "long");
        assert_eq!(expand_variables("echo $ABC", &state), "echo long");
    }

    // ============ aliases ============

    #[test]
    fn test_alias_on_leading_token() {
        let state = state();
        assert_eq!(resolve_alias("ll", &state), "ls -la");
        assert_eq!(resolve_alias("ll /home", &state), "ls -la /home");
    }

    #[test]
    fn test_alias_not_in_argument_position() {
        let state = state();
        assert_eq!(resolve_alias("echo ll", &state), "echo ll");
    }

    #[test]
    fn test_no_alias_unchanged() {
        let state = state();
        assert_eq!(resolve_alias("ls -la", &state), "ls -la");
    }

    #[test]
    fn test_alias_keeps_quoted_args_verbatim() {
        let state = state();
        assert_eq!(
            resolve_alias(r#"ll "my file""#, &state),
            r#"ls -la "my file""#
        );
    }

    #[test]
    fn test_no_recursive_resolution() {
        let mut state = state();
        state.aliases.set("a", "b");
        state.aliases.set("b", "c");
        assert_eq!(resolve_alias("a", &state), "b");
    }
}
