//! Process-wide shell stores: variables and aliases
//!
//! Both stores are created once at application start and shared by every
//! terminal session. Variable names follow the `[A-Z_][A-Z0-9_]*` shape;
//! a handful of built-ins are seeded at construction, some of them
//! readonly.

use super::history::History;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

static VAR_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("variable name pattern"));

static ALIAS_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("alias name pattern"));

/// Advisory value type attached to a shell variable. Not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Str,
    Num,
    Bool,
}

impl VarType {
    fn infer(value: &str) -> Self {
        if value.parse::<f64>().is_ok() {
            Self::Num
        } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            Self::Bool
        } else {
            Self::Str
        }
    }
}

/// A single shell variable.
#[derive(Debug, Clone)]
pub struct Variable {
    pub value: String,
    pub vtype: VarType,
    pub readonly: bool,
}

/// Why an `unset` was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsetError {
    NotFound,
    Readonly,
}

impl fmt::Display for UnsetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Readonly => write!(f, "readonly variable"),
        }
    }
}

/// Named shell variables, sorted by name.
pub struct VariableStore {
    vars: BTreeMap<String, Variable>,
}

impl VariableStore {
    /// Store seeded with the built-in environment. USER/HOME/PATH/SHELL are
    /// readonly; PWD/OLDPWD stay writable so directory changes can update
    /// them.
    pub fn new() -> Self {
        let mut store = Self {
            vars: BTreeMap::new(),
        };
        store.seed("USER", "user", true);
        store.seed("HOME", "/home/user", true);
        store.seed("PATH", "/bin:/usr/bin", true);
        store.seed("SHELL", "/bin/websh", true);
        store.seed("PWD", "/home/user", false);
        store.seed("OLDPWD", "/home/user", false);
        store
    }

    fn seed(&mut self, name: &str, value: &str, readonly: bool) {
        self.vars.insert(
            name.to_string(),
            Variable {
                value: value.to_string(),
                vtype: VarType::infer(value),
                readonly,
            },
        );
    }

    pub fn is_valid_name(name: &str) -> bool {
        VAR_NAME_RE.is_match(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|v| v.value.as_str())
    }

    pub fn get_var(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Insert or overwrite. `export` goes through here and always succeeds,
    /// readonly or not; an existing readonly flag is preserved.
    pub fn upsert(&mut self, name: &str, value: &str) {
        let readonly = self.vars.get(name).map(|v| v.readonly).unwrap_or(false);
        self.vars.insert(
            name.to_string(),
            Variable {
                value: value.to_string(),
                vtype: VarType::infer(value),
                readonly,
            },
        );
    }

    /// Remove a variable; refuses readonly and missing names.
    pub fn unset(&mut self, name: &str) -> Result<(), UnsetError> {
        match self.vars.get(name) {
            None => Err(UnsetError::NotFound),
            Some(var) if var.readonly => Err(UnsetError::Readonly),
            Some(_) => {
                self.vars.remove(name);
                Ok(())
            }
        }
    }

    /// Remove unconditionally (loop-variable restore), readonly included.
    pub(crate) fn remove(&mut self, name: &str) {
        self.vars.remove(name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Alias name -> expansion string, sorted by name.
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    pub fn is_valid_name(name: &str) -> bool {
        ALIAS_NAME_RE.is_match(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(|s| s.as_str())
    }

    /// Store an alias. Surrounding quote characters are the caller's
    /// business (stripped at definition time by the `alias` builtin).
    pub fn set(&mut self, name: &str, expansion: &str) {
        self.aliases
            .insert(name.to_string(), expansion.to_string());
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.aliases.remove(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide mutable shell state: variables, aliases, history.
pub struct ShellState {
    pub vars: VariableStore,
    pub aliases: AliasTable,
    pub history: History,
}

impl ShellState {
    pub fn new() -> Self {
        Self {
            vars: VariableStore::new(),
            aliases: AliasTable::new(),
            history: History::new(),
        }
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}
