//! Framework-reserved tokens.
//!
//! Global flags such as `--help` or `--timeout` are consumed by an outer
//! layer before any command's own schema sees the arguments. They are still
//! offered as completions, so the grammar needs to know about them.

use serde::{Deserialize, Serialize};

/// A flag owned by the framework rather than by a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedFlag {
    /// Long name without dashes.
    pub long: String,
    /// Short alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Whether the flag consumes the next token.
    #[serde(default)]
    pub takes_value: bool,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReservedFlag {
    /// Creates a reserved switch.
    pub fn switch(long: &str, short: Option<char>) -> Self {
        Self {
            long: long.to_string(),
            short,
            takes_value: false,
            description: None,
        }
    }

    /// Creates a reserved flag that takes a value.
    pub fn valued(long: &str, short: Option<char>) -> Self {
        Self {
            takes_value: true,
            ..Self::switch(long, short)
        }
    }

    /// Returns `true` if `token` names this flag, with or without an
    /// inline `=value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_core::ReservedFlag;
    ///
    /// let timeout = ReservedFlag::valued("timeout", Some('t'));
    /// assert!(timeout.matches("--timeout"));
    /// assert!(timeout.matches("--timeout=5s"));
    /// assert!(timeout.matches("-t"));
    /// assert!(!timeout.matches("--timeouts"));
    /// ```
    pub fn matches(&self, token: &str) -> bool {
        if let Some(body) = token.strip_prefix("--") {
            let name = body.split_once('=').map_or(body, |(name, _)| name);
            return name == self.long;
        }
        if let Some(body) = token.strip_prefix('-') {
            let name = body.split_once('=').map_or(body, |(name, _)| name);
            let mut chars = name.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c) == self.short,
                _ => false,
            };
        }
        false
    }

    /// Completion candidates for this flag: long form, then short form.
    pub fn spellings(&self) -> Vec<String> {
        let mut out = vec![format!("--{}", self.long)];
        if let Some(short) = self.short {
            out.push(format!("-{short}"));
        }
        out
    }
}

fn default_reset() -> String {
    "^".to_string()
}

/// Reserved global flags, root-only flags, and the root reset operator.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ReservedTokens;
///
/// let reserved = ReservedTokens::default();
/// assert_eq!(reserved.reset, "^");
/// assert!(reserved.global_flags.iter().any(|f| f.long == "help"));
/// assert!(reserved.root_flags.iter().any(|f| f.long == "version"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedTokens {
    /// Flags accepted anywhere on the line.
    #[serde(default)]
    pub global_flags: Vec<ReservedFlag>,
    /// Flags only offered while still at a root.
    #[serde(default)]
    pub root_flags: Vec<ReservedFlag>,
    /// Token returning chain resolution to root selection.
    #[serde(default = "default_reset")]
    pub reset: String,
}

impl Default for ReservedTokens {
    fn default() -> Self {
        Self {
            global_flags: vec![
                ReservedFlag::switch("help", Some('h')),
                ReservedFlag::valued("timeout", None),
            ],
            root_flags: vec![
                ReservedFlag::switch("version", None),
                ReservedFlag::switch("list", None),
            ],
            reset: default_reset(),
        }
    }
}

impl ReservedTokens {
    /// Reserved set without any flags, keeping only the reset operator.
    pub fn none() -> Self {
        Self {
            global_flags: Vec::new(),
            root_flags: Vec::new(),
            reset: default_reset(),
        }
    }

    /// Finds the reserved flag named by `token`, global flags first.
    pub fn find(&self, token: &str) -> Option<&ReservedFlag> {
        self.global_flags
            .iter()
            .chain(self.root_flags.iter())
            .find(|flag| flag.matches(token))
    }

    /// Removes reserved flags, and the values they take, from `args`.
    ///
    /// Global flags are removed anywhere. Root-only flags are removed only
    /// before the first non-flag token, since past that point the same
    /// spelling may belong to a command.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_core::ReservedTokens;
    ///
    /// let reserved = ReservedTokens::default();
    /// let args: Vec<String> = ["--timeout", "5s", "build", "-h", "--list"]
    ///     .iter()
    ///     .map(|s| s.to_string())
    ///     .collect();
    /// assert_eq!(reserved.strip(&args), vec!["build", "--list"]);
    /// ```
    pub fn strip(&self, args: &[String]) -> Vec<String> {
        let mut kept = Vec::with_capacity(args.len());
        let mut at_root = true;
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let flag = self
                .global_flags
                .iter()
                .find(|flag| flag.matches(arg))
                .or_else(|| {
                    if at_root {
                        self.root_flags.iter().find(|flag| flag.matches(arg))
                    } else {
                        None
                    }
                });

            match flag {
                Some(flag) => {
                    if flag.takes_value && !arg.contains('=') {
                        iter.next();
                    }
                }
                None => {
                    if !arg.starts_with('-') {
                        at_root = false;
                    }
                    kept.push(arg.clone());
                }
            }
        }
        kept
    }
}
