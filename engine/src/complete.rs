//! Completion resolver.
//!
//! Walks the processed part of a command line leniently, then offers the
//! tokens that may legally follow, filtered by the word under the cursor.
//! Completion never fails: a line the grammar rejects yields no suggestions.

use std::collections::HashSet;

use command_grammar_core::{CommandTree, ReservedFlag, ReservedTokens};
use tracing::debug;

use crate::collect::{collect_flags, collect_positionals};
use crate::parser::{Dispatch, Strictness};
use crate::tokenize::{Tokens, tokenize};
use crate::walk::{Walk, WalkEnd, walk};

/// Ordered, de-duplicated candidates matching a prefix.
struct Suggestions<'p> {
    prefix: &'p str,
    seen: HashSet<String>,
    out: Vec<String>,
}

impl<'p> Suggestions<'p> {
    fn new(prefix: &'p str) -> Self {
        Self {
            prefix,
            seen: HashSet::new(),
            out: Vec::new(),
        }
    }

    fn offer(&mut self, candidate: &str) {
        if candidate.starts_with(self.prefix) && self.seen.insert(candidate.to_string()) {
            self.out.push(candidate.to_string());
        }
    }

    fn offer_all<I, S>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for candidate in candidates {
            self.offer(candidate.as_ref());
        }
    }

    fn offer_flags(&mut self, flags: &[ReservedFlag]) {
        for flag in flags {
            self.offer_all(flag.spellings());
        }
    }

    fn typing_flag(&self) -> bool {
        self.prefix.starts_with('-')
    }
}

/// Suggests completions for `line`, a full command line including the
/// program name.
///
/// The last token is the word being completed unless the line ends on
/// whitespace, in which case a new empty word is completed.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandBuilder, FieldDescriptor, Registry, ReservedTokens, ValueType};
/// use command_grammar_engine::complete;
///
/// let mut registry = Registry::new();
/// registry
///     .register(
///         CommandBuilder::new("app").with_field(
///             FieldDescriptor::flag("mode", ValueType::String)
///                 .short('m')
///                 .one_of(["dev", "prod"]),
///         ),
///     )
///     .unwrap();
/// let tree = registry.resolve().unwrap();
/// let reserved = ReservedTokens::default();
///
/// assert_eq!(complete(&tree, &reserved, "app --mode "), vec!["dev", "prod"]);
/// assert_eq!(complete(&tree, &reserved, "app -m p"), vec!["prod"]);
/// ```
pub fn complete(tree: &CommandTree, reserved: &ReservedTokens, line: &str) -> Vec<String> {
    let Tokens {
        tokens,
        ends_on_boundary,
    } = tokenize(line);

    let Some((_, args)) = tokens.split_first() else {
        return Vec::new();
    };
    if args.is_empty() && !ends_on_boundary {
        return Vec::new();
    }

    let (prefix, processed) = match args.split_last() {
        Some((last, rest)) if !ends_on_boundary => (last.as_str(), rest),
        _ => ("", args),
    };
    let processed = reserved.strip(processed);

    let state = match walk(tree, &processed, &reserved.reset, Strictness::Lenient) {
        Ok(state) => state,
        Err(err) => {
            debug!(error = %err, "completion parse failed, no suggestions");
            return Vec::new();
        }
    };

    let mut suggestions = Suggestions::new(prefix);
    match &state.end {
        WalkEnd::AwaitingRoot(token) => suggest_roots(tree, reserved, token.as_deref(), &mut suggestions),
        WalkEnd::Resolved | WalkEnd::Halted => suggest_in_context(tree, reserved, &state, &mut suggestions),
    }
    suggestions.out
}

/// Root selection with several roots.
fn suggest_roots(
    tree: &CommandTree,
    reserved: &ReservedTokens,
    token: Option<&str>,
    suggestions: &mut Suggestions<'_>,
) {
    match token {
        None => {
            suggestions.offer_all(tree.root_names());
            suggestions.offer_flags(&reserved.global_flags);
            suggestions.offer_flags(&reserved.root_flags);
        }
        Some(token) => {
            let token = token.to_ascii_lowercase();
            suggestions.offer_all(
                tree.root_names()
                    .into_iter()
                    .filter(|name| name.to_ascii_lowercase().starts_with(&token)),
            );
        }
    }
}

fn suggest_in_context(
    tree: &CommandTree,
    reserved: &ReservedTokens,
    state: &Walk,
    suggestions: &mut Suggestions<'_>,
) {
    let Some(current) = state.current() else {
        return;
    };
    let at_root = state.at_root();

    // a dangling enum flag only accepts its own values
    let awaiting_value = state.tail.pending.is_some();
    if let Some(pending) = &state.tail.pending {
        if !suggestions.typing_flag() && !pending.enum_values.is_empty() {
            suggestions.offer_all(&pending.enum_values);
            return;
        }
    }

    // a free-form value or another flag may follow a dangling flag
    if !awaiting_value {
        if at_root && tree.roots().len() == 1 && state.dispatch == Dispatch::Implicit {
            suggestions.offer(&tree.node(current).name);
        }

        suggestions.offer_all(tree.node(current).subcommands.keys());

        if state.chain.len() >= 2 {
            let parent = state.chain[state.chain.len() - 2];
            suggestions.offer_all(tree.node(parent).subcommands.keys());
        }

        if !at_root {
            suggestions.offer(&reserved.reset);
        }
    }

    if suggestions.prefix.is_empty() || suggestions.typing_flag() {
        match collect_flags(tree, &state.chain, &state.instances) {
            Ok(flags) => {
                for spec in &flags.specs {
                    suggestions.offer(&spec.display_name());
                    if let Some(short) = spec.short {
                        suggestions.offer(&format!("-{short}"));
                    }
                }
            }
            Err(err) => {
                debug!(error = %err, "flag collection failed, no suggestions");
                return;
            }
        }
        suggestions.offer_flags(&reserved.global_flags);
        if at_root {
            suggestions.offer_flags(&reserved.root_flags);
        }
    }

    if suggestions.typing_flag() || awaiting_value {
        return;
    }

    let terminal = state.chain.len() - 1;
    match collect_positionals(tree, current, &state.instances[terminal]) {
        Ok(positionals) => {
            if let Some(spec) = positionals.get(state.tail.positional) {
                if !spec.enum_values.is_empty() {
                    suggestions.offer_all(&spec.enum_values);
                    return;
                }
            }
        }
        Err(err) => {
            debug!(error = %err, "positional collection failed, no suggestions");
            return;
        }
    }

    if tree.roots().len() > 1 && state.positionals_complete {
        suggestions.offer_all(tree.root_names());
    }
}
