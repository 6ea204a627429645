//! Entry point tying a command tree to its reserved tokens.

use command_grammar_core::{CommandTree, ReservedTokens};

use crate::complete::complete;
use crate::error::Result;
use crate::parser::Strictness;
use crate::walk::{Invocation, walk};

/// Parser and completer for one command tree.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandBuilder, FieldDescriptor, Registry, ValueType};
/// use command_grammar_engine::Grammar;
///
/// let mut registry = Registry::new();
/// registry
///     .register(
///         CommandBuilder::new("app")
///             .with_field(FieldDescriptor::positional("args", ValueType::List(Box::new(ValueType::String))))
///             .with_field(FieldDescriptor::flag("flag", ValueType::String)),
///     )
///     .unwrap();
/// let tree = registry.resolve().unwrap();
/// let grammar = Grammar::new(&tree);
///
/// let runs = grammar.parse(&["a", "b", "--flag", "v"]).unwrap();
/// let app = runs[0].command().unwrap();
/// assert_eq!(app.get_list("args"), vec!["a", "b"]);
/// assert_eq!(app.get_str("flag"), Some("v"));
/// ```
#[derive(Debug, Clone)]
pub struct Grammar<'t> {
    tree: &'t CommandTree,
    reserved: ReservedTokens,
}

impl<'t> Grammar<'t> {
    /// Grammar over `tree` with the default reserved tokens.
    pub fn new(tree: &'t CommandTree) -> Self {
        Self {
            tree,
            reserved: ReservedTokens::default(),
        }
    }

    /// Replaces the reserved tokens.
    pub fn with_reserved(mut self, reserved: ReservedTokens) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn tree(&self) -> &CommandTree {
        self.tree
    }

    pub fn reserved(&self) -> &ReservedTokens {
        &self.reserved
    }

    /// Fully parses `args` (program name excluded, reserved flags already
    /// stripped) into the invocations to run, in order.
    ///
    /// An empty argument list against several roots selects nothing and
    /// yields no invocations.
    ///
    /// # Errors
    ///
    /// The first [`GrammarError`](crate::GrammarError) met while walking the
    /// chain, including missing required fields and enum violations.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<Invocation>> {
        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_string()).collect();
        let state = walk(self.tree, &args, &self.reserved.reset, Strictness::Strict)?;
        Ok(state.invocations)
    }

    /// Strips the reserved flags from `args`, then parses them.
    pub fn parse_process_args<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<Invocation>> {
        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_string()).collect();
        self.parse(&self.reserved.strip(&args))
    }

    /// Completion candidates for a command line including the program name.
    pub fn complete(&self, line: &str) -> Vec<String> {
        complete(self.tree, &self.reserved, line)
    }
}
