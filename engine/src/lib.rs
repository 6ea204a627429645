//! Parsing and shell completion for declarative command grammars.
//!
//! One token-classification algorithm backs two interpreters:
//!
//! - [`Grammar::parse`] turns a complete argument vector into
//!   [`Invocation`]s, enforcing required fields and enum sets.
//! - [`Grammar::complete`] walks an in-progress command line leniently and
//!   lists the tokens that may follow. It never fails; input the grammar
//!   rejects simply produces no suggestions.
//!
//! The building blocks are public for callers that drive the grammar
//! themselves: [`tokenize`], the spec collector ([`collect_flags`],
//! [`collect_positionals`]) and the single-node parser ([`parse_node`]).
//!
//! # Example
//!
//! ```
//! use command_grammar_core::{CommandBuilder, Registry};
//! use command_grammar_engine::Grammar;
//!
//! let mut registry = Registry::new();
//! registry.register(CommandBuilder::new("alpha")).unwrap();
//! registry.register(CommandBuilder::new("beta")).unwrap();
//! let tree = registry.resolve().unwrap();
//! let grammar = Grammar::new(&tree);
//!
//! let runs = grammar.parse(&["alpha", "beta"]).unwrap();
//! assert_eq!(runs.len(), 2);
//!
//! let next = grammar.complete("app alpha beta ");
//! assert!(next.contains(&"alpha".to_string()));
//! assert!(next.contains(&"beta".to_string()));
//! ```

mod bind;
mod collect;
mod complete;
mod error;
mod grammar;
mod parser;
mod tokenize;
mod walk;

pub use collect::{ChainFlags, FlagSpec, PositionalSpec, collect_flags, collect_positionals};
pub use complete::complete;
pub use error::{GrammarError, Result};
pub use grammar::Grammar;
pub use parser::{
    Dispatch, NodeParse, NodeRequest, PendingFlag, Step, Strictness, Tail, check_enums,
    looks_like_flag, parse_node,
};
pub use tokenize::{Tokens, tokenize};
pub use walk::Invocation;
