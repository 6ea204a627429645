//! Schema model for declarative command grammars.
//!
//! This crate defines what the grammar engine consumes:
//!
//! - [`FieldDescriptor`]: one declared field of a command record (flag,
//!   positional, or embedded sub-record) with its name, short alias, enum
//!   constraint, required flag, default, and value type.
//! - [`CommandInstance`]: the values bound for one command during a parse.
//! - [`FieldOptionsHook`]: optional per-instance override of field options.
//! - [`CommandTree`]: an immutable arena of commands with [`NodeId`]-based
//!   parent and subcommand links, produced by resolving a [`Registry`].
//! - [`ReservedTokens`]: framework-owned global flags and the root reset
//!   operator.
//! - [`TreeDefinition`]: a JSON/YAML description of a whole program.
//!
//! Validation ([`validate_commands`]) rejects empty names, duplicate roots,
//! subcommands, and fields, and flag names colliding along a command chain.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         CommandBuilder::new("app")
//!             .with_field(FieldDescriptor::flag("verbose", ValueType::Bool).short('v'))
//!             .with_subcommand(
//!                 CommandBuilder::new("run")
//!                     .with_field(FieldDescriptor::positional("script", ValueType::String).required()),
//!             ),
//!     )
//!     .unwrap();
//!
//! let tree = registry.resolve().unwrap();
//! let app = tree.find_root("app").unwrap();
//! assert!(tree.subcommand(app, "run").is_some());
//! ```

mod definition;
mod reserved;
mod tree;
mod types;
mod validate;

pub use definition::{CommandDefinition, DefinitionError, TreeDefinition};
pub use reserved::{ReservedFlag, ReservedTokens};
pub use tree::{CommandBuilder, CommandNode, CommandTree, NodeId, Registry};
pub use types::*;
pub use validate::{ValidationError, validate_commands};
