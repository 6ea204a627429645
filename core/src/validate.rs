//! Command tree validation.
//!
//! Catches construction-time problems before a tree is handed to the
//! grammar: empty or malformed names, duplicate roots, subcommands and
//! fields, invalid short aliases, and flag names that collide anywhere along
//! a root-to-leaf chain.
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::*;
//!
//! let ok = CommandBuilder::new("app")
//!     .with_field(FieldDescriptor::flag("verbose", ValueType::Bool).short('v'));
//! assert!(validate_commands(&[ok]).is_empty());
//!
//! // `-v` declared on the root and again on a subcommand
//! let bad = CommandBuilder::new("app")
//!     .with_field(FieldDescriptor::flag("verbose", ValueType::Bool).short('v'))
//!     .with_subcommand(
//!         CommandBuilder::new("run")
//!             .with_field(FieldDescriptor::flag("version", ValueType::Bool).short('v')),
//!     );
//! assert!(!validate_commands(&[bad]).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::tree::CommandBuilder;
use crate::types::{FieldDescriptor, FieldKind};

/// Tree validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Command name would be read as a flag or split by the shell.
    #[error("invalid command name: {0}")]
    InvalidCommandName(String),
    /// Two roots share a name (ignoring ASCII case).
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// Two subcommands of the same command share a name.
    #[error("duplicate subcommand in scope: {0}")]
    DuplicateSubcommand(String),
    /// A field has no identifier.
    #[error("field identifier cannot be empty")]
    EmptyFieldIdent,
    /// Two fields of one command (after flattening) share an identifier.
    #[error("duplicate field in command {command}: {field}")]
    DuplicateField { command: String, field: String },
    /// Short alias is not a single ASCII letter or digit.
    #[error("invalid short flag for field {field}: {short:?}")]
    InvalidShortFlag { field: String, short: char },
    /// Long name is empty, dashed, or contains `=` or whitespace.
    #[error("invalid long flag for field {field}: {name:?}")]
    InvalidLongFlag { field: String, name: String },
    /// A flag name is declared twice along one command chain.
    #[error("duplicate flag {name} in chain {path}")]
    DuplicateFlag { name: String, path: String },
}

/// Validates a set of root commands.
///
/// Stops at the first problem, like the rest of the crate's validators, and
/// returns it as a single-element vector; an empty vector means the set is
/// valid.
pub fn validate_commands(roots: &[CommandBuilder]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for root in roots {
        if !seen.insert(root.name().to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateCommand(root.name().to_string()));
            return errors;
        }

        let mut path = Vec::new();
        let mut used = HashSet::new();
        errors.extend(validate_command(root, &mut path, &mut used));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_command(
    command: &CommandBuilder,
    path: &mut Vec<String>,
    used: &mut HashSet<String>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let name = command.name();
    if name.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return errors;
    }
    if name.starts_with('-') || name.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidCommandName(name.to_string()));
        return errors;
    }

    path.push(name.to_string());

    let mut idents = HashSet::new();
    let mut added = Vec::new();
    if let Err(err) = validate_fields(command.fields(), path, &mut idents, used, &mut added) {
        errors.push(err);
        path.pop();
        return errors;
    }

    let mut seen_subcommands = HashSet::new();
    for sub in command.subcommands() {
        if !seen_subcommands.insert(sub.name()) {
            errors.push(ValidationError::DuplicateSubcommand(sub.name().to_string()));
            break;
        }
        errors.extend(validate_command(sub, path, used));
        if !errors.is_empty() {
            break;
        }
    }

    // Names are only reserved for descendants; siblings may reuse them.
    for name in added {
        used.remove(&name);
    }
    path.pop();
    errors
}

fn validate_fields(
    fields: &[FieldDescriptor],
    path: &[String],
    idents: &mut HashSet<String>,
    used: &mut HashSet<String>,
    added: &mut Vec<String>,
) -> Result<(), ValidationError> {
    for field in fields {
        if field.ident.trim().is_empty() {
            return Err(ValidationError::EmptyFieldIdent);
        }

        if field.kind == FieldKind::Embedded {
            validate_fields(&field.fields, path, idents, used, added)?;
            continue;
        }

        if !idents.insert(field.ident.clone()) {
            return Err(ValidationError::DuplicateField {
                command: path.join(" "),
                field: field.ident.clone(),
            });
        }

        if field.kind != FieldKind::Flag {
            continue;
        }

        let options = field.default_options();
        if options.name.is_empty()
            || options.name.starts_with('-')
            || options.name.contains('=')
            || options.name.chars().any(char::is_whitespace)
        {
            return Err(ValidationError::InvalidLongFlag {
                field: field.ident.clone(),
                name: options.name,
            });
        }

        let mut names = vec![format!("--{}", options.name)];
        if let Some(short) = options.short {
            if !short.is_ascii_alphanumeric() {
                return Err(ValidationError::InvalidShortFlag {
                    field: field.ident.clone(),
                    short,
                });
            }
            names.push(format!("-{short}"));
        }

        for name in names {
            if !used.insert(name.clone()) {
                return Err(ValidationError::DuplicateFlag {
                    name,
                    path: path.join(" "),
                });
            }
            added.push(name);
        }
    }
    Ok(())
}
