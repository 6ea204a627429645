//! Command tree definition files.
//!
//! A definition describes the roots of a command-line program, their fields
//! and subcommands, and the reserved framework tokens, as JSON or YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! name: app
//! commands:
//!   - name: deploy
//!     fields:
//!       - ident: mode
//!         short: m
//!         enum: [dev, prod]
//!       - ident: service
//!         kind: positional
//!         required: true
//!     subcommands:
//!       - name: status
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reserved::ReservedTokens;
use crate::tree::{CommandBuilder, CommandTree, Registry};
use crate::types::FieldDescriptor;
use crate::validate::ValidationError;

/// Errors raised while loading a definition file.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The described tree is structurally invalid.
    #[error("invalid command tree: {0}")]
    Invalid(#[from] ValidationError),
}

/// Convenience alias for results with [`DefinitionError`].
pub type Result<T> = std::result::Result<T, DefinitionError>;

/// One command in a definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDefinition {
    /// Command name.
    pub name: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared fields in order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Nested subcommands.
    #[serde(default)]
    pub subcommands: Vec<CommandDefinition>,
}

impl CommandDefinition {
    fn to_builder(&self, source: &str) -> CommandBuilder {
        let mut builder = CommandBuilder::new(&self.name)
            .with_fields(self.fields.iter().cloned())
            .with_source(source);
        if let Some(desc) = &self.description {
            builder = builder.with_description(desc);
        }
        for sub in &self.subcommands {
            builder = builder.with_subcommand(sub.to_builder(source));
        }
        builder
    }
}

/// Top-level definition of a command-line program.
///
/// # Examples
///
/// ```
/// use command_grammar_core::TreeDefinition;
///
/// let def = TreeDefinition::from_yaml_str(
///     "name: app\ncommands:\n  - name: alpha\n  - name: beta\n",
/// )
/// .unwrap();
/// let tree = def.build().unwrap();
/// assert_eq!(tree.root_names(), vec!["alpha", "beta"]);
/// assert_eq!(def.reserved.reset, "^");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDefinition {
    /// Binary name shown in scripts and messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Reserved framework tokens.
    #[serde(default)]
    pub reserved: ReservedTokens,
    /// Root commands.
    pub commands: Vec<CommandDefinition>,
}

impl TreeDefinition {
    /// Loads a definition, choosing the format by file extension
    /// (`.json` is JSON, anything else is read as YAML).
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DefinitionError::IoError) if the file cannot be
    /// read, or a JSON/YAML error if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let definition = if is_json {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(definition)
    }

    /// Parses a JSON definition.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a YAML definition.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Registers every root command on a fresh [`Registry`].
    ///
    /// # Errors
    ///
    /// Returns [`Invalid`](DefinitionError::Invalid) on duplicate roots.
    pub fn to_registry(&self) -> Result<Registry> {
        let source = self.name.as_deref().unwrap_or("definition");
        let mut registry = Registry::new();
        for command in &self.commands {
            registry.register(command.to_builder(source))?;
        }
        Ok(registry)
    }

    /// Registers, validates, and resolves the command tree.
    pub fn build(&self) -> Result<CommandTree> {
        Ok(self.to_registry()?.resolve()?)
    }
}
