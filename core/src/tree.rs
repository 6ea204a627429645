//! Command tree and registry.
//!
//! Commands are described with [`CommandBuilder`]s and registered on an
//! explicitly owned [`Registry`]. Resolving the registry validates it and
//! lays every node out in a flat arena ([`CommandTree`]), with parent and
//! subcommand links stored as [`NodeId`] indices.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{FieldDescriptor, FieldOptionsHook};
use crate::validate::{ValidationError, validate_commands};

/// Index of a node in a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Wraps a raw arena index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One command or subcommand in a resolved tree.
pub struct CommandNode {
    /// Command name as typed on the command line.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Declared fields in order.
    pub fields: Vec<FieldDescriptor>,
    /// Subcommands by name.
    pub subcommands: BTreeMap<String, NodeId>,
    /// Parent command; `None` for roots.
    pub parent: Option<NodeId>,
    /// Where the command was registered from (help/listing only).
    pub source: Option<String>,
    hook: Option<Arc<dyn FieldOptionsHook>>,
}

impl CommandNode {
    /// Override capability, if the command provides one.
    pub fn hook(&self) -> Option<&dyn FieldOptionsHook> {
        self.hook.as_deref()
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .field("subcommands", &self.subcommands)
            .field("parent", &self.parent)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Immutable arena of command nodes.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandBuilder, Registry};
///
/// let mut registry = Registry::new();
/// registry
///     .register(CommandBuilder::new("git").with_subcommand(CommandBuilder::new("commit")))
///     .unwrap();
/// let tree = registry.resolve().unwrap();
///
/// let git = tree.find_root("GIT").unwrap();
/// let commit = tree.subcommand(git, "commit").unwrap();
/// assert_eq!(tree.chain_to(commit), vec![git, commit]);
/// assert_eq!(tree.parent(commit), Some(git));
/// ```
#[derive(Debug, Default)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    roots: Vec<NodeId>,
}

impl CommandTree {
    /// Returns the node behind `id`.
    ///
    /// Ids are only minted by the tree itself, so lookups cannot miss.
    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    /// Root commands in registration order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Root command names in registration order.
    pub fn root_names(&self) -> Vec<&str> {
        self.roots
            .iter()
            .map(|id| self.node(*id).name.as_str())
            .collect()
    }

    /// Finds a root by name, ignoring ASCII case.
    pub fn find_root(&self, name: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.node(*id).name.eq_ignore_ascii_case(name))
    }

    /// Finds a direct subcommand of `id` by exact name.
    pub fn subcommand(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id).subcommands.get(name).copied()
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Whether `id` is a registered root.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).parent.is_none()
    }

    /// Ancestors of `id` followed by `id` itself, root first.
    pub fn chain_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no command was registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, builder: &CommandBuilder, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode {
            name: builder.name.clone(),
            description: builder.description.clone(),
            fields: builder.fields.clone(),
            subcommands: BTreeMap::new(),
            parent,
            source: builder.source.clone(),
            hook: builder.hook.clone(),
        });

        for sub in &builder.subcommands {
            let child = self.push(sub, Some(id));
            self.nodes[id.0].subcommands.insert(sub.name.clone(), child);
        }
        id
    }
}

/// Registration-side description of a command and its subcommands.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandBuilder, FieldDescriptor, ValueType};
///
/// let deploy = CommandBuilder::new("deploy")
///     .with_description("Deploy a service")
///     .with_field(FieldDescriptor::flag("mode", ValueType::String).short('m'))
///     .with_field(FieldDescriptor::positional("service", ValueType::String).required())
///     .with_subcommand(CommandBuilder::new("status"));
///
/// assert_eq!(deploy.name(), "deploy");
/// assert_eq!(deploy.subcommands().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct CommandBuilder {
    name: String,
    description: Option<String>,
    fields: Vec<FieldDescriptor>,
    subcommands: Vec<CommandBuilder>,
    source: Option<String>,
    hook: Option<Arc<dyn FieldOptionsHook>>,
}

impl CommandBuilder {
    /// Creates a command with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends several fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Adds a subcommand.
    pub fn with_subcommand(mut self, sub: CommandBuilder) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Records where the command came from.
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Installs a per-instance override hook.
    pub fn with_hook(mut self, hook: Arc<dyn FieldOptionsHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Declared subcommands.
    pub fn subcommands(&self) -> &[CommandBuilder] {
        &self.subcommands
    }
}

impl fmt::Debug for CommandBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuilder")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("subcommands", &self.subcommands)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Explicitly owned set of root commands.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandBuilder, Registry, ValidationError};
///
/// let mut registry = Registry::new();
/// registry.register(CommandBuilder::new("alpha")).unwrap();
/// registry.register(CommandBuilder::new("beta")).unwrap();
///
/// let err = registry.register(CommandBuilder::new("Alpha")).unwrap_err();
/// assert_eq!(err, ValidationError::DuplicateCommand("Alpha".into()));
///
/// assert!(registry.deregister("beta").is_some());
/// let tree = registry.resolve().unwrap();
/// assert_eq!(tree.root_names(), vec!["alpha"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    roots: Vec<CommandBuilder>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a root command.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateCommand`] if a root with the same
    /// name (ignoring ASCII case) is already registered.
    pub fn register(&mut self, command: CommandBuilder) -> Result<(), ValidationError> {
        if self
            .roots
            .iter()
            .any(|root| root.name.eq_ignore_ascii_case(&command.name))
        {
            return Err(ValidationError::DuplicateCommand(command.name.clone()));
        }
        self.roots.push(command);
        Ok(())
    }

    /// Removes a root command by name, returning it.
    pub fn deregister(&mut self, name: &str) -> Option<CommandBuilder> {
        let index = self
            .roots
            .iter()
            .position(|root| root.name.eq_ignore_ascii_case(name))?;
        Some(self.roots.remove(index))
    }

    /// Registered roots in order.
    pub fn commands(&self) -> &[CommandBuilder] {
        &self.roots
    }

    /// Validates the registered commands and builds the immutable tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn resolve(&self) -> Result<CommandTree, ValidationError> {
        if let Some(err) = validate_commands(&self.roots).into_iter().next() {
            return Err(err);
        }

        let mut tree = CommandTree::default();
        for root in &self.roots {
            let id = tree.push(root, None);
            tree.roots.push(id);
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    fn sample_registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(
                CommandBuilder::new("cloud")
                    .with_field(FieldDescriptor::flag("verbose", ValueType::Bool).short('v'))
                    .with_subcommand(
                        CommandBuilder::new("vm")
                            .with_subcommand(CommandBuilder::new("start"))
                            .with_subcommand(CommandBuilder::new("stop")),
                    )
                    .with_subcommand(CommandBuilder::new("dns")),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_resolve_links_parents_and_children() {
        let tree = sample_registry().resolve().unwrap();
        assert_eq!(tree.len(), 5);

        let cloud = tree.roots()[0];
        let vm = tree.subcommand(cloud, "vm").unwrap();
        let start = tree.subcommand(vm, "start").unwrap();

        assert!(tree.is_root(cloud));
        assert!(!tree.is_root(vm));
        assert_eq!(tree.parent(start), Some(vm));
        assert_eq!(tree.chain_to(start), vec![cloud, vm, start]);
        assert_eq!(tree.node(start).name, "start");
    }

    #[test]
    fn test_subcommands_are_sorted_by_name() {
        let tree = sample_registry().resolve().unwrap();
        let cloud = tree.roots()[0];
        let names: Vec<&str> = tree
            .node(cloud)
            .subcommands
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["dns", "vm"]);
    }

    #[test]
    fn test_find_root_ignores_case() {
        let tree = sample_registry().resolve().unwrap();
        assert!(tree.find_root("Cloud").is_some());
        assert!(tree.find_root("cloudy").is_none());
    }

    #[test]
    fn test_deregister_unknown_returns_none() {
        let mut registry = sample_registry();
        assert!(registry.deregister("missing").is_none());
        assert_eq!(registry.commands().len(), 1);
    }
}
