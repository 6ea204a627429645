//! Spec collection.
//!
//! Turns the field descriptors of an active chain into flat lists of
//! [`FlagSpec`]s and, for the chain's terminal node, [`PositionalSpec`]s.
//! Embedded sub-records are flattened into their owner in declaration
//! order, and each command's [`FieldOptionsHook`] gets a chance to adjust
//! every field against the instance's current values.
//!
//! Specs are collected fresh for every parse attempt; collection is a pure
//! function of the tree and the instances passed in.
//!
//! [`FieldOptionsHook`]: command_grammar_core::FieldOptionsHook

use std::collections::BTreeSet;

use command_grammar_core::{
    CommandInstance, CommandNode, CommandTree, FieldDescriptor, FieldKind, FieldOptions, NodeId,
    ValueType,
};

use crate::bind::Target;
use crate::error::{GrammarError, Result};

/// A flag visible in the active chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Field identifier on the owning instance.
    pub ident: String,
    /// Index of the owning command in the chain (root is `0`).
    pub owner: usize,
    /// Long name without dashes.
    pub long: String,
    /// Short alias.
    pub short: Option<char>,
    pub value_type: ValueType,
    /// `false` for boolean switches.
    pub takes_value: bool,
    /// Collects every following non-flag token.
    pub variadic: bool,
    /// Allowed values; empty means unconstrained.
    pub enum_values: Vec<String>,
    pub required: bool,
    pub default: Option<String>,
    pub interleaved: bool,
}

impl FlagSpec {
    /// `--long`, the name used in messages.
    pub fn display_name(&self) -> String {
        format!("--{}", self.long)
    }

    pub(crate) fn target<'a>(&'a self, name: &'a str) -> Target<'a> {
        Target {
            ident: &self.ident,
            name,
            value_type: &self.value_type,
            interleaved: self.interleaved,
            positional: false,
        }
    }
}

/// A positional argument of the terminal command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSpec {
    /// Field identifier on the terminal instance.
    pub ident: String,
    /// Declared position, zero-based.
    pub index: usize,
    /// Display name: explicit name tag, else the field identifier.
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    /// Keeps accepting tokens until `--` or a flag-looking token.
    pub variadic: bool,
    pub enum_values: Vec<String>,
    pub default: Option<String>,
    pub interleaved: bool,
}

impl PositionalSpec {
    pub(crate) fn target(&self) -> Target<'_> {
        Target {
            ident: &self.ident,
            name: &self.name,
            value_type: &self.value_type,
            interleaved: self.interleaved,
            positional: true,
        }
    }
}

/// Flags of a whole chain plus every name they registered.
#[derive(Debug, Clone, Default)]
pub struct ChainFlags {
    /// Specs in chain order, root first, declaration order within a node.
    pub specs: Vec<FlagSpec>,
    /// `--long` and `-s` spellings claimed by the chain.
    pub used_names: BTreeSet<String>,
}

impl ChainFlags {
    /// Looks a flag up by long name (without dashes).
    pub fn by_long(&self, long: &str) -> Option<&FlagSpec> {
        self.specs.iter().find(|spec| spec.long == long)
    }

    /// Looks a flag up by short alias.
    pub fn by_short(&self, short: char) -> Option<&FlagSpec> {
        self.specs.iter().find(|spec| spec.short == Some(short))
    }

    /// Finds the spec for a field of a given chain member.
    pub fn by_field(&self, owner: usize, ident: &str) -> Option<&FlagSpec> {
        self.specs
            .iter()
            .find(|spec| spec.owner == owner && spec.ident == ident)
    }
}

fn options_for(
    node: &CommandNode,
    instance: &CommandInstance,
    field: &FieldDescriptor,
) -> Result<FieldOptions> {
    let defaults = field.default_options();
    match node.hook() {
        Some(hook) => hook
            .field_options(instance, &field.ident, defaults)
            .map_err(|message| GrammarError::FieldOptions {
                field: field.ident.clone(),
                message,
            }),
        None => Ok(defaults),
    }
}

/// Walks `fields` depth-first, flattening embedded records.
fn visit_fields<'f, F>(fields: &'f [FieldDescriptor], kind: FieldKind, visit: &mut F) -> Result<()>
where
    F: FnMut(&'f FieldDescriptor) -> Result<()>,
{
    for field in fields {
        if field.kind == FieldKind::Embedded {
            visit_fields(&field.fields, kind, visit)?;
        } else if field.kind == kind {
            visit(field)?;
        }
    }
    Ok(())
}

fn register(used: &mut BTreeSet<String>, name: String, field: &str) -> Result<()> {
    if used.insert(name.clone()) {
        Ok(())
    } else {
        Err(GrammarError::FlagAlreadyDefined {
            name,
            field: field.to_string(),
        })
    }
}

/// Collects the flags of every node in `chain`.
///
/// `instances` must be aligned with `chain`; each node's hook sees its own
/// instance.
///
/// # Errors
///
/// [`GrammarError::FlagAlreadyDefined`] when two fields in the chain claim
/// the same long or short spelling, or [`GrammarError::FieldOptions`] when a
/// hook fails.
pub fn collect_flags(
    tree: &CommandTree,
    chain: &[NodeId],
    instances: &[CommandInstance],
) -> Result<ChainFlags> {
    debug_assert_eq!(chain.len(), instances.len());
    let mut out = ChainFlags::default();

    for (owner, (id, instance)) in chain.iter().zip(instances).enumerate() {
        let node = tree.node(*id);
        visit_fields(&node.fields, FieldKind::Flag, &mut |field| {
            let options = options_for(node, instance, field)?;
            register(&mut out.used_names, format!("--{}", options.name), &field.ident)?;
            if let Some(short) = options.short {
                register(&mut out.used_names, format!("-{short}"), &field.ident)?;
            }

            out.specs.push(FlagSpec {
                ident: field.ident.clone(),
                owner,
                long: options.name,
                short: options.short,
                value_type: field.value_type.clone(),
                takes_value: field.value_type.takes_value(),
                variadic: field.value_type.is_variadic(),
                enum_values: options.enum_values,
                required: options.required,
                default: options.default,
                interleaved: field.interleaved,
            });
            Ok(())
        })?;
    }

    Ok(out)
}

/// Collects the positionals of the terminal node of a chain.
///
/// Positionals are never inherited from ancestors.
pub fn collect_positionals(
    tree: &CommandTree,
    node: NodeId,
    instance: &CommandInstance,
) -> Result<Vec<PositionalSpec>> {
    let node = tree.node(node);
    let mut out = Vec::new();

    visit_fields(&node.fields, FieldKind::Positional, &mut |field| {
        let options = options_for(node, instance, field)?;
        out.push(PositionalSpec {
            ident: field.ident.clone(),
            index: out.len(),
            name: options.name,
            value_type: field.value_type.clone(),
            required: options.required,
            variadic: field.value_type.is_variadic(),
            enum_values: options.enum_values,
            default: options.default,
            interleaved: field.interleaved,
        });
        Ok(())
    })?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use command_grammar_core::{CommandBuilder, FieldOptionsHook, Registry, Value};

    use super::*;

    struct RegionHook;

    impl FieldOptionsHook for RegionHook {
        fn field_options(
            &self,
            instance: &CommandInstance,
            ident: &str,
            mut options: FieldOptions,
        ) -> std::result::Result<FieldOptions, String> {
            match ident {
                "region" if instance.get_str("cloud") == Some("gcp") => {
                    options.enum_values = vec!["us-central1".into()];
                }
                "broken" => return Err("no options for you".into()),
                _ => {}
            }
            Ok(options)
        }
    }

    fn tree() -> CommandTree {
        let mut registry = Registry::new();
        registry
            .register(
                CommandBuilder::new("app")
                    .with_field(FieldDescriptor::flag("verbose", ValueType::Bool).short('v'))
                    .with_field(FieldDescriptor::embedded(
                        "output",
                        vec![
                            FieldDescriptor::flag("output_format", ValueType::String)
                                .short('o')
                                .one_of(["json", "text"]),
                            FieldDescriptor::flag("quiet", ValueType::Bool),
                        ],
                    ))
                    .with_field(FieldDescriptor::positional("ignored", ValueType::String))
                    .with_subcommand(
                        CommandBuilder::new("deploy")
                            .with_hook(Arc::new(RegionHook))
                            .with_field(FieldDescriptor::flag("cloud", ValueType::String))
                            .with_field(FieldDescriptor::flag("region", ValueType::String))
                            .with_field(
                                FieldDescriptor::positional("services", ValueType::List(Box::new(ValueType::String)))
                                    .named("SERVICE"),
                            ),
                    ),
            )
            .unwrap();
        registry.resolve().unwrap()
    }

    fn instances(tree: &CommandTree, chain: &[NodeId]) -> Vec<CommandInstance> {
        chain
            .iter()
            .map(|id| CommandInstance::new(*id, &tree.node(*id).name))
            .collect()
    }

    #[test]
    fn test_flags_are_flattened_in_declaration_order() {
        let tree = tree();
        let app = tree.roots()[0];
        let deploy = tree.subcommand(app, "deploy").unwrap();
        let chain = vec![app, deploy];

        let flags = collect_flags(&tree, &chain, &instances(&tree, &chain)).unwrap();
        let longs: Vec<&str> = flags.specs.iter().map(|s| s.long.as_str()).collect();
        assert_eq!(longs, vec!["verbose", "output-format", "quiet", "cloud", "region"]);

        let verbose = flags.by_short('v').unwrap();
        assert!(!verbose.takes_value);
        assert_eq!(verbose.owner, 0);
        assert_eq!(flags.by_long("region").unwrap().owner, 1);
        assert!(flags.used_names.contains("-o"));
        assert!(flags.used_names.contains("--output-format"));
    }

    #[test]
    fn test_positionals_come_from_terminal_only() {
        let tree = tree();
        let app = tree.roots()[0];
        let deploy = tree.subcommand(app, "deploy").unwrap();
        let instance = CommandInstance::new(deploy, "deploy");

        let positionals = collect_positionals(&tree, deploy, &instance).unwrap();
        assert_eq!(positionals.len(), 1);
        assert_eq!(positionals[0].name, "SERVICE");
        assert!(positionals[0].variadic);
    }

    #[test]
    fn test_hook_sees_bound_values() {
        let tree = tree();
        let app = tree.roots()[0];
        let deploy = tree.subcommand(app, "deploy").unwrap();
        let chain = vec![app, deploy];
        let mut insts = instances(&tree, &chain);

        let flags = collect_flags(&tree, &chain, &insts).unwrap();
        assert!(flags.by_long("region").unwrap().enum_values.is_empty());

        insts[1].set("cloud", Value::String("gcp".into()));
        let flags = collect_flags(&tree, &chain, &insts).unwrap();
        assert_eq!(flags.by_long("region").unwrap().enum_values, vec!["us-central1"]);
    }

    #[test]
    fn test_hook_failure_propagates() {
        let mut registry = Registry::new();
        registry
            .register(
                CommandBuilder::new("app")
                    .with_hook(Arc::new(RegionHook))
                    .with_field(FieldDescriptor::flag("broken", ValueType::Bool)),
            )
            .unwrap();
        let tree = registry.resolve().unwrap();
        let app = tree.roots()[0];
        let chain = vec![app];

        let err = collect_flags(&tree, &chain, &instances(&tree, &chain)).unwrap_err();
        assert_eq!(
            err,
            GrammarError::FieldOptions {
                field: "broken".to_string(),
                message: "no options for you".to_string(),
            }
        );
    }

    struct RenameHook;

    impl FieldOptionsHook for RenameHook {
        fn field_options(
            &self,
            _instance: &CommandInstance,
            ident: &str,
            mut options: FieldOptions,
        ) -> std::result::Result<FieldOptions, String> {
            if ident == "force" {
                options.name = "verbose".to_string();
            }
            Ok(options)
        }
    }

    #[test]
    fn test_collision_introduced_by_hook_is_an_error() {
        let mut registry = Registry::new();
        registry
            .register(
                CommandBuilder::new("app")
                    .with_field(FieldDescriptor::flag("verbose", ValueType::Bool))
                    .with_subcommand(
                        CommandBuilder::new("rm")
                            .with_hook(Arc::new(RenameHook))
                            .with_field(FieldDescriptor::flag("force", ValueType::Bool)),
                    ),
            )
            .unwrap();
        let tree = registry.resolve().unwrap();
        let app = tree.roots()[0];
        let rm = tree.subcommand(app, "rm").unwrap();
        let chain = vec![app, rm];

        let err = collect_flags(&tree, &chain, &instances(&tree, &chain)).unwrap_err();
        assert_eq!(
            err,
            GrammarError::FlagAlreadyDefined {
                name: "--verbose".to_string(),
                field: "force".to_string(),
            }
        );
    }
}
