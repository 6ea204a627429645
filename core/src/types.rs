//! Field descriptors, bound values, and command instances.
//!
//! A command is described to the grammar as an ordered list of
//! [`FieldDescriptor`]s, the same information a derive macro or a builder
//! would extract from a command record. Parsing produces a
//! [`CommandInstance`] holding the bound [`Value`]s keyed by field
//! identifier.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::NodeId;

/// Value type of a field.
///
/// Determines whether a flag takes a value (everything but [`Bool`]) and
/// whether it is variadic ([`List`]).
///
/// [`Bool`]: ValueType::Bool
/// [`List`]: ValueType::List
///
/// # Examples
///
/// ```
/// use command_grammar_core::ValueType;
///
/// assert!(!ValueType::Bool.takes_value());
/// assert!(ValueType::Int.takes_value());
/// assert!(ValueType::List(Box::new(ValueType::String)).is_variadic());
/// assert!(!ValueType::Map.is_variadic());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Switch; set to `true` when present.
    Bool,
    /// Free-form text (the default).
    #[default]
    String,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating point number.
    Float,
    /// Multi-value container collecting every bound value in order.
    List(Box<ValueType>),
    /// `key=value` pairs, one per occurrence.
    Map,
    /// A type the schema extractor knows about but the grammar has no binder for.
    Other(String),
}

impl ValueType {
    /// Returns `true` unless this is a boolean switch.
    pub fn takes_value(&self) -> bool {
        !matches!(self, ValueType::Bool)
    }

    /// Returns `true` for multi-value containers.
    pub fn is_variadic(&self) -> bool {
        matches!(self, ValueType::List(_))
    }

    /// Short human-readable name, used in error messages.
    pub fn label(&self) -> String {
        match self {
            ValueType::Bool => "bool".to_string(),
            ValueType::String => "string".to_string(),
            ValueType::Int => "int".to_string(),
            ValueType::Uint => "uint".to_string(),
            ValueType::Float => "float".to_string(),
            ValueType::List(inner) => format!("list<{}>", inner.label()),
            ValueType::Map => "map".to_string(),
            ValueType::Other(name) => name.clone(),
        }
    }
}

/// How a field participates in the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Named, order-independent argument (`--name` / `-n`).
    #[default]
    Flag,
    /// Order-dependent argument bound by position.
    Positional,
    /// Anonymous sub-record whose fields are flattened into the owner.
    Embedded,
}

/// One declared field of a command record.
///
/// This is the boundary with schema extraction: the grammar never inspects
/// types at runtime, only this descriptor list.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{FieldDescriptor, FieldKind, ValueType};
///
/// let mode = FieldDescriptor::flag("mode", ValueType::String)
///     .short('m')
///     .one_of(["dev", "prod"]);
/// assert_eq!(mode.kind, FieldKind::Flag);
/// assert_eq!(mode.default_options().name, "mode");
/// assert_eq!(mode.default_options().enum_values, vec!["dev", "prod"]);
///
/// let target = FieldDescriptor::positional("target", ValueType::String)
///     .named("TARGET")
///     .required();
/// assert_eq!(target.default_options().name, "TARGET");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field identifier as declared on the record (e.g. `dry_run`).
    pub ident: String,
    /// Flag, positional, or embedded sub-record.
    #[serde(default)]
    pub kind: FieldKind,
    /// Value type; determines takes-value and variadic behavior.
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
    /// Explicit long name (flags) or display name (positionals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Single-letter alias for flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Closed set of allowed values.
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    /// Must be supplied on a terminal parse.
    #[serde(default)]
    pub required: bool,
    /// Default value in textual form, converted like user input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Record the argument position of every bound value.
    #[serde(default)]
    pub interleaved: bool,
    /// Help text; unused by parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields of an embedded sub-record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
}

impl FieldDescriptor {
    fn with_kind(ident: &str, kind: FieldKind, value_type: ValueType) -> Self {
        Self {
            ident: ident.to_string(),
            kind,
            value_type,
            name: None,
            short: None,
            enum_values: Vec::new(),
            required: false,
            default: None,
            interleaved: false,
            description: None,
            fields: Vec::new(),
        }
    }

    /// Creates a flag field.
    pub fn flag(ident: &str, value_type: ValueType) -> Self {
        Self::with_kind(ident, FieldKind::Flag, value_type)
    }

    /// Creates a positional field.
    pub fn positional(ident: &str, value_type: ValueType) -> Self {
        Self::with_kind(ident, FieldKind::Positional, value_type)
    }

    /// Creates an embedded sub-record whose fields are flattened into the owner.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_core::{FieldDescriptor, ValueType};
    ///
    /// let common = FieldDescriptor::embedded("common", vec![
    ///     FieldDescriptor::flag("verbose", ValueType::Bool).short('v'),
    /// ]);
    /// assert_eq!(common.fields.len(), 1);
    /// ```
    pub fn embedded(ident: &str, fields: Vec<FieldDescriptor>) -> Self {
        let mut field = Self::with_kind(ident, FieldKind::Embedded, ValueType::String);
        field.fields = fields;
        field
    }

    /// Sets an explicit long name or positional display name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the short alias.
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Restricts the field to a closed set of values.
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the textual default value.
    pub fn default_value(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }

    /// Stamps bound values with their argument position.
    pub fn interleaved(mut self) -> Self {
        self.interleaved = true;
        self
    }

    /// Adds help text.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Options derived from the declaration alone, before any override hook.
    ///
    /// Flags without an explicit name get the kebab-cased identifier;
    /// positionals fall back to the bare identifier.
    pub fn default_options(&self) -> FieldOptions {
        let name = match (&self.name, self.kind) {
            (Some(name), _) => name.clone(),
            (None, FieldKind::Flag) => kebab_case(&self.ident),
            (None, _) => self.ident.clone(),
        };
        FieldOptions {
            name,
            short: self.short,
            enum_values: self.enum_values.clone(),
            required: self.required,
            default: self.default.clone(),
        }
    }
}

/// Adjustable options of a field.
///
/// Passed through [`FieldOptionsHook::field_options`] so a command can
/// rename a field, change its enum set, or alter its default based on
/// values already bound on the instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldOptions {
    /// Long flag name (without dashes) or positional display name.
    pub name: String,
    /// Short alias.
    pub short: Option<char>,
    /// Allowed values; empty means unconstrained.
    pub enum_values: Vec<String>,
    /// Required on a terminal parse.
    pub required: bool,
    /// Textual default.
    pub default: Option<String>,
}

/// Per-instance override capability.
///
/// A command node may carry one of these. It is consulted once per field
/// every time specs are collected for a chain containing the node.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandInstance, FieldOptions, FieldOptionsHook, Value};
///
/// struct RegionsByCloud;
///
/// impl FieldOptionsHook for RegionsByCloud {
///     fn field_options(
///         &self,
///         instance: &CommandInstance,
///         ident: &str,
///         mut options: FieldOptions,
///     ) -> Result<FieldOptions, String> {
///         if ident == "region" && instance.get_str("cloud") == Some("gcp") {
///             options.enum_values = vec!["us-central1".into(), "europe-west1".into()];
///         }
///         Ok(options)
///     }
/// }
/// ```
pub trait FieldOptionsHook: Send + Sync {
    /// Returns the adjusted options for `ident`, or an error message.
    fn field_options(
        &self,
        instance: &CommandInstance,
        ident: &str,
        options: FieldOptions,
    ) -> Result<FieldOptions, String>;
}

/// A bound field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
            Value::Map(entries) => {
                let parts: Vec<String> = entries.iter().map(|(k, v)| format!("{k}={v}")).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

/// A value of an interleaved field together with its argument position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterleavedValue {
    /// Zero-based position in the (short-group expanded) argument vector.
    pub position: usize,
    /// Field identifier.
    pub field: String,
    /// The single value bound at that position.
    pub value: Value,
}

/// Populated values of one command in a resolved chain.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandInstance, NodeId, Value};
///
/// let mut instance = CommandInstance::new(NodeId::new(0), "deploy");
/// instance.set("mode", Value::String("prod".into()));
/// assert_eq!(instance.get_str("mode"), Some("prod"));
/// assert!(instance.is_explicit("mode"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandInstance {
    #[serde(skip)]
    node: NodeId,
    /// Name of the command this instance belongs to.
    pub command: String,
    values: BTreeMap<String, Value>,
    #[serde(skip)]
    explicit: BTreeSet<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    interleaved: Vec<InterleavedValue>,
}

impl CommandInstance {
    /// Creates an empty instance for `node`.
    pub fn new(node: NodeId, command: &str) -> Self {
        Self {
            node,
            command: command.to_string(),
            values: BTreeMap::new(),
            explicit: BTreeSet::new(),
            interleaved: Vec::new(),
        }
    }

    /// Node this instance was created for.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the bound value of `ident`, default or explicit.
    pub fn get(&self, ident: &str) -> Option<&Value> {
        self.values.get(ident)
    }

    /// Convenience accessor for string values.
    pub fn get_str(&self, ident: &str) -> Option<&str> {
        match self.values.get(ident) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convenience accessor for booleans; unset reads as `false`.
    pub fn get_bool(&self, ident: &str) -> bool {
        matches!(self.values.get(ident), Some(Value::Bool(true)))
    }

    /// Convenience accessor for list values rendered as strings.
    pub fn get_list(&self, ident: &str) -> Vec<String> {
        match self.values.get(ident) {
            Some(Value::List(items)) => items.iter().map(ToString::to_string).collect(),
            Some(other) => vec![other.to_string()],
            None => Vec::new(),
        }
    }

    /// All bound values keyed by field identifier.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Binds an explicit value, replacing anything bound before.
    pub fn set(&mut self, ident: &str, value: Value) {
        self.values.insert(ident.to_string(), value);
        self.explicit.insert(ident.to_string());
    }

    /// Binds a default value without marking the field as explicitly given.
    pub fn set_default(&mut self, ident: &str, value: Value) {
        self.values.insert(ident.to_string(), value);
    }

    /// Mutable access to a bound value.
    pub fn get_mut(&mut self, ident: &str) -> Option<&mut Value> {
        self.values.get_mut(ident)
    }

    /// Marks a field as explicitly given.
    pub fn mark_explicit(&mut self, ident: &str) {
        self.explicit.insert(ident.to_string());
    }

    /// Whether the user supplied the field (as opposed to a default).
    pub fn is_explicit(&self, ident: &str) -> bool {
        self.explicit.contains(ident)
    }

    /// Records a position-stamped value of an interleaved field.
    pub fn push_interleaved(&mut self, position: usize, field: &str, value: Value) {
        self.interleaved.push(InterleavedValue {
            position,
            field: field.to_string(),
            value,
        });
    }

    /// Position-stamped values in binding order.
    pub fn interleaved(&self) -> &[InterleavedValue] {
        &self.interleaved
    }
}

/// Converts a field identifier into a kebab-case flag name.
///
/// # Examples
///
/// ```
/// use command_grammar_core::kebab_case;
///
/// assert_eq!(kebab_case("dry_run"), "dry-run");
/// assert_eq!(kebab_case("DryRun"), "dry-run");
/// assert_eq!(kebab_case("mode"), "mode");
/// ```
pub fn kebab_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    let mut after_lower = false;

    for ch in ident.chars() {
        if matches!(ch, '_' | '-' | ' ') {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            after_lower = false;
        } else if ch.is_uppercase() {
            if after_lower && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
            after_lower = false;
        } else {
            out.push(ch);
            after_lower = true;
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}
