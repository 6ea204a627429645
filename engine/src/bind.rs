//! Value binders.
//!
//! Convert raw argument text into [`Value`]s according to a field's
//! [`ValueType`] and store them on a [`CommandInstance`].

use std::collections::BTreeMap;

use command_grammar_core::{CommandInstance, Value, ValueType};

use crate::error::{GrammarError, Result};

/// What a binder needs to know about the field it writes to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Target<'a> {
    /// Field identifier (storage key).
    pub ident: &'a str,
    /// Name used in error messages (`--mode`, `TARGET`).
    pub name: &'a str,
    pub value_type: &'a ValueType,
    pub interleaved: bool,
    /// Maps are only bindable on flags.
    pub positional: bool,
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn unsupported(target: &Target<'_>) -> GrammarError {
    GrammarError::UnsupportedValueType {
        field: target.ident.to_string(),
        type_name: target.value_type.label(),
    }
}

fn convert_scalar(target: &Target<'_>, value_type: &ValueType, raw: &str) -> Result<Value> {
    let invalid = |reason: String| GrammarError::InvalidValue {
        name: target.name.to_string(),
        value: raw.to_string(),
        reason,
    };

    match value_type {
        ValueType::Bool => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| invalid("expected a boolean".to_string())),
        ValueType::String => Ok(Value::String(raw.to_string())),
        ValueType::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|err| invalid(err.to_string())),
        ValueType::Uint => raw
            .parse::<u64>()
            .map(Value::Uint)
            .map_err(|err| invalid(err.to_string())),
        ValueType::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|err| invalid(err.to_string())),
        ValueType::List(_) | ValueType::Map | ValueType::Other(_) => Err(unsupported(target)),
    }
}

fn split_map_entry(target: &Target<'_>, raw: &str) -> Result<(String, String)> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| GrammarError::InvalidMapValue {
            flag: target.name.to_string(),
            value: raw.to_string(),
        })
}

/// Converts `raw` as one occurrence of the field.
///
/// Lists yield a single element, maps a single entry.
pub(crate) fn convert(target: &Target<'_>, raw: &str) -> Result<Value> {
    match target.value_type {
        ValueType::List(inner) => convert_scalar(target, inner, raw),
        ValueType::Map if target.positional => Err(unsupported(target)),
        ValueType::Map => {
            let (key, value) = split_map_entry(target, raw)?;
            Ok(Value::Map(BTreeMap::from([(key, value)])))
        }
        other => convert_scalar(target, other, raw),
    }
}

/// Binds one occurrence of the field on `instance`.
///
/// The first explicit occurrence of a list or map replaces its default;
/// later occurrences accumulate. Scalars are overwritten.
pub(crate) fn assign(
    instance: &mut CommandInstance,
    target: &Target<'_>,
    raw: &str,
    position: usize,
) -> Result<()> {
    let value = convert(target, raw)?;
    let first = !instance.is_explicit(target.ident);

    match (target.value_type, value.clone()) {
        (ValueType::List(_), element) => match instance.get_mut(target.ident) {
            Some(Value::List(items)) if !first => items.push(element),
            _ => instance.set(target.ident, Value::List(vec![element])),
        },
        (ValueType::Map, Value::Map(entry)) => match instance.get_mut(target.ident) {
            Some(Value::Map(entries)) if !first => entries.extend(entry),
            _ => instance.set(target.ident, Value::Map(entry)),
        },
        (_, scalar) => instance.set(target.ident, scalar),
    }
    instance.mark_explicit(target.ident);

    if target.interleaved {
        instance.push_interleaved(position, target.ident, value);
    }
    Ok(())
}

/// Binds a textual default without marking the field explicit.
pub(crate) fn assign_default(
    instance: &mut CommandInstance,
    target: &Target<'_>,
    raw: &str,
) -> Result<()> {
    let value = match (target.value_type, convert(target, raw)?) {
        (ValueType::List(_), element) => Value::List(vec![element]),
        (_, value) => value,
    };
    instance.set_default(target.ident, value);
    Ok(())
}
