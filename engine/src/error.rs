//! Grammar errors.
//!
//! One variant per failure kind, each carrying the offending name or value.
//! Strict parsing surfaces them to the caller; completion swallows them and
//! stops suggesting along that branch.

use thiserror::Error;

/// Errors raised while collecting specs or parsing arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A `--name` or `-n` token does not resolve to any flag in the chain.
    #[error("flag provided but not defined: {0}")]
    FlagNotDefined(String),

    /// A valued flag has no usable value after it.
    #[error("flag needs an argument: {0}")]
    FlagNeedsArgument(String),

    /// Two fields along one chain derive the same flag name.
    #[error("flag {name} already defined (field {field})")]
    FlagAlreadyDefined { name: String, field: String },

    /// A required positional was left unfilled on a terminal parse.
    #[error("missing required positional argument: {0}")]
    MissingRequiredPositional(String),

    /// A required flag was never given on a terminal parse.
    #[error("missing required flag: {0}")]
    MissingRequiredFlag(String),

    /// A token names no subcommand or root command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The field's value type has no binder.
    #[error("unsupported value type {type_name} for {field}")]
    UnsupportedValueType { field: String, type_name: String },

    /// A map flag value is missing its `=`.
    #[error("invalid map value for {flag}: {value:?} (expected key=value)")]
    InvalidMapValue { flag: String, value: String },

    /// A value-taking letter appears before the end of a short-flag group.
    #[error("short flag group {group}: -{letter} takes a value and must come last")]
    ShortFlagGroupNotBool { group: String, letter: char },

    /// Text that cannot be converted to the field's value type.
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    /// A value outside the field's enum set (strict parsing only).
    #[error("invalid value {value:?} for {name}: allowed values are {allowed}")]
    ValueNotAllowed {
        name: String,
        value: String,
        allowed: String,
    },

    /// The command's override hook rejected a field.
    #[error("field options for {field}: {message}")]
    FieldOptions { field: String, message: String },
}

/// Convenience alias for results with [`GrammarError`].
pub type Result<T> = std::result::Result<T, GrammarError>;
