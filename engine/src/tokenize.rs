//! Shell-like tokenizer for completion lines.
//!
//! Splits a raw command line the way a POSIX shell would for simple words:
//! whitespace separates tokens, single quotes suppress everything, double
//! quotes suppress splitting but honor backslash escapes, and a bare
//! backslash escapes the next character. Malformed input (an unterminated
//! quote or a trailing backslash) never fails; whatever was accumulated is
//! flushed as the last token.

/// Result of tokenizing one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokens {
    /// Tokens in order, quotes and escapes removed.
    pub tokens: Vec<String>,
    /// `true` when the line ends on unescaped whitespace outside quotes,
    /// meaning the user is about to start a new token.
    pub ends_on_boundary: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Tokenizes `line`.
///
/// # Examples
///
/// ```
/// use command_grammar_engine::tokenize;
///
/// let t = tokenize(r#"app --name "John Doe" it\'s "#);
/// assert_eq!(t.tokens, vec!["app", "--name", "John Doe", "it's"]);
/// assert!(t.ends_on_boundary);
///
/// let t = tokenize("app --mo");
/// assert_eq!(t.tokens, vec!["app", "--mo"]);
/// assert!(!t.ends_on_boundary);
/// ```
pub fn tokenize(line: &str) -> Tokens {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote = Quote::None;
    let mut escaped = false;
    let mut ends_on_boundary = false;

    for ch in line.chars() {
        ends_on_boundary = false;

        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match quote {
            Quote::Single => {
                if ch == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(ch);
                }
            }
            Quote::Double => match ch {
                '"' => quote = Quote::None,
                '\\' => escaped = true,
                _ => current.push(ch),
            },
            Quote::None => match ch {
                ' ' | '\t' | '\n' => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                    ends_on_boundary = true;
                }
                '\'' => {
                    quote = Quote::Single;
                    in_token = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_token = true;
                }
                '\\' => {
                    escaped = true;
                    in_token = true;
                }
                _ => {
                    current.push(ch);
                    in_token = true;
                }
            },
        }
    }

    if in_token {
        tokens.push(current);
    }

    Tokens {
        tokens,
        ends_on_boundary,
    }
}
