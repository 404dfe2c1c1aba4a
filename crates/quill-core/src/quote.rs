//! Identifier and string-literal quoting.

/// Wraps `name` in double quotes, doubling any embedded double quote.
///
/// ```rust
/// use quill_core::quote_identifier;
///
/// assert_eq!(quote_identifier("users"), "\"users\"");
/// assert_eq!(quote_identifier("say \"hi\""), "\"say \"\"hi\"\"\"");
/// ```
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    quote(name, '"')
}

/// Wraps `value` in single quotes, doubling any embedded single quote.
///
/// ```rust
/// use quill_core::quote_literal;
///
/// assert_eq!(quote_literal("That's all, Folks!"), "'That''s all, Folks!'");
/// ```
#[must_use]
pub fn quote_literal(value: &str) -> String {
    quote(value, '\'')
}

fn quote(text: &str, mark: char) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(mark);
    for c in text.chars() {
        if c == mark {
            quoted.push(mark);
        }
        quoted.push(c);
    }
    quoted.push(mark);
    quoted
}
