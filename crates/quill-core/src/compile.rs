//! Literal compilation: substituting bindings into SQL text.
//!
//! Used for trace output and for statements that cannot take parameters
//! (`PRAGMA`, column defaults in DDL). Placeholders inside string literals,
//! quoted identifiers and comments are left untouched.

use std::iter::Peekable;

use crate::error::BindingError;
use crate::expression::Expression;
use crate::value::{transcode, Binding};

/// Lexical state while scanning SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    /// Inside a quoted span closed by the given character.
    Quoted(char),
    LineComment,
    BlockComment,
}

/// A parameter token found in SQL text.
enum Token<'a> {
    /// `?`, numbered one past the largest number used so far.
    Next,
    /// `?NNN`, with its full text.
    Numbered(&'a str),
    /// `:name`, `@name` or `$name`, with its prefix.
    Named(&'a str),
}

/// Largest parameter number SQLite accepts by default.
const MAX_PARAMETER_NUMBER: usize = 32_766;

/// Walks `sql`, copying text and handing each parameter token to `substitute`.
fn rewrite<'a, F>(sql: &'a str, mut substitute: F) -> Result<String, BindingError>
where
    F: FnMut(Token<'a>, &mut String) -> Result<(), BindingError>,
{
    let mut out = String::with_capacity(sql.len());
    let mut state = Scan::Code;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match state {
            Scan::Code => match c {
                '\'' | '"' | '`' => {
                    state = Scan::Quoted(c);
                    out.push(c);
                }
                '[' => {
                    state = Scan::Quoted(']');
                    out.push(c);
                }
                '-' if chars.peek().is_some_and(|&(_, n)| n == '-') => {
                    state = Scan::LineComment;
                    out.push(c);
                }
                '/' if chars.peek().is_some_and(|&(_, n)| n == '*') => {
                    state = Scan::BlockComment;
                    out.push(c);
                    if let Some((_, star)) = chars.next() {
                        out.push(star);
                    }
                }
                '?' => {
                    let end = scan_while(&mut chars, i + 1, |n| n.is_ascii_digit());
                    let token = if end > i + 1 {
                        Token::Numbered(&sql[i..end])
                    } else {
                        Token::Next
                    };
                    substitute(token, &mut out)?;
                }
                ':' | '@' | '$' if chars.peek().is_some_and(|&(_, n)| is_name_char(n)) => {
                    let end = scan_while(&mut chars, i + 1, is_name_char);
                    substitute(Token::Named(&sql[i..end]), &mut out)?;
                }
                _ => out.push(c),
            },
            Scan::Quoted(close) => {
                out.push(c);
                if c == close {
                    // A doubled closing quote is an escaped quote, not the end.
                    if close != ']' && chars.peek().is_some_and(|&(_, n)| n == close) {
                        if let Some((_, escaped)) = chars.next() {
                            out.push(escaped);
                        }
                    } else {
                        state = Scan::Code;
                    }
                }
            }
            Scan::LineComment => {
                out.push(c);
                if c == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::BlockComment => {
                out.push(c);
                if c == '*' && chars.peek().is_some_and(|&(_, n)| n == '/') {
                    if let Some((_, slash)) = chars.next() {
                        out.push(slash);
                    }
                    state = Scan::Code;
                }
            }
        }
    }

    Ok(out)
}

/// Consumes characters matching `accept`, returning the byte offset just
/// past the last one (`end` when none match).
fn scan_while<I>(
    chars: &mut Peekable<I>,
    mut end: usize,
    accept: impl Fn(char) -> bool,
) -> usize
where
    I: Iterator<Item = (usize, char)>,
{
    while let Some(&(j, n)) = chars.peek() {
        if !accept(n) {
            break;
        }
        end = j + n.len_utf8();
        chars.next();
    }
    end
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The number of a `?NNN` token.
fn parameter_number(token: &str) -> Result<usize, BindingError> {
    token[1..]
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_PARAMETER_NUMBER).contains(n))
        .ok_or_else(|| BindingError::InvalidIndex(String::from(token)))
}

/// Replaces each unquoted `?` with the corresponding binding rendered as a literal.
///
/// Numbering follows SQLite: `?NNN` refers to binding `NNN` (1-based) and a
/// bare `?` to the one after the largest number used so far, so `?1` may
/// repeat. Named tokens are left as they are.
///
/// # Errors
///
/// Returns [`BindingError::CountMismatch`] when the number of parameters
/// differs from the number of bindings, and [`BindingError::InvalidIndex`]
/// for a `?NNN` outside `?1..=?32766`.
///
/// ```rust
/// use quill_core::{inline_positional, Binding};
///
/// let sql = inline_positional(
///     "INSERT INTO users (email, admin) VALUES (?, ?)",
///     &[Some(Binding::from("alice@example.com")), Some(Binding::Integer(1))],
/// )
/// .unwrap();
/// assert_eq!(
///     sql,
///     "INSERT INTO users (email, admin) VALUES ('alice@example.com', 1)"
/// );
///
/// let bindings = [Some(Binding::Integer(2)), None];
/// let sql = inline_positional("SELECT ?1 + ?1, ?", &bindings).unwrap();
/// assert_eq!(sql, "SELECT 2 + 2, NULL");
/// ```
pub fn inline_positional(sql: &str, bindings: &[Option<Binding>]) -> Result<String, BindingError> {
    let mut highest = 0;
    let out = rewrite(sql, |token, out| {
        let number = match token {
            Token::Next => highest + 1,
            Token::Numbered(text) => parameter_number(text)?,
            Token::Named(name) => {
                out.push_str(name);
                return Ok(());
            }
        };
        highest = highest.max(number);
        if let Some(binding) = bindings.get(number - 1) {
            out.push_str(&transcode(binding.as_ref()));
        }
        Ok(())
    })?;

    if highest == bindings.len() {
        Ok(out)
    } else {
        Err(BindingError::CountMismatch {
            expected: highest,
            found: bindings.len(),
        })
    }
}

/// Replaces each `:name`, `@name` or `$name` token with its binding.
///
/// Names are matched including their prefix character. Unquoted `?`
/// placeholders are left as they are.
///
/// # Errors
///
/// Returns [`BindingError::UnknownName`] for a token with no binding and
/// [`BindingError::DuplicateName`] when a name is supplied twice.
pub fn inline_named(
    sql: &str,
    bindings: &[(String, Option<Binding>)],
) -> Result<String, BindingError> {
    for (i, (name, _)) in bindings.iter().enumerate() {
        if bindings[..i].iter().any(|(other, _)| other == name) {
            return Err(BindingError::DuplicateName(name.clone()));
        }
    }

    rewrite(sql, |token, out| {
        match token {
            Token::Next => out.push('?'),
            Token::Numbered(text) => out.push_str(text),
            Token::Named(name) => {
                let binding = bindings
                    .iter()
                    .find(|(candidate, _)| candidate == name)
                    .map(|(_, binding)| binding)
                    .ok_or_else(|| BindingError::UnknownName(String::from(name)))?;
                out.push_str(&transcode(binding.as_ref()));
            }
        }
        Ok(())
    })
}

impl<T> Expression<T> {
    /// Renders the expression with every binding inlined as a literal.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::CountMismatch`] if the expression was built
    /// with a binding count that does not match its placeholders.
    pub fn compile(&self) -> Result<String, BindingError> {
        inline_positional(self.sql(), self.bindings())
    }
}
