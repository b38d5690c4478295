//! The parsed form of scenario input.
//!
//! An [`Expression`] carries no type of its own: an atom is just text and a
//! list is just an ordered grouping. How a node is interpreted is decided by
//! whichever coercion the evaluator applies to it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scenario expression: an atom (literal token) or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Atom(String),
    List(Vec<Expression>),
}

impl Expression {
    pub fn atom(text: impl Into<String>) -> Self {
        Expression::Atom(text.into())
    }

    pub fn list(items: impl IntoIterator<Item = Expression>) -> Self {
        Expression::List(items.into_iter().collect())
    }

    /// Returns the atom text, or `None` for a list.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Expression::Atom(s) => Some(s),
            Expression::List(_) => None,
        }
    }

    /// Returns the list items, or `None` for an atom.
    pub fn as_list(&self) -> Option<&[Expression]> {
        match self {
            Expression::Atom(_) => None,
            Expression::List(items) => Some(items),
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Expression::Atom(_))
    }

    /// Views the expression as a sequence of items: a list yields its
    /// items, an atom yields itself.
    pub fn items(&self) -> &[Expression] {
        match self {
            Expression::Atom(_) => std::slice::from_ref(self),
            Expression::List(items) => items,
        }
    }
}

impl From<&str> for Expression {
    fn from(s: &str) -> Self {
        Expression::Atom(s.to_string())
    }
}

impl From<String> for Expression {
    fn from(s: String) -> Self {
        Expression::Atom(s)
    }
}

impl From<Vec<Expression>> for Expression {
    fn from(items: Vec<Expression>) -> Self {
        Expression::List(items)
    }
}

fn needs_quotes(s: &str) -> bool {
    let special = |c: char| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\');
    s.is_empty() || s.starts_with("--") || s.chars().any(special)
}

fn write_atom(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if !needs_quotes(s) {
        return f.write_str(s);
    }
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            other => write!(f, "{}", other)?,
        }
    }
    f.write_str("\"")
}

/// Renders canonical s-expression text that reads back to the same tree.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Atom(s) => write_atom(f, s),
            Expression::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}
