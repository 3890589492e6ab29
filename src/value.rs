//! Semantic values produced by a parse.
//!
//! [`ParseValue`] is the payload attached to every Success message. The
//! trampoline treats it as opaque; only matchers and transform functions
//! build or inspect values. Values are deeply compositional: lists can
//! contain any other value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::input::Token;

/// The semantic value carried by a successful match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: serde::Deserialize<'de>"
))]
pub enum ParseValue<T> {
    /// Absence of a value.
    #[default]
    Nil,
    /// The token run consumed by a literal matcher.
    Tokens(Vec<T>),
    /// An ordered collection of child results (sequences, repetitions).
    List(Vec<ParseValue<T>>),
    /// Text produced by a transform.
    Text(String),
    /// Numeric value produced by a transform.
    Number(f64),
    /// Boolean value produced by a transform.
    Bool(bool),
}

impl<T: Token> ParseValue<T> {
    /// Returns the variant name of the value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParseValue::Nil => "Nil",
            ParseValue::Tokens(_) => "Tokens",
            ParseValue::List(_) => "List",
            ParseValue::Text(_) => "Text",
            ParseValue::Number(_) => "Number",
            ParseValue::Bool(_) => "Bool",
        }
    }

    /// Returns true if the value is Nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, ParseValue::Nil)
    }

    /// Returns the contained number if this is a Number value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParseValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the contained bool if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParseValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the contained text if this is a Text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParseValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the child values if this is a List value.
    pub fn as_list(&self) -> Option<&[ParseValue<T>]> {
        match self {
            ParseValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes the value, returning child values if this is a List.
    pub fn into_list(self) -> Option<Vec<ParseValue<T>>> {
        match self {
            ParseValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the consumed tokens if this is a Tokens value.
    pub fn as_tokens(&self) -> Option<&[T]> {
        match self {
            ParseValue::Tokens(ts) => Some(ts),
            _ => None,
        }
    }
}

impl ParseValue<char> {
    /// Collapses matched characters or text into a `String`.
    ///
    /// Returns `None` for values that carry no character content.
    pub fn text_content(&self) -> Option<String> {
        match self {
            ParseValue::Tokens(chars) => Some(chars.iter().collect()),
            ParseValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<T: Token> fmt::Display for ParseValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseValue::Nil => write!(f, "nil"),
            ParseValue::Tokens(ts) => write!(f, "{ts:?}"),
            ParseValue::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            ParseValue::Text(s) => write!(f, "\"{s}\""),
            ParseValue::Number(n) => write!(f, "{n}"),
            ParseValue::Bool(b) => write!(f, "{b}"),
        }
    }
}
