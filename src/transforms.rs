//! Stock transform functions.
//!
//! Ready-made pure [`TransformFn`] values for the common result rewrites,
//! usable with [`crate::grammar::apply`]:
//!
//! ```
//! use weft::engine::{parse, ParseOptions};
//! use weft::grammar::{apply, text, Grammar};
//! use weft::input::TextSource;
//! use weft::transforms;
//!
//! let grammar = Grammar::from_root(apply("int", text("42"), transforms::text_to_number()));
//! let source = TextSource::new("42");
//! let outcome = parse(&grammar, &source, ParseOptions::default()).unwrap();
//! assert_eq!(outcome.value().and_then(|v| v.as_number()), Some(42.0));
//! ```

use crate::grammar::TransformFn;
use crate::input::Token;
use crate::value::ParseValue;
use std::sync::Arc;

/// Collapses matched characters (or text) into a `Text` value.
pub fn tokens_to_text() -> TransformFn<char> {
    Arc::new(|value| match value.text_content() {
        Some(s) => Ok(ParseValue::Text(s)),
        None => Err(format!("expected character content, got {}", value.type_name())),
    })
}

/// Parses matched characters or text into a `Number` value.
pub fn text_to_number() -> TransformFn<char> {
    Arc::new(|value| {
        let Some(s) = value.text_content() else {
            return Err(format!(
                "expected character content, got {}",
                value.type_name()
            ));
        };
        s.parse::<f64>()
            .map(ParseValue::Number)
            .map_err(|_| format!("'{s}' is not a number"))
    })
}

/// Flattens nested `List` values one level.
pub fn flatten<T: Token>() -> TransformFn<T> {
    Arc::new(|value| {
        let Some(items) = value.into_list() else {
            return Err("expected a list".to_string());
        };
        let mut flat = Vec::new();
        for item in items {
            match item {
                ParseValue::List(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Ok(ParseValue::List(flat))
    })
}

/// Replaces any result with a fixed value.
pub fn constant<T: Token + Send + Sync>(value: ParseValue<T>) -> TransformFn<T> {
    Arc::new(move |_| Ok(value.clone()))
}

/// Projects the `index`-th element out of a `List` result.
pub fn nth<T: Token>(index: usize) -> TransformFn<T> {
    Arc::new(move |value| {
        let Some(mut items) = value.into_list() else {
            return Err("expected a list".to_string());
        };
        if index >= items.len() {
            return Err(format!("index {index} out of bounds for {} items", items.len()));
        }
        Ok(items.swap_remove(index))
    })
}

/// Replaces a `List` result with its length as a `Number`.
pub fn count<T: Token>() -> TransformFn<T> {
    Arc::new(|value| {
        let Some(items) = value.as_list() else {
            return Err("expected a list".to_string());
        };
        Ok(ParseValue::Number(items.len() as f64))
    })
}
