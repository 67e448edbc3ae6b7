use std::{fmt, rc::Rc};

use crate::value::Value;

/// A replacer function: called with each property key and value, returning
/// the value to serialize in its place.
pub type ReplacerFn = Rc<dyn Fn(&str, &Value) -> Value>;

/// The `replacer` argument of a stringify call.
#[derive(Clone)]
pub enum Replacer {
    /// A transforming function, applied to every key/value pair.
    Function(ReplacerFn),
    /// An allow-list of property keys to include, in list order.
    PropertyList(Vec<String>),
}

impl fmt::Debug for Replacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Replacer::Function(..)"),
            Self::PropertyList(keys) => f.debug_tuple("Replacer::PropertyList").field(keys).finish(),
        }
    }
}

/// The `space` argument of a stringify call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Space {
    /// Indent with `n` spaces per level, clamped to 10.
    Count(u32),
    /// Indent with the first 10 characters of the given string.
    Text(String),
}

impl Space {
    /// The per-level indentation gap this space setting produces.
    #[must_use]
    pub(crate) fn gap(&self) -> String {
        match self {
            Self::Count(n) => " ".repeat((*n).min(10) as usize),
            Self::Text(s) => s.chars().take(10).collect(),
        }
    }
}

/// Configuration recognized by [`stringify`](crate::stringify).
///
/// Any value other than both fields absent disqualifies the entire call from
/// the fast path; the general-purpose serializer implements the transforms.
///
/// # Examples
///
/// ```rust
/// use jsonsprint::{Space, StringifyOptions};
///
/// let options = StringifyOptions {
///     space: Some(Space::Count(2)),
///     ..Default::default()
/// };
/// # let _ = options;
/// ```
///
/// # Default
///
/// Both fields default to absent.
#[derive(Clone, Debug, Default)]
pub struct StringifyOptions {
    /// Optional replacer, a function or a property allow-list.
    ///
    /// # Default
    ///
    /// Absent.
    pub replacer: Option<Replacer>,

    /// Optional indentation setting.
    ///
    /// # Default
    ///
    /// Absent (compact output).
    pub space: Option<Space>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_clamps() {
        assert_eq!(Space::Count(2).gap(), "  ");
        assert_eq!(Space::Count(99).gap().len(), 10);
        assert_eq!(Space::Text("\t\t\t\t\t\t\t\t\t\t\t\t".into()).gap().len(), 10);
        assert_eq!(Space::Text("ab".into()).gap(), "ab");
    }
}
