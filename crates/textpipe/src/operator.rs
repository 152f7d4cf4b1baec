//! Single text transformations and the values they operate on.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::ngrams::{cumulative_ngrams, ngrams};

/// A value flowing through a pipeline.
///
/// Operators map strings to strings or gram sets; a [`TextValue::List`] is
/// mapped element-wise, preserving order and length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextValue {
    Text(String),
    Grams(BTreeSet<String>),
    List(Vec<TextValue>),
}

impl TextValue {
    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TextValue::Text(_) => "string",
            TextValue::Grams(_) => "gram set",
            TextValue::List(_) => "list",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TextValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_grams(&self) -> Option<&BTreeSet<String>> {
        match self {
            TextValue::Grams(g) => Some(g),
            _ => None,
        }
    }

    /// Flatten into a token list: strings become one token, gram sets
    /// contribute every gram in sorted order, lists are flattened in order.
    pub fn into_tokens(self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<String>) {
        match self {
            TextValue::Text(s) => out.push(s),
            TextValue::Grams(grams) => out.extend(grams),
            TextValue::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

impl From<&str> for TextValue {
    fn from(value: &str) -> Self {
        TextValue::Text(value.to_string())
    }
}

impl From<String> for TextValue {
    fn from(value: String) -> Self {
        TextValue::Text(value)
    }
}

/// A named text transformation with its parameters bound.
///
/// Operators serialize as `{"op": "<name>", ...params}` so pipelines can be
/// declared in config files and persisted alongside a fitted model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TextOperator {
    /// Unicode lowercase.
    Lowercase,
    /// Trim characters from both ends. `None` trims whitespace.
    Strip {
        #[serde(default)]
        chars: Option<String>,
    },
    /// Split into a list. `None` splits on whitespace runs.
    Split {
        #[serde(default)]
        sep: Option<String>,
    },
    /// Replace `old` with `new`, at most `count` times when set and non-zero.
    Replace {
        old: String,
        new: String,
        #[serde(default)]
        count: Option<usize>,
    },
    /// Drop ASCII punctuation characters.
    RemovePunctuation,
    /// Fixed-length character n-grams.
    Ngrams { n: usize },
    /// Character n-grams of every length in `min..=max`.
    CumulativeNgrams { min: usize, max: usize },
}

impl TextOperator {
    pub fn lowercase() -> Self {
        TextOperator::Lowercase
    }

    pub fn strip_whitespace() -> Self {
        TextOperator::Strip { chars: None }
    }

    pub fn strip(chars: impl Into<String>) -> Self {
        TextOperator::Strip {
            chars: Some(chars.into()),
        }
    }

    pub fn split_whitespace() -> Self {
        TextOperator::Split { sep: None }
    }

    pub fn split(sep: impl Into<String>) -> Self {
        TextOperator::Split {
            sep: Some(sep.into()),
        }
    }

    pub fn replace(old: impl Into<String>, new: impl Into<String>) -> Self {
        TextOperator::Replace {
            old: old.into(),
            new: new.into(),
            count: None,
        }
    }

    pub fn replacen(old: impl Into<String>, new: impl Into<String>, count: usize) -> Self {
        TextOperator::Replace {
            old: old.into(),
            new: new.into(),
            count: Some(count),
        }
    }

    pub fn remove_punctuation() -> Self {
        TextOperator::RemovePunctuation
    }

    pub fn ngrams(n: usize) -> Self {
        TextOperator::Ngrams { n }
    }

    pub fn cumulative_ngrams(min: usize, max: usize) -> Self {
        TextOperator::CumulativeNgrams { min, max }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextOperator::Lowercase => "lowercase",
            TextOperator::Strip { .. } => "strip",
            TextOperator::Split { .. } => "split",
            TextOperator::Replace { .. } => "replace",
            TextOperator::RemovePunctuation => "remove_punctuation",
            TextOperator::Ngrams { .. } => "ngrams",
            TextOperator::CumulativeNgrams { .. } => "cumulative_ngrams",
        }
    }

    /// Whether this operator emits gram sets, after which no string
    /// operator can run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TextOperator::Ngrams { .. } | TextOperator::CumulativeNgrams { .. }
        )
    }

    /// Reject parameter combinations that can never do useful work.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |reason: &str| -> Result<(), PipelineError> {
            Err(PipelineError::InvalidOperator {
                op: self.name(),
                reason: reason.to_string(),
            })
        };
        match self {
            TextOperator::Split { sep: Some(sep) } if sep.is_empty() => {
                invalid("separator must not be empty")
            }
            TextOperator::Ngrams { n: 0 } => invalid("n must be >= 1"),
            TextOperator::CumulativeNgrams { min: 0, .. } => invalid("min must be >= 1"),
            _ => Ok(()),
        }
    }

    /// Apply to a single string.
    pub fn apply_one(&self, text: &str) -> TextValue {
        match self {
            TextOperator::Lowercase => TextValue::Text(text.to_lowercase()),
            TextOperator::Strip { chars: None } => TextValue::Text(text.trim().to_string()),
            TextOperator::Strip { chars: Some(chars) } => {
                TextValue::Text(text.trim_matches(|c: char| chars.contains(c)).to_string())
            }
            TextOperator::Split { sep: None } => TextValue::List(
                text.split_whitespace()
                    .map(|part| TextValue::Text(part.to_string()))
                    .collect(),
            ),
            TextOperator::Split { sep: Some(sep) } => TextValue::List(
                text.split(sep.as_str())
                    .map(|part| TextValue::Text(part.to_string()))
                    .collect(),
            ),
            TextOperator::Replace { old, new, count } => match count {
                Some(n) if *n > 0 => TextValue::Text(text.replacen(old.as_str(), new, *n)),
                _ => TextValue::Text(text.replace(old.as_str(), new)),
            },
            TextOperator::RemovePunctuation => TextValue::Text(
                text.chars().filter(|c| !c.is_ascii_punctuation()).collect(),
            ),
            TextOperator::Ngrams { n } => TextValue::Grams(ngrams(text, *n)),
            TextOperator::CumulativeNgrams { min, max } => {
                TextValue::Grams(cumulative_ngrams(text, *min, *max))
            }
        }
    }

    /// Apply element-wise to a sequence of strings, preserving order and length.
    pub fn apply_many<S: AsRef<str>>(&self, items: &[S]) -> Vec<TextValue> {
        items.iter().map(|s| self.apply_one(s.as_ref())).collect()
    }

    /// Apply to any pipeline value. Lists are mapped element-wise.
    pub fn apply(&self, value: TextValue) -> Result<TextValue, PipelineError> {
        match value {
            TextValue::Text(s) => Ok(self.apply_one(&s)),
            TextValue::List(items) => items
                .into_iter()
                .map(|item| self.apply(item))
                .collect::<Result<Vec<_>, _>>()
                .map(TextValue::List),
            other @ TextValue::Grams(_) => Err(PipelineError::UnsupportedInput {
                op: self.name(),
                kind: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> TextValue {
        TextValue::Text(s.to_string())
    }

    #[test]
    fn lowercase_folds_case() {
        assert_eq!(TextOperator::lowercase().apply_one("JoHN"), text("john"));
    }

    #[test]
    fn strip_whitespace_and_char_set() {
        assert_eq!(
            TextOperator::strip_whitespace().apply_one("  jane \n"),
            text("jane")
        );
        assert_eq!(TextOperator::strip("*-").apply_one("-*jane*-"), text("jane"));
        // An empty set strips nothing.
        assert_eq!(TextOperator::strip("").apply_one(" jane "), text(" jane "));
    }

    #[test]
    fn split_on_separator_keeps_empty_parts() {
        let out = TextOperator::split(",").apply_one("a,,b");
        assert_eq!(out, TextValue::List(vec![text("a"), text(""), text("b")]));
    }

    #[test]
    fn split_on_whitespace_drops_empty_parts() {
        let out = TextOperator::split_whitespace().apply_one("  jon   smith ");
        assert_eq!(out, TextValue::List(vec![text("jon"), text("smith")]));
    }

    #[test]
    fn replace_all_and_bounded() {
        assert_eq!(
            TextOperator::replace("a", "o").apply_one("banana"),
            text("bonono")
        );
        assert_eq!(
            TextOperator::replacen("a", "o", 2).apply_one("banana"),
            text("bonona")
        );
        // A zero count means unbounded.
        assert_eq!(
            TextOperator::replacen("a", "o", 0).apply_one("banana"),
            text("bonono")
        );
    }

    #[test]
    fn remove_punctuation_keeps_spaces() {
        assert_eq!(
            TextOperator::remove_punctuation().apply_one("O'Brien, Jr."),
            text("OBrien Jr")
        );
    }

    #[test]
    fn apply_many_preserves_order_and_length() {
        let out = TextOperator::lowercase().apply_many(&["B", "A", "C"]);
        assert_eq!(out, vec![text("b"), text("a"), text("c")]);
    }

    #[test]
    fn apply_maps_lists_element_wise() {
        let value = TextValue::List(vec![text("AB"), text("CD")]);
        let out = TextOperator::lowercase().apply(value).unwrap();
        assert_eq!(out, TextValue::List(vec![text("ab"), text("cd")]));
    }

    #[test]
    fn apply_rejects_gram_sets() {
        let grams = TextOperator::ngrams(2).apply_one("abc");
        let err = TextOperator::lowercase().apply(grams).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnsupportedInput {
                op: "lowercase",
                kind: "gram set"
            }
        );
    }

    #[test]
    fn validate_rejects_degenerate_parameters() {
        assert!(TextOperator::split("").validate().is_err());
        assert!(TextOperator::ngrams(0).validate().is_err());
        assert!(TextOperator::cumulative_ngrams(0, 3).validate().is_err());
        assert!(TextOperator::cumulative_ngrams(3, 2).validate().is_ok());
    }

    #[test]
    fn into_tokens_flattens_in_order() {
        let value = TextValue::List(vec![
            text("x"),
            TextOperator::ngrams(2).apply_one("abc"),
        ]);
        assert_eq!(value.into_tokens(), vec!["x", "ab", "bc"]);
    }

    #[test]
    fn serde_tagged_representation() {
        let op = TextOperator::cumulative_ngrams(2, 3);
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "cumulative_ngrams");
        assert_eq!(json["min"], 2);

        let parsed: TextOperator = serde_json::from_str(r#"{"op":"strip"}"#).unwrap();
        assert_eq!(parsed, TextOperator::strip_whitespace());

        let unknown = serde_json::from_str::<TextOperator>(r#"{"op":"soundex"}"#);
        assert!(unknown.is_err());
    }
}
