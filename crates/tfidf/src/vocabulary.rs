use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::TfidfError;

/// Sorted term list with a term → dimension lookup.
///
/// A term's dimension is its position in lexicographic order, so two fits
/// over the same surviving terms always agree on the layout. Only the term
/// list is serialized; the lookup is rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl Vocabulary {
    /// Build from terms already in strictly increasing order.
    pub fn from_sorted_terms(terms: Vec<String>) -> Result<Self, TfidfError> {
        if let Some(pos) = terms.windows(2).position(|w| w[0] >= w[1]) {
            return Err(TfidfError::Inconsistent(format!(
                "vocabulary terms not strictly sorted at position {}",
                pos + 1
            )));
        }
        if u32::try_from(terms.len()).is_err() {
            return Err(TfidfError::Inconsistent(format!(
                "vocabulary of {} terms exceeds u32 dimensions",
                terms.len()
            )));
        }
        let lookup = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx as u32))
            .collect();
        Ok(Self { terms, lookup })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Dimension index for `term`.
    pub fn get(&self, term: &str) -> Option<u32> {
        self.lookup.get(term).copied()
    }

    pub fn term(&self, index: u32) -> Option<&str> {
        self.terms.get(index as usize).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = TfidfError;

    fn try_from(terms: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_sorted_terms(terms)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.terms
    }
}
