//! Character n-gram extraction.
//!
//! Grams are taken over Unicode scalar values, not bytes, so a multi-byte
//! character always counts as one position in the sliding window.

use std::collections::BTreeSet;
use std::iter;

/// All contiguous substrings of exactly `n` characters, sliding by one.
///
/// Returns an empty set when `n == 0` or the text is shorter than `n`.
pub fn ngrams(text: &str, n: usize) -> BTreeSet<String> {
    let bounds = char_bounds(text);
    let mut out = BTreeSet::new();
    collect_windows(text, &bounds, n, &mut out);
    out
}

/// Union of [`ngrams`] for every gram length in `min..=max`.
///
/// Returns an empty set when `max < min` or the text is shorter than `min`.
/// Lengths past the character count yield nothing, so `max` is capped there.
pub fn cumulative_ngrams(text: &str, min: usize, max: usize) -> BTreeSet<String> {
    let bounds = char_bounds(text);
    let mut out = BTreeSet::new();
    if max < min {
        return out;
    }
    // bounds.len() == char_count + 1
    let longest = max.min(bounds.len() - 1);
    for n in min..=longest {
        collect_windows(text, &bounds, n, &mut out);
    }
    out
}

/// Byte offsets of every character start plus the end of the string.
fn char_bounds(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(idx, _)| idx)
        .chain(iter::once(text.len()))
        .collect()
}

fn collect_windows(text: &str, bounds: &[usize], n: usize, out: &mut BTreeSet<String>) {
    // bounds.len() == char_count + 1
    if n == 0 || bounds.len() <= n {
        return;
    }
    out.extend(
        bounds
            .windows(n + 1)
            .map(|w| text[w[0]..w[n]].to_string()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn trigrams_of_short_word() {
        assert_eq!(ngrams("abcd", 3), set(&["abc", "bcd"]));
    }

    #[test]
    fn ngrams_shorter_than_n_is_empty() {
        assert!(ngrams("ab", 3).is_empty());
        assert!(ngrams("", 1).is_empty());
    }

    #[test]
    fn ngrams_zero_is_empty() {
        assert!(ngrams("abc", 0).is_empty());
    }

    #[test]
    fn ngrams_exact_length_yields_whole_string() {
        assert_eq!(ngrams("abc", 3), set(&["abc"]));
    }

    #[test]
    fn repeated_grams_collapse() {
        assert_eq!(ngrams("aaaa", 2), set(&["aa"]));
    }

    #[test]
    fn cumulative_abc_two_to_three() {
        assert_eq!(cumulative_ngrams("abc", 2, 3), set(&["ab", "bc", "abc"]));
    }

    #[test]
    fn cumulative_is_union_of_each_length() {
        let text = "jon smith";
        let mut expected = BTreeSet::new();
        for n in 2..=4 {
            expected.extend(ngrams(text, n));
        }
        assert_eq!(cumulative_ngrams(text, 2, 4), expected);
    }

    #[test]
    fn cumulative_shorter_than_min_is_empty() {
        assert!(cumulative_ngrams("a", 2, 3).is_empty());
    }

    #[test]
    fn cumulative_inverted_bounds_is_empty() {
        assert!(cumulative_ngrams("abcdef", 3, 2).is_empty());
    }

    #[test]
    fn cumulative_partial_lengths() {
        // Length 2 fits, length 3 does not.
        assert_eq!(cumulative_ngrams("ab", 2, 3), set(&["ab"]));
    }

    #[test]
    fn cumulative_unbounded_max_stops_at_text_length() {
        assert_eq!(
            cumulative_ngrams("jon", 2, usize::MAX),
            set(&["jo", "on", "jon"])
        );
        assert!(cumulative_ngrams("", 1, usize::MAX).is_empty());
        assert!(ngrams("jon", usize::MAX).is_empty());
    }

    #[test]
    fn grams_count_characters_not_bytes() {
        assert_eq!(ngrams("zoë", 2), set(&["zo", "oë"]));
        assert_eq!(ngrams("日本語", 3), set(&["日本語"]));
    }
}
