//! Word-level tokenization for chunk budgeting.
//!
//! Tokens are UAX #29 word segments with whitespace dropped, so
//! punctuation counts as its own token. `"duress."` tokenizes to
//! `["duress", "."]`, which keeps budgets honest for legal text that is
//! dense with citations and section marks.

use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into word and punctuation tokens, dropping whitespace.
pub fn tokens(text: &str) -> Vec<&str> {
    text.split_word_bounds()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Number of tokens in `text` under the same rules as [`tokens`].
pub fn token_count(text: &str) -> usize {
    tokens(text).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_is_a_separate_token() {
        assert_eq!(tokens("signed under duress."), vec!["signed", "under", "duress", "."]);
    }

    #[test]
    fn whitespace_runs_are_dropped() {
        assert_eq!(tokens("a  b\t c\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(token_count("a  b\t c\nd"), 4);
    }

    #[test]
    fn contractions_stay_whole() {
        assert_eq!(tokens("the court doesn't agree"), vec!["the", "court", "doesn't", "agree"]);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokens("").is_empty());
        assert_eq!(token_count("   "), 0);
    }
}
