//! Sentence boundary detection.
//!
//! Uses UAX #29 sentence segmentation, which understands terminators,
//! closing quotes, and common abbreviation patterns without any
//! language-specific configuration.

use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into trimmed sentences, dropping whitespace-only segments.
pub fn sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators() {
        let text = "Section 10 exempts agricultural income. Section 80C covers deductions.";
        let found = sentences(text);
        assert_eq!(
            found,
            vec![
                "Section 10 exempts agricultural income.",
                "Section 80C covers deductions.",
            ]
        );
    }

    #[test]
    fn handles_question_and_exclamation_marks() {
        let found = sentences("Is the levy valid? The court said no! The appeal failed.");
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], "Is the levy valid?");
    }

    #[test]
    fn empty_and_whitespace_input_yield_nothing() {
        assert!(sentences("").is_empty());
        assert!(sentences("   \n\t  ").is_empty());
    }

    #[test]
    fn single_sentence_without_terminator_survives() {
        assert_eq!(sentences("unterminated clause"), vec!["unterminated clause"]);
    }
}
