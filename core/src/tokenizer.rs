use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex =
        Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{M}\p{N}_]*(?:'\p{L}+)?").expect("valid regex");
}

/// A word as it appeared in the text, case preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    /// First word of the text, or first after a `.`, `!` or `?`.
    pub sentence_start: bool,
}

/// Lazy iterator over the words of an NFKC-normalized text.
#[derive(Debug, Clone)]
pub struct Words {
    text: String,
    pos: usize,
}

impl Iterator for Words {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        let m = WORD.find_at(&self.text, self.pos)?;
        let gap = &self.text[self.pos..m.start()];
        let sentence_start = self.pos == 0 || gap.contains(['.', '!', '?']);
        self.pos = m.end();
        Some(Word { text: m.as_str().to_string(), sentence_start })
    }
}

/// Splits text into words using NFKC normalization.
///
/// Whitespace, punctuation and symbols are skipped. Case is preserved because
/// lemmatizers use capitalization to recognise names. A trailing clitic such as
/// `'s` or `n't` stays attached to its word. The text is normalized once up
/// front; words are matched one at a time as the iterator advances.
pub fn words(text: &str) -> Words {
    let text = text.nfkc().map(|c| if c == '\u{2019}' { '\'' } else { c }).collect();
    Words { text, pos: 0 }
}

/// [`words`] without sentence positions.
pub fn split_words(text: &str) -> impl Iterator<Item = String> {
    words(text).map(|w| w.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        split_words(text).collect()
    }

    #[test]
    fn skips_punctuation_and_whitespace() {
        assert_eq!(split("  The quick, brown fox -- jumped!  "), vec!["The", "quick", "brown", "fox", "jumped"]);
    }

    #[test]
    fn keeps_clitics_and_folds_typographic_apostrophe() {
        assert_eq!(split("Let\u{2019}s go, it's fine"), vec!["Let's", "go", "it's", "fine"]);
    }

    #[test]
    fn composes_unicode() {
        // "cafe" followed by a combining acute accent
        assert_eq!(split("cafe\u{0301} menu"), vec!["caf\u{e9}", "menu"]);
    }

    #[test]
    fn numbers_are_words() {
        assert_eq!(split("route 66"), vec!["route", "66"]);
    }

    #[test]
    fn marks_sentence_starts() {
        let starts: Vec<(String, bool)> =
            words("  Trains leave. Dover, then Calais! ok? yes").map(|w| (w.text, w.sentence_start)).collect();
        assert_eq!(
            starts,
            vec![
                ("Trains".to_string(), true),
                ("leave".to_string(), false),
                ("Dover".to_string(), true),
                ("then".to_string(), false),
                ("Calais".to_string(), false),
                ("ok".to_string(), true),
                ("yes".to_string(), true),
            ]
        );
    }

    #[test]
    fn words_are_produced_on_demand() {
        let mut iter = words("one two three");
        assert_eq!(iter.next().map(|w| w.text).as_deref(), Some("one"));
        assert_eq!(iter.pos, 3);
        assert_eq!(iter.count(), 2);
    }
}
