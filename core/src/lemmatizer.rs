//! Lemmatizers turn raw text into a stream of base word forms.
//!
//! The engine only depends on the [`Lemmatizer`] trait. Two implementations are
//! bundled: a rule and dictionary based [`EnglishLemmatizer`] and a
//! [`SnowballLemmatizer`] that approximates lemmas with Snowball stems for the
//! languages `rust-stemmers` supports.

use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::tokenizer::{split_words, words};

/// Produces the lemma of every word in a text.
///
/// The returned iterator is lazy, finite and single pass. It must skip
/// whitespace, punctuation and other non-word tokens. Casing of the output is
/// irrelevant; the normalizer lowercases it.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a>;
}

impl<L: Lemmatizer + ?Sized> Lemmatizer for std::sync::Arc<L> {
    fn lemmatize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        (**self).lemmatize(text)
    }
}

/// Adapts a plain function into a [`Lemmatizer`].
pub struct FnLemmatizer<F>(pub F);

impl<F> Lemmatizer for FnLemmatizer<F>
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn lemmatize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        Box::new((self.0)(text).into_iter())
    }
}

impl<F> fmt::Debug for FnLemmatizer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnLemmatizer")
    }
}

lazy_static! {
    static ref IRREGULAR: HashMap<&'static str, &'static str> = {
        let pairs: &[(&str, &[&str])] = &[
            ("be", &["am", "is", "are", "was", "were", "been", "being"]),
            ("have", &["has", "had", "having"]),
            ("do", &["does", "did", "done", "doing"]),
            ("go", &["goes", "went", "gone", "going"]),
            ("say", &["said"]),
            ("make", &["made"]),
            ("take", &["took", "taken"]),
            ("see", &["saw", "seen"]),
            ("come", &["came"]),
            ("get", &["got", "gotten"]),
            ("give", &["gave", "given"]),
            ("know", &["knew", "known"]),
            ("think", &["thought"]),
            ("tell", &["told"]),
            ("find", &["found"]),
            ("leave", &["left"]),
            ("feel", &["felt"]),
            ("keep", &["kept"]),
            ("bring", &["brought"]),
            ("buy", &["bought"]),
            ("eat", &["ate", "eaten"]),
            ("write", &["wrote", "written", "writing"]),
            ("run", &["ran"]),
            ("begin", &["began", "begun"]),
            ("drink", &["drank", "drunk"]),
            ("swim", &["swam", "swum"]),
            ("fly", &["flew", "flown"]),
            ("drive", &["drove", "driven"]),
            ("speak", &["spoke", "spoken"]),
            ("break", &["broke", "broken"]),
            ("choose", &["chose", "chosen"]),
            ("sell", &["sold"]),
            ("stand", &["stood"]),
            ("understand", &["understood"]),
            ("sit", &["sat"]),
            ("meet", &["met"]),
            ("pay", &["paid"]),
            ("lay", &["laid"]),
            ("die", &["died", "dying"]),
            ("lie", &["lying", "lied"]),
            ("tie", &["tying", "tied"]),
            ("catch", &["caught"]),
            ("teach", &["taught"]),
            ("fight", &["fought"]),
            ("hold", &["held"]),
            ("lose", &["lost"]),
            ("send", &["sent"]),
            ("spend", &["spent"]),
            ("build", &["built"]),
            ("win", &["won"]),
            ("wear", &["wore", "worn"]),
            ("steal", &["stole", "stolen"]),
            ("forget", &["forgot", "forgotten"]),
            ("hear", &["heard"]),
            ("mean", &["meant"]),
            ("sleep", &["slept"]),
            ("freeze", &["froze", "frozen"]),
            ("ride", &["rode", "ridden"]),
            ("rise", &["rose", "risen"]),
            ("grow", &["grew", "grown"]),
            ("throw", &["threw", "thrown"]),
            ("draw", &["drew", "drawn"]),
            ("shake", &["shook", "shaken"]),
            ("fall", &["fell", "fallen"]),
            ("hide", &["hid", "hidden"]),
            ("bite", &["bitten"]),
            ("child", &["children"]),
            ("man", &["men"]),
            ("woman", &["women"]),
            ("person", &["people"]),
            ("mouse", &["mice"]),
            ("goose", &["geese"]),
            ("foot", &["feet"]),
            ("tooth", &["teeth"]),
            ("knife", &["knives"]),
            ("wife", &["wives"]),
            ("life", &["lives"]),
            ("half", &["halves"]),
            ("wolf", &["wolves"]),
            ("shelf", &["shelves"]),
            ("loaf", &["loaves"]),
            ("cookie", &["cookies"]),
            ("movie", &["movies"]),
        ];
        let mut map = HashMap::new();
        for (lemma, forms) in pairs {
            map.insert(*lemma, *lemma);
            for form in forms.iter() {
                map.insert(*form, *lemma);
            }
        }
        map
    };

    /// Words whose endings look inflected but are not.
    static ref UNINFLECTED: HashSet<&'static str> = [
        "morning", "evening", "during", "ceiling", "nothing", "something", "anything",
        "everything", "pudding", "wedding", "herring", "sterling", "hundred", "speed",
        "naked", "sacred", "wicked", "rugged", "news", "series", "species", "always",
        "perhaps", "towards", "afterwards", "besides", "whereas", "various", "lens",
        "chaos", "atlas", "canvas",
    ]
    .into_iter()
    .collect();
}

/// Dictionary and suffix-rule lemmatizer for English.
///
/// Words that look like names are kept verbatim: a capital anywhere past the
/// first letter ("SPD"), or a leading capital on a word that does not open a
/// sentence ("met Nahles"). A capitalized sentence opener is lemmatized like
/// any other word, so "Trains leave" and "trains leave" agree.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishLemmatizer;

impl EnglishLemmatizer {
    pub fn new() -> Self {
        Self
    }

    /// Lemmas for a single word. A contraction yields a second lemma, e.g.
    /// "isn't" gives "be" and "not".
    fn word_lemmas(word: &str, sentence_start: bool) -> impl Iterator<Item = String> {
        let (base, clitic) = split_clitic(word);
        std::iter::once(lemma(base, sentence_start)).chain(clitic.map(str::to_string))
    }
}

impl Lemmatizer for EnglishLemmatizer {
    fn lemmatize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        Box::new(words(text).flat_map(|w| Self::word_lemmas(&w.text, w.sentence_start)))
    }
}

fn split_clitic(word: &str) -> (&str, Option<&'static str>) {
    match word.to_lowercase().as_str() {
        "can't" => return ("can", Some("not")),
        "won't" => return ("will", Some("not")),
        "shan't" => return ("shall", Some("not")),
        _ => {}
    }
    let Some(at) = word.find('\'') else {
        return (word, None);
    };
    let (base, suffix) = word.split_at(at);
    match suffix.to_lowercase().as_str() {
        "'t" if base.ends_with(['n', 'N']) => (&base[..base.len() - 1], Some("not")),
        "'s" => (base, None),
        "'re" | "'m" => (base, Some("be")),
        "'ll" => (base, Some("will")),
        "'ve" => (base, Some("have")),
        "'d" => (base, Some("would")),
        _ => (word, None),
    }
}

fn lemma(word: &str, sentence_start: bool) -> String {
    let lower = word.to_lowercase();
    if let Some(base) = IRREGULAR.get(lower.as_str()) {
        return (*base).to_string();
    }
    if looks_like_name(word, sentence_start) {
        return lower;
    }
    strip_inflection(&lower)
}

fn looks_like_name(word: &str, sentence_start: bool) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if chars.any(char::is_uppercase) {
        return true;
    }
    first.is_uppercase() && !sentence_start
}

fn strip_inflection(word: &str) -> String {
    if UNINFLECTED.contains(word) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if has_vowel(stem) && stem.chars().count() >= 2 {
            return restore_stem(stem);
        }
    }
    if let Some(stem) = word.strip_suffix("ied") {
        if stem.chars().count() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if has_vowel(stem) && stem.chars().count() >= 3 {
            return restore_stem(stem);
        }
    }
    strip_plural(word)
}

fn strip_plural(word: &str) -> String {
    if word.chars().count() <= 3 || ["ss", "us", "is"].iter().any(|s| word.ends_with(s)) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if ["ss", "sh", "ch", "x", "z"].iter().any(|s| stem.ends_with(s)) {
            return stem.to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

/// Undoes consonant doubling ("runn" -> "run") or restores a silent e
/// ("mak" -> "make", "leav" -> "leave") on a stem left by `-ing`/`-ed`.
fn restore_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    let last = chars[n - 1];
    let prev = chars[n - 2];
    if prev == last && is_consonant(last) && !matches!(last, 'l' | 's' | 'z') {
        return chars[..n - 1].iter().collect();
    }
    if matches!(last, 'v' | 'c') {
        return format!("{stem}e");
    }
    if n == 3 && is_consonant(chars[0]) && is_vowel(prev) && is_consonant(last) && !matches!(last, 'w' | 'x' | 'y') {
        return format!("{stem}e");
    }
    stem.to_string()
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn is_consonant(c: char) -> bool {
    c.is_alphabetic() && !is_vowel(c)
}

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| is_vowel(c) || c == 'y')
}

/// Approximates lemmas with Snowball stems.
pub struct SnowballLemmatizer {
    stemmer: Stemmer,
    language: &'static str,
}

impl SnowballLemmatizer {
    pub fn english() -> Self {
        Self { stemmer: Stemmer::create(Algorithm::English), language: "english" }
    }

    /// Looks up a Snowball algorithm by its lowercase English language name.
    pub fn for_language(name: &str) -> Option<Self> {
        let (algorithm, language) = match name.to_lowercase().as_str() {
            "arabic" => (Algorithm::Arabic, "arabic"),
            "danish" => (Algorithm::Danish, "danish"),
            "dutch" => (Algorithm::Dutch, "dutch"),
            "english" => (Algorithm::English, "english"),
            "finnish" => (Algorithm::Finnish, "finnish"),
            "french" => (Algorithm::French, "french"),
            "german" => (Algorithm::German, "german"),
            "greek" => (Algorithm::Greek, "greek"),
            "hungarian" => (Algorithm::Hungarian, "hungarian"),
            "italian" => (Algorithm::Italian, "italian"),
            "norwegian" => (Algorithm::Norwegian, "norwegian"),
            "portuguese" => (Algorithm::Portuguese, "portuguese"),
            "romanian" => (Algorithm::Romanian, "romanian"),
            "russian" => (Algorithm::Russian, "russian"),
            "spanish" => (Algorithm::Spanish, "spanish"),
            "swedish" => (Algorithm::Swedish, "swedish"),
            "tamil" => (Algorithm::Tamil, "tamil"),
            "turkish" => (Algorithm::Turkish, "turkish"),
            _ => return None,
        };
        Some(Self { stemmer: Stemmer::create(algorithm), language })
    }

    pub fn language(&self) -> &'static str {
        self.language
    }
}

impl fmt::Debug for SnowballLemmatizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowballLemmatizer").field("language", &self.language).finish()
    }
}

impl Lemmatizer for SnowballLemmatizer {
    fn lemmatize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        // Snowball stemmers expect lowercase input.
        Box::new(split_words(text).map(move |w| self.stemmer.stem(&w.to_lowercase()).into_owned()))
    }
}
