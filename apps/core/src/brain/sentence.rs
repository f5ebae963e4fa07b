//! Text pipeline: normalization, tokenization, stop-word filtering and stemming.
//!
//! Identical input, locale and stop words always produce the same tokens.

use regex::{Captures, Regex};
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::LazyLock;
use tracing::warn;

use super::stopwords::StopWords;
use crate::locale;

/// Utterances with this many tokens or fewer keep their stop words, so short
/// commands like "how are you" are not erased entirely.
const MIN_TOKENS_FOR_STOPWORDS: usize = 4;

// Sentence punctuation following a letter, possibly after whitespace.
static TRAILING_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{L})((?:\s*[.?!¿¡])+)").expect("Invalid regex: trailing punctuation")
});

/// Strips punctuation that follows letters, turns hyphens into spaces and trims.
///
/// Only the punctuation goes: whitespace inside the run is kept, so the words
/// on either side stay apart.
pub fn arrange(content: &str) -> String {
    let content = content.replace('-', " ");
    TRAILING_PUNCTUATION
        .replace_all(&content, |caps: &Captures| {
            let spacing: String = caps[2].chars().filter(|c| c.is_whitespace()).collect();
            format!("{}{}", &caps[1], spacing)
        })
        .trim()
        .to_string()
}

/// A normalized utterance in a given locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub locale: String,
    pub content: String,
}

impl Sentence {
    pub fn new(locale: &str, content: &str) -> Self {
        Self {
            locale: locale.to_string(),
            content: arrange(content),
        }
    }
}

fn algorithm_for(language: &str) -> Option<Algorithm> {
    let algorithm = match language {
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "english" => Algorithm::English,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "greek" => Algorithm::Greek,
        "hungarian" => Algorithm::Hungarian,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "romanian" => Algorithm::Romanian,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        "turkish" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algorithm)
}

/// Turns sentences into stemmed token lists.
#[derive(Debug, Clone)]
pub struct TextPipeline {
    stopwords: StopWords,
}

impl Default for TextPipeline {
    fn default() -> Self {
        Self::new(StopWords::builtin())
    }
}

impl TextPipeline {
    pub fn new(stopwords: StopWords) -> Self {
        Self { stopwords }
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }

    /// Lower-cased whitespace tokens, without stop words when there are more
    /// than four of them.
    pub fn tokenize(&self, sentence: &Sentence) -> Vec<String> {
        let tokens: Vec<String> = sentence
            .content
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        if tokens.len() <= MIN_TOKENS_FOR_STOPWORDS {
            return tokens;
        }

        tokens
            .into_iter()
            .filter(|token| !self.stopwords.matches(&sentence.locale, token))
            .collect()
    }

    /// Stems the tokens of `sentence` with the stemmer of its language
    /// (English for unknown locales). Languages without a stemmer yield no
    /// tokens.
    pub fn stem(&self, sentence: &Sentence) -> Vec<String> {
        let language = locale::name_by_tag(&sentence.locale).unwrap_or("english");

        let Some(algorithm) = algorithm_for(language) else {
            warn!("Stemmer error: no stemmer for language '{}'", language);
            return Vec::new();
        };
        let stemmer = Stemmer::create(algorithm);

        self.tokenize(sentence)
            .iter()
            .map(|token| stemmer.stem(token).into_owned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrange_strips_punctuation_after_letters() {
        assert_eq!(arrange("Hello!"), "Hello");
        assert_eq!(arrange("How are you ?"), "How are you");
        assert_eq!(arrange("What is it?!"), "What is it");
        assert_eq!(arrange("  Hi.  "), "Hi");
        assert_eq!(arrange("¿Qué tal?"), "¿Qué tal");
    }

    #[test]
    fn test_arrange_keeps_words_apart() {
        assert_eq!(arrange("Hi .there"), "Hi there");
        assert_eq!(arrange("wait ...what now"), "wait what now");
        assert_eq!(arrange("Hi. .there"), "Hi  there");
        assert_eq!(arrange("Hi.there"), "Hithere");
    }

    #[test]
    fn test_arrange_keeps_numbers_punctuation() {
        assert_eq!(arrange("Version 2.5 is out"), "Version 2.5 is out");
        assert_eq!(arrange("1 + 1 = 2."), "1 + 1 = 2.");
    }

    #[test]
    fn test_arrange_replaces_hyphens() {
        assert_eq!(arrange("sci-fi movies"), "sci fi movies");
        assert_eq!(arrange("word-."), "word");
    }

    #[test]
    fn test_arrange_is_idempotent() {
        let inputs = [
            "Hello!",
            "a. .",
            "a . . b",
            "wait... what?!",
            "-hi-!-",
            "¡Hola! ¿Cómo estás?",
            "x - . y",
            "",
            "   ",
            "3.14 is pi.",
            "Hi .there",
            "wait ...what now",
        ];
        for input in inputs {
            let once = arrange(input);
            assert_eq!(arrange(&once), once, "arrange not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_tokenize_keeps_short_sentences() {
        let pipeline = TextPipeline::default();
        let tokens = pipeline.tokenize(&Sentence::new("en", "How are you"));
        assert_eq!(tokens, vec!["how", "are", "you"]);
    }

    #[test]
    fn test_tokenize_drops_stopwords_in_long_sentences() {
        let pipeline = TextPipeline::default();
        let tokens = pipeline.tokenize(&Sentence::new("en", "Tell me the weather in Paris"));
        assert_eq!(tokens, vec!["tell", "weather", "paris"]);
    }

    #[test]
    fn test_stem() {
        let pipeline = TextPipeline::default();
        let stems = pipeline.stem(&Sentence::new("en", "Running jumps"));
        assert_eq!(stems, vec!["run", "jump"]);
    }

    #[test]
    fn test_stem_unknown_locale_uses_english() {
        let pipeline = TextPipeline::default();
        let stems = pipeline.stem(&Sentence::new("xx", "cats"));
        assert_eq!(stems, vec!["cat"]);
    }

    #[test]
    fn test_stem_without_stemmer_is_empty() {
        let pipeline = TextPipeline::default();
        assert!(pipeline.stem(&Sentence::new("ca", "Hola món")).is_empty());
    }

    #[test]
    fn test_stem_is_deterministic() {
        let pipeline = TextPipeline::default();
        let sentence = Sentence::new("en", "Give me a random number between one and ten");
        assert_eq!(pipeline.stem(&sentence), pipeline.stem(&sentence));
    }
}
