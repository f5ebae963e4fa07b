//! Locale stop-word lists.
//!
//! Lists are read from `stopwords.txt` (one word per line). English falls
//! back to a built-in list when no file is present.

use std::collections::HashMap;
use std::fs;
use tracing::{info, warn};

use crate::error::Result;
use crate::paths::ResourcePaths;

/// Built-in English stop words.
const STOPWORDS_EN: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "for", "yet", "so", "i", "you", "he", "she", "it",
    "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their",
    "mine", "yours", "hers", "ours", "theirs", "this", "that", "these", "those", "who", "whom",
    "which", "whose", "is", "am", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "will", "would", "shall", "should", "can",
    "could", "may", "might", "must", "in", "on", "at", "to", "from", "by", "with", "about",
    "against", "between", "into", "through", "during", "before", "after", "above", "below", "up",
    "down", "out", "off", "over", "under", "again", "further", "here", "there", "then", "once",
    "all", "each", "both", "few", "more", "most", "other", "some", "such", "own", "same", "than",
    "too", "very", "just", "also", "now", "if", "because", "as", "until", "while", "of",
];

/// Stop words of every loaded locale.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    lists: HashMap<String, Vec<String>>,
}

impl StopWords {
    /// Only the built-in English list.
    pub fn builtin() -> Self {
        let mut stopwords = Self::default();
        stopwords.insert("en", STOPWORDS_EN.iter().map(|s| s.to_string()).collect());
        stopwords
    }

    pub fn load(paths: &ResourcePaths, locales: &[String]) -> Result<Self> {
        let mut stopwords = Self::builtin();
        for locale in locales {
            let path = paths.stopwords_file(locale);
            if !path.is_file() {
                warn!("No stop words for {} at {:?}", locale, path);
                continue;
            }
            let words = parse(&fs::read_to_string(&path)?);
            info!("Loaded {} stop words for {}", words.len(), locale);
            stopwords.insert(locale, words);
        }
        Ok(stopwords)
    }

    pub fn insert(&mut self, locale: &str, words: Vec<String>) {
        self.lists.insert(locale.to_string(), words);
    }

    pub fn get(&self, locale: &str) -> &[String] {
        self.lists.get(locale).map_or(&[], Vec::as_slice)
    }

    /// Whether any stop word contains `token`. The match is substring based
    /// on purpose, so "i" is dropped because of "it" as well as "i".
    pub fn matches(&self, locale: &str, token: &str) -> bool {
        self.get(locale).iter().any(|word| word.contains(token))
    }
}

fn parse(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}
