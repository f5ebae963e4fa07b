//! Corpus builder: vocabulary, classes and training documents of a locale.

use std::collections::BTreeSet;
use tracing::debug;

use super::sentence::{Sentence, TextPipeline};
use crate::error::{AppError, Result};
use crate::models::Intent;
use crate::nn::matrix::Matrix;

/// A stemmed training pattern and the tag it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub tokens: Vec<String>,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    /// Sorted, deduplicated stemmed tokens. Fixes the input positions of the network.
    pub vocabulary: Vec<String>,
    /// Sorted, deduplicated intent tags. Fixes the output positions of the network.
    pub classes: Vec<String>,
    pub documents: Vec<Document>,
}

/// Maps stemmed tokens onto `vocabulary` as a binary bag-of-words vector.
pub fn bag_of_words(tokens: &[String], vocabulary: &[String]) -> Vec<f64> {
    vocabulary
        .iter()
        .map(|word| if tokens.contains(word) { 1.0 } else { 0.0 })
        .collect()
}

/// Builds the corpus of `intents`, which should already be the merged list
/// of declarative and module intents of `locale`.
pub fn organize(locale: &str, intents: &[Intent], pipeline: &TextPipeline) -> Corpus {
    let mut vocabulary = BTreeSet::new();
    let mut classes = BTreeSet::new();
    let mut documents = Vec::new();

    for intent in intents {
        for pattern in &intent.patterns {
            let tokens = pipeline.stem(&Sentence::new(locale, pattern));
            vocabulary.extend(tokens.iter().cloned());
            documents.push(Document {
                tokens,
                tag: intent.tag.clone(),
            });
        }
        classes.insert(intent.tag.clone());
    }

    debug!(
        locale,
        words = vocabulary.len(),
        classes = classes.len(),
        documents = documents.len(),
        "organized corpus"
    );

    Corpus {
        vocabulary: vocabulary.into_iter().collect(),
        classes: classes.into_iter().collect(),
        documents,
    }
}

impl Corpus {
    /// Input (bag of words) and output (one-hot class) matrices, one row per document.
    pub fn training_data(&self) -> Result<(Matrix, Matrix)> {
        if self.documents.is_empty() || self.vocabulary.is_empty() {
            return Err(AppError::Data("the corpus has no training documents".into()));
        }

        let mut inputs = Vec::with_capacity(self.documents.len());
        let mut outputs = Vec::with_capacity(self.documents.len());
        for document in &self.documents {
            let index = self
                .classes
                .binary_search(&document.tag)
                .map_err(|_| AppError::Data(format!("unknown class '{}'", document.tag)))?;
            let mut row = vec![0.0; self.classes.len()];
            row[index] = 1.0;

            inputs.push(bag_of_words(&document.tokens, &self.vocabulary));
            outputs.push(row);
        }

        Ok((Matrix::from_rows(inputs)?, Matrix::from_rows(outputs)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intents() -> Vec<Intent> {
        vec![
            Intent::new("greeting", &["Hello", "Hi there"], &["Hello!"]),
            Intent::new("goodbye", &["Goodbye", "See you later"], &["Bye!"]),
            Intent::new("thanks", &[], &["You're welcome"]),
        ]
    }

    #[test]
    fn test_bag_of_words() {
        let vocabulary = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let tokens = vec!["c".to_string(), "a".to_string(), "z".to_string()];
        assert_eq!(bag_of_words(&tokens, &vocabulary), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_organize_sorts_and_deduplicates() {
        let pipeline = TextPipeline::default();
        let mut all = intents();
        all.push(Intent::new("greeting", &["Hello again"], &["Hey"]));

        let corpus = organize("en", &all, &pipeline);
        assert_eq!(corpus.classes, vec!["goodbye", "greeting", "thanks"]);
        let mut sorted = corpus.vocabulary.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(corpus.vocabulary, sorted);
        assert!(corpus.vocabulary.contains(&"hello".to_string()));
        assert_eq!(corpus.documents.len(), 5);
    }

    #[test]
    fn test_organize_is_deterministic() {
        let pipeline = TextPipeline::default();
        let first = organize("en", &intents(), &pipeline);
        let mut reversed = intents();
        reversed.reverse();
        let second = organize("en", &reversed, &pipeline);
        assert_eq!(first.vocabulary, second.vocabulary);
        assert_eq!(first.classes, second.classes);
        assert_eq!(organize("en", &intents(), &pipeline), first);
    }

    #[test]
    fn test_training_data_is_one_hot() {
        let pipeline = TextPipeline::default();
        let corpus = organize("en", &intents(), &pipeline);
        let (inputs, outputs) = corpus.training_data().unwrap();

        assert_eq!(inputs.shape(), (4, corpus.vocabulary.len()));
        assert_eq!(outputs.shape(), (4, 3));
        for i in 0..outputs.rows() {
            assert_eq!(outputs.row(i).iter().sum::<f64>(), 1.0);
        }
        // "Hello" belongs to "greeting", the second class.
        assert_eq!(outputs.row(0), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_empty_corpus_is_a_data_error() {
        let pipeline = TextPipeline::default();
        let corpus = organize("en", &[], &pipeline);
        assert!(matches!(corpus.training_data(), Err(AppError::Data(_))));
    }
}
