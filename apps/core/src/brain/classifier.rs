//! Neural intent classification.

use std::cmp::Ordering;
use tracing::debug;

use super::corpus::{bag_of_words, organize};
use super::sentence::{Sentence, TextPipeline};
use crate::error::{AppError, Result};
use crate::model::TrainedModel;
use crate::models::Intent;

/// Scores below this are left out of the debug log.
const LOG_THRESHOLD: f64 = 0.004;

/// The output score of one class.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub tag: String,
    pub value: f64,
}

/// Pairs `scores` with `classes` by index and sorts them by descending score.
///
/// The sort is stable, so among equal scores the class listed first wins.
pub fn rank(classes: &[String], scores: &[f64]) -> Vec<Score> {
    let mut ranked: Vec<Score> = classes
        .iter()
        .zip(scores)
        .map(|(tag, &value)| Score {
            tag: tag.clone(),
            value,
        })
        .collect();
    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    ranked
}

/// Returns the most likely tag of `sentence`.
///
/// The corpus is rebuilt from `intents` on every call and checked against the
/// vocabulary and classes the model was trained with, so changed intents
/// surface as [`AppError::StaleModel`] instead of misaligned scores.
pub fn predict_tag(
    sentence: &Sentence,
    model: &TrainedModel,
    intents: &[Intent],
    pipeline: &TextPipeline,
) -> Result<String> {
    let corpus = organize(&sentence.locale, intents, pipeline);
    if !model.matches(&corpus) {
        return Err(AppError::StaleModel {
            locale: sentence.locale.clone(),
        });
    }

    let input = bag_of_words(&pipeline.stem(sentence), &corpus.vocabulary);
    let scores = model.network.predict(&input)?;
    let ranked = rank(&corpus.classes, &scores);

    for score in ranked.iter().filter(|s| s.value >= LOG_THRESHOLD) {
        debug!(
            locale = %sentence.locale,
            entry = %sentence.content,
            "{} - {:.5}",
            score.tag,
            score.value
        );
    }

    ranked
        .into_iter()
        .next()
        .map(|score| score.tag)
        .ok_or_else(|| AppError::Data(format!("no classes for locale '{}'", sentence.locale)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_sorts_descending() {
        let classes = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let ranked = rank(&classes, &[0.1, 0.7, 0.3]);
        let tags: Vec<&str> = ranked.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_first_occurrence_wins_ties() {
        let classes = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let ranked = rank(&classes, &[0.5, 0.9, 0.9]);
        assert_eq!(ranked[0].tag, "b");
        assert_eq!(ranked[1].tag, "c");
    }

    #[test]
    fn test_rank_ignores_extra_scores() {
        let classes = vec!["a".to_string()];
        assert_eq!(rank(&classes, &[0.2, 0.9]).len(), 1);
    }
}
