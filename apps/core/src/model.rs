//! The trained artifact of a locale.
//!
//! Vocabulary and classes define the input and output positions of the
//! network, so they are persisted with it and never regenerated on their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::brain::corpus::Corpus;
use crate::error::{AppError, Result};
use crate::nn::network::Network;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub network: Network,
    pub vocabulary: Vec<String>,
    pub classes: Vec<String>,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    /// Binds a trained network to the corpus it was trained on.
    pub fn new(network: Network, corpus: &Corpus) -> Result<Self> {
        let model = Self {
            network,
            vocabulary: corpus.vocabulary.clone(),
            classes: corpus.classes.clone(),
            trained_at: Utc::now(),
        };
        model.validate()?;
        Ok(model)
    }

    /// Checks the network itself and that its input and output widths fit
    /// the vocabulary and classes.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        if self.network.input_size() != self.vocabulary.len()
            || self.network.output_size() != self.classes.len()
        {
            return Err(AppError::Data(format!(
                "network of shape {}x{} does not fit {} words and {} classes",
                self.network.input_size(),
                self.network.output_size(),
                self.vocabulary.len(),
                self.classes.len()
            )));
        }
        Ok(())
    }

    pub fn locale(&self) -> &str {
        self.network.locale()
    }

    /// Whether `corpus` still yields the vocabulary and classes this network was trained with.
    pub fn matches(&self, corpus: &Corpus) -> bool {
        self.vocabulary == corpus.vocabulary && self.classes == corpus.classes
    }
}
