//! # Brain Module
//!
//! Turns utterances into tags and responses.
//!
//! ## Components
//! - `stopwords`: Locale stop-word lists
//! - `sentence`: Normalization, tokenization and stemming
//! - `corpus`: Vocabulary, classes and training documents
//! - `classifier`: Neural tag prediction
//! - `resolver`: Context gating and response selection

pub mod classifier;
pub mod corpus;
pub mod resolver;
pub mod sentence;
pub mod stopwords;

pub use classifier::{predict_tag, rank, Score};
pub use corpus::{bag_of_words, organize, Corpus, Document};
pub use resolver::Resolver;
pub use sentence::{arrange, Sentence, TextPipeline};
pub use stopwords::StopWords;
