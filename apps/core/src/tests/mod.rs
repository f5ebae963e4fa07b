//! Test Module
//!
//! Cross-module tests for the Olivia engine.
//!
//! ## Test Categories
//! - `classifier_tests`: End-to-end tag prediction on toy corpora
//! - `engine_tests`: Replies, context gating, length guard, skills and persistence
//! - `trainer_tests`: Background retraining through the trainer actor

mod fixtures;

pub mod engine_tests;
