//! Olivia intent engine.
//!
//! Classifies utterances with a from-scratch feed-forward network trained per
//! locale, then resolves the predicted tag into a response, honoring
//! conversational context and skill modules.

pub mod brain;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod locale;
pub mod model;
pub mod models;
pub mod nn;
pub mod paths;
pub mod profile;
pub mod registry;
pub mod skills;
pub mod store;
pub mod telemetry;
pub mod trainer;

#[cfg(test)]
mod tests;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{AppError, Result};
pub use trainer::TrainerHandle;
