use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::profile::UserProfile;

/// Tag returned whenever no intent can answer an utterance.
pub const DONT_UNDERSTAND: &str = "don't understand";

/// Tag returned for utterances over the length limit.
pub const TOO_LONG: &str = "too long";

/// A labeled group of equivalent utterances with their response templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Intent {
    /// Unique tag of the intent within a locale.
    #[validate(length(min = 1))]
    pub tag: String,
    /// Example utterances used for training.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Response templates, one is chosen at random.
    #[validate(length(min = 1))]
    pub responses: Vec<String>,
    /// Tag that must have been resolved last for this intent to answer.
    #[serde(default)]
    pub context: String,
}

impl Intent {
    pub fn new(tag: &str, patterns: &[&str], responses: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
            context: String::new(),
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = context.to_string();
        self
    }
}

/// Canned messages for a tag (e.g. "don't understand"), stored per locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePacket {
    pub tag: String,
    pub messages: Vec<String>,
}

/// An utterance sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRequest {
    pub content: String,
    #[serde(rename = "user_token")]
    pub token: String,
    pub locale: String,
}

/// The engine's answer to a [`ClientRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub content: String,
    pub tag: String,
    pub information: UserProfile,
}
