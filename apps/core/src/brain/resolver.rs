//! Response selection with conversational context gating.

use rand::seq::SliceRandom;
use tracing::debug;

use super::classifier::predict_tag;
use super::sentence::{Sentence, TextPipeline};
use crate::cache::TtlCache;
use crate::error::Result;
use crate::model::TrainedModel;
use crate::models::{Intent, DONT_UNDERSTAND};
use crate::registry::IntentRegistry;
use crate::store::MessageStore;

/// Turns tags into responses for one request.
///
/// `intents` are the merged intents the served model was trained on and
/// `contexts` maps a user token to the last tag resolved for that user.
pub struct Resolver<'a> {
    pub intents: &'a [Intent],
    pub registry: &'a IntentRegistry,
    pub messages: &'a MessageStore,
    pub contexts: &'a TtlCache,
    pub pipeline: &'a TextPipeline,
}

impl<'a> Resolver<'a> {
    fn dont_understand(&self, locale: &str) -> (String, String) {
        (
            DONT_UNDERSTAND.to_string(),
            self.messages.random_message(locale, DONT_UNDERSTAND),
        )
    }

    /// Picks a response for `tag` and returns the final `(tag, text)`.
    ///
    /// Intents with a context only answer when the user's last resolved tag
    /// equals that context. Misses never fail: they resolve to "don't understand".
    pub fn resolve(&self, locale: &str, entry: &str, tag: &str, token: &str) -> (String, String) {
        if tag == DONT_UNDERSTAND {
            return self.dont_understand(locale);
        }

        let Some(intent) = self.intents.iter().find(|intent| intent.tag == tag) else {
            return self.dont_understand(locale);
        };

        if !intent.context.is_empty()
            && self.contexts.get(token).as_deref() != Some(intent.context.as_str())
        {
            debug!(tag, context = %intent.context, "context not satisfied");
            return self.dont_understand(locale);
        }

        self.contexts.insert(token, tag);

        let template = intent
            .responses
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default();
        self.registry.apply(locale, tag, entry, template, token)
    }

    /// Resolves `sentence`, predicting its tag unless `results` already holds it.
    pub fn classify(
        &self,
        sentence: &Sentence,
        results: &TtlCache,
        model: &TrainedModel,
        token: &str,
    ) -> Result<(String, String)> {
        let tag = match results.get(&sentence.content) {
            Some(tag) => tag,
            None => {
                let tag = predict_tag(sentence, model, self.intents, self.pipeline)?;
                results.insert(&sentence.content, &tag);
                tag
            }
        };

        Ok(self.resolve(&sentence.locale, &sentence.content, &tag, token))
    }
}
