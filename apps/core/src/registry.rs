//! Locale-keyed registry of declarative intents and skill modules.
//!
//! Modules add intents whose responses are rewritten by a [`ContentTransform`]
//! before they reach the user. The resolver only sees the trait, never the
//! concrete skill.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::Intent;

/// Rewrites the response of a matched tag.
///
/// Receives the locale, the raw utterance, the chosen response template and
/// the user token, and returns the final tag with the final text. A skill may
/// answer with a different tag than the one it was called for, e.g. "no name".
pub trait ContentTransform: Send + Sync {
    fn apply(&self, locale: &str, entry: &str, template: &str, token: &str) -> (String, String);
}

impl<F> ContentTransform for F
where
    F: Fn(&str, &str, &str, &str) -> (String, String) + Send + Sync,
{
    fn apply(&self, locale: &str, entry: &str, template: &str, token: &str) -> (String, String) {
        self(locale, entry, template, token)
    }
}

/// An intent provided by code rather than by the dataset.
#[derive(Clone)]
pub struct Module {
    pub tag: String,
    pub patterns: Vec<String>,
    pub responses: Vec<String>,
    pub transform: Arc<dyn ContentTransform>,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("tag", &self.tag)
            .field("patterns", &self.patterns)
            .field("responses", &self.responses)
            .finish_non_exhaustive()
    }
}

impl Module {
    pub fn new(
        tag: &str,
        patterns: &[&str],
        responses: &[&str],
        transform: Arc<dyn ContentTransform>,
    ) -> Self {
        Self {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
            transform,
        }
    }

    /// The module as a plain intent. Module intents never require a context.
    pub fn intent(&self) -> Intent {
        Intent {
            tag: self.tag.clone(),
            patterns: self.patterns.clone(),
            responses: self.responses.clone(),
            context: String::new(),
        }
    }
}

#[derive(Default)]
pub struct IntentRegistry {
    intents: RwLock<HashMap<String, Vec<Intent>>>,
    modules: RwLock<HashMap<String, Vec<Module>>>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module(&self, locale: &str, module: Module) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(locale.to_string())
            .or_default()
            .push(module);
    }

    pub fn register_modules(&self, locale: &str, modules: Vec<Module>) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(locale.to_string())
            .or_default()
            .extend(modules);
    }

    pub fn modules(&self, locale: &str) -> Vec<Module> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locale)
            .cloned()
            .unwrap_or_default()
    }

    /// Replaces the declarative intents of `locale`.
    pub fn set_intents(&self, locale: &str, intents: Vec<Intent>) {
        self.intents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locale.to_string(), intents);
    }

    pub fn intents(&self, locale: &str) -> Vec<Intent> {
        self.intents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locale)
            .cloned()
            .unwrap_or_default()
    }

    /// Declarative intents followed by the intents of every registered module.
    pub fn merged_intents(&self, locale: &str) -> Vec<Intent> {
        self.with_modules(locale, self.intents(locale))
    }

    /// Appends the intents of the modules of `locale` to `intents`.
    pub fn with_modules(&self, locale: &str, mut intents: Vec<Intent>) -> Vec<Intent> {
        intents.extend(self.modules(locale).iter().map(Module::intent));
        intents
    }

    pub fn transform_for(&self, locale: &str, tag: &str) -> Option<Arc<dyn ContentTransform>> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locale)?
            .iter()
            .find(|module| module.tag == tag)
            .map(|module| module.transform.clone())
    }

    /// Runs the transform registered for `tag`, or returns the template untouched.
    pub fn apply(
        &self,
        locale: &str,
        tag: &str,
        entry: &str,
        template: &str,
        token: &str,
    ) -> (String, String) {
        match self.transform_for(locale, tag) {
            Some(transform) => transform.apply(locale, entry, template, token),
            None => (tag.to_string(), template.to_string()),
        }
    }
}
