//! The serving engine: one trained model per locale plus the shared caches.
//!
//! Models are replaced wholesale under a write lock together with the intents
//! they were trained on; requests clone the current slot and never observe a
//! model paired with intents it has not seen.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, instrument, warn};

use crate::brain::{organize, Resolver, Sentence, StopWords, TextPipeline};
use crate::cache::TtlCache;
use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::model::TrainedModel;
use crate::models::{ClientRequest, Intent, Reply, TOO_LONG};
use crate::nn::{Network, NetworkSummary};
use crate::paths::ResourcePaths;
use crate::profile::ProfileStore;
use crate::registry::IntentRegistry;
use crate::skills;
use crate::store::{IntentStore, JsonIntentStore, MessageStore, ModelStore};

/// A trained model and the declarative intents it was trained on.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub model: TrainedModel,
    pub intents: Vec<Intent>,
}

/// The live model of a locale, its merged intents and the predictions made with it.
#[derive(Clone)]
struct LocaleSlot {
    model: Arc<TrainedModel>,
    intents: Arc<Vec<Intent>>,
    results: Arc<TtlCache>,
}

pub struct Engine {
    config: EngineConfig,
    pipeline: TextPipeline,
    registry: IntentRegistry,
    intents: Arc<dyn IntentStore>,
    models: ModelStore,
    messages: Arc<MessageStore>,
    profiles: Arc<ProfileStore>,
    contexts: TtlCache,
    slots: RwLock<HashMap<String, LocaleSlot>>,
}

impl Engine {
    /// Builds an engine over the resource directory of `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let paths = ResourcePaths::new(&config.res_dir);
        paths.init(&config.locales)?;

        let stopwords = StopWords::load(&paths, &config.locales)?;
        let messages = MessageStore::load(&paths, &config.locales)?;
        let intents = Arc::new(JsonIntentStore::new(paths.clone()));

        Ok(Self::from_parts(
            config,
            paths,
            intents,
            messages,
            TextPipeline::new(stopwords),
        ))
    }

    /// Builds an engine from already loaded collaborators and registers the
    /// built-in skills for every configured locale.
    pub fn from_parts(
        config: EngineConfig,
        paths: ResourcePaths,
        intents: Arc<dyn IntentStore>,
        messages: MessageStore,
        pipeline: TextPipeline,
    ) -> Self {
        let messages = Arc::new(messages);
        let profiles = Arc::new(ProfileStore::new(config.cache_capacity));
        let registry = IntentRegistry::new();

        let names = skills::load_names(&paths);
        for locale in &config.locales {
            registry.register_modules(locale, skills::modules(locale, &names, &profiles, &messages));
        }

        Self {
            contexts: TtlCache::new(config.cache_ttl(), config.cache_capacity),
            models: ModelStore::new(paths),
            config,
            pipeline,
            registry,
            intents,
            messages,
            profiles,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Adds an intent to the dataset.
    ///
    /// Only the stored dataset changes. The live model and the intents it
    /// answers with stay in place until the locale is retrained.
    pub fn add_intent(&self, locale: &str, intent: Intent) -> Result<()> {
        self.intents.add(locale, intent)?;
        Ok(())
    }

    pub fn remove_intent(&self, locale: &str, tag: &str) -> Result<()> {
        self.intents.remove(locale, tag)?;
        Ok(())
    }

    /// The merged intents the live model of `locale` answers with.
    pub fn intents(&self, locale: &str) -> Vec<Intent> {
        self.slot(locale)
            .map(|slot| slot.intents.to_vec())
            .unwrap_or_default()
    }

    /// Trains a new model for `locale` from its stored intents and persists it.
    ///
    /// Nothing live changes until the result is passed to [`Engine::install`].
    /// This is CPU bound and runs for the whole iteration budget; async
    /// callers go through [`crate::trainer::TrainerHandle`].
    #[instrument(skip(self))]
    pub fn train(&self, locale: &str) -> Result<Snapshot> {
        let intents = self.intents.load(locale)?;
        let merged = self.registry.with_modules(locale, intents.clone());
        let corpus = organize(locale, &merged, &self.pipeline);
        let (inputs, outputs) = corpus.training_data()?;

        let mut network = Network::new(
            locale,
            self.config.learning_rate,
            &inputs,
            &outputs,
            &self.config.hidden_layers,
        )?;
        network.train(self.config.training_iterations)?;

        let model = TrainedModel::new(network, &corpus)?;
        self.models.save(locale, &model)?;
        info!(
            words = model.vocabulary.len(),
            classes = model.classes.len(),
            "Saved the {} model",
            locale
        );
        Ok(Snapshot { model, intents })
    }

    /// Makes `snapshot` the live model and intents of `locale` and drops its
    /// cached predictions.
    pub fn install(&self, locale: &str, snapshot: Snapshot) -> Arc<TrainedModel> {
        let model = Arc::new(snapshot.model);
        let merged = self.registry.with_modules(locale, snapshot.intents.clone());
        let slot = LocaleSlot {
            model: model.clone(),
            intents: Arc::new(merged),
            results: Arc::new(TtlCache::new(
                self.config.cache_ttl(),
                self.config.cache_capacity,
            )),
        };

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        self.registry.set_intents(locale, snapshot.intents);
        slots.insert(locale.to_string(), slot);
        model
    }

    /// Loads the stored model of `locale`, training a new one when `force` is
    /// set or when no usable model exists. A stored model that no longer fits
    /// the stored intents is retrained too.
    #[instrument(skip(self))]
    pub fn load_or_train(&self, locale: &str, force: bool) -> Result<Arc<TrainedModel>> {
        if force || !self.models.exists(locale) {
            let snapshot = self.train(locale)?;
            return Ok(self.install(locale, snapshot));
        }

        let intents = self.intents.load(locale)?;
        let merged = self.registry.with_modules(locale, intents.clone());
        let corpus = organize(locale, &merged, &self.pipeline);

        let snapshot = match self.models.load(locale) {
            Ok(model) if model.matches(&corpus) => Snapshot { model, intents },
            Ok(_) => {
                warn!("The saved {} model is out of date with its intents, retraining", locale);
                self.train(locale)?
            }
            Err(e) if e.is_recoverable() => {
                warn!("Failed to load the {} model ({}), retraining", locale, e);
                self.train(locale)?
            }
            Err(e) => return Err(e),
        };
        Ok(self.install(locale, snapshot))
    }

    /// Loads every configured locale and returns the ones that are ready.
    /// A locale whose data fails is logged and skipped.
    pub fn start(&self, force: bool) -> Vec<String> {
        let mut ready = Vec::new();
        for locale in &self.config.locales {
            match self.load_or_train(locale, force) {
                Ok(_) => ready.push(locale.clone()),
                Err(e) => error!("Skipping locale {}: {}", locale, e),
            }
        }
        ready
    }

    pub fn model(&self, locale: &str) -> Option<Arc<TrainedModel>> {
        self.slot(locale).map(|slot| slot.model)
    }

    /// Layer sizes and training diagnostics of the live model of `locale`.
    pub fn summary(&self, locale: &str) -> Option<NetworkSummary> {
        self.model(locale).map(|model| model.network.summary())
    }

    /// Locales with a live model, sorted.
    pub fn locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        locales.sort();
        locales
    }

    fn slot(&self, locale: &str) -> Option<LocaleSlot> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locale)
            .cloned()
    }

    /// `requested` if it has a live model, the default locale otherwise.
    pub fn resolve_locale(&self, requested: &str) -> String {
        if self.slot(requested).is_some() {
            requested.to_string()
        } else {
            self.config.default_locale.clone()
        }
    }

    /// Classifies `content` and resolves it into a `(tag, response)` pair.
    pub fn classify(&self, locale: &str, content: &str, token: &str) -> Result<(String, String)> {
        if content.chars().count() > self.config.max_utterance_chars {
            return Ok((
                TOO_LONG.to_string(),
                self.messages.random_message(locale, TOO_LONG),
            ));
        }

        let slot = self
            .slot(locale)
            .ok_or_else(|| AppError::UnknownLocale(locale.to_string()))?;
        let resolver = Resolver {
            intents: &slot.intents,
            registry: &self.registry,
            messages: &self.messages,
            contexts: &self.contexts,
            pipeline: &self.pipeline,
        };
        resolver.classify(
            &Sentence::new(locale, content),
            &slot.results,
            &slot.model,
            token,
        )
    }

    /// Answers a client request, including the user's profile in the reply.
    #[instrument(skip(self, request), fields(locale = %request.locale))]
    pub fn reply(&self, request: &ClientRequest) -> Result<Reply> {
        let locale = self.resolve_locale(&request.locale);
        let (tag, content) = self.classify(&locale, &request.content, &request.token)?;
        Ok(Reply {
            content,
            tag,
            information: self.profiles.get(&request.token),
        })
    }

    /// Drops expired cache entries and returns how many were removed.
    pub fn purge_caches(&self) -> usize {
        let slots: Vec<LocaleSlot> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        self.contexts.purge_expired()
            + slots
                .iter()
                .map(|slot| slot.results.purge_expired())
                .sum::<usize>()
    }
}
