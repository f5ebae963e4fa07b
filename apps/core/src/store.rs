//! Persistence of intents, canned messages and trained models.

use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::model::TrainedModel;
use crate::models::{Intent, MessagePacket};
use crate::paths::ResourcePaths;

/// Reads a JSON document, reporting a missing file as a missing resource.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AppError::Resource(path.display().to_string()),
        _ => AppError::Io(e),
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Locale-keyed set of declarative intents.
pub trait IntentStore: Send + Sync {
    fn load(&self, locale: &str) -> Result<Vec<Intent>>;

    fn write(&self, locale: &str, intents: &[Intent]) -> Result<()>;

    /// Validates and appends `intent`, replacing any intent with the same tag.
    fn add(&self, locale: &str, intent: Intent) -> Result<Vec<Intent>> {
        intent.validate()?;
        let mut intents = self.load(locale)?;
        intents.retain(|existing| existing.tag != intent.tag);
        intents.push(intent);
        self.write(locale, &intents)?;
        Ok(intents)
    }

    /// Removes every intent tagged `tag`.
    fn remove(&self, locale: &str, tag: &str) -> Result<Vec<Intent>> {
        let mut intents = self.load(locale)?;
        intents.retain(|intent| intent.tag != tag);
        self.write(locale, &intents)?;
        Ok(intents)
    }
}

/// Intents stored as `intents.json` in each locale directory.
pub struct JsonIntentStore {
    paths: ResourcePaths,
}

impl JsonIntentStore {
    pub fn new(paths: ResourcePaths) -> Self {
        Self { paths }
    }
}

impl IntentStore for JsonIntentStore {
    fn load(&self, locale: &str) -> Result<Vec<Intent>> {
        let intents: Vec<Intent> = read_json(&self.paths.intents_file(locale))?;
        for intent in &intents {
            intent.validate().map_err(|e| {
                AppError::Data(format!("intent '{}' of {}: {}", intent.tag, locale, e))
            })?;
        }
        Ok(intents)
    }

    fn write(&self, locale: &str, intents: &[Intent]) -> Result<()> {
        write_json(&self.paths.intents_file(locale), &intents)
    }
}

#[derive(Default)]
pub struct MemoryIntentStore {
    intents: Mutex<HashMap<String, Vec<Intent>>>,
}

impl MemoryIntentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intents(locale: &str, intents: Vec<Intent>) -> Self {
        let store = Self::new();
        store
            .intents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locale.to_string(), intents);
        store
    }
}

impl IntentStore for MemoryIntentStore {
    fn load(&self, locale: &str) -> Result<Vec<Intent>> {
        Ok(self
            .intents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locale)
            .cloned()
            .unwrap_or_default())
    }

    fn write(&self, locale: &str, intents: &[Intent]) -> Result<()> {
        self.intents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locale.to_string(), intents.to_vec());
        Ok(())
    }
}

/// Canned messages per locale and tag.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: HashMap<String, Vec<MessagePacket>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `messages.json` for every locale, skipping locales without one.
    pub fn load(paths: &ResourcePaths, locales: &[String]) -> Result<Self> {
        let mut store = Self::new();
        for locale in locales {
            match read_json::<Vec<MessagePacket>>(&paths.messages_file(locale)) {
                Ok(packets) => {
                    info!("Loaded {} message tags for {}", packets.len(), locale);
                    store.insert(locale, packets);
                }
                Err(AppError::Resource(path)) => {
                    warn!("No messages for {} ({})", locale, path);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(store)
    }

    pub fn insert(&mut self, locale: &str, packets: Vec<MessagePacket>) {
        self.messages.insert(locale.to_string(), packets);
    }

    pub fn find(&self, locale: &str, tag: &str) -> Option<&MessagePacket> {
        self.messages
            .get(locale)?
            .iter()
            .find(|packet| packet.tag == tag)
    }

    /// A random message for `tag`, or an empty string if there is none.
    pub fn random_message(&self, locale: &str, tag: &str) -> String {
        self.find(locale, tag)
            .and_then(|packet| packet.messages.choose(&mut rand::thread_rng()))
            .cloned()
            .unwrap_or_default()
    }
}

/// One trained model per locale, stored as `training.json`.
#[derive(Debug, Clone)]
pub struct ModelStore {
    paths: ResourcePaths,
}

impl ModelStore {
    pub fn new(paths: ResourcePaths) -> Self {
        Self { paths }
    }

    pub fn exists(&self, locale: &str) -> bool {
        self.paths.model_file(locale).is_file()
    }

    pub fn load(&self, locale: &str) -> Result<TrainedModel> {
        let path = self.paths.model_file(locale);
        info!("Loading the neural network from {:?}", path);
        let model: TrainedModel = read_json(&path)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, locale: &str, model: &TrainedModel) -> Result<()> {
        write_json(&self.paths.model_file(locale), model)
    }

    /// Deletes the stored model so the next startup retrains it.
    pub fn remove(&self, locale: &str) -> Result<()> {
        match std::fs::remove_file(self.paths.model_file(locale)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
