//! Shared engine fixtures: a toy English dataset on a temporary resource directory.

use std::sync::Arc;
use tempfile::TempDir;

use crate::brain::{predict_tag, Sentence, TextPipeline};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::models::{Intent, MessagePacket, DONT_UNDERSTAND, TOO_LONG};
use crate::paths::ResourcePaths;
use crate::skills;
use crate::store::{MemoryIntentStore, MessageStore};

/// Random initializations occasionally settle in a poor minimum on a corpus
/// this small, so the fixture retrains until every expected tag is predicted.
const MAX_TRAINING_ATTEMPTS: usize = 8;

pub const EXPECTED_TAGS: &[(&str, &str)] = &[
    ("Hello", "greeting"),
    ("Goodbye", "goodbye"),
    ("Tell me a joke", "joke"),
    ("Why", "joke answer"),
    ("My name is John", skills::NAME_SETTER),
    ("Do you know my name?", skills::NAME_GETTER),
];

pub fn intents() -> Vec<Intent> {
    vec![
        Intent::new("greeting", &["Hello", "Hi there"], &["Hello!"]),
        Intent::new("goodbye", &["Goodbye", "See you later"], &["Bye!"]),
        Intent::new(
            "joke",
            &["Tell me a joke", "Make me laugh"],
            &["Why did the chicken cross the road?"],
        ),
        Intent::new("joke answer", &["Why", "Why is that"], &["To get to the other side!"])
            .with_context("joke"),
    ]
}

pub fn messages() -> MessageStore {
    let packet = |tag: &str, message: &str| MessagePacket {
        tag: tag.into(),
        messages: vec![message.into()],
    };
    let mut store = MessageStore::new();
    store.insert(
        "en",
        vec![
            packet(DONT_UNDERSTAND, "Sorry, I don't understand"),
            packet(TOO_LONG, "That is too long for me"),
            packet(skills::NO_NAME, "What is your name?"),
            packet(skills::DONT_KNOW_NAME, "I don't know your name"),
        ],
    );
    store
}

pub fn config(dir: &TempDir) -> EngineConfig {
    EngineConfig {
        res_dir: dir.path().to_path_buf(),
        hidden_layers: vec![20],
        training_iterations: 1000,
        ..EngineConfig::default()
    }
}

/// An untrained engine over the toy dataset.
pub fn engine(dir: &TempDir) -> Engine {
    let config = config(dir);
    let paths = ResourcePaths::new(&config.res_dir);
    std::fs::create_dir_all(paths.names_file().parent().unwrap()).unwrap();
    std::fs::write(paths.names_file(), "mary\njohn\n").unwrap();

    Engine::from_parts(
        config,
        paths,
        Arc::new(MemoryIntentStore::with_intents("en", intents())),
        messages(),
        TextPipeline::default(),
    )
}

/// Whether the live "en" model predicts every expected tag.
pub fn fits_expected_tags(engine: &Engine) -> bool {
    let model = engine.model("en").unwrap();
    let intents = engine.intents("en");
    let pipeline = TextPipeline::default();
    EXPECTED_TAGS.iter().all(|(utterance, tag)| {
        predict_tag(&Sentence::new("en", utterance), &model, &intents, &pipeline).unwrap() == *tag
    })
}

/// Trains `engine` for "en" until every expected tag is predicted.
pub fn train_until_fit(engine: &Engine) {
    for _ in 0..MAX_TRAINING_ATTEMPTS {
        engine.load_or_train("en", true).unwrap();
        if fits_expected_tags(engine) {
            return;
        }
    }
    panic!("toy network did not fit in {} attempts", MAX_TRAINING_ATTEMPTS);
}

/// A trained engine over the toy dataset.
pub fn trained_engine(dir: &TempDir) -> Engine {
    let engine = engine(dir);
    train_until_fit(&engine);
    engine
}
