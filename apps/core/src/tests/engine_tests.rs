//! Engine Tests
//!
//! Classification, context gating, the length guard, skills and model
//! persistence through the public engine API.

use tempfile::tempdir;

use super::fixtures;
use crate::error::AppError;
use crate::models::{ClientRequest, Intent, DONT_UNDERSTAND, TOO_LONG};
use crate::skills;

fn request(content: &str, token: &str) -> ClientRequest {
    ClientRequest {
        content: content.to_string(),
        token: token.to_string(),
        locale: "en".to_string(),
    }
}

#[test]
fn test_reply_to_training_patterns() {
    let dir = tempdir().unwrap();
    let engine = fixtures::trained_engine(&dir);

    let reply = engine.reply(&request("Hello!", "alice")).unwrap();
    assert_eq!(reply.tag, "greeting");
    assert_eq!(reply.content, "Hello!");

    let reply = engine.reply(&request("Goodbye", "alice")).unwrap();
    assert_eq!(reply.tag, "goodbye");
    assert_eq!(reply.content, "Bye!");
}

#[test]
fn test_context_gating_requires_previous_tag() {
    let dir = tempdir().unwrap();
    let engine = fixtures::trained_engine(&dir);

    // The answer before the joke is not understood.
    let reply = engine.reply(&request("Why", "bob")).unwrap();
    assert_eq!(reply.tag, DONT_UNDERSTAND);
    assert_eq!(reply.content, "Sorry, I don't understand");

    let reply = engine.reply(&request("Tell me a joke", "bob")).unwrap();
    assert_eq!(reply.tag, "joke");
    let reply = engine.reply(&request("Why", "bob")).unwrap();
    assert_eq!(reply.tag, "joke answer");
    assert_eq!(reply.content, "To get to the other side!");

    // Contexts are per user token.
    let reply = engine.reply(&request("Why", "carol")).unwrap();
    assert_eq!(reply.tag, DONT_UNDERSTAND);
}

#[test]
fn test_too_long_utterance() {
    let dir = tempdir().unwrap();
    let engine = fixtures::engine(&dir);

    // No model is needed: the guard runs before classification.
    let reply = engine.reply(&request(&"a".repeat(501), "dave")).unwrap();
    assert_eq!(reply.tag, TOO_LONG);
    assert_eq!(reply.content, "That is too long for me");

    let multibyte = "é".repeat(500);
    assert!(matches!(
        engine.reply(&request(&multibyte, "dave")),
        Err(AppError::UnknownLocale(_))
    ));
}

#[test]
fn test_unsupported_locale_falls_back_to_default() {
    let dir = tempdir().unwrap();
    let engine = fixtures::trained_engine(&dir);

    let mut request = request("Hello", "erin");
    request.locale = "pt".to_string();
    assert_eq!(engine.resolve_locale("pt"), "en");
    assert_eq!(engine.reply(&request).unwrap().tag, "greeting");
}

#[test]
fn test_name_skills_update_profile() {
    let dir = tempdir().unwrap();
    let engine = fixtures::trained_engine(&dir);

    let reply = engine.reply(&request("Do you know my name?", "frank")).unwrap();
    assert_eq!(reply.tag, skills::DONT_KNOW_NAME);
    assert_eq!(reply.content, "I don't know your name");

    let reply = engine.reply(&request("My name is John", "frank")).unwrap();
    assert_eq!(reply.tag, skills::NAME_SETTER);
    assert_eq!(reply.content, "Great! Hi John");
    assert_eq!(reply.information.name, "John");

    let reply = engine.reply(&request("Do you know my name?", "frank")).unwrap();
    assert_eq!(reply.tag, skills::NAME_GETTER);
    assert_eq!(reply.content, "Your name is John!");
    assert_eq!(engine.profiles().get("frank").name, "John");
}

#[test]
fn test_added_intent_waits_for_retraining() {
    let dir = tempdir().unwrap();
    let engine = fixtures::trained_engine(&dir);
    let before = engine.model("en").unwrap();

    engine
        .add_intent("en", Intent::new("weather", &["Is it raining"], &["No idea"]))
        .unwrap();
    assert_eq!(engine.reply(&request("Goodbye", "gina")).unwrap().tag, "goodbye");
    assert!(engine.reply(&request("Is it raining", "gina")).is_ok());
    assert!(!engine.intents("en").iter().any(|intent| intent.tag == "weather"));
    assert!(!engine.registry().intents("en").iter().any(|intent| intent.tag == "weather"));

    engine.remove_intent("en", "weather").unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &engine.model("en").unwrap()));
    assert_eq!(engine.reply(&request("Hello", "gina")).unwrap().tag, "greeting");
}

#[test]
fn test_replies_during_retraining_use_the_live_model() {
    let dir = tempdir().unwrap();
    let engine = fixtures::trained_engine(&dir);
    engine
        .add_intent("en", Intent::new("weather", &["Is it raining"], &["No idea"]))
        .unwrap();

    std::thread::scope(|scope| {
        let training = scope.spawn(|| engine.load_or_train("en", true));

        // Distinct utterances so every request reaches the network.
        let mut served = 0;
        while !training.is_finished() {
            engine
                .reply(&request(&format!("Goodbye {}", served), "hank"))
                .unwrap();
            served += 1;
        }

        let model = training.join().unwrap().unwrap();
        assert!(model.classes.contains(&"weather".to_string()));
    });

    assert!(engine.intents("en").iter().any(|intent| intent.tag == "weather"));
    assert!(engine.reply(&request("Is it raining again", "hank")).is_ok());
}

#[test]
fn test_outdated_saved_model_is_retrained_on_load() {
    let dir = tempdir().unwrap();
    fixtures::trained_engine(&dir);

    // A fresh engine whose dataset gained an intent since the model was saved.
    let engine = fixtures::engine(&dir);
    engine
        .add_intent("en", Intent::new("weather", &["Is it raining"], &["No idea"]))
        .unwrap();
    let model = engine.load_or_train("en", false).unwrap();
    assert_eq!(model.classes.len(), 8);
    assert!(model.classes.contains(&"weather".to_string()));
}

#[test]
fn test_load_or_train_reuses_saved_model() {
    let dir = tempdir().unwrap();
    let trained = fixtures::trained_engine(&dir);
    let saved = trained.model("en").unwrap();

    let engine = fixtures::engine(&dir);
    assert_eq!(engine.start(false), vec!["en"]);
    let loaded = engine.model("en").unwrap();
    assert_eq!(loaded.vocabulary, saved.vocabulary);
    assert_eq!(loaded.classes, saved.classes);
    assert_eq!(loaded.trained_at, saved.trained_at);
    assert_eq!(engine.locales(), vec!["en"]);

    let summary = engine.summary("en").unwrap();
    assert_eq!(summary.layers.hidden, 1);
    assert_eq!(summary.layers.output, saved.classes.len());
    assert_eq!(summary.training.errors.len(), 20);
}

#[test]
fn test_start_skips_locale_without_data() {
    let dir = tempdir().unwrap();
    let mut config = fixtures::config(&dir);
    config.locales = vec!["en".into(), "fr".into()];
    let engine = crate::engine::Engine::from_parts(
        config,
        crate::paths::ResourcePaths::new(dir.path()),
        std::sync::Arc::new(crate::store::MemoryIntentStore::with_intents(
            "en",
            fixtures::intents(),
        )),
        fixtures::messages(),
        crate::brain::TextPipeline::default(),
    );

    // "fr" has no intents and no French modules, so its corpus is empty.
    assert_eq!(engine.start(false), vec!["en"]);
    assert!(engine.model("fr").is_none());
    assert_eq!(engine.resolve_locale("fr"), "en");
}

#[test]
fn test_corrupted_model_is_retrained() {
    let dir = tempdir().unwrap();
    let engine = fixtures::trained_engine(&dir);
    let paths = crate::paths::ResourcePaths::new(dir.path());
    std::fs::write(paths.model_file("en"), "{ truncated").unwrap();

    let model = engine.load_or_train("en", false).unwrap();
    assert_eq!(model.classes.len(), 7);
    assert!(crate::store::ModelStore::new(paths).load("en").is_ok());
}

#[test]
fn test_malformed_model_is_retrained() {
    let dir = tempdir().unwrap();
    let engine = fixtures::trained_engine(&dir);
    let paths = crate::paths::ResourcePaths::new(dir.path());
    let store = crate::store::ModelStore::new(paths.clone());

    // Valid JSON whose network has no bias matrices.
    let saved = std::fs::read_to_string(paths.model_file("en")).unwrap();
    let mut document: serde_json::Value = serde_json::from_str(&saved).unwrap();
    document["network"]["biases"] = serde_json::json!([]);
    std::fs::write(paths.model_file("en"), document.to_string()).unwrap();
    assert!(matches!(store.load("en"), Err(AppError::Data(_))));

    let model = engine.load_or_train("en", false).unwrap();
    assert_eq!(model.classes.len(), 7);
    assert!(store.load("en").is_ok());
}
