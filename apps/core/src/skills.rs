//! Built-in local skills: random numbers and the user's name.

use rand::Rng;
use regex::Regex;
use std::fs;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use crate::paths::ResourcePaths;
use crate::profile::ProfileStore;
use crate::registry::{ContentTransform, Module};
use crate::store::MessageStore;

pub const RANDOM_NUMBER: &str = "random number";
pub const NO_RANDOM_RANGE: &str = "no random range";
pub const NAME_SETTER: &str = "name setter";
pub const NO_NAME: &str = "no name";
pub const NAME_GETTER: &str = "name getter";
pub const DONT_KNOW_NAME: &str = "don't know name";

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+([.,]\d+)?").expect("Invalid regex: number"));

/// Replaces each `%s` of `template` with the next value, in order.
pub fn fill(template: &str, values: &[&str]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut values = values.iter();
    let mut parts = template.split("%s");
    if let Some(first) = parts.next() {
        result.push_str(first);
    }
    for part in parts {
        match values.next() {
            Some(value) => result.push_str(value),
            None => result.push_str("%s"),
        }
        result.push_str(part);
    }
    result
}

/// Limits of a random range found in an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeLimits {
    /// No number at all: use the default range.
    Missing,
    /// Two integers, sorted.
    Range(i64, i64),
    /// One number, or numbers that are not integers.
    Invalid,
}

/// Looks for the first two numbers of `entry`.
pub fn find_range_limits(entry: &str) -> RangeLimits {
    let numbers: Vec<&str> = NUMBER.find_iter(entry).take(2).map(|m| m.as_str()).collect();
    match numbers.as_slice() {
        [] => RangeLimits::Missing,
        [low, high] => match (low.parse::<i64>(), high.parse::<i64>()) {
            (Ok(a), Ok(b)) => RangeLimits::Range(a.min(b), a.max(b)),
            _ => RangeLimits::Invalid,
        },
        _ => RangeLimits::Invalid,
    }
}

/// Answers with a random number in the range given by the utterance, or in `0..100`.
pub struct RandomNumber {
    messages: Arc<MessageStore>,
}

impl RandomNumber {
    pub fn new(messages: Arc<MessageStore>) -> Self {
        Self { messages }
    }
}

impl ContentTransform for RandomNumber {
    fn apply(&self, locale: &str, entry: &str, template: &str, _token: &str) -> (String, String) {
        let mut rng = rand::thread_rng();
        let number = match find_range_limits(entry) {
            RangeLimits::Missing => rng.gen_range(0..100),
            RangeLimits::Range(min, max) if min < max => rng.gen_range(min..max),
            RangeLimits::Range(min, _) => min,
            RangeLimits::Invalid => {
                return (
                    NO_RANDOM_RANGE.to_string(),
                    self.messages.random_message(locale, NO_RANDOM_RANGE),
                )
            }
        };
        (
            RANDOM_NUMBER.to_string(),
            fill(template, &[&number.to_string()]),
        )
    }
}

/// Reads the known first names, one per line. A missing file yields no names.
pub fn load_names(paths: &ResourcePaths) -> Vec<String> {
    let path = paths.names_file();
    match fs::read_to_string(&path) {
        Ok(content) => {
            let names: Vec<String> = content
                .lines()
                .map(|line| line.trim().to_lowercase())
                .filter(|line| !line.is_empty())
                .collect();
            info!("Loaded {} names from {:?}", names.len(), path);
            names
        }
        Err(e) => {
            warn!("No names loaded from {:?}: {}", path, e);
            Vec::new()
        }
    }
}

/// Upper-cases the first letter of every word.
fn capitalize(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stores the name found in the utterance in the user's profile.
pub struct NameSetter {
    names: Vec<String>,
    profiles: Arc<ProfileStore>,
    messages: Arc<MessageStore>,
}

impl NameSetter {
    pub fn new(names: Vec<String>, profiles: Arc<ProfileStore>, messages: Arc<MessageStore>) -> Self {
        Self {
            names,
            profiles,
            messages,
        }
    }

    /// The first known name appearing as a whole word in `entry`.
    pub fn find_name(&self, entry: &str) -> Option<&str> {
        let padded = format!(" {} ", entry.to_lowercase());
        self.names
            .iter()
            .find(|name| padded.contains(&format!(" {} ", name)))
            .map(String::as_str)
    }
}

impl ContentTransform for NameSetter {
    fn apply(&self, locale: &str, entry: &str, template: &str, token: &str) -> (String, String) {
        let Some(name) = self.find_name(entry) else {
            return (NO_NAME.to_string(), self.messages.random_message(locale, NO_NAME));
        };

        let name = capitalize(name);
        self.profiles.update(token, |profile| profile.name = name.clone());
        (NAME_SETTER.to_string(), fill(template, &[&name]))
    }
}

/// Answers with the name stored in the user's profile.
pub struct NameGetter {
    profiles: Arc<ProfileStore>,
    messages: Arc<MessageStore>,
}

impl NameGetter {
    pub fn new(profiles: Arc<ProfileStore>, messages: Arc<MessageStore>) -> Self {
        Self { profiles, messages }
    }
}

impl ContentTransform for NameGetter {
    fn apply(&self, locale: &str, _entry: &str, template: &str, token: &str) -> (String, String) {
        let name = self.profiles.get(token).name;
        if name.trim().is_empty() {
            return (
                DONT_KNOW_NAME.to_string(),
                self.messages.random_message(locale, DONT_KNOW_NAME),
            );
        }
        (NAME_GETTER.to_string(), fill(template, &[&name]))
    }
}

/// The built-in modules of `locale`. Only English patterns ship with the engine.
pub fn modules(
    locale: &str,
    names: &[String],
    profiles: &Arc<ProfileStore>,
    messages: &Arc<MessageStore>,
) -> Vec<Module> {
    if locale != "en" {
        return Vec::new();
    }

    vec![
        Module::new(
            NAME_GETTER,
            &["Do you know my name?"],
            &["Your name is %s!"],
            Arc::new(NameGetter::new(profiles.clone(), messages.clone())),
        ),
        Module::new(
            NAME_SETTER,
            &["My name is ", "You can call me "],
            &["Great! Hi %s"],
            Arc::new(NameSetter::new(
                names.to_vec(),
                profiles.clone(),
                messages.clone(),
            )),
        ),
        Module::new(
            RANDOM_NUMBER,
            &["Give me a random number", "Generate a random number"],
            &["The number is %s"],
            Arc::new(RandomNumber::new(messages.clone())),
        ),
    ]
}
