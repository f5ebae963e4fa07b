use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Layout of the resource directory:
///
/// ```text
/// <root>/locales/<locale>/intents.json
/// <root>/locales/<locale>/messages.json
/// <root>/locales/<locale>/stopwords.txt
/// <root>/locales/<locale>/training.json
/// <root>/datasets/names.txt
/// ```
#[derive(Debug, Clone)]
pub struct ResourcePaths {
    root: PathBuf,
}

impl ResourcePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn locale_dir(&self, locale: &str) -> PathBuf {
        self.root.join("locales").join(locale)
    }

    pub fn intents_file(&self, locale: &str) -> PathBuf {
        self.locale_dir(locale).join("intents.json")
    }

    pub fn messages_file(&self, locale: &str) -> PathBuf {
        self.locale_dir(locale).join("messages.json")
    }

    pub fn stopwords_file(&self, locale: &str) -> PathBuf {
        self.locale_dir(locale).join("stopwords.txt")
    }

    /// The trained network of a locale, bound to its vocabulary and classes.
    pub fn model_file(&self, locale: &str) -> PathBuf {
        self.locale_dir(locale).join("training.json")
    }

    /// First names recognized by the name setter, one lower-case name per line.
    pub fn names_file(&self) -> PathBuf {
        self.root.join("datasets").join("names.txt")
    }

    /// Creates the locale directories if they do not exist.
    pub fn init(&self, locales: &[String]) -> Result<(), std::io::Error> {
        for locale in locales {
            let dir = self.locale_dir(locale);
            if !dir.exists() {
                info!("Creating locale directory: {:?}", dir);
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}
