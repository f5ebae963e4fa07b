// Olivia command line
// Trains the locale networks and talks to them from the terminal.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use olivia_core::models::{ClientRequest, Reply};
use olivia_core::{telemetry, Engine, EngineConfig, TrainerHandle};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "olivia")]
#[command(about = "Olivia - neural intent classification engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrain the networks of the given locales and save them
    Train {
        /// Comma separated locales, defaults to every configured locale
        #[arg(long, value_delimiter = ',')]
        locales: Vec<String>,
    },

    /// Chat with the engine on stdin, one JSON reply per line
    ///
    /// Type `/retrain` to retrain the current locale in the background.
    Chat {
        #[arg(long)]
        locale: Option<String>,
    },

    /// Classify a single utterance and print the JSON reply
    Classify {
        #[arg(long)]
        locale: Option<String>,

        /// The utterance
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::from_env().context("Failed to load the configuration")?;
    telemetry::init(config.log_format)?;

    match cli.command {
        Commands::Train { locales } => train(config, locales).await,
        Commands::Chat { locale } => chat(config, locale).await,
        Commands::Classify { locale, text } => classify(config, locale, text.join(" ")).await,
    }
}

/// Builds the engine and loads every configured locale off the async runtime.
async fn start(config: EngineConfig) -> Result<Arc<Engine>> {
    let engine = tokio::task::spawn_blocking(move || -> Result<Arc<Engine>> {
        let engine = Engine::new(config)?;
        let ready = engine.start(false);
        if ready.is_empty() {
            bail!("No locale could be loaded");
        }
        info!("Ready locales: {}", ready.join(", "));
        Ok(Arc::new(engine))
    })
    .await??;
    Ok(engine)
}

async fn train(config: EngineConfig, locales: Vec<String>) -> Result<()> {
    let locales = if locales.is_empty() {
        config.locales.clone()
    } else {
        locales
    };

    tokio::task::spawn_blocking(move || -> Result<()> {
        let engine = Engine::new(config)?;
        for locale in &locales {
            let model = engine.load_or_train(locale, true)?;
            let summary = model.network.summary();
            println!("{}", serde_json::to_string(&summary)?);
        }
        Ok(())
    })
    .await?
}

async fn chat(config: EngineConfig, locale: Option<String>) -> Result<()> {
    let locale = locale.unwrap_or_else(|| config.default_locale.clone());
    let engine = start(config).await?;
    let trainer = TrainerHandle::new(engine.clone());
    let token = Uuid::new_v4().to_string();
    info!("Chat session {} started in {}", token, locale);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let content = line.trim();
        if content.is_empty() {
            continue;
        }

        if content == "/retrain" {
            let trainer = trainer.clone();
            let locale = engine.resolve_locale(&locale);
            tokio::spawn(async move {
                match trainer.retrain(&locale).await {
                    Ok(summary) => info!("Retrained {}: {:?}", locale, summary.layers),
                    Err(e) => error!("Retraining {} failed: {}", locale, e),
                }
            });
            continue;
        }

        let request = ClientRequest {
            content: content.to_string(),
            token: token.clone(),
            locale: locale.clone(),
        };
        match reply(&engine, request).await? {
            Ok(reply) => println!("{}", serde_json::to_string(&reply)?),
            Err(e) => error!("Failed to reply: {}", e),
        }
    }
    Ok(())
}

async fn classify(config: EngineConfig, locale: Option<String>, text: String) -> Result<()> {
    let locale = locale.unwrap_or_else(|| config.default_locale.clone());
    let engine = start(config).await?;
    let request = ClientRequest {
        content: text,
        token: Uuid::new_v4().to_string(),
        locale,
    };
    let reply = reply(&engine, request).await??;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// Answers `request` on the blocking pool; classification stems the whole corpus.
async fn reply(engine: &Arc<Engine>, request: ClientRequest) -> Result<olivia_core::Result<Reply>> {
    let engine = engine.clone();
    Ok(tokio::task::spawn_blocking(move || engine.reply(&request)).await?)
}
