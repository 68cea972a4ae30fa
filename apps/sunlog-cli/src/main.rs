use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use serde_json::json;
use sunlog_engine::ExposureScoreEngine;
use sunlog_ops::init_tracing;
use sunlog_stats::{monthly_summary, StatisticsAggregator};
use sunlog_types::{
    config::SunlogConfig, exposure::ExposureContext, session::SessionRecord, skin::SkinClass,
};
use sunlog_vision::SkinToneClassifier;
use tracing::info;

mod source;

use source::JsonFileSource;

#[derive(Debug, Parser)]
#[command(name = "sunlog", version, about = "Sun exposure analytics toolkit")]
struct Cli {
    /// TOML configuration file (defaults to $SUNLOG_CONFIG, then configs/dev.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Estimate a skin class from a captured image.
    Classify {
        /// Base64 payload file, optionally with a data URI header.
        path: PathBuf,
        /// Treat the file as raw image bytes instead of base64 text.
        #[arg(long)]
        raw: bool,
        #[arg(long, conflicts_with = "raw")]
        paced: bool,
    },
    /// Score one day of sessions.
    Score {
        #[arg(long)]
        sessions: PathBuf,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 3)]
        skin_class: u8,
        #[arg(long)]
        uv: Option<f64>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Streak, totals and monthly summary per user.
    Stats {
        #[arg(long)]
        sessions: PathBuf,
        #[arg(long = "user", required = true)]
        users: Vec<String>,
        #[arg(long)]
        today: Option<NaiveDate>,
        /// Simulate a store without a date index.
        #[arg(long)]
        unordered: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.clone());
    init_tracing(&config.ops)?;

    match cli.command {
        Command::Classify { path, raw, paced } => classify(&config, path, raw, paced).await,
        Command::Score {
            sessions,
            date,
            skin_class,
            uv,
            user,
        } => score(&config, sessions, date, skin_class, uv, user).await,
        Command::Stats {
            sessions,
            users,
            today,
            unordered,
        } => stats(&config, sessions, users, today, unordered).await,
    }
}

async fn classify(config: &SunlogConfig, path: PathBuf, raw: bool, paced: bool) -> Result<()> {
    let classifier = SkinToneClassifier::new(config.classifier.clone());
    let image_ref = path.display().to_string();
    let classification = if raw {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {image_ref}"))?;
        classifier.classify(Some(&bytes), &image_ref)
    } else {
        let payload = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {image_ref}"))?;
        if paced {
            classifier.classify_paced(&payload, &image_ref).await
        } else {
            classifier.classify_payload(&payload, &image_ref)
        }
    };
    info!(
        "Classified {} as skin class {} ({:?})",
        image_ref, classification.skin_class, classification.confidence
    );
    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}

async fn score(
    config: &SunlogConfig,
    sessions: PathBuf,
    date: Option<NaiveDate>,
    skin_class: u8,
    uv: Option<f64>,
    user: Option<String>,
) -> Result<()> {
    let skin_class = SkinClass::new(skin_class)
        .ok_or_else(|| anyhow!("skin class must be between 1 and 6, got {skin_class}"))?;
    let mut records = read_sessions(&sessions).await?;
    if let Some(user) = user {
        records.retain(|record| record.user_id == user);
    }
    let day = date.unwrap_or_else(|| Local::now().date_naive());
    let ctx = ExposureContext {
        skin_class,
        ambient_uv_index: uv,
    };

    let engine = ExposureScoreEngine::new(config.scoring.clone())?;
    let result = engine.evaluate_day(&records, day, &ctx);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn stats(
    config: &SunlogConfig,
    sessions: PathBuf,
    users: Vec<String>,
    today: Option<NaiveDate>,
    unordered: bool,
) -> Result<()> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let source = JsonFileSource::new(sessions, !unordered);
    let aggregator = StatisticsAggregator::new(config.stats.clone());

    let reports = join_all(users.iter().map(|user| {
        let source = &source;
        let aggregator = &aggregator;
        async move {
            let history = aggregator.fetch_history(source, user).await;
            json!({
                "user": user,
                "statistics": aggregator.statistics(&history, today),
                "month": monthly_summary(&history, today.year(), today.month()),
            })
        }
    }))
    .await;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

async fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading sessions from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing sessions from {}", path.display()))
}

fn load_config(explicit: Option<PathBuf>) -> SunlogConfig {
    let from_env = env::var("SUNLOG_CONFIG").ok().map(PathBuf::from);
    let path = explicit
        .or(from_env)
        .unwrap_or_else(|| PathBuf::from("configs/dev.toml"));
    match SunlogConfig::from_file(&path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    path.display()
                );
                SunlogConfig::default()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                path.display()
            );
            SunlogConfig::default()
        }
    }
}
