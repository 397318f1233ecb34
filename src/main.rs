use anyhow::Context;
use async_openai::{config::OpenAIConfig, Client};
use clap::{Parser, Subcommand};
use narrator_backend::domain::cleanup::{CleanupService, CleanupServiceApi};
use narrator_backend::domain::narration::{
    CharEstimator, ChunkPlanner, LengthEstimator, NarrationService, NarrationServiceApi,
    TiktokenEstimator, Tone, Voice,
};
use narrator_backend::domain::session::{
    ChunkReport, SessionOptions, SessionService, SessionServiceApi,
};
use narrator_backend::error::AppError;
use narrator_backend::infrastructure::config::{Config, LengthUnits, LogFormat, StoreBackend};
use narrator_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use narrator_backend::infrastructure::repositories::{
    InMemoryNarrationRepository, MokaSessionRepository, NarrationRepository,
    OpenAiSpeechRepository, OpenAiTranslationRepository, PgNarrationRepository,
    PgSessionRepository, SessionRepository,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "narrator", about = "Chunked, cached narration of long texts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Narrate a text file chunk by chunk, writing one MP3 per chunk
    Narrate {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "nova")]
        voice: Voice,
        #[arg(long, default_value = "neutral")]
        tone: Tone,
        /// Translate into the target language before narrating
        #[arg(long)]
        translate: bool,
        #[arg(long, default_value = "narration")]
        out_dir: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        source_url: Option<String>,
        /// Chunk budget for this run, instead of MAX_CHUNK_LENGTH
        #[arg(long)]
        max_chunk_length: Option<usize>,
    },
    /// Translate a text file without narrating it
    Translate {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        source_url: Option<String>,
    },
    /// List the most recent records
    History {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Remove duplicate records, keeping the best of each group
    Cleanup {
        #[arg(long)]
        dry_run: bool,
    },
    /// Print store statistics
    Analyze,
    /// Recompute missing or stale content keys
    BackfillKeys,
    /// Apply database migrations
    Migrate,
}

struct Stores {
    narration: Arc<dyn NarrationRepository>,
    sessions: Arc<dyn SessionRepository>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        store_backend = ?config.store_backend,
        length_units = ?config.length_units,
        max_chunk_length = config.max_chunk_length,
        "Starting narrator"
    );

    match cli.command {
        Command::Migrate => {
            let pool = connect(&config).await?;
            run_migrations(&pool).await?;
            tracing::info!("Migrations applied");
        }
        Command::Cleanup { dry_run } => {
            let cleanup = CleanupService::new(build_stores(&config).await?.narration);
            let report = cleanup.cleanup_duplicates(dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Analyze => {
            let cleanup = CleanupService::new(build_stores(&config).await?.narration);
            let stats = cleanup.analyze().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::BackfillKeys => {
            let cleanup = CleanupService::new(build_stores(&config).await?.narration);
            let updated = cleanup.backfill_content_keys().await?;
            println!("{} content keys updated", updated);
        }
        Command::History { limit, offset } => {
            let stores = build_stores(&config).await?;
            let narration = build_narration_service(&config, stores.narration)?;
            let records = narration.history(limit, offset).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Translate { file, source_url } => {
            let stores = build_stores(&config).await?;
            let narration = build_narration_service(&config, stores.narration)?;
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let outcome = narration.translate_standalone(text, source_url).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Narrate {
            file,
            voice,
            tone,
            translate,
            out_dir,
            title,
            source_url,
            max_chunk_length,
        } => {
            let stores = build_stores(&config).await?;
            let narration = Arc::new(build_narration_service(&config, stores.narration)?);
            let planner = Arc::new(ChunkPlanner::new(
                build_estimator(&config)?,
                config.max_chunk_length,
            )?);
            let sessions = SessionService::new(
                stores.sessions,
                narration.clone(),
                planner,
                chrono::Duration::seconds(config.session_ttl_secs),
            );

            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let options = SessionOptions {
                voice,
                tone,
                translate,
                source_url,
                title,
                max_chunk_length,
            };

            narrate(&sessions, narration.as_ref(), &text, options, &out_dir).await?;
        }
    }

    Ok(())
}

async fn narrate(
    sessions: &SessionService,
    narration: &NarrationService,
    text: &str,
    options: SessionOptions,
    out_dir: &Path,
) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let started = sessions.start(text, options).await?;
    tracing::info!(
        session_id = %started.session_id,
        total_chunks = started.total_chunks,
        "Narrating"
    );

    let mut failed = 0;
    loop {
        let next = match sessions.process_next(started.session_id).await {
            Ok(next) => next,
            Err(e) => {
                let err = AppError::from(e);
                tracing::error!(
                    session_id = %started.session_id,
                    kind = err.kind(),
                    transient = err.is_transient(),
                    error = %err,
                    "Session stopped"
                );
                return Err(err.into());
            }
        };

        match &next.report {
            ChunkReport::Done { record_id, .. } => {
                let audio = match next.transient_audio {
                    Some(audio) => audio,
                    None => narration.audio_for(*record_id).await?,
                };
                let path = out_dir.join(format!("{:04}.mp3", next.index));
                tokio::fs::write(&path, &audio)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!(
                    chunk_index = next.index,
                    path = %path.display(),
                    audio_size = audio.len(),
                    "Chunk audio written"
                );
            }
            ChunkReport::Failed { error, .. } => {
                failed += 1;
                tracing::warn!(chunk_index = next.index, error = %error, "Chunk skipped");
            }
        }

        if next.is_last {
            break;
        }
    }

    println!(
        "{} of {} chunks narrated into {}",
        started.total_chunks - failed,
        started.total_chunks,
        out_dir.display()
    );

    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<Arc<narrator_backend::infrastructure::db::DbPool>> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;

    // Create database connection pool
    let pool = create_pool(database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    Ok(Arc::new(pool))
}

async fn build_stores(config: &Config) -> anyhow::Result<Stores> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let pool = connect(config).await?;
            Ok(Stores {
                narration: Arc::new(PgNarrationRepository::new(pool.clone())),
                sessions: Arc::new(PgSessionRepository::new(pool)),
            })
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores, nothing survives this process");
            let ttl = std::time::Duration::from_secs(config.session_ttl_secs.max(1) as u64);
            Ok(Stores {
                narration: Arc::new(InMemoryNarrationRepository::new()),
                sessions: Arc::new(MokaSessionRepository::new(ttl)),
            })
        }
    }
}

fn build_narration_service(
    config: &Config,
    store: Arc<dyn NarrationRepository>,
) -> anyhow::Result<NarrationService> {
    let api_key = config.require_openai_api_key()?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(config.openai_base_url.clone());
    let client = Arc::new(Client::with_config(openai_config));

    let translator = Arc::new(OpenAiTranslationRepository::new(
        client,
        config.translation_model.clone(),
    ));
    let synthesizer = Arc::new(OpenAiSpeechRepository::new(
        api_key.to_string(),
        config.openai_base_url.clone(),
        config.speech_model.clone(),
    )?);

    Ok(NarrationService::new(
        store,
        translator,
        synthesizer,
        config.target_language.clone(),
    ))
}

fn build_estimator(config: &Config) -> anyhow::Result<Arc<dyn LengthEstimator>> {
    Ok(match config.length_units {
        LengthUnits::Tokens => Arc::new(TiktokenEstimator::for_model(&config.tokenizer_model)?),
        LengthUnits::Chars => Arc::new(CharEstimator),
    })
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "narrator_backend=debug,narrator=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "narrator_backend=debug,narrator=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
