//! Main Entrypoint for the Preschool Tutor
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and command line.
//! 2. Opening the learning database and running migrations.
//! 3. Initializing the language model and speech clients.
//! 4. Starting the interactive console for the chosen student.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use clap::Parser;
use preschool_core::llm_client::{LLMClient, OpenAICompatibleClient};
use preschool_tutor::{
    config::Config,
    console::{Console, DEFAULT_STUDENT},
    db::Db,
    state::AppState,
    voice::speech::{OpenAISpeechClient, SpeechClient, SpeechSettings},
};
use std::{io, sync::Arc};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "A reading teacher for preschoolers", long_about = None)]
struct Args {
    /// Overrides DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,

    /// Overrides TUTOR_STUDENT; the student is asked for at startup when neither is set.
    #[arg(long)]
    student: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let args = Args::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    let student = args.student.or_else(|| config.student.clone());

    // --- 2. Initialize Logging ---
    // stdout belongs to the lesson.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(io::stderr)
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Database ---
    let db = Arc::new(
        Db::connect(&config.database_url)
            .await
            .context("Failed to open database")?,
    );
    db.run_migrations().await?;
    info!(database_url = %config.database_url, "Database ready and migrations are up-to-date.");

    // --- 4. Initialize Shared Services ---
    let openai_config = OpenAIConfig::new()
        .with_api_key(&config.openai_api_key)
        .with_api_base(&config.openai_api_base);
    let llm_client: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::new(
        openai_config.clone(),
        config.chat_model.clone(),
    ));
    let speech_client: Arc<dyn SpeechClient> = Arc::new(OpenAISpeechClient::new(
        openai_config,
        SpeechSettings {
            transcription_model: config.transcription_model.clone(),
            tts_model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            speed: config.tts_speed,
        },
    ));
    info!(model = %config.chat_model, "Service configured.");

    let state = AppState::build(config, db, llm_client, speech_client).await?;

    // --- 5. Run the Console ---
    let stdin = io::stdin();
    let mut console = Console::new(
        state,
        student.clone().unwrap_or_else(|| DEFAULT_STUDENT.to_string()),
        stdin.lock(),
        io::stdout(),
    );
    if student.is_none() {
        console.choose_student()?;
    }
    console.run().await?;

    info!("Tutor has shut down.");
    Ok(())
}
