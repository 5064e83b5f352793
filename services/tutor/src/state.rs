//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the database, the
//! agent runner and the speech client, all created once at startup.

use crate::{config::Config, db::Db, voice::speech::SpeechClient};
use anyhow::{Context, Result};
use preschool_core::{
    llm_client::LLMClient,
    persona::PersonaRegistry,
    progress::StudentRecords,
    runner::AgentRunner,
    toolbox::{ToolBox, ToolInvoker},
    tools::TeachingTools,
};
use std::{collections::HashMap, fs, path::Path, sync::Arc};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub runner: Arc<AgentRunner>,
    pub speech: Arc<dyn SpeechClient>,
    pub config: Arc<Config>,
    /// Number of teaching tools the tool server offers.
    pub tool_count: usize,
    /// Prompt keys loaded from `PROMPTS_PATH`, empty when using built-in prompts.
    pub prompt_overrides: Vec<String>,
}

impl AppState {
    /// Starts the teaching tool server and wires the agent runner to it.
    pub async fn build(
        config: Config,
        db: Arc<Db>,
        llm: Arc<dyn LLMClient>,
        speech: Arc<dyn SpeechClient>,
    ) -> Result<Self> {
        let prompts = match &config.prompts_path {
            Some(path) => load_prompts(path)
                .with_context(|| format!("Failed to load prompts from {}", path.display()))?,
            None => HashMap::new(),
        };
        let mut prompt_overrides: Vec<String> = prompts.keys().cloned().collect();
        prompt_overrides.sort();
        let personas = PersonaRegistry::standard().with_prompt_overrides(&prompts);

        let records: Arc<dyn StudentRecords> = db.clone();
        let toolbox = ToolBox::start(TeachingTools::new(records)).await?;
        let tool_count = toolbox.definitions().len();

        let runner = AgentRunner::new(llm, Arc::new(toolbox), Arc::new(personas))
            .with_max_turns(config.max_turns);
        info!(tool_count, overrides = prompt_overrides.len(), "Application state ready");

        Ok(Self {
            db,
            runner: Arc::new(runner),
            speech,
            config: Arc::new(config),
            tool_count,
            prompt_overrides,
        })
    }
}

/// Reads every `*.md` file in `prompts_path`, keyed by file stem.
pub fn load_prompts(prompts_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    for entry in fs::read_dir(prompts_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}
