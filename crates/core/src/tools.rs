//! Teaching Tool Server
//!
//! The tools the teaching personas can call while talking to a child, served over
//! the Model Context Protocol (MCP). Content lookups come from the static tables in
//! [`crate::content`]; progress reads and accomplishment writes go through a
//! [`StudentRecords`] implementation.

use crate::content;
use crate::progress::{StudentRecords, check_rating};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Names of every tool served by [`TeachingTools`].
pub mod names {
    pub const GET_READING_PROGRESS: &str = "get_reading_progress";
    pub const GET_SIGHT_WORDS: &str = "get_sight_words";
    pub const CREATE_PHONICS_EXERCISE: &str = "create_phonics_exercise";
    pub const NEXT_PHONICS_SOUND: &str = "next_phonics_sound";
    pub const GET_STORY_TEMPLATE: &str = "get_story_template";
    pub const GET_PRONUNCIATION_GUIDE: &str = "get_pronunciation_guide";
    pub const GET_ENCOURAGEMENT: &str = "get_encouragement";
    pub const CREATE_READING_QUIZ: &str = "create_reading_quiz";
    pub const RECORD_ACCOMPLISHMENT: &str = "record_accomplishment";
}

const DEFAULT_QUIZ_LENGTH: usize = 3;

// --- Data Structures for Tools ---

#[derive(Deserialize, JsonSchema, Debug)]
pub struct ChildNameArgs {
    /// The child's first name, e.g. "Emma".
    pub child_name: String,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct DifficultyArgs {
    #[schemars(description = "One of 'beginner', 'intermediate' or 'advanced'")]
    pub difficulty_level: String,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct LetterSoundArgs {
    #[schemars(description = "A letter or letter team, e.g. 'b' or 'sh'")]
    pub letter_sound: String,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct CurrentSoundArgs {
    #[schemars(description = "The sound the child has just practiced")]
    pub current_sound: String,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct StoryThemeArgs {
    #[schemars(description = "A theme the child likes, e.g. 'dinosaurs' or 'friendship'")]
    pub theme: String,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct WordArgs {
    /// The word the child is trying to say.
    pub word: String,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhraseKind {
    #[default]
    Praise,
    Correction,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct EncouragementArgs {
    #[schemars(description = "'praise' after a success, 'correction' after a mistake")]
    #[serde(default)]
    pub kind: PhraseKind,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct QuizArgs {
    #[schemars(description = "One of 'beginner', 'intermediate' or 'advanced'")]
    pub difficulty_level: String,
    #[schemars(description = "How many words to ask about (default 3)")]
    pub question_count: Option<u32>,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct RecordAccomplishmentArgs {
    pub child_name: String,
    #[schemars(description = "What the child achieved, in a short sentence")]
    pub achievement: String,
    #[schemars(description = "e.g. 'alphabet', 'phonics', 'sight_words', 'stories'")]
    pub skill_category: String,
    #[schemars(description = "How confident the child was, from 1 (unsure) to 5 (mastered)")]
    pub confidence_level: i64,
}

#[derive(Serialize)]
struct NextSound<'a> {
    current_sound: &'a str,
    next_sound: &'a str,
}

#[derive(Serialize)]
struct StoryReply {
    #[serde(flatten)]
    story: content::StoryTemplate,
    other_themes: Vec<&'static str>,
}

#[derive(Serialize)]
struct Phrase<'a> {
    kind: PhraseKind,
    phrase: &'a str,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Failed to serialize tool result: {}", e))
}

// --- Service and Handler Implementation ---

/// The MCP server exposing the teaching tools.
pub struct TeachingTools {
    records: Arc<dyn StudentRecords>,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for TeachingTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl TeachingTools {
    pub fn new(records: Arc<dyn StudentRecords>) -> Self {
        Self {
            records,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get a child's reading progress and achievements")]
    pub async fn get_reading_progress(
        &self,
        args: Parameters<ChildNameArgs>,
    ) -> Result<String, String> {
        info!(child_name = %args.0.child_name, "Executing tool 'get_reading_progress'");
        let progress = self
            .records
            .reading_progress(&args.0.child_name)
            .await
            .map_err(|e| format!("Could not load reading progress: {}", e))?;
        to_json(&progress)
    }

    #[tool(description = "Get sight words for a difficulty level")]
    pub async fn get_sight_words(&self, args: Parameters<DifficultyArgs>) -> Result<String, String> {
        info!(difficulty = %args.0.difficulty_level, "Executing tool 'get_sight_words'");
        to_json(&content::sight_words(&args.0.difficulty_level))
    }

    #[tool(description = "Create a phonics exercise for a specific letter sound")]
    pub async fn create_phonics_exercise(
        &self,
        args: Parameters<LetterSoundArgs>,
    ) -> Result<String, String> {
        info!(sound = %args.0.letter_sound, "Executing tool 'create_phonics_exercise'");
        to_json(&content::phonics_exercise(&args.0.letter_sound))
    }

    #[tool(description = "Get the next letter sound to learn after the current one")]
    pub async fn next_phonics_sound(
        &self,
        args: Parameters<CurrentSoundArgs>,
    ) -> Result<String, String> {
        let current = args.0.current_sound.trim().to_lowercase();
        to_json(&NextSound {
            current_sound: &current,
            next_sound: content::next_phonics_sound(&current),
        })
    }

    #[tool(description = "Get a short story outline for a theme, with words to practice")]
    pub async fn get_story_template(
        &self,
        args: Parameters<StoryThemeArgs>,
    ) -> Result<String, String> {
        info!(theme = %args.0.theme, "Executing tool 'get_story_template'");
        let story = content::story_template(&args.0.theme);
        let other_themes = content::story_themes()
            .filter(|theme| *theme != story.theme)
            .collect();
        to_json(&StoryReply {
            story,
            other_themes,
        })
    }

    #[tool(description = "Get a sound-it-out pronunciation guide for a word")]
    pub async fn get_pronunciation_guide(
        &self,
        args: Parameters<WordArgs>,
    ) -> Result<String, String> {
        to_json(&content::pronunciation_guide(&args.0.word))
    }

    #[tool(description = "Get a praise or gentle correction phrase to say to the child")]
    pub async fn get_encouragement(
        &self,
        args: Parameters<EncouragementArgs>,
    ) -> Result<String, String> {
        let phrase = match args.0.kind {
            PhraseKind::Praise => content::encouragement(),
            PhraseKind::Correction => content::correction(),
        };
        to_json(&Phrase {
            kind: args.0.kind,
            phrase,
        })
    }

    #[tool(description = "Create a short sight-word reading quiz")]
    pub async fn create_reading_quiz(&self, args: Parameters<QuizArgs>) -> Result<String, String> {
        let count = args
            .0
            .question_count
            .map(|c| c as usize)
            .unwrap_or(DEFAULT_QUIZ_LENGTH);
        info!(difficulty = %args.0.difficulty_level, count, "Executing tool 'create_reading_quiz'");
        to_json(&content::reading_quiz(&args.0.difficulty_level, count))
    }

    #[tool(description = "Save something the child accomplished so parents can see it")]
    pub async fn record_accomplishment(
        &self,
        args: Parameters<RecordAccomplishmentArgs>,
    ) -> Result<String, String> {
        info!(args = ?args.0, "Executing tool 'record_accomplishment'");
        let args = args.0;
        check_rating("confidence_level", args.confidence_level).map_err(|e| e.to_string())?;
        self.records
            .record_accomplishment(
                &args.child_name,
                &args.achievement,
                &args.skill_category,
                args.confidence_level,
            )
            .await
            .map_err(|e| format!("Could not save accomplishment: {}", e))?;
        Ok(format!(
            "OK. Saved '{}' for {}.",
            args.achievement, args.child_name
        ))
    }
}
