//! Teaching Personas
//!
//! Each persona is a named block of instructions plus the tools it may call and
//! the personas it may hand the conversation to. Which persona answers is decided
//! by the model through `transfer_to_<persona>` handoff tools; nothing in this
//! crate classifies the child's intent.

use crate::tools::names;
use anyhow::Result;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolArgs, FunctionObjectArgs};
use serde_json::json;
use std::collections::HashMap;

pub const MAIN_TEACHER: &str = "MainTeacher";

const PATIENT_TEACHER_PROMPT: &str = include_str!("../prompts/patient_teacher.md");
const HANDOFF_PREAMBLE: &str = include_str!("../prompts/handoff_preamble.md");

/// Prompt key of the shared teacher prompt in a prompts directory.
pub const PATIENT_TEACHER_KEY: &str = "patient_teacher";

#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    /// The lesson topic recorded for sessions this persona finished.
    pub topic: String,
    pub handoff_description: String,
    /// Persona-specific instructions, without the shared teacher prompt.
    pub instructions: String,
    pub tools: Vec<String>,
    pub handoffs: Vec<String>,
}

impl Persona {
    /// The full system prompt: handoff preamble, shared teacher prompt, persona
    /// instructions and, when known, a description of the child.
    pub fn system_prompt(&self, shared_prompt: &str, student_context: Option<&str>) -> String {
        let mut prompt = String::new();
        if !self.handoffs.is_empty() {
            prompt.push_str(HANDOFF_PREAMBLE.trim_end());
            prompt.push_str("\n\n");
        }
        prompt.push_str(shared_prompt.trim_end());
        prompt.push_str("\n\n");
        prompt.push_str(self.instructions.trim_end());
        if let Some(context) = student_context {
            prompt.push_str("\n\n# About the child you are teaching\n\n");
            prompt.push_str(context.trim_end());
        }
        prompt
    }

    pub fn allows_tool(&self, tool_name: &str) -> bool {
        self.tools.iter().any(|t| t == tool_name)
    }

    pub fn can_hand_off_to(&self, persona_name: &str) -> bool {
        self.handoffs.iter().any(|h| h == persona_name)
    }

    /// Name of the tool other personas call to hand the conversation to this one.
    pub fn handoff_tool_name(&self) -> String {
        handoff_tool_name(&self.name)
    }

    fn handoff_tool(&self) -> Result<ChatCompletionTool> {
        Ok(ChatCompletionToolArgs::default()
            .function(
                FunctionObjectArgs::default()
                    .name(self.handoff_tool_name())
                    .description(format!(
                        "Handoff to the {} agent to handle the request. {}",
                        self.name, self.handoff_description
                    ))
                    .parameters(json!({
                        "type": "object",
                        "properties": {},
                        "additionalProperties": false
                    }))
                    .build()?,
            )
            .build()?)
    }
}

/// Converts a persona name to its handoff tool name, e.g. `PhonicsTeacher` to
/// `transfer_to_phonics_teacher`.
pub fn handoff_tool_name(persona_name: &str) -> String {
    format!("transfer_to_{}", snake_case(persona_name))
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

struct PersonaSpec {
    name: &'static str,
    topic: &'static str,
    handoff_description: &'static str,
    instructions: &'static str,
    tools: &'static [&'static str],
}

const SPECIALISTS: [PersonaSpec; 7] = [
    PersonaSpec {
        name: "PhonicsTeacher",
        topic: "phonics",
        handoff_description: "Specialist for letter sounds, phonics, and pronunciation practice",
        instructions: include_str!("../prompts/phonics_teacher.md"),
        tools: &[
            names::CREATE_PHONICS_EXERCISE,
            names::NEXT_PHONICS_SOUND,
            names::GET_PRONUNCIATION_GUIDE,
        ],
    },
    PersonaSpec {
        name: "SightWordsTeacher",
        topic: "sight_words",
        handoff_description: "Specialist for sight words and high-frequency word recognition",
        instructions: include_str!("../prompts/sight_words_teacher.md"),
        tools: &[names::GET_SIGHT_WORDS],
    },
    PersonaSpec {
        name: "ProgressTracker",
        topic: "progress",
        handoff_description: "Specialist for tracking reading progress and celebrating achievements",
        instructions: include_str!("../prompts/progress_tracker.md"),
        tools: &[names::GET_READING_PROGRESS, names::RECORD_ACCOMPLISHMENT],
    },
    PersonaSpec {
        name: "EncouragementCoach",
        topic: "encouragement",
        handoff_description: "Specialist for cheering up a frustrated or discouraged child",
        instructions: include_str!("../prompts/encouragement_coach.md"),
        tools: &[names::GET_ENCOURAGEMENT],
    },
    PersonaSpec {
        name: "StoryTeller",
        topic: "stories",
        handoff_description: "Specialist for telling short interactive stories",
        instructions: include_str!("../prompts/story_teller.md"),
        tools: &[names::GET_STORY_TEMPLATE],
    },
    PersonaSpec {
        name: "ReadingTester",
        topic: "assessment",
        handoff_description: "Specialist for playful reading quizzes that check what the child knows",
        instructions: include_str!("../prompts/reading_tester.md"),
        tools: &[names::CREATE_READING_QUIZ, names::RECORD_ACCOMPLISHMENT],
    },
    PersonaSpec {
        name: "Simplifier",
        topic: "simplification",
        handoff_description: "Specialist for re-explaining things in simpler words",
        instructions: include_str!("../prompts/simplifier.md"),
        tools: &[names::GET_PRONUNCIATION_GUIDE],
    },
];

/// The set of personas available to a conversation.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    shared_prompt: String,
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// The MainTeacher triage persona and every specialist.
    ///
    /// MainTeacher can hand off to each specialist; specialists can only hand the
    /// child back to MainTeacher.
    pub fn standard() -> Self {
        let mut personas = vec![Persona {
            name: MAIN_TEACHER.to_string(),
            topic: "general".to_string(),
            handoff_description: "The main teacher who greets the child and picks the right specialist"
                .to_string(),
            instructions: include_str!("../prompts/main_teacher.md").to_string(),
            tools: vec![],
            handoffs: SPECIALISTS.iter().map(|s| s.name.to_string()).collect(),
        }];
        personas.extend(SPECIALISTS.iter().map(|spec| Persona {
            name: spec.name.to_string(),
            topic: spec.topic.to_string(),
            handoff_description: spec.handoff_description.to_string(),
            instructions: spec.instructions.to_string(),
            tools: spec.tools.iter().map(|t| t.to_string()).collect(),
            handoffs: vec![MAIN_TEACHER.to_string()],
        }));
        Self {
            shared_prompt: PATIENT_TEACHER_PROMPT.to_string(),
            personas,
        }
    }

    /// Replaces built-in prompts with the ones found in `prompts`.
    ///
    /// Keys are the snake-case persona names (`phonics_teacher`) and
    /// `patient_teacher` for the shared prompt. Unknown keys are ignored.
    pub fn with_prompt_overrides(mut self, prompts: &HashMap<String, String>) -> Self {
        if let Some(shared) = prompts.get(PATIENT_TEACHER_KEY) {
            self.shared_prompt = shared.clone();
        }
        for persona in &mut self.personas {
            if let Some(instructions) = prompts.get(&snake_case(&persona.name)) {
                tracing::debug!(persona = %persona.name, "Using prompt override");
                persona.instructions = instructions.clone();
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.name == name)
    }

    pub fn triage(&self) -> &Persona {
        // `standard()` always inserts MainTeacher first.
        &self.personas[0]
    }

    pub fn by_handoff_tool(&self, tool_name: &str) -> Option<&Persona> {
        self.personas
            .iter()
            .find(|p| p.handoff_tool_name() == tool_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn system_prompt(&self, persona: &Persona, student_context: Option<&str>) -> String {
        persona.system_prompt(&self.shared_prompt, student_context)
    }

    /// Handoff tool definitions offered to `persona`.
    pub fn handoff_tools(&self, persona: &Persona) -> Result<Vec<ChatCompletionTool>> {
        persona
            .handoffs
            .iter()
            .filter_map(|name| self.get(name))
            .map(Persona::handoff_tool)
            .collect()
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
