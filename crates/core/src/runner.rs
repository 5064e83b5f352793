//! The agent loop: one child utterance in, one teacher reply out.
//!
//! A run asks the model for the next action as the current persona. Tool calls
//! are executed and fed back; a handoff call switches the persona and the loop
//! continues with the same transcript; plain text ends the run.

use crate::{
    llm_client::{LLMAction, LLMClient, ToolCall},
    persona::{Persona, PersonaRegistry},
    toolbox::ToolInvoker,
};
use anyhow::{Result, bail};
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

pub const DEFAULT_MAX_TURNS: usize = 10;

const SUMMARY_PROMPT: &str = "You write short progress notes for parents of preschool readers. \
Summarize the conversation below in at most two sentences: what the child practiced and how it went. \
Do not address the child.";

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent run exceeded {0} model turns without a final answer")]
    MaxTurnsExceeded(usize),
    #[error("unknown persona: {0}")]
    UnknownPersona(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Child,
    Teacher,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// The state carried between runs: who is currently teaching and what was said.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Name of the persona that answers the next utterance.
    pub agent: String,
    /// Facts about the child appended to every system prompt.
    pub student_context: Option<String>,
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            student_context: None,
            turns: Vec::new(),
        }
    }

    pub fn with_student_context(mut self, context: impl Into<String>) -> Self {
        self.student_context = Some(context.into());
        self
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The first thing the child said, if anything.
    pub fn opening_line(&self) -> Option<&str> {
        self.turns
            .iter()
            .find(|t| t.speaker == Speaker::Child)
            .map(|t| t.text.as_str())
    }

    fn push(&mut self, speaker: Speaker, text: &str) {
        self.turns.push(Turn {
            speaker,
            text: text.to_string(),
        });
    }

    fn history_messages(&self) -> Result<Vec<ChatCompletionRequestMessage>> {
        self.turns
            .iter()
            .map(|turn| {
                Ok(match turn.speaker {
                    Speaker::Child => ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.text.clone())
                        .build()?
                        .into(),
                    Speaker::Teacher => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(turn.text.clone())
                        .build()?
                        .into(),
                })
            })
            .collect()
    }

    fn transcript_text(&self) -> String {
        self.turns
            .iter()
            .map(|turn| match turn.speaker {
                Speaker::Child => format!("Child: {}", turn.text),
                Speaker::Teacher => format!("Teacher: {}", turn.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The outcome of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub final_output: String,
    /// The persona that produced `final_output`.
    pub last_agent: String,
    /// Personas handed to during this run, in order.
    pub handoffs: Vec<String>,
}

pub struct AgentRunner {
    llm: Arc<dyn LLMClient>,
    tools: Arc<dyn ToolInvoker>,
    personas: Arc<PersonaRegistry>,
    max_turns: usize,
}

impl AgentRunner {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        tools: Arc<dyn ToolInvoker>,
        personas: Arc<PersonaRegistry>,
    ) -> Self {
        Self {
            llm,
            tools,
            personas,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    /// Starts a conversation with the triage persona.
    pub fn start_conversation(&self) -> Conversation {
        Conversation::new(self.personas.triage().name.clone())
    }

    /// Answers `input` as the conversation's current persona, following handoffs.
    ///
    /// On success the child's input and the reply are appended to the
    /// conversation and `conversation.agent` names the persona that replied. On
    /// error the conversation history is left untouched.
    pub async fn run(&self, conversation: &mut Conversation, input: &str) -> Result<RunResult> {
        let span = info_span!("agent_run", start_agent = %conversation.agent);
        async move {
            let mut persona = self
                .personas
                .get(&conversation.agent)
                .ok_or_else(|| AgentError::UnknownPersona(conversation.agent.clone()))?;

            let mut transcript = conversation.history_messages()?;
            transcript.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(input)
                    .build()?
                    .into(),
            );
            let mut handoffs = Vec::new();

            for turn in 0..self.max_turns {
                let system_prompt = self
                    .personas
                    .system_prompt(persona, conversation.student_context.as_deref());
                let mut messages: Vec<ChatCompletionRequestMessage> =
                    vec![ChatCompletionRequestSystemMessageArgs::default()
                        .content(system_prompt)
                        .build()?
                        .into()];
                messages.extend(transcript.iter().cloned());

                let action = self
                    .llm
                    .decide_action(messages, self.tools_for(persona)?)
                    .await?;

                match action {
                    LLMAction::TextResponse(text) => {
                        info!(agent = %persona.name, turn, "Agent produced final output");
                        conversation.agent = persona.name.clone();
                        conversation.push(Speaker::Child, input);
                        conversation.push(Speaker::Teacher, &text);
                        return Ok(RunResult {
                            final_output: text,
                            last_agent: persona.name.clone(),
                            handoffs,
                        });
                    }
                    LLMAction::ToolCall(tool_calls) => {
                        transcript.push(
                            ChatCompletionRequestAssistantMessageArgs::default()
                                .tool_calls(tool_calls.clone())
                                .build()?
                                .into(),
                        );
                        let mut next_persona: Option<&Persona> = None;
                        for call in &tool_calls {
                            let output = match self.personas.by_handoff_tool(&call.function.name) {
                                Some(target) if persona.can_hand_off_to(&target.name) => {
                                    if next_persona.is_none() {
                                        info!(from = %persona.name, to = %target.name, "Handoff");
                                        handoffs.push(target.name.clone());
                                        next_persona = Some(target);
                                    } else {
                                        warn!(ignored = %target.name, "Ignoring extra handoff in the same turn");
                                    }
                                    json!({ "assistant": target.name }).to_string()
                                }
                                _ => self.execute_tool(persona, call).await,
                            };
                            transcript.push(
                                ChatCompletionRequestToolMessageArgs::default()
                                    .tool_call_id(call.id.clone())
                                    .content(output)
                                    .build()?
                                    .into(),
                            );
                        }
                        if let Some(next) = next_persona {
                            persona = next;
                        }
                    }
                }
            }

            Err(AgentError::MaxTurnsExceeded(self.max_turns).into())
        }
        .instrument(span)
        .await
    }

    /// Asks the model for a short parent-facing summary of the conversation.
    pub async fn summarize(&self, conversation: &Conversation) -> Result<String> {
        if conversation.is_empty() {
            return Ok(String::new());
        }
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SUMMARY_PROMPT)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(conversation.transcript_text())
                .build()?
                .into(),
        ];
        match self.llm.decide_action(messages, Vec::new()).await? {
            LLMAction::TextResponse(summary) => Ok(summary.trim().to_string()),
            LLMAction::ToolCall(_) => bail!("Model tried to call a tool while summarizing"),
        }
    }

    fn tools_for(&self, persona: &Persona) -> Result<Vec<ChatCompletionTool>> {
        let mut tools: Vec<ChatCompletionTool> = self
            .tools
            .definitions()
            .iter()
            .filter(|t| persona.allows_tool(&t.function.name))
            .cloned()
            .collect();
        tools.extend(self.personas.handoff_tools(persona)?);
        Ok(tools)
    }

    /// Runs a regular tool call; failures are reported back to the model as JSON.
    async fn execute_tool(&self, persona: &Persona, call: &ToolCall) -> String {
        let name = &call.function.name;
        if !persona.allows_tool(name) {
            warn!(agent = %persona.name, tool = %name, "Model called a tool this persona does not have");
            return json!({ "error": format!("Unknown tool: {}", name) }).to_string();
        }
        match self.tools.call_tool(name, &call.function.arguments).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }
}
