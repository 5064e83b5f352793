//! Speech in, agent, speech out.

use anyhow::{Context, Result};
use preschool_core::runner::{AgentRunner, Conversation, RunResult};
use std::sync::Arc;
use tracing::{Instrument, info, info_span};

use super::audio::{encode_wav, resample, rms};
use super::speech::{SpeechAudio, SpeechClient};

/// Rate recordings are converted to before transcription.
pub const TRANSCRIPTION_SAMPLE_RATE: u32 = 16_000;

/// Recordings quieter than this are treated as silence.
const SILENCE_RMS: f32 = 1e-4;

/// A mono microphone recording.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Recording {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// One completed spoken exchange.
#[derive(Debug, Clone)]
pub struct VoiceTurn {
    pub transcript: String,
    pub reply: RunResult,
    /// The part of the reply that was spoken.
    pub spoken_text: String,
    pub audio: SpeechAudio,
}

pub struct VoicePipeline {
    runner: Arc<AgentRunner>,
    speech: Arc<dyn SpeechClient>,
    max_response_length: usize,
}

impl VoicePipeline {
    pub fn new(
        runner: Arc<AgentRunner>,
        speech: Arc<dyn SpeechClient>,
        max_response_length: usize,
    ) -> Self {
        Self {
            runner,
            speech,
            max_response_length,
        }
    }

    /// Transcribes `recording`, answers it and synthesizes the answer.
    ///
    /// Returns `Ok(None)` when nothing was said.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        recording: &Recording,
    ) -> Result<Option<VoiceTurn>> {
        let span = info_span!(
            "voice_turn",
            seconds = recording.duration_secs(),
            agent = %conversation.agent
        );
        async move {
            if recording.samples.is_empty() || rms(&recording.samples) < SILENCE_RMS {
                info!("Recording was silent");
                return Ok(None);
            }

            let samples = resample(
                &recording.samples,
                recording.sample_rate,
                TRANSCRIPTION_SAMPLE_RATE,
            )
            .context("Failed to resample recording")?;
            let transcript = self
                .speech
                .transcribe(encode_wav(&samples, TRANSCRIPTION_SAMPLE_RATE))
                .await?;
            if transcript.trim().is_empty() {
                info!("Transcript was empty");
                return Ok(None);
            }
            info!(transcript = %transcript, "Child said");

            let reply = self.runner.run(conversation, &transcript).await?;
            let spoken_text = clip_for_speech(&reply.final_output, self.max_response_length);
            let audio = self.speech.synthesize(&spoken_text).await?;

            Ok(Some(VoiceTurn {
                transcript,
                reply,
                spoken_text,
                audio,
            }))
        }
        .instrument(span)
        .await
    }
}

/// Shortens `text` to at most `max_chars` characters, cutting at a word boundary
/// when there is one.
pub fn clip_for_speech(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut chars = text.chars();
    let cut: String = chars.by_ref().take(max_chars).collect();
    let ends_on_word = chars.next().is_some_and(char::is_whitespace);
    let clipped = match cut.rfind(char::is_whitespace) {
        _ if ends_on_word => cut.as_str(),
        Some(boundary) if boundary > 0 => &cut[..boundary],
        _ => cut.as_str(),
    };
    clipped
        .trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == ':')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::speech::MockSpeechClient;
    use async_openai::types::ChatCompletionTool;
    use async_trait::async_trait;
    use preschool_core::{
        llm_client::{LLMAction, LLMClient},
        persona::PersonaRegistry,
        toolbox::ToolInvoker,
    };

    struct NoTools;

    #[async_trait]
    impl ToolInvoker for NoTools {
        fn definitions(&self) -> &[ChatCompletionTool] {
            &[]
        }

        async fn call_tool(&self, name: &str, _arguments: &str) -> Result<String> {
            anyhow::bail!("no tool named {}", name)
        }
    }

    struct EchoTeacher;

    #[async_trait]
    impl LLMClient for EchoTeacher {
        async fn decide_action(
            &self,
            _messages: Vec<async_openai::types::ChatCompletionRequestMessage>,
            _tools: Vec<ChatCompletionTool>,
        ) -> Result<LLMAction> {
            Ok(LLMAction::TextResponse(
                "What a wonderful question, let us sound out the word cat together".to_string(),
            ))
        }
    }

    fn runner() -> Arc<AgentRunner> {
        Arc::new(AgentRunner::new(
            Arc::new(EchoTeacher),
            Arc::new(NoTools),
            Arc::new(PersonaRegistry::standard()),
        ))
    }

    fn tone(sample_rate: u32) -> Recording {
        Recording {
            samples: (0..sample_rate / 2)
                .map(|i| (i as f32 * 0.05).sin() * 0.3)
                .collect(),
            sample_rate,
        }
    }

    #[test]
    fn test_clip_for_speech() {
        assert_eq!(clip_for_speech("  Hello there!  ", 200), "Hello there!");
        assert_eq!(
            clip_for_speech("Let's read, then we play", 12),
            "Let's read"
        );
        assert_eq!(clip_for_speech("Supercalifragilistic", 5), "Super");
        assert_eq!(clip_for_speech("big red dog", 7), "big red");
    }

    #[tokio::test]
    async fn test_silent_recording_is_skipped() {
        let mut speech = MockSpeechClient::new();
        speech.expect_transcribe().never();
        let pipeline = VoicePipeline::new(runner(), Arc::new(speech), 200);

        let mut conversation = Conversation::new("MainTeacher");
        let silent = Recording {
            samples: vec![0.0; 4800],
            sample_rate: 48_000,
        };
        assert!(pipeline.run(&mut conversation, &silent).await.unwrap().is_none());
        assert!(pipeline
            .run(&mut conversation, &Recording::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_transcript_is_reported() {
        let mut speech = MockSpeechClient::new();
        speech
            .expect_transcribe()
            .times(1)
            .returning(|_| Ok("   ".to_string()));
        speech.expect_synthesize().never();
        let pipeline = VoicePipeline::new(runner(), Arc::new(speech), 200);

        let mut conversation = Conversation::new("MainTeacher");
        let turn = pipeline.run(&mut conversation, &tone(44_100)).await.unwrap();
        assert!(turn.is_none());
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_full_turn_clips_spoken_reply() {
        let mut speech = MockSpeechClient::new();
        speech
            .expect_transcribe()
            .times(1)
            .withf(|wav| wav.starts_with(b"RIFF"))
            .returning(|_| Ok("How do I read cat?".to_string()));
        speech
            .expect_synthesize()
            .times(1)
            .withf(|text| text.chars().count() <= 30)
            .returning(|_| {
                Ok(SpeechAudio {
                    samples: vec![0.1; 240],
                    sample_rate: 24_000,
                })
            });
        let pipeline = VoicePipeline::new(runner(), Arc::new(speech), 30);

        let mut conversation = Conversation::new("MainTeacher");
        let turn = pipeline
            .run(&mut conversation, &tone(44_100))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(turn.transcript, "How do I read cat?");
        assert_eq!(turn.spoken_text, "What a wonderful question, let");
        assert!(turn.reply.final_output.ends_with("cat together"));
        assert_eq!(turn.audio.samples.len(), 240);
        assert_eq!(conversation.turns().len(), 2);
    }
}
