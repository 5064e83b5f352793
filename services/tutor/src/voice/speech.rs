use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        AudioInput, CreateSpeechRequestArgs, CreateTranscriptionRequestArgs, SpeechModel,
        SpeechResponseFormat, Voice,
    },
};
use async_trait::async_trait;
use tracing::debug;

use super::audio::{SPEECH_PCM16_SAMPLE_RATE, decode_pcm16_le};

/// Synthesized speech as mono samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Speech-to-text and text-to-speech.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Transcribes a WAV recording.
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String>;

    /// Speaks `text` in the configured voice.
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio>;
}

/// Voice settings for [`OpenAISpeechClient`].
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub transcription_model: String,
    pub tts_model: String,
    pub voice: Voice,
    pub speed: f32,
}

pub struct OpenAISpeechClient {
    client: Client<OpenAIConfig>,
    settings: SpeechSettings,
}

impl OpenAISpeechClient {
    pub fn new(config: OpenAIConfig, settings: SpeechSettings) -> Self {
        Self {
            client: Client::with_config(config),
            settings,
        }
    }
}

fn speech_model(name: &str) -> SpeechModel {
    match name {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

#[async_trait]
impl SpeechClient for OpenAISpeechClient {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8("speech.wav".to_string(), wav))
            .model(&self.settings.transcription_model)
            .language("en")
            .build()?;
        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .context("Transcription request failed")?;
        debug!(chars = response.text.len(), "Transcription received");
        Ok(response.text.trim().to_string())
    }

    async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(speech_model(&self.settings.tts_model))
            .voice(self.settings.voice.clone())
            .speed(self.settings.speed)
            .response_format(SpeechResponseFormat::Pcm)
            .build()?;
        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .context("Speech synthesis request failed")?;
        Ok(SpeechAudio {
            samples: decode_pcm16_le(&response.bytes),
            sample_rate: SPEECH_PCM16_SAMPLE_RATE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_model_mapping() {
        assert!(matches!(speech_model("tts-1"), SpeechModel::Tts1));
        assert!(matches!(speech_model("tts-1-hd"), SpeechModel::Tts1Hd));
        assert!(matches!(speech_model("gpt-4o-mini-tts"), SpeechModel::Other(name) if name == "gpt-4o-mini-tts"));
    }
}
