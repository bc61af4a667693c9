//! Speech synthesis through the Gemini TTS model.

mod catalog;
mod wav;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gemini::{
    ContentGenerator, GeminiError, GenerateContentRequest, GenerationConfig,
    MultiSpeakerVoiceConfig, Part, SpeakerVoiceConfig, SpeechConfig, VoiceConfig,
};
use crate::utils::{short_id, timestamp};

pub use catalog::{
    DEFAULT_LANGUAGE, DEFAULT_VOICE, LANGUAGES, LanguageCatalog, VOICES, Voice, VoiceCatalog,
    VoiceEntry, find_voice, is_supported_language, language_catalog, resolve_voice, voice_catalog,
};
pub use wav::{BITS_PER_SAMPLE, CHANNELS, SAMPLE_RATE, pcm_duration_secs, write_wav};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const MAX_SPEAKERS: usize = 2;
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Empty text provided")]
    EmptyText,

    #[error("Empty transcript")]
    EmptyTranscript,

    #[error("At least one speaker is required")]
    NoSpeakers,

    #[error("Maximum 2 speakers supported")]
    TooManySpeakers,

    #[error("Temperature must be between 0.0 and 2.0 (got {0})")]
    InvalidTemperature(f32),

    #[error("Speech generation failed: {0}")]
    Model(#[from] GeminiError),

    #[error("Failed to write audio file: {0}")]
    Wav(#[from] hound::Error),

    #[error("Failed to write audio file: {0}")]
    Io(#[from] std::io::Error),
}

impl TtsError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            TtsError::EmptyText
                | TtsError::EmptyTranscript
                | TtsError::NoSpeakers
                | TtsError::TooManySpeakers
                | TtsError::InvalidTemperature(_)
                | TtsError::Model(GeminiError::Blocked(_))
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub style_prompt: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DialogSpeaker {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DialogRequest {
    pub speakers: Vec<DialogSpeaker>,
    pub transcript: String,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// A generated WAV file on disk plus what went into it.
#[derive(Debug, Clone, Serialize)]
pub struct AudioOutput {
    #[serde(skip)]
    pub path: PathBuf,
    pub filename: String,
    pub file_size: u64,
    pub duration: f64,
    pub voices: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub speakers: Vec<String>,
    pub language: String,
    pub char_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_prompt: Option<String>,
}

/// `"cheerfully"` becomes `"Say cheerfully:"`; prompts already starting
/// with `say ` are kept. Returns the text to speak and the prompt used.
pub fn apply_style(text: &str, style_prompt: Option<&str>) -> (String, Option<String>) {
    match style_prompt.map(str::trim).filter(|s| !s.is_empty()) {
        None => (text.to_string(), None),
        Some(style) => {
            let style = if style.to_lowercase().starts_with("say ") {
                style.to_string()
            } else {
                format!("Say {style}:")
            };
            (format!("{style} {text}"), Some(style))
        }
    }
}

fn checked_temperature(temperature: Option<f32>) -> Result<f32, TtsError> {
    let temperature = temperature.unwrap_or(DEFAULT_TEMPERATURE);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(TtsError::InvalidTemperature(temperature));
    }
    Ok(temperature)
}

/// Codes outside the published catalog are still passed to the model.
fn language_or_default(code: Option<String>) -> String {
    let code = code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    if !is_supported_language(&code) {
        tracing::warn!("Language '{}' not in catalog, passing it through", code);
    }
    code
}

pub struct TtsService {
    generator: Arc<dyn ContentGenerator>,
    model: String,
    output_dir: PathBuf,
}

impl TtsService {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        model: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let model = model.into();
        tracing::info!(
            "Gemini TTS service initialized: {} ({} voices, {} languages)",
            model,
            VOICES.len(),
            LANGUAGES.len()
        );
        Self {
            generator,
            model,
            output_dir: output_dir.into(),
        }
    }

    pub async fn generate_speech(&self, request: SpeechRequest) -> Result<AudioOutput, TtsError> {
        if request.text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }
        let temperature = checked_temperature(request.temperature)?;
        let language = language_or_default(request.language_code);
        let voice = resolve_voice(request.voice.as_deref());
        let (spoken, style_prompt) = apply_style(&request.text, request.style_prompt.as_deref());

        let char_count = request.text.chars().count();
        tracing::info!(
            "Generating speech: {} chars, voice={}, lang={}",
            char_count,
            voice,
            language
        );

        let speech_config = SpeechConfig {
            voice_config: Some(VoiceConfig::prebuilt(voice)),
            multi_speaker_voice_config: None,
            language_code: Some(language.clone()),
        };
        let pcm = self.synthesize(spoken, speech_config, temperature).await?;

        let filename = format!("tts_{}_{}.wav", timestamp(), voice);
        let duration = pcm_duration_secs(pcm.len());
        let (path, file_size) = self.save(&filename, pcm).await?;
        tracing::info!(
            "Audio generated: {} ({} bytes, {:.1}s)",
            filename,
            file_size,
            duration
        );

        Ok(AudioOutput {
            path,
            filename,
            file_size,
            duration,
            voices: vec![voice.to_string()],
            speakers: Vec::new(),
            language,
            char_count,
            style_prompt,
        })
    }

    pub async fn generate_dialog(&self, request: DialogRequest) -> Result<AudioOutput, TtsError> {
        if request.speakers.is_empty() {
            return Err(TtsError::NoSpeakers);
        }
        if request.speakers.len() > MAX_SPEAKERS {
            return Err(TtsError::TooManySpeakers);
        }
        if request.transcript.trim().is_empty() {
            return Err(TtsError::EmptyTranscript);
        }
        let temperature = checked_temperature(request.temperature)?;
        let language = language_or_default(request.language_code);

        let mut speakers = Vec::with_capacity(request.speakers.len());
        let mut voices = Vec::with_capacity(request.speakers.len());
        for (idx, speaker) in request.speakers.iter().enumerate() {
            let name = speaker
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Speaker{}", idx + 1));
            speakers.push(name);
            voices.push(resolve_voice(speaker.voice.as_deref()).to_string());
        }

        let char_count = request.transcript.chars().count();
        tracing::info!(
            "Generating dialog: {} speakers, {} chars",
            speakers.len(),
            char_count
        );

        let speech_config = SpeechConfig {
            voice_config: None,
            multi_speaker_voice_config: Some(MultiSpeakerVoiceConfig {
                speaker_voice_configs: speakers
                    .iter()
                    .zip(&voices)
                    .map(|(speaker, voice)| SpeakerVoiceConfig {
                        speaker: speaker.clone(),
                        voice_config: VoiceConfig::prebuilt(voice.as_str()),
                    })
                    .collect(),
            }),
            language_code: Some(language.clone()),
        };
        let pcm = self
            .synthesize(request.transcript, speech_config, temperature)
            .await?;

        let filename = format!("tts_dialog_{}.wav", timestamp());
        let duration = pcm_duration_secs(pcm.len());
        let (path, file_size) = self.save(&filename, pcm).await?;
        tracing::info!(
            "Dialog generated: {} ({} bytes, {:.1}s)",
            filename,
            file_size,
            duration
        );

        Ok(AudioOutput {
            path,
            filename,
            file_size,
            duration,
            voices,
            speakers,
            language,
            char_count,
            style_prompt: None,
        })
    }

    async fn synthesize(
        &self,
        text: String,
        speech_config: SpeechConfig,
        temperature: f32,
    ) -> Result<Vec<u8>, TtsError> {
        let request = GenerateContentRequest::user(
            vec![Part::text(text)],
            GenerationConfig {
                temperature: Some(temperature),
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(speech_config),
                ..Default::default()
            },
        );
        let response = self.generator.generate_content(&self.model, &request).await?;
        Ok(response.audio()?)
    }

    async fn save(&self, filename: &str, pcm: Vec<u8>) -> Result<(PathBuf, u64), TtsError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        // timestamps collide within the same second
        let path = self.output_dir.join(format!("{}_{}", short_id(), filename));
        let target = path.clone();
        let size = tokio::task::spawn_blocking(move || write_wav(&target, &pcm))
            .await
            .map_err(std::io::Error::other)??;
        Ok((path, size))
    }
}
