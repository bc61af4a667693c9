//! Prebuilt voices and supported language codes.

use indexmap::IndexMap;
use serde::Serialize;

pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub name: &'static str,
    pub category: &'static str,
    pub gender: &'static str,
    pub voice_trait: &'static str,
    pub best_for: &'static str,
}

const fn voice(
    name: &'static str,
    category: &'static str,
    gender: &'static str,
    voice_trait: &'static str,
    best_for: &'static str,
) -> Voice {
    Voice {
        name,
        category,
        gender,
        voice_trait,
        best_for,
    }
}

pub static VOICES: &[Voice] = &[
    voice("Kore", "professional", "male", "Firm", "Business presentations, authority"),
    voice("Orus", "professional", "male", "Firm", "Corporate training, news"),
    voice("Alnilam", "professional", "male", "Firm", "Serious announcements"),
    voice("Charon", "professional", "male", "Informative", "Educational content"),
    voice("Rasalgethi", "professional", "female", "Informative", "Tutorials, documentation"),
    voice("Puck", "friendly", "female", "Upbeat", "Marketing, cheerful content"),
    voice("Fenrir", "friendly", "male", "Excitable", "Energetic presentations"),
    voice("Laomedeia", "friendly", "female", "Upbeat", "Social media, vlogs"),
    voice("Achird", "friendly", "female", "Friendly", "Customer service, welcoming"),
    voice("Sadachbia", "friendly", "female", "Lively", "Entertainment, podcasts"),
    voice("Zephyr", "calm", "female", "Bright", "Calm narration"),
    voice("Aoede", "calm", "female", "Breezy", "Meditation, relaxation"),
    voice("Callirrhoe", "calm", "female", "Easy-going", "Audiobooks, stories"),
    voice("Umbriel", "calm", "male", "Easy-going", "Bedtime stories"),
    voice("Vindemiatrix", "calm", "female", "Gentle", "Soft narration"),
    voice("Iapetus", "clear", "male", "Clear", "Clear speech, learning"),
    voice("Erinome", "clear", "female", "Clear", "Instructions, guides"),
    voice("Despina", "clear", "female", "Smooth", "Professional podcasts"),
    voice("Algieba", "clear", "male", "Smooth", "Radio, broadcasting"),
    voice("Leda", "warm", "female", "Youthful", "Children's books, young audience"),
    voice("Autonoe", "warm", "female", "Bright", "Uplifting stories"),
    voice("Sulafat", "warm", "female", "Warm", "Comforting narration"),
    voice("Achernar", "warm", "male", "Soft", "Gentle storytelling"),
    voice("Gacrux", "mature", "male", "Mature", "Documentaries, history"),
    voice("Schedar", "mature", "male", "Even", "Balanced narration"),
    voice("Sadaltager", "mature", "male", "Knowledgeable", "Expert content, analysis"),
    voice("Enceladus", "special", "male", "Breathy", "Tired, emotional scenes"),
    voice("Algenib", "special", "male", "Gravelly", "Rugged, deep voice"),
    voice("Pulcherrima", "special", "female", "Forward", "Bold, direct content"),
    voice("Zubenelgenubi", "special", "male", "Casual", "Conversational, informal"),
];

pub static LANGUAGES: &[(&str, &str)] = &[
    ("en-US", "English (United States)"),
    ("en-IN", "English (India)"),
    ("en-GB", "English (United Kingdom)"),
    ("en-AU", "English (Australia)"),
    ("hi-IN", "Hindi (India)"),
    ("ta-IN", "Tamil (India)"),
    ("te-IN", "Telugu (India)"),
    ("mr-IN", "Marathi (India)"),
    ("bn-BD", "Bengali (Bangladesh)"),
    ("gu-IN", "Gujarati (India)"),
    ("kn-IN", "Kannada (India)"),
    ("ml-IN", "Malayalam (India)"),
    ("es-US", "Spanish (United States)"),
    ("fr-FR", "French (France)"),
    ("de-DE", "German (Germany)"),
    ("it-IT", "Italian (Italy)"),
    ("pt-BR", "Portuguese (Brazil)"),
    ("ru-RU", "Russian (Russia)"),
    ("ja-JP", "Japanese (Japan)"),
    ("ko-KR", "Korean (Korea)"),
    ("zh-CN", "Chinese (Simplified)"),
    ("ar-EG", "Arabic (Egyptian)"),
    ("tr-TR", "Turkish (Turkey)"),
    ("vi-VN", "Vietnamese (Vietnam)"),
];

pub fn find_voice(name: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|v| v.name == name)
}

/// Unknown or missing names fall back to [`DEFAULT_VOICE`].
pub fn resolve_voice(name: Option<&str>) -> &'static str {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        None => DEFAULT_VOICE,
        Some(name) => match find_voice(name) {
            Some(voice) => voice.name,
            None => {
                tracing::warn!("Unknown voice '{}', using {}", name, DEFAULT_VOICE);
                DEFAULT_VOICE
            }
        },
    }
}

pub fn is_supported_language(code: &str) -> bool {
    LANGUAGES.iter().any(|(c, _)| *c == code)
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceEntry {
    pub name: &'static str,
    pub gender: &'static str,
    #[serde(rename = "trait")]
    pub voice_trait: &'static str,
    pub best_for: &'static str,
    #[serde(rename = "type")]
    pub category: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceCatalog {
    pub total_voices: usize,
    pub categories: IndexMap<&'static str, Vec<VoiceEntry>>,
    pub voice_types: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageCatalog {
    pub total: usize,
    pub languages: IndexMap<&'static str, &'static str>,
}

/// Voices grouped by category, categories in first-seen order.
pub fn voice_catalog() -> VoiceCatalog {
    let mut categories: IndexMap<&'static str, Vec<VoiceEntry>> = IndexMap::new();
    for v in VOICES {
        categories.entry(v.category).or_default().push(VoiceEntry {
            name: v.name,
            gender: v.gender,
            voice_trait: v.voice_trait,
            best_for: v.best_for,
            category: v.category,
        });
    }
    let voice_types = categories.keys().copied().collect();

    VoiceCatalog {
        total_voices: VOICES.len(),
        categories,
        voice_types,
    }
}

pub fn language_catalog() -> LanguageCatalog {
    LanguageCatalog {
        total: LANGUAGES.len(),
        languages: LANGUAGES.iter().copied().collect(),
    }
}
