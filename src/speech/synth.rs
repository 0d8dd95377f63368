//! Speech synthesis client
//!
//! Two interchangeable synthesis paths: ElevenLabs when a key and voice id
//! are configured, Yandex SpeechKit otherwise. Hosts that render their own
//! audio call [`SpeechSynthesizer::synthesize`] and route the bytes to the
//! call themselves.

use serde::Serialize;

use crate::config::VoiceConfig;
use crate::{Error, Result};

/// ElevenLabs model tuned for low-latency speech
const ELEVENLABS_MODEL: &str = "eleven_turbo_v2_5";

/// Resolved synthesis path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisRoute {
    /// ElevenLabs with a brand voice
    ElevenLabs {
        /// API key
        api_key: String,
        /// Voice identifier
        voice_id: String,
    },
    /// Yandex SpeechKit
    SpeechKit {
        /// API key
        api_key: Option<String>,
        /// Voice name (e.g. "alena", "filipp")
        voice: String,
    },
}

impl SynthesisRoute {
    /// Pick the synthesis path from configured credentials
    ///
    /// ElevenLabs wins when both key and voice id are present; SpeechKit is
    /// the fallback.
    #[must_use]
    pub fn resolve(voice: &VoiceConfig) -> Self {
        match (&voice.elevenlabs_api_key, &voice.elevenlabs_voice_id) {
            (Some(api_key), Some(voice_id)) if !api_key.is_empty() && !voice_id.is_empty() => {
                Self::ElevenLabs {
                    api_key: api_key.clone(),
                    voice_id: voice_id.clone(),
                }
            }
            _ => Self::SpeechKit {
                api_key: voice.speechkit_api_key.clone(),
                voice: voice.speechkit_voice.clone(),
            },
        }
    }

    /// Provider name for logging
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        match self {
            Self::ElevenLabs { .. } => "elevenlabs",
            Self::SpeechKit { .. } => "speechkit",
        }
    }
}

/// Synthesizes speech from text
pub struct SpeechSynthesizer {
    client: reqwest::Client,
    route: SynthesisRoute,
}

/// ElevenLabs synthesis request body
#[derive(Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs voice tuning
#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

impl SpeechSynthesizer {
    /// Create a synthesizer for the resolved route
    ///
    /// # Errors
    ///
    /// Returns error if the route is SpeechKit without an API key.
    pub fn new(route: SynthesisRoute) -> Result<Self> {
        if let SynthesisRoute::SpeechKit { api_key, .. } = &route {
            if api_key.as_deref().is_none_or(str::is_empty) {
                return Err(Error::Config(
                    "SpeechKit API key required for synthesis".to_string(),
                ));
            }
        }

        tracing::debug!(provider = route.provider(), "synthesis route resolved");

        Ok(Self {
            client: reqwest::Client::new(),
            route,
        })
    }

    /// Create a synthesizer from voice configuration
    ///
    /// # Errors
    ///
    /// Returns error if neither synthesis path has usable credentials.
    pub fn from_config(voice: &VoiceConfig) -> Result<Self> {
        Self::new(SynthesisRoute::resolve(voice))
    }

    /// Synthesize text to audio bytes
    ///
    /// Returns MP3 for ElevenLabs, Ogg/Opus for SpeechKit.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match &self.route {
            SynthesisRoute::ElevenLabs { api_key, voice_id } => {
                self.synthesize_elevenlabs(text, api_key, voice_id).await
            }
            SynthesisRoute::SpeechKit { api_key, voice } => {
                self.synthesize_speechkit(text, api_key.as_deref().unwrap_or_default(), voice)
                    .await
            }
        }
    }

    /// Synthesize using ElevenLabs
    async fn synthesize_elevenlabs(
        &self,
        text: &str,
        api_key: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>> {
        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{voice_id}");

        let request = ElevenLabsRequest {
            text,
            model_id: ELEVENLABS_MODEL,
            voice_settings: VoiceSettings::default(),
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "ElevenLabs error {status}: {body}"
            )));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Synthesize using Yandex SpeechKit
    async fn synthesize_speechkit(
        &self,
        text: &str,
        api_key: &str,
        voice: &str,
    ) -> Result<Vec<u8>> {
        let response = self
            .client
            .post("https://tts.api.cloud.yandex.net/speech/v1/tts:synthesize")
            .header("Authorization", format!("Api-Key {api_key}"))
            .form(&[("text", text), ("voice", voice), ("format", "oggopus")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "SpeechKit error {status}: {body}"
            )));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
