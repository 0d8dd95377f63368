//! Call configuration
//!
//! Options are resolved env > TOML file > defaults, with the per-call phone
//! target supplied by the caller. A missing phone target or missing LLM
//! credentials is a fatal precondition: validation fails and no call starts.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::backend::AuthScheme;
use crate::{Error, Result};

/// Configuration for one outbound call
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Phone target to dial (required)
    pub phone: String,

    /// Caller id presented to the callee; defaults to the phone target
    pub caller_id: Option<String>,

    /// Locale pack identifier ("en", "ru")
    pub locale: String,

    /// System prompt override; locale-pack default when unset
    pub system_prompt: Option<String>,

    /// Greeting override; locale-pack default when unset
    pub greeting: Option<String>,

    /// Filler override; locale-pack default when unset
    pub filler: Option<String>,

    /// Synthesis voice configuration
    pub voice: VoiceConfig,

    /// Recognition configuration, handed to the host recognizer
    pub recognition: RecognitionConfig,

    /// Dialog backend configuration
    pub llm: LlmConfig,

    /// Timers
    pub timing: TimingConfig,

    /// Completed user turns after which the call ends
    pub max_turns: u32,

    /// Consecutive no-input timeouts after which the call ends
    pub max_silence_strikes: u32,
}

/// Synthesis voice configuration
///
/// ElevenLabs is preferred when both key and voice id are present; Yandex
/// SpeechKit is the fallback path.
#[derive(Debug, Clone, Default)]
pub struct VoiceConfig {
    /// ElevenLabs API key
    pub elevenlabs_api_key: Option<String>,

    /// ElevenLabs voice identifier
    pub elevenlabs_voice_id: Option<String>,

    /// SpeechKit API key
    pub speechkit_api_key: Option<String>,

    /// SpeechKit voice name
    pub speechkit_voice: String,
}

/// Recognition configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Recognition locale (e.g. "en-US", "ru-RU")
    pub locale: String,

    /// Recognition model name
    pub model: String,
}

/// Dialog backend configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,

    /// API key (required)
    pub api_key: Option<String>,

    /// How the key is presented
    pub auth_scheme: AuthScheme,

    /// Model identifier
    pub model: String,

    /// Max tokens per reply; kept small for one-sentence answers
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

/// Engine timers
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// End-of-speech debounce window
    pub debounce: Duration,

    /// No-input window before a silence strike
    pub no_input: Duration,

    /// Deadline for hanging up when the farewell playback never finishes
    pub hangup_fallback: Duration,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            phone: String::new(),
            caller_id: None,
            locale: "en".to_string(),
            system_prompt: None,
            greeting: None,
            filler: None,
            voice: VoiceConfig {
                speechkit_voice: "alena".to_string(),
                ..VoiceConfig::default()
            },
            recognition: RecognitionConfig {
                locale: "en-US".to_string(),
                model: "general".to_string(),
            },
            llm: LlmConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: None,
                auth_scheme: AuthScheme::Bearer,
                model: "gpt-4o-mini".to_string(),
                max_tokens: 80,
                temperature: 0.3,
            },
            timing: TimingConfig {
                debounce: Duration::from_millis(600),
                no_input: Duration::from_millis(7000),
                hangup_fallback: Duration::from_secs(10),
            },
            max_turns: 8,
            max_silence_strikes: 3,
        }
    }
}

impl CallConfig {
    /// Resolve configuration without checking preconditions (env > toml >
    /// default)
    ///
    /// Used by diagnostics that do not start a call; [`Self::load`] is the
    /// call path.
    #[must_use]
    pub fn resolve(phone: Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_file(&load_config_file());
        config.apply_env();

        if let Some(phone) = phone {
            config.phone = phone;
        }

        // Recognition locale follows the pack unless set explicitly
        if config.locale == "ru" && config.recognition.locale == "en-US" {
            config.recognition.locale = "ru-RU".to_string();
        }

        config
    }

    /// Load configuration for a call (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if a required precondition is missing (phone target,
    /// LLM credentials) or a limit is out of range.
    pub fn load(phone: Option<String>) -> Result<Self> {
        let config = Self::resolve(phone);
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the optional TOML config file
    fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(v) = &file.phone {
            self.phone.clone_from(v);
        }
        if file.caller_id.is_some() {
            self.caller_id.clone_from(&file.caller_id);
        }
        if let Some(v) = &file.locale {
            self.locale.clone_from(v);
        }
        if file.system_prompt.is_some() {
            self.system_prompt.clone_from(&file.system_prompt);
        }
        if file.greeting.is_some() {
            self.greeting.clone_from(&file.greeting);
        }
        if file.filler.is_some() {
            self.filler.clone_from(&file.filler);
        }

        if file.voice.elevenlabs_api_key.is_some() {
            self.voice
                .elevenlabs_api_key
                .clone_from(&file.voice.elevenlabs_api_key);
        }
        if file.voice.elevenlabs_voice_id.is_some() {
            self.voice
                .elevenlabs_voice_id
                .clone_from(&file.voice.elevenlabs_voice_id);
        }
        if file.voice.speechkit_api_key.is_some() {
            self.voice
                .speechkit_api_key
                .clone_from(&file.voice.speechkit_api_key);
        }
        if let Some(v) = &file.voice.speechkit_voice {
            self.voice.speechkit_voice.clone_from(v);
        }

        if let Some(v) = &file.recognition.locale {
            self.recognition.locale.clone_from(v);
        }
        if let Some(v) = &file.recognition.model {
            self.recognition.model.clone_from(v);
        }

        if let Some(v) = &file.llm.endpoint {
            self.llm.endpoint.clone_from(v);
        }
        if file.llm.api_key.is_some() {
            self.llm.api_key.clone_from(&file.llm.api_key);
        }
        if let Some(v) = file.llm.auth_scheme {
            self.llm.auth_scheme = v;
        }
        if let Some(v) = &file.llm.model {
            self.llm.model.clone_from(v);
        }
        if let Some(v) = file.llm.max_tokens {
            self.llm.max_tokens = v;
        }
        if let Some(v) = file.llm.temperature {
            self.llm.temperature = v;
        }

        if let Some(v) = file.timing.debounce_ms {
            self.timing.debounce = Duration::from_millis(v);
        }
        if let Some(v) = file.timing.no_input_ms {
            self.timing.no_input = Duration::from_millis(v);
        }
        if let Some(v) = file.timing.hangup_fallback_ms {
            self.timing.hangup_fallback = Duration::from_millis(v);
        }

        if let Some(v) = file.max_turns {
            self.max_turns = v;
        }
        if let Some(v) = file.max_silence_strikes {
            self.max_silence_strikes = v;
        }
    }

    /// Overlay values from environment variables
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("PARLEY_PHONE") {
            self.phone = v;
        }
        if let Ok(v) = std::env::var("PARLEY_CALLER_ID") {
            self.caller_id = Some(v);
        }
        if let Ok(v) = std::env::var("PARLEY_LOCALE") {
            self.locale = v;
        }
        if let Ok(v) = std::env::var("PARLEY_SYSTEM_PROMPT") {
            self.system_prompt = Some(v);
        }
        if let Ok(v) = std::env::var("PARLEY_GREETING") {
            self.greeting = Some(v);
        }
        if let Ok(v) = std::env::var("PARLEY_FILLER") {
            self.filler = Some(v);
        }

        if let Ok(v) = std::env::var("ELEVENLABS_API_KEY") {
            self.voice.elevenlabs_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("ELEVENLABS_VOICE_ID") {
            self.voice.elevenlabs_voice_id = Some(v);
        }
        if let Ok(v) = std::env::var("SPEECHKIT_API_KEY") {
            self.voice.speechkit_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("PARLEY_TTS_VOICE") {
            self.voice.speechkit_voice = v;
        }

        if let Ok(v) = std::env::var("PARLEY_ASR_LOCALE") {
            self.recognition.locale = v;
        }
        if let Ok(v) = std::env::var("PARLEY_ASR_MODEL") {
            self.recognition.model = v;
        }

        if let Ok(v) = std::env::var("PARLEY_LLM_URL") {
            self.llm.endpoint = v;
        }
        if let Ok(v) = std::env::var("PARLEY_LLM_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("PARLEY_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = parse_env("PARLEY_LLM_MAX_TOKENS") {
            self.llm.max_tokens = v;
        }

        if let Some(v) = parse_env("PARLEY_DEBOUNCE_MS") {
            self.timing.debounce = Duration::from_millis(v);
        }
        if let Some(v) = parse_env("PARLEY_NO_INPUT_MS") {
            self.timing.no_input = Duration::from_millis(v);
        }
        if let Some(v) = parse_env("PARLEY_MAX_TURNS") {
            self.max_turns = v;
        }
        if let Some(v) = parse_env("PARLEY_MAX_SILENCE_STRIKES") {
            self.max_silence_strikes = v;
        }
    }

    /// Check fatal preconditions
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing precondition.
    pub fn validate(&self) -> Result<()> {
        if self.phone.trim().is_empty() {
            return Err(Error::Config("phone target required".to_string()));
        }
        if self.llm.api_key.as_deref().is_none_or(|k| k.is_empty()) {
            return Err(Error::Config("LLM API key required".to_string()));
        }
        if self.max_turns == 0 {
            return Err(Error::Config("max_turns must be at least 1".to_string()));
        }
        if self.max_silence_strikes == 0 {
            return Err(Error::Config(
                "max_silence_strikes must be at least 1".to_string(),
            ));
        }
        if self.timing.debounce.is_zero() || self.timing.no_input.is_zero() {
            return Err(Error::Config("timers must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Parse a numeric environment variable, ignoring unset or invalid values
fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Path of the persistent config file: `~/.config/parley/config.toml`
#[must_use]
pub fn config_file_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".config/parley/config.toml"),
        |d| d.config_dir().join("parley").join("config.toml"),
    )
}

/// Load the optional TOML config file; any failure falls back to defaults
fn load_config_file() -> ConfigFile {
    let path = config_file_path();
    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(file) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                file
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read config file");
            ConfigFile::default()
        }
    }
}

/// Top-level TOML config file schema
///
/// All fields are optional — the file is a partial overlay on top of
/// defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    phone: Option<String>,
    caller_id: Option<String>,
    locale: Option<String>,
    system_prompt: Option<String>,
    greeting: Option<String>,
    filler: Option<String>,

    #[serde(default)]
    voice: VoiceFileConfig,

    #[serde(default)]
    recognition: RecognitionFileConfig,

    #[serde(default)]
    llm: LlmFileConfig,

    #[serde(default)]
    timing: TimingFileConfig,

    max_turns: Option<u32>,
    max_silence_strikes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct VoiceFileConfig {
    elevenlabs_api_key: Option<String>,
    elevenlabs_voice_id: Option<String>,
    speechkit_api_key: Option<String>,
    speechkit_voice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RecognitionFileConfig {
    locale: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmFileConfig {
    endpoint: Option<String>,
    api_key: Option<String>,
    auth_scheme: Option<AuthScheme>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct TimingFileConfig {
    debounce_ms: Option<u64>,
    no_input_ms: Option<u64>,
    hangup_fallback_ms: Option<u64>,
}
