//! Per-locale language packs
//!
//! A pack bundles the classifier keyword tables and the default call
//! messages for one language. Packs are plain data: the classifier and the
//! engine stay locale-agnostic, and hosts can supply their own tables.

use serde::Deserialize;

use crate::{Error, Result};

/// Locale packs compiled into the binary
const EMBEDDED_PACKS: &[(&str, &str)] = &[
    ("en", include_str!("../lexicons/en.toml")),
    ("ru", include_str!("../lexicons/ru.toml")),
];

/// Keyword tables driving the phrase classifier
///
/// All matching is lower-cased substring matching; entries must be
/// lower-case.
#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
    /// Phrases that signal an explicit request to end the call
    pub termination: Vec<String>,

    /// Subset of termination phrases that warrant an apologetic farewell
    pub harsh: Vec<String>,

    /// Subset of termination phrases that are a plain goodbye
    pub polite: Vec<String>,

    /// Phrases that mark an assistant reply as a farewell
    pub farewell: Vec<String>,

    /// Day/date tokens ("tomorrow", "monday")
    pub days: Vec<String>,

    /// Time-of-day tokens ("at three", "in the evening")
    pub times: Vec<String>,

    /// Phrases that carry both a day and a time in one match
    pub combined: Vec<String>,
}

/// Default spoken messages for one locale
#[derive(Debug, Clone, Deserialize)]
pub struct Messages {
    /// Opening greeting, split into sentences at playback time
    pub greeting: String,

    /// One-shot "please hold" phrase masking the first backend round-trip
    pub filler: String,

    /// Escalating "are you there?" prompts, used in order by strike count
    pub silence_prompts: Vec<String>,

    /// Farewell when the silence-strike cap is reached
    pub connection_lost: String,

    /// Farewell when the turn cap is reached
    pub turn_cap: String,

    /// Confirmation farewell when the caller commits to a day and time
    pub scheduling_confirmed: String,

    /// Farewell for harsh refusals
    pub farewell_apology: String,

    /// Farewell when the caller says goodbye politely
    pub farewell_polite: String,

    /// Farewell for any other termination request
    pub farewell_generic: String,

    /// Substitute for a sanitized reply that came out empty
    pub empty_reply: String,

    /// Default system prompt for the dialog backend
    pub system_prompt: String,

    /// Fixed phrases substituted for failed backend replies
    pub backend_fallbacks: BackendFallbacks,
}

/// Fallback phrase per backend failure kind
///
/// Distinct phrases per path keep repeated failures from sounding like a
/// stuck tape to the person on the call.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendFallbacks {
    /// Response parsed but carried no choices
    pub missing_reply: String,

    /// Response body could not be parsed
    pub malformed: String,

    /// Request never completed (network error, timeout)
    pub network: String,
}

/// A complete language pack: lexicon plus default messages
#[derive(Debug, Clone, Deserialize)]
pub struct LocalePack {
    /// Classifier keyword tables
    pub lexicon: Lexicon,

    /// Default spoken messages
    pub messages: Messages,
}

impl LocalePack {
    /// Load an embedded locale pack by identifier (e.g. "en", "ru")
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locale`] if the locale is unknown or its pack fails
    /// to parse.
    pub fn load(locale: &str) -> Result<Self> {
        let normalized = locale.trim().to_lowercase();
        let source = EMBEDDED_PACKS
            .iter()
            .find(|(id, _)| *id == normalized)
            .map(|(_, toml)| *toml)
            .ok_or_else(|| Error::Locale(format!("unknown locale: {locale}")))?;

        let pack: Self = toml::from_str(source)
            .map_err(|e| Error::Locale(format!("invalid pack for {normalized}: {e}")))?;

        tracing::debug!(locale = %normalized, "loaded locale pack");
        Ok(pack)
    }

    /// Return the embedded locale identifiers
    #[must_use]
    pub fn available() -> Vec<&'static str> {
        EMBEDDED_PACKS.iter().map(|(id, _)| *id).collect()
    }

    /// Parse a pack from a TOML string supplied by the host
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locale`] if the document fails to parse.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Locale(format!("invalid pack: {e}")))
    }
}
