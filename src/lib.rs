//! Parley - conversation turn engine for AI-driven phone calls
//!
//! This library manages one phone conversation from connection to hangup:
//! - Turn-taking with end-of-speech debouncing and barge-in
//! - Silence escalation and hard turn/silence caps
//! - Phrase classification (termination, scheduling commitments, farewells)
//! - Reply sanitation for speakable one-sentence answers
//! - Dialog backend and speech synthesis clients
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Telephony host                      │
//! │   call events  │  recognition  │  playback  │ audio │
//! └────────────────────┬────────────────────────────────┘
//!                      │ EngineEvent channel
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Turn Engine                         │
//! │  Greeting → Listening → Debouncing → AwaitingBackend │
//! │      ↑          ↓            ↑            ↓          │
//! │  SilenceRetry   └── Speaking ┘         Ended         │
//! └──────┬──────────────────┬───────────────────────────┘
//!        │ SpeechIo         │ DialogBackend
//! ┌──────▼──────┐    ┌──────▼──────────────┐
//! │  Synthesis  │    │  Chat completions   │
//! │ (11Labs/SK) │    │  (OpenAI-compatible)│
//! └─────────────┘    └─────────────────────┘
//! ```
//!
//! The engine owns all per-call state and consumes only abstract
//! capabilities: the host routes audio and feeds events, the backend
//! produces text. Nothing here touches sockets for signaling, samples for
//! audio, or storage for transcripts.

pub mod backend;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod locale;
pub mod sanitize;
pub mod simulate;
pub mod speech;
pub mod transcript;

pub use backend::{AuthScheme, DialogBackend, HttpDialogBackend};
pub use classify::Classification;
pub use config::{CallConfig, LlmConfig, RecognitionConfig, TimingConfig, VoiceConfig};
pub use engine::{
    CallOutcome, ConversationState, EndReason, EngineEvent, Phase, TurnEngine, event_channel,
};
pub use error::{Error, Result};
pub use locale::{BackendFallbacks, Lexicon, LocalePack, Messages};
pub use sanitize::{sanitize_reply, split_into_phrases};
pub use speech::{SpeechIo, SpeechSynthesizer, SynthesisRoute};
pub use transcript::{Speaker, TranscriptSink, TurnRecord, Utterance};
