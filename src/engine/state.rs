//! Conversation state and engine events

use std::fmt;

use crate::transcript::Utterance;

/// Phase of one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Playing the opening greeting; recognition is ignored
    Greeting,
    /// Waiting for the caller to speak, no-input timer armed
    Listening,
    /// Caller is speaking; waiting for the end-of-speech window to elapse
    Debouncing,
    /// User turn accepted; filler playing or backend request in flight
    AwaitingBackend,
    /// Playing the assistant reply; barge-in allowed
    Speaking,
    /// Playing an "are you there?" prompt after a silence strike
    SilenceRetry,
    /// Terminal: farewell playing or call torn down
    Ended,
}

/// Mutable state owned exclusively by the engine for one call
#[derive(Debug)]
pub struct ConversationState {
    /// Completed user turns; monotonically increasing
    pub turn_count: u32,

    /// Insertion-ordered conversation history, passed verbatim to the
    /// backend
    pub history: Vec<Utterance>,

    /// Current phase
    pub phase: Phase,

    /// Consecutive no-input timeouts; reset by any recognized speech
    pub silence_strikes: u32,

    /// Latest unconsumed recognized utterance
    pub pending_text: Option<String>,

    /// Whether the one-shot filler has been played
    pub filler_used: bool,

    /// Whether synthesis is currently playing
    pub is_speaking: bool,
}

impl ConversationState {
    /// Fresh state for a newly connected call
    #[must_use]
    pub fn new() -> Self {
        Self {
            turn_count: 0,
            history: Vec::new(),
            phase: Phase::Greeting,
            silence_strikes: 0,
            pending_text: None,
            filler_used: false,
            is_speaking: false,
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// External events driving the engine
///
/// The host feeds call and recognition events into the engine's channel;
/// backend replies arrive on the same channel from the request task.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Recognition produced text; interim results carry `is_final = false`
    Recognized {
        /// Recognized text
        text: String,
        /// Whether this is a final recognition result
        is_final: bool,
    },

    /// The recognizer reported an error; logged and ignored
    RecognitionError {
        /// Error description
        message: String,
    },

    /// The current playback finished normally
    PlaybackFinished,

    /// Playback failed; treated as a host failure
    PlaybackFailed {
        /// Error description
        message: String,
    },

    /// A dialog backend round-trip completed
    BackendReply {
        /// Request sequence number; stale replies are discarded
        seq: u64,
        /// Reply text (already fallback-substituted on failure)
        text: String,
    },

    /// The remote side hung up
    Disconnected,
}

/// Why a call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The caller asked to end the call
    CallerDeclined,
    /// The caller committed to a day and time
    Scheduled,
    /// The configured turn cap was exceeded
    TurnCapReached,
    /// The silence-strike cap was reached
    ConnectionLost,
    /// The backend reply itself was a farewell
    AssistantFarewell,
    /// The remote side hung up
    RemoteHangup,
    /// Playback or host error
    HostFailure,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CallerDeclined => "caller-declined",
            Self::Scheduled => "scheduled",
            Self::TurnCapReached => "turn-cap",
            Self::ConnectionLost => "connection-lost",
            Self::AssistantFarewell => "assistant-farewell",
            Self::RemoteHangup => "remote-hangup",
            Self::HostFailure => "host-failure",
        };
        f.write_str(label)
    }
}

/// Summary handed back to the host when the engine returns
#[derive(Debug)]
pub struct CallOutcome {
    /// Engine-assigned call identifier
    pub call_id: String,

    /// Why the call ended
    pub reason: EndReason,

    /// Completed user turns
    pub turns: u32,

    /// Full conversation history, greeting first
    pub history: Vec<Utterance>,
}
