//! Speech I/O abstraction
//!
//! The engine talks to speech hardware through the [`SpeechIo`] trait and
//! never learns which synthesis or recognition backend is active. Playback
//! completion and recognition results come back asynchronously as engine
//! events; the trait only carries commands.

mod synth;

use async_trait::async_trait;

pub use synth::{SpeechSynthesizer, SynthesisRoute};

use crate::Result;

/// Commands the engine issues to the speech layer
///
/// `speak` starts playback and returns immediately; the host reports
/// completion with a playback-finished event. Recognition stays armed while
/// synthesis plays so barge-in keeps working.
#[async_trait]
pub trait SpeechIo: Send {
    /// Start speaking an utterance; completion arrives as an event
    ///
    /// # Errors
    ///
    /// Returns error if playback cannot be started. The engine treats this
    /// as a host failure and ends the call.
    async fn speak(&mut self, text: &str) -> Result<()>;

    /// Cancel any in-progress playback (barge-in)
    ///
    /// A cancelled playback should not emit a completion event; the engine
    /// tolerates strays, but they can shorten the farewell.
    async fn stop_speaking(&mut self);

    /// Attach the recognizer to the call audio
    ///
    /// # Errors
    ///
    /// Returns error if the recognizer cannot be attached.
    async fn start_listening(&mut self) -> Result<()>;

    /// Detach the recognizer; no further recognition events should arrive
    async fn stop_listening(&mut self);
}
