//! Console call simulation
//!
//! Rehearses a full conversation in the terminal: typed lines stand in for
//! recognition results, bot utterances are printed, and the debounce,
//! no-input, and hangup timers run for real. The dialog backend is the real
//! HTTP client, so a simulation exercises the whole path short of audio.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::HttpDialogBackend;
use crate::config::{CallConfig, RecognitionConfig};
use crate::engine::{CallOutcome, EngineEvent, TurnEngine, event_channel};
use crate::locale::LocalePack;
use crate::speech::SpeechIo;
use crate::transcript::TranscriptSink;
use crate::Result;

/// Simulated playback time, long enough to try a barge-in by typing
const PLAYBACK_DELAY: Duration = Duration::from_millis(200);

/// Console-backed speech adapter
///
/// "Plays" utterances by printing them and reports completion after a short
/// delay; recognition is a blocking stdin reader feeding final results into
/// the engine channel.
pub struct ConsoleCall {
    events_tx: mpsc::Sender<EngineEvent>,
    recognition: RecognitionConfig,
    reader: Option<JoinHandle<()>>,
}

impl ConsoleCall {
    /// Create a console adapter feeding the given engine channel
    #[must_use]
    pub fn new(events_tx: mpsc::Sender<EngineEvent>, recognition: RecognitionConfig) -> Self {
        Self {
            events_tx,
            recognition,
            reader: None,
        }
    }
}

#[async_trait]
impl SpeechIo for ConsoleCall {
    async fn speak(&mut self, text: &str) -> Result<()> {
        println!("  bot> {text}");

        // Completion arrives as an event, like real playback would
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(PLAYBACK_DELAY).await;
            let _ = tx.send(EngineEvent::PlaybackFinished).await;
        });

        Ok(())
    }

    async fn stop_speaking(&mut self) {
        println!("  [playback interrupted]");
    }

    async fn start_listening(&mut self) -> Result<()> {
        tracing::debug!(
            locale = %self.recognition.locale,
            model = %self.recognition.model,
            "console recognizer attached"
        );

        let tx = self.events_tx.clone();
        // Blocking stdin reader; ends with the process once the engine is
        // gone and sends start failing
        self.reader = Some(tokio::task::spawn_blocking(move || {
            loop {
                let line: String = match dialoguer::Input::new()
                    .with_prompt("  you")
                    .allow_empty(true)
                    .interact_text()
                {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::debug!(error = %e, "console input closed");
                        break;
                    }
                };

                let event = EngineEvent::Recognized {
                    text: line,
                    is_final: true,
                };
                if tx.blocking_send(event).is_err() {
                    break;
                }
            }
        }));

        Ok(())
    }

    async fn stop_listening(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Run a simulated call against the configured backend
///
/// # Errors
///
/// Returns error if the locale pack or backend client cannot be set up.
pub async fn run_simulation(config: CallConfig) -> Result<CallOutcome> {
    let pack = LocalePack::load(&config.locale)?;
    let backend = HttpDialogBackend::new(&config.llm, pack.messages.backend_fallbacks.clone())?;

    let (events_tx, events_rx) = event_channel();
    let speech = ConsoleCall::new(events_tx.clone(), config.recognition.clone());

    let (sink, mut records) = TranscriptSink::channel();
    let transcript_task = tokio::spawn(async move {
        while let Some(record) = records.recv().await {
            tracing::debug!(
                call_id = %record.call_id,
                speaker = ?record.speaker,
                text = %record.text,
                "turn"
            );
        }
    });

    println!("Simulated call to {} (type to answer, Ctrl-C to quit)", config.phone);

    let engine = TurnEngine::new(config, pack, speech, backend, events_rx, events_tx)
        .with_transcript(sink);
    let outcome = engine.run().await;

    transcript_task.abort();

    println!(
        "Call ended: {} after {} turn(s)",
        outcome.reason, outcome.turns
    );

    Ok(outcome)
}
