//! Turn engine — the per-call conversation controller
//!
//! A single-threaded, event-driven state machine that manages one phone
//! conversation from connection to hangup. All work is triggered by
//! external events (recognition results, playback completions, backend
//! replies, call teardown) delivered through one channel and dispatched on
//! (current phase, event kind); timers are single-shot deadlines inside the
//! select loop, cancelled by clearing them.
//!
//! Policy enforced here:
//! - greeting played as a sequence of short utterances, recognition ignored
//!   until it finishes
//! - end-of-speech debounce before a user turn is accepted
//! - barge-in: recognized speech cancels in-progress playback immediately
//! - escalating silence prompts, with a hard cap ending the call
//! - hard turn cap
//! - one-shot filler masking the first backend round-trip
//! - at most one outstanding backend request; newer speech supersedes it

mod state;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

pub use state::{CallOutcome, ConversationState, EndReason, EngineEvent, Phase};

use crate::backend::DialogBackend;
use crate::config::CallConfig;
use crate::locale::LocalePack;
use crate::sanitize::{sanitize_reply, split_into_phrases};
use crate::speech::SpeechIo;
use crate::transcript::{Speaker, TranscriptSink, Utterance};

/// Event channel capacity; events are processed to completion, so a small
/// buffer suffices
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Create the event channel connecting a host to an engine
///
/// The host keeps the sender (and hands clones to its speech adapter); the
/// receiver goes to [`TurnEngine::new`].
#[must_use]
pub fn event_channel() -> (mpsc::Sender<EngineEvent>, mpsc::Receiver<EngineEvent>) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

/// Drives one conversation
pub struct TurnEngine<S: SpeechIo, B: DialogBackend + 'static> {
    call_id: String,
    config: CallConfig,
    pack: LocalePack,
    speech: S,
    backend: Arc<B>,
    events: mpsc::Receiver<EngineEvent>,
    events_tx: mpsc::Sender<EngineEvent>,
    transcript: Option<TranscriptSink>,

    state: ConversationState,
    greeting: String,
    greeting_parts: Vec<String>,
    greeting_index: usize,
    system_prompt: String,

    debounce_deadline: Option<Instant>,
    no_input_deadline: Option<Instant>,
    hangup_deadline: Option<Instant>,

    backend_seq: u64,
    awaiting_seq: Option<u64>,

    end_reason: Option<EndReason>,
    done: bool,
}

impl<S: SpeechIo, B: DialogBackend + 'static> TurnEngine<S, B> {
    /// Create an engine for one call
    ///
    /// The channel pair comes from [`event_channel`]; the host keeps sender
    /// clones to feed events in. The configuration must already be
    /// validated.
    #[must_use]
    pub fn new(
        config: CallConfig,
        pack: LocalePack,
        speech: S,
        backend: B,
        events: mpsc::Receiver<EngineEvent>,
        events_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        let greeting = config
            .greeting
            .clone()
            .unwrap_or_else(|| pack.messages.greeting.clone());
        let system_prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| pack.messages.system_prompt.clone());
        let greeting_parts = split_into_phrases(&greeting);

        Self {
            call_id: Uuid::new_v4().to_string(),
            config,
            pack,
            speech,
            backend: Arc::new(backend),
            events,
            events_tx,
            transcript: None,
            state: ConversationState::new(),
            greeting,
            greeting_parts,
            greeting_index: 0,
            system_prompt,
            debounce_deadline: None,
            no_input_deadline: None,
            hangup_deadline: None,
            backend_seq: 0,
            awaiting_seq: None,
            end_reason: None,
            done: false,
        }
    }

    /// Attach a transcript sink receiving one record per spoken/heard turn
    #[must_use]
    pub fn with_transcript(mut self, sink: TranscriptSink) -> Self {
        self.transcript = Some(sink);
        self
    }

    /// Engine-assigned call identifier
    #[must_use]
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Run the call to completion
    ///
    /// Consumes the engine; per-call state never outlives the call. The
    /// host terminates the underlying call when this returns.
    pub async fn run(mut self) -> CallOutcome {
        tracing::info!(
            call_id = %self.call_id,
            phone = %self.config.phone,
            locale = %self.config.locale,
            "call connected"
        );

        if let Err(e) = self.speech.start_listening().await {
            tracing::error!(error = %e, "failed to attach recognizer");
            self.end_reason = Some(EndReason::HostFailure);
            return self.into_outcome();
        }

        // The greeting opens the conversation the backend will continue
        let greeting = self.greeting.clone();
        self.state.history.push(Utterance::assistant(greeting.clone()));
        self.record(Speaker::Assistant, &greeting);

        if self.greeting_parts.is_empty() {
            self.enter_listening();
        } else {
            let part = self.greeting_parts[0].clone();
            self.say(&part).await;
        }

        while !self.done {
            tokio::select! {
                maybe = self.events.recv() => match maybe {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        tracing::warn!("event source closed");
                        self.end_reason.get_or_insert(EndReason::RemoteHangup);
                        self.done = true;
                    }
                },
                () = sleep_until_opt(self.debounce_deadline), if self.debounce_deadline.is_some() => {
                    self.debounce_deadline = None;
                    self.on_debounce_elapsed().await;
                }
                () = sleep_until_opt(self.no_input_deadline), if self.no_input_deadline.is_some() => {
                    self.no_input_deadline = None;
                    self.on_no_input_elapsed().await;
                }
                () = sleep_until_opt(self.hangup_deadline), if self.hangup_deadline.is_some() => {
                    tracing::debug!("farewell playback deadline elapsed, hanging up");
                    self.hangup_deadline = None;
                    self.done = true;
                }
            }
        }

        self.into_outcome()
    }

    /// Single event intake: dispatch on (phase, event kind)
    async fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Recognized { text, is_final } => self.on_recognized(&text, is_final).await,
            EngineEvent::RecognitionError { message } => {
                tracing::warn!(error = %message, "recognition error ignored");
            }
            EngineEvent::PlaybackFinished => self.on_playback_finished().await,
            EngineEvent::PlaybackFailed { message } => {
                tracing::error!(error = %message, "playback failed");
                self.fail_call().await;
            }
            EngineEvent::BackendReply { seq, text } => self.on_backend_reply(seq, text).await,
            EngineEvent::Disconnected => {
                tracing::info!("remote hangup");
                self.end_reason.get_or_insert(EndReason::RemoteHangup);
                self.done = true;
            }
        }
    }

    /// Recognition result (interim or final)
    async fn on_recognized(&mut self, text: &str, is_final: bool) {
        if self.state.phase == Phase::Ended {
            return;
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if self.state.phase == Phase::Greeting {
            tracing::debug!(text = %trimmed, "ignored during greeting");
            return;
        }

        self.state.silence_strikes = 0;

        if self.state.is_speaking {
            tracing::debug!("barge-in, cancelling playback");
            self.speech.stop_speaking().await;
            self.state.is_speaking = false;
        }

        if self.awaiting_seq.take().is_some() {
            tracing::debug!("superseding in-flight backend request");
        }

        if is_final {
            tracing::debug!(text = %trimmed, "recognized");
            self.state.pending_text = Some(trimmed.to_string());
        }

        self.state.phase = Phase::Debouncing;
        self.no_input_deadline = None;
        self.debounce_deadline = Some(Instant::now() + self.config.timing.debounce);
    }

    /// Playback completed
    async fn on_playback_finished(&mut self) {
        self.state.is_speaking = false;

        match self.state.phase {
            Phase::Greeting => {
                self.greeting_index += 1;
                if self.greeting_index < self.greeting_parts.len() {
                    let part = self.greeting_parts[self.greeting_index].clone();
                    self.say(&part).await;
                } else {
                    tracing::debug!("greeting complete, listening");
                    self.enter_listening();
                }
            }
            // Filler finished before the request went out
            Phase::AwaitingBackend => {
                if self.awaiting_seq.is_none() {
                    self.dispatch_backend();
                }
            }
            Phase::Speaking | Phase::SilenceRetry => self.enter_listening(),
            Phase::Ended => self.done = true,
            // Stray completion after a barge-in cancel
            Phase::Listening | Phase::Debouncing => {}
        }
    }

    /// End-of-speech window elapsed
    async fn on_debounce_elapsed(&mut self) {
        if self.state.phase != Phase::Debouncing {
            return;
        }
        match self.state.pending_text.take() {
            Some(text) => self.process_turn(text).await,
            None => {
                // Interim speech never finalized; resume waiting
                tracing::debug!("debounce elapsed without final text");
                self.enter_listening();
            }
        }
    }

    /// No-input window elapsed
    async fn on_no_input_elapsed(&mut self) {
        if self.state.phase != Phase::Listening {
            return;
        }
        if let Some(text) = self.state.pending_text.take() {
            self.process_turn(text).await;
            return;
        }

        self.state.silence_strikes += 1;
        let strikes = self.state.silence_strikes;

        if strikes >= self.config.max_silence_strikes {
            tracing::info!(strikes, "silence cap reached");
            let message = self.pack.messages.connection_lost.clone();
            self.end_call(EndReason::ConnectionLost, &message).await;
            return;
        }

        let prompts = &self.pack.messages.silence_prompts;
        let index = (strikes as usize - 1).min(prompts.len().saturating_sub(1));
        let Some(prompt) = prompts.get(index).cloned() else {
            self.enter_listening();
            return;
        };

        tracing::debug!(strikes, prompt = %prompt, "silence prompt");
        self.state.phase = Phase::SilenceRetry;
        self.record(Speaker::Assistant, &prompt);
        self.say(&prompt).await;
    }

    /// A debounced user utterance is ready
    async fn process_turn(&mut self, text: String) {
        self.state.turn_count += 1;
        self.debounce_deadline = None;
        self.no_input_deadline = None;

        tracing::info!(turn = self.state.turn_count, text = %text, "user turn");
        self.record(Speaker::User, &text);

        let classification = self.pack.lexicon.classify(&text);

        if classification.is_termination_request {
            let farewell = self
                .pack
                .lexicon
                .farewell_for(&text, &self.pack.messages)
                .to_string();
            self.end_call(EndReason::CallerDeclined, &farewell).await;
            return;
        }

        if classification.is_scheduling_commitment {
            let message = self.pack.messages.scheduling_confirmed.clone();
            self.end_call(EndReason::Scheduled, &message).await;
            return;
        }

        if self.state.turn_count > self.config.max_turns {
            tracing::info!(turns = self.state.turn_count, "turn cap exceeded");
            let message = self.pack.messages.turn_cap.clone();
            self.end_call(EndReason::TurnCapReached, &message).await;
            return;
        }

        self.state.history.push(Utterance::user(text));
        self.state.phase = Phase::AwaitingBackend;

        let filler = self
            .config
            .filler
            .clone()
            .unwrap_or_else(|| self.pack.messages.filler.clone());

        if !self.state.filler_used && !filler.is_empty() {
            self.state.filler_used = true;
            // Request goes out once the filler finishes playing
            self.say(&filler).await;
        } else {
            self.dispatch_backend();
        }
    }

    /// Issue the backend request for the current history
    fn dispatch_backend(&mut self) {
        self.backend_seq += 1;
        let seq = self.backend_seq;
        self.awaiting_seq = Some(seq);

        let backend = Arc::clone(&self.backend);
        let system_prompt = self.system_prompt.clone();
        let history = self.state.history.clone();
        let tx = self.events_tx.clone();

        tracing::debug!(seq, messages = history.len(), "dialog backend request");
        tokio::spawn(async move {
            let text = backend.generate_reply(&system_prompt, &history).await;
            if tx.send(EngineEvent::BackendReply { seq, text }).await.is_err() {
                tracing::debug!(seq, "engine gone before backend reply");
            }
        });
    }

    /// Backend round-trip completed
    async fn on_backend_reply(&mut self, seq: u64, text: String) {
        if self.state.phase == Phase::Ended {
            return;
        }
        if self.awaiting_seq != Some(seq) {
            tracing::debug!(seq, "discarding stale backend reply");
            return;
        }
        self.awaiting_seq = None;

        let reply = sanitize_reply(&text, &self.pack.messages.empty_reply);
        tracing::info!(turn = self.state.turn_count, text = %reply, "assistant turn");
        self.state.history.push(Utterance::assistant(reply.clone()));

        if self.pack.lexicon.classify(&reply).is_farewell_phrase {
            tracing::debug!("reply is a farewell");
            self.end_call(EndReason::AssistantFarewell, &reply).await;
        } else {
            self.record(Speaker::Assistant, &reply);
            self.state.phase = Phase::Speaking;
            self.say(&reply).await;
        }
    }

    /// Enter Listening and arm the no-input window
    fn enter_listening(&mut self) {
        self.state.phase = Phase::Listening;
        self.debounce_deadline = None;
        self.no_input_deadline = Some(Instant::now() + self.config.timing.no_input);
    }

    /// Transition to Ended and speak the final message (idempotent)
    async fn end_call(&mut self, reason: EndReason, message: &str) {
        if self.state.phase == Phase::Ended {
            return;
        }
        tracing::info!(reason = %reason, "ending call");

        self.state.phase = Phase::Ended;
        self.end_reason = Some(reason);
        self.debounce_deadline = None;
        self.no_input_deadline = None;
        self.awaiting_seq = None;

        self.speech.stop_listening().await;
        self.record(Speaker::Assistant, message);

        // Hang up when the farewell finishes, or at the deadline if the
        // completion event never arrives
        self.hangup_deadline = Some(Instant::now() + self.config.timing.hangup_fallback);
        self.say(message).await;
    }

    /// Tear down after a playback/host failure; nothing more can be spoken
    async fn fail_call(&mut self) {
        self.end_reason.get_or_insert(EndReason::HostFailure);
        self.state.phase = Phase::Ended;
        self.debounce_deadline = None;
        self.no_input_deadline = None;
        self.awaiting_seq = None;
        self.speech.stop_listening().await;
        self.done = true;
    }

    /// Start speaking; playback errors fail the call
    async fn say(&mut self, text: &str) {
        tracing::debug!(text, "speaking");
        self.state.is_speaking = true;
        if let Err(e) = self.speech.speak(text).await {
            tracing::error!(error = %e, "playback failed to start");
            self.fail_call().await;
        }
    }

    /// Push a turn record to the transcript sink, if any
    fn record(&self, speaker: Speaker, text: &str) {
        if let Some(sink) = &self.transcript {
            sink.record(&self.call_id, speaker, text);
        }
    }

    /// Build the final outcome
    fn into_outcome(mut self) -> CallOutcome {
        let reason = self.end_reason.unwrap_or(EndReason::RemoteHangup);
        tracing::info!(
            call_id = %self.call_id,
            reason = %reason,
            turns = self.state.turn_count,
            "call finished"
        );
        CallOutcome {
            call_id: self.call_id,
            reason,
            turns: self.state.turn_count,
            history: std::mem::take(&mut self.state.history),
        }
    }
}

/// Sleep until an optional deadline
///
/// Callers disable the select branch when the deadline is `None`; the
/// placeholder value is never polled.
async fn sleep_until_opt(deadline: Option<Instant>) {
    tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)).await;
}
