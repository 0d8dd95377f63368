//! Shared test utilities
//!
//! A scripted speech adapter and dialog backend for driving full engine
//! scenarios without audio hardware or network access.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use parley::transcript::Utterance;
use parley::{CallConfig, DialogBackend, EngineEvent, Result, SpeechIo};

/// Simulated playback duration per utterance
pub const PLAYBACK: Duration = Duration::from_millis(500);

/// Observable record of everything the engine spoke
pub struct SpeechLog {
    spoken: Mutex<Vec<String>>,
    stops: AtomicUsize,
}

impl SpeechLog {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        })
    }

    /// Everything spoken so far, in order
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    /// Number of utterances spoken so far
    pub fn spoken_len(&self) -> usize {
        self.spoken.lock().unwrap().len()
    }

    /// Whether an utterance containing `needle` was spoken
    pub fn has_spoken(&self, needle: &str) -> bool {
        self.spoken.lock().unwrap().iter().any(|s| s.contains(needle))
    }

    /// Number of playback cancellations (barge-ins)
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn push(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Speech adapter that records utterances and completes playback after a
/// fixed simulated duration
pub struct MockSpeech {
    log: Arc<SpeechLog>,
    events_tx: mpsc::Sender<EngineEvent>,
}

impl MockSpeech {
    #[must_use]
    pub fn new(log: Arc<SpeechLog>, events_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { log, events_tx }
    }
}

#[async_trait]
impl SpeechIo for MockSpeech {
    async fn speak(&mut self, text: &str) -> Result<()> {
        self.log.push(text);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(PLAYBACK).await;
            let _ = tx.send(EngineEvent::PlaybackFinished).await;
        });
        Ok(())
    }

    async fn stop_speaking(&mut self) {
        self.log.stops.fetch_add(1, Ordering::SeqCst);
    }

    async fn start_listening(&mut self) -> Result<()> {
        Ok(())
    }

    async fn stop_listening(&mut self) {}
}

/// Backend with a fixed reply and a call counter
pub struct ScriptedBackend {
    calls: Arc<AtomicUsize>,
    reply: String,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new(reply: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                reply: reply.to_string(),
            },
            calls,
        )
    }
}

#[async_trait]
impl DialogBackend for ScriptedBackend {
    async fn generate_reply(&self, _system_prompt: &str, _history: &[Utterance]) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// Call configuration with test-sized timers
#[must_use]
pub fn test_config() -> CallConfig {
    let mut config = CallConfig::default();
    config.phone = "+15550100".to_string();
    config.llm.api_key = Some("test-key".to_string());
    config.timing.debounce = Duration::from_millis(300);
    config.timing.no_input = Duration::from_secs(10);
    config.timing.hangup_fallback = Duration::from_secs(5);
    config
}

/// Advance simulated time in small steps until a condition holds
///
/// # Panics
///
/// Panics if the condition is not reached within the simulated window.
pub async fn settle_until<F: Fn() -> bool>(what: &str, condition: F) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("never reached: {what}");
}
