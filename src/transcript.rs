//! Per-turn transcript records
//!
//! The engine reports every spoken or recognized utterance as a structured
//! record suitable for external logging or persistence. Delivery is
//! best-effort — a dropped consumer is logged and never disturbs the call.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// Who produced an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The human on the call
    User,
    /// The engine
    Assistant,
}

/// One utterance in the conversation history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Who said it
    pub speaker: Speaker,
    /// What was said
    pub text: String,
}

impl Utterance {
    /// Create a user utterance
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    /// Create an assistant utterance
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// A structured record of one turn, emitted as it happens
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    /// Call this record belongs to
    pub call_id: String,
    /// When the utterance completed
    pub timestamp: DateTime<Utc>,
    /// Who spoke
    pub speaker: Speaker,
    /// What was said
    pub text: String,
}

/// Best-effort sender half of a transcript stream
///
/// Cloneable; records are pushed without blocking. When the receiving side
/// is gone the record is dropped with a warning.
#[derive(Debug, Clone)]
pub struct TranscriptSink {
    tx: mpsc::UnboundedSender<TurnRecord>,
}

impl TranscriptSink {
    /// Create a sink and its receiving end
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TurnRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Record one turn (fire-and-forget)
    pub fn record(&self, call_id: &str, speaker: Speaker, text: &str) {
        let record = TurnRecord {
            call_id: call_id.to_string(),
            timestamp: Utc::now(),
            speaker,
            text: text.to_string(),
        };

        if self.tx.send(record).is_err() {
            tracing::warn!(call_id, "transcript consumer gone, dropping record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_arrive_in_order() {
        let (sink, mut rx) = TranscriptSink::channel();
        sink.record("call-1", Speaker::Assistant, "Hello!");
        sink.record("call-1", Speaker::User, "hi");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.speaker, Speaker::Assistant);
        assert_eq!(first.text, "Hello!");
        assert_eq!(first.call_id, "call-1");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.speaker, Speaker::User);
    }

    #[test]
    fn dropped_consumer_does_not_panic() {
        let (sink, rx) = TranscriptSink::channel();
        drop(rx);
        sink.record("call-1", Speaker::User, "anyone there?");
    }

    #[test]
    fn records_serialize_with_lowercase_speaker() {
        let record = TurnRecord {
            call_id: "call-1".to_string(),
            timestamp: Utc::now(),
            speaker: Speaker::User,
            text: "tomorrow at three".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["speaker"], "user");
        assert_eq!(json["text"], "tomorrow at three");
    }
}
