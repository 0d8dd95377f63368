//! Phrase classification
//!
//! Inspects recognized caller text for end-of-call signals, scheduling
//! commitments, and farewell phrases. Matching is lower-cased substring
//! matching against the [`Lexicon`] tables — no stemming, no scoring.
//! Ambiguous input classifies as "continue the conversation".

use crate::locale::{Lexicon, Messages};

/// Classification flags for one utterance
///
/// Flags are not mutually exclusive: "tomorrow at three, goodbye" sets both
/// the scheduling and termination flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// The caller explicitly asked to end the call
    pub is_termination_request: bool,

    /// The caller committed to a day and a time
    pub is_scheduling_commitment: bool,

    /// The utterance reads as a farewell phrase
    pub is_farewell_phrase: bool,
}

impl Lexicon {
    /// Classify an utterance
    ///
    /// The input is lower-cased internally, so callers may pass raw
    /// recognition output.
    #[must_use]
    pub fn classify(&self, utterance: &str) -> Classification {
        let text = utterance.to_lowercase();

        Classification {
            is_termination_request: contains_any(&text, &self.termination),
            is_scheduling_commitment: self.has_full_datetime(&text),
            is_farewell_phrase: contains_any(&text, &self.farewell),
        }
    }

    /// True when the utterance carries both a day and a time
    ///
    /// Combined phrases ("tomorrow morning") satisfy both in one match;
    /// otherwise a day token and a time token must each appear.
    #[must_use]
    pub fn has_full_datetime(&self, text: &str) -> bool {
        if contains_any(text, &self.combined) {
            return true;
        }
        contains_any(text, &self.days) && contains_any(text, &self.times)
    }

    /// Pick the farewell matching a terminating utterance
    ///
    /// Harsh refusals get an apology, plain goodbyes get a goodbye back,
    /// anything else gets the generic farewell.
    #[must_use]
    pub fn farewell_for<'a>(&self, utterance: &str, messages: &'a Messages) -> &'a str {
        let text = utterance.to_lowercase();

        if contains_any(&text, &self.harsh) {
            &messages.farewell_apology
        } else if contains_any(&text, &self.polite) {
            &messages.farewell_polite
        } else {
            &messages.farewell_generic
        }
    }
}

/// True when any keyword occurs as a substring of `text`
fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocalePack;

    fn lexicon(locale: &str) -> Lexicon {
        LocalePack::load(locale).unwrap().lexicon
    }

    #[test]
    fn every_termination_keyword_classifies_as_termination() {
        for locale in ["en", "ru"] {
            let lex = lexicon(locale);
            for phrase in lex.termination.clone() {
                let c = lex.classify(&phrase);
                assert!(c.is_termination_request, "{locale}: {phrase}");
            }
        }
    }

    #[test]
    fn neutral_utterances_raise_no_flags() {
        let lex = lexicon("en");
        for phrase in ["what is this about?", "who gave you my number", "hm let me think"] {
            let c = lex.classify(phrase);
            assert!(!c.is_termination_request, "{phrase}");
            assert!(!c.is_scheduling_commitment, "{phrase}");
        }
    }

    #[test]
    fn day_plus_time_is_a_scheduling_commitment() {
        let lex = lexicon("en");
        assert!(lex.classify("tomorrow at three").is_scheduling_commitment);
        assert!(lex.classify("maybe friday in the evening").is_scheduling_commitment);

        let ru = lexicon("ru");
        assert!(ru.classify("завтра в три").is_scheduling_commitment);
        assert!(ru.classify("в понедельник вечером").is_scheduling_commitment);
    }

    #[test]
    fn day_or_time_alone_is_not_a_commitment() {
        let lex = lexicon("en");
        assert!(!lex.classify("tomorrow").is_scheduling_commitment);
        assert!(!lex.classify("maybe at three").is_scheduling_commitment);

        let ru = lexicon("ru");
        assert!(!ru.classify("завтра").is_scheduling_commitment);
        assert!(!ru.classify("можно в три").is_scheduling_commitment);
    }

    #[test]
    fn combined_phrase_satisfies_both_tokens_at_once() {
        let lex = lexicon("en");
        assert!(lex.classify("tomorrow morning").is_scheduling_commitment);
        assert!(lex.classify("tonight works").is_scheduling_commitment);
    }

    #[test]
    fn classification_is_case_insensitive() {
        let lex = lexicon("en");
        assert!(lex.classify("Tomorrow At Three").is_scheduling_commitment);
        assert!(lex.classify("GOODBYE").is_termination_request);
    }

    #[test]
    fn farewell_selection_matches_refusal_tone() {
        let pack = LocalePack::load("en").unwrap();
        let lex = &pack.lexicon;
        let msgs = &pack.messages;

        assert_eq!(
            lex.farewell_for("stop calling me", msgs),
            msgs.farewell_apology
        );
        assert_eq!(lex.farewell_for("okay goodbye", msgs), msgs.farewell_polite);
        assert_eq!(
            lex.farewell_for("not interested", msgs),
            msgs.farewell_generic
        );
    }

    #[test]
    fn assistant_farewell_phrases_are_detected() {
        let lex = lexicon("en");
        assert!(lex.classify("Noted, we'll call you then. Goodbye!").is_farewell_phrase);
        assert!(!lex.classify("When would suit you?").is_farewell_phrase);
    }
}
