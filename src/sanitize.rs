//! Backend reply sanitation
//!
//! Language models occasionally echo role labels or ramble past one
//! sentence; neither survives contact with a phone call. [`sanitize_reply`]
//! trims a raw reply down to a single deliverable utterance. Pure string
//! work, deterministic, no I/O.

/// Terminal punctuation accepted at the end of an utterance
const SENTENCE_ENDS: [char; 3] = ['.', '!', '?'];

/// Minimum length for a leading sentence to stand on its own
const MIN_SENTENCE_CHARS: usize = 3;

/// Reduce a raw backend reply to one speakable utterance
///
/// Drops lines that echo a role label ("Assistant: ..."), keeps the first
/// sentence when it is long enough to stand alone, guarantees terminal
/// punctuation, and substitutes `fallback` when nothing usable remains.
/// Idempotent: sanitizing an already-sanitized reply is a no-op.
#[must_use]
pub fn sanitize_reply(raw: &str, fallback: &str) -> String {
    let without_labels: String = raw
        .lines()
        .filter(|line| !is_role_label_line(line))
        .collect::<Vec<_>>()
        .join(" ");

    let text = without_labels.trim();
    if text.is_empty() {
        return fallback.to_string();
    }

    let first = text
        .split(SENTENCE_ENDS)
        .next()
        .map(str::trim)
        .unwrap_or_default();

    let mut result = if first.chars().count() > MIN_SENTENCE_CHARS {
        first.to_string()
    } else {
        text.to_string()
    };

    if result.is_empty() {
        return fallback.to_string();
    }
    if !result.ends_with(SENTENCE_ENDS) {
        result.push('.');
    }

    result
}

/// True for lines shaped like an echoed role label ("User: ...")
///
/// A label is a single alphabetic word directly followed by a colon.
fn is_role_label_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let Some((head, _)) = trimmed.split_once(':') else {
        return false;
    };
    let head = head.trim_end();
    !head.is_empty() && head.chars().all(char::is_alphabetic)
}

/// Split a long utterance into sentence-sized phrases
///
/// Used to play greetings as a sequence of short utterances so synthesis
/// starts sooner. Each phrase comes back trimmed with a terminal period.
#[must_use]
pub fn split_into_phrases(text: &str) -> Vec<String> {
    text.split(SENTENCE_ENDS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "When would suit you?";

    #[test]
    fn keeps_first_sentence_and_punctuates() {
        assert_eq!(
            sanitize_reply("Great, tomorrow at three then! I will pass it on.", FALLBACK),
            "Great, tomorrow at three then."
        );
        assert_eq!(sanitize_reply("Noted, thank you", FALLBACK), "Noted, thank you.");
    }

    #[test]
    fn strips_role_label_lines() {
        let raw = "Assistant: sure thing\nSounds good, see you then!\nUser: ok";
        assert_eq!(sanitize_reply(raw, FALLBACK), "Sounds good, see you then.");
    }

    #[test]
    fn short_leading_sentence_keeps_the_rest() {
        let out = sanitize_reply("Ok! How about tomorrow?", FALLBACK);
        assert_eq!(out, "Ok! How about tomorrow?");
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(sanitize_reply("", FALLBACK), FALLBACK);
        assert_eq!(sanitize_reply("   \n  ", FALLBACK), FALLBACK);
        assert_eq!(sanitize_reply("User: something", FALLBACK), FALLBACK);
    }

    #[test]
    fn never_empty_and_always_terminated() {
        let inputs = [
            "",
            "hello",
            "hello.",
            "a",
            "Assistant: hi",
            "Multi. Sentence. Reply.",
            "10:30 works for me",
        ];
        for input in inputs {
            let out = sanitize_reply(input, FALLBACK);
            assert!(!out.is_empty(), "{input:?}");
            assert!(out.ends_with(['.', '!', '?']), "{input:?} -> {out:?}");
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "Great, tomorrow at three then! I will pass it on.",
            "Assistant: sure\nSounds good!",
            "Ok! How about tomorrow?",
            "",
            "no punctuation here",
        ];
        for input in inputs {
            let once = sanitize_reply(input, FALLBACK);
            let twice = sanitize_reply(&once, FALLBACK);
            assert_eq!(once, twice, "{input:?}");
        }
    }

    #[test]
    fn numeric_colons_are_not_role_labels() {
        let out = sanitize_reply("10:30 tomorrow works", FALLBACK);
        assert_eq!(out, "10:30 tomorrow works.");
    }

    #[test]
    fn greeting_splits_into_phrases() {
        let parts = split_into_phrases(
            "Hello! This is an assistant. When would be a good time to talk?",
        );
        assert_eq!(
            parts,
            vec![
                "Hello.".to_string(),
                "This is an assistant.".to_string(),
                "When would be a good time to talk.".to_string(),
            ]
        );
    }

    #[test]
    fn unpunctuated_greeting_is_one_phrase() {
        assert_eq!(split_into_phrases("Hello there"), vec!["Hello there.".to_string()]);
        assert!(split_into_phrases("  ").is_empty());
    }
}
