//! Cleanup and validation of raw backend output.
//!
//! Generative backends have two known failure modes this module defends
//! against with string heuristics: prefacing the story with meta-commentary,
//! and degenerating into repetition loops. Best effort only, false positives
//! and negatives are expected.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Uniqueness ratio under which a story counts as degenerate. Untuned
/// heuristic, kept overridable through [`Limits`].
pub const UNIQUE_SENTENCE_RATIO: f64 = 0.7;

/// Sentence count a story must exceed before repetition detection runs.
pub const REPETITION_MIN_SENTENCES: usize = 10;

/// Minimum cleaned story length in characters.
pub const MIN_STORY_CHARS: usize = 100;

/// Why a response was rejected instead of cleaned.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooShort,
    Repetitive,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Rejection::Empty => "empty response from the backend",
            Rejection::TooShort => "story too short, try again",
            Rejection::Repetitive => "repetitive content detected, regenerate",
        })
    }
}

impl std::error::Error for Rejection {}

/// Tunable validation thresholds, defaulting to the module constants.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    pub min_chars: usize,
    pub min_sentences: usize,
    pub unique_ratio: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_chars: MIN_STORY_CHARS,
            min_sentences: REPETITION_MIN_SENTENCES,
            unique_ratio: UNIQUE_SENTENCE_RATIO,
        }
    }
}

static PREAMBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(here's|here is|this is)[^\n]*?story[^\n]*?:").unwrap());
static STORY_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^story:").unwrap());
static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\d+\..*\n").unwrap());
static BULLET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\*.*\n").unwrap());
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static SENTENCE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\s*)([a-z])").unwrap());

pub fn sanitize(raw: &str) -> Result<String, Rejection> {
    sanitize_with(raw, &Limits::default())
}

/// Applies the cleanup sequence in order: strip a leading meta preamble,
/// strip list artifacts, collapse blank runs, trim, then validate length and
/// repetition. Idempotent on its own Ok output.
pub fn sanitize_with(raw: &str, limits: &Limits) -> Result<String, Rejection> {
    if raw.is_empty() {
        return Err(Rejection::Empty);
    }

    let text = PREAMBLE.replace(raw, "");
    let text = STORY_LABEL.replace(&text, "");
    let text = NUMBERED_LINE.replace_all(&text, "");
    let text = BULLET_LINE.replace_all(&text, "");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");

    let text = text.trim();

    if text.chars().count() < limits.min_chars {
        return Err(Rejection::TooShort);
    }

    if is_repetitive(text, limits) {
        return Err(Rejection::Repetitive);
    }

    Ok(text.to_string())
}

fn is_repetitive(text: &str, limits: &Limits) -> bool {
    let sentences: Vec<&str> = text.split('.').collect();

    if sentences.len() <= limits.min_sentences {
        return false;
    }

    let unique: HashSet<String> = sentences
        .iter()
        .filter(|sentence| !sentence.trim().is_empty())
        .map(|sentence| sentence.trim().to_lowercase())
        .collect();

    (unique.len() as f64) < (sentences.len() as f64) * limits.unique_ratio
}

/// Uppercases the first letter after each sentence terminator, for backends
/// that drop capitals on continuations. The first letter of the string is
/// left alone.
pub fn repair_capitalization(text: &str) -> String {
    SENTENCE_START
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!(".{}{}", &caps[1], caps[2].to_uppercase())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(len: usize) -> String {
        "The lighthouse keeper watched the horizon and wrote down everything "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(sanitize(""), Err(Rejection::Empty));
    }

    #[test]
    fn short_input_is_rejected() {
        assert_eq!(sanitize("short"), Err(Rejection::TooShort));
    }

    #[test]
    fn preamble_is_stripped_from_the_first_line() {
        let raw = format!("Here's a story: Once upon a time... {}", filler(120));
        let clean = sanitize(&raw).unwrap();

        assert!(!clean.starts_with("Here's a story:"));
        assert!(clean.starts_with("Once upon a time..."));
    }

    #[test]
    fn story_label_is_stripped() {
        let raw = format!("Story: Once upon a time {}", filler(120));
        let clean = sanitize(&raw).unwrap();

        assert!(clean.starts_with("Once upon a time"));
    }

    #[test]
    fn list_artifacts_are_stripped() {
        let raw = format!(
            "1. an outline item\n* a bullet\nOnce upon a time {}",
            filler(120)
        );
        let clean = sanitize(&raw).unwrap();

        assert!(clean.starts_with("Once upon a time"));
        assert!(!clean.contains("an outline item"));
        assert!(!clean.contains("a bullet"));
    }

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        let raw = format!("{}\n\n\n\n{}", filler(80), filler(80));
        let clean = sanitize(&raw).unwrap();

        assert!(clean.contains("\n\n"));
        assert!(!clean.contains("\n\n\n"));
    }

    #[test]
    fn duplicate_sentences_are_rejected() {
        // 12 sentences, 6 of them the same one.
        let mut raw = String::new();
        for _ in 0..6 {
            raw.push_str("The fog rolled in over the bay. ");
        }
        for index in 0..6 {
            raw.push_str(&format!("Chapter {index} began with a different line. "));
        }

        assert_eq!(sanitize(&raw), Err(Rejection::Repetitive));
    }

    #[test]
    fn unique_sentences_pass_the_repetition_check() {
        let mut raw = String::new();
        for index in 0..12 {
            raw.push_str(&format!(
                "Sentence number {index} tells its own part of the tale. "
            ));
        }

        assert!(sanitize(&raw).is_ok());
    }

    #[test]
    fn sanitize_is_idempotent_on_its_own_output() {
        let raw = format!("Here is my story:\n\n\n{}. {}", filler(90), filler(90));
        let once = sanitize(&raw).unwrap();
        let twice = sanitize(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn repair_uppercases_after_sentence_breaks_only() {
        assert_eq!(
            repair_capitalization("he ran fast. he jumped high."),
            "he ran fast. He jumped high."
        );
    }

    #[test]
    fn repair_handles_missing_whitespace() {
        assert_eq!(repair_capitalization("it ended.quietly"), "it ended.Quietly");
    }

    #[test]
    fn repair_leaves_clean_text_alone() {
        assert_eq!(
            repair_capitalization("It rained. The river rose."),
            "It rained. The river rose."
        );
    }
}
