//! Deterministic post-processing of correction candidates.
//!
//! A strictly ordered sequence of pure text-rewrite passes applied to
//! whatever the remote model returns. Passes only touch punctuation,
//! whitespace and casing; the final validation pass discards any candidate
//! whose wording drifted from the source fragment.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::patterns::{LanguageRules, UNIVERSAL_INCOMPLETE_ENDINGS};

static LONG_ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").unwrap());
static TERMINAL_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([?!])[?!]+").unwrap());
static THE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([Tt]he)\.\s+(\p{Lu})").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.,!?;:])").unwrap());
static MISSING_SPACE_AFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.,!?;:])([^\s.,!?;:'0-9])").unwrap());
static SPACE_BEFORE_APOSTROPHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+'").unwrap());

/// Collapse runaway punctuation: `???` and `!!!` become a single mark, runs
/// of four or more periods become an ellipsis of exactly three, and a mixed
/// `?!` run collapses to its first character.
pub fn collapse_repeated_punctuation(text: &str) -> String {
    let text = LONG_ELLIPSIS.replace_all(text, "...");
    TERMINAL_RUN.replace_all(&text, "$1").into_owned()
}

/// Strip a trailing period when the fragment ends on a token that cannot
/// close a sentence (conjunction, preposition, article, auxiliary, question
/// word). The token itself is preserved verbatim.
pub fn strip_incomplete_ending(text: &str, rules: &LanguageRules) -> String {
    let trimmed = text.trim_end();
    let Some(stripped) = trimmed.strip_suffix('.') else {
        return text.to_string();
    };
    // An intentional ellipsis is not a sentence terminator.
    if stripped.ends_with('.') {
        return text.to_string();
    }

    let last_word = stripped
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .to_lowercase();

    if UNIVERSAL_INCOMPLETE_ENDINGS.contains(&last_word.as_str())
        || rules.incomplete_endings.contains(&last_word.as_str())
    {
        debug!("Stripped trailing period after incomplete ending '{}'", last_word);
        stripped.to_string()
    } else {
        text.to_string()
    }
}

/// Undo proper-noun splits like `Himachal. Pradesh`.
pub fn repair_proper_nouns(text: &str, rules: &LanguageRules) -> String {
    rules
        .proper_noun_merges
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

/// Undo phrase splits like `thank. You`.
pub fn repair_phrases(text: &str, rules: &LanguageRules) -> String {
    rules
        .phrase_merges
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

/// Capitalize the first character and re-merge the `the. Next` shape the
/// earlier passes can leave behind inside what is actually one phrase.
pub fn fix_capitalization(text: &str) -> String {
    let merged = THE_SPLIT.replace_all(text, |caps: &Captures| {
        format!("{} {}", &caps[1], caps[2].to_lowercase())
    });

    let mut chars = merged.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Normalize whitespace around punctuation.
pub fn normalize_spacing(text: &str) -> String {
    let text = MULTI_SPACE.replace_all(text, " ");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    let text = MISSING_SPACE_AFTER.replace_all(&text, "$1 $2");
    let text = SPACE_BEFORE_APOSTROPHE.replace_all(&text, "'");
    text.trim().to_string()
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A candidate is acceptable only if its word count stays within
/// `max_word_drift` of the original fragment and it is not empty.
/// Correctness of wording dominates over punctuation quality.
pub fn validate_against_source(candidate: &str, original: &str, max_word_drift: usize) -> bool {
    let candidate_words = word_count(candidate);
    if candidate_words == 0 {
        return false;
    }
    let original_words = word_count(original);
    candidate_words.abs_diff(original_words) <= max_word_drift
}

/// Run the full pass pipeline over a correction candidate.
///
/// Returns the cleaned candidate, or `original` unchanged when the candidate
/// fails validation.
pub fn post_process(
    candidate: &str,
    original: &str,
    rules: &LanguageRules,
    max_word_drift: usize,
) -> String {
    let mut text = collapse_repeated_punctuation(candidate.trim());
    text = strip_incomplete_ending(&text, rules);
    text = repair_proper_nouns(&text, rules);
    text = repair_phrases(&text, rules);
    text = fix_capitalization(&text);
    text = normalize_spacing(&text);

    if validate_against_source(&text, original, max_word_drift) {
        text
    } else {
        debug!(
            "Discarding candidate with word drift ({} -> {} words)",
            word_count(original),
            word_count(&text)
        );
        original.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::rules_for;

    const DRIFT: usize = 2;

    #[test]
    fn test_collapse_repeated_question_marks() {
        assert_eq!(collapse_repeated_punctuation("Really???"), "Really?");
    }

    #[test]
    fn test_collapse_repeated_exclamation_marks() {
        assert_eq!(collapse_repeated_punctuation("Wow!!!"), "Wow!");
    }

    #[test]
    fn test_collapse_mixed_run_keeps_first_mark() {
        assert_eq!(collapse_repeated_punctuation("What?!?!"), "What?");
        assert_eq!(collapse_repeated_punctuation("No!?"), "No!");
    }

    #[test]
    fn test_collapse_long_period_run_to_ellipsis() {
        assert_eq!(collapse_repeated_punctuation("wait......"), "wait...");
        // A three-period ellipsis is already canonical.
        assert_eq!(collapse_repeated_punctuation("wait..."), "wait...");
    }

    #[test]
    fn test_strip_period_after_conjunction() {
        let rules = rules_for("en");
        assert_eq!(
            strip_incomplete_ending("My name is Aman Sharma, and I am.", rules),
            "My name is Aman Sharma, and I am"
        );
    }

    #[test]
    fn test_strip_period_after_article() {
        let rules = rules_for("en");
        assert_eq!(strip_incomplete_ending("I went to the.", rules), "I went to the");
    }

    #[test]
    fn test_complete_sentence_keeps_period() {
        let rules = rules_for("en");
        assert_eq!(
            strip_incomplete_ending("I live in my house.", rules),
            "I live in my house."
        );
    }

    #[test]
    fn test_strip_leaves_ellipsis_alone() {
        let rules = rules_for("en");
        assert_eq!(strip_incomplete_ending("and then...", rules), "and then...");
    }

    #[test]
    fn test_strip_leaves_questions_alone() {
        let rules = rules_for("en");
        assert_eq!(strip_incomplete_ending("where are you?", rules), "where are you?");
    }

    #[test]
    fn test_repair_split_proper_noun() {
        let rules = rules_for("en");
        assert_eq!(
            repair_proper_nouns("I am from Himachal. Pradesh", rules),
            "I am from Himachal Pradesh"
        );
    }

    #[test]
    fn test_repair_split_phrase() {
        let rules = rules_for("en");
        assert_eq!(repair_phrases("thank. You everyone", rules), "thank you everyone");
    }

    #[test]
    fn test_fix_capitalization_first_char() {
        assert_eq!(fix_capitalization("hello there"), "Hello there");
    }

    #[test]
    fn test_fix_capitalization_merges_the_split() {
        assert_eq!(fix_capitalization("we went to the. Market"), "We went to the market");
    }

    #[test]
    fn test_normalize_spacing() {
        assert_eq!(normalize_spacing("hello  world !"), "hello world!");
        assert_eq!(normalize_spacing("yes,we did"), "yes, we did");
        assert_eq!(normalize_spacing("don 't"), "don't");
    }

    #[test]
    fn test_validation_rejects_drift() {
        assert!(!validate_against_source("just one", "one two three four five six", DRIFT));
        assert!(!validate_against_source("", "one two", DRIFT));
        assert!(validate_against_source("one two three", "one two three", DRIFT));
    }

    #[test]
    fn test_post_process_strips_period_after_dangling_conjunction() {
        let rules = rules_for("en");
        let result = post_process(
            "My name is Aman Sharma, and I am.",
            "my name is aman sharma and i am",
            rules,
            DRIFT,
        );
        assert_eq!(result, "My name is Aman Sharma, and I am");
    }

    #[test]
    fn test_post_process_accepts_complete_sentence() {
        let rules = rules_for("en");
        let result = post_process("I live in my house.", "i live in my house", rules, DRIFT);
        assert_eq!(result, "I live in my house.");
    }

    #[test]
    fn test_post_process_discards_truncated_candidate() {
        let rules = rules_for("en");
        let original = "my name is aman sharma and i am";
        let result = post_process("My name.", original, rules, DRIFT);
        assert_eq!(result, original);
    }

    #[test]
    fn test_post_process_is_deterministic_and_converges() {
        let rules = rules_for("en");
        let candidate = "so I was telling him about the. Himachal. Pradesh trip!!!";
        let original = "so i was telling him about the himachal pradesh trip";
        let once = post_process(candidate, original, rules, DRIFT);
        let twice = post_process(&once, original, rules, DRIFT);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_passes_are_total_on_empty_input() {
        let rules = rules_for("en");
        assert_eq!(collapse_repeated_punctuation(""), "");
        assert_eq!(strip_incomplete_ending("", rules), "");
        assert_eq!(fix_capitalization(""), "");
        assert_eq!(normalize_spacing(""), "");
    }
}
