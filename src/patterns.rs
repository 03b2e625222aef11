//! Language-keyed pattern tables for the rule engine.
//!
//! Three ordered rule categories, all static and read-only after first use:
//! incomplete-ending tokens (a trailing period after these is stripped),
//! proper-noun merge rules (undo `Himachal. Pradesh` style splits), and
//! phrase merge rules (undo `thank. You` style splits). Adding a language
//! means adding a table entry here; the engine control flow never changes.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// A compiled two-token merge rule.
///
/// Matches `first. second` (any casing on either token, any whitespace after
/// the stray period) and rejoins the pair, keeping the first token exactly as
/// written and canonicalizing the second.
pub struct MergeRule {
    pattern: Regex,
    replacement: String,
}

impl MergeRule {
    fn new(first: &str, second: &str) -> Self {
        let pattern = RegexBuilder::new(&format!(
            r"\b({})\.\s+{}\b",
            regex::escape(first),
            regex::escape(second)
        ))
        .case_insensitive(true)
        .build()
        .expect("merge rule patterns are static and must compile");
        Self {
            pattern,
            replacement: format!("$1 {second}"),
        }
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Rule tables for one language.
pub struct LanguageRules {
    /// Tokens after which a trailing period must never stand, on top of the
    /// universal list. Lowercase.
    pub incomplete_endings: &'static [&'static str],
    pub proper_noun_merges: Vec<MergeRule>,
    pub phrase_merges: Vec<MergeRule>,
}

/// Conjunctions, prepositions, articles, pronouns, auxiliaries and question
/// words that never legitimately end a sentence in these captions. Applied
/// for every language before the language-specific list.
pub static UNIVERSAL_INCOMPLETE_ENDINGS: &[&str] = &[
    "and", "but", "or", "so", "because", "the", "a", "an", "to", "of", "in", "on", "at", "with",
    "for", "from", "by", "about", "as", "if", "that", "this", "these", "those", "my", "your",
    "his", "her", "its", "our", "their", "what", "when", "where", "which", "who", "whose", "how",
    "why", "i", "you", "he", "she", "it", "we", "they", "am", "is", "are", "was", "were", "will",
    "would", "can", "could", "shall", "should", "may", "might", "must", "have", "has", "had",
    "do", "does", "did", "not", "no", "very", "really", "quite", "than", "then",
];

static ENGLISH_INCOMPLETE_ENDINGS: &[&str] = &[
    "gonna", "wanna", "gotta", "kinda", "sorta", "lemme", "being", "been", "till", "until",
    "while", "though", "although", "unless", "since", "also", "just", "still", "even",
];

static HINDI_INCOMPLETE_ENDINGS: &[&str] = &[
    // Romanized
    "aur", "lekin", "magar", "ki", "ka", "ke", "ko", "se", "mein", "par", "hai", "hain", "tha",
    "thi", "the", "mera", "meri", "kya", "kab", "kahan", "kaun", "kaise", "kyun", "bhi", "toh",
    // Devanagari
    "और", "लेकिन", "का", "की", "के", "को", "से", "में", "पर", "है", "हैं", "था", "थी", "क्या",
    "कब", "कहाँ", "कौन", "कैसे", "क्यों", "भी", "तो",
];

fn english_rules() -> LanguageRules {
    LanguageRules {
        incomplete_endings: ENGLISH_INCOMPLETE_ENDINGS,
        proper_noun_merges: vec![
            MergeRule::new("Himachal", "Pradesh"),
            MergeRule::new("Arunachal", "Pradesh"),
            MergeRule::new("Andhra", "Pradesh"),
            MergeRule::new("Madhya", "Pradesh"),
            MergeRule::new("Uttar", "Pradesh"),
            MergeRule::new("Tamil", "Nadu"),
            MergeRule::new("West", "Bengal"),
            MergeRule::new("New", "Delhi"),
            MergeRule::new("Navi", "Mumbai"),
            MergeRule::new("Sri", "Lanka"),
            MergeRule::new("Saudi", "Arabia"),
            MergeRule::new("New", "York"),
            MergeRule::new("United", "States"),
            MergeRule::new("Los", "Angeles"),
            MergeRule::new("Shri", "Ram"),
            MergeRule::new("Hare", "Krishna"),
            MergeRule::new("Guru", "Nanak"),
            MergeRule::new("Om", "Shanti"),
        ],
        phrase_merges: vec![
            MergeRule::new("thank", "you"),
            MergeRule::new("of", "course"),
            MergeRule::new("a", "lot"),
            MergeRule::new("at", "least"),
            MergeRule::new("in", "fact"),
            MergeRule::new("as", "well"),
            MergeRule::new("right", "now"),
            MergeRule::new("come", "on"),
            MergeRule::new("excuse", "me"),
            MergeRule::new("good", "morning"),
            MergeRule::new("good", "night"),
        ],
    }
}

fn hindi_rules() -> LanguageRules {
    LanguageRules {
        incomplete_endings: HINDI_INCOMPLETE_ENDINGS,
        proper_noun_merges: vec![
            MergeRule::new("Himachal", "Pradesh"),
            MergeRule::new("Uttar", "Pradesh"),
            MergeRule::new("Madhya", "Pradesh"),
            MergeRule::new("Tamil", "Nadu"),
            MergeRule::new("हिमाचल", "प्रदेश"),
            MergeRule::new("उत्तर", "प्रदेश"),
            MergeRule::new("मध्य", "प्रदेश"),
            MergeRule::new("नई", "दिल्ली"),
            MergeRule::new("श्री", "राम"),
        ],
        phrase_merges: vec![
            MergeRule::new("jai", "hind"),
            MergeRule::new("bahut", "achha"),
            MergeRule::new("theek", "hai"),
            MergeRule::new("धन्यवाद", "जी"),
            MergeRule::new("ठीक", "है"),
        ],
    }
}

static RULES: Lazy<HashMap<&'static str, LanguageRules>> = Lazy::new(|| {
    let mut rules = HashMap::new();
    rules.insert("en", english_rules());
    rules.insert("hi", hindi_rules());
    rules
});

pub const FALLBACK_LANGUAGE: &str = "en";

/// Look up the rule tables for a language tag, falling back to English for
/// anything unrecognized. Accepts full BCP 47 tags ("en-US", "hi-IN"); only
/// the primary subtag is significant.
pub fn rules_for(language: &str) -> &'static LanguageRules {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or(FALLBACK_LANGUAGE)
        .to_lowercase();
    RULES
        .get(primary.as_str())
        .unwrap_or_else(|| &RULES[FALLBACK_LANGUAGE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let rules = rules_for("zz");
        assert!(std::ptr::eq(rules, rules_for("en")));
    }

    #[test]
    fn test_full_tag_resolves_primary_subtag() {
        assert!(std::ptr::eq(rules_for("hi-IN"), rules_for("hi")));
        assert!(std::ptr::eq(rules_for("en_US"), rules_for("en")));
        assert!(std::ptr::eq(rules_for("EN"), rules_for("en")));
    }

    #[test]
    fn test_merge_rule_preserves_first_token_casing() {
        let rule = MergeRule::new("Himachal", "Pradesh");
        assert_eq!(
            rule.apply("I am from Himachal. Pradesh"),
            "I am from Himachal Pradesh"
        );
        assert_eq!(
            rule.apply("from himachal.  pradesh today"),
            "from himachal Pradesh today"
        );
    }

    #[test]
    fn test_merge_rule_leaves_unsplit_text_alone() {
        let rule = MergeRule::new("thank", "you");
        assert_eq!(rule.apply("thank you very much"), "thank you very much");
        assert_eq!(rule.apply("I thank. You all"), "I thank you all");
    }

    #[test]
    fn test_universal_endings_cover_common_fragments() {
        for token in ["and", "am", "the", "to", "what"] {
            assert!(UNIVERSAL_INCOMPLETE_ENDINGS.contains(&token));
        }
    }

    #[test]
    fn test_hindi_table_present() {
        let rules = rules_for("hi");
        assert!(rules.incomplete_endings.contains(&"aur"));
        assert!(!rules.proper_noun_merges.is_empty());
    }
}
