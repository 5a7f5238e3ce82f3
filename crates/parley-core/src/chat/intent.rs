//! Intent classification for turns that bypass the model.
//!
//! `PatternIntentClassifier` matches the message against a table of
//! case-insensitive regexes, one row per intent and language.

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// "Who made you?" and its variants.
    AuthorQuestion,
}

pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Option<Intent>;
}

#[derive(Debug, Clone)]
pub struct IntentPattern {
    pub intent: Intent,
    pub language: String,
    regex: Regex,
}

impl IntentPattern {
    pub fn new(intent: Intent, language: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            intent,
            language: language.to_string(),
            regex: Regex::new(&format!("(?i){pattern}"))?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

const FRENCH_AUTHOR_PATTERNS: &[&str] = &[
    r"qui\s+(t'?a|vous\s+a|a\s+créé|a\s+fait|a\s+conçu|est\s+l[ae]\s+créateur(?:rice)?)",
    r"t'?es\s+fait",
    r"par\s+qui\s+(t'?es|vous\s+êtes)",
    r"créé\s+par\s+qui",
    r"qui\s+est\s+(l[ae]\s+créateur(?:rice)?|l'auteur)",
];

const ENGLISH_AUTHOR_PATTERNS: &[&str] = &[
    r"\bwho\s+(made|created|built|designed|developed|programmed)\s+(you|this\s+app)\b",
    r"\bwho\s+(is|are)\s+your\s+(creator|author|developer|maker)s?\b",
    r"\bwho\s+are\s+you\s+(made|created|built)\s+by\b",
];

#[derive(Debug, Clone, Default)]
pub struct PatternIntentClassifier {
    patterns: Vec<IntentPattern>,
}

impl PatternIntentClassifier {
    /// An empty classifier that matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in French and English author-question table.
    pub fn with_defaults() -> Result<Self, regex::Error> {
        let mut classifier = Self::new();
        for pattern in FRENCH_AUTHOR_PATTERNS {
            classifier.add_pattern(Intent::AuthorQuestion, "fr", pattern)?;
        }
        for pattern in ENGLISH_AUTHOR_PATTERNS {
            classifier.add_pattern(Intent::AuthorQuestion, "en", pattern)?;
        }
        Ok(classifier)
    }

    pub fn add_pattern(
        &mut self,
        intent: Intent,
        language: &str,
        pattern: &str,
    ) -> Result<(), regex::Error> {
        self.patterns.push(IntentPattern::new(intent, language, pattern)?);
        Ok(())
    }

    pub fn patterns(&self) -> &[IntentPattern] {
        &self.patterns
    }
}

impl IntentClassifier for PatternIntentClassifier {
    fn classify(&self, text: &str) -> Option<Intent> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .find(|p| p.is_match(text))
            .map(|p| p.intent)
    }
}
