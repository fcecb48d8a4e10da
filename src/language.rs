//! Languages spoken on a call and a lightweight text-based detector.
//!
//! Detection is a character-set / word-list lookup: Devanagari script or a
//! romanised Hindi word means Hindi, a high share of common English function
//! words means English.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language the translator speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    Hindi,
    English,
}

impl Language {
    /// ISO 639-1 code used by the translation API
    pub fn code(&self) -> &'static str {
        match self {
            Language::Hindi => "hi",
            Language::English => "en",
        }
    }

    /// BCP-47 locale used by speech recognition, TTS and `<Say>`
    pub fn locale(&self) -> &'static str {
        match self {
            Language::Hindi => "hi-IN",
            Language::English => "en-US",
        }
    }

    /// Default synthesis voice
    pub fn voice(&self) -> &'static str {
        match self {
            Language::Hindi => "hi-IN-Standard-A",
            Language::English => "en-US-Standard-A",
        }
    }

    pub fn other(&self) -> Language {
        match self {
            Language::Hindi => Language::English,
            Language::English => Language::Hindi,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hi" | "hi-in" | "hindi" => Ok(Language::Hindi),
            "en" | "en-us" | "en-in" | "en-gb" | "english" => Ok(Language::English),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.code().to_string()
    }
}

/// Romanised Hindi words that show up in English-script transcripts
const ROMANISED_HINDI: &[&str] = &[
    "namaste", "namaskar", "kaise", "kaisa", "aap", "aapka", "theek", "thik", "hun", "hoon",
    "kya", "haan", "nahi", "nahin", "dhanyawad", "dhanyavaad", "shukriya", "alvida", "kahan",
    "ghar", "raha", "rahi", "mujhe", "tum", "hai", "hain", "ho", "accha", "achha", "bahut",
    "pranam",
];

/// Common English function words
const ENGLISH_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is", "are",
    "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "can", "this", "that", "these", "those", "i", "you",
    "he", "she", "it", "we", "they", "hello", "hi", "how", "what", "please", "thank",
];

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
}

/// Script and word-list language detector
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    /// Below this recognition confidence no decision is made
    pub confidence_threshold: f32,
    /// Share of English function words required to call a transcript English
    pub english_ratio: f32,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            english_ratio: 0.3,
        }
    }
}

impl LanguageDetector {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            ..Self::default()
        }
    }

    /// Always decides; anything not recognisably Hindi is English
    pub fn detect(&self, text: &str) -> Language {
        if text.chars().any(is_devanagari) {
            return Language::Hindi;
        }

        if words(text).any(|w| ROMANISED_HINDI.contains(&w.as_str())) {
            return Language::Hindi;
        }

        Language::English
    }

    /// Decides only when the transcript is confident and clearly marked
    pub fn detect_with_confidence(&self, text: &str, confidence: f32) -> Option<Language> {
        if confidence < self.confidence_threshold {
            return None;
        }

        if text.chars().any(is_devanagari) {
            return Some(Language::Hindi);
        }

        let all: Vec<String> = words(text).collect();
        if all.is_empty() {
            return None;
        }

        let english = all
            .iter()
            .filter(|w| ENGLISH_WORDS.contains(&w.as_str()))
            .count();

        if english as f32 > all.len() as f32 * self.english_ratio {
            Some(Language::English)
        } else {
            None
        }
    }
}
