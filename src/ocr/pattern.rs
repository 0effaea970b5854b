//! Text patterns accepted by `Ocr::find` and `Ocr::expect`

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{VisionError, VisionResult};

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

const FUZZY_SIMILARITY: f64 = 0.9;

/// How recognized text is compared against what the caller looks for
#[derive(Clone)]
pub enum TextPattern {
    /// Whole-string equality
    Exact(String),
    /// Regex that must match starting at the first character
    Regex(Regex),
    /// Named caller-supplied test
    Predicate(String, Predicate),
}

impl TextPattern {
    /// Compile `pattern` into a regex pattern
    pub fn regex(pattern: &str) -> VisionResult<Self> {
        Regex::new(pattern)
            .map(TextPattern::Regex)
            .map_err(|e| VisionError::invalid_input(format!("invalid text pattern {pattern:?}: {e}")))
    }

    /// Text containing `needle` anywhere
    pub fn contains(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        let name = format!("contains({needle:?})");
        TextPattern::Predicate(name, Arc::new(move |text: &str| text.contains(needle.as_str())))
    }

    /// Text within a small edit distance of `expected`
    ///
    /// Matches when the normalized Levenshtein similarity exceeds 0.9, which
    /// tolerates one misread character in about ten.
    pub fn fuzzy(expected: impl Into<String>) -> Self {
        let expected = expected.into();
        let name = format!("fuzzy({expected:?})");
        TextPattern::Predicate(
            name,
            Arc::new(move |text: &str| strsim::normalized_levenshtein(text, &expected) > FUZZY_SIMILARITY),
        )
    }

    pub fn predicate(
        name: impl Into<String>,
        test: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        TextPattern::Predicate(name.into(), Arc::new(test))
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            TextPattern::Exact(expected) => text == expected,
            // Only the leftmost match can start at 0
            TextPattern::Regex(re) => re.find(text).is_some_and(|m| m.start() == 0),
            TextPattern::Predicate(_, test) => test(text),
        }
    }
}

impl fmt::Display for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextPattern::Exact(text) => f.write_str(text),
            TextPattern::Regex(re) => write!(f, "/{}/", re.as_str()),
            TextPattern::Predicate(name, _) => f.write_str(name),
        }
    }
}

impl fmt::Debug for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextPattern::Exact(text) => f.debug_tuple("Exact").field(text).finish(),
            TextPattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            TextPattern::Predicate(name, _) => f.debug_tuple("Predicate").field(name).finish(),
        }
    }
}

impl From<&str> for TextPattern {
    fn from(text: &str) -> Self {
        TextPattern::Exact(text.to_string())
    }
}

impl From<String> for TextPattern {
    fn from(text: String) -> Self {
        TextPattern::Exact(text)
    }
}

impl From<Regex> for TextPattern {
    fn from(re: Regex) -> Self {
        TextPattern::Regex(re)
    }
}

impl From<&TextPattern> for TextPattern {
    fn from(pattern: &TextPattern) -> Self {
        pattern.clone()
    }
}
