use regex::Regex;

use crate::error::{ModerationError, ModerationResult};

/// Obfuscation-tolerant denylist matcher.
///
/// Each base term compiles to one case-insensitive pattern that accepts the
/// term's letters separated by any run of non-word/underscore characters:
/// `b.a d_w'o-r"d` still matches `badword`. Both ends are word-bounded, so
/// a term embedded inside a longer word (`scunthorpe`-style) does not
/// match.
pub struct DenylistMatcher {
    patterns: Vec<(String, Regex)>,
}

impl DenylistMatcher {
    /// Compile matchers for every term. Terms with no alphanumeric
    /// characters are rejected — they would match everything or nothing.
    pub fn build<S: AsRef<str>>(terms: &[S]) -> ModerationResult<Self> {
        let mut patterns = Vec::with_capacity(terms.len());
        for term in terms {
            let term = term.as_ref();
            let letters: Vec<char> = term
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect();
            if letters.is_empty() {
                return Err(ModerationError::InvalidTerm {
                    term: term.to_string(),
                    reason: "no alphanumeric characters".to_string(),
                });
            }
            let body = letters
                .iter()
                .map(|c| regex::escape(&c.to_string()))
                .collect::<Vec<_>>()
                .join(r"[\W_]*");
            let source = format!(r"(?i)\b{body}\b");
            let regex = Regex::new(&source).map_err(|e| ModerationError::InvalidTerm {
                term: term.to_string(),
                reason: e.to_string(),
            })?;
            patterns.push((term.to_string(), regex));
        }
        Ok(Self { patterns })
    }

    /// The first denylisted term that `text` matches, if any.
    pub fn find_match(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(term, _)| term.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl std::fmt::Debug for DenylistMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenylistMatcher")
            .field("term_count", &self.patterns.len())
            .finish()
    }
}
