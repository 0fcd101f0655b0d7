use crate::error::{Result, ScanError};
use regex::Regex;

/// A compiled signature together with the source text it was built from.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|e| ScanError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        })?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Ordered list of signatures; the first one that matches wins.
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    patterns: Vec<Pattern>,
}

impl SignatureMatcher {
    /// Compile every pattern up front. Any malformed pattern fails the whole
    /// set so a bad configuration is caught before scanning starts.
    pub fn new<S: AsRef<str>>(sources: &[S]) -> Result<Self> {
        if sources.is_empty() {
            return Err(ScanError::InvalidConfig(
                "pattern list must not be empty".to_string(),
            ));
        }

        let patterns = sources
            .iter()
            .map(|source| Pattern::new(source.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Returns the earliest configured pattern matching `body`, if any.
    pub fn find_match(&self, body: &[u8]) -> Option<&Pattern> {
        let text = String::from_utf8_lossy(body);
        self.patterns.iter().find(|pattern| pattern.is_match(&text))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
