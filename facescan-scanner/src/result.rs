use serde::{Deserialize, Serialize};
use std::fmt;

/// A confirmed signature match on one probe URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub url: String,
    pub status_code: u16,
    pub pattern: String,
}

impl Finding {
    pub fn new(url: String, status_code: u16, pattern: String) -> Self {
        Self {
            url,
            status_code,
            pattern,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [Status: {}] [Padrão: {}]",
            self.url, self.status_code, self.pattern
        )
    }
}
