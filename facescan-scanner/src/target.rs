use crate::error::{Result, ScanError};
use std::fmt;

/// A normalized base origin (scheme + authority) read from the host list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host(String);

impl Host {
    /// Normalize one raw input line.
    ///
    /// The line is trimmed and blank lines yield `None`. Anything that does
    /// not already start with `http` gets an `http://` prefix; no further
    /// validation happens here, an unreachable host simply produces no
    /// findings.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with("http") {
            Some(Self(trimmed.to_string()))
        } else {
            Some(Self(format!("http://{}", trimmed)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds every probe URL for a host from the configured port suffixes and
/// paths.
#[derive(Debug, Clone)]
pub struct TargetExpander {
    ports: Vec<String>,
    paths: Vec<String>,
}

impl TargetExpander {
    pub fn new(ports: Vec<String>, paths: Vec<String>) -> Result<Self> {
        if ports.is_empty() {
            return Err(ScanError::InvalidConfig(
                "port suffix list must not be empty".to_string(),
            ));
        }
        if paths.is_empty() {
            return Err(ScanError::InvalidConfig(
                "path list must not be empty".to_string(),
            ));
        }

        Ok(Self { ports, paths })
    }

    /// Port-major, path-minor: all paths for `ports[0]`, then all paths for
    /// `ports[1]`, and so on.
    pub fn expand(&self, host: &Host) -> Vec<String> {
        let mut urls = Vec::with_capacity(self.probes_per_host());
        for port in &self.ports {
            for path in &self.paths {
                urls.push(format!("{}{}{}", host.as_str(), port, path));
            }
        }
        urls
    }

    pub fn probes_per_host(&self) -> usize {
        self.ports.len() * self.paths.len()
    }
}
