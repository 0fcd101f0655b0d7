// Built-in RichFaces / JSF / Seam fingerprint data

use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_PATTERNS: &[&str] = &[
    r"richfaces",
    r"\.seam",
    r"javax\.faces",
    r"jsf",
    r"faces/javax\.faces",
    r"\.xhtml",
    r"org\.richfaces",
    r"org\.ajax4jsf",
    r"3_3_3\.Finalorg/richfaces/",
    r"3_3_3\.Finalorg/richfaces/renderkit/html/css/basic_classes\.xcss",
    r"3_3_3\.Finalorg/richfaces/renderkit/html/css/extended_classes\.xcss",
    r"3_3_3\.Finalorg\.ajax4jsf\.javascript\.AjaxScript",
    r"RichFaces",
    r"seam/resource",
    r"javax.faces.resource",
    r"JBSEAM",
    r"Seam Application",
];

const DEFAULT_PATHS: &[&str] = &[
    "/",
    "/index.seam",
    "/index.jsf",
    "/index.faces",
    "/index.xhtml",
    "/login.seam",
    "/login.jsf",
    "/login.faces",
    "/login.xhtml",
    "/home.seam",
    "/home.jsf",
    "/home.faces",
    "/home.xhtml",
    "/main.seam",
    "/main.jsf",
    "/main.faces",
    "/main.xhtml",
    "/app/index.seam",
    "/app/login.seam",
    "/apps/login.seam",
    "/seam/resource/remoting/resource",
    "/faces/javax.faces.resource",
    "/richfaces/renderkit/html/css/basic_classes.xcss",
    "/a4j/g/3_3_3.Finalorg/richfaces/renderkit/html/css/basic_classes.xcss",
];

// "" probes the scheme's default port (80/443).
const DEFAULT_PORTS: &[&str] = &["", ":8080", ":8443", ":8181", ":8000", ":9090"];

/// Patterns, paths and port suffixes a scan runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    pub patterns: Vec<String>,
    pub paths: Vec<String>,
    pub ports: Vec<String>,
}

impl SignatureSet {
    /// Load a signature set from a JSON file shaped like the output of
    /// `to_json_pretty`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let set: SignatureSet = serde_json::from_str(content)?;
        set.validate()?;
        Ok(set)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.patterns.is_empty() {
            return Err(ScanError::InvalidConfig(
                "signature set has no patterns".to_string(),
            ));
        }
        if self.paths.is_empty() {
            return Err(ScanError::InvalidConfig(
                "signature set has no paths".to_string(),
            ));
        }
        if self.ports.is_empty() {
            return Err(ScanError::InvalidConfig(
                "signature set has no port suffixes (use \"\" for the default port)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SignatureSet {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            patterns: owned(DEFAULT_PATTERNS),
            paths: owned(DEFAULT_PATHS),
            ports: owned(DEFAULT_PORTS),
        }
    }
}
