//! Removal of reasoning traces from generated text

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Delimiters around a model's internal reasoning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningMarkers {
    pub open: String,
    pub close: String,
}

impl Default for ReasoningMarkers {
    fn default() -> Self {
        Self {
            open: "<think>".to_string(),
            close: "</think>".to_string(),
        }
    }
}

impl ReasoningMarkers {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.open.is_empty() || self.close.is_empty() {
            return Err(Error::invalid_config("Reasoning markers must not be empty"));
        }
        if self.open == self.close {
            return Err(Error::invalid_config(
                "Reasoning open and close markers must differ",
            ));
        }
        Ok(())
    }
}

/// Strips every `open ... close` span from generated text.
///
/// An open marker with no close marker after it removes everything to the
/// end of the text. Close markers with no opener are kept.
#[derive(Debug, Clone)]
pub struct ResponseCleaner {
    pattern: Regex,
}

impl ResponseCleaner {
    pub fn new(markers: &ReasoningMarkers) -> Result<Self> {
        markers.validate()?;
        let pattern = format!(
            r"(?s){}.*?(?:{}|\z)",
            regex::escape(&markers.open),
            regex::escape(&markers.close)
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| Error::invalid_config(format!("Bad reasoning markers: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Remove reasoning spans and trim. Repeats until nothing changes, so
    /// spans formed by joining the leftovers are removed too.
    pub fn clean(&self, raw: &str) -> String {
        let mut current = raw.trim().to_string();
        loop {
            let next = self.pattern.replace_all(&current, "").trim().to_string();
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

impl Default for ResponseCleaner {
    fn default() -> Self {
        Self::new(&ReasoningMarkers::default()).expect("default reasoning markers are valid")
    }
}

/// Clean `raw` with the given markers
pub fn clean_response(raw: &str, markers: &ReasoningMarkers) -> Result<String> {
    Ok(ResponseCleaner::new(markers)?.clean(raw))
}
