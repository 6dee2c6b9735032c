//! Label rule configuration.
//!
//! The configuration document is a YAML mapping from label name to either a
//! single glob or a list of globs:
//!
//! ```yaml
//! documentation: "docs/**"
//! area/api:
//!   - "src/api/**"
//!   - "openapi.yaml"
//! ```
//!
//! Parsing is a single validating pass over the untyped document. Anything
//! outside {string, list of strings} is rejected rather than coerced, and
//! every glob is compiled up front so a bad pattern fails the run before any
//! label is applied.

use serde_yaml::Value;
use std::path::Path;

use super::matching::{self, Glob};
use crate::error::LabelerError;

/// A label and the globs that select it.
#[derive(Debug, Clone)]
pub struct LabelRule {
    pub label: String,
    /// Compiled patterns in document order. Never empty.
    pub patterns: Vec<Glob>,
}

impl LabelRule {
    /// The patterns as written in the document.
    pub fn pattern_strs(&self) -> Vec<&str> {
        self.patterns.iter().map(Glob::as_str).collect()
    }

    /// Check whether any changed file matches this rule.
    pub fn matches<S: AsRef<str>>(&self, changed_files: &[S]) -> bool {
        matching::matches(changed_files, &self.patterns)
    }
}

/// Validated label rules, in the order the labels appear in the document.
#[derive(Debug, Clone, Default)]
pub struct LabelConfiguration {
    rules: Vec<LabelRule>,
}

impl LabelConfiguration {
    pub fn iter(&self) -> impl Iterator<Item = &LabelRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&LabelRule> {
        self.rules.iter().find(|rule| rule.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.label.as_str())
    }
}

/// Validate a decoded YAML document into a [`LabelConfiguration`].
///
/// A null document (empty file) yields an empty configuration.
pub fn parse(document: &Value) -> Result<LabelConfiguration, LabelerError> {
    let mapping = match document {
        Value::Null => return Ok(LabelConfiguration::default()),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(LabelerError::config(format!(
                "expected a mapping of label to globs at the top level, found {}",
                kind_of(other)
            )))
        }
    };

    let mut rules = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let label = parse_label(key)?;
        let raw_patterns = parse_patterns(&label, value)?;

        let mut patterns = Vec::with_capacity(raw_patterns.len());
        for raw in raw_patterns {
            let pattern = matching::compile_pattern(raw)
                .map_err(|message| LabelerError::glob_syntax(&label, raw, message))?;
            patterns.push(pattern);
        }

        rules.push(LabelRule { label, patterns });
    }

    Ok(LabelConfiguration { rules })
}

/// Decode YAML text and validate it.
pub fn parse_str(text: &str) -> Result<LabelConfiguration, LabelerError> {
    if text.trim().is_empty() {
        return Ok(LabelConfiguration::default());
    }
    let document: Value = serde_yaml::from_str(text)?;
    parse(&document)
}

/// Decode raw file content (as fetched from the repository) and validate it.
pub fn from_slice(content: &[u8]) -> Result<LabelConfiguration, LabelerError> {
    let text = std::str::from_utf8(content)
        .map_err(|e| LabelerError::config(format!("configuration is not valid UTF-8: {e}")))?;
    parse_str(text)
}

/// Read and validate a configuration file from the local filesystem.
pub fn load_file(path: &Path) -> Result<LabelConfiguration, LabelerError> {
    let content = std::fs::read(path)
        .map_err(|e| LabelerError::config(format!("failed to read {}: {e}", path.display())))?;
    from_slice(&content)
}

fn parse_label(key: &Value) -> Result<String, LabelerError> {
    match key {
        Value::String(label) if !label.trim().is_empty() => Ok(label.clone()),
        Value::String(_) => Err(LabelerError::config("found an empty label name")),
        other => Err(LabelerError::config(format!(
            "label names must be strings, found {}",
            kind_of(other)
        ))),
    }
}

fn parse_patterns<'a>(label: &str, value: &'a Value) -> Result<Vec<&'a str>, LabelerError> {
    let patterns = match value {
        Value::String(pattern) => vec![pattern.as_str()],
        Value::Sequence(items) => {
            if items.is_empty() {
                return Err(LabelerError::config(format!(
                    "label {label:?} has an empty list of globs"
                )));
            }
            items
                .iter()
                .map(|item| match item {
                    Value::String(pattern) => Ok(pattern.as_str()),
                    other => Err(LabelerError::config(format!(
                        "label {label:?} has a non-string glob ({})",
                        kind_of(other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        other => {
            return Err(LabelerError::config(format!(
                "found unexpected type for label {label:?} (should be string or array of globs, found {})",
                kind_of(other)
            )))
        }
    };

    if patterns.iter().any(|p| p.is_empty()) {
        return Err(LabelerError::config(format!(
            "label {label:?} has an empty glob"
        )));
    }

    Ok(patterns)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
