//! Run context: which repository, which commit, and which pull request (if
//! any) triggered the run.
//!
//! Inside GitHub Actions this comes from `GITHUB_REPOSITORY`, `GITHUB_SHA`
//! and the event payload at `GITHUB_EVENT_PATH`. The CLI can override each
//! field so runs are reproducible outside of a workflow.

use std::fmt;
use std::path::Path;

use crate::error::LabelerError;

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinates {
    /// Parse an `owner/name` string.
    pub fn parse(full_name: &str) -> Result<Self, LabelerError> {
        match full_name.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            }
            _ => Err(LabelerError::context(format!(
                "expected repository as owner/name, got {full_name:?}"
            ))),
        }
    }
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything the run loop needs to know about where it is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub repository: RepoCoordinates,
    /// Commit the configuration is read at. `None` reads the default branch.
    pub sha: Option<String>,
    /// Set when the run was triggered by a pull request event.
    pub pull_request: Option<u64>,
}

impl RunContext {
    pub fn new(repository: RepoCoordinates) -> Self {
        Self {
            repository,
            sha: None,
            pull_request: None,
        }
    }

    /// Build the context from the process environment.
    pub fn from_env() -> Result<Self, LabelerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the context from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LabelerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let full_name = lookup("GITHUB_REPOSITORY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                LabelerError::context("GITHUB_REPOSITORY is not set; pass --repository owner/name")
            })?;

        let pull_request = match lookup("GITHUB_EVENT_PATH").filter(|v| !v.is_empty()) {
            Some(path) => read_event_pull_request(Path::new(&path))?,
            None => None,
        };

        Ok(Self {
            repository: RepoCoordinates::parse(&full_name)?,
            sha: lookup("GITHUB_SHA").filter(|v| !v.is_empty()),
            pull_request,
        })
    }
}

/// Read the pull request number from an event payload file.
///
/// A missing file means the run has no trigger payload (e.g. a local run).
fn read_event_pull_request(path: &Path) -> Result<Option<u64>, LabelerError> {
    if !path.exists() {
        log::debug!("[context] No event payload at {}", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        LabelerError::context(format!("failed to read event payload {}: {e}", path.display()))
    })?;
    let payload: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        LabelerError::context(format!("invalid event payload {}: {e}", path.display()))
    })?;

    Ok(pull_request_number(&payload))
}

/// Extract `pull_request.number` from a webhook event payload.
pub fn pull_request_number(payload: &serde_json::Value) -> Option<u64> {
    payload.get("pull_request")?.get("number")?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_coordinates() {
        let repo = RepoCoordinates::parse("octo-org/widgets").unwrap();
        assert_eq!(repo.owner, "octo-org");
        assert_eq!(repo.name, "widgets");
        assert_eq!(repo.to_string(), "octo-org/widgets");
    }

    #[test]
    fn test_parse_coordinates_rejects_malformed() {
        assert!(RepoCoordinates::parse("widgets").is_err());
        assert!(RepoCoordinates::parse("/widgets").is_err());
        assert!(RepoCoordinates::parse("octo-org/").is_err());
        assert!(RepoCoordinates::parse("a/b/c").is_err());
    }

    #[test]
    fn test_pull_request_number() {
        let payload = serde_json::json!({"action": "opened", "pull_request": {"number": 42}});
        assert_eq!(pull_request_number(&payload), Some(42));

        let push = serde_json::json!({"ref": "refs/heads/main"});
        assert_eq!(pull_request_number(&push), None);
    }

    #[test]
    fn test_from_lookup_without_event() {
        let context = RunContext::from_lookup(lookup_from(&[
            ("GITHUB_REPOSITORY", "octo-org/widgets"),
            ("GITHUB_SHA", "abc123"),
        ]))
        .unwrap();

        assert_eq!(context.repository.to_string(), "octo-org/widgets");
        assert_eq!(context.sha.as_deref(), Some("abc123"));
        assert_eq!(context.pull_request, None);
    }

    #[test]
    fn test_from_lookup_with_pull_request_event() {
        let mut event = tempfile::NamedTempFile::new().unwrap();
        write!(event, r#"{{"pull_request": {{"number": 7}}}}"#).unwrap();
        let event_path = event.path().to_string_lossy().into_owned();

        let context = RunContext::from_lookup(lookup_from(&[
            ("GITHUB_REPOSITORY", "octo-org/widgets"),
            ("GITHUB_EVENT_PATH", event_path.as_str()),
        ]))
        .unwrap();

        assert_eq!(context.pull_request, Some(7));
        assert_eq!(context.sha, None);
    }

    #[test]
    fn test_from_lookup_with_schedule_event() {
        let mut event = tempfile::NamedTempFile::new().unwrap();
        write!(event, r#"{{"schedule": "0 * * * *"}}"#).unwrap();
        let event_path = event.path().to_string_lossy().into_owned();

        let context = RunContext::from_lookup(lookup_from(&[
            ("GITHUB_REPOSITORY", "octo-org/widgets"),
            ("GITHUB_EVENT_PATH", event_path.as_str()),
        ]))
        .unwrap();

        assert_eq!(context.pull_request, None);
    }

    #[test]
    fn test_from_lookup_missing_event_file() {
        let context = RunContext::from_lookup(lookup_from(&[
            ("GITHUB_REPOSITORY", "octo-org/widgets"),
            ("GITHUB_EVENT_PATH", "/nonexistent/event.json"),
        ]))
        .unwrap();
        assert_eq!(context.pull_request, None);
    }

    #[test]
    fn test_from_lookup_invalid_event_payload() {
        let mut event = tempfile::NamedTempFile::new().unwrap();
        write!(event, "not json").unwrap();
        let event_path = event.path().to_string_lossy().into_owned();

        let err = RunContext::from_lookup(lookup_from(&[
            ("GITHUB_REPOSITORY", "octo-org/widgets"),
            ("GITHUB_EVENT_PATH", event_path.as_str()),
        ]))
        .unwrap_err();
        assert!(matches!(err, LabelerError::Context { .. }));
    }

    #[test]
    fn test_from_lookup_requires_repository() {
        let err = RunContext::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("GITHUB_REPOSITORY"));
    }
}
