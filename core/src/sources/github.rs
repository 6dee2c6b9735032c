//! GitHub client backed by the `gh` CLI.
//!
//! Every call goes through `gh api`, which takes care of authentication,
//! pagination and the REST transport. The repository token is handed to gh
//! through `GH_TOKEN`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;

use super::context::{RepoCoordinates, RunContext};
use super::traits::{PullRequestSummary, RepoClient};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    #[serde(default)]
    labels: Vec<ApiLabel>,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    filename: String,
}

/// Response of the repository contents endpoint for a single file.
#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

impl From<ApiPullRequest> for PullRequestSummary {
    fn from(pr: ApiPullRequest) -> Self {
        Self {
            number: pr.number,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum GhError {
    #[error("gh I/O error: {0}")]
    Io(String),
    #[error("gh command error: {0}")]
    Command(String),
    #[error("gh parse error: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// GhCliProvider
// ---------------------------------------------------------------------------

/// [`RepoClient`] backed by the `gh` CLI.
pub struct GhCliProvider {
    repository: RepoCoordinates,
    git_ref: Option<String>,
    token: Option<String>,
}

impl GhCliProvider {
    pub fn new(context: &RunContext, token: Option<String>) -> Self {
        Self {
            repository: context.repository.clone(),
            git_ref: context.sha.clone(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Returns `true` when the `gh` binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new("gh")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn repo_endpoint(&self, rest: &str) -> String {
        format!(
            "repos/{}/{}/{rest}",
            self.repository.owner, self.repository.name
        )
    }

    /// Run `gh api` with the given arguments, optionally feeding `input` on stdin.
    fn api(&self, args: &[&str], input: Option<&[u8]>) -> Result<Vec<u8>, GhError> {
        let mut cmd = Command::new("gh");
        cmd.arg("api")
            .args(["-H", "Accept: application/vnd.github+json"])
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(token) = &self.token {
            cmd.env("GH_TOKEN", token);
        }

        log::debug!("[gh] api {}", args.join(" "));

        let mut child = cmd.spawn().map_err(|e| GhError::Io(e.to_string()))?;

        if let Some(bytes) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(bytes)
                    .map_err(|e| GhError::Io(e.to_string()))?;
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| GhError::Io(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GhError::Command(stderr.trim().to_owned()));
        }

        Ok(output.stdout)
    }
}

impl RepoClient for GhCliProvider {
    type Error = GhError;

    fn list_open_pull_requests(&self) -> Result<Vec<PullRequestSummary>, GhError> {
        let endpoint =
            self.repo_endpoint("pulls?state=open&sort=updated&direction=desc&per_page=100");
        let output = self.api(&["--paginate", endpoint.as_str()], None)?;
        let prs: Vec<ApiPullRequest> = parse_pages(&output)?;
        Ok(prs.into_iter().map(PullRequestSummary::from).collect())
    }

    fn get_changed_files(&self, number: u64) -> Result<Vec<String>, GhError> {
        let endpoint = self.repo_endpoint(&format!("pulls/{number}/files?per_page=100"));
        let output = self.api(&["--paginate", endpoint.as_str()], None)?;
        let files: Vec<ApiFile> = parse_pages(&output)?;
        Ok(files.into_iter().map(|f| f.filename).collect())
    }

    fn get_file_content(&self, path: &str) -> Result<Vec<u8>, GhError> {
        let mut endpoint = self.repo_endpoint(&format!("contents/{}", encode_path(path)));
        if let Some(git_ref) = &self.git_ref {
            endpoint.push_str("?ref=");
            endpoint.push_str(&urlencoding::encode(git_ref));
        }

        let output = self.api(&[endpoint.as_str()], None)?;
        let response: ContentResponse = serde_json::from_slice(&output)
            .map_err(|e| GhError::Parse(format!("{path} is not a file: {e}")))?;
        decode_content(&response)
    }

    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GhError> {
        let endpoint = self.repo_endpoint(&format!("issues/{number}/labels"));
        let body = serde_json::to_vec(&serde_json::json!({ "labels": labels }))
            .map_err(|e| GhError::Parse(e.to_string()))?;
        self.api(&["--method", "POST", endpoint.as_str(), "--input", "-"], Some(&body))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decode the output of `gh api --paginate` for a list endpoint.
///
/// gh prints each page's JSON array back to back (`[...][...]`), so the
/// output is read as a stream of arrays and flattened.
pub fn parse_pages<T: DeserializeOwned>(output: &[u8]) -> Result<Vec<T>, GhError> {
    let mut items = Vec::new();
    for page in serde_json::Deserializer::from_slice(output).into_iter::<Vec<T>>() {
        items.extend(page.map_err(|e| GhError::Parse(e.to_string()))?);
    }
    Ok(items)
}

/// Decode the base64 payload of a contents response.
pub fn decode_content(response: &ContentResponse) -> Result<Vec<u8>, GhError> {
    if response.encoding != "base64" {
        return Err(GhError::Parse(format!(
            "unsupported content encoding {:?}",
            response.encoding
        )));
    }

    // GitHub wraps the payload at 60 columns
    let compact: String = response
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    BASE64
        .decode(compact)
        .map_err(|e| GhError::Parse(format!("invalid base64 content: {e}")))
}

/// Percent-encode each segment of a repository path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.trim_start_matches("./")
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pages_single_page() {
        let output = br#"[{"number": 3, "labels": []}, {"number": 1, "labels": [{"name": "bug"}]}]"#;
        let prs: Vec<ApiPullRequest> = parse_pages(output).unwrap();
        let prs: Vec<PullRequestSummary> = prs.into_iter().map(Into::into).collect();

        assert_eq!(prs.len(), 2);
        assert_eq!(prs[0].number, 3);
        assert!(!prs[0].is_labeled());
        assert_eq!(prs[1].labels, vec!["bug".to_owned()]);
    }

    #[test]
    fn test_parse_pages_concatenated() {
        let output = b"[{\"filename\": \"a.rs\"}]\n[{\"filename\": \"b.rs\"}][]";
        let files: Vec<ApiFile> = parse_pages(output).unwrap();
        let names: Vec<String> = files.into_iter().map(|f| f.filename).collect();
        assert_eq!(names, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn test_parse_pages_empty_output() {
        let files: Vec<ApiFile> = parse_pages(b"").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_parse_pages_rejects_garbage() {
        let result: Result<Vec<ApiFile>, _> = parse_pages(b"{\"message\": \"Not Found\"}");
        assert!(matches!(result, Err(GhError::Parse(_))));
    }

    #[test]
    fn test_decode_content_wrapped_base64() {
        // "docs: docs/**\n" split across lines the way the contents API returns it
        let response = ContentResponse {
            content: "ZG9jczog\nZG9jcy8qKgo=\n".to_owned(),
            encoding: "base64".to_owned(),
        };
        let bytes = decode_content(&response).unwrap();
        assert_eq!(bytes, b"docs: docs/**\n");
    }

    #[test]
    fn test_decode_content_unsupported_encoding() {
        let response = ContentResponse {
            content: String::new(),
            encoding: "none".to_owned(),
        };
        let err = decode_content(&response).unwrap_err();
        assert!(err.to_string().contains("unsupported content encoding"));
    }

    #[test]
    fn test_decode_content_invalid_base64() {
        let response = ContentResponse {
            content: "not base64!".to_owned(),
            encoding: "base64".to_owned(),
        };
        assert!(decode_content(&response).is_err());
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path(".github/labeler.yml"), ".github/labeler.yml");
        assert_eq!(encode_path("./config/my labels.yml"), "config/my%20labels.yml");
        assert_eq!(encode_path("/labeler.yml"), "labeler.yml");
    }

    #[test]
    fn test_endpoints_use_repository() {
        let context = RunContext::new(RepoCoordinates::parse("octo-org/widgets").unwrap());
        let provider = GhCliProvider::new(&context, Some(String::new()));
        assert_eq!(
            provider.repo_endpoint("pulls/1/files"),
            "repos/octo-org/widgets/pulls/1/files"
        );
        assert!(provider.token.is_none());
    }
}
