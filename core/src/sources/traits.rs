/// An open pull request as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub number: u64,
    /// Names of the labels already on the pull request
    pub labels: Vec<String>,
}

impl PullRequestSummary {
    pub fn is_labeled(&self) -> bool {
        !self.labels.is_empty()
    }
}

/// Trait for the remote repository - abstracts over the `gh` CLI, the REST
/// API, or an in-memory fake in tests.
///
/// Implementations are bound to one repository and one commit; the run loop
/// only ever passes pull request numbers and repository-relative paths.
pub trait RepoClient {
    type Error: std::error::Error;

    /// List open pull requests, most recently updated first, across all pages.
    fn list_open_pull_requests(&self) -> Result<Vec<PullRequestSummary>, Self::Error>;

    /// Get the paths of all files changed by a pull request.
    fn get_changed_files(&self, number: u64) -> Result<Vec<String>, Self::Error>;

    /// Get the raw content of a file at the run's commit.
    fn get_file_content(&self, path: &str) -> Result<Vec<u8>, Self::Error>;

    /// Add labels to a pull request. Existing labels are kept.
    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), Self::Error>;
}
