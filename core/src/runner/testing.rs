//! In-memory [`RepoClient`] for runner tests.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::sources::traits::{PullRequestSummary, RepoClient};

#[derive(Debug, thiserror::Error)]
#[error("fake repo: {0}")]
pub struct FakeError(pub String);

#[derive(Default)]
pub struct FakeRepo {
    pub pull_requests: Vec<PullRequestSummary>,
    pub files: HashMap<u64, Vec<String>>,
    pub config: Option<String>,
    pub fail_files_for: Option<u64>,
    pub applied: RefCell<Vec<(u64, Vec<String>)>>,
    pub config_fetches: RefCell<usize>,
}

impl FakeRepo {
    pub fn with_config(config: &str) -> Self {
        Self {
            config: Some(config.to_owned()),
            ..Self::default()
        }
    }

    pub fn pull_request(mut self, number: u64, labels: &[&str], files: &[&str]) -> Self {
        self.pull_requests.push(PullRequestSummary {
            number,
            labels: labels.iter().map(|l| (*l).to_owned()).collect(),
        });
        self.files
            .insert(number, files.iter().map(|f| (*f).to_owned()).collect());
        self
    }

    pub fn applied(&self) -> Vec<(u64, Vec<String>)> {
        self.applied.borrow().clone()
    }
}

impl RepoClient for FakeRepo {
    type Error = FakeError;

    fn list_open_pull_requests(&self) -> Result<Vec<PullRequestSummary>, FakeError> {
        Ok(self.pull_requests.clone())
    }

    fn get_changed_files(&self, number: u64) -> Result<Vec<String>, FakeError> {
        if self.fail_files_for == Some(number) {
            return Err(FakeError(format!("HTTP 502 for #{number}")));
        }
        Ok(self.files.get(&number).cloned().unwrap_or_default())
    }

    fn get_file_content(&self, path: &str) -> Result<Vec<u8>, FakeError> {
        *self.config_fetches.borrow_mut() += 1;
        self.config
            .as_ref()
            .map(|c| c.as_bytes().to_vec())
            .ok_or_else(|| FakeError(format!("HTTP 404 for {path}")))
    }

    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), FakeError> {
        self.applied.borrow_mut().push((number, labels.to_vec()));
        Ok(())
    }
}
