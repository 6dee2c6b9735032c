use log::{debug, info, warn};
use serde::Serialize;

use super::process::process_pull_request;
use crate::error::LabelerError;
use crate::labels::config::{self, LabelConfiguration};
use crate::sources::context::RunContext;
use crate::sources::traits::RepoClient;

/// Settings for one run, as given on the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Repository path of the label rules document
    pub configuration_path: String,
    /// Label applied when no rule matches
    pub not_found_label: Option<String>,
    /// Maximum number of pull requests to label in one run. Must be positive.
    pub operations_per_run: u32,
}

/// Number of label-applying operations left in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBudget {
    limit: u32,
    remaining: u32,
}

impl RunBudget {
    pub fn new(operations_per_run: u32) -> Self {
        Self {
            limit: operations_per_run,
            remaining: operations_per_run,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Record one pull request that received labels.
    pub fn consume(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// A single pull request named by the triggering event
    Targeted,
    /// Every open pull request without labels
    Enumeration,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub mode: RunMode,
    /// Pull requests skipped because they already had labels
    pub skipped_labeled: usize,
    /// Pull requests that received labels, in processing order
    pub labeled: Vec<u64>,
    /// Pull requests processed without any label to add
    pub unmatched: Vec<u64>,
    /// Set when the run stopped early to stay within the operations budget
    pub budget_exhausted: bool,
}

impl RunReport {
    fn new(mode: RunMode) -> Self {
        Self {
            mode,
            skipped_labeled: 0,
            labeled: Vec::new(),
            unmatched: Vec::new(),
            budget_exhausted: false,
        }
    }

    /// Number of pull requests that were processed.
    pub fn processed(&self) -> usize {
        self.labeled.len() + self.unmatched.len()
    }
}

/// Drives a run: picks targeted or enumeration mode and processes pull
/// requests strictly one after another.
///
/// The label configuration is fetched at most once per run, on the first
/// pull request that needs it, and reused for the rest of the run.
pub struct RunLoop<'a, C: RepoClient> {
    client: &'a C,
    options: &'a RunOptions,
    config: Option<LabelConfiguration>,
}

impl<'a, C: RepoClient> RunLoop<'a, C> {
    pub fn new(client: &'a C, options: &'a RunOptions) -> Self {
        Self {
            client,
            options,
            config: None,
        }
    }

    pub fn run(&mut self, context: &RunContext) -> Result<RunReport, LabelerError> {
        if self.options.operations_per_run == 0 {
            return Err(LabelerError::config(
                "operations-per-run must be a positive integer",
            ));
        }

        match context.pull_request {
            Some(number) => self.run_targeted(number),
            None => self.run_enumeration(),
        }
    }

    fn run_targeted(&mut self, number: u64) -> Result<RunReport, LabelerError> {
        info!("[run] Labeling pr #{number} from the triggering event");
        let mut report = RunReport::new(RunMode::Targeted);

        if self.process(number)? {
            report.labeled.push(number);
        } else {
            report.unmatched.push(number);
        }

        Ok(report)
    }

    fn run_enumeration(&mut self) -> Result<RunReport, LabelerError> {
        let mut report = RunReport::new(RunMode::Enumeration);

        let pull_requests = self
            .client
            .list_open_pull_requests()
            .map_err(|e| LabelerError::transport(e.to_string(), "list open pull requests"))?;

        let eligible: Vec<u64> = pull_requests
            .into_iter()
            .filter(|pr| {
                if pr.is_labeled() {
                    debug!("[run] pr #{} already has {} labels", pr.number, pr.labels.len());
                    report.skipped_labeled += 1;
                    return false;
                }
                true
            })
            .map(|pr| pr.number)
            .collect();

        info!(
            "[run] {} open pull requests without labels ({} skipped)",
            eligible.len(),
            report.skipped_labeled
        );

        let mut budget = RunBudget::new(self.options.operations_per_run);
        for number in eligible {
            debug!(
                "[run] performing labeler at pr #{number} ({} operations left)",
                budget.remaining()
            );
            if budget.is_exhausted() {
                warn!(
                    "performed {} operations, exiting to avoid rate limit",
                    budget.limit()
                );
                report.budget_exhausted = true;
                break;
            }

            if self.process(number)? {
                budget.consume();
                report.labeled.push(number);
            } else {
                report.unmatched.push(number);
            }
        }

        Ok(report)
    }

    fn process(&mut self, number: u64) -> Result<bool, LabelerError> {
        let config = load_once(&mut self.config, self.client, &self.options.configuration_path)?;
        process_pull_request(
            self.client,
            number,
            config,
            self.options.not_found_label.as_deref(),
        )
    }
}

fn load_once<'c, C: RepoClient>(
    slot: &'c mut Option<LabelConfiguration>,
    client: &C,
    path: &str,
) -> Result<&'c LabelConfiguration, LabelerError> {
    let config = match slot.take() {
        Some(config) => config,
        None => fetch_configuration(client, path)?,
    };
    let config: &LabelConfiguration = slot.insert(config);
    Ok(config)
}

/// Fetch and parse the label rules document from the repository.
pub fn fetch_configuration<C: RepoClient>(
    client: &C,
    path: &str,
) -> Result<LabelConfiguration, LabelerError> {
    debug!("[run] fetching configuration from {path}");
    let content = client
        .get_file_content(path)
        .map_err(|e| LabelerError::transport(e.to_string(), format!("fetch {path}")))?;
    let config = config::from_slice(&content)?;
    debug!(
        "[run] loaded {} label rules: {}",
        config.len(),
        config.labels().collect::<Vec<_>>().join(", ")
    );
    Ok(config)
}
