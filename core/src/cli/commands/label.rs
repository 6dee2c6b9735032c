use super::print_json;
use crate::cli::{annotate, OutputFormat};
use crate::error::LabelerError;
use crate::runner::{RunLoop, RunMode, RunOptions, RunReport};
use crate::sources::context::RunContext;
use crate::sources::github::GhCliProvider;
use colored::Colorize;

/// Arguments of the `run` command.
#[derive(Debug)]
pub struct LabelArgs {
    pub repo_token: Option<String>,
    pub configuration_path: String,
    pub not_found_label: Option<String>,
    pub operations_per_run: u32,
    pub repository: Option<String>,
    pub sha: Option<String>,
    pub pull_request: Option<u64>,
}

pub fn run(args: LabelArgs, format: OutputFormat) -> Result<(), String> {
    let token = args
        .repo_token
        .filter(|t| !t.is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
        .ok_or_else(|| "--repo-token is required (or set GITHUB_TOKEN)".to_owned())?;

    let context = resolve_context(args.repository, args.sha, args.pull_request, |key| {
        std::env::var(key).ok()
    })?;

    let provider = GhCliProvider::new(&context, Some(token));
    if !provider.is_available() {
        return Err("GitHub CLI (gh) is not available. Install it from https://cli.github.com".to_owned());
    }

    let options = RunOptions {
        configuration_path: args.configuration_path,
        not_found_label: args.not_found_label.filter(|l| !l.is_empty()),
        operations_per_run: args.operations_per_run,
    };

    log::info!(
        "[run] Labeling {} with rules from {}",
        context.repository,
        options.configuration_path
    );

    let report = RunLoop::new(&provider, &options).run(&context)?;

    if let Some(warning) = budget_warning(&report, &options, format) {
        annotate("warning", &warning);
    }

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "repository": context.repository.to_string(),
            "report": report,
        }));
    }

    print_report(&report);
    Ok(())
}

/// Build the run context from the environment, with command-line overrides.
///
/// With `--pull-request` the event payload is not read at all.
fn resolve_context<F>(
    repository: Option<String>,
    sha: Option<String>,
    pull_request: Option<u64>,
    env: F,
) -> Result<RunContext, LabelerError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut context = RunContext::from_lookup(|key| match key {
        "GITHUB_REPOSITORY" if repository.is_some() => repository.clone(),
        "GITHUB_EVENT_PATH" if pull_request.is_some() => None,
        _ => env(key),
    })?;

    if sha.is_some() {
        context.sha = sha;
    }
    if pull_request.is_some() {
        context.pull_request = pull_request;
    }

    Ok(context)
}

/// Workflow warning for a run that stopped on its budget. Annotations share
/// stdout with the report, so JSON output gets none.
fn budget_warning(report: &RunReport, options: &RunOptions, format: OutputFormat) -> Option<String> {
    if !report.budget_exhausted || format == OutputFormat::Json {
        return None;
    }
    Some(format!(
        "performed {} operations, exiting to avoid rate limit",
        options.operations_per_run
    ))
}

fn print_report(report: &RunReport) {
    let numbers = |prs: &[u64]| {
        prs.iter()
            .map(|n| format!("#{n}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    if report.labeled.is_empty() {
        println!("No labels added");
    } else {
        println!(
            "{} Labeled {} pull request(s): {}",
            "✓".green(),
            report.labeled.len(),
            numbers(&report.labeled).cyan()
        );
    }

    if !report.unmatched.is_empty() {
        println!(
            "  {} without matching rules: {}",
            report.unmatched.len(),
            numbers(&report.unmatched).dimmed()
        );
    }

    if report.mode == RunMode::Enumeration && report.skipped_labeled > 0 {
        println!(
            "  {} already labeled, skipped",
            report.skipped_labeled.to_string().dimmed()
        );
    }

    if report.budget_exhausted {
        println!(
            "  {} stopped early to stay within operations-per-run",
            "Note:".yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn event_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_context_from_environment() {
        let event = event_file(r#"{"pull_request": {"number": 7}}"#);
        let path = event.path().to_string_lossy().into_owned();
        let env = env_from(&[
            ("GITHUB_REPOSITORY", "acme/widgets"),
            ("GITHUB_SHA", "abc123"),
            ("GITHUB_EVENT_PATH", path.as_str()),
        ]);

        let context = resolve_context(None, None, None, env).unwrap();

        assert_eq!(context.repository.to_string(), "acme/widgets");
        assert_eq!(context.sha.as_deref(), Some("abc123"));
        assert_eq!(context.pull_request, Some(7));
    }

    #[test]
    fn test_repository_and_sha_overrides() {
        let env = env_from(&[("GITHUB_REPOSITORY", "acme/widgets"), ("GITHUB_SHA", "abc123")]);

        let context = resolve_context(
            Some("octo/labels".to_owned()),
            Some("def456".to_owned()),
            None,
            env,
        )
        .unwrap();

        assert_eq!(context.repository.to_string(), "octo/labels");
        assert_eq!(context.sha.as_deref(), Some("def456"));
        assert_eq!(context.pull_request, None);
    }

    #[test]
    fn test_repository_override_without_environment() {
        let context = resolve_context(Some("octo/labels".to_owned()), None, None, env_from(&[])).unwrap();
        assert_eq!(context.repository.to_string(), "octo/labels");
    }

    #[test]
    fn test_missing_repository_is_context_error() {
        let err = resolve_context(None, None, Some(3), env_from(&[])).unwrap_err();
        assert!(matches!(err, LabelerError::Context { .. }));
    }

    #[test]
    fn test_pull_request_override_wins_over_event() {
        let event = event_file(r#"{"pull_request": {"number": 7}}"#);
        let path = event.path().to_string_lossy().into_owned();
        let env = env_from(&[
            ("GITHUB_REPOSITORY", "acme/widgets"),
            ("GITHUB_EVENT_PATH", path.as_str()),
        ]);

        let context = resolve_context(None, None, Some(12), env).unwrap();

        assert_eq!(context.pull_request, Some(12));
    }

    #[test]
    fn test_pull_request_override_skips_invalid_event_payload() {
        let event = event_file("not json at all");
        let path = event.path().to_string_lossy().into_owned();
        let env = || {
            env_from(&[
                ("GITHUB_REPOSITORY", "acme/widgets"),
                ("GITHUB_EVENT_PATH", path.as_str()),
            ])
        };

        let context = resolve_context(None, None, Some(12), env()).unwrap();
        assert_eq!(context.pull_request, Some(12));

        let err = resolve_context(None, None, None, env()).unwrap_err();
        assert!(matches!(err, LabelerError::Context { .. }));
    }

    fn exhausted_report() -> RunReport {
        RunReport {
            mode: RunMode::Enumeration,
            skipped_labeled: 0,
            labeled: vec![1, 2],
            unmatched: Vec::new(),
            budget_exhausted: true,
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            configuration_path: ".github/labeler.yml".to_owned(),
            not_found_label: None,
            operations_per_run: 2,
        }
    }

    #[test]
    fn test_budget_warning_in_text_mode() {
        let warning = budget_warning(&exhausted_report(), &options(), OutputFormat::Text);
        assert_eq!(
            warning.as_deref(),
            Some("performed 2 operations, exiting to avoid rate limit")
        );
    }

    #[test]
    fn test_no_budget_warning_on_json_stdout() {
        assert_eq!(
            budget_warning(&exhausted_report(), &options(), OutputFormat::Json),
            None
        );
    }

    #[test]
    fn test_no_budget_warning_when_budget_left() {
        let mut report = exhausted_report();
        report.budget_exhausted = false;
        assert_eq!(budget_warning(&report, &options(), OutputFormat::Text), None);
    }
}
