use log::debug;

use crate::error::LabelerError;
use crate::labels::config::LabelConfiguration;
use crate::sources::traits::RepoClient;

/// Pick the labels for a set of changed files.
///
/// Every rule is evaluated, in configuration order, and each matching rule
/// contributes its label. When nothing matched and `fallback_label` is a
/// non-empty string, the fallback is returned alone.
pub fn select_labels<S: AsRef<str>>(
    changed_files: &[S],
    config: &LabelConfiguration,
    fallback_label: Option<&str>,
) -> Vec<String> {
    let mut labels = Vec::new();

    for rule in config.iter() {
        debug!("[process] processing {}", rule.label);
        if rule.matches(changed_files) {
            labels.push(rule.label.clone());
        }
    }

    if labels.is_empty() {
        if let Some(fallback) = fallback_label.filter(|l| !l.is_empty()) {
            debug!("[process] no rule matched, using {fallback}");
            labels.push(fallback.to_owned());
        }
    }

    labels
}

/// Label one pull request. Returns `true` iff labels were added.
///
/// Fetch failures propagate; nothing is applied in that case.
pub fn process_pull_request<C: RepoClient>(
    client: &C,
    number: u64,
    config: &LabelConfiguration,
    fallback_label: Option<&str>,
) -> Result<bool, LabelerError> {
    debug!("[process] fetching changed files for pr #{number}");
    let changed_files = client.get_changed_files(number).map_err(|e| {
        LabelerError::transport(e.to_string(), format!("list files of pr #{number}"))
    })?;

    debug!("[process] found {} changed files:", changed_files.len());
    for file in &changed_files {
        debug!("[process]   {file}");
    }

    let labels = select_labels(&changed_files, config, fallback_label);
    if labels.is_empty() {
        debug!("[process] no labels for pr #{number}");
        return Ok(false);
    }

    client
        .add_labels(number, &labels)
        .map_err(|e| LabelerError::transport(e.to_string(), format!("add labels to pr #{number}")))?;
    log::info!("[process] Added {} to pr #{number}", labels.join(", "));

    Ok(true)
}
