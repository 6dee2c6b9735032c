use super::print_json;
use crate::cli::OutputFormat;
use crate::labels::config::{load_file, LabelConfiguration};
use crate::runner::select_labels;
use colored::Colorize;
use std::io::BufRead;
use std::path::Path;

pub fn run(
    config_path: &Path,
    not_found_label: Option<&str>,
    paths: Vec<String>,
    format: OutputFormat,
) -> Result<(), String> {
    let config = load_file(config_path)?;

    let paths = if paths.is_empty() {
        read_paths(std::io::stdin().lock())?
    } else {
        paths
    };

    let labels = select_labels(&paths, &config, not_found_label);

    if format == OutputFormat::Json {
        let rules: Vec<serde_json::Value> = config
            .iter()
            .map(|rule| {
                serde_json::json!({
                    "label": rule.label,
                    "patterns": rule.pattern_strs(),
                    "matched": rule.matches(&paths),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "config": config_path.display().to_string(),
            "files": paths.len(),
            "labels": labels,
            "rules": rules,
        }));
    }

    println!(
        "{} rule(s) from {}, {} file(s)",
        config.len(),
        config_path.display(),
        paths.len()
    );
    for (label, hit) in rule_matches(&config, &paths) {
        if hit {
            println!("  {} {}", "✓".green(), label.cyan());
        } else {
            println!("  {} {}", "·".dimmed(), label.dimmed());
        }
    }

    if labels.is_empty() {
        println!("No labels would be added");
    } else {
        println!("Labels: {}", labels.join(", ").bold());
    }

    Ok(())
}

/// Per-rule match result, in configuration order.
fn rule_matches<'a>(config: &'a LabelConfiguration, paths: &[String]) -> Vec<(&'a str, bool)> {
    config
        .iter()
        .map(|rule| (rule.label.as_str(), rule.matches(paths)))
        .collect()
}

/// Read one path per line, skipping blank lines.
fn read_paths(reader: impl BufRead) -> Result<Vec<String>, String> {
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        let path = line.trim();
        if !path.is_empty() {
            paths.push(path.to_owned());
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::config::parse_str;

    #[test]
    fn test_read_paths_skips_blank_lines() {
        let input = "docs/a.md\n\n  src/lib.rs  \n";
        let paths = read_paths(input.as_bytes()).unwrap();
        assert_eq!(paths, vec!["docs/a.md", "src/lib.rs"]);
    }

    #[test]
    fn test_rule_matches_in_config_order() {
        let config = parse_str("rust: \"**/*.rs\"\ndocs: \"docs/**\"").unwrap();
        let paths = vec!["src/lib.rs".to_owned()];
        assert_eq!(
            rule_matches(&config, &paths),
            vec![("rust", true), ("docs", false)]
        );
    }
}
