//! Glob matching of changed file paths against label patterns.
//!
//! Patterns use shell-style globs over repository-relative, `/`-separated
//! paths:
//! - `docs/**` matches every file below `docs/`
//! - `src/*.rs` matches `src/lib.rs` but not `src/cli/mod.rs`
//! - `**/*.md` matches markdown files at any depth
//! - `?` matches a single character, `[ab]` and `[!ab]` are character classes
//! - `*.{js,ts}` expands to `*.js` and `*.ts`; `v{1..3}` to `v1`, `v2`, `v3`
//! - `\*` matches a literal `*`
//! - a leading `!` inverts the pattern: `!docs/**` matches files outside `docs/`
//!
//! Matching is case-sensitive and a leading `.` in a path segment is only
//! matched by a literal `.` in the pattern.

use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Upper bound on the patterns a single brace expression may expand to.
const MAX_EXPANSIONS: usize = 1024;

/// A compiled label glob: one or more alternatives, optionally negated.
#[derive(Debug, Clone)]
pub struct Glob {
    source: String,
    negated: bool,
    alternatives: Vec<Pattern>,
}

impl Glob {
    /// The pattern as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// Plain text or glob syntax
    Raw(char),
    /// A `\`-escaped character, always matched literally
    Literal(char),
}

type Expansions = Vec<Vec<Token>>;

/// Compile a glob pattern, returning a readable message on failure.
pub fn compile_pattern(pattern: &str) -> Result<Glob, String> {
    let body = pattern.trim_start_matches('!');
    let negated = (pattern.len() - body.len()) % 2 == 1;
    if body.is_empty() {
        return Err("pattern has nothing to match".to_owned());
    }

    let expansions = expand_braces(&tokenize(body)?)?;
    let single = expansions.len() == 1;
    let mut alternatives = Vec::with_capacity(expansions.len());
    for expanded in expansions {
        let source = to_glob_syntax(&expanded);
        let compiled = Pattern::new(&source).map_err(|e| {
            if single {
                e.to_string()
            } else {
                format!("in expansion {source:?}: {e}")
            }
        })?;
        alternatives.push(compiled);
    }

    Ok(Glob {
        source: pattern.to_owned(),
        negated,
        alternatives,
    })
}

/// Check if a single path matches a compiled glob.
pub fn path_matches(path: &str, glob: &Glob) -> bool {
    let hit = glob
        .alternatives
        .iter()
        .any(|pattern| pattern.matches_with(path, MATCH_OPTIONS));
    hit != glob.negated
}

/// Check if any changed file matches any of the globs.
///
/// Globs are tried in declared order and files in the order given; the
/// first hit wins. A negated glob hits on any file outside its pattern. An
/// empty file list never matches.
pub fn matches<S: AsRef<str>>(changed_files: &[S], globs: &[Glob]) -> bool {
    for glob in globs {
        log::debug!(" checking pattern {}", glob.as_str());
        for file in changed_files {
            let file = file.as_ref();
            log::debug!(" - {file}");
            if path_matches(file, glob) {
                log::debug!(" {file} matches");
                return true;
            }
        }
    }
    false
}

fn tokenize(pattern: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let escaped = chars
                .next()
                .ok_or_else(|| "pattern ends with an unescaped `\\`".to_owned())?;
            tokens.push(Token::Literal(escaped));
        } else {
            tokens.push(Token::Raw(c));
        }
    }
    Ok(tokens)
}

fn expand_braces(tokens: &[Token]) -> Result<Expansions, String> {
    let mut expanded = Vec::new();
    expand_into(tokens, 0, &mut expanded)?;
    Ok(expanded)
}

/// Expand the first expandable `{...}` group at or after `from`, recursing
/// into each result. Groups with neither a top-level `,` nor a `..` range
/// stay literal text.
fn expand_into(tokens: &[Token], from: usize, out: &mut Expansions) -> Result<(), String> {
    let mut search = from;
    while let Some((open, close)) = find_group(tokens, search) {
        if let Some(options) = group_alternatives(&tokens[open + 1..close])? {
            for option in options {
                let mut combined = tokens[..open].to_vec();
                combined.extend(option);
                combined.extend_from_slice(&tokens[close + 1..]);
                expand_into(&combined, open, out)?;
            }
            return Ok(());
        }
        search = open + 1;
    }

    if out.len() >= MAX_EXPANSIONS {
        return Err(format!(
            "braces expand to more than {MAX_EXPANSIONS} patterns"
        ));
    }
    out.push(tokens.to_vec());
    Ok(())
}

fn find_group(tokens: &[Token], from: usize) -> Option<(usize, usize)> {
    (from..tokens.len())
        .filter(|&i| tokens[i] == Token::Raw('{'))
        .find_map(|open| matching_close(tokens, open).map(|close| (open, close)))
}

fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::Raw('{') => depth += 1,
            Token::Raw('}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn group_alternatives(inner: &[Token]) -> Result<Option<Expansions>, String> {
    let mut parts: Expansions = vec![Vec::new()];
    let mut depth = 0usize;
    for &token in inner {
        match token {
            Token::Raw('{') => depth += 1,
            Token::Raw('}') => depth = depth.saturating_sub(1),
            Token::Raw(',') if depth == 0 => {
                parts.push(Vec::new());
                continue;
            }
            _ => {}
        }
        if let Some(last) = parts.last_mut() {
            last.push(token);
        }
    }

    if parts.len() > 1 {
        return Ok(Some(parts));
    }
    sequence(inner)
}

/// Expand a `{1..3}`, `{01..10}` or `{a..e}` range.
fn sequence(inner: &[Token]) -> Result<Option<Expansions>, String> {
    let mut text = String::with_capacity(inner.len());
    for token in inner {
        match token {
            Token::Raw(c) => text.push(*c),
            Token::Literal(_) => return Ok(None),
        }
    }
    let Some((start, end)) = text.split_once("..") else {
        return Ok(None);
    };

    if let (Ok(a), Ok(b)) = (start.parse::<i64>(), end.parse::<i64>()) {
        if a.abs_diff(b) >= MAX_EXPANSIONS as u64 {
            return Err(format!(
                "range {{{text}}} expands to more than {MAX_EXPANSIONS} patterns"
            ));
        }
        let width = if has_leading_zero(start) || has_leading_zero(end) {
            start.len().max(end.len())
        } else {
            0
        };
        let values: Vec<i64> = if a <= b {
            (a..=b).collect()
        } else {
            (b..=a).rev().collect()
        };
        return Ok(Some(
            values
                .into_iter()
                .map(|n| format!("{n:0width$}").chars().map(Token::Literal).collect())
                .collect(),
        ));
    }

    let mut start_chars = start.chars();
    let mut end_chars = end.chars();
    if let (Some(a), None, Some(b), None) = (
        start_chars.next(),
        start_chars.next(),
        end_chars.next(),
        end_chars.next(),
    ) {
        if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() {
            let mut letters: Vec<char> = (a.min(b) as u8..=a.max(b) as u8).map(char::from).collect();
            if a > b {
                letters.reverse();
            }
            return Ok(Some(
                letters.into_iter().map(|c| vec![Token::Literal(c)]).collect(),
            ));
        }
    }

    Ok(None)
}

fn has_leading_zero(number: &str) -> bool {
    let digits = number.trim_start_matches('-');
    digits.len() > 1 && digits.starts_with('0')
}

/// Render tokens in `glob` crate syntax. Escaped metacharacters outside a
/// character class become one-character classes (`[*]`).
fn to_glob_syntax(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.len());
    let mut class_start: Option<usize> = None;

    for (i, token) in tokens.iter().enumerate() {
        match (*token, class_start) {
            (Token::Raw('['), None) => {
                class_start = Some(i);
                out.push('[');
            }
            (Token::Raw(']'), Some(start)) => {
                // `]` right after `[` or `[!` is a member of the class
                let negated = tokens.get(start + 1) == Some(&Token::Raw('!'));
                let first = if negated { start + 2 } else { start + 1 };
                if i > first {
                    class_start = None;
                }
                out.push(']');
            }
            (Token::Literal(c @ ('*' | '?' | '[' | ']')), None) => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            (Token::Raw(c) | Token::Literal(c), _) => out.push(c),
        }
    }

    out
}
