use crate::sbom_generation::domain::LATEST_VERSION;
use regex::Regex;
use std::sync::LazyLock;

static EXTRAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("static regex"));

static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*").expect("static regex"));

/// Comparison operators in match order; longer operators come first.
const OPERATORS: &[&str] = &["===", "==", ">=", "<=", "~=", "!=", ">", "<", "="];

/// Operators whose version is a usable representative of the constraint.
const LOWER_BOUND_OPERATORS: &[&str] = &["===", "==", "~=", ">=", ">", "="];

/// A PEP 508 style requirement reduced to a name and a representative version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub version: String,
}

/// Parses one requirement line (`requirements.txt`, `requires_dist`,
/// `project.dependencies`).
///
/// Returns `None` for blank lines, comments and pip options. Environment
/// markers and extras are dropped. VCS and URL lines yield the `#egg=` name
/// at version "latest", or `None` when no name is recoverable.
pub fn parse_requirement(line: &str) -> Option<Requirement> {
    let line = match line.find(" #") {
        Some(pos) => &line[..pos],
        None => line,
    };
    let line = line.trim();
    let line = line.strip_prefix("-e ").map(str::trim).unwrap_or(line);
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }

    let line = line.split(';').next().unwrap_or_default().trim();
    let line = EXTRAS.replace_all(line, "");
    let line = line.trim();

    if line.starts_with("git+") || line.starts_with("http://") || line.starts_with("https://") {
        let (_, egg) = line.split_once("#egg=")?;
        let name = NAME.find(egg)?.as_str();
        return Some(Requirement {
            name: name.to_string(),
            version: LATEST_VERSION.to_string(),
        });
    }

    let name = NAME.find(line)?.as_str().to_string();
    let rest = line[name.len()..].trim();

    // "name @ https://..." direct references
    if rest.starts_with('@') {
        return Some(Requirement {
            name,
            version: LATEST_VERSION.to_string(),
        });
    }

    let rest = rest.trim_start_matches('(').trim_end_matches(')');
    Some(Requirement {
        name,
        version: representative_version(rest),
    })
}

fn representative_version(constraint: &str) -> String {
    let clauses: Vec<(&str, &str)> = constraint
        .split(',')
        .filter_map(|clause| {
            let clause = clause.trim();
            OPERATORS
                .iter()
                .find(|op| clause.starts_with(**op))
                .map(|op| (*op, clause[op.len()..].trim()))
        })
        .collect();

    let chosen = clauses
        .iter()
        .find(|(op, _)| LOWER_BOUND_OPERATORS.contains(op))
        .or_else(|| clauses.first());

    match chosen {
        Some((_, version)) if !version.trim_start_matches('=').is_empty() => {
            version.trim_start_matches('=').trim().to_string()
        }
        _ => LATEST_VERSION.to_string(),
    }
}
