use crate::sbom_generation::domain::LATEST_VERSION;

/// Reference prefixes that pin a dependency to a source rather than a release.
const SOURCE_PREFIXES: &[&str] = &[
    "git+", "git:", "git@", "github:", "gitlab:", "bitbucket:", "http://", "https://", "file:",
    "link:", "portal:", "workspace:", "npm:",
];

/// Reduces a version constraint to one representative version string.
///
/// Range operators (`^ ~ >= <= > < = !`) are stripped, the lower end of a
/// hyphen range and the first alternative of `||` are kept, and anything
/// pinned to a VCS ref, URL, path or wildcard becomes [`LATEST_VERSION`].
///
/// # Examples
///
/// ```
/// use dependency_canary::sbom_generation::services::normalize_constraint;
///
/// assert_eq!(normalize_constraint("^4.17.21"), "4.17.21");
/// assert_eq!(normalize_constraint(">= 1.2, < 2"), "1.2");
/// assert_eq!(normalize_constraint("git+https://github.com/a/b.git"), "latest");
/// ```
pub fn normalize_constraint(constraint: &str) -> String {
    let trimmed = constraint.trim();

    if trimmed.is_empty()
        || SOURCE_PREFIXES.iter().any(|p| trimmed.starts_with(p))
        || trimmed.contains('#')
        || trimmed.contains("://")
    {
        return LATEST_VERSION.to_string();
    }

    let first_alternative = trimmed.split("||").next().unwrap_or(trimmed);
    let lower_bound = first_alternative
        .split(" - ")
        .next()
        .unwrap_or(first_alternative);

    // ">= 1.2, < 2" and ">=1.2 <2" both keep the first clause
    let clause = lower_bound.split(',').next().unwrap_or(lower_bound).trim();
    let clause = clause
        .trim_start_matches(|c: char| "^~><=!".contains(c) || c.is_whitespace())
        .split_whitespace()
        .next()
        .unwrap_or_default();

    match clause {
        "" | "*" | "x" | "X" | LATEST_VERSION => LATEST_VERSION.to_string(),
        version => version.to_string(),
    }
}
