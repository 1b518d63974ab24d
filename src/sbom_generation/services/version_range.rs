use crate::sbom_generation::domain::VersionRange;
use std::cmp::Ordering;

/// Whether `version` falls inside any of the affected ranges.
///
/// A range matches when `introduced <= version` and either
/// `version < fixed` or `version <= last_affected`. Missing bounds are open.
/// Versions are compared as semver when both sides parse (a leading `v` is
/// ignored), otherwise as plain strings.
pub fn is_affected(version: &str, ranges: &[VersionRange]) -> bool {
    ranges.iter().any(|range| is_in_range(version, range))
}

fn is_in_range(version: &str, range: &VersionRange) -> bool {
    if let Some(introduced) = range.introduced.as_deref() {
        if introduced != "0" && compare(version, introduced) == Ordering::Less {
            return false;
        }
    }

    if let Some(fixed) = range.fixed.as_deref() {
        if compare(version, fixed) != Ordering::Less {
            return false;
        }
    }

    if let Some(last) = range.last_affected.as_deref() {
        if compare(version, last) == Ordering::Greater {
            return false;
        }
    }

    true
}

fn compare(left: &str, right: &str) -> Ordering {
    match (parse_semver(left), parse_semver(right)) {
        (Some(l), Some(r)) => l.cmp(&r),
        _ => left.cmp(right),
    }
}

fn parse_semver(raw: &str) -> Option<semver::Version> {
    let raw = raw.trim().trim_start_matches('v');
    semver::Version::parse(raw).ok()
}
