//! Heuristic supply-chain scoring.
//!
//! Registry adapters fill in the facts of a [`PackageIntelligence`]; this
//! module turns them into boolean signals and a weighted verdict.

use crate::sbom_generation::domain::{
    PackageIntelligence, PackageManager, RiskLevel, SupplyChainRisk,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

pub const VERY_NEW_DAYS: i64 = 30;
pub const LOW_DOWNLOADS_PER_WEEK: u64 = 1000;
pub const MAX_SUPPLY_CHAIN_SCORE: f32 = 10.0;

const WEIGHT_VERY_NEW: f32 = 2.0;
const WEIGHT_LOW_DOWNLOADS: f32 = 1.5;
const WEIGHT_SUSPICIOUS_NAME: f32 = 2.5;
const WEIGHT_TYPOSQUAT: f32 = 4.0;
const WEIGHT_NO_MAINTAINERS: f32 = 1.0;
const WEIGHT_NO_PROJECT_URLS: f32 = 1.0;

pub const POPULAR_PYPI_PACKAGES: &[&str] = &[
    "requests",
    "urllib3",
    "setuptools",
    "certifi",
    "pip",
    "wheel",
    "six",
    "python-dateutil",
    "s3transfer",
    "jmespath",
    "docutils",
    "pytz",
    "pyyaml",
    "rsa",
    "awscli",
    "boto3",
    "numpy",
    "click",
    "colorama",
    "packaging",
    "pyparsing",
    "attrs",
    "jsonschema",
    "pycparser",
    "cffi",
    "cryptography",
    "idna",
    "charset-normalizer",
];

pub const POPULAR_NPM_PACKAGES: &[&str] = &[
    "lodash",
    "react",
    "chalk",
    "commander",
    "express",
    "debug",
    "mkdirp",
    "classnames",
    "prop-types",
    "moment",
    "request",
    "underscore",
    "async",
    "colors",
    "minimist",
    "fs-extra",
    "semver",
    "glob",
    "yargs",
    "axios",
    "jquery",
    "webpack",
    "babel-core",
    "typescript",
    "eslint",
    "jest",
    "mocha",
];

static SUSPICIOUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)test|temp|debug",
        r"[0-9]+$",
        r"(?i)[_-](utils?|helpers?|tools?)$",
        r"(?i)^[a-z]{1,3}$",
        r"(?i)[_-]v?[0-9]+[_-]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Curated popular-name list a package's name is compared against.
///
/// Cargo and Bundler names follow the lowercase, hyphenated PyPI style, so
/// they share its list; every other manager uses the npm list.
pub fn popular_packages_for(package_manager: &str) -> &'static [&'static str] {
    match package_manager.parse::<PackageManager>() {
        Ok(pm) if pm.is_pypi() => POPULAR_PYPI_PACKAGES,
        Ok(PackageManager::Cargo) | Ok(PackageManager::Bundler) => POPULAR_PYPI_PACKAGES,
        _ => POPULAR_NPM_PACKAGES,
    }
}

pub fn is_suspicious_name(name: &str) -> bool {
    SUSPICIOUS_PATTERNS.iter().any(|re| re.is_match(name))
}

/// Flags names within edit distance 1-2 of a popular package.
///
/// Comparison is case-insensitive; a name that is itself on the list is
/// never flagged.
pub fn is_potential_typosquat(name: &str, popular: &[&str]) -> bool {
    let name = name.to_lowercase();
    if popular.iter().any(|p| p.to_lowercase() == name) {
        return false;
    }
    popular.iter().any(|p| {
        let distance = strsim::levenshtein(&name, &p.to_lowercase());
        (1..=2).contains(&distance)
    })
}

/// Derives the boolean signals from the facts already gathered.
///
/// Age and download signals stay unset when the registry did not report the
/// underlying figure.
pub fn derive_signals(intel: &mut PackageIntelligence, now: DateTime<Utc>) {
    if let Some(age) = intel.age_days(now) {
        intel.is_very_new = age < VERY_NEW_DAYS;
    }
    if let Some(downloads) = intel.weekly_downloads {
        intel.low_download_count = downloads < LOW_DOWNLOADS_PER_WEEK;
    }
    intel.suspicious_name = is_suspicious_name(&intel.package_name);
    intel.potential_typosquat = is_potential_typosquat(
        &intel.package_name,
        popular_packages_for(&intel.package_manager),
    );
}

/// Weighs the signals of one package into a [`SupplyChainRisk`].
pub fn score(intel: &PackageIntelligence) -> SupplyChainRisk {
    let mut factors = Vec::new();
    let mut total = 0.0_f32;

    let checks = [
        (
            intel.is_very_new,
            WEIGHT_VERY_NEW,
            "Package is less than 30 days old",
        ),
        (
            intel.low_download_count,
            WEIGHT_LOW_DOWNLOADS,
            "Low download count (< 1000/week)",
        ),
        (
            intel.suspicious_name,
            WEIGHT_SUSPICIOUS_NAME,
            "Suspicious naming pattern detected",
        ),
        (
            intel.potential_typosquat,
            WEIGHT_TYPOSQUAT,
            "Potential typosquatting attempt",
        ),
        (
            intel.maintainers.is_empty(),
            WEIGHT_NO_MAINTAINERS,
            "No maintainer information available",
        ),
        (
            intel.project_urls.is_empty(),
            WEIGHT_NO_PROJECT_URLS,
            "No project repository or homepage",
        ),
    ];
    for (fired, weight, description) in checks {
        if fired {
            total += weight;
            factors.push(description.to_string());
        }
    }

    let mut recommendations = Vec::new();
    if intel.potential_typosquat {
        recommendations.push("Verify package name spelling - may be typosquatting".to_string());
    }
    if intel.is_very_new {
        recommendations.push("Consider using more established package versions".to_string());
    }
    if intel.low_download_count {
        recommendations.push("Review if this package is still maintained".to_string());
    }
    if intel.project_urls.is_empty() {
        recommendations.push("Verify package authenticity through other channels".to_string());
    }

    let total = total.min(MAX_SUPPLY_CHAIN_SCORE);
    SupplyChainRisk {
        package_name: intel.package_name.clone(),
        risk_level: RiskLevel::from_supply_chain_score(total),
        risk_score: total,
        risk_factors: factors,
        recommendations,
    }
}
