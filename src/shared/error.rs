use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes.
///
/// CI pipelines use these to tell "risky dependencies found" apart from
/// "the scan itself failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Scan finished and nothing reached the `--fail-on` level
    Success = 0,
    /// At least one package is at or above the `--fail-on` level
    RiskThresholdExceeded = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// The scan could not run (bad path, config error, write failure, ...)
    ApplicationError = 3,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::RiskThresholdExceeded => write!(f, "Risk Threshold Exceeded (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// User-facing failures of the command-line tool.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid project path: {path}\nReason: {reason}\n\n💡 Hint: Pass an existing project directory with --path")]
    InvalidProjectPath { path: PathBuf, reason: String },

    #[error("Invalid configuration in {path}\nDetails: {details}\n\n💡 Hint: Check the keys and values of your dependency-canary.config.yml")]
    InvalidConfig { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Security violation: {path}\nReason: {reason}\n\n💡 Hint: {hint}")]
    SecurityError {
        path: PathBuf,
        reason: String,
        hint: String,
    },

    #[error("Nothing to scan\n\n💡 Hint: Pass at least one --path or an --image reference")]
    NoTargets,
}

/// Outcome of a parser that could not produce dependencies.
///
/// `UnsupportedFormat` is reported to the caller; `Malformed` and `Io` are
/// logged by the parser front-end and turned into an empty result.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{parser} parser does not support lockfile '{file_name}'")]
    UnsupportedFormat { parser: String, file_name: String },

    #[error("malformed {path}: {details}")]
    Malformed { path: PathBuf, details: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    pub fn malformed(path: impl Into<PathBuf>, details: impl fmt::Display) -> Self {
        ParseError::Malformed {
            path: path.into(),
            details: details.to_string(),
        }
    }

    pub fn unsupported(parser: impl Into<String>, path: &std::path::Path) -> Self {
        ParseError::UnsupportedFormat {
            parser: parser.into(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ParseError::UnsupportedFormat { .. })
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
