pub mod error;
pub mod logging;
mod result;
pub mod security;

pub use error::{ExitCode, ParseError, ParseResult, ScanError};
pub use result::Result;
