/// Crate-wide result type; errors carry context through `anyhow`.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
