pub mod manifest_rules;
mod requirement;
pub mod supply_chain_scorer;
mod transitive_resolver;
mod version_constraint;
mod version_range;

pub use requirement::{parse_requirement, Requirement};
pub use transitive_resolver::TransitiveResolver;
pub use version_constraint::normalize_constraint;
pub use version_range::is_affected;
