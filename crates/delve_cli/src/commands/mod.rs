//! CLI command handlers.

/// Pattern listing.
pub mod patterns;
/// History and staged-change searches.
pub mod search;

/// Convenience alias for command return types.
pub type Result<T = ()> = anyhow::Result<T>;
